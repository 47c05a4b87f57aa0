//! Error types

use std::fmt;
use std::io;

use crate::binary::read::ReadEof;
use crate::embed::EmbeddingRights;
use crate::tag::DisplayTag;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    MissingValue,
    MissingTable(u32),
    /// The data is neither a TrueType/OpenType font nor a collection of them.
    NotATrueTypeFont,
    /// A table was found that is inconsistent with the outline flavour of the font.
    WrongMagic,
    /// The requested font is beyond the end of the collection.
    BadSubfontIndex,
    ChecksumMismatch(u32),
    /// Recognised, but unsupported container flavour (e.g. sfnt-wrapped Type 1).
    UnsupportedFormat,
    UnsuitableCmap,
    Io(io::ErrorKind),
    NotImplemented,
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl From<io::Error> for ParseError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => ParseError::BadEof,
            kind => ParseError::Io(kind),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::MissingValue => write!(f, "an expected data value was missing"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::NotATrueTypeFont => write!(f, "not a TrueType or OpenType font"),
            ParseError::WrongMagic => write!(f, "table does not match the font flavour"),
            ParseError::BadSubfontIndex => write!(f, "font index out of range for collection"),
            ParseError::ChecksumMismatch(tag) => {
                write!(f, "wrong checksum for '{}' table", DisplayTag(*tag))
            }
            ParseError::UnsupportedFormat => write!(f, "unsupported font container"),
            ParseError::UnsuitableCmap => write!(f, "no suitable cmap subtable"),
            ParseError::Io(kind) => write!(f, "I/O error: {}", io::Error::from(*kind)),
            ParseError::NotImplemented => write!(f, "feature not implemented"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that originate when writing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    BadValue,
    NotImplemented,
    /// The bytes emitted for a font differ from what its layout predicted.
    LayoutMismatch,
    Io(io::ErrorKind),
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl From<io::Error> for WriteError {
    fn from(error: io::Error) -> Self {
        WriteError::Io(error.kind())
    }
}

impl From<fmt::Error> for WriteError {
    fn from(_error: fmt::Error) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => write!(f, "write: bad value"),
            WriteError::NotImplemented => write!(f, "writing in this format is not implemented"),
            WriteError::LayoutMismatch => {
                write!(f, "data written did not match the computed font layout")
            }
            WriteError::Io(kind) => write!(f, "I/O error: {}", io::Error::from(*kind)),
        }
    }
}

impl std::error::Error for WriteError {}

/// Enum that can hold read (`ParseError`) and write errors
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ReadWriteError {
    Read(ParseError),
    Write(WriteError),
}

impl From<ParseError> for ReadWriteError {
    fn from(error: ParseError) -> Self {
        ReadWriteError::Read(error)
    }
}

impl From<WriteError> for ReadWriteError {
    fn from(error: WriteError) -> Self {
        ReadWriteError::Write(error)
    }
}

impl fmt::Display for ReadWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadWriteError::Read(err) => write!(f, "read error: {}", err),
            ReadWriteError::Write(err) => write!(f, "write error: {}", err),
        }
    }
}

impl std::error::Error for ReadWriteError {}

/// Errors raised while planning or performing a font embedding.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum EmbedError {
    /// `KEEP_T1` and `FORCE_MULTIBYTE` cannot be requested together.
    IncompatibleFlags,
    /// The subsetting policy bits name an impossible combination.
    BadSubsetPolicy,
    /// The font's embedding rights forbid the requested embedding.
    RightsViolation(EmbeddingRights),
    /// The destination cannot carry fonts of this kind.
    UnsupportedDestination,
    /// No character code of the requested range maps to a retained glyph.
    EmptyEmbeddingRange,
    /// Type42 encodings hold at most 256 entries.
    TooBigForType42,
    /// A Type42 encoding needs at least the `.notdef` slot.
    NotdefRequired,
    /// Standard fonts cannot be made multibyte.
    MultibyteStandardFont,
    /// The conversion needed for this plan is not available.
    NotImplemented,
    /// A plan writes its font once.
    AlreadyEmbedded,
    Read(ParseError),
    Write(WriteError),
}

impl From<ParseError> for EmbedError {
    fn from(error: ParseError) -> Self {
        EmbedError::Read(error)
    }
}

impl From<WriteError> for EmbedError {
    fn from(error: WriteError) -> Self {
        EmbedError::Write(error)
    }
}

impl From<ReadWriteError> for EmbedError {
    fn from(error: ReadWriteError) -> Self {
        match error {
            ReadWriteError::Read(err) => EmbedError::Read(err),
            ReadWriteError::Write(err) => EmbedError::Write(err),
        }
    }
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::IncompatibleFlags => {
                write!(f, "incompatible mode: KEEP_T1 and FORCE_MULTIBYTE")
            }
            EmbedError::BadSubsetPolicy => write!(f, "bad subset policy"),
            EmbedError::RightsViolation(rights) => write!(
                f,
                "the font does not permit the requested embedding (rights {:?})",
                rights
            ),
            EmbedError::UnsupportedDestination => {
                write!(f, "destination cannot embed this kind of font")
            }
            EmbedError::EmptyEmbeddingRange => write!(f, "empty embedding range"),
            EmbedError::TooBigForType42 => write!(f, "encoding too big for Type42"),
            EmbedError::NotdefRequired => write!(f, "at least .notdef required in Type42"),
            EmbedError::MultibyteStandardFont => {
                write!(f, "multibyte standard fonts are not possible")
            }
            EmbedError::NotImplemented => write!(f, "embedding conversion not implemented"),
            EmbedError::AlreadyEmbedded => write!(f, "font has already been embedded"),
            EmbedError::Read(err) => write!(f, "read error: {}", err),
            EmbedError::Write(err) => write!(f, "write error: {}", err),
        }
    }
}

impl std::error::Error for EmbedError {}
