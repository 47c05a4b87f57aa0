//! Big-endian binary reading and writing.
//!
//! Every multi-byte quantity in an SFNT container is stored big-endian. The marker types in
//! this module (`U16Be`, `U32Be`, …) name those on-disk encodings so they can be used with the
//! `ReadBinary` and `WriteBinary` traits.

/// Read binary data
pub mod read;

/// Write binary data
pub mod write;

/// Calculate the length required to 32-bit (long) align data of length `len`
///
/// Example:
///
/// ```
/// use fontembed::binary::long_align;
///
/// assert_eq!(long_align(53), 56);
/// assert_eq!(long_align(56), 56);
/// ```
pub const fn long_align(len: usize) -> usize {
    (len + 3) & !3
}

/// Calculate the length required to 16-bit (word) align data of length `len`
///
/// Example:
///
/// ```
/// use fontembed::binary::word_align;
///
/// assert_eq!(word_align(123), 124);
/// ```
pub const fn word_align(len: usize) -> usize {
    (len + 1) & !1
}

#[derive(Copy, Clone)]
pub enum U8 {}

#[derive(Copy, Clone)]
pub enum I8 {}

#[derive(Copy, Clone)]
pub enum U16Be {}

#[derive(Copy, Clone)]
pub enum I16Be {}

#[derive(Copy, Clone)]
pub enum U32Be {}

#[derive(Copy, Clone)]
pub enum I32Be {}
