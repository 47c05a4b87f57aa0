#![warn(rust_2018_idioms)]

//! # Font embedding for print pipelines
//!
//! `fontembed` loads TrueType and OpenType fonts (including fonts in TrueType collections),
//! works out what a font's embedding rights allow, and writes the font into a document:
//!
//! * as a rebuilt SFNT holding only the glyphs a job uses ([subset]),
//! * as a PostScript Type 42 font ([type42]),
//! * or as a bare CFF program.
//!
//! [embed::EmbeddingPlan] ties these together. The [metrics] module derives PDF width arrays
//! and `FontDescriptor` values, and [pdf] the names that go with them.

/// Reading and writing of binary data.
pub mod binary;
/// Glyph id sets.
pub mod bitset;
/// Checksum calculation routines.
pub mod checksum;
pub mod dynstring;
pub mod embed;
pub mod error;
pub mod metrics;
pub mod name;
pub mod pdf;
pub mod post;
pub mod sfnt;
pub mod sfnt_writer;
/// Font subsetting.
pub mod subset;
pub mod tables;
pub mod tag;
/// Shared test code.
#[cfg(test)]
pub mod tests;
pub mod type42;
