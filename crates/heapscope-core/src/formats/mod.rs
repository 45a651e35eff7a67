//! # Formats Module
//!
//! On-disk encodings of snapshot tables.
//!
//! Only pure byte transformations live here. Reading and writing files is
//! done by the app layer.

mod persistence;

pub use persistence::*;
