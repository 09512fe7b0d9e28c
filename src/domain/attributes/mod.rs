//! Attribute bag decoding.
//!
//! Remote responses carry results as an `attributes` sequence of
//! `{key, value}` pairs whose values are duck-typed: a list may arrive as a
//! native JSON array or as a JSON-encoded string. This module turns that into
//! an explicit tagged union and keeps parse failures visible as
//! [`DecodeWarning`]s.

mod bag;
mod value;

pub use bag::{AttributeBag, ATTRIBUTES_FIELD};
pub use value::{AttributeEntry, DecodeOutcome, DecodeWarning, DecodedValue};
