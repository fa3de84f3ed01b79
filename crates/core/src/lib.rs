#![allow(clippy::result_large_err)]
//! groundwork-core: grounded/semantic document model.
//!
//! A document is parsed once into an immutable, position-tracked
//! *grounded* graph, then derived into a mutable *semantic* graph of
//! OpenAPI-style types. Any semantic object renders back into an ordered
//! [`OutputNode`] tree whose field order follows the original source, even
//! after fields are changed, added or removed.
//!
//! # Public API
//!
//! - [`load()`] -- parse and build a [`Document`] in one step
//! - [`grounded::parse()`] -- the grounded graph alone
//! - [`build()`] -- derive any [`Build`] type from a grounded graph
//! - [`Render`] / [`render()`] -- project a semantic object to output
//! - [`ReferencePolicy`] -- render references as markers or inline
//! - [`ParseError`], [`BuildError`], [`LoadError`] -- error types

use std::sync::Arc;

/// Mapping key that turns a mapping into a reference.
pub const REFERENCE_MARKER_KEY: &str = "$ref";
/// Key prefix of vendor extensions.
pub const EXTENSION_PREFIX: &str = "x-";

pub mod build;
pub mod correlate;
pub mod error;
pub mod field;
pub mod grounded;
pub mod lexer;
pub mod model;
pub mod output;
pub mod reference;
pub mod render;

// ── Convenience re-exports ───────────────────────────────────────────

pub use build::{build, Build, Built};
pub use correlate::PositionKey;
pub use error::{BuildError, ParseError};
pub use field::{Extensions, Field, Semantic, Value};
pub use grounded::{GroundedDoc, GroundedHandle, NodeId};
pub use model::Document;
pub use output::OutputNode;
pub use reference::{Refable, ReferencePolicy};
pub use render::{render, Render};

/// Failure to load a document at all.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),
    #[error("build error: {0}")]
    Build(#[from] BuildError),
}

/// A loaded document: the grounded graph, the semantic root derived from
/// it, and every child failure recorded while building.
///
/// The semantic graph only holds weak handles into `grounded`; dropping the
/// grounded graph keeps the document usable but loses source ordering.
#[derive(Debug)]
pub struct Loaded {
    pub grounded: Arc<GroundedDoc>,
    pub document: Document,
    pub errors: Vec<BuildError>,
}

/// Parse `src` and build its [`Document`].
pub fn load(src: &str) -> Result<Loaded, LoadError> {
    let grounded = grounded::parse(src)?;
    let Built { value, errors } = build::<Document>(&grounded)?;
    Ok(Loaded {
        grounded,
        document: value,
        errors,
    })
}
