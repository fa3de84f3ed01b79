//! The semantic model: OpenAPI-style types applications read and mutate.
//!
//! Every type implements [`Semantic`](crate::field::Semantic) with an
//! explicit field table and [`Build`](crate::build::Build) to derive itself
//! from grounded nodes. Each keeps a `grounded` handle to the node it came
//! from; freshly constructed values leave it `None`.

/// The `kind`/`grounded` half of a [`Semantic`](crate::field::Semantic)
/// impl, for types with a `grounded` field.
macro_rules! grounded_semantic {
    () => {
        fn kind(&self) -> &'static str {
            <Self as $crate::build::Build>::KIND
        }

        fn grounded(&self) -> Option<&$crate::grounded::GroundedHandle> {
            self.grounded.as_ref()
        }
    };
}

mod components;
mod document;
mod paths;
mod schema;

pub use components::{Components, SecurityScheme};
pub use document::{Contact, Document, ExternalDocs, Info, License, Server, ServerVariable, Tag};
pub use paths::{
    Header, MediaType, Operation, Parameter, PathItem, Paths, RequestBody, Response, Responses,
    SecurityRequirement,
};
pub use schema::{AdditionalProperties, Schema};
