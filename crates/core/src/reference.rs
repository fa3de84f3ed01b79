//! Reference (indirection) semantics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::build::{Build, Scope};
use crate::error::BuildError;
use crate::field::{Field, Semantic};
use crate::grounded::{GroundedHandle, NodeId};
use crate::output::OutputNode;
use crate::REFERENCE_MARKER_KEY;

/// How references render. Chosen per render call, so one semantic graph can
/// be rendered both ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Render references as `{"$ref": target}` without touching the target.
    #[default]
    Preserve,
    /// Render the referenced content in place, falling back to the marker
    /// when the content is not available.
    Resolve,
}

/// The minimal output for an unresolved indirection.
pub fn marker(target: &str) -> OutputNode {
    OutputNode::Mapping(vec![(
        REFERENCE_MARKER_KEY.to_owned(),
        OutputNode::str(target),
    )])
}

/// A value that is either written inline or points elsewhere via `$ref`.
#[derive(Debug, Clone)]
pub enum Refable<T> {
    Inline(T),
    Reference(Reference<T>),
}

#[derive(Debug, Clone)]
pub struct Reference<T> {
    pub target: String,
    /// Semantic content of the target, when the builder could resolve it.
    /// Shared with every other reference to the same target; edit the
    /// definition itself to change it.
    pub resolved: Option<Arc<T>>,
    grounded: Option<GroundedHandle>,
}

impl<T> Refable<T> {
    /// A new reference with no known content.
    pub fn to(target: impl Into<String>) -> Self {
        Refable::Reference(Reference {
            target: target.into(),
            resolved: None,
            grounded: None,
        })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Refable::Reference(_))
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Refable::Inline(_) => None,
            Refable::Reference(r) => Some(&r.target),
        }
    }

    /// The inline value, or the resolved content of a reference.
    pub fn value(&self) -> Option<&T> {
        match self {
            Refable::Inline(v) => Some(v),
            Refable::Reference(r) => r.resolved.as_deref(),
        }
    }

    pub fn inline_mut(&mut self) -> Option<&mut T> {
        match self {
            Refable::Inline(v) => Some(v),
            Refable::Reference(_) => None,
        }
    }
}

impl<T> From<T> for Refable<T> {
    fn from(value: T) -> Self {
        Refable::Inline(value)
    }
}

impl<T: Semantic> Semantic for Refable<T> {
    fn kind(&self) -> &'static str {
        match self {
            Refable::Inline(v) => v.kind(),
            Refable::Reference(_) => "Reference",
        }
    }

    fn grounded(&self) -> Option<&GroundedHandle> {
        match self {
            Refable::Inline(v) => v.grounded(),
            Refable::Reference(r) => r.grounded.as_ref(),
        }
    }

    fn fields(&self) -> Vec<Field<'_>> {
        match self {
            Refable::Inline(v) => v.fields(),
            Refable::Reference(_) => Vec::new(),
        }
    }

    fn reference(&self) -> Option<&str> {
        self.target()
    }

    fn resolved(&self) -> Option<&dyn Semantic> {
        match self {
            Refable::Inline(_) => None,
            Refable::Reference(r) => r.resolved.as_deref().map(|v| v as &dyn Semantic),
        }
    }
}

impl<T: Build + Send + Sync + 'static> Build for Refable<T> {
    const KIND: &'static str = T::KIND;

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let target = scope
            .doc()
            .node(id)
            .and_then(|n| n.reference_target())
            .map(str::to_owned);
        match target {
            Some(target) => {
                let resolved = scope.resolve::<T>(&target);
                Ok(Refable::Reference(Reference {
                    target,
                    resolved,
                    grounded: Some(scope.handle(id)),
                }))
            }
            None => Ok(Refable::Inline(T::build(scope, id)?)),
        }
    }
}
