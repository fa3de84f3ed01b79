//! Construction of semantic objects from the grounded graph.
//!
//! [`build`] derives a semantic root from a grounded document. Named
//! collections (`paths`, `components.schemas`, ...) are built by
//! [`MappingReader::collection`], which fans out one construction task per
//! child on the rayon pool and joins before returning. A child that fails is
//! left out of its collection and reported in [`Built::errors`].

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::error::BuildError;
use crate::field::{is_extension_key, Extensions};
use crate::grounded::{
    Entry, GroundedDoc, GroundedHandle, GroundedNode, GroundedValue, NodeId, ReferenceCycles,
};

/// A semantic type constructible from a grounded node.
pub trait Build: Sized {
    /// Type name for diagnostics.
    const KIND: &'static str;

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError>;
}

/// A built value together with every child failure recorded on the way.
#[derive(Debug)]
pub struct Built<T> {
    pub value: T,
    pub errors: Vec<BuildError>,
}

/// Derive a semantic `T` from the root of `doc`.
pub fn build<T: Build>(doc: &Arc<GroundedDoc>) -> Result<Built<T>, BuildError> {
    let _span = tracing::debug_span!("build", kind = T::KIND).entered();
    let root = doc.root().ok_or(BuildError::NotAMapping {
        owner: T::KIND,
        found: "empty document",
        line: 0,
    })?;
    let errors = Mutex::new(Vec::new());
    let memo = Memo::default();
    let cycles = ReferenceCycles::new(doc);
    let scope = Scope {
        doc,
        errors: &errors,
        memo: &memo,
        cycles: &cycles,
        context: None,
    };
    let value = T::build(&scope, root)?;
    let mut errors = errors.into_inner().unwrap_or_else(|e| e.into_inner());
    // Children finish in any order.
    errors.sort_by_key(|e| e.line());
    tracing::debug!(failures = errors.len(), "build finished");
    Ok(Built { value, errors })
}

/// Resolved reference targets, keyed by semantic type and target node.
type Memo = Mutex<HashMap<(TypeId, NodeId), Arc<dyn Any + Send + Sync>>>;

/// Shared construction state. Read-only apart from the failure collector and
/// the resolution memo, so it can be handed to parallel child tasks by
/// reference.
pub struct Scope<'a> {
    doc: &'a Arc<GroundedDoc>,
    errors: &'a Mutex<Vec<BuildError>>,
    memo: &'a Memo,
    cycles: &'a ReferenceCycles,
    /// The reference target whose content is being built, if any.
    context: Option<NodeId>,
}

impl<'a> Scope<'a> {
    pub fn doc(&self) -> &GroundedDoc {
        self.doc
    }

    pub fn handle(&self, id: NodeId) -> GroundedHandle {
        GroundedHandle::new(self.doc, id)
    }

    /// Open node `id` as the mapping backing a `T`.
    pub fn mapping<T: Build>(&self, id: NodeId) -> Result<MappingReader<'_>, BuildError> {
        let node = self.doc.node(id).ok_or(BuildError::NotAMapping {
            owner: T::KIND,
            found: "nothing",
            line: 0,
        })?;
        match node.value {
            GroundedValue::Mapping(_) => Ok(MappingReader {
                scope: self,
                id,
                node,
                owner: T::KIND,
            }),
            _ => Err(BuildError::NotAMapping {
                owner: T::KIND,
                found: node.value.shape(),
                line: node.line(),
            }),
        }
    }

    fn report(&self, err: BuildError) {
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(err);
    }

    /// Build the content a reference points at.
    ///
    /// Returns `None` for unresolvable targets and for targets that fail to
    /// build. Inside the content of a target, references back into the
    /// target's own cycle are left unresolved, so every target has one
    /// finite resolved form no matter where it is reached from. That form is
    /// built once per document and shared by every reference to it.
    pub fn resolve<T>(&self, target: &str) -> Option<Arc<T>>
    where
        T: Build + Send + Sync + 'static,
    {
        let Some(id) = self.doc.final_target(target) else {
            tracing::debug!(reference = target, "reference target not resolvable");
            return None;
        };
        if let Some(context) = self.context {
            if self.cycles.same_cycle(context, id) {
                tracing::debug!(reference = target, "reference closes a cycle, leaving unresolved");
                return None;
            }
        }

        let key = (TypeId::of::<T>(), id);
        let hit = self
            .memo
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned();
        if let Some(hit) = hit {
            return hit.downcast::<T>().ok();
        }

        // Failures inside a target are reported where the target itself is
        // built, not once per reference to it.
        let discarded = Mutex::new(Vec::new());
        let child = Scope {
            doc: self.doc,
            errors: &discarded,
            memo: self.memo,
            cycles: self.cycles,
            context: Some(id),
        };
        match T::build(&child, id) {
            Ok(value) => {
                let value = Arc::new(value);
                self.memo
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(key, value.clone());
                Some(value)
            }
            Err(err) => {
                tracing::debug!(reference = target, %err, "reference target failed to build");
                None
            }
        }
    }

    /// Fan out one construction task per entry and join. Failures are
    /// reported and the failing children left out.
    fn build_children<T: Build + Send>(
        &self,
        entries: Vec<&Entry>,
        collection: &'static str,
    ) -> BTreeMap<String, T> {
        let results: Vec<(String, Result<T, BuildError>)> = entries
            .par_iter()
            .map(|e| (e.key.text.clone(), T::build(self, e.value)))
            .collect();

        let mut out = BTreeMap::new();
        for (key, result) in results {
            match result {
                Ok(value) => {
                    out.insert(key, value);
                }
                Err(source) => {
                    let err = BuildError::Child {
                        collection,
                        key,
                        source: Box::new(source),
                    };
                    tracing::warn!(%err, "child construction failed");
                    self.report(err);
                }
            }
        }
        out
    }
}

/// Typed access to the entries of one grounded mapping.
pub struct MappingReader<'s> {
    scope: &'s Scope<'s>,
    id: NodeId,
    node: &'s GroundedNode,
    owner: &'static str,
}

impl<'s> MappingReader<'s> {
    pub fn handle(&self) -> GroundedHandle {
        self.scope.handle(self.id)
    }

    fn lookup(&self, key: &str) -> Option<(NodeId, &'s GroundedNode)> {
        let entry = self.node.entries().iter().find(|e| e.key.text == key)?;
        let node = self.scope.doc.node(entry.value)?;
        match node.value {
            GroundedValue::Null => None,
            _ => Some((entry.value, node)),
        }
    }

    fn mismatch(&self, key: &str, expected: &'static str, node: &GroundedNode) -> BuildError {
        BuildError::TypeMismatch {
            owner: self.owner,
            field: key.to_owned(),
            expected,
            found: node.value.shape(),
            line: node.line(),
        }
    }

    pub fn string(&self, key: &str) -> Result<String, BuildError> {
        match self.lookup(key) {
            None => Ok(String::new()),
            Some((_, node)) => match &node.value {
                GroundedValue::Str(s) => Ok(s.clone()),
                _ => Err(self.mismatch(key, "string", node)),
            },
        }
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>, BuildError> {
        match self.lookup(key) {
            None => Ok(None),
            Some((_, node)) => match node.value {
                GroundedValue::Bool(b) => Ok(Some(b)),
                _ => Err(self.mismatch(key, "boolean", node)),
            },
        }
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, BuildError> {
        match self.lookup(key) {
            None => Ok(None),
            Some((_, node)) => match &node.value {
                GroundedValue::Number(text) => text
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| self.mismatch(key, "number", node)),
                _ => Err(self.mismatch(key, "number", node)),
            },
        }
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>, BuildError> {
        match self.lookup(key) {
            None => Ok(None),
            Some((_, node)) => match &node.value {
                GroundedValue::Number(text) => text
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| self.mismatch(key, "integer", node)),
                _ => Err(self.mismatch(key, "integer", node)),
            },
        }
    }

    pub fn strings(&self, key: &str) -> Result<Vec<String>, BuildError> {
        let Some((_, node)) = self.lookup(key) else {
            return Ok(Vec::new());
        };
        if !matches!(node.value, GroundedValue::Sequence(_)) {
            return Err(self.mismatch(key, "sequence of strings", node));
        }
        self.string_items(key, node)
    }

    /// A field written either as one string or as a sequence of strings.
    pub fn type_like(&self, key: &str) -> Result<Vec<String>, BuildError> {
        match self.lookup(key) {
            None => Ok(Vec::new()),
            Some((_, node)) => match &node.value {
                GroundedValue::Str(s) => Ok(vec![s.clone()]),
                GroundedValue::Sequence(_) => self.string_items(key, node),
                _ => Err(self.mismatch(key, "string or sequence of strings", node)),
            },
        }
    }

    fn string_items(&self, key: &str, node: &GroundedNode) -> Result<Vec<String>, BuildError> {
        node.items()
            .iter()
            .filter_map(|id| self.scope.doc.node(*id))
            .map(|item| match &item.value {
                GroundedValue::Str(s) => Ok(s.clone()),
                _ => Err(self.mismatch(key, "string", item)),
            })
            .collect()
    }

    /// A mapping of names to string lists (security requirements, scopes).
    pub fn string_lists(&self, key: &str) -> Result<BTreeMap<String, Vec<String>>, BuildError> {
        match self.lookup(key) {
            None => Ok(BTreeMap::new()),
            Some((_, node)) => self.string_lists_at(key, node),
        }
    }

    fn string_lists_at(
        &self,
        key: &str,
        node: &GroundedNode,
    ) -> Result<BTreeMap<String, Vec<String>>, BuildError> {
        if !matches!(node.value, GroundedValue::Mapping(_)) {
            return Err(self.mismatch(key, "mapping", node));
        }
        let mut out = BTreeMap::new();
        for entry in node.entries() {
            let Some(list) = self.scope.doc.node(entry.value) else {
                continue;
            };
            if !matches!(list.value, GroundedValue::Sequence(_)) {
                return Err(self.mismatch(&entry.key.text, "sequence of strings", list));
            }
            out.insert(entry.key.text.clone(), self.string_items(&entry.key.text, list)?);
        }
        Ok(out)
    }

    /// This mapping itself read as names to string lists.
    pub fn own_string_lists(&self) -> Result<BTreeMap<String, Vec<String>>, BuildError> {
        self.string_lists_at(self.owner, self.node)
    }

    /// Record a failure in one field and carry on with the field unset.
    pub fn recover<T: Default>(&self, result: Result<T, BuildError>) -> T {
        result.unwrap_or_else(|err| {
            tracing::warn!(%err, "field dropped");
            self.scope.report(err);
            T::default()
        })
    }

    fn child<T>(&self, key: String, result: Result<T, BuildError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(source) => {
                let err = BuildError::Child {
                    collection: self.owner,
                    key,
                    source: Box::new(source),
                };
                tracing::warn!(%err, "nested object dropped");
                self.scope.report(err);
                None
            }
        }
    }

    /// A nested object under `key`. When it fails to build the failure is
    /// reported and the field left unset.
    pub fn object<T: Build>(&self, key: &str) -> Result<Option<T>, BuildError> {
        match self.lookup(key) {
            None => Ok(None),
            Some((id, _)) => Ok(self.child(key.to_owned(), T::build(self.scope, id))),
        }
    }

    /// A sequence of objects under `key`. Items that fail to build are
    /// reported and left out.
    pub fn objects<T: Build>(&self, key: &str) -> Result<Vec<T>, BuildError> {
        let Some((_, node)) = self.lookup(key) else {
            return Ok(Vec::new());
        };
        if !matches!(node.value, GroundedValue::Sequence(_)) {
            return Err(self.mismatch(key, "sequence", node));
        }
        Ok(node
            .items()
            .iter()
            .enumerate()
            .filter_map(|(i, id)| self.child(format!("{}[{}]", key, i), T::build(self.scope, *id)))
            .collect())
    }

    /// A small keyed map built in place. Extension keys are skipped, and
    /// entries that fail to build are reported and left out.
    pub fn object_map<T: Build>(&self, key: &str) -> Result<BTreeMap<String, T>, BuildError> {
        let Some((_, node)) = self.lookup(key) else {
            return Ok(BTreeMap::new());
        };
        if !matches!(node.value, GroundedValue::Mapping(_)) {
            return Err(self.mismatch(key, "mapping", node));
        }
        Ok(node
            .entries()
            .iter()
            .filter(|e| !is_extension_key(&e.key.text))
            .filter_map(|e| {
                let value = self.child(
                    format!("{}.{}", key, e.key.text),
                    T::build(self.scope, e.value),
                )?;
                Some((e.key.text.clone(), value))
            })
            .collect())
    }

    /// A named collection under `key`, built in parallel.
    pub fn collection<T: Build + Send>(
        &self,
        key: &str,
        collection: &'static str,
    ) -> Result<BTreeMap<String, T>, BuildError> {
        let Some((_, node)) = self.lookup(key) else {
            return Ok(BTreeMap::new());
        };
        if !matches!(node.value, GroundedValue::Mapping(_)) {
            return Err(self.mismatch(key, "mapping", node));
        }
        let entries = node
            .entries()
            .iter()
            .filter(|e| !is_extension_key(&e.key.text))
            .collect();
        Ok(self.scope.build_children(entries, collection))
    }

    /// The non-extension entries of this mapping itself, built in parallel.
    pub fn own_collection<T: Build + Send>(&self, collection: &'static str) -> BTreeMap<String, T> {
        let entries = self
            .node
            .entries()
            .iter()
            .filter(|e| !is_extension_key(&e.key.text))
            .collect();
        self.scope.build_children(entries, collection)
    }

    /// Free-form data under `key`, converted as-is.
    pub fn opaque(&self, key: &str) -> Option<serde_json::Value> {
        let entry = self.node.entries().iter().find(|e| e.key.text == key)?;
        Some(to_json(self.scope.doc, entry.value))
    }

    pub fn opaques(&self, key: &str) -> Result<Vec<serde_json::Value>, BuildError> {
        let Some((_, node)) = self.lookup(key) else {
            return Ok(Vec::new());
        };
        if !matches!(node.value, GroundedValue::Sequence(_)) {
            return Err(self.mismatch(key, "sequence", node));
        }
        Ok(node
            .items()
            .iter()
            .map(|id| to_json(self.scope.doc, *id))
            .collect())
    }

    /// `x-` entries, in source order.
    pub fn extensions(&self) -> Extensions {
        let mut ext = Extensions::new();
        for entry in self.node.entries() {
            if is_extension_key(&entry.key.text) {
                ext.insert(entry.key.text.clone(), to_json(self.scope.doc, entry.value));
            }
        }
        ext
    }
}

/// Convert a grounded subtree into plain JSON, keeping entry order and the
/// exact text of numbers.
pub fn to_json(doc: &GroundedDoc, id: NodeId) -> serde_json::Value {
    use serde_json::Value;
    let Some(node) = doc.node(id) else {
        return Value::Null;
    };
    match &node.value {
        GroundedValue::Null => Value::Null,
        GroundedValue::Bool(b) => Value::Bool(*b),
        GroundedValue::Number(text) => serde_json::Number::from_str(text)
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(text.clone())),
        GroundedValue::Str(s) => Value::String(s.clone()),
        GroundedValue::Sequence(items) => {
            Value::Array(items.iter().map(|i| to_json(doc, *i)).collect())
        }
        GroundedValue::Mapping(entries) => {
            let mut m = serde_json::Map::new();
            for e in entries {
                m.insert(e.key.text.clone(), to_json(doc, e.value));
            }
            Value::Object(m)
        }
    }
}
