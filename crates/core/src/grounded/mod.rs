//! The grounded graph: an immutable, position-tracked parse tree.
//!
//! Nodes live in a single arena owned by [`GroundedDoc`] and are addressed by
//! [`NodeId`]. Semantic objects point back into the arena through a
//! [`GroundedHandle`], which never keeps the document alive on its own.

use std::sync::{Arc, Weak};

mod cycles;
mod parser;

pub use cycles::ReferenceCycles;
pub use parser::parse;

/// Index of a node inside its [`GroundedDoc`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// A source position. Lines and columns are 1-based; 0 means "no concrete
/// position" (used for synthesized nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Pos { line, column }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

/// The key half of a mapping entry.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyNode {
    pub text: String,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: KeyNode,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroundedValue {
    Null,
    Bool(bool),
    /// Numeric literal, exactly as written.
    Number(String),
    Str(String),
    Sequence(Vec<NodeId>),
    Mapping(Vec<Entry>),
}

impl GroundedValue {
    /// Short shape name for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            GroundedValue::Null => "null",
            GroundedValue::Bool(_) => "boolean",
            GroundedValue::Number(_) => "number",
            GroundedValue::Str(_) => "string",
            GroundedValue::Sequence(_) => "sequence",
            GroundedValue::Mapping(_) => "mapping",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundedNode {
    pub value: GroundedValue,
    pub pos: Pos,
    /// Target of a `$ref` indirection when this node is a reference mapping.
    pub reference: Option<String>,
}

impl GroundedNode {
    pub fn value(&self) -> &GroundedValue {
        &self.value
    }

    pub fn line(&self) -> u32 {
        self.pos.line
    }

    pub fn column(&self) -> u32 {
        self.pos.column
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference_target(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn entries(&self) -> &[Entry] {
        match &self.value {
            GroundedValue::Mapping(entries) => entries,
            _ => &[],
        }
    }

    pub fn items(&self) -> &[NodeId] {
        match &self.value {
            GroundedValue::Sequence(items) => items,
            _ => &[],
        }
    }
}

/// Arena of grounded nodes for one parsed document.
#[derive(Debug, Default)]
pub struct GroundedDoc {
    nodes: Vec<GroundedNode>,
    root: Option<NodeId>,
}

impl GroundedDoc {
    pub(crate) fn push(&mut self, node: GroundedNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&GroundedNode> {
        self.nodes.get(id.0 as usize)
    }

    /// The entry for `key` in mapping `id`, if both exist.
    pub fn entry(&self, id: NodeId, key: &str) -> Option<&Entry> {
        self.node(id)?.entries().iter().find(|e| e.key.text == key)
    }

    /// The value node for `key` in mapping `id`.
    pub fn get(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.entry(id, key).map(|e| e.value)
    }

    /// Key/position pairs of a mapping, looking through value wrapping.
    ///
    /// A mapping yields its own keys. A sequence whose elements are
    /// single-entry mappings (`[{"a": ..}, {"b": ..}]`) yields the keys of
    /// those inner entries, unwrapping nested sequences the same way.
    pub fn keyed_entries(&self, id: NodeId) -> Vec<&Entry> {
        let mut out = Vec::new();
        self.collect_keyed(id, &mut out);
        out
    }

    fn collect_keyed<'a>(&'a self, id: NodeId, out: &mut Vec<&'a Entry>) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.value {
            GroundedValue::Mapping(entries) => out.extend(entries.iter()),
            GroundedValue::Sequence(items) => {
                for item in items {
                    match self.node(*item).map(|n| &n.value) {
                        Some(GroundedValue::Mapping(inner)) if inner.len() == 1 => {
                            out.push(&inner[0])
                        }
                        Some(GroundedValue::Sequence(_)) => self.collect_keyed(*item, out),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    /// Resolve a local JSON-pointer reference (`#/components/schemas/Pet`).
    ///
    /// Non-local targets (other files, URLs) are not resolvable here.
    pub fn resolve(&self, target: &str) -> Option<NodeId> {
        let pointer = target.strip_prefix('#')?;
        let mut current = self.root?;
        if pointer.is_empty() {
            return Some(current);
        }
        let pointer = pointer.strip_prefix('/')?;
        for raw in pointer.split('/') {
            let segment = raw.replace("~1", "/").replace("~0", "~");
            let node = self.node(current)?;
            current = match &node.value {
                GroundedValue::Mapping(entries) => {
                    entries.iter().find(|e| e.key.text == segment)?.value
                }
                GroundedValue::Sequence(items) => *items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Follow a reference target, and any references found there, to the
    /// node holding actual content. `None` when a step does not resolve or
    /// the references loop among themselves.
    pub fn final_target(&self, target: &str) -> Option<NodeId> {
        let mut seen = Vec::new();
        let mut id = self.resolve(target)?;
        while let Some(next) = self.node(id)?.reference_target() {
            if seen.contains(&id) {
                return None;
            }
            seen.push(id);
            id = self.resolve(next)?;
        }
        Some(id)
    }
}

/// Non-owning link from a semantic object back to the grounded node it was
/// derived from.
#[derive(Debug, Clone)]
pub struct GroundedHandle {
    doc: Weak<GroundedDoc>,
    id: NodeId,
}

impl GroundedHandle {
    pub fn new(doc: &Arc<GroundedDoc>, id: NodeId) -> Self {
        GroundedHandle {
            doc: Arc::downgrade(doc),
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The grounded document, if it is still alive.
    pub fn doc(&self) -> Option<Arc<GroundedDoc>> {
        self.doc.upgrade()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETS: &str = r##"{
  "openapi": "3.1.0",
  "components": {
    "schemas": {
      "Pet": {"type": "object"},
      "a/b": {"type": "string"},
      "Alias": {"$ref": "#/components/schemas/Pet"},
      "Broken": {"$ref": 42}
    }
  },
  "tags": [{"name": "pets"}, {"name": "owners"}]
}"##;

    #[test]
    fn resolves_local_pointers() {
        let doc = parse(PETS).unwrap();
        let pet = doc.resolve("#/components/schemas/Pet").unwrap();
        assert_eq!(doc.node(pet).unwrap().line(), 5);
        let escaped = doc.resolve("#/components/schemas/a~1b").unwrap();
        assert_eq!(doc.node(escaped).unwrap().line(), 6);
        let tag = doc.resolve("#/tags/1/name").unwrap();
        assert_eq!(
            doc.node(tag).unwrap().value(),
            &GroundedValue::Str("owners".into())
        );
        assert_eq!(doc.resolve("#"), doc.root());
    }

    #[test]
    fn unresolvable_pointers_yield_none() {
        let doc = parse(PETS).unwrap();
        assert!(doc.resolve("#/components/schemas/Missing").is_none());
        assert!(doc.resolve("#/tags/9").is_none());
        assert!(doc.resolve("other.json#/Pet").is_none());
    }

    #[test]
    fn marks_string_refs_only() {
        let doc = parse(PETS).unwrap();
        let alias = doc.resolve("#/components/schemas/Alias").unwrap();
        let alias = doc.node(alias).unwrap();
        assert!(alias.is_reference());
        assert_eq!(alias.reference_target(), Some("#/components/schemas/Pet"));

        let broken = doc.resolve("#/components/schemas/Broken").unwrap();
        assert!(!doc.node(broken).unwrap().is_reference());
    }

    #[test]
    fn final_target_follows_aliases() {
        let doc = parse(PETS).unwrap();
        assert_eq!(
            doc.final_target("#/components/schemas/Alias"),
            doc.resolve("#/components/schemas/Pet")
        );
        let looped = parse(r##"{"a": {"$ref": "#/b"}, "b": {"$ref": "#/a"}}"##).unwrap();
        assert_eq!(looped.final_target("#/a"), None);
    }

    #[test]
    fn keyed_entries_unwrap_single_entry_sequences() {
        let doc = parse("[{\"a\": 1}, [{\"b\": 2}], {\"c\": 3, \"d\": 4}]").unwrap();
        let root = doc.root().unwrap();
        let keys: Vec<&str> = doc
            .keyed_entries(root)
            .iter()
            .map(|e| e.key.text.as_str())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn handle_does_not_keep_document_alive() {
        let doc = parse("{}").unwrap();
        let handle = GroundedHandle::new(&doc, doc.root().unwrap());
        assert!(handle.doc().is_some());
        drop(doc);
        assert!(handle.doc().is_none());
    }
}
