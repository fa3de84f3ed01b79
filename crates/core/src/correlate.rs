//! Position correlation: where in the source did a field come from?
//!
//! Every enumerated field gets a [`PositionKey`]. Fields found in the
//! grounded graph sort by their source position; new fields get sentinel
//! keys that place them after everything positioned, and spread extensions
//! get an even later sentinel family.

use crate::field::{Enumerated, FieldKind, Value};
use crate::grounded::{GroundedDoc, GroundedValue, NodeId, Pos};

const NEW_CONTENT: u64 = 1 << 32;
const UNRESOLVED_EXTENSION: u64 = 1 << 40;

/// Sortable position of a rendered field among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PositionKey {
    line: u64,
    column: u32,
}

impl PositionKey {
    pub fn at(pos: Pos) -> Self {
        PositionKey {
            line: pos.line as u64,
            column: pos.column,
        }
    }

    pub fn new_content(index: usize) -> Self {
        PositionKey {
            line: NEW_CONTENT + index as u64,
            column: 0,
        }
    }

    pub fn unresolved_extension(index: usize) -> Self {
        PositionKey {
            line: UNRESOLVED_EXTENSION + index as u64,
            column: 0,
        }
    }

    /// Whether this key came from a real source position.
    pub fn is_grounded(&self) -> bool {
        self.line < NEW_CONTENT
    }

    pub fn line(&self) -> u64 {
        self.line
    }
}

/// A grounded mapping node: the owner of the fields being correlated.
pub type Anchor<'g> = Option<(&'g GroundedDoc, NodeId)>;

/// Compute the position key of one enumerated field of the object grounded
/// at `anchor`.
pub fn correlate(field: &Enumerated<'_>, anchor: Anchor<'_>) -> PositionKey {
    if field.descriptor.kind == FieldKind::Extension {
        return correlate_extension(field, anchor);
    }
    let Some((doc, owner)) = anchor else {
        return PositionKey::new_content(field.ordinal);
    };
    let Some(entry) = doc.entry(owner, field.descriptor.key) else {
        tracing::debug!(
            key = field.descriptor.key,
            "no grounded counterpart, placing as new content"
        );
        return PositionKey::new_content(field.ordinal);
    };
    let Some(node) = doc.node(entry.value) else {
        return PositionKey::at(entry.key.pos);
    };

    match (&node.value, &field.value) {
        (GroundedValue::Sequence(items), _) => items
            .iter()
            .filter_map(|id| doc.node(*id))
            .map(|n| n.pos)
            .min()
            .map_or(PositionKey::at(entry.key.pos), PositionKey::at),
        (GroundedValue::Mapping(_), Value::Object(_)) => {
            if node.is_reference() {
                // Inlined references sort where they were written.
                PositionKey::at(entry.key.pos)
            } else {
                PositionKey::at(node.pos)
            }
        }
        (GroundedValue::Mapping(entries), _) => entries
            .iter()
            .map(|e| e.key.pos)
            .min()
            .map_or(PositionKey::at(entry.key.pos), PositionKey::at),
        _ => PositionKey::at(node.pos),
    }
}

fn correlate_extension(field: &Enumerated<'_>, anchor: Anchor<'_>) -> PositionKey {
    let record = anchor.and_then(|(doc, owner)| doc.entry(owner, field.descriptor.key));
    match record {
        Some(entry) if entry.key.pos.is_known() => PositionKey::at(entry.key.pos),
        _ => PositionKey::unresolved_extension(field.ordinal),
    }
}

/// Per-entry correlation for a mapping-valued field.
///
/// Each key is matched against the keys of the grounded mapping `node`
/// (looking through single-entry wrappers). Unmatched keys get a local
/// new-content sentinel offset by their index within `keys`, so new entries
/// follow the order of the semantic map. Model maps are `BTreeMap`s, which
/// puts new entries in key order rather than insertion order; the extension
/// bag is the one place insertion order is kept. Returns the key and the
/// matched grounded value node for each entry.
pub fn correlate_entries(
    keys: &[&str],
    node: Anchor<'_>,
) -> Vec<(PositionKey, Option<NodeId>)> {
    let grounded = node.map(|(doc, id)| doc.keyed_entries(id)).unwrap_or_default();
    keys.iter()
        .enumerate()
        .map(|(index, key)| {
            match grounded.iter().find(|e| e.key.text == *key) {
                Some(entry) if entry.key.pos.is_known() => {
                    (PositionKey::at(entry.key.pos), Some(entry.value))
                }
                Some(entry) => (PositionKey::new_content(index), Some(entry.value)),
                None => (PositionKey::new_content(index), None),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, Presence};
    use crate::grounded::parse;

    fn field<'a>(key: &'a str, kind: FieldKind, value: Value<'a>, ordinal: usize) -> Enumerated<'a> {
        Enumerated {
            descriptor: FieldDescriptor {
                name: key,
                key,
                presence: Presence::OmitIfEmpty,
                kind,
            },
            value,
            ordinal,
        }
    }

    const SRC: &str = r##"{
  "title": "pets",
  "tags": [
    "b",
    "a"
  ],
  "props": {
    "z": 1,
    "y": 2
  },
  "inline": {
    "k": true
  },
  "ref":
    {"$ref": "#/inline"},
  "x-known": 1
}"##;

    #[test]
    fn scalars_sequences_and_mappings() {
        let doc = parse(SRC).unwrap();
        let anchor = Some((&*doc, doc.root().unwrap()));
        let title = correlate(&field("title", FieldKind::Plain, Value::Str("pets"), 0), anchor);
        assert_eq!(title.line(), 2);
        let tags = correlate(&field("tags", FieldKind::Plain, Value::Seq(vec![]), 1), anchor);
        assert_eq!(tags.line(), 4);
        let props = correlate(&field("props", FieldKind::Plain, Value::Map(vec![]), 2), anchor);
        assert_eq!(props.line(), 8);
    }

    #[test]
    fn references_sort_at_point_of_use() {
        struct Nothing;
        impl crate::field::Semantic for Nothing {
            fn kind(&self) -> &'static str {
                "Nothing"
            }
            fn grounded(&self) -> Option<&crate::grounded::GroundedHandle> {
                None
            }
            fn fields(&self) -> Vec<crate::field::Field<'_>> {
                Vec::new()
            }
        }
        let doc = parse(SRC).unwrap();
        let anchor = Some((&*doc, doc.root().unwrap()));
        let inline = correlate(&field("inline", FieldKind::Plain, Value::Object(&Nothing), 3), anchor);
        assert_eq!(inline.line(), 11);
        let reference = correlate(&field("ref", FieldKind::Plain, Value::Object(&Nothing), 4), anchor);
        assert_eq!(reference.line(), 14);
    }

    #[test]
    fn new_fields_sort_after_positioned_ones() {
        let doc = parse(SRC).unwrap();
        let anchor = Some((&*doc, doc.root().unwrap()));
        let title = correlate(&field("title", FieldKind::Plain, Value::Str("x"), 0), anchor);
        let added = correlate(&field("summary", FieldKind::Plain, Value::Str("x"), 7), anchor);
        let later = correlate(&field("other", FieldKind::Plain, Value::Str("x"), 8), anchor);
        assert!(!added.is_grounded());
        assert!(title < added && added < later);
        let orphan = correlate(&field("title", FieldKind::Plain, Value::Str("x"), 0), None);
        assert_eq!(orphan, PositionKey::new_content(0));
    }

    #[test]
    fn extensions_sort_after_new_fields() {
        let doc = parse(SRC).unwrap();
        let anchor = Some((&*doc, doc.root().unwrap()));
        let known = correlate(&field("x-known", FieldKind::Extension, Value::Int(1), 0), anchor);
        assert_eq!(known.line(), 16);
        let unknown = correlate(&field("x-new", FieldKind::Extension, Value::Int(1), 1), anchor);
        let new_field = correlate(&field("summary", FieldKind::Plain, Value::Str("x"), 99), anchor);
        assert!(new_field < unknown);
        let orphan = correlate(&field("x-new", FieldKind::Extension, Value::Int(1), 0), None);
        assert_eq!(orphan, PositionKey::unresolved_extension(0));
    }

    #[test]
    fn entries_match_by_key_with_local_sentinels() {
        let doc = parse(SRC).unwrap();
        let props = doc.get(doc.root().unwrap(), "props").unwrap();
        let keyed = correlate_entries(&["y", "new", "z"], Some((&*doc, props)));
        assert_eq!(keyed[0].0.line(), 9);
        assert_eq!(keyed[1], (PositionKey::new_content(1), None));
        assert_eq!(keyed[2].0.line(), 8);
        assert!(keyed[2].1.is_some());
    }
}
