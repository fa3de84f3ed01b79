//! Rendering semantic objects into ordered output trees.
//!
//! Rendering is a pure projection: fields are enumerated, each gets a
//! position key from the grounded graph, and entries are emitted in key
//! order (ties in declaration order). Nothing here mutates the semantic
//! graph, so one graph may be rendered from several threads at once.

use crate::correlate::{correlate, correlate_entries, Anchor};
use crate::field::{enumerate, FieldDescriptor, FieldKind, Presence, Semantic, Value};
use crate::grounded::{GroundedDoc, GroundedValue, NodeId};
use crate::output::OutputNode;
use crate::reference::{marker, ReferencePolicy};

/// Render `obj` under `policy`.
pub fn render(obj: &dyn Semantic, policy: ReferencePolicy) -> OutputNode {
    Renderer::new(policy).object(obj)
}

/// `render(policy)` on every semantic type.
pub trait Render {
    fn render(&self, policy: ReferencePolicy) -> OutputNode;
}

impl<T: Semantic> Render for T {
    fn render(&self, policy: ReferencePolicy) -> OutputNode {
        render(self, policy)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    policy: ReferencePolicy,
}

impl Renderer {
    pub fn new(policy: ReferencePolicy) -> Self {
        Renderer { policy }
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    /// Render a semantic object, applying the reference policy when the
    /// object is an indirection.
    pub fn object(&self, obj: &dyn Semantic) -> OutputNode {
        let Some(target) = obj.reference() else {
            return self.fields(obj);
        };
        match self.policy {
            ReferencePolicy::Preserve => marker(target),
            ReferencePolicy::Resolve => match obj.resolved() {
                Some(content) => self.object(content),
                None => {
                    tracing::debug!(
                        reference = target,
                        "no content to inline, rendering marker"
                    );
                    marker(target)
                }
            },
        }
    }

    fn fields(&self, obj: &dyn Semantic) -> OutputNode {
        let grounded = obj
            .grounded()
            .and_then(|h| h.doc().map(|doc| (doc, h.id())));
        let anchor: Anchor<'_> = grounded.as_ref().map(|(doc, id)| (&**doc, *id));

        let mut entries = Vec::new();
        for field in enumerate(obj) {
            let key = correlate(&field, anchor);
            let source = anchor.and_then(|(doc, owner)| {
                doc.get(owner, field.descriptor.key).map(|id| (doc, id))
            });
            if let Some(out) = self.value(&field.value, &field.descriptor, source) {
                entries.push((key, field.descriptor.key.to_owned(), out));
            }
        }
        entries.sort_by_key(|(key, _, _)| *key);
        OutputNode::Mapping(entries.into_iter().map(|(_, k, v)| (k, v)).collect())
    }

    /// Render one raw value. `source` is the grounded node the value was
    /// read from, when known. `None` means the value renders to nothing.
    pub fn value(
        &self,
        value: &Value<'_>,
        descriptor: &FieldDescriptor<'_>,
        source: Anchor<'_>,
    ) -> Option<OutputNode> {
        let always = descriptor.presence == Presence::AlwaysRender;
        match value {
            Value::Absent | Value::Extensions(_) => None,
            Value::Explicit(inner) => self.value(inner, descriptor, source),
            Value::Bool(b) => Some(OutputNode::bool(*b)),
            Value::Int(n) => Some(OutputNode::number(n.to_string())),
            Value::Float(n) => {
                let text = source.and_then(|(doc, id)| match doc.node(id).map(|n| n.value()) {
                    Some(GroundedValue::Number(text)) => Some(text.as_str()),
                    _ => None,
                });
                let formatted = format_float(*n, text);
                if formatted.is_none() {
                    tracing::debug!(field = descriptor.name, value = %n, "non-finite number omitted");
                }
                formatted.map(OutputNode::number)
            }
            Value::Str(s) => Some(OutputNode::str(*s)),
            Value::Seq(items) => {
                if descriptor.kind == FieldKind::TypeLike && items.len() == 1 {
                    let item = source.and_then(|(doc, id)| item_source(doc, id, 0));
                    return self.value(&items[0], descriptor, item);
                }
                let rendered: Vec<OutputNode> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        let item_src = source.and_then(|(doc, id)| item_source(doc, id, i));
                        self.value(item, descriptor, item_src)
                    })
                    .collect();
                if rendered.is_empty() && !always {
                    None
                } else {
                    Some(OutputNode::Sequence(rendered))
                }
            }
            Value::Map(entries) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
                let positions = correlate_entries(&keys, source);
                let mut rendered = Vec::new();
                for ((key, value), (position, grounded)) in entries.iter().zip(positions) {
                    let entry_src = source.and_then(|(doc, _)| grounded.map(|id| (doc, id)));
                    if let Some(out) = self.value(value, descriptor, entry_src) {
                        rendered.push((position, (*key).to_owned(), out));
                    }
                }
                rendered.sort_by_key(|(position, _, _)| *position);
                if rendered.is_empty() && !always {
                    None
                } else {
                    Some(OutputNode::Mapping(
                        rendered.into_iter().map(|(_, k, v)| (k, v)).collect(),
                    ))
                }
            }
            Value::Object(obj) => Some(self.object(*obj)),
            Value::Opaque(raw) => Some(OutputNode::from_json(raw)),
        }
    }
}

fn item_source(doc: &GroundedDoc, id: NodeId, index: usize) -> Anchor<'_> {
    let item = doc.node(id)?.items().get(index)?;
    Some((doc, *item))
}

/// Format a float for output.
///
/// With grounded source text the original precision is kept: the text is
/// reused verbatim when it still denotes `n`, otherwise `n` is printed with
/// as many decimals as the text had. Without source text the shortest
/// round-trip form is used. Non-finite values have no textual form.
pub fn format_float(n: f64, source: Option<&str>) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    if let Some(text) = source {
        if text.parse::<f64>().ok() == Some(n) {
            return Some(text.to_owned());
        }
        if !text.contains(['e', 'E']) {
            let decimals = text.split_once('.').map_or(0, |(_, frac)| frac.len());
            return Some(format!("{:.*}", decimals, n));
        }
    }
    Some(format!("{}", n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Extensions, Field};
    use crate::grounded::{parse, GroundedHandle};

    #[derive(Default)]
    struct Widget {
        name: String,
        weight: Option<f64>,
        kind: Vec<String>,
        labels: std::collections::BTreeMap<String, Vec<String>>,
        extensions: Extensions,
        grounded: Option<GroundedHandle>,
    }

    impl Semantic for Widget {
        fn kind(&self) -> &'static str {
            "Widget"
        }

        fn grounded(&self) -> Option<&GroundedHandle> {
            self.grounded.as_ref()
        }

        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::named("name", Value::str(&self.name)),
                Field::named("weight", Value::number(self.weight)),
                Field::type_like("kind", "type", &self.kind),
                Field::named("labels", Value::string_lists(&self.labels)),
                Field::extensions(&self.extensions),
            ]
        }
    }

    #[test]
    fn float_formatting() {
        assert_eq!(format_float(2.2, Some("2.20")).as_deref(), Some("2.20"));
        assert_eq!(format_float(3.5, Some("2.20")).as_deref(), Some("3.50"));
        assert_eq!(format_float(4.0, Some("3")).as_deref(), Some("4"));
        assert_eq!(format_float(3.0, None).as_deref(), Some("3"));
        assert_eq!(format_float(0.1, None).as_deref(), Some("0.1"));
        assert_eq!(format_float(1500.0, Some("1.5e3")).as_deref(), Some("1.5e3"));
        assert_eq!(format_float(f64::NAN, None), None);
        assert_eq!(format_float(f64::INFINITY, Some("1")), None);
    }

    #[test]
    fn type_like_single_element_is_scalar() {
        let w = Widget {
            kind: vec!["chicken".into()],
            ..Default::default()
        };
        let out = render(&w, ReferencePolicy::Preserve);
        assert_eq!(out.get("type").and_then(|n| n.as_str()), Some("chicken"));

        let w = Widget {
            kind: vec!["string".into(), "null".into()],
            ..Default::default()
        };
        let out = render(&w, ReferencePolicy::Preserve);
        assert_eq!(out.get("type").and_then(|n| n.as_sequence()).map(|s| s.len()), Some(2));
    }

    #[test]
    fn grounded_order_and_precision_survive_mutation() {
        let doc = parse("{\n\"labels\": {\"b\": [], \"a\": [\"x\"]},\n\"weight\": 2.20,\n\"name\": \"w\"\n}").unwrap();
        let mut w = Widget {
            name: "w".into(),
            weight: Some(2.2),
            grounded: Some(GroundedHandle::new(&doc, doc.root().unwrap())),
            ..Default::default()
        };
        w.labels.insert("a".into(), vec!["x".into()]);
        w.labels.insert("b".into(), vec![]);
        w.labels.insert("c".into(), vec!["new".into()]);

        let out = render(&w, ReferencePolicy::Preserve);
        assert_eq!(out.keys(), vec!["labels", "weight", "name"]);
        assert_eq!(out.get("weight").and_then(|n| n.as_number()), Some("2.20"));
        // "b" is empty and renders nothing; "c" is new and sorts last.
        assert_eq!(out.get("labels").map(|n| n.keys()), Some(vec!["a", "c"]));

        w.name = "renamed".into();
        w.weight = Some(7.0);
        let out = render(&w, ReferencePolicy::Preserve);
        assert_eq!(out.keys(), vec!["labels", "weight", "name"]);
        assert_eq!(out.get("weight").and_then(|n| n.as_number()), Some("7.00"));
    }

    #[test]
    fn new_map_entries_follow_key_order() {
        let doc = parse("{\"labels\": {\"m\": [\"x\"]}}").unwrap();
        let mut w = Widget {
            grounded: Some(GroundedHandle::new(&doc, doc.root().unwrap())),
            ..Default::default()
        };
        w.labels.insert("zeta".into(), vec!["1".into()]);
        w.labels.insert("m".into(), vec!["x".into()]);
        w.labels.insert("beta".into(), vec!["2".into()]);
        let out = render(&w, ReferencePolicy::Preserve);
        assert_eq!(out.get("labels").map(|n| n.keys()), Some(vec!["m", "beta", "zeta"]));
    }

    #[test]
    fn unset_and_empty_fields_are_omitted() {
        let out = render(&Widget::default(), ReferencePolicy::Preserve);
        assert!(out.keys().is_empty());
    }
}
