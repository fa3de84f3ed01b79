//! Field tables and the field enumerator.
//!
//! Each semantic type lists its fields once, in declaration order, through
//! [`Semantic::fields`]. [`enumerate`] turns that table into the flat list
//! of renderable fields: hidden fields and empty values are dropped, and the
//! extension bag is spread into sibling fields.

use std::collections::BTreeMap;

use crate::grounded::GroundedHandle;
use crate::EXTENSION_PREFIX;

/// Serialization key that marks a field as never rendered.
pub const NEVER_RENDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Skip the field when its value is the zero value of its type.
    OmitIfEmpty,
    /// Render the field even when it holds a zero value.
    AlwaysRender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    /// A "string or list of strings" field; a one-element list renders as a
    /// bare scalar.
    TypeLike,
    /// A map whose entries render as siblings of the owning object's fields
    /// (path templates in `paths`, status codes in `responses`).
    Flatten,
    /// The extension bag itself.
    ExtensionBag,
    /// One entry spread out of an extension bag.
    Extension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor<'a> {
    pub name: &'a str,
    pub key: &'a str,
    pub presence: Presence,
    pub kind: FieldKind,
}

/// The raw value of a field, classified by shape.
#[derive(Clone)]
pub enum Value<'a> {
    /// Unset optional.
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'a str),
    /// An optional scalar that has been explicitly set. Never counts as empty,
    /// so `Some(false)` still renders.
    Explicit(Box<Value<'a>>),
    Seq(Vec<Value<'a>>),
    Map(Vec<(&'a str, Value<'a>)>),
    Object(&'a dyn Semantic),
    /// Free-form data (examples, defaults, extension values).
    Opaque(&'a serde_json::Value),
    Extensions(&'a Extensions),
}

impl<'a> Value<'a> {
    pub fn str(s: &'a str) -> Self {
        Value::Str(s)
    }

    pub fn flag(b: Option<bool>) -> Self {
        b.map_or(Value::Absent, |b| Value::Explicit(Box::new(Value::Bool(b))))
    }

    pub fn number(n: Option<f64>) -> Self {
        n.map_or(Value::Absent, |n| Value::Explicit(Box::new(Value::Float(n))))
    }

    pub fn integer(n: Option<i64>) -> Self {
        n.map_or(Value::Absent, |n| Value::Explicit(Box::new(Value::Int(n))))
    }

    pub fn strings(items: &'a [String]) -> Self {
        Value::Seq(items.iter().map(|s| Value::Str(s)).collect())
    }

    pub fn object<T: Semantic>(o: &'a Option<T>) -> Self {
        o.as_ref().map_or(Value::Absent, |o| Value::Object(o))
    }

    pub fn boxed<T: Semantic>(o: &'a Option<Box<T>>) -> Self {
        o.as_deref().map_or(Value::Absent, |o| Value::Object(o))
    }

    pub fn objects<T: Semantic>(items: &'a [T]) -> Self {
        Value::Seq(items.iter().map(|o| Value::Object(o)).collect())
    }

    pub fn object_map<T: Semantic>(map: &'a BTreeMap<String, T>) -> Self {
        Value::Map(
            map.iter()
                .map(|(k, o)| (k.as_str(), Value::Object(o)))
                .collect(),
        )
    }

    pub fn string_lists(map: &'a BTreeMap<String, Vec<String>>) -> Self {
        Value::Map(
            map.iter()
                .map(|(k, v)| (k.as_str(), Value::strings(v)))
                .collect(),
        )
    }

    pub fn opaque(v: &'a Option<serde_json::Value>) -> Self {
        v.as_ref().map_or(Value::Absent, Value::Opaque)
    }

    pub fn opaques(items: &'a [serde_json::Value]) -> Self {
        Value::Seq(items.iter().map(Value::Opaque).collect())
    }

    /// Whether this is its type's zero value.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Absent => true,
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Float(n) => *n == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::Explicit(_) => false,
            Value::Seq(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Object(_) => false,
            Value::Opaque(_) => false,
            Value::Extensions(ext) => ext.is_empty(),
        }
    }
}

impl std::fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Absent => write!(f, "Absent"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Float(n) => write!(f, "Float({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Explicit(v) => write!(f, "Explicit({:?})", v),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Object(o) => write!(f, "Object({})", o.kind()),
            Value::Opaque(v) => write!(f, "Opaque({})", v),
            Value::Extensions(ext) => write!(f, "Extensions({})", ext.len()),
        }
    }
}

/// One row of a semantic type's field table.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    pub descriptor: FieldDescriptor<'a>,
    pub value: Value<'a>,
}

impl<'a> Field<'a> {
    pub fn new(name: &'a str, key: &'a str, value: Value<'a>) -> Self {
        Field {
            descriptor: FieldDescriptor {
                name,
                key,
                presence: Presence::OmitIfEmpty,
                kind: FieldKind::Plain,
            },
            value,
        }
    }

    /// Field whose rust name and serialization key are the same.
    pub fn named(key: &'a str, value: Value<'a>) -> Self {
        Field::new(key, key, value)
    }

    pub fn hidden(name: &'a str, value: Value<'a>) -> Self {
        Field::new(name, NEVER_RENDER, value)
    }

    pub fn type_like(name: &'a str, key: &'a str, items: &'a [String]) -> Self {
        let mut field = Field::new(name, key, Value::strings(items));
        field.descriptor.kind = FieldKind::TypeLike;
        field
    }

    pub fn flatten(name: &'a str, value: Value<'a>) -> Self {
        let mut field = Field::new(name, NEVER_RENDER, value);
        field.descriptor.kind = FieldKind::Flatten;
        field
    }

    pub fn extensions(bag: &'a Extensions) -> Self {
        let mut field = Field::new("extensions", NEVER_RENDER, Value::Extensions(bag));
        field.descriptor.kind = FieldKind::ExtensionBag;
        field
    }

    pub fn always(mut self) -> Self {
        self.descriptor.presence = Presence::AlwaysRender;
        self
    }
}

/// A semantic object: a mutable node that can describe its own fields.
pub trait Semantic {
    /// Type name for diagnostics.
    fn kind(&self) -> &'static str;

    /// The grounded node this object was derived from, if any.
    fn grounded(&self) -> Option<&GroundedHandle>;

    /// The field table, in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;

    /// Target path when this object is a reference.
    fn reference(&self) -> Option<&str> {
        None
    }

    /// Content of the referenced object, when it is known.
    fn resolved(&self) -> Option<&dyn Semantic> {
        None
    }
}

/// Insertion-ordered bag of `x-` vendor extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    entries: Vec<(String, serde_json::Value)>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an extension. Replacing keeps the original slot.
    pub fn insert(&mut self, name: impl Into<String>, value: serde_json::Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<serde_json::Value> {
        let at = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(at).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Whether a mapping key names a vendor extension.
pub fn is_extension_key(key: &str) -> bool {
    key.starts_with(EXTENSION_PREFIX)
}

/// A field that survived enumeration.
#[derive(Debug, Clone)]
pub struct Enumerated<'a> {
    pub descriptor: FieldDescriptor<'a>,
    pub value: Value<'a>,
    /// Declaration index of the source field, or the entry index inside the
    /// extension bag for spread extensions.
    pub ordinal: usize,
}

/// Enumerate the renderable fields of `obj` in declaration order.
pub fn enumerate(obj: &dyn Semantic) -> Vec<Enumerated<'_>> {
    let mut out = Vec::new();
    for (ordinal, field) in obj.fields().into_iter().enumerate() {
        let Field { descriptor, value } = field;
        match (descriptor.kind, value) {
            (FieldKind::ExtensionBag, Value::Extensions(bag)) => {
                for (index, (name, raw)) in bag.iter().enumerate() {
                    out.push(Enumerated {
                        descriptor: FieldDescriptor {
                            name,
                            key: name,
                            presence: Presence::AlwaysRender,
                            kind: FieldKind::Extension,
                        },
                        value: Value::Opaque(raw),
                        ordinal: index,
                    });
                }
            }
            (FieldKind::Flatten, Value::Map(entries)) => {
                for (key, value) in entries {
                    out.push(Enumerated {
                        descriptor: FieldDescriptor {
                            name: key,
                            key,
                            presence: descriptor.presence,
                            kind: FieldKind::Plain,
                        },
                        value,
                        ordinal,
                    });
                }
            }
            (FieldKind::ExtensionBag | FieldKind::Flatten, other) => {
                tracing::debug!(
                    owner = obj.kind(),
                    field = descriptor.name,
                    value = ?other,
                    "field shape does not match its kind, omitted"
                );
            }
            (_, value) => {
                if descriptor.key == NEVER_RENDER {
                    continue;
                }
                if descriptor.presence == Presence::OmitIfEmpty && value.is_empty() {
                    continue;
                }
                out.push(Enumerated {
                    descriptor,
                    value,
                    ordinal,
                });
            }
        }
    }
    out
}
