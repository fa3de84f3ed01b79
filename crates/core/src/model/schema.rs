use std::collections::BTreeMap;

use crate::build::{Build, Scope};
use crate::error::BuildError;
use crate::field::{Extensions, Field, Semantic, Value};
use crate::grounded::{GroundedHandle, GroundedValue, NodeId};
use crate::reference::Refable;

/// A JSON Schema object.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// One type name or a list of them. A single name renders as a scalar.
    pub types: Vec<String>,
    pub format: String,
    pub title: String,
    pub description: String,
    pub multiple_of: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub max_length: Option<i64>,
    pub min_length: Option<i64>,
    pub pattern: String,
    pub max_items: Option<i64>,
    pub min_items: Option<i64>,
    pub unique_items: Option<bool>,
    pub required: Vec<String>,
    pub enumeration: Vec<serde_json::Value>,
    pub constant: Option<serde_json::Value>,
    pub properties: BTreeMap<String, Refable<Schema>>,
    pub additional_properties: Option<AdditionalProperties>,
    pub items: Option<Box<Refable<Schema>>>,
    pub all_of: Vec<Refable<Schema>>,
    pub one_of: Vec<Refable<Schema>>,
    pub any_of: Vec<Refable<Schema>>,
    pub not: Option<Box<Refable<Schema>>>,
    pub nullable: Option<bool>,
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub deprecated: Option<bool>,
    pub default: Option<serde_json::Value>,
    pub example: Option<serde_json::Value>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Schema {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::type_like("types", "type", &self.types),
            Field::named("format", Value::str(&self.format)),
            Field::named("title", Value::str(&self.title)),
            Field::named("description", Value::str(&self.description)),
            Field::new("multiple_of", "multipleOf", Value::number(self.multiple_of)),
            Field::named("maximum", Value::number(self.maximum)),
            Field::new(
                "exclusive_maximum",
                "exclusiveMaximum",
                Value::number(self.exclusive_maximum),
            ),
            Field::named("minimum", Value::number(self.minimum)),
            Field::new(
                "exclusive_minimum",
                "exclusiveMinimum",
                Value::number(self.exclusive_minimum),
            ),
            Field::new("max_length", "maxLength", Value::integer(self.max_length)),
            Field::new("min_length", "minLength", Value::integer(self.min_length)),
            Field::named("pattern", Value::str(&self.pattern)),
            Field::new("max_items", "maxItems", Value::integer(self.max_items)),
            Field::new("min_items", "minItems", Value::integer(self.min_items)),
            Field::new("unique_items", "uniqueItems", Value::flag(self.unique_items)),
            Field::named("required", Value::strings(&self.required)),
            Field::new("enumeration", "enum", Value::opaques(&self.enumeration)),
            Field::new("constant", "const", Value::opaque(&self.constant)),
            Field::named("properties", Value::object_map(&self.properties)),
            Field::new(
                "additional_properties",
                "additionalProperties",
                self.additional_properties
                    .as_ref()
                    .map_or(Value::Absent, AdditionalProperties::value),
            ),
            Field::named("items", Value::boxed(&self.items)),
            Field::new("all_of", "allOf", Value::objects(&self.all_of)),
            Field::new("one_of", "oneOf", Value::objects(&self.one_of)),
            Field::new("any_of", "anyOf", Value::objects(&self.any_of)),
            Field::named("not", Value::boxed(&self.not)),
            Field::named("nullable", Value::flag(self.nullable)),
            Field::new("read_only", "readOnly", Value::flag(self.read_only)),
            Field::new("write_only", "writeOnly", Value::flag(self.write_only)),
            Field::named("deprecated", Value::flag(self.deprecated)),
            Field::named("default", Value::opaque(&self.default)),
            Field::named("example", Value::opaque(&self.example)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Schema {
    const KIND: &'static str = "Schema";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Schema {
            types: m.type_like("type")?,
            format: m.string("format")?,
            title: m.string("title")?,
            description: m.string("description")?,
            multiple_of: m.number("multipleOf")?,
            maximum: m.number("maximum")?,
            exclusive_maximum: m.number("exclusiveMaximum")?,
            minimum: m.number("minimum")?,
            exclusive_minimum: m.number("exclusiveMinimum")?,
            max_length: m.integer("maxLength")?,
            min_length: m.integer("minLength")?,
            pattern: m.string("pattern")?,
            max_items: m.integer("maxItems")?,
            min_items: m.integer("minItems")?,
            unique_items: m.boolean("uniqueItems")?,
            required: m.strings("required")?,
            enumeration: m.opaques("enum")?,
            constant: m.opaque("const"),
            properties: m.object_map("properties")?,
            additional_properties: m.object("additionalProperties")?,
            items: m.object("items")?.map(Box::new),
            all_of: m.objects("allOf")?,
            one_of: m.objects("oneOf")?,
            any_of: m.objects("anyOf")?,
            not: m.object("not")?.map(Box::new),
            nullable: m.boolean("nullable")?,
            read_only: m.boolean("readOnly")?,
            write_only: m.boolean("writeOnly")?,
            deprecated: m.boolean("deprecated")?,
            default: m.opaque("default"),
            example: m.opaque("example"),
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

/// `additionalProperties`: a plain allow/deny flag or a schema for the
/// extra properties.
#[derive(Debug, Clone)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Refable<Schema>>),
}

impl AdditionalProperties {
    fn value(&self) -> Value<'_> {
        match self {
            AdditionalProperties::Allowed(b) => Value::flag(Some(*b)),
            AdditionalProperties::Schema(schema) => Value::Object(schema.as_ref()),
        }
    }
}

impl Build for AdditionalProperties {
    const KIND: &'static str = "Schema";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        match scope.doc().node(id).map(|n| n.value()) {
            Some(GroundedValue::Bool(b)) => Ok(AdditionalProperties::Allowed(*b)),
            _ => Ok(AdditionalProperties::Schema(Box::new(Refable::build(scope, id)?))),
        }
    }
}
