use std::collections::BTreeMap;

use crate::build::{Build, Scope};
use crate::error::BuildError;
use crate::field::{Extensions, Field, Semantic, Value};
use crate::grounded::{GroundedHandle, NodeId};
use crate::reference::Refable;

use super::{ExternalDocs, Schema, Server};

// ──────────────────────────────────────────────
// Paths
// ──────────────────────────────────────────────

/// Path templates mapped to their path items. Entries render as siblings
/// of the `paths` object's extensions.
#[derive(Debug, Clone, Default)]
pub struct Paths {
    pub items: BTreeMap<String, PathItem>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Paths {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::flatten("items", Value::object_map(&self.items)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Paths {
    const KIND: &'static str = "Paths";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Paths {
            items: m.own_collection("paths"),
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathItem {
    /// `$ref` to an externally defined path item, kept as written.
    pub reference: String,
    pub summary: String,
    pub description: String,
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    pub servers: Vec<Server>,
    pub parameters: Vec<Refable<Parameter>>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl PathItem {
    /// Operations that are set, with their HTTP method.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
        .collect()
    }
}

impl Semantic for PathItem {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("reference", "$ref", Value::str(&self.reference)),
            Field::named("summary", Value::str(&self.summary)),
            Field::named("description", Value::str(&self.description)),
            Field::named("get", Value::object(&self.get)),
            Field::named("put", Value::object(&self.put)),
            Field::named("post", Value::object(&self.post)),
            Field::named("delete", Value::object(&self.delete)),
            Field::named("options", Value::object(&self.options)),
            Field::named("head", Value::object(&self.head)),
            Field::named("patch", Value::object(&self.patch)),
            Field::named("trace", Value::object(&self.trace)),
            Field::named("servers", Value::objects(&self.servers)),
            Field::named("parameters", Value::objects(&self.parameters)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for PathItem {
    const KIND: &'static str = "PathItem";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(PathItem {
            reference: m.string("$ref")?,
            summary: m.string("summary")?,
            description: m.string("description")?,
            get: m.object("get")?,
            put: m.object("put")?,
            post: m.object("post")?,
            delete: m.object("delete")?,
            options: m.object("options")?,
            head: m.object("head")?,
            patch: m.object("patch")?,
            trace: m.object("trace")?,
            servers: m.objects("servers")?,
            parameters: m.objects("parameters")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

// ──────────────────────────────────────────────
// Operations
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Operation {
    pub tags: Vec<String>,
    pub summary: String,
    pub description: String,
    pub external_docs: Option<ExternalDocs>,
    pub operation_id: String,
    pub parameters: Vec<Refable<Parameter>>,
    pub request_body: Option<Refable<RequestBody>>,
    pub responses: Option<Responses>,
    pub deprecated: Option<bool>,
    pub security: Vec<SecurityRequirement>,
    pub servers: Vec<Server>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Operation {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("tags", Value::strings(&self.tags)),
            Field::named("summary", Value::str(&self.summary)),
            Field::named("description", Value::str(&self.description)),
            Field::new("external_docs", "externalDocs", Value::object(&self.external_docs)),
            Field::new("operation_id", "operationId", Value::str(&self.operation_id)),
            Field::named("parameters", Value::objects(&self.parameters)),
            Field::new("request_body", "requestBody", Value::object(&self.request_body)),
            Field::named("responses", Value::object(&self.responses)),
            Field::named("deprecated", Value::flag(self.deprecated)),
            Field::named("security", Value::objects(&self.security)),
            Field::named("servers", Value::objects(&self.servers)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Operation {
    const KIND: &'static str = "Operation";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Operation {
            tags: m.strings("tags")?,
            summary: m.string("summary")?,
            description: m.string("description")?,
            external_docs: m.object("externalDocs")?,
            operation_id: m.string("operationId")?,
            parameters: m.objects("parameters")?,
            request_body: m.object("requestBody")?,
            responses: m.object("responses")?,
            deprecated: m.boolean("deprecated")?,
            security: m.objects("security")?,
            servers: m.objects("servers")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

/// Status codes (and `default`) mapped to responses.
#[derive(Debug, Clone, Default)]
pub struct Responses {
    pub codes: BTreeMap<String, Refable<Response>>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Responses {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::flatten("codes", Value::object_map(&self.codes)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Responses {
    const KIND: &'static str = "Responses";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Responses {
            codes: m.own_collection("responses"),
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

/// Required scopes per security scheme. An empty requirement means
/// "no authentication".
#[derive(Debug, Clone, Default)]
pub struct SecurityRequirement {
    pub schemes: BTreeMap<String, Vec<String>>,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for SecurityRequirement {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        // Scope lists render even when empty.
        vec![Field::flatten("schemes", Value::string_lists(&self.schemes)).always()]
    }
}

impl Build for SecurityRequirement {
    const KIND: &'static str = "SecurityRequirement";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(SecurityRequirement {
            schemes: m.own_string_lists()?,
            grounded: Some(m.handle()),
        })
    }
}

// ──────────────────────────────────────────────
// Parameters, bodies, responses
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Parameter {
    pub name: String,
    pub location: String,
    pub description: String,
    pub required: Option<bool>,
    pub deprecated: Option<bool>,
    pub allow_empty_value: Option<bool>,
    pub style: String,
    pub explode: Option<bool>,
    pub allow_reserved: Option<bool>,
    pub schema: Option<Refable<Schema>>,
    pub example: Option<serde_json::Value>,
    pub content: BTreeMap<String, MediaType>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Parameter {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("name", Value::str(&self.name)).always(),
            Field::new("location", "in", Value::str(&self.location)).always(),
            Field::named("description", Value::str(&self.description)),
            Field::named("required", Value::flag(self.required)),
            Field::named("deprecated", Value::flag(self.deprecated)),
            Field::new(
                "allow_empty_value",
                "allowEmptyValue",
                Value::flag(self.allow_empty_value),
            ),
            Field::named("style", Value::str(&self.style)),
            Field::named("explode", Value::flag(self.explode)),
            Field::new("allow_reserved", "allowReserved", Value::flag(self.allow_reserved)),
            Field::named("schema", Value::object(&self.schema)),
            Field::named("example", Value::opaque(&self.example)),
            Field::named("content", Value::object_map(&self.content)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Parameter {
    const KIND: &'static str = "Parameter";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Parameter {
            name: m.string("name")?,
            location: m.string("in")?,
            description: m.string("description")?,
            required: m.boolean("required")?,
            deprecated: m.boolean("deprecated")?,
            allow_empty_value: m.boolean("allowEmptyValue")?,
            style: m.string("style")?,
            explode: m.boolean("explode")?,
            allow_reserved: m.boolean("allowReserved")?,
            schema: m.object("schema")?,
            example: m.opaque("example"),
            content: m.object_map("content")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    pub description: String,
    pub content: BTreeMap<String, MediaType>,
    pub required: Option<bool>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for RequestBody {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("description", Value::str(&self.description)),
            Field::named("content", Value::object_map(&self.content)),
            Field::named("required", Value::flag(self.required)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for RequestBody {
    const KIND: &'static str = "RequestBody";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(RequestBody {
            description: m.string("description")?,
            content: m.object_map("content")?,
            required: m.boolean("required")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaType {
    pub schema: Option<Refable<Schema>>,
    pub example: Option<serde_json::Value>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for MediaType {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("schema", Value::object(&self.schema)),
            Field::named("example", Value::opaque(&self.example)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for MediaType {
    const KIND: &'static str = "MediaType";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(MediaType {
            schema: m.object("schema")?,
            example: m.opaque("example"),
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Response {
    pub description: String,
    pub headers: BTreeMap<String, Refable<Header>>,
    pub content: BTreeMap<String, MediaType>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Response {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("description", Value::str(&self.description)).always(),
            Field::named("headers", Value::object_map(&self.headers)),
            Field::named("content", Value::object_map(&self.content)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Response {
    const KIND: &'static str = "Response";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Response {
            description: m.string("description")?,
            headers: m.object_map("headers")?,
            content: m.object_map("content")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Header {
    pub description: String,
    pub required: Option<bool>,
    pub deprecated: Option<bool>,
    pub schema: Option<Refable<Schema>>,
    pub example: Option<serde_json::Value>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Header {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("description", Value::str(&self.description)),
            Field::named("required", Value::flag(self.required)),
            Field::named("deprecated", Value::flag(self.deprecated)),
            Field::named("schema", Value::object(&self.schema)),
            Field::named("example", Value::opaque(&self.example)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Header {
    const KIND: &'static str = "Header";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Header {
            description: m.string("description")?,
            required: m.boolean("required")?,
            deprecated: m.boolean("deprecated")?,
            schema: m.object("schema")?,
            example: m.opaque("example"),
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}
