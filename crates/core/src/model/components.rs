use std::collections::BTreeMap;

use crate::build::{Build, Scope};
use crate::error::BuildError;
use crate::field::{Extensions, Field, Semantic, Value};
use crate::grounded::{GroundedHandle, NodeId};
use crate::reference::Refable;

use super::{Header, Parameter, RequestBody, Response, Schema};

/// Reusable definitions. Every collection is built in parallel, one task
/// per named entry.
#[derive(Debug, Clone, Default)]
pub struct Components {
    pub schemas: BTreeMap<String, Refable<Schema>>,
    pub responses: BTreeMap<String, Refable<Response>>,
    pub parameters: BTreeMap<String, Refable<Parameter>>,
    pub request_bodies: BTreeMap<String, Refable<RequestBody>>,
    pub headers: BTreeMap<String, Refable<Header>>,
    pub security_schemes: BTreeMap<String, Refable<SecurityScheme>>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Components {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("schemas", Value::object_map(&self.schemas)),
            Field::named("responses", Value::object_map(&self.responses)),
            Field::named("parameters", Value::object_map(&self.parameters)),
            Field::new(
                "request_bodies",
                "requestBodies",
                Value::object_map(&self.request_bodies),
            ),
            Field::named("headers", Value::object_map(&self.headers)),
            Field::new(
                "security_schemes",
                "securitySchemes",
                Value::object_map(&self.security_schemes),
            ),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Components {
    const KIND: &'static str = "Components";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Components {
            schemas: m.collection("schemas", "components.schemas")?,
            responses: m.collection("responses", "components.responses")?,
            parameters: m.collection("parameters", "components.parameters")?,
            request_bodies: m.collection("requestBodies", "components.requestBodies")?,
            headers: m.collection("headers", "components.headers")?,
            security_schemes: m.collection("securitySchemes", "components.securitySchemes")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecurityScheme {
    pub scheme_type: String,
    pub description: String,
    pub name: String,
    pub location: String,
    pub scheme: String,
    pub bearer_format: String,
    /// OAuth flow objects, kept as written.
    pub flows: Option<serde_json::Value>,
    pub open_id_connect_url: String,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for SecurityScheme {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("scheme_type", "type", Value::str(&self.scheme_type)).always(),
            Field::named("description", Value::str(&self.description)),
            Field::named("name", Value::str(&self.name)),
            Field::new("location", "in", Value::str(&self.location)),
            Field::named("scheme", Value::str(&self.scheme)),
            Field::new("bearer_format", "bearerFormat", Value::str(&self.bearer_format)),
            Field::named("flows", Value::opaque(&self.flows)),
            Field::new(
                "open_id_connect_url",
                "openIdConnectUrl",
                Value::str(&self.open_id_connect_url),
            ),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for SecurityScheme {
    const KIND: &'static str = "SecurityScheme";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(SecurityScheme {
            scheme_type: m.string("type")?,
            description: m.string("description")?,
            name: m.string("name")?,
            location: m.string("in")?,
            scheme: m.string("scheme")?,
            bearer_format: m.string("bearerFormat")?,
            flows: m.opaque("flows"),
            open_id_connect_url: m.string("openIdConnectUrl")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}
