use std::collections::BTreeMap;

use crate::build::{Build, Scope};
use crate::error::BuildError;
use crate::field::{Extensions, Field, Semantic, Value};
use crate::grounded::{GroundedHandle, NodeId};

use super::{Components, Paths, SecurityRequirement};

// ──────────────────────────────────────────────
// Document
// ──────────────────────────────────────────────

/// Root of a specification document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub openapi: String,
    pub info: Option<Info>,
    pub json_schema_dialect: String,
    pub servers: Vec<Server>,
    pub paths: Option<Paths>,
    pub components: Option<Components>,
    pub security: Vec<SecurityRequirement>,
    pub tags: Vec<Tag>,
    pub external_docs: Option<ExternalDocs>,
    pub extensions: Extensions,
    /// Where the document was loaded from. Never rendered.
    pub source_name: String,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Document {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("openapi", Value::str(&self.openapi)).always(),
            Field::named("info", Value::object(&self.info)),
            Field::new(
                "json_schema_dialect",
                "jsonSchemaDialect",
                Value::str(&self.json_schema_dialect),
            ),
            Field::named("servers", Value::objects(&self.servers)),
            Field::named("paths", Value::object(&self.paths)),
            Field::named("components", Value::object(&self.components)),
            Field::named("security", Value::objects(&self.security)),
            Field::named("tags", Value::objects(&self.tags)),
            Field::new("external_docs", "externalDocs", Value::object(&self.external_docs)),
            Field::extensions(&self.extensions),
            Field::hidden("source_name", Value::str(&self.source_name)),
        ]
    }
}

impl Build for Document {
    const KIND: &'static str = "Document";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        // Only a root that is not a mapping fails the whole document.
        let m = scope.mapping::<Self>(id)?;
        Ok(Document {
            openapi: m.recover(m.string("openapi")),
            info: m.recover(m.object("info")),
            json_schema_dialect: m.recover(m.string("jsonSchemaDialect")),
            servers: m.recover(m.objects("servers")),
            paths: m.recover(m.object("paths")),
            components: m.recover(m.object("components")),
            security: m.recover(m.objects("security")),
            tags: m.recover(m.objects("tags")),
            external_docs: m.recover(m.object("externalDocs")),
            extensions: m.extensions(),
            source_name: String::new(),
            grounded: Some(m.handle()),
        })
    }
}

// ──────────────────────────────────────────────
// Info
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Info {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub terms_of_service: String,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    pub version: String,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Info {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("title", Value::str(&self.title)).always(),
            Field::named("summary", Value::str(&self.summary)),
            Field::named("description", Value::str(&self.description)),
            Field::new(
                "terms_of_service",
                "termsOfService",
                Value::str(&self.terms_of_service),
            ),
            Field::named("contact", Value::object(&self.contact)),
            Field::named("license", Value::object(&self.license)),
            Field::named("version", Value::str(&self.version)).always(),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Info {
    const KIND: &'static str = "Info";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Info {
            title: m.string("title")?,
            summary: m.string("summary")?,
            description: m.string("description")?,
            terms_of_service: m.string("termsOfService")?,
            contact: m.object("contact")?,
            license: m.object("license")?,
            version: m.string("version")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Contact {
    pub name: String,
    pub url: String,
    pub email: String,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Contact {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("name", Value::str(&self.name)),
            Field::named("url", Value::str(&self.url)),
            Field::named("email", Value::str(&self.email)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Contact {
    const KIND: &'static str = "Contact";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Contact {
            name: m.string("name")?,
            url: m.string("url")?,
            email: m.string("email")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct License {
    pub name: String,
    pub identifier: String,
    pub url: String,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for License {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("name", Value::str(&self.name)).always(),
            Field::named("identifier", Value::str(&self.identifier)),
            Field::named("url", Value::str(&self.url)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for License {
    const KIND: &'static str = "License";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(License {
            name: m.string("name")?,
            identifier: m.string("identifier")?,
            url: m.string("url")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

// ──────────────────────────────────────────────
// Servers, tags, external docs
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Server {
    pub url: String,
    pub description: String,
    pub variables: BTreeMap<String, ServerVariable>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Server {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("url", Value::str(&self.url)).always(),
            Field::named("description", Value::str(&self.description)),
            Field::named("variables", Value::object_map(&self.variables)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Server {
    const KIND: &'static str = "Server";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Server {
            url: m.string("url")?,
            description: m.string("description")?,
            variables: m.object_map("variables")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerVariable {
    pub enumeration: Vec<String>,
    pub default: String,
    pub description: String,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for ServerVariable {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("enumeration", "enum", Value::strings(&self.enumeration)),
            Field::named("default", Value::str(&self.default)).always(),
            Field::named("description", Value::str(&self.description)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for ServerVariable {
    const KIND: &'static str = "ServerVariable";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(ServerVariable {
            enumeration: m.strings("enum")?,
            default: m.string("default")?,
            description: m.string("description")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tag {
    pub name: String,
    pub description: String,
    pub external_docs: Option<ExternalDocs>,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for Tag {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("name", Value::str(&self.name)).always(),
            Field::named("description", Value::str(&self.description)),
            Field::new("external_docs", "externalDocs", Value::object(&self.external_docs)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Tag {
    const KIND: &'static str = "Tag";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Tag {
            name: m.string("name")?,
            description: m.string("description")?,
            external_docs: m.object("externalDocs")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExternalDocs {
    pub description: String,
    pub url: String,
    pub extensions: Extensions,
    pub grounded: Option<GroundedHandle>,
}

impl Semantic for ExternalDocs {
    grounded_semantic!();

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("description", Value::str(&self.description)),
            Field::named("url", Value::str(&self.url)).always(),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for ExternalDocs {
    const KIND: &'static str = "ExternalDocs";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(ExternalDocs {
            description: m.string("description")?,
            url: m.string("url")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}
