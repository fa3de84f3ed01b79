//! Source-order round trips and mutation behaviour of the renderer.

use groundwork_core::build::Scope;
use groundwork_core::model::{Info, Schema};
use groundwork_core::{
    build, grounded, load, render, Build, BuildError, Extensions, Field, GroundedHandle, NodeId,
    OutputNode, Refable, ReferencePolicy, Render, Semantic, Value,
};

const PETSTORE: &str = r##"{
  "info": {
    "version": "1.0.0",
    "title": "Petstore",
    "license": {"name": "MIT"}
  },
  "openapi": "3.1.0",
  "servers": [
    {"url": "https://petstore.example.com/v1"}
  ],
  "paths": {
    "/pets": {
      "get": {
        "summary": "List all pets",
        "operationId": "listPets",
        "tags": ["pets"],
        "parameters": [
          {
            "name": "limit",
            "in": "query",
            "required": false,
            "schema": {"type": "integer", "maximum": 100, "format": "int32"}
          }
        ],
        "responses": {
          "200": {
            "description": "A paged array of pets",
            "content": {
              "application/json": {
                "schema": {"$ref": "#/components/schemas/Pets"}
              }
            }
          },
          "default": {
            "description": "unexpected error",
            "content": {
              "application/json": {
                "schema": {"$ref": "#/components/schemas/Error"}
              }
            }
          }
        }
      },
      "post": {
        "summary": "Create a pet",
        "operationId": "createPets",
        "security": [{"api_key": []}],
        "responses": {
          "201": {"description": "Null response"}
        },
        "deprecated": false
      }
    },
    "/pets/{petId}": {
      "get": {
        "operationId": "showPetById",
        "summary": "Info for a specific pet",
        "parameters": [
          {"in": "path", "name": "petId", "required": true, "schema": {"type": "string"}}
        ],
        "responses": {
          "200": {
            "description": "Expected response to a valid request",
            "content": {
              "application/json": {
                "schema": {"$ref": "#/components/schemas/Pet"}
              }
            }
          }
        }
      }
    }
  },
  "components": {
    "schemas": {
      "Pet": {
        "required": ["id", "name"],
        "type": "object",
        "properties": {
          "name": {"type": "string"},
          "id": {"type": "integer", "format": "int64"},
          "weight": {"type": "number", "minimum": 0.5, "maximum": 2.20},
          "tag": {"type": ["string", "null"]}
        },
        "additionalProperties": false
      },
      "Pets": {
        "type": "array",
        "maxItems": 100,
        "items": {"$ref": "#/components/schemas/Pet"}
      },
      "Error": {
        "type": "object",
        "required": ["code", "message"],
        "properties": {
          "code": {"type": "integer", "format": "int32"},
          "message": {"type": "string"}
        }
      }
    },
    "securitySchemes": {
      "api_key": {"type": "apiKey", "name": "api_key", "in": "header"}
    }
  },
  "x-generated-by": "hand"
}"##;

fn compact(src: &str) -> String {
    let value: serde_json::Value = serde_json::from_str(src).unwrap();
    serde_json::to_string(&value).unwrap()
}

fn to_string(out: &OutputNode) -> String {
    serde_json::to_string(&out.to_json()).unwrap()
}

fn inline_schema<'a>(doc: &'a mut groundwork_core::Document, name: &str) -> &'a mut Schema {
    doc.components
        .as_mut()
        .unwrap()
        .schemas
        .get_mut(name)
        .unwrap()
        .inline_mut()
        .unwrap()
}

// ──────────────────────────────────────────────
// A small custom type for the concrete scenarios
// ──────────────────────────────────────────────

#[derive(Default)]
struct Thing {
    thing: String,
    thong: Option<i64>,
    extensions: Extensions,
    grounded: Option<GroundedHandle>,
}

impl Semantic for Thing {
    fn kind(&self) -> &'static str {
        "Thing"
    }

    fn grounded(&self) -> Option<&GroundedHandle> {
        self.grounded.as_ref()
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::named("thing", Value::str(&self.thing)),
            Field::named("thong", Value::integer(self.thong)),
            Field::extensions(&self.extensions),
        ]
    }
}

impl Build for Thing {
    const KIND: &'static str = "Thing";

    fn build(scope: &Scope<'_>, id: NodeId) -> Result<Self, BuildError> {
        let m = scope.mapping::<Self>(id)?;
        Ok(Thing {
            thing: m.string("thing")?,
            thong: m.integer("thong")?,
            extensions: m.extensions(),
            grounded: Some(m.handle()),
        })
    }
}

fn thing(src: &str) -> (std::sync::Arc<groundwork_core::GroundedDoc>, Thing) {
    let doc = grounded::parse(src).unwrap();
    let built = build::<Thing>(&doc).unwrap();
    assert!(built.errors.is_empty());
    (doc, built.value)
}

#[test]
fn scenario_a_unmutated_object_keeps_order_and_values() {
    let (_doc, t) = thing(r#"{"thing": "ding", "thong": 1}"#);
    let out = t.render(ReferencePolicy::Preserve);
    assert_eq!(out.keys(), vec!["thing", "thong"]);
    assert_eq!(out.get("thing").and_then(|n| n.as_str()), Some("ding"));
    assert_eq!(out.get("thong").and_then(|n| n.as_number()), Some("1"));
}

#[test]
fn source_order_wins_over_declaration_order() {
    let (_doc, t) = thing("{\n  \"thong\": 1,\n  \"thing\": \"ding\"\n}");
    assert_eq!(t.render(ReferencePolicy::Preserve).keys(), vec!["thong", "thing"]);
}

#[test]
fn scenario_b_added_extension_renders_last() {
    let (_doc, mut t) = thing(r#"{"thing": "ding", "thong": 1}"#);
    t.extensions.insert("x-pizza", serde_json::json!("time"));
    let out = t.render(ReferencePolicy::Preserve);
    assert_eq!(out.keys(), vec!["thing", "thong", "x-pizza"]);
    assert_eq!(out.get("x-pizza").and_then(|n| n.as_str()), Some("time"));
}

#[test]
fn scenario_c_single_type_renders_as_scalar() {
    let schema = Schema {
        types: vec!["chicken".into()],
        ..Default::default()
    };
    let out = schema.render(ReferencePolicy::Preserve);
    assert_eq!(out.get("type"), Some(&OutputNode::str("chicken")));
}

#[test]
fn scenario_d_reference_preserved_or_resolved() {
    let loaded = load(PETSTORE).unwrap();
    let doc = &loaded.document;
    let op = doc.paths.as_ref().unwrap().items["/pets/{petId}"]
        .get
        .as_ref()
        .unwrap();
    let response = op.responses.as_ref().unwrap().codes["200"].value().unwrap();
    let schema = response.content["application/json"].schema.as_ref().unwrap();
    assert_eq!(schema.target(), Some("#/components/schemas/Pet"));

    let preserved = schema.render(ReferencePolicy::Preserve);
    assert_eq!(
        preserved,
        OutputNode::Mapping(vec![(
            "$ref".into(),
            OutputNode::str("#/components/schemas/Pet")
        )])
    );

    let pet = &doc.components.as_ref().unwrap().schemas["Pet"];
    let resolved = schema.render(ReferencePolicy::Resolve);
    assert_eq!(resolved, pet.render(ReferencePolicy::Preserve));
    assert_eq!(resolved.keys(), vec!["required", "type", "properties", "additionalProperties"]);
}

// ──────────────────────────────────────────────
// Properties
// ──────────────────────────────────────────────

#[test]
fn p1_whole_document_round_trips() {
    let loaded = load(PETSTORE).unwrap();
    assert!(loaded.errors.is_empty(), "{:?}", loaded.errors);
    let out = loaded.document.render(ReferencePolicy::Preserve);
    assert_eq!(to_string(&out), compact(PETSTORE));
}

#[test]
fn p2_value_mutation_keeps_order() {
    let mut loaded = load(PETSTORE).unwrap();
    let before = loaded.document.render(ReferencePolicy::Preserve);

    let info = loaded.document.info.as_mut().unwrap();
    info.title = "Renamed".into();
    info.version = "2.0.0".into();
    let pet = inline_schema(&mut loaded.document, "Pet");
    pet.required = vec!["name".into()];
    pet.types = vec!["object".into(), "null".into()];
    pet.additional_properties = Some(groundwork_core::model::AdditionalProperties::Allowed(true));

    let after = loaded.document.render(ReferencePolicy::Preserve);
    assert_eq!(after.keys(), before.keys());
    assert_eq!(
        after.get("info").unwrap().keys(),
        before.get("info").unwrap().keys()
    );
    let pet_path = |n: &OutputNode| {
        n.get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get("Pet"))
            .map(|p| p.keys().into_iter().map(str::to_owned).collect::<Vec<_>>())
    };
    assert_eq!(pet_path(&after), pet_path(&before));
    assert_eq!(
        after.get("info").and_then(|i| i.get("title")).and_then(|t| t.as_str()),
        Some("Renamed")
    );
}

#[test]
fn p3_new_fields_follow_positioned_ones_in_declaration_order() {
    let mut loaded = load(PETSTORE).unwrap();
    let info = loaded.document.info.as_mut().unwrap();
    info.description = "All about pets".into();
    info.summary = "Pets".into();
    let out = info.render(ReferencePolicy::Preserve);
    assert_eq!(
        out.keys(),
        vec!["version", "title", "license", "summary", "description"]
    );

    let paths = loaded.document.paths.as_mut().unwrap();
    paths.items.insert("/owners".into(), Default::default());
    paths.items.insert("/a-first".into(), Default::default());
    let out = paths.render(ReferencePolicy::Preserve);
    assert_eq!(
        out.keys(),
        vec!["/pets", "/pets/{petId}", "/a-first", "/owners"]
    );
}

#[test]
fn p4_extensions_follow_every_ordinary_field() {
    let mut loaded = load(PETSTORE).unwrap();
    let info = loaded.document.info.as_mut().unwrap();
    info.extensions.insert("x-z", serde_json::json!(1));
    info.extensions.insert("x-a", serde_json::json!(2));
    info.description = "added after the extensions".into();
    let out = info.render(ReferencePolicy::Preserve);
    assert_eq!(
        out.keys(),
        vec!["version", "title", "license", "description", "x-z", "x-a"]
    );

    // A grounded extension stays at its source position; new ones follow.
    loaded
        .document
        .extensions
        .insert("x-added", serde_json::json!(true));
    let out = loaded.document.render(ReferencePolicy::Preserve);
    let keys = out.keys();
    assert_eq!(&keys[keys.len() - 2..], &["x-generated-by", "x-added"]);
}

#[test]
fn p5_unset_optionals_are_omitted_and_always_fields_are_not() {
    let mut loaded = load(PETSTORE).unwrap();
    let post = loaded
        .document
        .paths
        .as_mut()
        .unwrap()
        .items
        .get_mut("/pets")
        .unwrap()
        .post
        .as_mut()
        .unwrap();
    assert_eq!(
        post.render(ReferencePolicy::Preserve)
            .get("deprecated")
            .and_then(|d| d.as_bool()),
        Some(false)
    );
    post.deprecated = None;
    assert!(post.render(ReferencePolicy::Preserve).get("deprecated").is_none());

    let info = Info::default();
    let out = info.render(ReferencePolicy::Preserve);
    assert_eq!(out.keys(), vec!["title", "version"]);
    assert_eq!(out.get("title").and_then(|t| t.as_str()), Some(""));
}

#[test]
fn p6_float_precision() {
    let mut loaded = load(PETSTORE).unwrap();
    let weight = |doc: &groundwork_core::Document| {
        let out = doc.render(ReferencePolicy::Preserve);
        let w = out
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get("Pet"))
            .and_then(|p| p.get("properties"))
            .and_then(|p| p.get("weight"))
            .cloned()
            .unwrap();
        (
            w.get("minimum").and_then(|n| n.as_number()).map(str::to_owned),
            w.get("maximum").and_then(|n| n.as_number()).map(str::to_owned),
        )
    };
    assert_eq!(
        weight(&loaded.document),
        (Some("0.5".into()), Some("2.20".into()))
    );

    let pet = inline_schema(&mut loaded.document, "Pet");
    let w = pet.properties.get_mut("weight").unwrap().inline_mut().unwrap();
    w.maximum = Some(3.5);
    assert_eq!(weight(&loaded.document).1.as_deref(), Some("3.50"));

    let fresh = Schema {
        maximum: Some(3.0),
        minimum: Some(0.1),
        ..Default::default()
    };
    let out = fresh.render(ReferencePolicy::Preserve);
    assert_eq!(out.get("maximum").and_then(|n| n.as_number()), Some("3"));
    assert_eq!(out.get("minimum").and_then(|n| n.as_number()), Some("0.1"));
}

// ──────────────────────────────────────────────
// Rendering without a grounded graph
// ──────────────────────────────────────────────

#[test]
fn fresh_objects_render_in_declaration_order() {
    let mut schema = Schema {
        title: "Owner".into(),
        types: vec!["object".into()],
        ..Default::default()
    };
    schema
        .properties
        .insert("pet".into(), Refable::to("#/components/schemas/Pet"));
    let out = render(&schema, ReferencePolicy::Resolve);
    assert_eq!(out.keys(), vec!["type", "title", "properties"]);
    // Nothing to inline: the marker is kept.
    assert_eq!(
        out.get("properties").and_then(|p| p.get("pet")),
        Some(&OutputNode::Mapping(vec![(
            "$ref".into(),
            OutputNode::str("#/components/schemas/Pet")
        )]))
    );
}

#[test]
fn dropping_the_grounded_graph_falls_back_to_declaration_order() {
    let (doc, t) = thing("{\"thong\": 1, \"thing\": \"ding\"}");
    assert_eq!(t.render(ReferencePolicy::Preserve).keys(), vec!["thong", "thing"]);
    drop(doc);
    assert_eq!(t.render(ReferencePolicy::Preserve).keys(), vec!["thing", "thong"]);
}

#[test]
fn yaml_emission_keeps_source_precision() {
    let src = r##"{
  "components": {
    "schemas": {
      "Price": {"type": "number", "multipleOf": 2.20, "maximum": 1e3}
    }
  }
}"##;
    let loaded = load(src).unwrap();
    let out = loaded.document.render(ReferencePolicy::Preserve);
    let yaml = out.to_yaml().unwrap();
    assert!(yaml.contains("multipleOf: 2.20\n"), "{yaml}");
    assert!(yaml.contains("maximum: 1e3\n"), "{yaml}");
    let reparsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let price = &reparsed["components"]["schemas"]["Price"];
    assert_eq!(price["multipleOf"].as_f64(), Some(2.2));
}

#[test]
fn yaml_emission_keeps_render_order() {
    let loaded = load(PETSTORE).unwrap();
    let info = loaded.document.info.as_ref().unwrap();
    let yaml = serde_yaml::to_string(&info.render(ReferencePolicy::Preserve)).unwrap();
    let top: Vec<&str> = yaml
        .lines()
        .filter(|l| !l.starts_with(' '))
        .filter_map(|l| l.split(':').next())
        .collect();
    assert_eq!(top, vec!["version", "title", "license"]);
}
