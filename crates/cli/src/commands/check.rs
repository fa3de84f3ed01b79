use std::path::Path;
use std::process;

use super::load_or_exit;
use crate::OutputFormat;

pub(crate) fn cmd_check(file: &Path, output: OutputFormat, quiet: bool) {
    let loaded = load_or_exit(file, output, quiet);
    let doc = &loaded.document;

    let paths = doc.paths.as_ref().map_or(0, |p| p.items.len());
    let operations: usize = doc
        .paths
        .as_ref()
        .map_or(0, |p| p.items.values().map(|i| i.operations().len()).sum());
    let schemas = doc.components.as_ref().map_or(0, |c| c.schemas.len());

    if !quiet {
        match output {
            OutputFormat::Json => {
                let errors: Vec<serde_json::Value> =
                    loaded.errors.iter().map(|e| e.to_json_value()).collect();
                let report = serde_json::json!({
                    "file":       doc.source_name,
                    "paths":      paths,
                    "operations": operations,
                    "schemas":    schemas,
                    "errors":     errors,
                });
                let json = serde_json::to_string_pretty(&report)
                    .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
                println!("{}", json);
            }
            OutputFormat::Text => {
                if loaded.errors.is_empty() {
                    println!(
                        "{}: ok ({} paths, {} operations, {} schemas)",
                        doc.source_name, paths, operations, schemas
                    );
                } else {
                    println!(
                        "{}: {} build error(s)",
                        doc.source_name,
                        loaded.errors.len()
                    );
                    for e in &loaded.errors {
                        println!("  {}", e);
                    }
                }
            }
        }
    }

    if !loaded.errors.is_empty() {
        process::exit(1);
    }
}
