use std::path::Path;
use std::process;

use groundwork_core::Render;

use super::load_or_exit;
use crate::config::{DocFormat, RenderSettings};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_render(file: &Path, settings: RenderSettings, output: OutputFormat, quiet: bool) {
    let loaded = load_or_exit(file, output, quiet);
    // Build failures were already logged as warnings; render what was built.
    let tree = loaded.document.render(settings.policy);

    let text = match settings.format {
        DocFormat::Json => serde_json::to_string_pretty(&tree.to_json())
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        DocFormat::Yaml => tree.to_yaml().map_err(|e| e.to_string()),
    };
    match text {
        Ok(text) => print!("{}", text),
        Err(e) => {
            report_error(&format!("could not write output: {}", e), output, quiet);
            process::exit(1);
        }
    }
}
