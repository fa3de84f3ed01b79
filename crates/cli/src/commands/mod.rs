mod check;
mod render;

use std::path::Path;
use std::process;

use groundwork_core::{load, Loaded};

use crate::{report_error, OutputFormat};

pub(crate) use check::cmd_check;
pub(crate) use render::cmd_render;

/// Read and load `file`, exiting with status 1 when it cannot be loaded.
fn load_or_exit(file: &Path, output: OutputFormat, quiet: bool) -> Loaded {
    let src = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            report_error(
                &format!("could not read '{}': {}", file.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    match load(&src) {
        Ok(mut loaded) => {
            loaded.document.source_name = file.display().to_string();
            loaded
        }
        Err(e) => {
            report_error(&format!("{}: {}", file.display(), e), output, quiet);
            process::exit(1);
        }
    }
}
