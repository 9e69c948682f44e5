//! Config Command
//!
//! Usage:
//!   tableguide config show [-f toml|json]
//!   tableguide config path

use std::path::Path;

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::{GuideError, Result};

/// Print the effective configuration (merged from all sources)
pub fn show(explicit: Option<&Path>, format: &str) -> Result<()> {
    let as_json = match format {
        "json" => true,
        "toml" => false,
        other => {
            return Err(GuideError::InvalidArgument(format!(
                "Unknown format '{}'. Valid values: toml, json",
                other
            )));
        }
    };

    let config = ConfigLoader::load(explicit)?;
    println!("{}", ConfigLoader::render(&config, as_json)?);
    Ok(())
}

/// Print configuration file locations in resolution order
pub fn path(explicit: Option<&Path>) -> Result<()> {
    let output = Output::new();
    output.header("Configuration files");

    let describe = |p: &Path| {
        if p.exists() {
            "found"
        } else {
            "not found"
        }
    };

    match ConfigLoader::global_config_path() {
        Some(global) => output.row(
            "global",
            8,
            &format!("{} ({})", global.display(), describe(&global)),
        ),
        None => output.row("global", 8, "cannot determine config directory"),
    }

    let project = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(ConfigLoader::project_config_path);
    output.row(
        "project",
        8,
        &format!("{} ({})", project.display(), describe(&project)),
    );
    output.row("env", 8, "TABLE_GUIDE_*, LLM_PAR, USE_GLEAN_STUB");
    Ok(())
}
