//! Guide Command
//!
//! Generate the Markdown usage guide for one table.
//!
//! Usage:
//!   tableguide guide <TABLE> [--max-docs N] [--locale L] [--output FILE]

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::config::Config;
use crate::guide::{GuideOptions, TableGuidePipeline};
use crate::types::Result;

pub struct GuideArgs {
    pub table: String,
    pub max_docs: Option<usize>,
    pub locale: Option<String>,
    pub output: Option<PathBuf>,
}

pub async fn run(config: &Config, args: GuideArgs) -> Result<()> {
    let pipeline = TableGuidePipeline::from_config(config)?;
    let guide = pipeline
        .generate(
            &args.table,
            GuideOptions {
                max_docs: args.max_docs,
                locale: args.locale,
            },
        )
        .await?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &guide).await?;
            Output::new().success(&format!(
                "Wrote guide for {} to {}",
                args.table,
                path.display()
            ));
        }
        None => print!("{}", guide),
    }
    Ok(())
}
