//! Tables Command
//!
//! List the tables available in the fixture corpus.
//!
//! Usage:
//!   tableguide tables [-f text|json]

use crate::cli::ui::Output;
use crate::config::Config;
use crate::retrieval::fixtures_index;
use crate::types::Result;

pub async fn run(config: &Config, format: &str) -> Result<()> {
    let dir = &config.retrieval.fixtures_dir;
    let tables = fixtures_index(dir).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    let output = Output::new();
    if tables.is_empty() {
        output.warning(&format!("No fixture tables found in {}", dir.display()));
        return Ok(());
    }

    output.header(&format!("Fixture tables ({})", dir.display()));
    let width = tables.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for table in &tables {
        let detail = if table.title.is_empty() {
            format!("{} docs", table.doc_count)
        } else {
            format!("{} ({} docs)", table.title, table.doc_count)
        };
        output.row(&table.name, width, &detail);
    }
    Ok(())
}
