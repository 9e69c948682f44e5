//! Serve Command
//!
//! Usage:
//!   tableguide serve [--bind ADDR]

use crate::config::Config;
use crate::server;
use crate::types::Result;

pub async fn run(config: &Config, bind: Option<&str>) -> Result<()> {
    server::serve(config, bind).await
}
