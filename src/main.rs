use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tableguide::cli::commands;
use tableguide::config::ConfigLoader;

#[derive(Parser)]
#[command(name = "tableguide")]
#[command(
    version,
    about = "Generate Markdown usage guides for data tables from catalog documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (default: ./tableguide.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the usage guide for a table
    Guide {
        #[arg(help = "Fully qualified table name, e.g. tracking.AdClickEvent")]
        table: String,
        #[arg(long, help = "Maximum number of documents to read")]
        max_docs: Option<usize>,
        #[arg(long, help = "Guide locale (default: report.locale)")]
        locale: Option<String>,
        #[arg(long, short, help = "Write the guide to a file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Serve the HTTP API
    Serve {
        #[arg(long, help = "Bind address (default: server.bind)")]
        bind: Option<String>,
    },

    /// List fixture tables
    Tables {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mtableguide encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // Logs go to stderr so a guide printed to stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Guide {
            table,
            max_docs,
            locale,
            output,
        } => {
            let config = ConfigLoader::load(explicit)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::guide::run(
                &config,
                commands::guide::GuideArgs {
                    table,
                    max_docs,
                    locale,
                    output,
                },
            ))?;
        }
        Commands::Serve { bind } => {
            let config = ConfigLoader::load(explicit)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::serve::run(&config, bind.as_deref()))?;
        }
        Commands::Tables { format } => {
            let config = ConfigLoader::load(explicit)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::tables::run(&config, &format))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(explicit, &format)?,
            ConfigAction::Path => commands::config::path(explicit)?,
        },
    }

    Ok(())
}
