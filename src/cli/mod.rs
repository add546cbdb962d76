//! CLI parser and entry point.

mod migrate;
mod report;

use std::path::PathBuf;

use clap::Parser;
use console::style;

use crate::config::{
    load_settings_with_options, require_service_key, LoadOptions, SERVICE_KEY_ENV,
};

pub use migrate::{cmd_migrate, MigrateOptions};
pub use report::{summary_lines, Reporter};

#[derive(Parser)]
#[command(name = "legal-migrate")]
#[command(about = "Move legal document attachments from Supabase Storage into the Legal/ folder tree")]
#[command(version)]
pub struct Cli {
    /// Show where every file would go without downloading, writing or
    /// updating any record
    #[arg(long)]
    pub dry_run: bool,

    /// Destination root (overrides config file)
    #[arg(long, short = 't')]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long)]
    cwd: bool,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    url: Option<String>,

    /// Supabase service_role key
    #[arg(long, env = SERVICE_KEY_ENV, hide_env_values = true)]
    service_key: Option<String>,

    /// Only migrate documents belonging to this case id
    #[arg(long = "case")]
    case_id: Option<String>,

    /// Limit number of documents fetched (0 = unlimited)
    #[arg(short, long, default_value = "0")]
    limit: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Nothing is read or fetched without a key.
    let service_key = match require_service_key(cli.service_key) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            std::process::exit(1);
        }
    };

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        target: cli.target,
        supabase_url: cli.url,
    };
    let settings = load_settings_with_options(options).await;

    cmd_migrate(
        &settings,
        &service_key,
        MigrateOptions {
            dry_run: cli.dry_run,
            case_id: cli.case_id,
            limit: cli.limit,
        },
    )
    .await
}
