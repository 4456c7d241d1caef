//! namedev-dump — load the naming and permissions files and print the rules.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, warn};

use namedev_core::config::load_dotenv;
use namedev_core::{Config, UnnamedRulePolicy};
use namedev_rules::loader::LoadReport;
use namedev_rules::init;

// ── CLI ─────────────────────────────────────────────────────────────

/// Load device naming rules and permissions and dump the merged registry.
#[derive(Parser, Debug)]
#[command(name = "namedev-dump", version, about)]
struct Cli {
    /// Directory holding both config files. Defaults to the configured root.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Naming-rule file name, relative to the config root.
    #[arg(long)]
    rules: Option<String>,

    /// Permissions file name, relative to the config root.
    #[arg(long)]
    permissions: Option<String>,

    /// Store LABEL/NUMBER/TOPOLOGY rules without NAME under the empty key.
    #[arg(long)]
    collapse_unnamed: bool,

    /// Print one line per rule instead of JSON.
    #[arg(long)]
    summary: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the env-derived config.
    fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.paths.config_root = root.clone();
        }
        if let Some(rules) = &self.rules {
            config.paths.rules_file = rules.clone();
        }
        if let Some(permissions) = &self.permissions {
            config.paths.permissions_file = permissions.clone();
        }
        if self.collapse_unnamed {
            config.parse.unnamed_rules = UnnamedRulePolicy::Collapse;
        }
    }
}

fn report_failures(report: &LoadReport) {
    for (line, err) in report.failures() {
        warn!(path = %report.path.display(), line, error = %err, "line skipped");
    }
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    cli.apply(&mut config);
    config.log_summary();

    let initialized = match init(&config) {
        Ok(initialized) => initialized,
        Err(e) => {
            error!(error = %e, "failed to load device naming config");
            return Err(e.into());
        }
    };
    report_failures(&initialized.rules_report);
    report_failures(&initialized.permissions_report);

    if cli.summary {
        for record in &initialized.rules {
            println!("{}", record);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&initialized.rules)?);
    }
    Ok(())
}
