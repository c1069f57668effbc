//! needs-restart: discover systemd services that need restarting.
//!
//! Exit codes: 0 = nothing to restart, 1 = at least one unit or process
//! needs restarting, 2 = scan error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use needs_restart_core::{logging, ScanConfig, Scanner};

#[derive(Parser, Debug)]
#[command(
    name = "needs-restart",
    version,
    about = "Discover systemd services that map deleted binaries or libraries"
)]
struct Cli {
    /// Emit the report as JSON.
    #[arg(long)]
    json: bool,

    /// Print only the names of units that need restarting.
    #[arg(short, long, conflicts_with = "json")]
    quiet: bool,

    /// Read configuration from a TOML file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Exclude a unit from the report (repeatable).
    #[arg(long = "ignore-unit", value_name = "UNIT")]
    ignore_units: Vec<String>,

    /// Ignore stale files under this path prefix (repeatable, extends defaults).
    #[arg(long = "ignore-prefix", value_name = "PREFIX")]
    ignore_prefixes: Vec<String>,

    /// Also report .scope units (user sessions, machines).
    #[arg(long)]
    include_scopes: bool,

    /// Do not report stale processes that belong to no unit.
    #[arg(long)]
    no_unowned: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Root of the proc filesystem.
    #[arg(long, value_name = "PATH", hide = true)]
    proc_root: Option<PathBuf>,
}

impl Cli {
    fn scan_config(&self) -> anyhow::Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => ScanConfig::default(),
        };

        // CLI flags layer on top of file/default values.
        if let Some(proc_root) = &self.proc_root {
            config.proc_root = proc_root.clone();
        }
        config.ignored_units.extend(self.ignore_units.iter().cloned());
        config
            .ignored_prefixes
            .extend(self.ignore_prefixes.iter().cloned());
        if self.include_scopes {
            config.include_scopes = true;
        }
        if self.no_unowned {
            config.include_unowned = false;
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = cli.scan_config()?;
    let report = Scanner::new(config).scan().context("scan failed")?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else if cli.quiet {
        print!("{}", report.render_quiet());
    } else {
        print!("{}", report.render_text());
    }

    Ok(report.needs_restart())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("needs-restart: {e:#}");
            ExitCode::from(2)
        }
    }
}
