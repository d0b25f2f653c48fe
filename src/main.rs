use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use logpulse::alerts::{build_notifier, deliver, Report};
use logpulse::analysis::{pass, should_notify};
use logpulse::config::{ConfigProvider, Settings};
use logpulse::logfiles::disk_usage;
use std::path::PathBuf;

/// Command-line arguments for the log analyzer
#[derive(Parser, Debug)]
#[command(
    name = "logpulse",
    version,
    about = "Rotated log file analyzer - counts severities, compares with history and alerts",
    long_about = "Analyzes the current rotated log file, compares its per-severity occurrence \
                  counts with the previous file and the average of a history window, and sends \
                  a notification when a configured threshold is breached. Meant to be run \
                  periodically, for example from cron."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Property overrides
    #[arg(
        short,
        long = "set",
        value_name = "KEY=VALUE",
        help = "Override a configuration property, may be repeated"
    )]
    set: Vec<String>,

    /// Date the current log file is looked up for
    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        value_parser = parse_date,
        help = "Analyze as if run on this date instead of today"
    )]
    date: Option<NaiveDate>,

    /// Print the report instead of sending it
    #[arg(long, help = "Print the report and skip the notifier")]
    dry_run: bool,

    /// Logging verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v info, -vv debug, -vvv trace)"
    )]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose", help = "Only log errors")]
    quiet: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files are reported when loading
            if config_path.exists() && !config_path.is_file() {
                return Err(format!(
                    "Configuration path is not a file: {}",
                    config_path.display()
                ));
            }

            if let Some(extension) = config_path.extension() {
                if extension != "toml" {
                    warn!(
                        "Configuration file does not have .toml extension: {}",
                        config_path.display()
                    );
                }
            }
        }

        if let Some(assignment) = self.set.iter().find(|s| !s.contains('=')) {
            return Err(format!("Override must be KEY=VALUE: {}", assignment));
        }

        Ok(())
    }

    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// Resolve the configuration from the file and the command-line overrides
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut provider =
        ConfigProvider::load(cli.config.as_deref()).context("Failed to load configuration")?;
    for assignment in &cli.set {
        provider
            .apply_assignment(assignment)
            .context("Invalid override")?;
    }
    Settings::from_provider(&provider).context("Invalid configuration")
}

/// Run one analysis pass and notify when the verdict warrants it
fn run(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let run_date = cli.date.unwrap_or_else(|| Local::now().date_naive());

    let result = pass::run(&settings, run_date).context("Analysis failed")?;
    let notify = should_notify(
        &result.verdict,
        &settings.notification_level,
        &settings.severities,
    );

    if !notify && !cli.dry_run {
        info!("No notification needed for {}", result.current.name());
        return Ok(());
    }

    let report = Report::build(&settings, &result, disk_usage(&settings.disk_volume));

    if cli.dry_run {
        println!("{}\n\n{}", report.subject, report.body);
        info!(
            "Dry run: notification {}",
            if notify { "would be sent" } else { "not needed" }
        );
        return Ok(());
    }

    let notifier = build_notifier(&settings.notifier).context("Failed to set up the notifier")?;
    deliver(notifier.as_ref(), &report).context("Notification failed")?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG, when set, still takes precedence
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
