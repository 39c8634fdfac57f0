// # dnstable
//
// Resolves domain names, literal addresses and service specs into one
// address list and loads it into a pf table (and optionally a file).
//
// This binary is a thin integration layer:
// 1. Parse flags (clap)
// 2. Install the tracing subscriber
// 3. Build the hickory resolver and the pfctl collaborator
// 4. Run the engine once and turn the result into an exit code
//
// All resolution and synchronization logic lives in dnstable-core.
//
// ## Example
//
// ```bash
// dnstable -t webservers -f /var/db/webservers.txt \
//     example.com 198.51.100.5 example.org:ldap:tcp,udp
// ```
//
// ## Logging
//
// Logs go to stderr. `-v` selects DEBUG (every query and its answer
// count); otherwise `DNSTABLE_LOG_LEVEL` is used, defaulting to `warn`.

use anyhow::{Context, Result};
use clap::Parser;
use dnstable_core::{
    Error, FileOutcome, IpVersion, ResolverSettings, RunSummary, SyncOutcome, TableOutcome,
    UpdateConfig, UpdateEngine, UpdatePolicy,
};
use dnstable_resolver_hickory::HickoryLookup;
use dnstable_table_pfctl::{DEFAULT_PFCTL_PATH, PfctlTable, build_args};
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible run results
///
/// - 0: table (and file) in sync, or nothing to do
/// - 1: usage or validation error, nothing was touched
/// - 2: pfctl could not be run, or died from a signal
/// - other: pfctl's own non-zero exit code, passed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnstableExitCode {
    /// Run completed
    Success,
    /// Bad flags, bad target, bad table name or path, CNAME cycle
    ValidationError,
    /// The table collaborator could not be run
    RuntimeError,
    /// pfctl exited non-zero
    Table(u8),
}

impl From<DnstableExitCode> for ExitCode {
    fn from(code: DnstableExitCode) -> Self {
        match code {
            DnstableExitCode::Success => ExitCode::SUCCESS,
            DnstableExitCode::ValidationError => ExitCode::from(1),
            DnstableExitCode::RuntimeError => ExitCode::from(2),
            DnstableExitCode::Table(code) => ExitCode::from(code),
        }
    }
}

/// Resolve DNS targets into a pf address table
#[derive(Parser, Debug)]
#[command(name = "dnstable", version)]
#[command(about = "Resolve domains, addresses and SRV services into a pf table")]
struct Cli {
    /// Resolve IPv4 addresses only
    #[arg(short = '4', long = "ipv4")]
    ipv4: bool,

    /// Resolve IPv6 addresses only
    #[arg(short = '6', long = "ipv6")]
    ipv6: bool,

    /// Never flush the table or empty the file when nothing resolves
    #[arg(short = 'n', long)]
    never_flush: bool,

    /// Also write the address list to this file
    #[arg(short = 'f', long, value_name = "PATH", env = "DNSTABLE_FILE")]
    file: Option<PathBuf>,

    /// Resolve and compare, but change nothing
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Only add addresses to the table, never remove any
    #[arg(short = 'p', long)]
    preserve: bool,

    /// pf table to load
    #[arg(short = 't', long, value_name = "NAME", env = "DNSTABLE_TABLE")]
    table: String,

    /// Log every query and let pfctl print its output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// pfctl binary
    #[arg(long, value_name = "PATH", env = "DNSTABLE_PFCTL", default_value = DEFAULT_PFCTL_PATH)]
    pfctl: PathBuf,

    /// Query this nameserver instead of the system resolvers (repeatable)
    #[arg(long = "nameserver", value_name = "IP")]
    nameservers: Vec<IpAddr>,

    /// Per-query timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    timeout: u64,

    /// Domain names, addresses, or service specs (name[:services[:transports]])
    #[arg(value_name = "TARGET", required = true, num_args = 1..)]
    targets: Vec<String>,
}

impl Cli {
    /// Update configuration for the engine
    fn update_config(&self) -> UpdateConfig {
        let config = UpdateConfig::new(&self.table)
            .with_version(IpVersion::from_flags(self.ipv4, self.ipv6))
            .with_policy(UpdatePolicy {
                never_flush: self.never_flush,
                preserve: self.preserve,
            })
            .with_dry_run(self.dry_run)
            .with_verbose(self.verbose);

        match &self.file {
            Some(path) => config.with_output_file(path),
            None => config,
        }
    }

    /// Settings for the hickory resolver
    fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            nameservers: self.nameservers.clone(),
            timeout: Duration::from_secs(self.timeout),
            ..ResolverSettings::default()
        }
    }
}

/// Pick the log level: `-v` wins, then `DNSTABLE_LOG_LEVEL`, then WARN
fn log_level(verbose: bool, env_level: Option<&str>) -> Result<Level> {
    if verbose {
        return Ok(Level::DEBUG);
    }

    let Some(level) = env_level else {
        return Ok(Level::WARN);
    };

    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DNSTABLE_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also land here
            let _ = e.print();
            return if e.use_stderr() {
                DnstableExitCode::ValidationError.into()
            } else {
                DnstableExitCode::Success.into()
            };
        }
    };

    let env_level = env::var("DNSTABLE_LOG_LEVEL").ok();
    let level = match log_level(cli.verbose, env_level.as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DnstableExitCode::ValidationError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnstableExitCode::RuntimeError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnstableExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(&cli).await {
            Ok(summary) => report(&cli, &summary),
            Err(e) => {
                eprintln!("dnstable: {:#}", e);
                exit_code_for_error(&e)
            }
        }
    })
    .into()
}

/// Wire the collaborators and run the engine once
async fn run(cli: &Cli) -> Result<RunSummary> {
    let lookup = HickoryLookup::from_settings(&cli.resolver_settings())
        .context("Failed to set up DNS resolver")?;
    let table = PfctlTable::new(&cli.pfctl, cli.verbose);

    let engine = UpdateEngine::new(Box::new(lookup), Box::new(table), cli.update_config())?;
    debug!(
        "Updating table {} from {} target(s)",
        engine.config().table,
        cli.targets.len()
    );

    Ok(engine.run(cli.targets.as_slice()).await?)
}

/// Validation errors exit 1, anything else 2
fn exit_code_for_error(e: &anyhow::Error) -> DnstableExitCode {
    match e.downcast_ref::<Error>() {
        Some(err) if err.is_validation() => DnstableExitCode::ValidationError,
        _ => DnstableExitCode::RuntimeError,
    }
}

/// Print dry-run results and derive the exit code from the table step
fn report(cli: &Cli, summary: &RunSummary) -> DnstableExitCode {
    if cli.dry_run {
        for line in dry_run_lines(cli, summary) {
            println!("{}", line);
        }
    }

    match &summary.outcome {
        SyncOutcome::Skipped => DnstableExitCode::Success,
        SyncOutcome::Synced(report) => table_exit_code(&report.table),
    }
}

/// What a dry run would have done: the address list, then one line per
/// file and table action
fn dry_run_lines(cli: &Cli, summary: &RunSummary) -> Vec<String> {
    let mut lines = summary.addresses.clone();

    let report = match &summary.outcome {
        SyncOutcome::Skipped => {
            lines.push(format!(
                "# nothing resolved: table {} and file left untouched",
                cli.table
            ));
            return lines;
        }
        SyncOutcome::Synced(report) => report,
    };

    if let (Some(path), Some(file)) = (&cli.file, &report.file) {
        lines.push(match file {
            FileOutcome::WouldWrite => format!(
                "# would write {} address(es) to {}",
                summary.addresses.len(),
                path.display()
            ),
            FileOutcome::Unchanged => format!("# {} is up to date", path.display()),
            FileOutcome::Written => format!("# wrote {}", path.display()),
            FileOutcome::Failed(reason) => format!("# file {}: {}", path.display(), reason),
        });
    }

    lines.push(match &report.table {
        TableOutcome::WouldRun(command) => format!(
            "# would run: {} {}",
            cli.pfctl.display(),
            build_args(&cli.table, command, cli.verbose).join(" ")
        ),
        TableOutcome::Skipped => format!("# table {} left untouched", cli.table),
        TableOutcome::Applied { command, .. } => {
            format!("# ran {} on table {}", command.verb(), cli.table)
        }
        TableOutcome::Failed(reason) => format!("# table {}: {}", cli.table, reason),
    });

    lines
}

fn table_exit_code(outcome: &TableOutcome) -> DnstableExitCode {
    match outcome {
        TableOutcome::Applied { status, .. } => match status.exit_code {
            Some(0) => DnstableExitCode::Success,
            Some(code) => match u8::try_from(code) {
                Ok(code) => DnstableExitCode::Table(code),
                Err(_) => DnstableExitCode::RuntimeError,
            },
            None => {
                warn!("pfctl was terminated by a signal");
                DnstableExitCode::RuntimeError
            }
        },
        TableOutcome::Skipped | TableOutcome::WouldRun(_) => DnstableExitCode::Success,
        TableOutcome::Failed(_) => DnstableExitCode::RuntimeError,
    }
}
