//! Top-level CLI definition and dispatch.

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use coldsign::app::{APP_NAME, APP_VERSION, Console};
use coldsign::cli::{ShutdownSignal, run_console};
use coldsign::core::config::{Config, ConfigStore, SettingsStore, SharedSettings};
use coldsign::core::errors::CsError;
use coldsign::logger::journal::{ActivityJournal, EventType, JournalEntry};
use coldsign::platform::media::{LinuxMedia, MediaEnumerator};
use coldsign::platform::signer::ElectrumCli;
use coldsign::timing::estimator::{TimingEstimator, TimingKind};
use coldsign::worker::executor::BackgroundExecutor;
use coldsign::workflow::Services;

/// Offline transaction signing console for a 16x3 character display.
#[derive(Debug, Parser)]
#[command(
    name = "coldsign",
    author,
    version,
    about = "coldsign - offline transaction signing console",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the console in this terminal.
    Run(RunArgs),
    /// Show timing history, averages and estimates.
    Stats(StatsArgs),
    /// Add a USB stick UUID to the trusted set.
    Trust(TrustArgs),
    /// List removable devices and their mount points.
    Devices,
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct RunArgs {
    /// Do not write the activity journal.
    #[arg(long)]
    no_journal: bool,
    /// Write log output to this file instead of next to the journal.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct StatsArgs {
    /// Transaction size used for the estimate.
    #[arg(long, default_value_t = 1000, value_name = "BYTES")]
    size: u64,
}

#[derive(Debug, Clone, Args)]
struct TrustArgs {
    /// Filesystem UUID as reported by blkid.
    uuid: String,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration as TOML.
    Show,
    /// Validate the configuration file.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completions for.
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<CsError> for CliError {
    fn from(err: CsError) -> Self {
        match err {
            CsError::InvalidConfig { .. }
            | CsError::MissingConfig { .. }
            | CsError::ConfigParse { .. } => Self::User(err.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_console_command(cli, args),
        Command::Stats(args) => run_stats(cli, args),
        Command::Trust(args) => run_trust(cli, args),
        Command::Devices => run_devices(cli),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── logging ────────────────────

fn log_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    }
}

/// Log to stderr, honouring `RUST_LOG` over `-v`/`-q`.
pub fn init_logging(cli: &Cli) {
    if matches!(cli.command, Command::Run(_)) {
        // The console owns the terminal; `run` sets up file logging itself.
        return;
    }
    let env = env_logger::Env::default().default_filter_or(log_filter(cli));
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn init_file_logging(cli: &Cli, path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let env = env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" });
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}

// ──────────────────── run ────────────────────

fn run_console_command(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let store = ConfigStore::open(cli.config.as_deref())?;
    let config = store.config().clone();

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| config.paths.journal.with_file_name("coldsign.log"));
    init_file_logging(cli, &log_path)?;

    let journal = if args.no_journal {
        ActivityJournal::disabled()
    } else {
        ActivityJournal::open(&config.paths.journal)
    };

    let settings: SharedSettings = store.into_shared();
    let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let estimator = TimingEstimator::new(Arc::clone(&settings)).with_parallelism(parallelism);
    let executor = BackgroundExecutor::start(estimator)?;
    let media = LinuxMedia::from_config(&config.usb)?;
    let signer = ElectrumCli::new(&config.signer.electrum_path);

    let config_hash = config.stable_hash()?;
    let redraw_tick = Duration::from_millis(config.ui.redraw_tick_ms);
    journal.record(
        &JournalEntry::new(EventType::ConsoleStart)
            .details(format!("{APP_NAME} v{APP_VERSION} config={config_hash}")),
    );
    log::info!("starting console, config hash {config_hash}");

    let services = Services {
        config: Arc::new(config),
        settings: Arc::clone(&settings),
        media: Arc::new(media),
        signer: Arc::new(signer),
        executor: Arc::new(executor),
        journal: journal.clone(),
    };
    let mut console = Console::new(services);
    let shutdown = ShutdownSignal::register();
    let outcome = run_console(&mut console, &shutdown, redraw_tick);

    journal.record(&JournalEntry::new(EventType::ConsoleStop));
    if let Err(e) = settings.lock().persist() {
        log::error!("saving settings on exit failed: {e}");
        eprintln!("{APP_NAME}: saving settings failed: {e}");
    }
    outcome.map_err(CliError::from)
}

// ──────────────────── stats ────────────────────

fn run_stats(cli: &Cli, args: &StatsArgs) -> Result<(), CliError> {
    let store = ConfigStore::open(cli.config.as_deref())?;
    let settings: SharedSettings = store.into_shared();
    let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let estimator = TimingEstimator::new(settings).with_parallelism(parallelism);

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{}", "Signer timing".bold());
            for kind in TimingKind::ALL {
                let window = estimator.window(kind);
                let average = estimator
                    .average(kind)
                    .map_or_else(|| "n/a".dimmed().to_string(), |a| format!("{a:.2} s/kB"));
                let estimate = estimator.estimate_duration(kind, args.size);
                println!("  {:<12} avg {average}", kind.label());
                println!(
                    "  {:<12} window {window:?}, estimate for {} bytes: {:.2}s",
                    "",
                    args.size,
                    estimate.as_secs_f64()
                );
            }
        }
        OutputMode::Json => {
            let kinds: Vec<Value> = TimingKind::ALL
                .iter()
                .map(|&kind| {
                    json!({
                        "kind": kind,
                        "window": estimator.window(kind),
                        "average": estimator.average(kind),
                        "rate": estimator.rate(kind),
                        "estimate_secs": estimator.estimate_duration(kind, args.size).as_secs_f64(),
                    })
                })
                .collect();
            write_json_line(&json!({
                "command": "stats",
                "size_bytes": args.size,
                "kinds": kinds,
            }))?;
        }
    }
    Ok(())
}

// ──────────────────── trust ────────────────────

fn run_trust(cli: &Cli, args: &TrustArgs) -> Result<(), CliError> {
    let uuid = args.uuid.trim();
    if uuid.is_empty() || uuid.chars().any(char::is_whitespace) {
        return Err(CliError::User(format!("not a filesystem UUID: {:?}", args.uuid)));
    }
    let mut store = ConfigStore::open(cli.config.as_deref())?;
    let already = store.is_trusted(uuid);
    if !already {
        store.add_trusted(uuid);
        store.persist()?;
    }
    let path = store.config().paths.config_file.clone();

    match output_mode(cli) {
        OutputMode::Human => {
            if already {
                println!("{} {uuid} is already trusted", "note:".blue());
            } else {
                println!("{} trusted {uuid} ({})", "ok:".green(), path.display());
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "trust",
            "uuid": uuid,
            "added": !already,
            "config": path.to_string_lossy(),
        }))?,
    }
    Ok(())
}

// ──────────────────── devices ────────────────────

fn run_devices(cli: &Cli) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let media = LinuxMedia::from_config(&config.usb)?;
    let snapshot = media.scan()?;
    let mounts = media.mount_points()?;

    match output_mode(cli) {
        OutputMode::Human => {
            if snapshot.is_empty() {
                println!("{}", "No USB stick has been found.".yellow());
            }
            for (device, attrs) in snapshot.iter() {
                let trusted = attrs
                    .uuid
                    .as_ref()
                    .is_some_and(|u| config.usb.trusted_uuids.contains(u));
                let marker = if trusted {
                    "trusted".green()
                } else {
                    "untrusted".yellow()
                };
                let mount = mounts
                    .get(device)
                    .map_or_else(|| "-".to_string(), |p| p.display().to_string());
                println!(
                    "{device:<12} {:<12} {:<16} {marker:<10} {mount}",
                    attrs.uuid.as_deref().unwrap_or("-"),
                    attrs.label.as_deref().unwrap_or("-"),
                );
            }
        }
        OutputMode::Json => {
            let devices: Vec<Value> = snapshot
                .iter()
                .map(|(device, attrs)| {
                    json!({
                        "device": device,
                        "uuid": attrs.uuid,
                        "label": attrs.label,
                        "fs_type": attrs.fs_type,
                        "trusted": attrs.uuid.as_ref().is_some_and(|u| config.usb.trusted_uuids.contains(u)),
                        "mount_point": mounts.get(device).map(|p| p.to_string_lossy().into_owned()),
                    })
                })
                .collect();
            write_json_line(&json!({ "command": "devices", "devices": devices }))?;
        }
    }
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();
            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "config path",
                    "path": path.to_string_lossy(),
                    "exists": exists,
                }))?,
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let mut config = Config::load(cli.config.as_deref())?;
            if !config.signer.wallet_password.is_empty() {
                config.signer.wallet_password = "********".to_string();
            }
            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "config show",
                    "config": serde_json::to_value(&config)?,
                }))?,
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("{}", "Configuration is valid.".green());
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": true,
                        "path": config.paths.config_file.to_string_lossy(),
                        "hash": hash,
                    }))?,
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => eprintln!("{} {e}", "Configuration is INVALID:".red()),
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "error": e.to_string(),
                        "code": e.code(),
                    }))?,
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("CS_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
