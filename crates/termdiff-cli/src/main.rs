use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use termdiff_core::ComparisonPolicy;
use tracing::{debug, error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;
mod ui;

#[derive(Parser)]
#[command(
    name = "termdiff",
    version,
    about = "Reconcile Crowdin exports with Term Customizer override files"
)]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Commands,
}

/// Input files shared by most commands.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Crowdin export file(s): XLIFF or legacy CSV. Falls back to the
    /// remembered path from `termdiff config`.
    #[arg(long = "crowdin")]
    crowdin: Vec<PathBuf>,

    /// Term Customizer CSV file(s); directories load every .csv inside
    #[arg(long = "terms")]
    terms: Vec<PathBuf>,
}

/// Comparison policy switches. Defaults mirror the reconciliation defaults:
/// customizer value required, empty values skipped, case sensitive.
#[derive(Args, Debug, Clone, Copy)]
struct PolicyArgs {
    /// Also check entries whose customizer value is empty
    #[arg(long)]
    no_require_value: bool,

    /// Compare even when one side is empty
    #[arg(long)]
    include_empty: bool,

    /// Fold case before comparing
    #[arg(long)]
    ignore_case: bool,
}

impl PolicyArgs {
    fn to_policy(self) -> ComparisonPolicy {
        ComparisonPolicy {
            require_customizer_value: !self.no_require_value,
            include_empty_values: self.include_empty,
            case_sensitive: !self.ignore_case,
        }
    }
}

/// Correction-service settings; anything not given comes from the saved
/// config, anything not saved from the defaults.
#[derive(Args, Debug, Clone)]
struct ApiArgs {
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportModeArg {
    /// One output file next to each input file
    Individual,
    /// A single merged output in --out-dir
    Merged,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToneArg {
    Formal,
    Informal,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Diff Term Customizer files against a Crowdin export
    Compare {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        policy: PolicyArgs,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Exit with code 2 when any mismatch or orphaned key is found
        #[arg(long)]
        strict: bool,
    },

    /// Write reconciled mismatch rows to new CSV files
    Export {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        policy: PolicyArgs,
        #[arg(long, value_enum, default_value = "individual")]
        mode: ExportModeArg,
        /// Output name suffix inserted before the timestamp
        #[arg(long)]
        suffix: Option<String>,
        /// Target directory (required for merged mode)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// CSV overlay of manual edits (locale;key;value)
        #[arg(long)]
        edits: Option<PathBuf>,
    },

    /// Export keys that exist only in the Term Customizer files
    ExportDeleted {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Search loaded values in one locale, preview or apply a replacement
    Search {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        locale: String,
        /// Text to search for
        #[arg(long)]
        term: String,
        /// Replacement text
        #[arg(long)]
        replace: String,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long)]
        whole_word: bool,
        /// Write the replacement files instead of only previewing
        #[arg(long)]
        apply: bool,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Grammar-check values in one locale via the correction service
    Grammar {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        api: ApiArgs,
        #[arg(long)]
        locale: String,
        #[arg(long, default_value_t = termdiff_config::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Print the planned batches without calling the service
        #[arg(long)]
        dry_run: bool,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Convert German values between formal (Sie) and informal (Du) tone
    Tone {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        api: ApiArgs,
        #[arg(long)]
        locale: String,
        #[arg(long, value_enum)]
        mode: ToneArg,
        #[arg(long, default_value_t = termdiff_config::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        #[arg(long)]
        dry_run: bool,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// One-line round trip to verify the correction-service settings
    ApiTest {
        #[command(flatten)]
        api: ApiArgs,
    },

    /// Show or change the persisted settings (~/.termdiff.json)
    Config {
        /// Remember this Crowdin export as the default input
        #[arg(long)]
        set_crowdin: Option<PathBuf>,
        #[arg(long)]
        set_endpoint: Option<String>,
        #[arg(long)]
        set_api_key: Option<String>,
        #[arg(long)]
        set_model: Option<String>,
    },
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = match &self {
            Commands::Compare { .. } => "compare",
            Commands::Export { .. } => "export",
            Commands::ExportDeleted { .. } => "export-deleted",
            Commands::Search { .. } => "search",
            Commands::Grammar { .. } => "grammar",
            Commands::Tone { .. } => "tone",
            Commands::ApiTest { .. } => "api-test",
            Commands::Config { .. } => "config",
        };
        info!(event = "command_start", command = cmd_name);

        let result = match self {
            Commands::Compare {
                input,
                policy,
                format,
                strict,
            } => {
                debug!(event = "compare_args", input = ?input, policy = ?policy, strict = strict);
                commands::compare::run_compare(input, policy.to_policy(), format, strict, use_color)
            }
            Commands::Export {
                input,
                policy,
                mode,
                suffix,
                out_dir,
                edits,
            } => commands::export::run_export(
                input,
                policy.to_policy(),
                mode,
                suffix,
                out_dir,
                edits,
            ),
            Commands::ExportDeleted { input, out_dir } => {
                commands::export::run_export_deleted(input, out_dir)
            }
            Commands::Search {
                input,
                locale,
                term,
                replace,
                case_sensitive,
                whole_word,
                apply,
                out_dir,
                format,
            } => commands::search::run_search(
                input,
                locale,
                term,
                replace,
                case_sensitive,
                whole_word,
                apply,
                out_dir,
                format,
            ),
            Commands::Grammar {
                input,
                api,
                locale,
                batch_size,
                dry_run,
                out_dir,
            } => commands::grammar::run_grammar(input, api, locale, batch_size, dry_run, out_dir),
            Commands::Tone {
                input,
                api,
                locale,
                mode,
                batch_size,
                dry_run,
                out_dir,
            } => commands::grammar::run_tone(
                input, api, locale, mode, batch_size, dry_run, out_dir,
            ),
            Commands::ApiTest { api } => commands::api_test::run_api_test(api),
            Commands::Config {
                set_crowdin,
                set_endpoint,
                set_api_key,
                set_model,
            } => commands::config_cmd::run_config(set_crowdin, set_endpoint, set_api_key, set_model),
        };

        match &result {
            Ok(_) => info!(event = "command_done", command = cmd_name),
            Err(e) => error!(event = "command_failed", command = cmd_name, error = ?e),
        }

        result
    }
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = rolling::daily("logs", "termdiff.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing();

    let cli = Cli::parse();

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(use_color)
}
