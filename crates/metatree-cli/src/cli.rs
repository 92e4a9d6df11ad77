//! Command-line browser and editor for bencoded metainfo files.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use metatree_config::{CONFIG_PATH_ENV, ConfigError, ConfigLoader, LogOutput, TreeConfig};
use metatree_telemetry::{CommandSpan, LogFormat, LoggingConfig, build_sha, init_logging};
use tracing::debug;

use crate::commands::edit::{
    handle_export, handle_get, handle_insert, handle_remove, handle_set,
};
use crate::commands::show::handle_show;
use crate::context::{AppContext, CliError, CliResult};

/// Parses CLI arguments, loads configuration, installs logging and executes the
/// requested command. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    if let Err(err) = init_logging(&LoggingConfig {
        level: &config.logging.level,
        format: log_format(config.logging.format),
        build_sha: build_sha(),
    }) {
        eprintln!("error: failed to initialise logging: {err}");
        return 3;
    }
    let span = CommandSpan::enter(command_name);
    debug!(command = command_name, "dispatching command");

    let ctx = AppContext {
        config,
        output: cli.output,
    };
    match dispatch(cli.command, &ctx).await {
        Ok(()) => {
            span.record_outcome("success");
            0
        }
        Err(err) => {
            span.record_outcome("error");
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::Show(args) => handle_show(ctx, args).await,
        Command::Get(args) => handle_get(ctx, args).await,
        Command::Export(args) => handle_export(ctx, args).await,
        Command::Set(args) => handle_set(ctx, args).await,
        Command::Remove(args) => handle_remove(ctx, args).await,
        Command::Insert(args) => handle_insert(ctx, args).await,
    }
}

fn load_config(cli: &Cli) -> CliResult<TreeConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    loader
        .with_process_env()
        .load()
        .map_err(|err| CliError::validation(describe_config_error(&err)))
}

pub(crate) fn describe_config_error(err: &ConfigError) -> String {
    match err {
        ConfigError::InvalidValue { key, value, reason } => {
            format!("invalid {key} `{value}`: {reason}")
        }
        ConfigError::UnknownVariable { name } => format!("unknown setting `{name}`"),
        ConfigError::MalformedFile { path, source } => {
            format!("failed to parse {}: {source}", path.display())
        }
        ConfigError::ReadFile { path, source } => {
            format!("failed to read {}: {source}", path.display())
        }
    }
}

const fn log_format(output: LogOutput) -> LogFormat {
    match output {
        LogOutput::Auto => LogFormat::for_build(),
        LogOutput::Pretty => LogFormat::Pretty,
        LogOutput::Json => LogFormat::Json,
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Show(_) => "show",
        Command::Get(_) => "get",
        Command::Export(_) => "export",
        Command::Set(_) => "set",
        Command::Remove(_) => "remove",
        Command::Insert(_) => "insert",
    }
}

#[derive(Parser)]
#[command(name = "metatree", about = "Browse and edit bencoded metainfo files")]
pub(crate) struct Cli {
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Tree,
        help = "Select output format for commands that render documents"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Load one or more files and print their trees.
    Show(ShowArgs),
    /// Print the value at a path.
    Get(GetArgs),
    /// Print a whole file as JSON.
    Export(ExportArgs),
    /// Replace the value at a path.
    Set(SetArgs),
    /// Remove the entry or item at a path.
    Remove(RemoveArgs),
    /// Add an entry to a dictionary or an item to a list.
    Insert(InsertArgs),
}

#[derive(Args)]
pub(crate) struct ShowArgs {
    #[arg(required = true)]
    pub(crate) files: Vec<PathBuf>,
    /// Levels rendered below each file; unlimited when omitted.
    #[arg(long)]
    pub(crate) depth: Option<usize>,
}

#[derive(Args)]
pub(crate) struct GetArgs {
    pub(crate) file: PathBuf,
    /// Slash-separated path, e.g. `info/files/0/length`.
    pub(crate) path: String,
}

#[derive(Args)]
pub(crate) struct ExportArgs {
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct SetArgs {
    pub(crate) file: PathBuf,
    pub(crate) path: String,
    pub(crate) value: String,
    #[arg(long = "type", value_enum, default_value_t = ValueKind::Auto)]
    pub(crate) kind: ValueKind,
    /// Write the result here instead of over the input file.
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct RemoveArgs {
    pub(crate) file: PathBuf,
    pub(crate) path: String,
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct InsertArgs {
    pub(crate) file: PathBuf,
    /// Path of the dictionary or list receiving the value; empty for the top level.
    pub(crate) path: String,
    /// Entry name for dictionaries, position for lists.
    pub(crate) key: String,
    pub(crate) value: String,
    #[arg(long = "type", value_enum, default_value_t = ValueKind::Auto)]
    pub(crate) kind: ValueKind,
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Tree,
    Json,
}

/// How a command-line value is turned into a scalar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ValueKind {
    /// Keep the type of the value being replaced; integers win for new values.
    Auto,
    Int,
    Text,
    /// Hex-encoded bytes.
    Hex,
}
