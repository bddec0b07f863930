//! Purpose: `storefront` CLI entry point and global option parsing.
//! Role: Binary crate root; parses args, configures logging, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable JSON envelopes on stdout; logs go to stderr only.
//! Invariants: Errors are emitted as JSON on stderr unless stderr is a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod record_json;

use storefront::api::{
    CatalogConfig, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, Error, ErrorKind, RecordId, SortOrder,
    to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `storefront --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();

    let color_mode = cli.color;
    let config = catalog_config(&cli);
    command_dispatch::dispatch_command(cli.command, &config, color_mode)
        .map_err(add_transport_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn catalog_config(cli: &Cli) -> CatalogConfig {
    let mut config = CatalogConfig::new(cli.api_url.clone())
        .with_page_size(cli.page_size)
        .with_search_debounce(Duration::from_millis(cli.debounce_ms));
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(timeout_ms));
    }
    config
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "storefront",
    version,
    about = "Browse, search, and add products in a remote catalog",
    long_about = None,
    after_help = r#"EXAMPLES
  $ storefront list --category electronics --sort asc
  $ storefront list --search shirt --page 2
  $ storefront get 3
  $ storefront create --title Hat --price 12.5 --description Wool \
      --image https://img.example/hat.png --category men
  $ storefront browse

NOTES
  - Logs go to stderr; set RUST_LOG=debug to trace requests and cache activity."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_BASE_URL,
        help = "Catalog service base URL"
    )]
    api_url: String,
    #[arg(long, global = true, help = "Transport timeout in milliseconds (default: none)")]
    timeout_ms: Option<u64>,
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_PAGE_SIZE,
        help = "Products per page"
    )]
    page_size: usize,
    #[arg(
        long,
        global = true,
        default_value_t = 300,
        help = "Quiet period before a search is applied in browse mode"
    )]
    debounce_ms: u64,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum SortArg {
    #[default]
    #[value(name = "none")]
    Unsorted,
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Unsorted => SortOrder::Unsorted,
            SortArg::Asc => SortOrder::PriceAscending,
            SortArg::Desc => SortOrder::PriceDescending,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List one page of products after search, category, and sort")]
    List {
        #[arg(long, default_value = "", help = "Case-insensitive title substring")]
        search: String,
        #[arg(long, default_value = "all", help = "Exact category name, or `all`")]
        category: String,
        #[arg(long, value_enum, default_value = "none", help = "Price order: none|asc|desc")]
        sort: SortArg,
        #[arg(long, default_value_t = 1, help = "1-based page number")]
        page: usize,
    },
    #[command(about = "List product categories")]
    Categories,
    #[command(about = "Show one product")]
    Get {
        #[arg(help = "Product id")]
        id: RecordId,
    },
    #[command(about = "Validate and create a product")]
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        price: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "", help = "Absolute image URL")]
        image: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    #[command(
        about = "Interactive listing driven by stdin lines",
        after_help = r#"INPUT LINES
  search <text>        update the search box (applied after the debounce delay)
  category <name|all>  filter by category
  sort none|asc|desc   order by price
  next | prev          move between pages
  refresh              refetch products and categories
  quit                 exit"#
    )]
    Browse,
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches("error: ").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn add_transport_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Transport || err.hint().is_some() {
        return err;
    }
    err.with_hint("Catalog request failed. Check network access and --api-url.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Internal error. Re-run with RUST_LOG=debug for details.")
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let pretty = is_tty || color_mode.use_color(is_tty);
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_text(err: &Error, use_color: bool) -> String {
    let label = colorize_label("error:", use_color, AnsiColor::Red);
    let mut lines = vec![format!("{label} {}", error_message(err))];
    for field in err.fields() {
        lines.push(format!("  {}: {}", field.field.as_str(), field.message));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    lines.join("\n")
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Validation => "invalid input".to_string(),
        ErrorKind::Transport => "catalog request failed".to_string(),
    }
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(id) = err.id() {
        inner.insert("id".to_string(), json!(id));
    }
    if !err.fields().is_empty() {
        let fields = err
            .fields()
            .iter()
            .map(|field| json!({"field": field.field.as_str(), "message": field.message}))
            .collect::<Vec<_>>();
        inner.insert("fields".to_string(), json!(fields));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}
