use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

use crate::util::logging::{parse_level, LoggingConfig};

/// MCP tool server for Excel workbooks
#[derive(Parser, Debug)]
#[command(
    name = "sheetbox",
    about = "MCP tool server for reading and editing Excel (.xlsx) workbooks",
    version,
    author,
    long_about = "sheetbox serves a small catalog of spreadsheet tools over HTTP \
                  (GET /mcp/info, POST /mcp/run). Without a subcommand it starts the \
                  server on 0.0.0.0:7777. The same tools can be run locally with \
                  `sheetbox run`."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

impl CliArgs {
    /// Logging settings: `--log-level`, then `-v`/`-q`, then the
    /// `SHEETBOX_LOG_*` environment.
    pub fn logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::from_env();

        if let Some(level) = &self.log_level {
            config.level = parse_level(level);
        } else if self.verbose {
            config.level = Level::DEBUG;
        } else if self.quiet {
            config.level = Level::ERROR;
        }

        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the HTTP tool server (default)",
        long_about = "Starts the MCP server. Settings come from SHEETBOX_* environment \
                      variables; flags given here take precedence.\n\n\
                      Examples:\n  \
                      sheetbox\n  \
                      sheetbox serve --port 8080\n  \
                      sheetbox serve --host 127.0.0.1 --workers 2"
    )]
    Serve(ServeArgs),

    #[command(
        about = "List the available tools",
        long_about = "Prints the tool catalog served at /mcp/info.\n\n\
                      Examples:\n  \
                      sheetbox tools\n  \
                      sheetbox tools --format json"
    )]
    Tools(ToolsArgs),

    #[command(
        about = "Run a tool against a local workbook",
        long_about = "Executes one tool on an .xlsx file from disk, without starting the server.\n\n\
                      Examples:\n  \
                      sheetbox run sum_range --file book.xlsx --range 'Sheet1!A1:A10'\n  \
                      sheetbox run set_cell --file book.xlsx --cell Sheet1!C3 --value 42 -o out.xlsx\n  \
                      sheetbox run to_csv --file book.xlsx -o book.csv"
    )]
    Run(RunArgs),
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long, value_name = "HOST", help = "Interface to bind [env: SHEETBOX_HOST]")]
    pub host: Option<String>,

    #[arg(short = 'p', long, value_name = "PORT", help = "Port to listen on [env: SHEETBOX_PORT]")]
    pub port: Option<u16>,

    #[arg(long, value_name = "N", help = "Number of worker threads [env: SHEETBOX_WORKERS]")]
    pub workers: Option<usize>,

    #[arg(
        long,
        value_name = "BYTES",
        help = "Largest accepted request body [env: SHEETBOX_MAX_PAYLOAD_BYTES]"
    )]
    pub max_payload_bytes: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct ToolsArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(value_name = "TOOL_ID", help = "Tool to run (see `sheetbox tools`)")]
    pub tool_id: String,

    #[arg(long, value_name = "PATH", help = "Workbook to process")]
    pub file: PathBuf,

    #[arg(long, value_name = "RANGE", help = "Qualified range, e.g. 'Sheet1!A1:A10'")]
    pub range: Option<String>,

    #[arg(long, value_name = "CELL", help = "Qualified cell address, e.g. 'Sheet1!B2'")]
    pub cell: Option<String>,

    #[arg(long, value_name = "VALUE", help = "Value to write (set_cell)")]
    pub value: Option<String>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write a file result here instead of printing JSON"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Printed result format: compact JSON or indented for reading"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
