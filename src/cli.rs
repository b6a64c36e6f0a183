use crate::filter::FieldKind;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Compile JSON:API filter expressions and evaluate them against JSON records
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file (accessor, depth limit, field types)
    #[arg(short, long, global = true, env = "JSONAPI_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Declare a field type such as 'age=int' (repeatable, overrides config)
    #[arg(long = "field", value_parser = parse_field, global = true)]
    pub fields: Vec<(String, FieldKind)>,

    /// When to use colored output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and compile a filter, then print how it will be evaluated
    Check {
        /// Filter as a JSON (or JSON5) list of conditions
        #[arg(short, long)]
        filter: String,
    },
    /// Print the records that match a filter
    Eval {
        /// Records as a JSON array or JSON Lines
        #[arg(short = 'i', long)]
        file: PathBuf,

        /// Filter as a JSON (or JSON5) list of conditions
        #[arg(short, long)]
        filter: Option<String>,

        /// Query parameter such as 'filter[name]=value' (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Abort on the first record that cannot be evaluated
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Split `KEY=VALUE` at the first `=`
pub fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("Expected KEY=VALUE, got: {}", s))
}

/// Parse `NAME=TYPE` where TYPE is str, int, float or bool
pub fn parse_field(s: &str) -> Result<(String, FieldKind), String> {
    let (name, kind) = parse_param(s)?;
    if name.is_empty() {
        return Err(format!("Missing field name in: {}", s));
    }
    Ok((name, kind.parse()?))
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
