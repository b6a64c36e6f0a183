pub mod cli;
pub mod config;
pub mod filter;
pub mod querystring;
pub mod records;

use crate::config::FilterConfig;
use crate::records::Record;
use anyhow::{Context, bail};
use colored::Colorize;
use comfy_table::Table;
use serde_json::Value;
use tracing::{debug, info};

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use filter::{
    CompiledPredicate, EvalError, FilterCompiler, FilterError, FilterNode, ValueAccessor, compile,
};
pub use querystring::{QueryError, filters_from_query};

/// Decode a filter argument, accepting JSON5 for easier shell quoting
pub fn parse_filter_arg(input: &str) -> anyhow::Result<Vec<FilterNode>> {
    let value: Value = json5::from_str(input).context("Filter is not valid JSON")?;
    Ok(FilterNode::parse_list(&value)?)
}

/// Validate against the configured schema and compile
fn build_predicate(
    nodes: &[FilterNode],
    config: &FilterConfig,
) -> Result<CompiledPredicate, FilterError> {
    if let Some(schema) = config.schema() {
        schema.validate(nodes)?;
    }
    config.compiler().compile(nodes)
}

#[derive(Debug, Default)]
struct EvalSummary {
    matched: Vec<Record>,
    total: usize,
    skipped: usize,
}

fn evaluate_records(
    predicate: &CompiledPredicate,
    records: Vec<Record>,
    strict: bool,
) -> anyhow::Result<EvalSummary> {
    let mut summary = EvalSummary {
        total: records.len(),
        ..EvalSummary::default()
    };

    for record in records {
        match predicate.matches(&record.value) {
            Ok(true) => summary.matched.push(record),
            Ok(false) => {}
            Err(e) if strict => bail!("Failed to evaluate {}: {}", record.label(), e),
            Err(e) => {
                eprintln!("{} {}: {}", "Warning:".yellow(), record.label(), e);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

fn print_text_results(summary: &EvalSummary) {
    if !summary.matched.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "line", "record"]);
        for record in &summary.matched {
            table.add_row(vec![
                record.position.to_string(),
                record.line.map(|line| line.to_string()).unwrap_or_default(),
                record.value.to_string(),
            ]);
        }
        println!("{table}");
    }

    let line = format!(
        "{} of {} record{} matched",
        summary.matched.len(),
        summary.total,
        if summary.total == 1 { "" } else { "s" }
    );
    if summary.matched.is_empty() {
        println!("{}", line.yellow());
    } else {
        println!("{}", line.green());
    }
    if summary.skipped > 0 {
        println!(
            "{}",
            format!("{} record(s) could not be evaluated", summary.skipped).red()
        );
    }
}

pub fn run(cli: &cli::Cli) -> anyhow::Result<()> {
    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let mut config = crate::config::load_config(cli.config.as_deref())
        .context("Failed to load config")?;
    config.declare_fields(cli.fields.iter().cloned());
    debug!(?config, "loaded configuration");

    match &cli.command {
        Commands::Check { filter } => {
            let nodes = parse_filter_arg(filter)?;
            let predicate = build_predicate(&nodes, &config)?;
            println!("{} {}", "OK".green().bold(), predicate);
        }
        Commands::Eval {
            file,
            filter,
            params,
            format,
            strict,
        } => {
            let mut nodes = match filter {
                Some(filter) => parse_filter_arg(filter)?,
                None => Vec::new(),
            };
            nodes.extend(filters_from_query(params.iter().map(|(k, v)| (k, v)))?);

            let predicate = build_predicate(&nodes, &config)?;
            info!(%predicate, "evaluating filter");

            let records = crate::records::load_records(file)?;
            let summary = evaluate_records(&predicate, records, *strict)?;

            match format {
                OutputFormat::Text => print_text_results(&summary),
                OutputFormat::Json => {
                    let values: Vec<&Value> = summary.matched.iter().map(|r| &r.value).collect();
                    println!("{}", serde_json::to_string_pretty(&values)?);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FieldKind, Operator};
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| Record {
                position: idx + 1,
                line: None,
                value,
            })
            .collect()
    }

    #[test]
    fn test_parse_filter_arg_accepts_json5() {
        let nodes = parse_filter_arg("[{op: 'eq', name: 'a', val: 1}]").unwrap();
        assert_eq!(nodes, vec![FilterNode::comparison(Operator::Eq, "a", json!(1))]);
    }

    #[test]
    fn test_build_predicate_applies_schema() {
        let mut config = FilterConfig::default();
        config.fields.insert("a".to_string(), FieldKind::Bool);
        let nodes = vec![FilterNode::comparison(Operator::Gt, "a", json!(true))];

        assert!(matches!(
            build_predicate(&nodes, &config),
            Err(FilterError::OperatorNotPermitted { .. })
        ));
    }

    #[test]
    fn test_declared_fields_override_config() {
        let mut config = FilterConfig::default();
        config.fields.insert("a".to_string(), FieldKind::Bool);
        config.declare_fields([("a".to_string(), "int".parse::<FieldKind>().unwrap())]);
        let nodes = vec![FilterNode::comparison(Operator::Gt, "a", json!(1))];

        assert!(build_predicate(&nodes, &config).is_ok());
    }

    #[test]
    fn test_evaluate_records_skips_errors_unless_strict() {
        let predicate =
            compile(&[FilterNode::comparison(Operator::Gt, "a", json!(1))]).unwrap();
        let input = records(vec![json!({"a": 2}), json!({"a": "x"}), json!({"a": 0})]);

        let summary = evaluate_records(&predicate, input.clone(), false).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.matched, vec![input[0].clone()]);

        assert!(evaluate_records(&predicate, input, true).is_err());
    }
}
