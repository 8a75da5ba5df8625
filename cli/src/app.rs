use std::fs;
use std::io::{Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};

use filterql::core::EngineConfig;
use filterql::core::constants::{APP_NAME_LOWER, ENV_LOG};
use filterql::filters::{
    FilterSet, Identifier, Predicate, Record, compile, filter_rows_with, parse_predicates,
    validate_with,
};
use filterql::sql::{
    Columns, QueryDescriptor, build_count_with, build_select_with, extract_order_by,
    extract_where, to_where_with,
};

use crate::cli::{Cli, Commands, SelectArgs};

/// Result of a successfully executed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// `validate` rejected its input
    Rejected,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::Rejected => ExitCode::from(2),
        }
    }
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();
    tracing::trace!(command = ?cli.command, "Parsed command");

    let config = EngineConfig::load(&cli.config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = execute(&cli.command, &config, &mut out)?;
    Ok(outcome.exit_code())
}

fn init_logging() {
    let default_filter = format!("warn,{}=info", APP_NAME_LOWER);

    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or(default_filter);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

pub fn execute<W: Write>(
    command: &Commands,
    config: &EngineConfig,
    out: &mut W,
) -> Result<Outcome> {
    match command {
        Commands::Compile { predicates } => {
            let filters = compile(&load_predicates(predicates, config)?);
            writeln!(out, "{}", serde_json::to_string_pretty(&filters)?)?;
        }
        Commands::Where { predicates } => {
            let filters = compile(&load_predicates(predicates, config)?);
            if let Some(clause) = filters.and_then(|f| to_where_with(&f, &config.sql)) {
                writeln!(out, "{}", clause)?;
            }
        }
        Commands::Select(args) => {
            let descriptor = build_descriptor(args, config)?;
            if args.descriptor {
                writeln!(out, "{}", serde_json::to_string_pretty(&descriptor)?)?;
            } else {
                writeln!(out, "{}", build_select_with(&descriptor, &config.sql))?;
            }
        }
        Commands::Count { table, predicates } => {
            let table = Identifier::new(table.as_str())?;
            let filters = load_filters(predicates.as_deref(), config)?;
            writeln!(
                out,
                "{}",
                build_count_with(&table, filters.as_ref(), &config.sql)
            )?;
        }
        Commands::Preview { rows, predicates } => {
            let rows: Vec<Record> = serde_json::from_str(&read_input(rows)?)
                .context("Rows must be a JSON array of objects")?;
            let predicates = load_predicates(predicates, config)?;
            let kept = filter_rows_with(&rows, &predicates, &config.eval);
            tracing::debug!(total = rows.len(), kept = kept.len(), "Preview evaluated");
            writeln!(out, "{}", serde_json::to_string_pretty(&kept)?)?;
        }
        Commands::Validate { filters } => {
            let value: Value = serde_json::from_str(&read_input(filters)?)
                .context("Filters must be valid JSON")?;
            let accepted = validate_with(&value, &config.validator);
            writeln!(out, "{}", accepted)?;
            if !accepted {
                return Ok(Outcome::Rejected);
            }
        }
        Commands::Extract { sql } => {
            let sql = if sql == "-" { read_stdin()? } else { sql.clone() };
            let extracted = json!({
                "where": extract_where(&sql),
                "order_by": extract_order_by(&sql),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&extracted)?)?;
        }
    }
    Ok(Outcome::Success)
}

fn build_descriptor(args: &SelectArgs, config: &EngineConfig) -> Result<QueryDescriptor> {
    let table = Identifier::new(args.table.as_str())?;
    let columns = Columns::named(args.columns.iter().map(String::as_str))?;

    let mut descriptor = QueryDescriptor::new(table)
        .with_columns(columns)
        .with_filters(load_filters(args.predicates.as_deref(), config)?);
    descriptor.order_by = args.order_by.clone();
    descriptor.limit = args.limit;
    descriptor.offset = args.offset;
    Ok(descriptor)
}

fn load_filters(source: Option<&str>, config: &EngineConfig) -> Result<Option<FilterSet>> {
    match source {
        Some(source) => Ok(compile(&load_predicates(source, config)?)),
        None => Ok(None),
    }
}

fn load_predicates(source: &str, config: &EngineConfig) -> Result<Vec<Predicate>> {
    let json = read_input(source)?;
    let predicates = parse_predicates(&json, &config.parse)
        .with_context(|| format!("Invalid predicates in {}", source))?;
    tracing::debug!(count = predicates.len(), source = %source, "Predicates loaded");
    Ok(predicates)
}

/// Read a file, or stdin for `-`
fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        return read_stdin();
    }
    fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read stdin")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn run_to_string(command: Commands, config: &EngineConfig) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = execute(&command, config, &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    const PREDICATES: &str = r#"[
        {"column": "name", "operator": "contains", "value": "an"},
        {"column": "age", "operator": "greater_than", "value": 30}
    ]"#;

    #[test]
    fn test_compile_and_where() {
        let dir = tempfile::tempdir().unwrap();
        let preds = write(dir.path(), "p.json", PREDICATES);
        let config = EngineConfig::default();

        let (_, out) = run_to_string(
            Commands::Compile {
                predicates: preds.clone(),
            },
            &config,
        );
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"name": {"contains": "an"}, "age": {"gt": 30}}));

        let (outcome, out) = run_to_string(Commands::Where { predicates: preds }, &config);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(out.trim(), "`name` LIKE '%an%' AND `age` > 30");
    }

    #[test]
    fn test_compile_empty_prints_null() {
        let dir = tempfile::tempdir().unwrap();
        let preds = write(dir.path(), "p.json", "[]");
        let (_, out) = run_to_string(
            Commands::Compile { predicates: preds },
            &EngineConfig::default(),
        );
        assert_eq!(out.trim(), "null");
    }

    #[test]
    fn test_select_and_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let preds = write(dir.path(), "p.json", PREDICATES);
        let args = SelectArgs {
            table: "people".into(),
            columns: vec!["id".into(), "name".into()],
            predicates: Some(preds),
            order_by: Some("id".into()),
            limit: Some(5),
            offset: Some(10),
            descriptor: false,
        };
        let config = EngineConfig::default();

        let (_, out) = run_to_string(Commands::Select(args.clone()), &config);
        assert_eq!(
            out.trim(),
            "SELECT `id`, `name` FROM `people` WHERE `name` LIKE '%an%' AND `age` > 30 \
             ORDER BY id LIMIT 5 OFFSET 10"
        );

        let (_, out) = run_to_string(
            Commands::Select(SelectArgs {
                descriptor: true,
                ..args
            }),
            &config,
        );
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["table"], "people");
        assert_eq!(value["orderBy"], "id");
        assert_eq!(value["columns"], json!(["id", "name"]));
    }

    #[test]
    fn test_count_without_predicates() {
        let (_, out) = run_to_string(
            Commands::Count {
                table: "orders".into(),
                predicates: None,
            },
            &EngineConfig::default(),
        );
        assert_eq!(out.trim(), "SELECT COUNT(*) as count FROM `orders`");
    }

    #[test]
    fn test_invalid_table_is_error() {
        let mut out = Vec::new();
        let command = Commands::Count {
            table: "bad table".into(),
            predicates: None,
        };
        assert!(execute(&command, &EngineConfig::default(), &mut out).is_err());
    }

    #[test]
    fn test_preview_filters_rows() {
        let dir = tempfile::tempdir().unwrap();
        let preds = write(dir.path(), "p.json", PREDICATES);
        let rows = write(
            dir.path(),
            "rows.json",
            r#"[
                {"name": "Dana", "age": 41},
                {"name": "Ann", "age": 22},
                {"name": "Bob", "age": 50}
            ]"#,
        );
        let (_, out) = run_to_string(
            Commands::Preview {
                rows,
                predicates: preds,
            },
            &EngineConfig::default(),
        );
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!([{"name": "Dana", "age": 41}]));
    }

    #[test]
    fn test_validate_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let filters = write(dir.path(), "f.json", r#"{"name": "DROP TABLE x"}"#);

        let (outcome, out) = run_to_string(
            Commands::Validate {
                filters: filters.clone(),
            },
            &EngineConfig::default(),
        );
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(out.trim(), "true");

        let mut config = EngineConfig::default();
        config.validator.block_on_keywords = true;
        let (outcome, out) = run_to_string(Commands::Validate { filters }, &config);
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(out.trim(), "false");
    }

    #[test]
    fn test_extract() {
        let (_, out) = run_to_string(
            Commands::Extract {
                sql: "SELECT * FROM `t` WHERE `a` = 1 ORDER BY a LIMIT 3".into(),
            },
            &EngineConfig::default(),
        );
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"where": "`a` = 1", "order_by": "a"}));
    }

    #[test]
    fn test_whitelist_from_config_rejects_column() {
        let dir = tempfile::tempdir().unwrap();
        let preds = write(dir.path(), "p.json", PREDICATES);
        let mut config = EngineConfig::default();
        config.parse.allowed_columns = Some(vec!["name".into()]);

        let mut out = Vec::new();
        let err = execute(&Commands::Where { predicates: preds }, &config, &mut out).unwrap_err();
        assert!(format!("{:#}", err).contains("Cannot filter by column: age"));
    }

    #[test]
    fn test_missing_input_file() {
        let mut out = Vec::new();
        let err = execute(
            &Commands::Compile {
                predicates: "/nonexistent/preds.json".into(),
            },
            &EngineConfig::default(),
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
