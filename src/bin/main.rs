//! Kocher CLI - build and query the lab sample database
//!
//! Usage:
//!   kocher create --yaml <schema.yml>
//!   kocher sql --yaml <schema.yml> --column <col>... [--table <t>...] [selection]
//!   kocher retrieve --yaml <schema.yml> --column <col>... [--table <t>...] [selection]
//!
//! Selection flags take a column and a value and may be repeated:
//!   --include <col> <val>    --exclude <col> <val>
//!   --contains <col> <val>   --not-contains <col> <val>
//!
//! Examples:
//!   kocher create --yaml kocher.yml
//!   kocher sql --yaml kocher.yml --column "Table1.Unique ID" --table Table1 --table Table3
//!   kocher retrieve --yaml kocher.yml --table Table2 --contains Species Canis

use clap::{Args, Parser, Subcommand, ValueEnum};
use kocher::database::{value_to_string, Database, Row};
use kocher::model::Schema;
use kocher::sql::{Compiler, Operator, Select, SelectionBuilder, SelectionExpression};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kocher")]
#[command(about = "Kocher - build and query the lab sample database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and every table in the schema
    Create {
        /// Path to the YAML schema document
        #[arg(long)]
        yaml: PathBuf,
    },

    /// Print the SELECT statement for a query without running it
    Sql {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Run a query and write the rows to stdout
    Retrieve {
        #[command(flatten)]
        query: QueryArgs,

        /// Field separator
        #[arg(long, default_value = "tsv")]
        format: OutputFormat,

        /// Include db-specific columns in table projections
        #[arg(long)]
        all_columns: bool,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Path to the YAML schema document
    #[arg(long)]
    yaml: PathBuf,

    /// Column to return (bare name, table.column or table.*)
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Table to join (derived from the columns when omitted)
    #[arg(long = "table")]
    tables: Vec<String>,

    /// Keep rows where COLUMN is VALUE
    #[arg(long, num_args = 2, value_names = ["COLUMN", "VALUE"])]
    include: Vec<String>,

    /// Drop rows where COLUMN is VALUE
    #[arg(long, num_args = 2, value_names = ["COLUMN", "VALUE"])]
    exclude: Vec<String>,

    /// Keep rows where COLUMN contains VALUE
    #[arg(long, num_args = 2, value_names = ["COLUMN", "VALUE"])]
    contains: Vec<String>,

    /// Drop rows where COLUMN contains VALUE
    #[arg(long, num_args = 2, value_names = ["COLUMN", "VALUE"])]
    not_contains: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Tab separated
    Tsv,
    /// Comma separated
    Csv,
}

impl OutputFormat {
    fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Tsv => b'\t',
            OutputFormat::Csv => b',',
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Create { yaml } => cmd_create(yaml),
        Commands::Sql { query } => cmd_sql(query),
        Commands::Retrieve {
            query,
            format,
            all_columns,
        } => cmd_retrieve(query, format, all_columns),
    }
}

fn load_schema(path: &Path) -> Option<Schema> {
    match Schema::from_yaml_file(path) {
        Ok(schema) => Some(schema),
        Err(e) => {
            eprintln!("Error loading schema '{}': {}", path.display(), e);
            None
        }
    }
}

fn cmd_create(yaml: PathBuf) -> ExitCode {
    let Some(schema) = load_schema(&yaml) else {
        return ExitCode::FAILURE;
    };

    let result = Database::create(schema.database())
        .and_then(|db| db.create_tables(&Compiler::new(&schema)));

    match result {
        Ok(()) => {
            println!(
                "Created {} tables in {}",
                schema.tables().len(),
                schema.database().display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_sql(query: QueryArgs) -> ExitCode {
    let Some(schema) = load_schema(&query.yaml) else {
        return ExitCode::FAILURE;
    };
    let select = build_select(&schema, &query, false);

    match Compiler::new(&schema).compile_select(&select) {
        Ok(statement) => {
            println!("{}", statement.sql);
            if !statement.params.is_empty() {
                println!("-- params: {}", statement.params.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_retrieve(query: QueryArgs, format: OutputFormat, all_columns: bool) -> ExitCode {
    let Some(schema) = load_schema(&query.yaml) else {
        return ExitCode::FAILURE;
    };
    let select = build_select(&schema, &query, all_columns);

    let result = Database::open(schema.database())
        .and_then(|db| db.retrieve(&Compiler::new(&schema), &select));

    match result {
        Ok(rows) => match write_rows(io::stdout().lock(), &rows, format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error writing output: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Columns default to the projection of every requested table.
fn build_select(schema: &Schema, query: &QueryArgs, all_columns: bool) -> Select {
    let columns: Vec<String> = if query.columns.is_empty() {
        query
            .tables
            .iter()
            .filter_map(|name| schema.get_table(name))
            .flat_map(|table| table.column_paths(all_columns))
            .collect()
    } else {
        query.columns.clone()
    };

    Select::columns(columns)
        .from(query.tables.clone())
        .filter(build_selection(query))
}

fn build_selection(query: &QueryArgs) -> SelectionExpression {
    let flags = [
        (Operator::In, &query.include),
        (Operator::NotIn, &query.exclude),
        (Operator::Like, &query.contains),
        (Operator::NotLike, &query.not_contains),
    ];

    flags
        .into_iter()
        .fold(SelectionBuilder::new(), |builder, (op, values)| {
            values.chunks(2).fold(builder, |builder, pair| match pair {
                [column, value] => builder.add(op, column.clone(), [value.clone()]),
                _ => builder,
            })
        })
        .build()
}

/// Header from the first row's keys, then one record per row. Fields holding
/// the delimiter or quotes are quoted by the writer.
fn write_rows<W: io::Write>(out: W, rows: &[Row], format: OutputFormat) -> io::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(out);

    if let Some(first) = rows.first() {
        writer.write_record(first.keys())?;
    }
    for row in rows {
        writer.write_record(row.values().map(value_to_string))?;
    }
    writer.flush()
}
