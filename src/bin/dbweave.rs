//! dbweave: build and run SQL statements from the command line
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a filtered select
//! dbweave select --table users --where "age > 10 and dept in (1, 2)" --dry-run
//!
//! # Update with an explicit SET list
//! dbweave update --table users --set "active = false" --where "id = 7"
//!
//! # Explain how a filter maps onto builder calls
//! dbweave explain "a = 1 or (b like 'x%')"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use dbweave::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbweave")]
#[command(version)]
#[command(about = "Fluent SQL construction for several database dialects", long_about = None)]
#[command(after_help = "EXAMPLES:
    dbweave select --table users --where 'age > 10' --order-by name,-created --dry-run
    dbweave count --table users --where \"name like 'b%'\"
    dbweave insert --table users --values \"id = 1, name = 'ann'\" --on-duplicate ignore
    dbweave delete --table sessions --where 'expired = true'")]
struct Cli {
    /// Target dialect (defaults to the config file, then the URL scheme)
    #[arg(long, global = true)]
    dialect: Option<DialectKind>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Don't execute, just show the generated SQL
    #[arg(short, long, global = true)]
    dry_run: bool,

    /// Database connection URL
    #[arg(long, global = true, env = "DBWEAVE_DATABASE_URL")]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnDuplicate {
    Into,
    Ignore,
    Update,
}

impl From<OnDuplicate> for DuplicateKeyStrategy {
    fn from(value: OnDuplicate) -> Self {
        match value {
            OnDuplicate::Into => DuplicateKeyStrategy::Into,
            OnDuplicate::Ignore => DuplicateKeyStrategy::Ignore,
            OnDuplicate::Update => DuplicateKeyStrategy::Update,
        }
    }
}

#[derive(Args)]
struct TableArgs {
    /// Table name, optionally schema-qualified
    #[arg(short, long)]
    table: String,

    /// Filter expression, e.g. "age > 10 and name like 'b%'"
    #[arg(short = 'w', long = "where")]
    filter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Select rows
    Select {
        #[command(flatten)]
        target: TableArgs,

        /// Properties to select (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Group-by properties (comma-separated)
        #[arg(long, value_delimiter = ',')]
        group_by: Vec<String>,

        /// Order-by properties; a leading '-' sorts descending
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        order_by: Vec<String>,

        /// Rows per page
        #[arg(long)]
        page_size: Option<u64>,

        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u64,
    },
    /// Count matching rows
    Count {
        #[command(flatten)]
        target: TableArgs,
    },
    /// Update matching rows
    Update {
        #[command(flatten)]
        target: TableArgs,

        /// Assignments, e.g. "name = 'bob', age = 3"
        #[arg(short, long)]
        set: String,

        /// Allow an update without a filter
        #[arg(long)]
        all: bool,

        /// Allow primary-key columns in the SET list
        #[arg(long)]
        update_key: bool,
    },
    /// Delete matching rows
    Delete {
        #[command(flatten)]
        target: TableArgs,

        /// Allow a delete without a filter
        #[arg(long)]
        all: bool,
    },
    /// Insert rows
    Insert {
        /// Table name, optionally schema-qualified
        #[arg(short, long)]
        table: String,

        /// One row of assignments; repeat for more rows
        #[arg(long = "values", required = true)]
        rows: Vec<String>,

        /// Duplicate-key handling
        #[arg(long, value_enum, default_value = "into")]
        on_duplicate: OnDuplicate,
    },
    /// List dialects and their capabilities
    Dialects,
    /// Show how a filter expression maps onto builder calls
    Explain {
        /// The filter expression
        filter: String,

        /// Table used for the sample statement
        #[arg(short, long, default_value = "t")]
        table: String,
    },
}

enum Outcome {
    Rows,
    Count,
    Affected,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dbweave=debug")
    } else {
        EnvFilter::try_from_env("DBWEAVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let mut config = WeaveConfig::discover(cli.config.as_deref())?;
    if let Some(url) = &cli.database_url {
        config.database_url = Some(url.clone());
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = Some(dialect);
    }
    let template = config.template()?;
    if cli.verbose {
        println!("{} {}", "Dialect:".dimmed(), config.dialect().to_string().cyan());
    }

    match &cli.command {
        Commands::Select {
            target,
            columns,
            group_by,
            order_by,
            page_size,
            page,
        } => {
            let mut builder = filtered(template.select(&target.table), target.filter.as_deref())?;
            if !columns.is_empty() {
                builder = builder.select(&as_strs(columns));
            }
            if !group_by.is_empty() {
                builder = builder.group_by(&as_strs(group_by));
            }
            for item in order_by {
                builder = match item.strip_prefix('-') {
                    Some(property) => builder.desc(&[property]),
                    None => builder.asc(&[item.as_str()]),
                };
            }
            if let Some(size) = page_size {
                builder = builder.page(*size, *page);
            }
            dispatch(cli, &config, builder.build()?, Outcome::Rows).await
        }
        Commands::Count { target } => {
            let mut builder = filtered(template.select(&target.table), target.filter.as_deref())?;
            dispatch(cli, &config, builder.build_count()?, Outcome::Count).await
        }
        Commands::Update {
            target,
            set,
            all,
            update_key,
        } => {
            let mut builder = template
                .update(&target.table)
                .update_to_map(dbweave::filter::parse_assignments(set)?);
            if *all {
                builder = builder.allow_empty_where();
            }
            if *update_key {
                builder = builder.allow_update_key();
            }
            let mut builder = filtered(builder, target.filter.as_deref())?;
            dispatch(cli, &config, builder.build()?, Outcome::Affected).await
        }
        Commands::Delete { target, all } => {
            let mut builder = template.delete(&target.table);
            if *all {
                builder = builder.allow_empty_where();
            }
            let mut builder = filtered(builder, target.filter.as_deref())?;
            dispatch(cli, &config, builder.build()?, Outcome::Affected).await
        }
        Commands::Insert {
            table,
            rows,
            on_duplicate,
        } => {
            let rows = rows
                .iter()
                .map(|r| dbweave::filter::parse_assignments(r).map(Row::from_iter))
                .collect::<Result<Vec<_>, _>>()?;
            let stmt = template
                .insert(table)
                .apply_map(rows)
                .on_duplicate((*on_duplicate).into())
                .build()?;
            dispatch(cli, &config, stmt, Outcome::Affected).await
        }
        Commands::Dialects => {
            show_dialects();
            Ok(())
        }
        Commands::Explain { filter, table } => explain(&template, filter, table),
    }
}

fn as_strs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

fn filtered<B: Compare>(builder: B, filter: Option<&str>) -> Result<B> {
    match filter {
        Some(expr) => Ok(dbweave::filter::parse(expr)?.apply(builder)),
        None => Ok(builder),
    }
}

async fn dispatch(cli: &Cli, config: &WeaveConfig, stmt: BoundStatement, outcome: Outcome) -> Result<()> {
    let url = match config.database_url.as_deref() {
        Some(url) if !cli.dry_run => url,
        _ => {
            print_statement(&stmt, config.dialect());
            if config.database_url.is_none() && !cli.dry_run {
                println!();
                println!(
                    "{}",
                    "⚠ No database URL. Use --database-url or set DBWEAVE_DATABASE_URL".yellow()
                );
            }
            return Ok(());
        }
    };

    if cli.verbose {
        println!("{} {}", "Connecting to:".dimmed(), url);
        print_statement(&stmt, config.dialect());
    }
    let db = WeaveDb::connect(url).await?;
    match outcome {
        Outcome::Rows => {
            let rows = db.fetch_rows(&stmt).await?;
            format_output(&rows, cli.format);
        }
        Outcome::Count => {
            let count = db.fetch_count(&stmt).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "count": count })),
                OutputFormat::Table => println!("{} row(s)", count.to_string().cyan()),
            }
        }
        Outcome::Affected => {
            let affected = db.execute(&stmt).await?;
            println!("{} {} rows affected", "✓".green(), affected);
        }
    }
    Ok(())
}

fn print_statement(stmt: &BoundStatement, dialect: DialectKind) {
    let strategy = dialect.strategy();
    println!("{}", "Generated SQL:".green().bold());
    println!("{}", stmt.sql().white());
    if !stmt.args().is_empty() {
        println!();
        println!("{}", "Bindings:".cyan());
        for (i, arg) in stmt.args().iter().enumerate() {
            println!(
                "  {} = {} {}",
                strategy.placeholder(i + 1),
                arg.to_string().yellow(),
                format!("({})", arg.kind()).dimmed()
            );
        }
    }
}

fn format_output(rows: &[WireRow], format: OutputFormat) {
    if rows.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            let objects: Vec<serde_json::Map<String, serde_json::Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or_default()))
                        .collect()
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&objects).unwrap_or_default());
        }
        OutputFormat::Table => {
            let columns: Vec<&str> = rows[0].iter().map(|(k, _)| k.as_str()).collect();

            let mut widths: HashMap<&str, usize> = columns.iter().map(|c| (*c, c.len())).collect();
            for row in rows {
                for (col, val) in row {
                    let len = val.to_string().chars().count();
                    if let Some(w) = widths.get_mut(col.as_str()) {
                        *w = (*w).max(len);
                    }
                }
            }

            let header: Vec<String> = columns
                .iter()
                .map(|c| format!("{:width$}", c, width = widths[c]))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = columns.iter().map(|c| "─".repeat(widths[c])).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        let val = row
                            .iter()
                            .find(|(k, _)| k == c)
                            .map(|(_, v)| v.to_string())
                            .unwrap_or_default();
                        format!("{:width$}", val, width = widths[c])
                    })
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", rows.len().to_string().cyan());
        }
    }
}

fn explain(template: &LambdaTemplate, filter: &str, table: &str) -> Result<()> {
    println!("{} {}", "Filter:".dimmed(), filter.yellow());
    println!();

    let expr = match dbweave::filter::parse(filter) {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("{} {}", "Parse Error:".red().bold(), e);
            return Err(e.into());
        }
    };
    println!("{}", "Builder calls:".green().bold());
    println!("  {}", format!("select({:?}){}", table, expr.describe()).white());
    println!();

    let stmt = expr.apply(template.select(table)).build()?;
    print_statement(&stmt, kind_of(template));
    Ok(())
}

fn kind_of(template: &LambdaTemplate) -> DialectKind {
    template
        .dialect()
        .name()
        .parse()
        .unwrap_or_default()
}

fn show_dialects() {
    println!(
        "{:10} {:8} {:12} {:7} {}",
        "Dialect".white().bold(),
        "Quote".white().bold(),
        "Placeholder".white().bold(),
        "Paging".white().bold(),
        "Insert strategies".white().bold()
    );
    println!("{}", "─".repeat(64).dimmed());

    for kind in DialectKind::ALL {
        let strategy = kind.strategy();
        let strategies: Vec<&str> = [
            (DuplicateKeyStrategy::Into, "into"),
            (DuplicateKeyStrategy::Ignore, "ignore"),
            (DuplicateKeyStrategy::Update, "update"),
        ]
        .into_iter()
        .filter(|(s, _)| match strategy.insert() {
            Some(insert) => insert.insert_into(*s, "t").is_some(),
            None => *s == DuplicateKeyStrategy::Into,
        })
        .map(|(_, name)| name)
        .collect();
        println!(
            "{:10} {:8} {:12} {:7} {}",
            kind.to_string().cyan().bold(),
            strategy.quote_identifier("id"),
            strategy.placeholder(1).yellow(),
            if strategy.paging().is_some() { "yes".green() } else { "no".red() },
            strategies.join(", ").dimmed()
        );
    }
}
