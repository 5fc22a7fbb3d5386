use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use meter_toolkit::config::{
    self, CLEANED_FILE_NAME, DATE_COLUMN, DIAMETER_COLUMN, ENRICHED_FILE_NAME, INDEX_COLUMN,
    LOOKUP_METER_COLUMN, METER_COLUMN, MISSING_FILE_NAME, SUBSCRIBER_REF_COLUMN,
};
use meter_toolkit::{
    load_table, save_table, DedupColumns, DeduplicationEngine, Enricher, JoinPolicy, LoadOptions,
    Operation, Outcome, SetComparator, Table,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Clean, compare and enrich meter reading files", long_about = None)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOptions {
    /// Field delimiter of input and output files (a character, or tab/comma/semicolon)
    #[arg(long, global = true, env = "METER_TOOLKIT_DELIMITER", default_value = ";", value_parser = config::parse_delimiter)]
    delimiter: u8,

    /// Column always read as text, to keep leading zeros (repeatable)
    #[arg(long = "text-column", global = true, default_values_t = [SUBSCRIBER_REF_COLUMN.to_string()])]
    text_columns: Vec<String>,

    /// Meter identifier column
    #[arg(long, global = true, env = "METER_TOOLKIT_KEY_COLUMN", default_value = METER_COLUMN)]
    key_column: String,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Rows of the input shown before processing
    #[arg(long, global = true, default_value_t = 0)]
    preview: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep, for each meter, the most recent reading that has an index
    Dedupe {
        input: PathBuf,

        #[arg(short, long, default_value = CLEANED_FILE_NAME)]
        output: PathBuf,

        #[arg(long, env = "METER_TOOLKIT_DATE_COLUMN", default_value = DATE_COLUMN)]
        date_column: String,

        #[arg(long, env = "METER_TOOLKIT_INDEX_COLUMN", default_value = INDEX_COLUMN)]
        index_column: String,
    },

    /// List the meters of REFERENCE that do not appear in CANDIDATE
    Compare {
        reference: PathBuf,

        candidate: PathBuf,

        #[arg(short, long, default_value = MISSING_FILE_NAME)]
        output: PathBuf,
    },

    /// Add the diameter of each meter, looked up in a second file
    Enrich {
        input: PathBuf,

        lookup: PathBuf,

        #[arg(short, long, default_value = ENRICHED_FILE_NAME)]
        output: PathBuf,

        #[arg(long, env = "METER_TOOLKIT_LOOKUP_KEY_COLUMN", default_value = LOOKUP_METER_COLUMN)]
        lookup_key_column: String,

        #[arg(long, env = "METER_TOOLKIT_DIAMETER_COLUMN", default_value = DIAMETER_COLUMN)]
        diameter_column: String,

        /// Emit one row per matching lookup row instead of keeping the first match
        #[arg(long)]
        fan_out: bool,
    },
}

fn main() {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if let Err(e) = run(Cli::parse()) {
        eprintln!("❌ {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("   caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = &cli.options;
    let load_options = LoadOptions::default()
        .with_delimiter(options.delimiter)
        .with_text_columns(options.text_columns.clone());

    let (outcome, output) = match cli.command {
        Commands::Dedupe {
            input,
            output,
            date_column,
            index_column,
        } => {
            let table = load(&input, &load_options, options.preview)?;
            let engine = DeduplicationEngine::with_columns(DedupColumns {
                key: options.key_column.clone(),
                date: date_column,
                value: index_column,
            });
            let result = engine.dedupe(&table);
            (Outcome::from_result(Operation::Dedupe, table.len(), result), output)
        }

        Commands::Compare {
            reference,
            candidate,
            output,
        } => {
            let reference = load(&reference, &load_options, options.preview)?;
            let candidate = load(&candidate, &load_options, 0)?;
            let result = SetComparator::with_key_column(&options.key_column)
                .find_missing(&reference, &candidate);
            (Outcome::from_result(Operation::Compare, reference.len(), result), output)
        }

        Commands::Enrich {
            input,
            lookup,
            output,
            lookup_key_column,
            diameter_column,
            fan_out,
        } => {
            let primary = load(&input, &load_options, options.preview)?;
            let lookup = load(&lookup, &load_options, 0)?;
            let policy = if fan_out {
                JoinPolicy::FanOut
            } else {
                JoinPolicy::FirstMatch
            };
            let result = Enricher::with_columns(&options.key_column, &lookup_key_column, &diameter_column)
                .with_policy(policy)
                .enrich(&primary, &lookup);
            (Outcome::from_result(Operation::Enrich, primary.len(), result), output)
        }
    };

    report(&outcome, options.json)?;

    if let Some(e) = outcome.error() {
        bail!("{} cannot run: {}", outcome.summary.operation.name(), e);
    }

    if outcome.summary.operation == Operation::Compare && outcome.table.is_empty() {
        println!("✅ Every meter of the reference file is present in the second file");
        return Ok(());
    }

    save_table(&output, &outcome.table, options.delimiter)?;
    println!("📥 Saved {} rows to {}", outcome.table.len(), output.display());
    info!(path = %output.display(), "done");

    Ok(())
}

fn load(path: &Path, options: &LoadOptions, preview: usize) -> Result<Table> {
    let table = load_table(path, options)?;
    info!(path = %path.display(), rows = table.len(), "loaded");

    if preview > 0 {
        print_preview(&table.head(preview), options.delimiter);
    }
    Ok(table)
}

fn print_preview(table: &Table, delimiter: u8) {
    let sep = (delimiter as char).to_string();
    println!("{}", table.columns().join(&sep));
    for row in table.rows() {
        let fields: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        println!("{}", fields.join(&sep));
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

fn report(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
        return Ok(());
    }

    let summary = &outcome.summary;
    if summary.succeeded() {
        println!("📊 Rows in input:  {}", summary.rows_in);
        println!("📊 Rows in result: {}", summary.rows_out);
    }
    Ok(())
}
