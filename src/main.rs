use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{CombinedLogger, Config, TermLogger, TerminalMode};

use cert_registry::{read_config, CertAuthRegistryClient, SchemaRecord};

/// Lists registry subjects and prints the latest schema of each.
#[derive(Parser, Debug)]
#[command(name = "cert-registry", version)]
struct Args {
    /// JSON config file with the registry URL and TLS credentials.
    #[arg(short, long)]
    config: PathBuf,

    /// Only look at these subjects instead of listing the registry.
    #[arg(short, long)]
    subject: Vec<String>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn render_schema(schema: &str) -> String {
    serde_json::from_str::<serde_json::Value>(schema)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| schema.to_string())
}

fn write_record<W: Write>(out: &mut W, record: &SchemaRecord) -> io::Result<()> {
    writeln!(out, "Subject: {}", record.subject)?;
    writeln!(out, "Schema ID: {}", record.id)?;
    writeln!(out, "Schema Version: {}", record.version)?;
    writeln!(out, "Schema: {}", render_schema(&record.schema))
}

/// Returns how many subjects failed.
fn report_subjects<O: Write, E: Write>(
    client: &CertAuthRegistryClient,
    subjects: &[String],
    out: &mut O,
    err: &mut E,
) -> io::Result<usize> {
    if subjects.is_empty() {
        writeln!(out, "no subjects")?;
        return Ok(0);
    }

    let mut failures = 0;

    for subject in subjects {
        match client.get_latest_schema(subject) {
            Ok(record) => write_record(out, &record)?,
            Err(e) => {
                failures += 1;
                warn!("skipping subject {}", subject);
                writeln!(err, "Error fetching schema for {}: {}", subject, e)?;
            }
        }
    }

    info!("processed {} subjects, {} failed", subjects.len(), failures);

    Ok(failures)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| format!("unknown log level \"{}\"", args.log_level))?;

    CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
    )])?;

    let config = read_config(&args.config)
        .map_err(|e| format!("error reading config file: {}", e))?;

    let client = CertAuthRegistryClient::new(config)?;

    let subjects = if args.subject.is_empty() {
        client.list_subjects()?
    } else {
        args.subject
    };

    report_subjects(
        &client,
        &subjects,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;

    Ok(())
}
