//! Audit log CLI commands

use clap::{Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::audit::{AuditRecord, AuditSink};
use crate::display::{format_audit_details, format_audit_table};
use crate::error::AuditrailResult;
use crate::export::{export_audit_csv, export_audit_json, export_audit_yaml};
use crate::storage::Database;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
    Csv,
}

/// Audit subcommands
#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// Show audit records
    Log {
        /// Only the most recent N records
        #[arg(short, long)]
        recent: Option<usize>,
        /// Only records of this entity kind
        #[arg(short, long)]
        kind: Option<String>,
        /// Show value changes for each record
        #[arg(short, long)]
        verbose: bool,
    },
    /// Export audit records
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Deliver records kept in the outbox after failed audit writes
    Replay,
}

fn select_records(
    db: &Database,
    recent: Option<usize>,
    kind: Option<&str>,
) -> AuditrailResult<Vec<AuditRecord>> {
    let Some(kind) = kind else {
        return match recent {
            Some(count) => db.audit_log().read_recent(count),
            None => db.audit_log().read_all(),
        };
    };

    let mut records = db.audit_log().read_all()?;
    records.retain(|r| r.entity_kind() == kind);
    if let Some(count) = recent {
        let skip = records.len().saturating_sub(count);
        records.drain(..skip);
    }

    Ok(records)
}

fn write_export<W: Write>(records: &[AuditRecord], format: ExportFormat, writer: &mut W) -> AuditrailResult<()> {
    match format {
        ExportFormat::Json => export_audit_json(records, writer),
        ExportFormat::Yaml => export_audit_yaml(records, writer),
        ExportFormat::Csv => export_audit_csv(records, writer),
    }
}

/// Handle an audit command
pub fn handle_audit_command(db: &Database, cmd: AuditCommands) -> AuditrailResult<()> {
    match cmd {
        AuditCommands::Log {
            recent,
            kind,
            verbose,
        } => {
            let records = select_records(db, recent, kind.as_deref())?;
            if verbose {
                print!("{}", format_audit_details(&records));
            } else {
                print!("{}", format_audit_table(&records));
            }
        }

        AuditCommands::Export { format, output } => {
            let records = db.audit_log().read_all()?;

            match output {
                Some(path) => {
                    let file = File::create(&path)?;
                    let mut writer = BufWriter::new(file);
                    write_export(&records, format, &mut writer)?;
                    writer.flush()?;
                    println!("Exported {} audit record(s) to {}", records.len(), path.display());
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    write_export(&records, format, &mut handle)?;
                }
            }
        }

        AuditCommands::Replay => {
            let outbox = db.audit_outbox();
            let mut uow = db.begin();
            let delivered = AuditSink::new(&mut uow).replay_outbox(&outbox)?;

            if delivered == 0 {
                println!("Outbox is empty.");
            } else {
                println!("Replayed {} audit record(s) from the outbox.", delivered);
            }
        }
    }

    Ok(())
}
