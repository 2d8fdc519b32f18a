//! Entity CLI commands
//!
//! Every write goes through one unit of work and one audited commit.

use clap::{Args, Subcommand};

use crate::audit::{AuditStatus, CommitReport};
use crate::display::format_rows;
use crate::error::{AuditrailError, AuditrailResult};
use crate::models::{describe_key, ActorContext, Row};
use crate::storage::{parse_key, parse_value, Database};

/// Who is writing, and whether the write is audited
#[derive(Args, Debug, Clone, Default)]
pub struct AuditOptions {
    /// Actor identifier recorded on audit records
    #[arg(long, global = true, env = "AUDITRAIL_ACTOR")]
    pub actor: Option<String>,

    /// Method token recorded on audit records (overrides the command default)
    #[arg(long, global = true)]
    pub method: Option<String>,

    /// Commit without capturing an audit trail
    #[arg(long, global = true)]
    pub no_audit: bool,
}

impl AuditOptions {
    /// Actor context for a command whose conventional method is `default_method`
    pub fn context(&self, default_method: &str) -> Option<ActorContext> {
        if self.no_audit {
            return None;
        }
        Some(ActorContext {
            actor_id: self.actor.clone(),
            method: self
                .method
                .clone()
                .unwrap_or_else(|| default_method.to_string()),
        })
    }
}

/// Entity subcommands
#[derive(Subcommand, Debug)]
pub enum EntityCommands {
    /// Insert a new entity
    Add {
        /// Entity kind (e.g. Product)
        kind: String,
        /// Field assignment, repeatable
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
    /// Change fields of a stored entity
    Update {
        /// Entity kind
        kind: String,
        /// Key value, or FIELD=VALUE pairs for composite keys
        key: String,
        /// Field assignment, repeatable
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
    /// Delete a stored entity
    Delete {
        /// Entity kind
        kind: String,
        /// Key value, or FIELD=VALUE pairs for composite keys
        key: String,
        /// Set the kind's soft-delete flag instead of removing the row
        #[arg(long)]
        soft: bool,
    },
    /// List stored entities of a kind
    Show {
        /// Entity kind
        kind: String,
    },
}

fn parse_assignments(assignments: &[String]) -> AuditrailResult<Row> {
    let mut row = Row::new();
    for assignment in assignments {
        let (field, value) = assignment.split_once('=').ok_or_else(|| {
            AuditrailError::Validation(format!(
                "Invalid assignment '{}'. Use FIELD=VALUE",
                assignment
            ))
        })?;
        row.insert(field.trim().to_string(), parse_value(value));
    }
    Ok(row)
}

fn report_audit(report: &CommitReport) {
    match &report.audit {
        AuditStatus::Skipped => {}
        AuditStatus::Recorded { count } => println!("Audited {} change(s)", count),
        AuditStatus::Failed {
            error,
            records,
            outboxed,
        } => {
            eprintln!(
                "Warning: change saved but {} audit record(s) were not written: {}",
                records.len(),
                error
            );
            if *outboxed {
                eprintln!("Records were kept in the outbox. Run 'auditrail audit replay' to retry.");
            }
        }
    }
}

/// Handle an entity command
pub fn handle_entity_command(
    db: &Database,
    options: &AuditOptions,
    cmd: EntityCommands,
) -> AuditrailResult<()> {
    let pipeline = db.pipeline();

    match cmd {
        EntityCommands::Add { kind, set } => {
            let schema = db.schema(&kind)?;
            let mut uow = db.begin();
            let handle = uow.add(&kind, parse_assignments(&set)?)?;

            let report = pipeline.commit(&mut uow, options.context("POST").as_ref())?;

            let key = uow
                .get(handle)
                .map(|row| describe_key(&schema.key_of(row)))
                .unwrap_or_default();
            println!("Created {} {}", kind, key);
            report_audit(&report);
        }

        EntityCommands::Update { kind, key, set } => {
            if set.is_empty() {
                println!("No changes specified. Use --set FIELD=VALUE.");
                return Ok(());
            }

            let schema = db.schema(&kind)?;
            let key = parse_key(schema, &key)?;
            let mut uow = db.begin();
            let handle = uow
                .find(&kind, &key)?
                .ok_or_else(|| AuditrailError::not_found(&kind, describe_key(&key)))?;

            for (field, value) in parse_assignments(&set)? {
                uow.set(handle, &field, value)?;
            }

            let report = pipeline.commit(&mut uow, options.context("PUT").as_ref())?;
            println!("Updated {} {}", kind, describe_key(&key));
            report_audit(&report);
        }

        EntityCommands::Delete { kind, key, soft } => {
            let schema = db.schema(&kind)?;
            let key = parse_key(schema, &key)?;
            let mut uow = db.begin();
            let handle = uow
                .find(&kind, &key)?
                .ok_or_else(|| AuditrailError::not_found(&kind, describe_key(&key)))?;

            if soft {
                uow.soft_delete(handle)?;
            } else {
                uow.remove(handle)?;
            }

            let method = db.settings().soft_delete_method.clone();
            let report = pipeline.commit(&mut uow, options.context(&method).as_ref())?;
            println!("Deleted {} {}", kind, describe_key(&key));
            report_audit(&report);
        }

        EntityCommands::Show { kind } => {
            let schema = db.schema(&kind)?;
            let rows = db.rows(&kind)?;
            print!("{}", format_rows(schema, &rows));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignments() {
        let row = parse_assignments(&["name=Lamp".into(), "price=12.5".into()]).unwrap();
        assert_eq!(row["name"], json!("Lamp"));
        assert_eq!(row["price"], json!(12.5));

        assert!(parse_assignments(&["name".into()]).is_err());
    }

    #[test]
    fn test_assignment_value_may_contain_equals() {
        let row = parse_assignments(&["name=a=b".into()]).unwrap();
        assert_eq!(row["name"], json!("a=b"));
    }

    #[test]
    fn test_context() {
        let options = AuditOptions {
            actor: Some("ana".into()),
            ..Default::default()
        };
        let ctx = options.context("POST").unwrap();
        assert_eq!(ctx.actor_id.as_deref(), Some("ana"));
        assert_eq!(ctx.method, "POST");

        let options = AuditOptions {
            method: Some("PATCH".into()),
            ..Default::default()
        };
        assert_eq!(options.context("PUT").unwrap().method, "PATCH");

        let options = AuditOptions {
            no_audit: true,
            ..Default::default()
        };
        assert!(options.context("POST").is_none());
    }
}
