use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use auditrail::cli::{handle_audit_command, handle_entity_command, AuditCommands, AuditOptions, EntityCommands};
use auditrail::config::{AuditrailPaths, Settings};
use auditrail::storage::{initialize_storage, Database};

/// Environment variable holding the log filter
const LOG_ENV: &str = "AUDITRAIL_LOG";

#[derive(Parser)]
#[command(
    name = "auditrail",
    author = "Kaylee Beyene",
    version,
    about = "Entity store with an automatic audit trail",
    long_about = "auditrail stores entities in a local JSON database and records every \
                  create, update and delete in an append-only audit log, including \
                  store-generated keys and the actor responsible."
)]
struct Cli {
    #[command(flatten)]
    audit: AuditOptions,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Entity(EntityCommands),

    /// Audit log commands
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Initialize a new database
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let paths = AuditrailPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing auditrail at: {}", paths.base_dir().display());
            initialize_storage(&paths, &settings)?;
            println!("Initialization complete!");
            println!();
            println!("Registered entity kinds:");
            for schema in &settings.entities {
                println!("  - {}", schema.kind);
            }
            println!();
            println!("Run 'auditrail show Category' to see the seeded categories.");
        }
        Some(Commands::Config) => {
            println!("auditrail Configuration");
            println!("=======================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Tables file:     {}", paths.tables_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!("Audit outbox:    {}", paths.audit_outbox().display());
            println!();
            println!("Settings:");
            println!("  Soft delete method: {}", settings.soft_delete_method);
            println!("  Audit entity kind:  {}", settings.audit_entity_kind);
            println!("  Outbox enabled:     {}", settings.outbox_enabled);
        }
        Some(Commands::Entity(cmd)) => {
            let db = Database::open(paths, settings)?;
            handle_entity_command(&db, &cli.audit, cmd)?;
        }
        Some(Commands::Audit(cmd)) => {
            let db = Database::open(paths, settings)?;
            handle_audit_command(&db, cmd)?;
        }
        None => {
            println!("auditrail - entity store with an automatic audit trail");
            println!();
            println!("Run 'auditrail --help' for usage information.");
            println!("Run 'auditrail init' to create a new database.");
        }
    }

    Ok(())
}
