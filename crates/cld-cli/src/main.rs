use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use cld_ingest::UploadError;
use cld_runtime::{upload_and_distribute, UploadArgs};

#[derive(Parser)]
#[command(name = "cld")]
#[command(about = "CallListDesk CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Agent registry commands
    Agents {
        #[command(subcommand)]
        cmd: AgentsCmd,
    },

    /// Upload a call list and distribute it across the active agents
    Upload {
        /// Path to the .csv / .xlsx / .xls file
        #[arg(long)]
        file: PathBuf,

        /// Actor id recorded on every distribution of this upload
        #[arg(long = "uploaded-by")]
        uploaded_by: Uuid,

        /// Optional upload id for idempotent retries
        #[arg(long = "upload-id")]
        upload_id: Option<Uuid>,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum AgentsCmd {
    /// Print the active agents in registration order (the upload snapshot
    /// takes the first five of these).
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent when the file
    // does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = cld_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = cld_db::status(&pool).await?;
                    println!("db_ok={} has_agents_table={}", s.ok, s.has_agents_table);
                }
                DbCmd::Migrate => {
                    cld_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::Agents { cmd } => match cmd {
            AgentsCmd::List => {
                let pool = cld_db::connect_from_env().await?;
                let agents = cld_db::list_active_agents(&pool, i64::MAX).await?;
                for a in &agents {
                    println!("{}\t{}\t{}\t{}", a.agent_id, a.name, a.email, a.mobile);
                }
                println!("active_agents={}", agents.len());
            }
        },

        Commands::Upload {
            file,
            uploaded_by,
            upload_id,
        } => {
            let pool = cld_db::connect_from_env().await?;

            let original_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("upload file has no usable name")?
                .to_string();

            // Spool a timestamped copy: the pipeline releases its input on
            // every exit path and must never delete the operator's file.
            let spooled = std::env::temp_dir().join(format!(
                "{}-{}",
                Utc::now().timestamp_millis(),
                original_name
            ));
            std::fs::copy(&file, &spooled)
                .with_context(|| format!("spool upload copy to {}", spooled.display()))?;

            let outcome = upload_and_distribute(
                &pool,
                UploadArgs {
                    path: spooled,
                    original_name,
                    uploaded_by,
                    upload_id,
                },
            )
            .await;

            match outcome {
                Ok(outcome) => {
                    println!("upload_id={}", outcome.upload_id);
                    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
                }
                Err(UploadError::Validation(errors)) => {
                    for e in &errors {
                        eprintln!("{e}");
                    }
                    anyhow::bail!("Data validation failed ({} error(s))", errors.len());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
