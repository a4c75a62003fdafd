// crates/cld-runtime/src/lib.rs
//
// Request-scoped upload pipeline:
//   spool guard -> extension gate -> size gate -> decode -> validate
//     -> agent snapshot -> partition -> persist -> report
//
// Every stage failure is terminal for the upload; the spooled artifact is
// released on every exit path, including panic unwinds.

use std::path::{Path, PathBuf};

use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use cld_db::PersistDistributionsArgs;
use cld_ingest::{decode_rows, partition_records, validate_rows, FileFormat, UploadError};
use cld_schemas::{DistributionSummary, UploadReport};

/// Upload size limit, enforced on file metadata before decode is attempted.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Hard cap on simultaneous recipients for one upload. Larger pools are
/// truncated to the first five in registration order.
pub const MAX_AGENTS_PER_UPLOAD: i64 = 5;

#[derive(Debug, Clone)]
pub struct UploadArgs {
    /// Spooled copy of the uploaded file. Removed on every exit path; the
    /// caller must not pass a path it wants to keep.
    pub path: PathBuf,
    /// Filename as submitted by the operator; supplies the extension.
    pub original_name: String,
    /// Actor recorded on every distribution of this upload.
    pub uploaded_by: Uuid,
    /// Optional caller-provided id for idempotent retries.
    pub upload_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub upload_id: Uuid,
    pub report: UploadReport,
}

/// Removes the spooled upload when dropped, success and failure alike.
struct SpooledArtifact {
    path: PathBuf,
}

impl Drop for SpooledArtifact {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                error!(path = %self.path.display(), %err, "failed to release uploaded artifact");
            }
        }
    }
}

/// Extension after the last dot, lowercased. `None` when there is no dot or
/// nothing follows it.
pub fn extension_of(original_name: &str) -> Option<String> {
    let (_, ext) = original_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Size gate. Runs on metadata so an oversized file is refused unread.
pub fn check_size(size_bytes: u64) -> Result<(), UploadError> {
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size_bytes,
            limit_bytes: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Run one upload end to end and return the per-agent summary.
///
/// The active-agent set is read once, after validation, and treated as a
/// stable snapshot for the rest of the upload; concurrent registry changes
/// do not affect an in-flight distribution. Persistence is atomic: on any
/// write failure no distribution of this upload remains visible.
pub async fn upload_and_distribute(
    pool: &PgPool,
    args: UploadArgs,
) -> Result<UploadOutcome, UploadError> {
    let _artifact = SpooledArtifact {
        path: args.path.clone(),
    };

    let format = match extension_of(&args.original_name) {
        Some(ext) => FileFormat::from_extension(&ext)?,
        None => {
            return Err(UploadError::UnsupportedFormat {
                extension: String::new(),
            })
        }
    };

    let size_bytes = file_size(&args.path)?;
    check_size(size_bytes)?;

    let bytes = std::fs::read(&args.path)
        .map_err(|e| UploadError::Parse(anyhow::Error::new(e).context("read spooled upload")))?;

    let rows = decode_rows(&bytes, format)?;
    let records = validate_rows(&rows)?;
    let total_items = records.len();

    let agents = cld_db::list_active_agents(pool, MAX_AGENTS_PER_UPLOAD)
        .await
        .map_err(UploadError::Persistence)?;
    if agents.is_empty() {
        return Err(UploadError::NoEligibleAgents);
    }

    let upload_id = args.upload_id.unwrap_or_else(Uuid::new_v4);
    let groups = partition_records(records, &agents);

    let persisted = cld_db::persist_distributions(
        pool,
        &PersistDistributionsArgs {
            upload_id,
            uploaded_by: args.uploaded_by,
        },
        &groups,
    )
    .await
    .map_err(|e| {
        error!(%upload_id, err = %format!("{e:#}"), "distribution persistence failed");
        UploadError::Persistence(e)
    })?;

    let report = UploadReport {
        total_items,
        agents_count: agents.len(),
        distributions: persisted
            .iter()
            .map(|d| DistributionSummary {
                agent_id: d.agent_id,
                items_count: d.items.len(),
            })
            .collect(),
    };

    info!(
        %upload_id,
        total_items,
        agents_count = report.agents_count,
        "upload distributed"
    );

    Ok(UploadOutcome { upload_id, report })
}

fn file_size(path: &Path) -> Result<u64, UploadError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| UploadError::Parse(anyhow::Error::new(e).context("stat spooled upload")))
}
