// Validation failure rejects the whole batch: the complete error list comes
// back, the spooled file is still released, and nothing is persisted.
//
// DB-backed test, skipped if CLD_DATABASE_URL is not set.

use anyhow::Result;
use uuid::Uuid;

use cld_ingest::UploadError;
use cld_runtime::{upload_and_distribute, UploadArgs};

#[tokio::test]
async fn bad_rows_return_full_error_list_and_persist_nothing() -> Result<()> {
    let pool = match cld_testkit::connect_migrated_pool_from_env().await? {
        Some(pool) => pool,
        None => {
            eprintln!("SKIP: CLD_DATABASE_URL not set");
            return Ok(());
        }
    };

    cld_testkit::reset_agents(&pool).await?;
    cld_testkit::seed_agents(&pool, 2, "validation").await?;

    // Row 2 has no phone, row 4 has a non-phone value. Rows 1 and 3 are fine
    // but must not be accepted on their own.
    let csv = "\
FirstName,Phone,Notes
Ana,555-0100,
Ben,,
Cam,555-0102,
Dee,abc,
";

    let dir = tempfile::tempdir()?;
    let path = cld_testkit::write_csv(dir.path(), "leads.csv", csv)?;

    let upload_id = Uuid::new_v4();
    let err = upload_and_distribute(
        &pool,
        UploadArgs {
            path: path.clone(),
            original_name: "leads.csv".to_string(),
            uploaded_by: Uuid::new_v4(),
            upload_id: Some(upload_id),
        },
    )
    .await
    .unwrap_err();

    assert!(!path.exists(), "spooled upload was not released");

    let messages: Vec<String> = match &err {
        UploadError::Validation(errors) => errors.iter().map(|e| e.to_string()).collect(),
        other => panic!("expected Validation, got {other:?}"),
    };
    assert_eq!(
        messages,
        vec!["Row 2: Phone is required", "Row 4: Invalid phone number format"]
    );

    assert_eq!(
        cld_db::count_distributions_for_upload(&pool, upload_id).await?,
        0
    );

    Ok(())
}
