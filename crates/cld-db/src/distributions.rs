// crates/cld-db/src/distributions.rs
//
// Distribution persistence: one row per (upload, agent), written inside a
// single transaction. Either every group of an upload commits or none do;
// partially-written rows are never visible to readers.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use cld_schemas::{AgentGroup, CallRecord};

#[derive(Debug, Clone)]
pub struct PersistDistributionsArgs {
    pub upload_id: Uuid,
    pub uploaded_by: Uuid,
}

/// A persisted distribution, as stored and as read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRow {
    pub distribution_id: Uuid,
    pub upload_id: Uuid,
    pub group_index: i32,
    pub agent_id: Uuid,
    pub items: Vec<CallRecord>,
    pub uploaded_by: Uuid,
    pub created_at_utc: DateTime<Utc>,
}

/// Write one distribution per group, in group order, atomically.
///
/// Any insert failure rolls the whole batch back before the error surfaces.
/// If the rollback itself fails the error says so explicitly: that is the
/// one state that can leave partial rows behind, and it requires manual
/// reconciliation rather than silent acceptance.
pub async fn persist_distributions(
    pool: &PgPool,
    args: &PersistDistributionsArgs,
    groups: &[AgentGroup],
) -> Result<Vec<DistributionRow>> {
    let mut tx = pool.begin().await.context("begin distribution tx")?;

    let created_at_utc = Utc::now();
    let mut out = Vec::with_capacity(groups.len());

    for (group_index, group) in groups.iter().enumerate() {
        let group_index = group_index as i32;
        let distribution_id = Uuid::new_v4();

        let items = serde_json::to_value(&group.records)
            .context("serialize distribution items failed")?;

        let res = sqlx::query(
            r#"
            insert into distributions (
              distribution_id, upload_id, group_index, agent_id,
              items, items_count, uploaded_by, created_at_utc
            ) values ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(distribution_id)
        .bind(args.upload_id)
        .bind(group_index)
        .bind(group.agent.agent_id)
        .bind(&items)
        .bind(group.records.len() as i32)
        .bind(args.uploaded_by)
        .bind(created_at_utc)
        .execute(&mut *tx)
        .await;

        if let Err(err) = res {
            let insert_err = anyhow::Error::new(err).context(format!(
                "insert distribution failed (upload_id={}, group_index={})",
                args.upload_id, group_index
            ));
            return match tx.rollback().await {
                Ok(()) => Err(insert_err),
                Err(rb) => Err(insert_err.context(format!(
                    "rollback also failed ({rb}); distributions for upload_id={} may be \
                     partially visible and need manual reconciliation",
                    args.upload_id
                ))),
            };
        }

        out.push(DistributionRow {
            distribution_id,
            upload_id: args.upload_id,
            group_index,
            agent_id: group.agent.agent_id,
            items: group.records.clone(),
            uploaded_by: args.uploaded_by,
            created_at_utc,
        });
    }

    tx.commit().await.context("commit distribution tx")?;

    Ok(out)
}

/// All distributions of one upload, in the partitioner's group order.
pub async fn fetch_distributions_for_upload(
    pool: &PgPool,
    upload_id: Uuid,
) -> Result<Vec<DistributionRow>> {
    let rows = sqlx::query(
        r#"
        select distribution_id, upload_id, group_index, agent_id,
               items, uploaded_by, created_at_utc
        from distributions
        where upload_id = $1
        order by group_index asc
        "#,
    )
    .bind(upload_id)
    .fetch_all(pool)
    .await
    .context("fetch_distributions_for_upload query failed")?;

    rows.into_iter().map(row_to_distribution).collect()
}

/// One agent's work queues, most recent upload first.
pub async fn fetch_distributions_for_agent(
    pool: &PgPool,
    agent_id: Uuid,
) -> Result<Vec<DistributionRow>> {
    let rows = sqlx::query(
        r#"
        select distribution_id, upload_id, group_index, agent_id,
               items, uploaded_by, created_at_utc
        from distributions
        where agent_id = $1
        order by created_at_utc desc, group_index asc
        "#,
    )
    .bind(agent_id)
    .fetch_all(pool)
    .await
    .context("fetch_distributions_for_agent query failed")?;

    rows.into_iter().map(row_to_distribution).collect()
}

pub async fn count_distributions_for_upload(pool: &PgPool, upload_id: Uuid) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as::<_, (i64,)>(
        r#"
        select count(*)::bigint
        from distributions
        where upload_id = $1
        "#,
    )
    .bind(upload_id)
    .fetch_one(pool)
    .await
    .context("count_distributions_for_upload failed")?;

    Ok(n)
}

fn row_to_distribution(row: sqlx::postgres::PgRow) -> Result<DistributionRow> {
    let items_json: serde_json::Value =
        row.try_get("items").context("distributions.items")?;
    let items: Vec<CallRecord> = serde_json::from_value(items_json)
        .map_err(|e| anyhow!("distributions.items is not a call-record array: {e}"))?;

    Ok(DistributionRow {
        distribution_id: row
            .try_get("distribution_id")
            .context("distributions.distribution_id")?,
        upload_id: row.try_get("upload_id").context("distributions.upload_id")?,
        group_index: row
            .try_get("group_index")
            .context("distributions.group_index")?,
        agent_id: row.try_get("agent_id").context("distributions.agent_id")?,
        items,
        uploaded_by: row
            .try_get("uploaded_by")
            .context("distributions.uploaded_by")?,
        created_at_utc: row
            .try_get("created_at_utc")
            .context("distributions.created_at_utc")?,
    })
}
