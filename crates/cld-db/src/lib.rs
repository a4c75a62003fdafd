use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

use cld_schemas::Agent;

pub mod distributions;

pub use distributions::{
    count_distributions_for_upload, fetch_distributions_for_agent, fetch_distributions_for_upload,
    persist_distributions, DistributionRow, PersistDistributionsArgs,
};

pub const ENV_DB_URL: &str = "CLD_DATABASE_URL";

/// Connect to Postgres using CLD_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='agents'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_agents_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_agents_table: bool,
}

#[derive(Debug, Clone)]
pub struct NewAgent {
    pub agent_id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Register an agent. Registration order is the `seq` column assigned here,
/// not the timestamp, so later snapshots are stable under timestamp ties.
pub async fn insert_agent(pool: &PgPool, agent: &NewAgent) -> Result<()> {
    sqlx::query(
        r#"
        insert into agents (agent_id, name, email, mobile, created_at_utc)
        values ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(agent.agent_id)
    .bind(&agent.name)
    .bind(&agent.email)
    .bind(&agent.mobile)
    .bind(agent.created_at_utc)
    .execute(pool)
    .await
    .context("insert_agent failed")?;

    Ok(())
}

/// Soft delete / reactivate. Agent rows are never deleted.
pub async fn set_agent_active(pool: &PgPool, agent_id: Uuid, active: bool) -> Result<()> {
    let res = sqlx::query(
        r#"
        update agents
        set is_active = $2
        where agent_id = $1
        "#,
    )
    .bind(agent_id)
    .bind(active)
    .execute(pool)
    .await
    .context("set_agent_active failed")?;

    if res.rows_affected() == 0 {
        anyhow::bail!("agent not found: {agent_id}");
    }
    Ok(())
}

/// Eligible-recipient snapshot: active agents in registration order, capped
/// at `limit`. Read once per upload and treated as stable for its duration.
pub async fn list_active_agents(pool: &PgPool, limit: i64) -> Result<Vec<Agent>> {
    let rows = sqlx::query(
        r#"
        select agent_id, name, email, mobile, is_active, created_at_utc
        from agents
        where is_active = true
        order by seq asc
        limit $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("list_active_agents query failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        out.push(Agent {
            agent_id: r.try_get("agent_id").context("agents.agent_id")?,
            name: r.try_get("name").context("agents.name")?,
            email: r.try_get("email").context("agents.email")?,
            mobile: r.try_get("mobile").context("agents.mobile")?,
            is_active: r.try_get("is_active").context("agents.is_active")?,
            created_at_utc: r.try_get("created_at_utc").context("agents.created_at_utc")?,
        });
    }
    Ok(out)
}
