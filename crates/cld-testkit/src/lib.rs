use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use cld_schemas::Agent;

/// DB-backed tests call this first and return early on `None`, printing a
/// SKIP line, so the suite passes on machines without a database.
pub async fn connect_migrated_pool_from_env() -> Result<Option<PgPool>> {
    let url = match std::env::var(cld_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("connect test pool")?;

    cld_db::migrate(&pool).await?;
    Ok(Some(pool))
}

/// Deactivate every agent so a scenario starts from a known-empty registry.
/// Rows are kept; distributions referencing them stay valid.
pub async fn reset_agents(pool: &PgPool) -> Result<()> {
    sqlx::query("update agents set is_active = false")
        .execute(pool)
        .await
        .context("reset_agents failed")?;
    Ok(())
}

/// Register `n` fresh active agents and return them in registration order.
/// Emails are salted with a uuid so scenarios can share one database.
pub async fn seed_agents(pool: &PgPool, n: usize, label: &str) -> Result<Vec<Agent>> {
    let salt = Uuid::new_v4().simple().to_string();
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        let agent = Agent {
            agent_id: Uuid::new_v4(),
            name: format!("{label} {i}"),
            email: format!("{label}-{i}-{salt}@example.com"),
            mobile: format!("+1 555 01{i:02}"),
            is_active: true,
            created_at_utc: Utc::now(),
        };

        cld_db::insert_agent(
            pool,
            &cld_db::NewAgent {
                agent_id: agent.agent_id,
                name: agent.name.clone(),
                email: agent.email.clone(),
                mobile: agent.mobile.clone(),
                created_at_utc: agent.created_at_utc,
            },
        )
        .await?;

        out.push(agent);
    }

    Ok(out)
}

/// Write a CSV fixture under `dir` and return its path.
pub fn write_csv(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("write fixture {}", path.display()))?;
    Ok(path)
}

/// A well-formed call list with `n` rows.
pub fn sample_csv(n: usize) -> String {
    let mut csv = String::from("FirstName,Phone,Notes\n");
    for i in 0..n {
        csv.push_str(&format!("Lead {i},555-01{i:02},note {i}\n"));
    }
    csv
}
