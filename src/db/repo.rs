use super::model::SessionEntry;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::SqlitePool;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized)
        .await
        .with_context(|| format!("failed to open session database {}", normalized))?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/`, make sure the
/// parent directory exists and ask SQLite to create the file. In-memory URLs
/// pass through untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    match query_part {
        Some(q) if q.contains("mode=") => {
            rebuilt.push('?');
            rebuilt.push_str(q);
        }
        Some(q) => {
            rebuilt.push('?');
            rebuilt.push_str(q);
            rebuilt.push_str("&mode=rwc");
        }
        None => rebuilt.push_str("?mode=rwc"),
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn get_session_value(pool: &Pool, session_id: &str, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>(
        "SELECT value FROM session_storage WHERE session_id = ? AND key = ?",
    )
    .bind(session_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(value)
}

#[instrument(skip_all)]
pub async fn set_session_value(pool: &Pool, session_id: &str, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO session_storage (session_id, key, value, updated_at) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(session_id)
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn delete_session_value(pool: &Pool, session_id: &str, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM session_storage WHERE session_id = ? AND key = ?")
        .bind(session_id)
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop every key of a session, as when its tab closes. Returns the number of keys removed.
#[instrument(skip_all)]
pub async fn clear_session(pool: &Pool, session_id: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM session_storage WHERE session_id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_session_entries(pool: &Pool, session_id: &str) -> Result<Vec<SessionEntry>> {
    let rows = sqlx::query(
        "SELECT session_id, key, value, updated_at FROM session_storage WHERE session_id = ? ORDER BY key",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(SessionEntry {
            session_id: row.get("session_id"),
            key: row.get("key"),
            value: row.get("value"),
            updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
        });
    }
    Ok(out)
}
