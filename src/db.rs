use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::info;

const SCHEMA: &str = include_str!("../migrations/schema.sql");

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

fn statements(script: &str) -> impl Iterator<Item = &str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.lines().all(|l| l.trim_start().starts_with("--")))
}

/// Creates any missing tables. Every statement in the schema is idempotent.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    let mut count = 0;
    for statement in statements(SCHEMA) {
        sqlx::query(statement).execute(pool).await?;
        count += 1;
    }
    info!(statements = count, "Database schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_create_statements() {
        let all: Vec<&str> = statements(SCHEMA).collect();
        assert!(!all.is_empty());
        assert!(
            all.iter()
                .all(|s| s.contains("CREATE TABLE IF NOT EXISTS"))
        );
    }

    #[test]
    fn comment_only_chunks_are_skipped() {
        let script = "-- header\n;\nCREATE TABLE IF NOT EXISTS a (id INT);\n  ";
        let all: Vec<&str> = statements(script).collect();
        assert_eq!(all, vec!["CREATE TABLE IF NOT EXISTS a (id INT)"]);
    }
}
