use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use vigil_domain::{RuleCategory, SafetyLevel, Violation};
use vigil_ports::ViolationStorePort;

/// SQLite-backed append-only violation store.
pub struct SqliteViolationStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteViolationStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::new(manager).context("failed to open violation database")?;
        let store = Self { pool };
        store.setup_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .context("failed to open in-memory violation database")?;
        let store = Self { pool };
        store.setup_schema()?;
        Ok(store)
    }

    fn setup_schema(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS violations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rule_name TEXT NOT NULL,
                parameter TEXT NOT NULL,
                current_value REAL NOT NULL,
                limit_value REAL NOT NULL,
                level TEXT NOT NULL,
                category TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                description TEXT NOT NULL,
                action_taken TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_violations_timestamp
                ON violations(timestamp_ms);",
        )?;
        Ok(())
    }
}

fn level_to_text(level: SafetyLevel) -> String {
    level.as_str().to_string()
}

fn level_from_text(raw: &str) -> Result<SafetyLevel> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("unknown safety level in store: {raw}"))
}

fn category_to_text(category: RuleCategory) -> Result<String> {
    match serde_json::to_value(category)? {
        serde_json::Value::String(s) => Ok(s),
        other => anyhow::bail!("unexpected category encoding: {other}"),
    }
}

fn category_from_text(raw: &str) -> Result<RuleCategory> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("unknown rule category in store: {raw}"))
}

#[async_trait]
impl ViolationStorePort for SqliteViolationStore {
    async fn record(&self, violation: &Violation) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO violations
                (rule_name, parameter, current_value, limit_value, level,
                 category, timestamp_ms, description, action_taken)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                violation.rule_name,
                violation.parameter,
                violation.current_value,
                violation.limit_value,
                level_to_text(violation.level),
                category_to_text(violation.category)?,
                violation.timestamp_ms,
                violation.description,
                violation.action_taken,
            ],
        )?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Violation>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT rule_name, parameter, current_value, limit_value, level,
                    category, timestamp_ms, description, action_taken
             FROM violations
             ORDER BY timestamp_ms DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, Option<String>>(8)?,
            ))
        })?;

        let mut violations = Vec::new();
        for row in rows {
            let (
                rule_name,
                parameter,
                current_value,
                limit_value,
                level,
                category,
                timestamp_ms,
                description,
                action_taken,
            ) = row?;
            violations.push(Violation {
                rule_name,
                parameter,
                current_value,
                limit_value,
                level: level_from_text(&level)?,
                category: category_from_text(&category)?,
                timestamp_ms,
                description,
                action_taken,
            });
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(rule: &str, timestamp_ms: i64) -> Violation {
        Violation {
            rule_name: rule.into(),
            parameter: "oil_pressure".into(),
            current_value: 12.0,
            limit_value: 15.0,
            level: SafetyLevel::Critical,
            category: RuleCategory::PressureLimit,
            timestamp_ms,
            description: "Oil pressure critically low: 12 < 15".into(),
            action_taken: Some("Engine shutdown protection activated".into()),
        }
    }

    #[tokio::test]
    async fn record_and_read_back() {
        let store = SqliteViolationStore::open_in_memory().unwrap();
        store.record(&violation("oil_pressure_critical", 100)).await.unwrap();
        store.record(&violation("engine_temp_critical", 200)).await.unwrap();

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].rule_name, "engine_temp_critical");
        assert_eq!(recent[1].level, SafetyLevel::Critical);
        assert_eq!(recent[1].category, RuleCategory::PressureLimit);
        assert_eq!(
            recent[1].action_taken.as_deref(),
            Some("Engine shutdown protection activated")
        );
    }

    #[tokio::test]
    async fn limit_windows_the_read() {
        let store = SqliteViolationStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.record(&violation("rule", i)).await.unwrap();
        }
        assert_eq!(store.recent(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("violations.db");
        {
            let store = SqliteViolationStore::open(&path).unwrap();
            store.record(&violation("persisted", 1)).await.unwrap();
        }
        let reopened = SqliteViolationStore::open(&path).unwrap();
        let recent = reopened.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].rule_name, "persisted");
    }
}
