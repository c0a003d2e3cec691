use crate::models::AccountRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use duckdb::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS account (
    id                  BIGINT  PRIMARY KEY,
    summoner_username   VARCHAR NOT NULL DEFAULT '',
    region              VARCHAR NOT NULL DEFAULT '',
    username            VARCHAR NOT NULL DEFAULT '',
    password            VARCHAR NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL
);
"#;

const ACCOUNT_COLUMNS: &str = "id, summoner_username, region, username, password";

// ── Repository ────────────────────────────────────────────────────────────────

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB at {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn run_migrations(&self) -> Result<()> {
        info!("Running migrations…");
        self.conn.execute_batch(DDL).context("DDL failed")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, ?)",
            params![Utc::now().naive_utc()],
        )?;
        info!("Migrations done.");
        Ok(())
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    /// Insert or overwrite the five stored columns for `record.id`.
    pub fn save_account(&self, record: &AccountRecord) -> Result<()> {
        self.conn
            .execute(
                r#"INSERT INTO account (id, summoner_username, region, username, password)
                   VALUES (?, ?, ?, ?, ?)
                   ON CONFLICT (id) DO UPDATE SET
                       summoner_username = excluded.summoner_username,
                       region            = excluded.region,
                       username          = excluded.username,
                       password          = excluded.password"#,
                params![
                    record.id,
                    record.display_name,
                    record.region,
                    record.login_username,
                    record.login_secret,
                ],
            )
            .with_context(|| format!("save account {}", record.id))?;
        debug!("Saved account {}", record.id);
        Ok(())
    }

    pub fn load_account(&self, id: i64) -> Result<Option<AccountRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM account WHERE id = ?", ACCOUNT_COLUMNS))?;
        match stmt.query_row(params![id], account_from_row) {
            Ok(record) => Ok(Some(record)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("load account {}", id)),
        }
    }

    pub fn load_all_accounts(&self) -> Result<Vec<AccountRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM account ORDER BY id", ACCOUNT_COLUMNS))?;
        let records = stmt
            .query_map([], account_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("load accounts")?;
        Ok(records)
    }

    /// Returns whether a row was removed.
    pub fn delete_account(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM account WHERE id = ?", params![id])
            .with_context(|| format!("delete account {}", id))?;
        Ok(n > 0)
    }

    pub fn account_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM account")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }
}

fn account_from_row(r: &Row<'_>) -> duckdb::Result<AccountRecord> {
    Ok(AccountRecord::new(
        r.get::<_, i64>(0)?,
        r.get::<_, String>(1)?,
        r.get::<_, String>(2)?,
        r.get::<_, String>(3)?,
        r.get::<_, String>(4)?,
    ))
}
