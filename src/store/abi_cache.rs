//! Persistent cache for fetched interface descriptions

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;

/// A description previously returned by a lookup
#[derive(Debug, Clone)]
pub struct CachedAbi {
    pub network: String,
    pub address: String,
    pub abi_json: String,
    /// Unix seconds
    pub fetched_at: i64,
}

/// SQLite-backed ABI cache keyed by (network, address)
#[derive(Debug)]
pub struct AbiCache {
    conn: Connection,
}

impl AbiCache {
    /// Open or create the cache database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        let cache = Self { conn };
        cache.init()?;
        Ok(cache)
    }

    /// In-memory cache, used when no data directory is available
    pub fn open_in_memory() -> Result<Self> {
        let cache = Self {
            conn: Connection::open_in_memory().context("open in-memory db")?,
        };
        cache.init()?;
        Ok(cache)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS abis (
                network     TEXT NOT NULL,
                address     TEXT NOT NULL,
                abi_json    TEXT NOT NULL,
                fetched_at  INTEGER DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (network, address)
            );

            CREATE INDEX IF NOT EXISTS idx_abis_fetched ON abis(fetched_at);
            ",
        )?;
        Ok(())
    }

    /// Store a description, replacing any previous one for the pair
    pub fn save_abi(&self, network: &str, address: &str, abi_json: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO abis(network, address, abi_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(network, address) DO UPDATE SET
                abi_json=excluded.abi_json,
                fetched_at=strftime('%s', 'now')",
            params![network.to_lowercase(), address.to_lowercase(), abi_json],
        )?;
        Ok(())
    }

    pub fn get_abi(&self, network: &str, address: &str) -> Result<Option<CachedAbi>> {
        let mut stmt = self.conn.prepare(
            "SELECT network, address, abi_json, fetched_at FROM abis
             WHERE network = ?1 AND address = ?2",
        )?;

        let mut rows = stmt.query(params![network.to_lowercase(), address.to_lowercase()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(CachedAbi {
                network: row.get(0)?,
                address: row.get(1)?,
                abi_json: row.get(2)?,
                fetched_at: row.get(3)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM abis", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Drop entries older than `max_age_days`
    pub fn cleanup_old_entries(&self, max_age_days: u32) -> Result<usize> {
        let cutoff = max_age_days as i64 * 24 * 60 * 60;
        let deleted = self.conn.execute(
            "DELETE FROM abis WHERE fetched_at < (strftime('%s', 'now') - ?1)",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}
