// SQLite persistence layer for presets, the entry registry, and the
// category expansion cache.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::entries::{Entry, EntryType};
use crate::presets::PresetSummary;

/// SQLite-backed persistence for the three keyed tables: Presets,
/// PresetEntries (the entry registry), and CategoryCache.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS Presets (
                preset_name TEXT PRIMARY KEY,
                entries     TEXT NOT NULL DEFAULT '[]',
                description TEXT
            );

            CREATE TABLE IF NOT EXISTS PresetEntries (
                entry_name TEXT PRIMARY KEY,
                entry_type TEXT NOT NULL CHECK (entry_type IN ('category', 'article'))
            );

            CREATE TABLE IF NOT EXISTS CategoryCache (
                category_name TEXT PRIMARY KEY,
                pages         TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Entry registry
    // ------------------------------------------------------------------

    /// Look up the registered type for a single entry name.
    pub fn entry_type(&self, name: &str) -> Result<Option<EntryType>> {
        let conn = self.conn();
        let text: Option<String> = conn
            .query_row(
                "SELECT entry_type FROM PresetEntries WHERE entry_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query entry registry")?;

        match text {
            Some(t) => {
                let entry_type = EntryType::parse(&t).with_context(|| {
                    format!("registry row `{name}` has unknown entry_type `{t}`")
                })?;
                Ok(Some(entry_type))
            }
            None => Ok(None),
        }
    }

    /// Names from `names` that are not yet in the registry, in input order.
    pub fn unknown_entries(&self, names: &[String]) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT 1 FROM PresetEntries WHERE entry_name = ?1")
            .context("failed to prepare registry lookup")?;

        let mut unknown = Vec::new();
        for name in names {
            let known: Option<i64> = stmt
                .query_row(params![name], |row| row.get(0))
                .optional()
                .context("failed to query entry registry")?;
            if known.is_none() {
                unknown.push(name.clone());
            }
        }
        Ok(unknown)
    }

    /// INSERT OR IGNORE a batch of validated entries in one transaction.
    /// Re-registering a known name is a no-op, so the registry stays
    /// append-only in practice.
    pub fn insert_entries(&self, entries: &[(String, EntryType)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        insert_entry_rows(&tx, entries)?;
        tx.commit().context("failed to commit entry batch")
    }

    // ------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------

    pub fn preset_exists(&self, name: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM Presets WHERE preset_name = ?1)",
                params![name],
                |row| row.get(0),
            )
            .context("failed to check preset existence")?;
        Ok(exists)
    }

    /// The stored entry-name set for a preset, or `None` if no row exists.
    /// An existing preset with an empty set returns `Some(vec![])`.
    pub fn preset_entries(&self, name: &str) -> Result<Option<Vec<String>>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT entries FROM Presets WHERE preset_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query preset entries")?;

        match json {
            Some(j) => {
                let names: Vec<String> = serde_json::from_str(&j)
                    .with_context(|| format!("corrupt entries column for preset `{name}`"))?;
                Ok(Some(names))
            }
            None => Ok(None),
        }
    }

    /// Insert the preset row and any newly validated registry rows in one
    /// transaction, so a failure leaves neither behind.
    pub fn create_preset(
        &self,
        name: &str,
        description: Option<&str>,
        entry_names: &[String],
        new_entries: &[(String, EntryType)],
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        insert_entry_rows(&tx, new_entries)?;
        let json = serde_json::to_string(entry_names).context("failed to serialize entry set")?;
        tx.execute(
            "INSERT INTO Presets (preset_name, entries, description) VALUES (?1, ?2, ?3)",
            params![name, json, description],
        )
        .context("failed to insert preset")?;

        tx.commit().context("failed to commit preset creation")
    }

    /// Replace a preset's entry set, recording any new registry rows in the
    /// same transaction. Returns `false` if no preset row matched (the row
    /// vanished between the caller's existence check and this write).
    pub fn set_preset_entries(
        &self,
        name: &str,
        entry_names: &[String],
        new_entries: &[(String, EntryType)],
    ) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        insert_entry_rows(&tx, new_entries)?;
        let json = serde_json::to_string(entry_names).context("failed to serialize entry set")?;
        let rows = tx
            .execute(
                "UPDATE Presets SET entries = ?2 WHERE preset_name = ?1",
                params![name, json],
            )
            .context("failed to update preset entries")?;

        tx.commit().context("failed to commit preset update")?;
        Ok(rows == 1)
    }

    /// Delete a preset row. Returns `false` if no row matched.
    pub fn delete_preset(&self, name: &str) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute("DELETE FROM Presets WHERE preset_name = ?1", params![name])
            .context("failed to delete preset")?;
        Ok(rows == 1)
    }

    /// All presets with their descriptions, sorted by name for display.
    pub fn list_presets(&self) -> Result<Vec<PresetSummary>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT preset_name, description FROM Presets ORDER BY preset_name")
            .context("failed to prepare preset listing")?;

        let presets = stmt
            .query_map([], |row| {
                Ok(PresetSummary {
                    name: row.get(0)?,
                    description: row.get(1)?,
                })
            })
            .context("failed to query presets")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map preset rows")?;

        Ok(presets)
    }

    /// Join a preset's entry names against the registry, sorted by name for
    /// display. Returns an empty vec for an unknown preset; callers that
    /// need to tell "unknown" from "empty" use `preset_exists`.
    pub fn preset_contents(&self, name: &str) -> Result<Vec<Entry>> {
        let Some(mut names) = self.preset_entries(name)? else {
            return Ok(Vec::new());
        };
        names.sort();

        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT entry_type FROM PresetEntries WHERE entry_name = ?1")
            .context("failed to prepare registry join")?;

        let mut entries = Vec::with_capacity(names.len());
        for entry_name in names {
            let text: String = stmt
                .query_row(params![&entry_name], |row| row.get(0))
                .with_context(|| {
                    format!(
                        "entry `{entry_name}` referenced by preset `{name}` is missing from the registry"
                    )
                })?;
            let entry_type = EntryType::parse(&text).with_context(|| {
                format!("registry row `{entry_name}` has unknown entry_type `{text}`")
            })?;
            entries.push(Entry {
                name: entry_name,
                entry_type,
            });
        }

        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Category cache
    // ------------------------------------------------------------------

    /// The cached expansion for a category, or `None` on a miss.
    pub fn cached_category(&self, category: &str) -> Result<Option<Vec<String>>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT pages FROM CategoryCache WHERE category_name = ?1",
                params![category],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query category cache")?;

        match json {
            Some(j) => {
                let pages: Vec<String> = serde_json::from_str(&j)
                    .with_context(|| format!("corrupt cache row for category `{category}`"))?;
                Ok(Some(pages))
            }
            None => Ok(None),
        }
    }

    /// Write-once cache insert: an existing expansion stays ground truth
    /// (INSERT OR IGNORE), so a key is never refreshed implicitly.
    pub fn cache_category(&self, category: &str, pages: &[String]) -> Result<()> {
        let conn = self.conn();
        let json = serde_json::to_string(pages).context("failed to serialize page list")?;
        conn.execute(
            "INSERT OR IGNORE INTO CategoryCache (category_name, pages) VALUES (?1, ?2)",
            params![category, json],
        )
        .context("failed to cache category expansion")?;
        Ok(())
    }

    /// Forced refresh: overwrite any existing expansion for the key.
    pub fn replace_cached_category(&self, category: &str, pages: &[String]) -> Result<()> {
        let conn = self.conn();
        let json = serde_json::to_string(pages).context("failed to serialize page list")?;
        conn.execute(
            "INSERT OR REPLACE INTO CategoryCache (category_name, pages) VALUES (?1, ?2)",
            params![category, json],
        )
        .context("failed to replace cached category expansion")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Demo data
    // ------------------------------------------------------------------

    /// Load the demo registry entries and presets. Idempotent: every
    /// statement is INSERT OR IGNORE, so existing rows are left alone.
    pub fn seed_demo_data(&self) -> Result<()> {
        const DEMO_CATEGORIES: &[&str] = &[
            "The Game Awards winners",
            "Indie games",
            "Digital deck-building card games",
            "Bullet hell video games",
            "Platform fighters",
        ];
        const DEMO_PRESETS: &[(&str, &[&str], &str)] = &[
            (
                "GameAwardsWinners",
                &["The Game Awards winners"],
                "Games that have won The Game Awards in the past.",
            ),
            ("IndieDarlings", &["Indie games"], "All indie games."),
            (
                "Potpourri",
                &[
                    "Bullet hell video games",
                    "Digital deck-building card games",
                    "Indie games",
                    "Platform fighters",
                    "The Game Awards winners",
                ],
                "A little bit of everything.",
            ),
        ];

        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        for name in DEMO_CATEGORIES {
            tx.execute(
                "INSERT OR IGNORE INTO PresetEntries (entry_name, entry_type) VALUES (?1, 'category')",
                params![name],
            )
            .context("failed to seed registry entry")?;
        }

        for (name, entries, description) in DEMO_PRESETS {
            let json = serde_json::to_string(entries).context("failed to serialize entry set")?;
            tx.execute(
                "INSERT OR IGNORE INTO Presets (preset_name, entries, description) VALUES (?1, ?2, ?3)",
                params![name, json, description],
            )
            .context("failed to seed preset")?;
        }

        tx.commit().context("failed to commit demo data")
    }
}

/// Insert validated registry rows inside an open transaction.
fn insert_entry_rows(tx: &Transaction<'_>, entries: &[(String, EntryType)]) -> Result<()> {
    for (name, entry_type) in entries {
        tx.execute(
            "INSERT OR IGNORE INTO PresetEntries (entry_name, entry_type) VALUES (?1, ?2)",
            params![name, entry_type.as_str()],
        )
        .with_context(|| format!("failed to insert registry entry `{name}`"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
