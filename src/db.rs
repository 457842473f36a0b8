use std::collections::HashSet;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

const DB_PATH: &str = "data/webinars.sqlite";

/// Identity separator. `source::link` is the uniqueness key everywhere.
const ID_SEP: &str = "::";

/// One normalized webinar listing. `air_date` stays `None` when no strategy
/// matched; only text literally read from a page ever populates it.
#[derive(Debug, Clone, Serialize)]
pub struct WebinarRecord {
    pub source: String,
    pub title: String,
    pub air_date: Option<String>,
    pub link: String,
}

impl WebinarRecord {
    pub fn unique_id(&self) -> String {
        format!("{}{}{}", self.source, ID_SEP, self.link)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

pub fn connect() -> Result<Connection> {
    let path = std::env::var("WEBINAR_DB").unwrap_or_else(|_| DB_PATH.to_string());
    if let Some(dir) = std::path::Path::new(&path).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS webinars (
            id           INTEGER PRIMARY KEY,
            unique_id    TEXT UNIQUE NOT NULL,
            source       TEXT NOT NULL,
            title        TEXT NOT NULL,
            air_date     TEXT,
            link         TEXT NOT NULL,
            last_updated TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_webinars_source ON webinars(source);
        CREATE INDEX IF NOT EXISTS idx_webinars_link ON webinars(link);
        ",
    )?;
    Ok(())
}

/// Links already stored for a source. Seeds the dedup filter before any
/// collector runs, so known items never trigger a detail visit.
pub fn existing_links(conn: &Connection, source: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT link FROM webinars WHERE source = ?1")?;
    let rows = stmt
        .query_map([source], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(rows)
}

/// Insert-if-absent-else-update keyed by `unique_id`. An update overwrites
/// title, air_date and last_updated; source and link never change.
pub fn upsert(conn: &Connection, record: &WebinarRecord) -> Result<UpsertOutcome> {
    let unique_id = record.unique_id();
    let now = chrono::Utc::now().to_rfc3339();

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM webinars WHERE unique_id = ?1",
            [&unique_id],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE webinars SET title = ?1, air_date = ?2, last_updated = ?3 WHERE id = ?4",
                rusqlite::params![record.title, record.air_date, now, id],
            )?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            conn.execute(
                "INSERT INTO webinars (unique_id, source, title, air_date, link, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    unique_id,
                    record.source,
                    record.title,
                    record.air_date,
                    record.link,
                    now
                ],
            )?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

/// Upsert a batch in one transaction. Returns (inserted, updated).
pub fn upsert_all(conn: &Connection, records: &[WebinarRecord]) -> Result<(usize, usize)> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    let mut updated = 0;
    for record in records {
        match upsert(&tx, record)? {
            UpsertOutcome::Inserted => inserted += 1,
            UpsertOutcome::Updated => updated += 1,
        }
    }
    tx.commit()?;
    Ok((inserted, updated))
}

/// Snapshot of the store, ordered by source then title.
pub fn fetch_all(
    conn: &Connection,
    source: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<WebinarRecord>> {
    let mut sql = "SELECT source, title, air_date, link FROM webinars".to_string();
    if source.is_some() {
        sql.push_str(" WHERE source = ?1");
    }
    sql.push_str(" ORDER BY source, title");
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }

    let mut stmt = conn.prepare(&sql)?;
    let map = |row: &rusqlite::Row<'_>| {
        Ok(WebinarRecord {
            source: row.get(0)?,
            title: row.get(1)?,
            air_date: row.get(2)?,
            link: row.get(3)?,
        })
    };
    let rows = match source {
        Some(s) => stmt.query_map([s], map)?.collect::<Result<Vec<_>, _>>()?,
        None => stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

pub struct Stats {
    pub total: usize,
    pub dated: usize,
    pub per_source: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM webinars", [], |r| r.get(0))?;
    let dated: usize = conn.query_row(
        "SELECT COUNT(*) FROM webinars WHERE air_date IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let mut stmt =
        conn.prepare("SELECT source, COUNT(*) FROM webinars GROUP BY source ORDER BY source")?;
    let per_source = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stats {
        total,
        dated,
        per_source,
    })
}
