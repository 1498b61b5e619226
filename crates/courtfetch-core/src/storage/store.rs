use crate::model::{NewQuery, QueryLog, QueryStatus};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const LOG_COLUMNS: &str = "id, court, case_type, case_number, year, created_at, \
                           raw_response, parsed_json, pdf_path, status";

#[derive(Clone)]
pub struct Store {
    pub conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db at {}", path.display()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        // Older databases may predate the result columns.
        migrate_result_columns(&conn)?;
        Ok(())
    }

    /// Commits a row with no status yet. Called before the scraper runs.
    pub fn insert_pending(&self, q: &NewQuery) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO query_log(court, case_type, case_number, year, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![q.court, q.case_type, q.case_number, q.year, now_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Records a successful fetch. Returns false if the row was already terminal
    /// (or does not exist).
    pub fn mark_ok(
        &self,
        id: i64,
        raw_response: &str,
        parsed_json: &str,
        pdf_path: Option<&str>,
    ) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE query_log
             SET raw_response = ?2, parsed_json = ?3, pdf_path = ?4, status = ?5
             WHERE id = ?1 AND status IS NULL",
            params![id, raw_response, parsed_json, pdf_path, QueryStatus::Ok.as_db()],
        )?;
        Ok(n == 1)
    }

    /// Records a failed fetch; the message becomes `raw_response`.
    pub fn mark_error(&self, id: i64, message: &str) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE query_log
             SET raw_response = ?2, status = ?3
             WHERE id = ?1 AND status IS NULL",
            params![id, message, QueryStatus::Error.as_db()],
        )?;
        Ok(n == 1)
    }

    /// Marks rows left without a status by an earlier process. Only safe to
    /// call before requests are served.
    pub fn reconcile_interrupted(&self) -> anyhow::Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE query_log SET status = ?1 WHERE status IS NULL",
            params![QueryStatus::Interrupted.as_db()],
        )?;
        Ok(n)
    }

    pub fn get(&self, id: i64) -> anyhow::Result<Option<QueryLog>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {LOG_COLUMNS} FROM query_log WHERE id = ?1");
        let row = conn
            .query_row(&sql, params![id], row_to_log)
            .optional()?;
        Ok(row)
    }

    /// Newest first. Rows created within the same microsecond fall back to id order.
    pub fn recent(&self, limit: u32) -> anyhow::Result<Vec<QueryLog>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM query_log
             ORDER BY created_at DESC, id DESC
             LIMIT ?1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], row_to_log)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

fn row_to_log(row: &Row<'_>) -> rusqlite::Result<QueryLog> {
    let status: Option<String> = row.get(9)?;
    Ok(QueryLog {
        id: row.get(0)?,
        court: row.get(1)?,
        case_type: row.get(2)?,
        case_number: row.get(3)?,
        year: row.get(4)?,
        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        raw_response: row.get(6)?,
        parsed_json: row.get(7)?,
        pdf_path: row.get(8)?,
        status: QueryStatus::parse(status.as_deref()),
    })
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn migrate_result_columns(conn: &Connection) -> anyhow::Result<()> {
    let cols = get_columns(conn, "query_log")?;
    add_column_if_missing(conn, &cols, "query_log", "raw_response", "TEXT")?;
    add_column_if_missing(conn, &cols, "query_log", "parsed_json", "TEXT")?;
    add_column_if_missing(conn, &cols, "query_log", "pdf_path", "TEXT")?;
    add_column_if_missing(conn, &cols, "query_log", "status", "TEXT")?;
    Ok(())
}

fn get_columns(
    conn: &Connection,
    table: &str,
) -> anyhow::Result<std::collections::HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut out = std::collections::HashSet::new();
    for r in rows {
        out.insert(r?);
    }
    Ok(out)
}

fn add_column_if_missing(
    conn: &Connection,
    cols: &std::collections::HashSet<String>,
    table: &str,
    col: &str,
    ty: &str,
) -> anyhow::Result<()> {
    if !cols.contains(col) {
        let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, col, ty);
        conn.execute(&sql, [])?;
    }
    Ok(())
}
