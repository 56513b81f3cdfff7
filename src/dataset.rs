use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::error::PipelineError;
use crate::table::{Cell, Table};

pub const MATCH_TABLE: &str = "match";
pub const TEAM_TABLE: &str = "team";
pub const TEAM_ATTRIBUTES_TABLE: &str = "team_attributes";
pub const PLAYER_TABLE: &str = "player";
pub const PLAYER_ATTRIBUTES_TABLE: &str = "player_attributes";

pub const DEFAULT_DB_FILE: &str = "soccer_database.sqlite";

#[derive(Debug, Clone)]
pub struct RawTables {
    pub matches: Table,
    pub teams: Table,
    pub team_attributes: Table,
    pub players: Table,
    pub player_attributes: Table,
}

impl RawTables {
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        [
            &self.matches,
            &self.teams,
            &self.team_attributes,
            &self.players,
            &self.player_attributes,
        ]
        .into_iter()
    }
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(PipelineError::SourceUnavailable {
            path: path.display().to_string(),
            reason: "file not found".to_string(),
        }
        .into());
    }
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|err| PipelineError::SourceUnavailable {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
    .with_context(|| format!("open sqlite db {}", path.display()))
}

pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .context("prepare table listing")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query table listing")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode table name")?);
    }
    Ok(out)
}

pub fn load_table(conn: &Connection, name: &str) -> Result<Table> {
    if !is_plain_identifier(name) {
        return Err(anyhow!("refusing to query table with unsafe name {name:?}"));
    }
    let sql = format!("SELECT * FROM \"{name}\"");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|err| PipelineError::SourceUnavailable {
            path: format!("table {name}"),
            reason: err.to_string(),
        })
        .with_context(|| format!("prepare select-all on {name}"))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();

    let mut rows = stmt
        .query([])
        .with_context(|| format!("query select-all on {name}"))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().with_context(|| format!("read row of {name}"))? {
        let mut cells = Vec::with_capacity(width);
        for idx in 0..width {
            let value = row
                .get_ref(idx)
                .with_context(|| format!("read column {idx} of {name}"))?;
            cells.push(cell_from_value(value));
        }
        out.push(cells);
    }

    log::info!("loaded table {name}: {} rows x {} columns", out.len(), width);
    Ok(Table::new(name, columns, out))
}

pub fn load_raw_tables(conn: &Connection) -> Result<RawTables> {
    Ok(RawTables {
        matches: load_table(conn, MATCH_TABLE)?,
        teams: load_table(conn, TEAM_TABLE)?,
        team_attributes: load_table(conn, TEAM_ATTRIBUTES_TABLE)?,
        players: load_table(conn, PLAYER_TABLE)?,
        player_attributes: load_table(conn, PLAYER_ATTRIBUTES_TABLE)?,
    })
}

fn cell_from_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(v) => Cell::Integer(v),
        ValueRef::Real(v) => Cell::Real(v),
        ValueRef::Text(raw) => Cell::Text(String::from_utf8_lossy(raw).into_owned()),
        ValueRef::Blob(raw) => Cell::Blob(raw.to_vec()),
    }
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_validated() {
        assert!(is_plain_identifier("team_attributes"));
        assert!(!is_plain_identifier("team; DROP TABLE x"));
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn select_all_preserves_nulls_and_types() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE team (id INTEGER, team_api_id INTEGER, team_fifa_api_id INTEGER, team_long_name TEXT);
             INSERT INTO team VALUES (1, 9987, NULL, 'KRC Genk');
             INSERT INTO team VALUES (2, 9993, 675, 'Beerschot AC');",
        )
        .unwrap();
        let table = load_table(&conn, "team").unwrap();
        assert_eq!(table.width(), 4);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2], Cell::Null);
        assert_eq!(table.rows[1][3], Cell::Text("Beerschot AC".into()));
    }
}
