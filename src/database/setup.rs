use anyhow::{Context, Result};

use super::connection::DbConn;

const SCHEMA: &str = include_str!("schema.sql");

/// Creates the ladder tables and indexes if they do not exist yet. Runs in
/// one transaction, so a failing statement leaves no partial schema.
pub fn initialize_schema(conn: &mut DbConn) -> Result<()> {
    let tx = conn.transaction().context("Failed to open schema transaction")?;
    tx.execute_batch(SCHEMA).context("Failed to create ladder schema")?;
    tx.commit().context("Failed to commit ladder schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, get_connection};

    fn table_names(conn: &DbConn) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_schema_is_idempotent() {
        let pool = create_memory_pool().unwrap();
        let mut conn = get_connection(&pool).unwrap();

        initialize_schema(&mut conn).unwrap();
        initialize_schema(&mut conn).unwrap();

        assert_eq!(table_names(&conn), vec!["elo_changes", "matches", "players"]);
    }
}
