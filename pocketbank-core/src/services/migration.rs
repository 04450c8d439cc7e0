//! Schema migrations
//!
//! Every embedded migration runs once, in order, and is recorded in
//! `sys_migrations`. The first migration creates that table with
//! `IF NOT EXISTS`, so it is always safe to run.

use std::collections::HashSet;

use duckdb::Connection;

use crate::domain::result::Result;
use crate::migrations::MIGRATIONS;

pub struct MigrationService<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Apply unrecorded migrations and return their names
    pub fn run_pending(&self) -> Result<Vec<&'static str>> {
        let Some((_, bootstrap)) = MIGRATIONS.first() else {
            return Ok(Vec::new());
        };
        self.conn.execute_batch(bootstrap)?;

        let recorded = self.recorded()?;
        let mut applied = Vec::new();

        for (name, sql) in MIGRATIONS {
            if recorded.contains(*name) {
                continue;
            }
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [*name])?;
            applied.push(*name);
        }

        Ok(applied)
    }

    fn recorded(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT migration_name FROM sys_migrations")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<duckdb::Result<HashSet<_>>>()?;
        Ok(names)
    }
}
