//! Shared fixtures for database-backed tests.

use rusqlite::Connection;
use tempfile::TempDir;

/// A throwaway database that went through the real migrations.
pub struct TestEnv {
    _temp: TempDir,
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let db_path = temp.path().join("tango.db");

        let conn = Connection::open(&db_path).expect("open test database");
        conn.pragma_update(None, "foreign_keys", "ON")
            .expect("enable foreign keys");
        crate::db::run_migrations(&conn).expect("run migrations");

        TestEnv { _temp: temp, conn }
    }

    /// Insert a user to hang test data off; returns its id. The stored
    /// hash is a placeholder, so this user cannot actually sign in.
    pub fn create_user(&self, email: &str) -> i64 {
        crate::auth::db::create_user(&self.conn, email, "x").expect("create test user")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
