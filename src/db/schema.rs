//! Schema migrations for the application database.
//!
//! Applied versions are recorded in db_version, so each migration runs
//! exactly once no matter how often the app restarts.

use chrono::Utc;
use rusqlite::{params, Connection, Result};

pub const DB_VERSION: i32 = 3;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute(
    "CREATE TABLE IF NOT EXISTS db_version (
      version INTEGER PRIMARY KEY,
      applied_at TEXT NOT NULL,
      description TEXT
    )",
    [],
  )?;

  let current_version = get_schema_version(conn)?;

  if current_version < 1 {
    migrate_v0_to_v1(conn)?;
  }
  if current_version < 2 {
    migrate_v1_to_v2(conn)?;
  }
  if current_version < 3 {
    migrate_v2_to_v3(conn)?;
  }

  Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<i32> {
  conn.query_row(
    "SELECT COALESCE(MAX(version), 0) FROM db_version",
    [],
    |row| row.get(0),
  )
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
  conn.execute(
    "INSERT INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
    params![version, Utc::now().to_rfc3339(), description],
  )?;
  Ok(())
}

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      email TEXT NOT NULL UNIQUE COLLATE NOCASE,
      password_hash TEXT NOT NULL,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
      id TEXT PRIMARY KEY,
      user_id INTEGER NOT NULL,
      created_at TEXT NOT NULL,
      expires_at TEXT NOT NULL,
      last_access_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

    CREATE TABLE IF NOT EXISTS chapters (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      name TEXT NOT NULL,
      created_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_chapters_user ON chapters(user_id);

    CREATE TABLE IF NOT EXISTS vocabulary (
      id TEXT PRIMARY KEY,
      chapter_id INTEGER NOT NULL,
      user_id INTEGER NOT NULL,
      meaning TEXT NOT NULL,
      reading TEXT NOT NULL,
      kanji TEXT,
      writing_system TEXT NOT NULL DEFAULT 'hiragana',
      created_at TEXT NOT NULL,
      FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_vocabulary_chapter ON vocabulary(chapter_id);
    CREATE INDEX IF NOT EXISTS idx_vocabulary_user ON vocabulary(user_id);
    "#,
  )?;
  record_version(conn, 1, "Base tables: users, sessions, chapters, vocabulary")
}

fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS password_resets (
      token_hash TEXT PRIMARY KEY,
      user_id INTEGER NOT NULL,
      created_at TEXT NOT NULL,
      expires_at TEXT NOT NULL,
      used INTEGER NOT NULL DEFAULT 0,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_password_resets_user ON password_resets(user_id);
    "#,
  )?;
  record_version(conn, 2, "Single-use password reset tokens")
}

fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
  add_column_if_missing(conn, "users", "last_login_at", "TEXT")?;
  conn.execute(
    "CREATE INDEX IF NOT EXISTS idx_vocabulary_chapter_user ON vocabulary(chapter_id, user_id)",
    [],
  )?;
  record_version(conn, 3, "Track last login; composite chapter/user index")
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
  let exists = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .filter_map(|r| r.ok())
    .any(|name| name == column);
  Ok(exists)
}

pub fn add_column_if_missing(
  conn: &Connection,
  table: &str,
  column: &str,
  ddl: &str,
) -> Result<()> {
  if !column_exists(conn, table, column)? {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ddl),
      [],
    )?;
  }
  Ok(())
}
