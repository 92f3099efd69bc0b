pub mod chapters;
pub mod schema;
pub mod vocabulary;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};

// Re-export all public items from submodules
pub use chapters::*;
pub use schema::run_migrations;
pub use vocabulary::*;

pub type DbPool = Arc<Mutex<Connection>>;

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).ok();
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    if let Err(e) = std::fs::copy(path, &backup_path) {
      eprintln!("Warning: Could not create database backup: {}", e);
    }
  }

  let conn = Connection::open(path)?;
  conn.pragma_update(None, "foreign_keys", "ON")?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}
