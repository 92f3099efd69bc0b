//! Chapters group vocabulary into user-defined study units

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
  pub id: i64,
  pub user_id: i64,
  pub name: String,
  pub created_at: DateTime<Utc>,
}

impl Chapter {
  pub fn new(user_id: i64, name: String) -> Self {
    Chapter {
      id: 0,
      user_id,
      name,
      created_at: Utc::now(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_chapter_defaults() {
    let chapter = Chapter::new(7, "Chapter 1".to_string());
    assert_eq!(chapter.id, 0);
    assert_eq!(chapter.user_id, 7);
    assert_eq!(chapter.name, "Chapter 1");
  }
}
