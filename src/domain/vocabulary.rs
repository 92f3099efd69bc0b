//! Vocabulary entries: a reading/meaning pair with optional kanji

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Script the reading is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritingSystem {
  Hiragana,
  Katakana,
}

impl WritingSystem {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "hiragana" => Some(WritingSystem::Hiragana),
      "katakana" => Some(WritingSystem::Katakana),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      WritingSystem::Hiragana => "hiragana",
      WritingSystem::Katakana => "katakana",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyItem {
  pub id: String,
  pub chapter_id: i64,
  pub user_id: i64,
  pub meaning: String,
  pub reading: String,
  pub kanji: Option<String>,
  pub writing_system: WritingSystem,
  pub created_at: DateTime<Utc>,
}

impl VocabularyItem {
  pub fn new(
    chapter_id: i64,
    user_id: i64,
    meaning: String,
    reading: String,
    kanji: Option<String>,
    writing_system: WritingSystem,
  ) -> Self {
    VocabularyItem {
      id: String::new(),
      chapter_id,
      user_id,
      meaning,
      reading,
      kanji,
      writing_system,
      created_at: Utc::now(),
    }
  }

  /// Kanji questions key off this, not the writing system tag.
  pub fn has_kanji(&self) -> bool {
    self.kanji.as_deref().is_some_and(|k| !k.trim().is_empty())
  }
}
