//! Quiz engine: expands a vocabulary snapshot into shuffled question
//! instances, scores submissions, and produces the end-of-quiz report.
//!
//! The engine never touches storage. It is handed a clone of the
//! chapter's items at construction and runs entirely in memory, so an
//! abandoned session simply evaporates.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::{VocabularyItem, WritingSystem};
use crate::validation::{self, MatchPolicy};

// ============================================================================
// Modes and question types
// ============================================================================

/// Which quiz a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizMode {
  Vocabulary,
  Kanji,
}

impl QuizMode {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "vocabulary" => Some(QuizMode::Vocabulary),
      "kanji" => Some(QuizMode::Kanji),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      QuizMode::Vocabulary => "vocabulary",
      QuizMode::Kanji => "kanji",
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      QuizMode::Vocabulary => "Vocabulary Quiz",
      QuizMode::Kanji => "Kanji Quiz",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
  Meaning,
  Reading,
  Kanji,
  KanjiMeaning,
  KanjiToReading,
  ReadingToKanji,
  MeaningToKanji,
}

/// Types every item contributes to the vocabulary quiz
pub const VOCABULARY_TYPES: [QuestionType; 2] = [QuestionType::Meaning, QuestionType::Reading];

/// Extra types a kanji-bearing item contributes to the vocabulary quiz
pub const VOCABULARY_KANJI_TYPES: [QuestionType; 2] =
  [QuestionType::Kanji, QuestionType::KanjiMeaning];

/// Types per kanji-bearing item in the kanji quiz
pub const KANJI_TYPES: [QuestionType; 3] = [
  QuestionType::KanjiToReading,
  QuestionType::ReadingToKanji,
  QuestionType::MeaningToKanji,
];

impl QuestionType {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "meaning" => Some(QuestionType::Meaning),
      "reading" => Some(QuestionType::Reading),
      "kanji" => Some(QuestionType::Kanji),
      "kanji_meaning" => Some(QuestionType::KanjiMeaning),
      "kanji_to_reading" => Some(QuestionType::KanjiToReading),
      "reading_to_kanji" => Some(QuestionType::ReadingToKanji),
      "meaning_to_kanji" => Some(QuestionType::MeaningToKanji),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      QuestionType::Meaning => "meaning",
      QuestionType::Reading => "reading",
      QuestionType::Kanji => "kanji",
      QuestionType::KanjiMeaning => "kanji_meaning",
      QuestionType::KanjiToReading => "kanji_to_reading",
      QuestionType::ReadingToKanji => "reading_to_kanji",
      QuestionType::MeaningToKanji => "meaning_to_kanji",
    }
  }

  /// Readable form for the missed-item report
  pub fn label(&self) -> &'static str {
    match self {
      QuestionType::Meaning => "Meaning",
      QuestionType::Reading => "Reading",
      QuestionType::Kanji => "Kanji",
      QuestionType::KanjiMeaning => "Kanji Meaning",
      QuestionType::KanjiToReading => "Kanji to Reading",
      QuestionType::ReadingToKanji => "Reading to Kanji",
      QuestionType::MeaningToKanji => "Meaning to Kanji",
    }
  }

  /// Expected-kanji answers compare exactly; everything else is lenient.
  pub fn match_policy(&self) -> MatchPolicy {
    match self {
      QuestionType::Kanji | QuestionType::ReadingToKanji | QuestionType::MeaningToKanji => {
        MatchPolicy::Exact
      }
      _ => MatchPolicy::Lenient,
    }
  }
}

// ============================================================================
// Question instances
// ============================================================================

/// One question: an item snapshot plus the type being asked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionInstance {
  pub item: VocabularyItem,
  pub question_type: QuestionType,
}

impl QuestionInstance {
  /// Heading shown above the prompt text
  pub fn prompt_heading(&self) -> String {
    match self.question_type {
      QuestionType::Meaning => "What is the meaning of:".to_string(),
      QuestionType::Reading => format!(
        "What is the {} reading for:",
        self.item.writing_system.as_str()
      ),
      QuestionType::Kanji | QuestionType::ReadingToKanji => {
        "What is the kanji for this reading?".to_string()
      }
      QuestionType::KanjiMeaning => "What is the meaning of this kanji?".to_string(),
      QuestionType::KanjiToReading => "What is the reading for this kanji?".to_string(),
      QuestionType::MeaningToKanji => "What is the kanji for this meaning?".to_string(),
    }
  }

  /// The word the question displays
  pub fn prompt_text(&self) -> &str {
    match self.question_type {
      QuestionType::Meaning | QuestionType::Kanji | QuestionType::ReadingToKanji => {
        &self.item.reading
      }
      QuestionType::Reading | QuestionType::MeaningToKanji => &self.item.meaning,
      QuestionType::KanjiMeaning | QuestionType::KanjiToReading => {
        self.item.kanji.as_deref().unwrap_or("")
      }
    }
  }

  /// The answer the submission is checked against
  pub fn expected_answer(&self) -> &str {
    match self.question_type {
      QuestionType::Meaning | QuestionType::KanjiMeaning => &self.item.meaning,
      QuestionType::Reading | QuestionType::KanjiToReading => &self.item.reading,
      QuestionType::Kanji | QuestionType::ReadingToKanji | QuestionType::MeaningToKanji => {
        self.item.kanji.as_deref().unwrap_or("")
      }
    }
  }

  /// CSS class matching the script of the displayed text. Readings
  /// render in their own script's style, kanji prompts in the kanji
  /// style, English prompts plain.
  pub fn prompt_class(&self) -> &'static str {
    match self.question_type {
      QuestionType::Meaning | QuestionType::Kanji | QuestionType::ReadingToKanji => {
        match self.item.writing_system {
          WritingSystem::Hiragana => "japanese-text-hiragana",
          WritingSystem::Katakana => "japanese-text-katakana",
        }
      }
      QuestionType::KanjiMeaning | QuestionType::KanjiToReading => "japanese-text-kanji",
      QuestionType::Reading | QuestionType::MeaningToKanji => "",
    }
  }

  /// Kanji displayed beneath the reading on meaning questions, as on
  /// the card front. Never shown where kanji is the expected answer.
  pub fn prompt_kanji(&self) -> Option<&str> {
    match self.question_type {
      QuestionType::Meaning => self.item.kanji.as_deref(),
      _ => None,
    }
  }

  /// Label used for this item in results, e.g. "いぬ (犬)"
  pub fn word_label(&self) -> String {
    if self.item.has_kanji() {
      format!(
        "{} ({})",
        self.item.reading,
        self.item.kanji.as_deref().unwrap_or("")
      )
    } else {
      self.item.reading.clone()
    }
  }

  pub fn check(&self, submitted: &str) -> bool {
    validation::answer_matches(
      submitted,
      self.expected_answer(),
      self.question_type.match_policy(),
    )
  }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
  /// No question instances were produced; terminal from the start
  Empty,
  InProgress,
  /// Every question has been answered; terminal
  Complete,
}

/// Outcome of one submitted answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
  pub word: String,
  pub user_answer: String,
  pub correct_answer: String,
  pub is_correct: bool,
  pub question_type: QuestionType,
}

/// End-of-quiz summary
#[derive(Debug, Clone, Serialize)]
pub struct QuizReport {
  pub score: usize,
  pub total: usize,
  pub accuracy: f64,
  /// Incorrect results in the order they were encountered
  pub missed: Vec<TestResult>,
}

impl QuizReport {
  pub fn accuracy_display(&self) -> String {
    format!("{:.1}", self.accuracy)
  }
}

#[derive(Debug, Clone)]
pub struct QuizSession {
  mode: QuizMode,
  questions: Vec<QuestionInstance>,
  position: usize,
  score: usize,
  results: Vec<TestResult>,
}

impl QuizSession {
  /// Expand the item snapshot into question instances and shuffle them.
  /// The kanji mode filters to kanji-bearing items first; when nothing
  /// qualifies the session starts (and stays) empty.
  pub fn new(mode: QuizMode, items: &[VocabularyItem]) -> Self {
    let mut questions = Vec::new();

    match mode {
      QuizMode::Vocabulary => {
        for item in items {
          for question_type in VOCABULARY_TYPES {
            questions.push(QuestionInstance {
              item: item.clone(),
              question_type,
            });
          }
          if item.has_kanji() {
            for question_type in VOCABULARY_KANJI_TYPES {
              questions.push(QuestionInstance {
                item: item.clone(),
                question_type,
              });
            }
          }
        }
      }
      QuizMode::Kanji => {
        for item in items.iter().filter(|i| i.has_kanji()) {
          for question_type in KANJI_TYPES {
            questions.push(QuestionInstance {
              item: item.clone(),
              question_type,
            });
          }
        }
      }
    }

    let mut rng = rand::rng();
    questions.shuffle(&mut rng);

    QuizSession {
      mode,
      questions,
      position: 0,
      score: 0,
      results: Vec::new(),
    }
  }

  pub fn mode(&self) -> QuizMode {
    self.mode
  }

  pub fn state(&self) -> QuizState {
    if self.questions.is_empty() {
      QuizState::Empty
    } else if self.position >= self.questions.len() {
      QuizState::Complete
    } else {
      QuizState::InProgress
    }
  }

  pub fn current_question(&self) -> Option<&QuestionInstance> {
    match self.state() {
      QuizState::InProgress => self.questions.get(self.position),
      _ => None,
    }
  }

  /// 1-based position for display
  pub fn question_number(&self) -> usize {
    self.position + 1
  }

  pub fn total(&self) -> usize {
    self.questions.len()
  }

  pub fn score(&self) -> usize {
    self.score
  }

  pub fn results(&self) -> &[TestResult] {
    &self.results
  }

  /// Score and record the submission, then advance. Rejected in
  /// terminal states. Empty submissions are scored, not rejected.
  pub fn submit_answer(&mut self, raw: &str) -> Option<TestResult> {
    let question = self.current_question()?;
    let is_correct = question.check(raw);
    let result = TestResult {
      word: question.word_label(),
      user_answer: raw.trim().to_string(),
      correct_answer: question.expected_answer().to_string(),
      is_correct,
      question_type: question.question_type,
    };

    if is_correct {
      self.score += 1;
    }
    self.position += 1;
    self.results.push(result.clone());

    Some(result)
  }

  /// Final summary; available only once every question is answered.
  pub fn report(&self) -> Option<QuizReport> {
    if self.state() != QuizState::Complete {
      return None;
    }

    let total = self.questions.len();
    Some(QuizReport {
      score: self.score,
      total,
      accuracy: self.score as f64 / total as f64 * 100.0,
      missed: self
        .results
        .iter()
        .filter(|r| !r.is_correct)
        .cloned()
        .collect(),
    })
  }
}
