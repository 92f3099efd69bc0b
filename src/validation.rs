//! Answer checking for quiz submissions.
//!
//! Two comparison policies, chosen by the question type:
//! - `Lenient` - trimmed, case-insensitive (meaning and reading answers)
//! - `Exact` - trimmed only (expected-kanji answers)

use serde::{Deserialize, Serialize};

/// How a submission is compared against the expected answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPolicy {
  Lenient,
  Exact,
}

/// Check a raw submission against the expected answer.
///
/// Surrounding whitespace is ignored on both sides. Under `Exact` there
/// is no folding of any kind, so a romanized stand-in never matches a
/// kanji answer. Empty submissions are legal input; they just never
/// match a non-empty expected answer.
pub fn answer_matches(submitted: &str, expected: &str, policy: MatchPolicy) -> bool {
  let submitted = submitted.trim();
  let expected = expected.trim();

  match policy {
    MatchPolicy::Lenient => submitted.to_lowercase() == expected.to_lowercase(),
    MatchPolicy::Exact => submitted == expected,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exact_match() {
    assert!(answer_matches("犬", "犬", MatchPolicy::Exact));
    assert!(answer_matches("食べ物", "食べ物", MatchPolicy::Exact));
  }

  #[test]
  fn test_exact_rejects_romanization() {
    assert!(!answer_matches("Inu", "犬", MatchPolicy::Exact));
    assert!(!answer_matches("inu", "犬", MatchPolicy::Exact));
  }

  #[test]
  fn test_exact_is_case_sensitive() {
    assert!(!answer_matches("Dog", "dog", MatchPolicy::Exact));
    assert!(answer_matches("dog", "dog", MatchPolicy::Exact));
  }

  #[test]
  fn test_lenient_case_insensitive() {
    assert!(answer_matches("Dog", "dog", MatchPolicy::Lenient));
    assert!(answer_matches("DOG", "dog", MatchPolicy::Lenient));
    assert!(answer_matches("neko", "NEKO", MatchPolicy::Lenient));
  }

  #[test]
  fn test_lenient_does_not_fold_scripts() {
    // Kana scripts are distinct; lenient only folds letter case.
    assert!(!answer_matches("イヌ", "いぬ", MatchPolicy::Lenient));
    assert!(answer_matches("いぬ", "いぬ", MatchPolicy::Lenient));
  }

  #[test]
  fn test_whitespace_trimmed() {
    assert!(answer_matches("  dog  ", "dog", MatchPolicy::Lenient));
    assert!(answer_matches(" 犬 ", "犬", MatchPolicy::Exact));
    assert!(answer_matches("dog", "  dog", MatchPolicy::Lenient));
  }

  #[test]
  fn test_empty_submission_never_matches() {
    assert!(!answer_matches("", "dog", MatchPolicy::Lenient));
    assert!(!answer_matches("   ", "dog", MatchPolicy::Lenient));
    assert!(!answer_matches("", "犬", MatchPolicy::Exact));
  }

  #[test]
  fn test_wrong_answer() {
    assert!(!answer_matches("cat", "dog", MatchPolicy::Lenient));
    assert!(!answer_matches("猫", "犬", MatchPolicy::Exact));
  }
}
