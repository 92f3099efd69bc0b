//! Simple in-memory session storage for running quizzes.
//!
//! Stores ActiveQuiz state keyed by session ID (carried in a hidden form
//! field). Sessions auto-expire after a configurable duration of inactivity.

use crate::config;
use crate::quiz::QuizSession;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// A quiz in flight, tied to the chapter it was generated from.
#[derive(Clone)]
pub struct ActiveQuiz {
  pub chapter_id: i64,
  pub chapter_name: String,
  pub quiz: QuizSession,
}

/// Session entry with last access time for expiration
struct SessionEntry {
  session: ActiveQuiz,
  last_access: DateTime<Utc>,
}

/// Global session store
static SESSIONS: LazyLock<Mutex<HashMap<String, SessionEntry>>> =
  LazyLock::new(|| Mutex::new(HashMap::new()));

/// Look up a running quiz. Returns None for unknown or expired IDs;
/// quizzes are only ever created by an explicit start.
pub fn fetch_session(session_id: &str) -> Option<ActiveQuiz> {
  let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");

  // Clean up expired sessions occasionally (~10% chance)
  if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
    cleanup_expired(&mut sessions);
  }

  let entry = sessions.get_mut(session_id)?;
  if entry.last_access < Utc::now() - Duration::hours(config::SESSION_EXPIRY_HOURS) {
    sessions.remove(session_id);
    return None;
  }

  entry.last_access = Utc::now();
  Some(entry.session.clone())
}

/// Store a quiz under the given ID, replacing any previous state
pub fn store_session(session_id: &str, session: ActiveQuiz) {
  let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");
  sessions.insert(
    session_id.to_string(),
    SessionEntry {
      session,
      last_access: Utc::now(),
    },
  );
}

/// Drop a quiz (finished or abandoned)
pub fn remove_session(session_id: &str) {
  let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");
  sessions.remove(session_id);
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<String, SessionEntry>) {
  let expiry = Utc::now() - Duration::hours(config::SESSION_EXPIRY_HOURS);
  sessions.retain(|_, entry| entry.last_access > expiry);
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
