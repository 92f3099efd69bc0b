//! Quiz flow handlers: start, answer, quit.
//!
//! The engine state lives in the in-process session store; the browser
//! only carries the random session id in a hidden form field. Leaving
//! the page abandons the quiz and the entry ages out on its own.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::{not_found_response, redirect_with_notice, NavContext};
use crate::auth::AuthContext;
use crate::db::chapters as chapters_db;
use crate::db::vocabulary as vocabulary_db;
use crate::filters;
use crate::quiz::{QuizMode, QuizReport, QuizSession, QuizState};
use crate::session::{self, ActiveQuiz};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "quiz/question.html")]
pub struct QuestionTemplate {
  pub nav: NavContext,
  pub session_id: String,
  pub chapter_id: i64,
  pub chapter_name: String,
  pub quiz_title: &'static str,
  /// 1-based position of the current question
  pub number: usize,
  pub total: usize,
  pub score: usize,
  pub heading: String,
  pub prompt: String,
  pub prompt_class: &'static str,
  /// Kanji rendered beneath the prompt on meaning questions
  pub prompt_kanji: Option<String>,
  pub feedback: Option<Feedback>,
}

/// Right/wrong banner for the answer just submitted
pub struct Feedback {
  pub is_correct: bool,
  pub message: String,
}

#[derive(Template)]
#[template(path = "quiz/report.html")]
pub struct ReportTemplate {
  pub nav: NavContext,
  pub chapter_id: i64,
  pub chapter_name: String,
  pub quiz_title: &'static str,
  /// Mode slug for the retake link
  pub mode: &'static str,
  pub report: QuizReport,
}

#[derive(Template)]
#[template(path = "quiz/empty.html")]
pub struct EmptyQuizTemplate {
  pub nav: NavContext,
  pub chapter_id: i64,
  pub chapter_name: String,
  pub quiz_title: &'static str,
  pub message: &'static str,
}

#[derive(Deserialize)]
pub struct QuizStartQuery {
  #[serde(default)]
  pub mode: Option<String>,
}

#[derive(Deserialize)]
pub struct AnswerForm {
  pub session_id: String,
  #[serde(default)]
  pub answer: String,
}

#[derive(Deserialize)]
pub struct QuitForm {
  pub session_id: String,
}

/// GET /chapter/{id}/quiz?mode={vocabulary|kanji} - Start a quiz
pub async fn quiz_start(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(chapter_id): Path<i64>,
  Query(query): Query<QuizStartQuery>,
) -> Response {
  let mode = query
    .mode
    .as_deref()
    .and_then(QuizMode::from_str)
    .unwrap_or(QuizMode::Vocabulary);

  let conn = match state.db.lock() {
    Ok(conn) => conn,
    Err(_) => {
      return Html("<h1>Database Error</h1><p>Please refresh the page.</p>".to_string())
        .into_response()
    }
  };

  let chapter = match chapters_db::get_chapter_by_id(&conn, auth.user_id, chapter_id) {
    Ok(Some(chapter)) => chapter,
    Ok(None) => {
      drop(conn);
      return not_found_response(NavContext::from_auth(&auth));
    }
    Err(e) => {
      tracing::error!("Failed to load chapter {}: {}", chapter_id, e);
      return Html("<h1>Database Error</h1><p>Please refresh the page.</p>".to_string())
        .into_response();
    }
  };

  let items = match vocabulary_db::get_vocabulary_for_chapter(&conn, auth.user_id, chapter_id) {
    Ok(items) => items,
    Err(e) => {
      tracing::error!("Failed to load vocabulary for chapter {}: {}", chapter_id, e);
      return Html("<h1>Database Error</h1><p>Please refresh the page.</p>".to_string())
        .into_response();
    }
  };

  drop(conn);

  // The quiz runs over this snapshot; later edits to the chapter do
  // not affect it.
  let quiz = QuizSession::new(mode, &items);

  if quiz.state() == QuizState::Empty {
    let message = match mode {
      QuizMode::Vocabulary => "No vocabulary found in this chapter.",
      QuizMode::Kanji => "No vocabulary with kanji found in this chapter.",
    };
    let template = EmptyQuizTemplate {
      nav: NavContext::from_auth(&auth),
      chapter_id,
      chapter_name: chapter.name,
      quiz_title: mode.title(),
      message,
    };
    return Html(template.render().unwrap_or_default()).into_response();
  }

  let session_id = session::generate_session_id();
  let active = ActiveQuiz {
    chapter_id,
    chapter_name: chapter.name,
    quiz,
  };
  session::store_session(&session_id, active.clone());

  tracing::info!(
    "Quiz started: chapter {} mode {} with {} questions",
    chapter_id,
    mode.as_str(),
    active.quiz.total()
  );

  question_page(NavContext::from_auth(&auth), &session_id, &active, None)
}

/// POST /quiz/answer - Score one answer, then show the next question
/// or the report
pub async fn quiz_answer(auth: AuthContext, Form(form): Form<AnswerForm>) -> Response {
  let Some(mut active) = session::fetch_session(&form.session_id) else {
    return redirect_with_notice("/", "That quiz has expired. Start a new one from the chapter.")
      .into_response();
  };

  let Some(result) = active.quiz.submit_answer(&form.answer) else {
    // Terminal state: nothing left to answer. Drop the stale entry.
    session::remove_session(&form.session_id);
    return redirect_with_notice("/", "That quiz has expired. Start a new one from the chapter.")
      .into_response();
  };

  let nav = NavContext::from_auth(&auth);

  if active.quiz.state() == QuizState::Complete {
    session::remove_session(&form.session_id);
    let Some(report) = active.quiz.report() else {
      return redirect_with_notice("/", "That quiz has expired. Start a new one from the chapter.")
        .into_response();
    };
    let template = ReportTemplate {
      nav,
      chapter_id: active.chapter_id,
      chapter_name: active.chapter_name.clone(),
      quiz_title: active.quiz.mode().title(),
      mode: active.quiz.mode().as_str(),
      report,
    };
    return Html(template.render().unwrap_or_default()).into_response();
  }

  session::store_session(&form.session_id, active.clone());

  let feedback = Feedback {
    is_correct: result.is_correct,
    message: if result.is_correct {
      "Correct!".to_string()
    } else {
      format!("Incorrect. The correct answer was: {}", result.correct_answer)
    },
  };

  question_page(nav, &form.session_id, &active, Some(feedback))
}

/// POST /quiz/quit - Abandon the quiz and return to the chapter
pub async fn quiz_quit(_auth: AuthContext, Form(form): Form<QuitForm>) -> Redirect {
  let chapter_id = session::fetch_session(&form.session_id).map(|active| active.chapter_id);
  session::remove_session(&form.session_id);
  match chapter_id {
    Some(chapter_id) => Redirect::to(&format!("/chapter/{}", chapter_id)),
    None => Redirect::to("/"),
  }
}

fn question_page(
  nav: NavContext,
  session_id: &str,
  active: &ActiveQuiz,
  feedback: Option<Feedback>,
) -> Response {
  let Some(question) = active.quiz.current_question() else {
    return redirect_with_notice("/", "That quiz has expired. Start a new one from the chapter.")
      .into_response();
  };

  let template = QuestionTemplate {
    nav,
    session_id: session_id.to_string(),
    chapter_id: active.chapter_id,
    chapter_name: active.chapter_name.clone(),
    quiz_title: active.quiz.mode().title(),
    number: active.quiz.question_number(),
    total: active.quiz.total(),
    score: active.quiz.score(),
    heading: question.prompt_heading(),
    prompt: question.prompt_text().to_string(),
    prompt_class: question.prompt_class(),
    prompt_kanji: question.prompt_kanji().map(str::to_string),
    feedback,
  };
  Html(template.render().unwrap_or_default()).into_response()
}
