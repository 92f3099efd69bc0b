//! Chapter detail page and vocabulary CRUD handlers.
//!
//! The detail page renders the flip-card grid plus the add/edit form.
//! Edit mode is driven by an `?edit={id}` query parameter so the page
//! stays a plain server-rendered form.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::{not_found_response, redirect_with_error, redirect_with_notice, NavContext};
use crate::auth::AuthContext;
use crate::db::chapters as chapters_db;
use crate::db::vocabulary as vocabulary_db;
use crate::domain::{Chapter, VocabularyItem, WritingSystem};
use crate::filters;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "chapter.html")]
pub struct ChapterTemplate {
    pub nav: NavContext,
    pub chapter: Chapter,
    pub items: Vec<VocabularyItem>,
    /// Item whose values prefill the form, when editing
    pub editing: Option<VocabularyItem>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct ChapterPageQuery {
    #[serde(default)]
    pub edit: Option<String>,
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct VocabularyForm {
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub kanji: Option<String>,
    #[serde(default)]
    pub writing_system: String,
}

/// GET /chapter/{id} - Chapter detail: flip cards plus the add/edit form
pub async fn chapter_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(chapter_id): Path<i64>,
    Query(query): Query<ChapterPageQuery>,
) -> Response {
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

    let (items, load_error) =
        match vocabulary_db::get_vocabulary_for_chapter(&conn, auth.user_id, chapter_id) {
            Ok(items) => (items, None),
            Err(e) => {
                tracing::error!("Failed to load vocabulary for chapter {}: {}", chapter_id, e);
                (Vec::new(), Some("Failed to load vocabulary".to_string()))
            }
        };

    drop(conn);

    let editing = query
        .edit
        .as_deref()
        .and_then(|edit_id| items.iter().find(|item| item.id == edit_id).cloned());

    let template = ChapterTemplate {
        nav: NavContext::from_auth(&auth),
        chapter,
        items,
        editing,
        notice: query.notice,
        error: query.error.or(load_error),
    };
    Html(template.render().unwrap_or_default()).into_response()
}

/// POST /chapter/{id}/vocabulary - Add a vocabulary item
pub async fn create_vocabulary(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(chapter_id): Path<i64>,
    Form(form): Form<VocabularyForm>,
) -> Redirect {
    let back = format!("/chapter/{}", chapter_id);

    let meaning = form.meaning.trim();
    let reading = form.reading.trim();
    if meaning.is_empty() || reading.is_empty() {
        return redirect_with_error(&back, "Meaning and reading are required");
    }

    let writing_system =
        WritingSystem::from_str(&form.writing_system).unwrap_or(WritingSystem::Hiragana);
    let kanji = normalize_kanji(form.kanji.as_deref(), writing_system);

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return redirect_with_error(&back, "Database unavailable"),
    };

    // Adding into someone else's chapter behaves as not-found
    match chapters_db::get_chapter_by_id(&conn, auth.user_id, chapter_id) {
        Ok(Some(_)) => {}
        Ok(None) => return redirect_with_error("/", "Chapter not found"),
        Err(e) => {
            tracing::error!("Failed to check chapter {}: {}", chapter_id, e);
            return redirect_with_error(&back, "Failed to add vocabulary");
        }
    }

    let item = VocabularyItem::new(
        chapter_id,
        auth.user_id,
        meaning.to_string(),
        reading.to_string(),
        kanji,
        writing_system,
    );

    match vocabulary_db::insert_vocabulary(&conn, &item) {
        Ok(_) => redirect_with_notice(&back, "Vocabulary added"),
        Err(e) => {
            tracing::error!("Failed to add vocabulary to chapter {}: {}", chapter_id, e);
            redirect_with_error(&back, "Failed to add vocabulary")
        }
    }
}

/// POST /chapter/{id}/vocabulary/{vid}/update - Edit a vocabulary item
pub async fn update_vocabulary(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((chapter_id, item_id)): Path<(i64, String)>,
    Form(form): Form<VocabularyForm>,
) -> Redirect {
    let back = format!("/chapter/{}", chapter_id);

    let meaning = form.meaning.trim();
    let reading = form.reading.trim();
    if meaning.is_empty() || reading.is_empty() {
        return redirect_with_error(&back, "Meaning and reading are required");
    }

    let writing_system =
        WritingSystem::from_str(&form.writing_system).unwrap_or(WritingSystem::Hiragana);
    let kanji = normalize_kanji(form.kanji.as_deref(), writing_system);

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return redirect_with_error(&back, "Database unavailable"),
    };

    match vocabulary_db::update_vocabulary(
        &conn,
        auth.user_id,
        &item_id,
        meaning,
        reading,
        kanji.as_deref(),
        writing_system,
    ) {
        Ok(0) => redirect_with_error(&back, "Vocabulary not found"),
        Ok(_) => redirect_with_notice(&back, "Vocabulary updated"),
        Err(e) => {
            tracing::error!("Failed to update vocabulary {}: {}", item_id, e);
            redirect_with_error(&back, "Failed to update vocabulary")
        }
    }
}

/// POST /chapter/{id}/vocabulary/{vid}/delete - Remove a vocabulary item
pub async fn delete_vocabulary(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((chapter_id, item_id)): Path<(i64, String)>,
) -> Redirect {
    let back = format!("/chapter/{}", chapter_id);

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return redirect_with_error(&back, "Database unavailable"),
    };

    match vocabulary_db::delete_vocabulary(&conn, auth.user_id, &item_id) {
        Ok(0) => redirect_with_error(&back, "Vocabulary not found"),
        Ok(_) => redirect_with_notice(&back, "Vocabulary deleted"),
        Err(e) => {
            tracing::error!("Failed to delete vocabulary {}: {}", item_id, e);
            redirect_with_error(&back, "Failed to delete vocabulary")
        }
    }
}

/// The kanji field only applies to hiragana entries; katakana submissions
/// drop it. Blank input stores NULL.
fn normalize_kanji(kanji: Option<&str>, writing_system: WritingSystem) -> Option<String> {
    if writing_system == WritingSystem::Katakana {
        return None;
    }
    kanji
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}
