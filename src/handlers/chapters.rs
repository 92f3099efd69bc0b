//! Chapter list and chapter CRUD handlers.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::{redirect_with_error, redirect_with_notice, NavContext};
use crate::auth::AuthContext;
use crate::db::chapters as chapters_db;
use crate::domain::Chapter;
use crate::filters;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: NavContext,
    pub chapters: Vec<Chapter>,
    /// Chapter whose name is being edited inline, if any
    pub renaming: Option<i64>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct IndexQuery {
    #[serde(default)]
    pub rename: Option<i64>,
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct ChapterForm {
    #[serde(default)]
    pub name: String,
}

/// GET / - Chapter list (home)
pub async fn index(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<IndexQuery>,
) -> Response {
    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => {
            return Html("<h1>Database Error</h1><p>Please refresh the page.</p>".to_string())
                .into_response()
        }
    };

    let (chapters, load_error) = match chapters_db::get_chapters_for_user(&conn, auth.user_id) {
        Ok(chapters) => (chapters, None),
        Err(e) => {
            tracing::error!("Failed to load chapters for user {}: {}", auth.user_id, e);
            (Vec::new(), Some("Failed to load chapters".to_string()))
        }
    };

    drop(conn);

    let template = IndexTemplate {
        nav: NavContext::from_auth(&auth),
        chapters,
        renaming: query.rename,
        notice: query.notice,
        error: query.error.or(load_error),
    };
    Html(template.render().unwrap_or_default()).into_response()
}

/// POST /chapters - Create a chapter
pub async fn create_chapter(
    State(state): State<AppState>,
    auth: AuthContext,
    Form(form): Form<ChapterForm>,
) -> Redirect {
    let name = form.name.trim();
    if name.is_empty() {
        return redirect_with_error("/", "Chapter name cannot be empty");
    }

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return redirect_with_error("/", "Database unavailable"),
    };

    let chapter = Chapter::new(auth.user_id, name.to_string());
    match chapters_db::insert_chapter(&conn, &chapter) {
        Ok(_) => redirect_with_notice("/", "Chapter added"),
        Err(e) => {
            tracing::error!("Failed to create chapter for user {}: {}", auth.user_id, e);
            redirect_with_error("/", "Failed to create chapter")
        }
    }
}

/// POST /chapters/{id}/rename - Rename a chapter
pub async fn rename_chapter(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(chapter_id): Path<i64>,
    Form(form): Form<ChapterForm>,
) -> Redirect {
    let name = form.name.trim();
    if name.is_empty() {
        return redirect_with_error("/", "Chapter name cannot be empty");
    }

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return redirect_with_error("/", "Database unavailable"),
    };

    match chapters_db::rename_chapter(&conn, auth.user_id, chapter_id, name) {
        Ok(0) => redirect_with_error("/", "Chapter not found"),
        Ok(_) => redirect_with_notice("/", "Chapter updated"),
        Err(e) => {
            tracing::error!("Failed to rename chapter {}: {}", chapter_id, e);
            redirect_with_error("/", "Failed to rename chapter")
        }
    }
}

/// POST /chapters/{id}/delete - Delete a chapter and its vocabulary
pub async fn delete_chapter(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(chapter_id): Path<i64>,
) -> Redirect {
    let mut conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return redirect_with_error("/", "Database unavailable"),
    };

    match chapters_db::delete_chapter(&mut conn, auth.user_id, chapter_id) {
        Ok(0) => redirect_with_error("/", "Chapter not found"),
        Ok(_) => redirect_with_notice("/", "Chapter deleted"),
        Err(e) => {
            tracing::error!("Failed to delete chapter {}: {}", chapter_id, e);
            redirect_with_error("/", "Failed to delete chapter")
        }
    }
}
