pub mod chapters;
pub mod quiz;
pub mod vocabulary;

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AuthContext, OptionalAuth};
use crate::filters;
use crate::state::AppState;

/// Signed-in user info for the shared navigation bar
#[derive(Default)]
pub struct NavContext {
  pub email: String,
}

impl NavContext {
  pub fn from_auth(auth: &AuthContext) -> Self {
    Self {
      email: auth.email.clone(),
    }
  }
}

/// Redirect carrying a notice flash banner
pub(crate) fn redirect_with_notice(path: &str, notice: &str) -> Redirect {
  Redirect::to(&format!("{}?notice={}", path, urlencoding::encode(notice)))
}

/// Redirect carrying an error flash banner
pub(crate) fn redirect_with_error(path: &str, error: &str) -> Redirect {
  Redirect::to(&format!("{}?error={}", path, urlencoding::encode(error)))
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
  pub nav: NavContext,
}

/// Render the 404 page
pub(crate) fn not_found_response(nav: NavContext) -> Response {
  let template = NotFoundTemplate { nav };
  (
    StatusCode::NOT_FOUND,
    Html(template.render().unwrap_or_default()),
  )
    .into_response()
}

/// Catch-all 404 page
pub async fn not_found(OptionalAuth(auth): OptionalAuth) -> Response {
  let nav = auth.map(|a| NavContext::from_auth(&a)).unwrap_or_default();
  not_found_response(nav)
}

/// Build the application router. Tests mount this directly.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(chapters::index))
    .route("/auth", get(auth::auth_page))
    .route("/auth/login", post(auth::login_submit))
    .route("/auth/register", post(auth::register_submit))
    .route("/auth/logout", post(auth::logout))
    .route("/auth/forgot", get(auth::forgot_page).post(auth::forgot_submit))
    .route("/auth/reset", get(auth::reset_page).post(auth::reset_submit))
    .route("/chapters", post(chapters::create_chapter))
    .route("/chapters/{id}/rename", post(chapters::rename_chapter))
    .route("/chapters/{id}/delete", post(chapters::delete_chapter))
    .route("/chapter/{id}", get(vocabulary::chapter_page))
    .route("/chapter/{id}/vocabulary", post(vocabulary::create_vocabulary))
    .route(
      "/chapter/{id}/vocabulary/{vid}/update",
      post(vocabulary::update_vocabulary),
    )
    .route(
      "/chapter/{id}/vocabulary/{vid}/delete",
      post(vocabulary::delete_vocabulary),
    )
    .route("/chapter/{id}/quiz", get(quiz::quiz_start))
    .route("/quiz/answer", post(quiz::quiz_answer))
    .route("/quiz/quit", post(quiz::quiz_quit))
    .nest_service("/static", ServeDir::new("static"))
    .fallback(not_found)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
