//! Authentication handlers for sign-in, sign-up, logout, and password resets.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::db as auth_db;
use super::middleware::{OptionalAuth, SESSION_COOKIE_NAME};
use super::password;
use crate::filters;
use crate::session::generate_session_id;
use crate::state::AppState;

/// Session duration in hours (1 week)
const SESSION_DURATION_HOURS: i64 = 24 * 7;

/// Reset links expire after an hour
const PASSWORD_RESET_EXPIRY_HOURS: i64 = 1;

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct AuthTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Open the page on the sign-up tab instead of sign-in
    pub show_register: bool,
}

#[derive(Template)]
#[template(path = "auth/forgot.html")]
pub struct ForgotTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/reset.html")]
pub struct ResetTemplate {
    pub token: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct AuthPageQuery {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetForm {
    pub token: String,
    pub password: String,
}

/// GET /auth - Show the sign-in / sign-up page
pub async fn auth_page(
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<AuthPageQuery>,
) -> impl IntoResponse {
    // Already signed in, nothing to do here
    if auth.is_some() {
        return Redirect::to("/").into_response();
    }
    let template = AuthTemplate {
        error: query.error,
        notice: query.notice,
        show_register: false,
    };
    Html(template.render().unwrap_or_default()).into_response()
}

/// POST /auth/login - Process sign-in
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    let email = form.email.trim();

    // Validate input
    if email.is_empty() || form.password.is_empty() {
        let template = AuthTemplate {
            error: Some("Email and password are required".to_string()),
            notice: None,
            show_register: false,
        };
        return (jar, Html(template.render().unwrap_or_default())).into_response();
    }

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => {
            let template = AuthTemplate {
                error: Some("Database error".to_string()),
                notice: None,
                show_register: false,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
    };

    // Look up user
    let (user_id, password_hash) = match auth_db::get_user_by_email(&conn, email) {
        Ok(Some(user)) => user,
        Ok(None) => {
            let template = AuthTemplate {
                error: Some("Invalid email or password".to_string()),
                notice: None,
                show_register: false,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
        Err(_) => {
            let template = AuthTemplate {
                error: Some("Database error".to_string()),
                notice: None,
                show_register: false,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
    };

    // Verify password
    if !password::verify_password(&form.password, &password_hash) {
        let template = AuthTemplate {
            error: Some("Invalid email or password".to_string()),
            notice: None,
            show_register: false,
        };
        return (jar, Html(template.render().unwrap_or_default())).into_response();
    }

    // Update last login time (log but don't fail on error)
    if let Err(e) = auth_db::update_last_login(&conn, user_id) {
        tracing::warn!("Failed to update last login for user {}: {}", user_id, e);
    }

    // Create session
    let session_id = generate_session_id();
    if auth_db::create_session(&conn, user_id, &session_id, SESSION_DURATION_HOURS).is_err() {
        let template = AuthTemplate {
            error: Some("Failed to create session".to_string()),
            notice: None,
            show_register: false,
        };
        return (jar, Html(template.render().unwrap_or_default())).into_response();
    }

    drop(conn);

    (jar.add(session_cookie(session_id)), Redirect::to("/")).into_response()
}

/// POST /auth/register - Process sign-up
pub async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> impl IntoResponse {
    let email = form.email.trim().to_string();

    // Validate email
    if !is_valid_email(&email) {
        let template = AuthTemplate {
            error: Some("Please enter a valid email address".to_string()),
            notice: None,
            show_register: true,
        };
        return (jar, Html(template.render().unwrap_or_default())).into_response();
    }

    // Validate password
    if form.password.len() < 6 {
        let template = AuthTemplate {
            error: Some("Password must be at least 6 characters".to_string()),
            notice: None,
            show_register: true,
        };
        return (jar, Html(template.render().unwrap_or_default())).into_response();
    }

    // Hash password for storage
    let password_hash = match password::hash_password(&form.password) {
        Ok(hash) => hash,
        Err(_) => {
            let template = AuthTemplate {
                error: Some("Failed to process password".to_string()),
                notice: None,
                show_register: true,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
    };

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => {
            let template = AuthTemplate {
                error: Some("Database error".to_string()),
                notice: None,
                show_register: true,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
    };

    // Check if email is already registered
    match auth_db::email_exists(&conn, &email) {
        Ok(true) => {
            let template = AuthTemplate {
                error: Some("An account with that email already exists".to_string()),
                notice: None,
                show_register: true,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
        Err(_) => {
            let template = AuthTemplate {
                error: Some("Database error".to_string()),
                notice: None,
                show_register: true,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
        Ok(false) => {}
    }

    // Create user
    let user_id = match auth_db::create_user(&conn, &email, &password_hash) {
        Ok(id) => id,
        Err(_) => {
            let template = AuthTemplate {
                error: Some("Failed to create account".to_string()),
                notice: None,
                show_register: true,
            };
            return (jar, Html(template.render().unwrap_or_default())).into_response();
        }
    };

    // Create session for auto-login
    let session_id = generate_session_id();
    if let Err(e) = auth_db::create_session(&conn, user_id, &session_id, SESSION_DURATION_HOURS) {
        tracing::error!("Failed to create session after registration: {}", e);
        let template = AuthTemplate {
            error: None,
            notice: Some("Account created. Please sign in.".to_string()),
            show_register: false,
        };
        return (jar, Html(template.render().unwrap_or_default())).into_response();
    }

    drop(conn);

    tracing::info!("New account registered: {}", email);

    (jar.add(session_cookie(session_id)), Redirect::to("/")).into_response()
}

/// POST /auth/logout - Log out and clear session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    // Get session from cookie and delete it
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        let session_id = cookie.value();
        if let Ok(conn) = state.db.lock() {
            if let Err(e) = auth_db::delete_session(&conn, session_id) {
                tracing::warn!("Failed to delete session during logout: {}", e);
            }
        }
    }

    // Remove session cookie
    let expired = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build();

    (jar.remove(expired), Redirect::to("/auth"))
}

/// GET /auth/forgot - Show the password reset request page
pub async fn forgot_page() -> Html<String> {
    let template = ForgotTemplate {
        error: None,
        notice: None,
    };
    Html(template.render().unwrap_or_default())
}

/// POST /auth/forgot - Issue a reset token.
/// Responds identically whether or not the email is registered, so the
/// form cannot be used to probe for accounts.
pub async fn forgot_submit(
    State(state): State<AppState>,
    Form(form): Form<ForgotForm>,
) -> impl IntoResponse {
    let email = form.email.trim();

    let sent = ForgotTemplate {
        error: None,
        notice: Some("Password reset email sent. Check your email for the password reset link.".to_string()),
    };

    if email.is_empty() {
        let template = ForgotTemplate {
            error: Some("Please enter your email address".to_string()),
            notice: None,
        };
        return Html(template.render().unwrap_or_default());
    }

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => {
            let template = ForgotTemplate {
                error: Some("Database error".to_string()),
                notice: None,
            };
            return Html(template.render().unwrap_or_default());
        }
    };

    let user_id = match auth_db::get_user_by_email(&conn, email) {
        Ok(Some((id, _))) => id,
        Ok(None) => return Html(sent.render().unwrap_or_default()),
        Err(_) => {
            let template = ForgotTemplate {
                error: Some("Database error".to_string()),
                notice: None,
            };
            return Html(template.render().unwrap_or_default());
        }
    };

    let token = generate_session_id();
    let token_hash = auth_db::hash_token(&token);
    if let Err(e) =
        auth_db::create_password_reset(&conn, user_id, &token_hash, PASSWORD_RESET_EXPIRY_HOURS)
    {
        tracing::error!("Failed to store password reset for user {}: {}", user_id, e);
        let template = ForgotTemplate {
            error: Some("Database error".to_string()),
            notice: None,
        };
        return Html(template.render().unwrap_or_default());
    }

    drop(conn);

    // No mail transport is wired up; the link lands in the server log
    // so an operator can pass it on.
    tracing::info!(
        "Password reset requested for {}: /auth/reset?token={}",
        email,
        token
    );

    Html(sent.render().unwrap_or_default())
}

/// GET /auth/reset?token=... - Show the new-password form
pub async fn reset_page(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> impl IntoResponse {
    let invalid = Redirect::to(&format!(
        "/auth?error={}",
        urlencoding::encode("That password reset link is invalid or has expired.")
    ));

    if query.token.is_empty() {
        return invalid.into_response();
    }

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return invalid.into_response(),
    };

    // Check the token without spending it; the form still has to be submitted.
    let token_hash = auth_db::hash_token(&query.token);
    match auth_db::peek_password_reset(&conn, &token_hash) {
        Ok(Some(_)) => {}
        _ => return invalid.into_response(),
    }

    let template = ResetTemplate {
        token: query.token,
        error: None,
    };
    Html(template.render().unwrap_or_default()).into_response()
}

/// POST /auth/reset - Set the new password and spend the token
pub async fn reset_submit(
    State(state): State<AppState>,
    Form(form): Form<ResetForm>,
) -> impl IntoResponse {
    let invalid = Redirect::to(&format!(
        "/auth?error={}",
        urlencoding::encode("That password reset link is invalid or has expired.")
    ));

    // Validate password before spending the single-use token
    if form.password.len() < 6 {
        let template = ResetTemplate {
            token: form.token,
            error: Some("Password must be at least 6 characters".to_string()),
        };
        return Html(template.render().unwrap_or_default()).into_response();
    }

    let password_hash = match password::hash_password(&form.password) {
        Ok(hash) => hash,
        Err(_) => {
            let template = ResetTemplate {
                token: form.token,
                error: Some("Failed to process password".to_string()),
            };
            return Html(template.render().unwrap_or_default()).into_response();
        }
    };

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(_) => return invalid.into_response(),
    };

    let token_hash = auth_db::hash_token(&form.token);
    let user_id = match auth_db::consume_password_reset(&conn, &token_hash) {
        Ok(Some(id)) => id,
        _ => return invalid.into_response(),
    };

    if auth_db::update_user_password(&conn, user_id, &password_hash).is_err() {
        let template = ResetTemplate {
            token: form.token,
            error: Some("Database error".to_string()),
        };
        return Html(template.render().unwrap_or_default()).into_response();
    }

    // Anything signed in with the old password gets kicked out.
    if let Err(e) = auth_db::delete_user_sessions(&conn, user_id) {
        tracing::warn!("Failed to clear sessions for user {}: {}", user_id, e);
    }

    drop(conn);

    Redirect::to(&format!(
        "/auth?notice={}",
        urlencoding::encode("Password updated! Please sign in.")
    ))
    .into_response()
}

fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(time::Duration::hours(SESSION_DURATION_HOURS))
        .build()
}

/// Validate email: one @ with a dotted domain, no whitespace
fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
