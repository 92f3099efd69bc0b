//! User, session, and reset-token persistence.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, Result};
use sha2::{Digest, Sha256};

// ==================== Users ====================

/// Create a new user, returns the user ID
pub fn create_user(conn: &Connection, email: &str, password_hash: &str) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![email, password_hash, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get user by email, returns (user_id, password_hash).
/// The email column collates NOCASE, so lookup is case-insensitive.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, password_hash FROM users WHERE email = ?1")?;
    let result = stmt.query_row(params![email], |row| Ok((row.get(0)?, row.get(1)?)));
    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if an email is already registered
pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Update user's last login timestamp
pub fn update_last_login(conn: &Connection, user_id: i64) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
        params![now, user_id],
    )?;
    Ok(())
}

/// Replace a user's password hash
pub fn update_user_password(conn: &Connection, user_id: i64, password_hash: &str) -> Result<usize> {
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE id = ?2",
        params![password_hash, user_id],
    )
}

// ==================== Sessions ====================

/// Create a new session
pub fn create_session(
    conn: &Connection,
    user_id: i64,
    session_id: &str,
    duration_hours: i64,
) -> Result<()> {
    let now = Utc::now();
    let expires = now + Duration::hours(duration_hours);
    conn.execute(
        "INSERT INTO sessions (id, user_id, created_at, expires_at, last_access_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session_id,
            user_id,
            now.to_rfc3339(),
            expires.to_rfc3339(),
            now.to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Validate session and get user info, returns (user_id, email)
pub fn get_session_user(conn: &Connection, session_id: &str) -> Result<Option<(i64, String)>> {
    let now = Utc::now().to_rfc3339();
    let mut stmt = conn.prepare(
        r#"
        SELECT u.id, u.email
        FROM sessions s
        JOIN users u ON s.user_id = u.id
        WHERE s.id = ?1 AND s.expires_at > ?2
    "#,
    )?;
    let result = stmt.query_row(params![session_id, now], |row| Ok((row.get(0)?, row.get(1)?)));
    match result {
        Ok((user_id, email)) => {
            // Update last access time
            let _ = conn.execute(
                "UPDATE sessions SET last_access_at = ?1 WHERE id = ?2",
                params![now, session_id],
            );
            Ok(Some((user_id, email)))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Delete a session (logout)
pub fn delete_session(conn: &Connection, session_id: &str) -> Result<()> {
    conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
    Ok(())
}

/// Delete all sessions for a user
pub fn delete_user_sessions(conn: &Connection, user_id: i64) -> Result<usize> {
    let count = conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
    Ok(count)
}

/// Cleanup expired sessions, returns count of deleted sessions
pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?;
    Ok(count)
}

// ==================== Password Resets ====================

/// Reset tokens are stored as SHA-256 digests, never in the clear.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Record a single-use reset token for a user
pub fn create_password_reset(
    conn: &Connection,
    user_id: i64,
    token_hash: &str,
    duration_hours: i64,
) -> Result<()> {
    let now = Utc::now();
    let expires = now + Duration::hours(duration_hours);
    conn.execute(
        "INSERT INTO password_resets (token_hash, user_id, created_at, expires_at, used) VALUES (?1, ?2, ?3, ?4, 0)",
        params![token_hash, user_id, now.to_rfc3339(), expires.to_rfc3339()],
    )?;
    Ok(())
}

/// Check a token without spending it, returns the user it belongs to
pub fn peek_password_reset(conn: &Connection, token_hash: &str) -> Result<Option<i64>> {
    let now = Utc::now().to_rfc3339();
    let result = conn.query_row(
        "SELECT user_id FROM password_resets WHERE token_hash = ?1 AND used = 0 AND expires_at > ?2",
        params![token_hash, now],
        |row| row.get(0),
    );
    match result {
        Ok(user_id) => Ok(Some(user_id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Spend a token, returns the user it belonged to. A spent or expired
/// token returns None.
pub fn consume_password_reset(conn: &Connection, token_hash: &str) -> Result<Option<i64>> {
    let user_id = peek_password_reset(conn, token_hash)?;
    if user_id.is_some() {
        conn.execute(
            "UPDATE password_resets SET used = 1 WHERE token_hash = ?1",
            params![token_hash],
        )?;
    }
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;

    #[test]
    fn test_create_and_get_user() {
        let env = TestEnv::new();
        let id = create_user(&env.conn, "a@example.com", "hash").unwrap();

        let (found_id, hash) = get_user_by_email(&env.conn, "a@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(found_id, id);
        assert_eq!(hash, "hash");
    }

    #[test]
    fn test_email_lookup_is_case_insensitive() {
        let env = TestEnv::new();
        create_user(&env.conn, "Mixed@Example.com", "hash").unwrap();

        assert!(email_exists(&env.conn, "mixed@example.com").unwrap());
        assert!(get_user_by_email(&env.conn, "MIXED@EXAMPLE.COM")
            .unwrap()
            .is_some());
        assert!(get_user_by_email(&env.conn, "other@example.com")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let env = TestEnv::new();
        create_user(&env.conn, "a@example.com", "hash").unwrap();
        assert!(create_user(&env.conn, "A@EXAMPLE.COM", "hash").is_err());
    }

    #[test]
    fn test_session_roundtrip() {
        let env = TestEnv::new();
        let user_id = create_user(&env.conn, "a@example.com", "hash").unwrap();

        create_session(&env.conn, user_id, "session-1", 24).unwrap();
        let (found_id, email) = get_session_user(&env.conn, "session-1").unwrap().unwrap();
        assert_eq!(found_id, user_id);
        assert_eq!(email, "a@example.com");

        assert!(get_session_user(&env.conn, "no-such-session")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_expired_session_is_invalid() {
        let env = TestEnv::new();
        let user_id = create_user(&env.conn, "a@example.com", "hash").unwrap();

        create_session(&env.conn, user_id, "stale", -1).unwrap();
        assert!(get_session_user(&env.conn, "stale").unwrap().is_none());

        let removed = cleanup_expired_sessions(&env.conn).unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_delete_session() {
        let env = TestEnv::new();
        let user_id = create_user(&env.conn, "a@example.com", "hash").unwrap();

        create_session(&env.conn, user_id, "session-1", 24).unwrap();
        delete_session(&env.conn, "session-1").unwrap();
        assert!(get_session_user(&env.conn, "session-1").unwrap().is_none());
    }

    #[test]
    fn test_delete_user_sessions_removes_all() {
        let env = TestEnv::new();
        let user_id = create_user(&env.conn, "a@example.com", "hash").unwrap();

        create_session(&env.conn, user_id, "one", 24).unwrap();
        create_session(&env.conn, user_id, "two", 24).unwrap();
        assert_eq!(delete_user_sessions(&env.conn, user_id).unwrap(), 2);
        assert!(get_session_user(&env.conn, "one").unwrap().is_none());
    }

    #[test]
    fn test_password_reset_token_is_single_use() {
        let env = TestEnv::new();
        let user_id = create_user(&env.conn, "a@example.com", "hash").unwrap();

        let token_hash = hash_token("reset-token");
        create_password_reset(&env.conn, user_id, &token_hash, 1).unwrap();

        assert_eq!(peek_password_reset(&env.conn, &token_hash).unwrap(), Some(user_id));
        // Peeking does not spend the token.
        assert_eq!(peek_password_reset(&env.conn, &token_hash).unwrap(), Some(user_id));

        assert_eq!(
            consume_password_reset(&env.conn, &token_hash).unwrap(),
            Some(user_id)
        );
        assert_eq!(consume_password_reset(&env.conn, &token_hash).unwrap(), None);
        assert_eq!(peek_password_reset(&env.conn, &token_hash).unwrap(), None);
    }

    #[test]
    fn test_expired_reset_token_is_invalid() {
        let env = TestEnv::new();
        let user_id = create_user(&env.conn, "a@example.com", "hash").unwrap();

        let token_hash = hash_token("stale-token");
        create_password_reset(&env.conn, user_id, &token_hash, -1).unwrap();
        assert_eq!(consume_password_reset(&env.conn, &token_hash).unwrap(), None);
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("token");
        let b = hash_token("token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_token("other"));
    }

    #[test]
    fn test_update_user_password() {
        let env = TestEnv::new();
        let user_id = create_user(&env.conn, "a@example.com", "old").unwrap();

        assert_eq!(update_user_password(&env.conn, user_id, "new").unwrap(), 1);
        let (_, hash) = get_user_by_email(&env.conn, "a@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(hash, "new");
    }
}
