//! Credential check and server-validated sessions.
//!
//! The dashboard gates compare submitted credentials against a
//! configured list and hand out an opaque token backed by a session
//! row. A token is only valid while its row exists and is younger than
//! the configured TTL; anything else is treated as logged out and the
//! row is purged.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use intake_core::{Session, SessionRole};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::StoreError;

/// One allowed identity/password pair for a dashboard role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub password: String,
    pub role: SessionRole,
}

/// The seed list the deployment starts with. Replace via configuration.
pub fn default_credentials() -> Vec<Credential> {
    vec![
        Credential {
            identity: "admin@clinic.example".to_string(),
            password: "admin#2024".to_string(),
            role: SessionRole::Admin,
        },
        Credential {
            identity: "dr.ahmed@clinic.example".to_string(),
            password: "doctor#2024".to_string(),
            role: SessionRole::Doctor,
        },
        Credential {
            identity: "dr.sara@clinic.example".to_string(),
            password: "doctor#2024".to_string(),
            role: SessionRole::Doctor,
        },
    ]
}

/// Check credentials and issue a session on match. A mismatch returns
/// `None` and leaves no trace beyond a warning log: no lockout, no
/// rate limiting.
pub fn login(
    conn: &Connection,
    credentials: &[Credential],
    identity: &str,
    password: &str,
    role: SessionRole,
) -> Result<Option<Session>, StoreError> {
    let matched = credentials.iter().any(|cred| {
        cred.role == role && cred.identity == identity && cred.password == password
    });
    if !matched {
        tracing::warn!(identity, role = role.as_str(), "login denied");
        return Ok(None);
    }

    let session = Session {
        token: Uuid::new_v4().to_string(),
        identity: identity.to_string(),
        role,
        issued_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO sessions (token, identity, role, issued_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            session.token,
            session.identity,
            session.role.as_str(),
            session.issued_at.to_rfc3339(),
        ],
    )?;
    tracing::info!(identity, role = role.as_str(), "session issued");
    Ok(Some(session))
}

/// Resolve a token to its session while fresh. Expired, unknown or
/// malformed sessions are deleted and reported as logged out.
pub fn verify(
    conn: &Connection,
    token: &str,
    ttl_hours: u32,
) -> Result<Option<Session>, StoreError> {
    let row = conn
        .query_row(
            "SELECT identity, role, issued_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError::from(other)),
        })?;

    let Some((identity, role, issued_at)) = row else {
        return Ok(None);
    };

    let parsed = SessionRole::from_str(&role).ok().zip(
        DateTime::parse_from_rfc3339(&issued_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
    );

    let session = match parsed {
        Some((role, issued_at)) => Session {
            token: token.to_string(),
            identity,
            role,
            issued_at,
        },
        None => {
            // Malformed row: drop it and fall back to logged-out.
            tracing::warn!(token, "malformed session row purged");
            logout(conn, token)?;
            return Ok(None);
        }
    };

    if session.is_expired(Utc::now(), ttl_hours) {
        tracing::info!(identity = %session.identity, "session expired");
        logout(conn, token)?;
        return Ok(None);
    }

    Ok(Some(session))
}

/// Delete a session row. Unknown tokens are a no-op.
pub fn logout(conn: &Connection, token: &str) -> Result<(), StoreError> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_count(conn: &Connection) -> u32 {
        conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn wrong_credentials_leave_no_session() {
        let conn = crate::open_in_memory().unwrap();
        let creds = default_credentials();

        let denied = login(
            &conn,
            &creds,
            "admin@clinic.example",
            "wrong-password",
            SessionRole::Admin,
        )
        .unwrap();
        assert!(denied.is_none());

        let wrong_role = login(
            &conn,
            &creds,
            "admin@clinic.example",
            "admin#2024",
            SessionRole::Doctor,
        )
        .unwrap();
        assert!(wrong_role.is_none());

        assert_eq!(session_count(&conn), 0);
    }

    #[test]
    fn issued_session_verifies_until_logout() {
        let conn = crate::open_in_memory().unwrap();
        let creds = default_credentials();

        let session = login(
            &conn,
            &creds,
            "dr.ahmed@clinic.example",
            "doctor#2024",
            SessionRole::Doctor,
        )
        .unwrap()
        .unwrap();

        let verified = verify(&conn, &session.token, 24).unwrap().unwrap();
        assert_eq!(verified.identity, "dr.ahmed@clinic.example");
        assert_eq!(verified.role, SessionRole::Doctor);

        logout(&conn, &session.token).unwrap();
        assert!(verify(&conn, &session.token, 24).unwrap().is_none());
    }

    #[test]
    fn stale_session_is_purged_on_verification() {
        let conn = crate::open_in_memory().unwrap();
        let issued_at = Utc::now() - chrono::Duration::hours(25);
        conn.execute(
            "INSERT INTO sessions (token, identity, role, issued_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                "stale-token",
                "admin@clinic.example",
                "admin",
                issued_at.to_rfc3339()
            ],
        )
        .unwrap();

        assert!(verify(&conn, "stale-token", 24).unwrap().is_none());
        assert_eq!(session_count(&conn), 0);
    }

    #[test]
    fn malformed_session_row_is_purged() {
        let conn = crate::open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO sessions (token, identity, role, issued_at) VALUES (?1, ?2, ?3, ?4)",
            params!["bad-token", "admin@clinic.example", "admin", "not-a-date"],
        )
        .unwrap();

        assert!(verify(&conn, "bad-token", 24).unwrap().is_none());
        assert_eq!(session_count(&conn), 0);
    }

    #[test]
    fn unknown_token_is_logged_out() {
        let conn = crate::open_in_memory().unwrap();
        assert!(verify(&conn, "never-issued", 24).unwrap().is_none());
    }
}
