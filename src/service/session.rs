//! Server-side sessions and their logout tokens.
//!
//! A session is opened at login and referenced by the `sid` claim of the
//! access token. Logging out needs a short-lived, single-use token issued for
//! that session.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

use super::crypto;

struct LogoutToken {
    value: String,
    expires_at: DateTime<Utc>,
}

struct Session {
    account_id: Uuid,
    expires_at: DateTime<Utc>,
    logout_token: Option<LogoutToken>,
}

pub struct SessionRegistry {
    logout_ttl: Duration,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    pub fn new(logout_ttl: Duration) -> Self {
        Self {
            logout_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Session>>, AppError> {
        self.sessions.lock().map_err(|_| AppError::InternalError)
    }

    pub fn open(&self, account_id: Uuid, expires_at: DateTime<Utc>) -> Result<Uuid, AppError> {
        let sid = Uuid::new_v4();
        let mut sessions = self.lock()?;
        let now = Utc::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            sid,
            Session {
                account_id,
                expires_at,
                logout_token: None,
            },
        );
        Ok(sid)
    }

    pub fn is_active(&self, sid: Uuid, account_id: Uuid, now: DateTime<Utc>) -> bool {
        match self.lock() {
            Ok(sessions) => sessions
                .get(&sid)
                .map_or(false, |s| s.account_id == account_id && s.expires_at > now),
            Err(_) => false,
        }
    }

    pub fn issue_logout_token(
        &self,
        sid: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(&sid)
            .filter(|s| s.expires_at > now)
            .ok_or_else(|| AppError::Unauthorized("session has ended".to_string()))?;
        let token = LogoutToken {
            value: crypto::random_token(24),
            expires_at: now + self.logout_ttl,
        };
        let issued = (token.value.clone(), token.expires_at);
        session.logout_token = Some(token);
        Ok(issued)
    }

    /// Ends the session when `token` matches its pending logout token.
    /// The token is consumed either way.
    pub fn close(&self, sid: Uuid, token: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(&sid)
            .ok_or_else(|| AppError::Unauthorized("session has ended".to_string()))?;
        let pending = session.logout_token.take().ok_or_else(|| {
            AppError::forbidden("Logout verification failed. Request a logout token first.")
        })?;
        if pending.expires_at <= now {
            warn!("expired logout token used for session {}", sid);
            return Err(AppError::forbidden("Logout token expired. Please try again."));
        }
        if pending.value != token {
            warn!("logout token mismatch for session {}", sid);
            return Err(AppError::forbidden(
                "Logout verification failed. Security tokens do not match.",
            ));
        }
        let account_id = session.account_id;
        sessions.remove(&sid);
        info!("session {} of account {} closed", sid, account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Duration::minutes(5))
    }

    #[test]
    fn logout_with_issued_token_ends_session() {
        let reg = registry();
        let account = Uuid::new_v4();
        let now = Utc::now();
        let sid = reg.open(account, now + Duration::hours(1)).unwrap();
        let (token, _) = reg.issue_logout_token(sid, now).unwrap();

        reg.close(sid, &token, now).unwrap();

        assert!(!reg.is_active(sid, account, now));
    }

    #[test]
    fn logout_without_token_is_refused() {
        let reg = registry();
        let account = Uuid::new_v4();
        let now = Utc::now();
        let sid = reg.open(account, now + Duration::hours(1)).unwrap();

        assert!(matches!(reg.close(sid, "guess", now), Err(AppError::Forbidden(_))));
        assert!(reg.is_active(sid, account, now));
    }

    #[test]
    fn tokens_are_single_use_and_expire() {
        let reg = registry();
        let account = Uuid::new_v4();
        let now = Utc::now();
        let sid = reg.open(account, now + Duration::hours(1)).unwrap();

        let (token, _) = reg.issue_logout_token(sid, now).unwrap();
        assert!(reg.close(sid, "wrong", now).is_err());
        assert!(reg.close(sid, &token, now).is_err());

        let (token, expires_at) = reg.issue_logout_token(sid, now).unwrap();
        assert!(reg.close(sid, &token, expires_at + Duration::seconds(1)).is_err());
        assert!(reg.is_active(sid, account, now));
    }

    #[test]
    fn session_belongs_to_its_account() {
        let reg = registry();
        let now = Utc::now();
        let sid = reg.open(Uuid::new_v4(), now + Duration::hours(1)).unwrap();

        assert!(!reg.is_active(sid, Uuid::new_v4(), now));
    }
}
