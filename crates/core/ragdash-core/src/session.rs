//! Server-side sessions for the admin dashboard
//!
//! A session only exists once the admin has logged in. The browser holds a
//! cookie of the form `<session id>.<hex HMAC-SHA256 of the id>`, signed with
//! the configured session secret. Lifetime is fixed from creation; activity
//! does not extend it.

use crate::{DashError, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "ragdash.sid";

/// A live session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub authenticated: bool,
    pub created_at: Instant,
}

/// In-memory session store
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    secret: Arc<Vec<u8>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            secret: Arc::new(secret.as_bytes().to_vec()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| DashError::config(format!("Invalid session secret: {}", e)))
    }

    fn sign(&self, id: &str) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(id.as_bytes());
        Ok(format!("{}.{}", id, hex::encode(mac.finalize().into_bytes())))
    }

    /// Session id from a cookie value, if the signature checks out
    fn verify(&self, cookie_value: &str) -> Option<String> {
        let (id, signature) = cookie_value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac().ok()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id.to_string())
    }

    /// Start an authenticated session and return the signed cookie value
    pub async fn create_authenticated(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let cookie_value = self.sign(&id)?;
        let session = Session {
            id: id.clone(),
            authenticated: true,
            created_at: Instant::now(),
        };
        self.sessions.write().await.insert(id, session);
        debug!("Session created");
        Ok(cookie_value)
    }

    /// Look up a live session. Expired sessions are removed on the way.
    pub async fn lookup(&self, cookie_value: &str) -> Option<Session> {
        let Some(id) = self.verify(cookie_value) else {
            warn!("Rejected session cookie with a bad signature");
            return None;
        };

        let session = self.sessions.read().await.get(&id).cloned()?;
        if session.created_at.elapsed() >= self.ttl {
            self.sessions.write().await.remove(&id);
            debug!("Session expired");
            return None;
        }
        Some(session)
    }

    pub async fn is_authenticated(&self, cookie_value: &str) -> bool {
        self.lookup(cookie_value)
            .await
            .map(|s| s.authenticated)
            .unwrap_or(false)
    }

    /// Destroy the session behind a cookie. Returns whether one existed.
    pub async fn destroy(&self, cookie_value: &str) -> bool {
        match self.verify(cookie_value) {
            Some(id) => self.sessions.write().await.remove(&id).is_some(),
            None => false,
        }
    }

    /// Drop every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, s| s.created_at.elapsed() < ttl);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// The configured admin identity
#[derive(Clone)]
pub struct AdminIdentity {
    username_hash: Option<String>,
    password_hash: Option<String>,
}

impl AdminIdentity {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Self {
        Self {
            username_hash: username.map(Self::hash),
            password_hash: password.map(Self::hash),
        }
    }

    fn hash(value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Check submitted credentials. Always false when no identity is configured.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match (&self.username_hash, &self.password_hash) {
            (Some(user), Some(pass)) => {
                // Evaluate both so timing does not reveal which field was wrong.
                let user_ok = *user == Self::hash(username);
                let pass_ok = *pass == Self::hash(password);
                user_ok & pass_ok
            }
            _ => false,
        }
    }
}

/// Find a cookie in a `Cookie` request header value
pub fn parse_cookie_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(value: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        value,
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value clearing the session cookie
pub fn expired_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}
