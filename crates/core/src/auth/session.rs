use std::collections::HashSet;
use std::sync::Mutex;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::events::{EventBus, FolioEvent};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("no valid session")]
    InvalidSession,

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hash error: {0}")]
    PasswordHash(String),
}

/// Credentials of the single operator account plus token settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
    pub jwt_secret: String,
    pub session_ttl: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: Uuid,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub id: Uuid,
}

/// Issues and validates operator sessions as HS256 JWTs. Sign-out revokes
/// the token id for the lifetime of the process.
pub struct AuthService {
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    revoked: Mutex<HashSet<Uuid>>,
    events: EventBus,
}

impl AuthService {
    pub fn new(config: AuthConfig, events: EventBus) -> Self {
        if config.admin_email.is_none() || config.admin_password_hash.is_none() {
            tracing::warn!("no operator credentials configured, sign-in is disabled");
        }
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            config,
            revoked: Mutex::new(HashSet::new()),
            events,
        }
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let (Some(admin_email), Some(hash)) = (
            self.config.admin_email.as_deref(),
            self.config.admin_password_hash.as_deref(),
        ) else {
            return Err(AuthError::InvalidCredentials);
        };

        // argon2 runs whether or not the email matches.
        let password_ok = verify_password(password, hash)?;
        let email_ok = admin_email.eq_ignore_ascii_case(email.trim());
        if !(email_ok && password_ok) {
            tracing::info!("rejected sign-in attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let expires_at = now + self.config.session_ttl;
        let claims = Claims {
            sub: admin_email.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;

        tracing::info!(email = %claims.sub, "operator signed in");
        self.events.publish(FolioEvent::SignedIn {
            email: claims.sub.clone(),
            at: now,
        });

        Ok(Session {
            token,
            email: claims.sub,
            expires_at,
            id: claims.jti,
        })
    }

    /// The session behind `token`, or `None` when it is malformed, expired
    /// or signed out.
    pub fn get_session(&self, token: &str) -> Option<Session> {
        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(err) => {
                if matches!(err.kind(), ErrorKind::ExpiredSignature) {
                    self.invalidated("expired");
                }
                tracing::debug!(error = %err, "rejected session token");
                return None;
            }
        };

        if !self.is_operator(&claims.sub) {
            tracing::warn!(sub = %claims.sub, "rejected token for a non-operator subject");
            return None;
        }

        if self.is_revoked(&claims.jti) {
            self.invalidated("signed out");
            return None;
        }

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)?;
        Some(Session {
            token: token.to_string(),
            email: claims.sub,
            expires_at,
            id: claims.jti,
        })
    }

    pub fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let session = self.get_session(token).ok_or(AuthError::InvalidSession)?;
        self.revoked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(session.id);

        tracing::info!(email = %session.email, "operator signed out");
        self.events.publish(FolioEvent::SignedOut {
            email: session.email,
            at: Utc::now(),
        });
        Ok(())
    }

    fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }

    fn is_operator(&self, subject: &str) -> bool {
        self.config
            .admin_email
            .as_deref()
            .is_some_and(|email| email.eq_ignore_ascii_case(subject))
    }

    fn is_revoked(&self, id: &Uuid) -> bool {
        self.revoked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(id)
    }

    fn invalidated(&self, reason: &str) {
        self.events.publish(FolioEvent::SessionInvalidated {
            reason: reason.to_string(),
            at: Utc::now(),
        });
    }
}

/// Hash a password into an argon2 PHC string suitable for `ADMIN_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
