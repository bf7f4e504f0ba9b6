//! Password hashing and JWT access/refresh tokens.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use pd_core::config::AuthConfig;
use pd_core::error::{PdError, PdResult};
use pd_models::{Database, User};

// ─── Passwords ──────────────────────────────────────────────────────────────

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> PdResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PdError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC hash string.
pub fn verify_password(password: &str, hash: &str) -> PdResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PdError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ─── Tokens ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn user_id(&self) -> PdResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| PdError::AuthFailed("malformed token subject".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and validates HS256 tokens.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: i64,
    refresh_token_days: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: i64, refresh_token_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
            refresh_token_days,
        }
    }

    /// Build from config. An empty secret is replaced with a random one,
    /// which invalidates all tokens on restart.
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = if config.jwt_secret.is_empty() {
            warn!("auth.jwt_secret is empty, generating a random secret for this process");
            generate_secret()
        } else {
            config.jwt_secret.clone()
        };
        Self::new(&secret, config.access_token_minutes, config.refresh_token_days)
    }

    pub fn issue_access(&self, user: &User) -> PdResult<String> {
        self.issue(user, TokenType::Access, Duration::minutes(self.access_token_minutes))
    }

    pub fn issue_refresh(&self, user: &User) -> PdResult<String> {
        self.issue(user, TokenType::Refresh, Duration::days(self.refresh_token_days))
    }

    pub fn issue_pair(&self, user: &User) -> PdResult<TokenPair> {
        Ok(TokenPair {
            access: self.issue_access(user)?,
            refresh: self.issue_refresh(user)?,
        })
    }

    /// Decode a token and check signature, expiry and kind.
    pub fn validate(&self, token: &str, expected: TokenType) -> PdResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| PdError::AuthFailed(format!("invalid token: {e}")))?;
        if data.claims.token_type != expected {
            return Err(PdError::AuthFailed("wrong token type".into()));
        }
        Ok(data.claims)
    }

    fn issue(&self, user: &User, token_type: TokenType, lifetime: Duration) -> PdResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.user_id.to_string(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| PdError::Internal(format!("token signing failed: {e}")))
    }
}

/// 32 random bytes, URL-safe base64.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ─── Auth service ───────────────────────────────────────────────────────────

/// Logs users in and resolves tokens back to stored users.
pub struct AuthService {
    database: Database,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(database: Database, jwt: JwtService) -> Self {
        Self { database, jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Exchange credentials for a token pair.
    ///
    /// Unknown users and wrong passwords fail with the same error.
    pub fn login(&self, username: &str, password: &str) -> PdResult<TokenPair> {
        let conn = self.database.conn()?;
        let user = User::find_by_username(&conn, username)?
            .ok_or_else(|| PdError::AuthFailed("invalid credentials".into()))?;
        if !verify_password(password, &user.password_hash)? {
            return Err(PdError::AuthFailed("invalid credentials".into()));
        }
        debug!("issued tokens for {}", user.username);
        self.jwt.issue_pair(&user)
    }

    /// Exchange a refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> PdResult<String> {
        let user = self.resolve(refresh_token, TokenType::Refresh)?;
        self.jwt.issue_access(&user)
    }

    /// The stored user behind an access token.
    pub fn authenticate(&self, access_token: &str) -> PdResult<User> {
        self.resolve(access_token, TokenType::Access)
    }

    fn resolve(&self, token: &str, expected: TokenType) -> PdResult<User> {
        let claims = self.jwt.validate(token, expected)?;
        let conn = self.database.conn()?;
        User::find_by_id(&conn, &claims.user_id()?)?
            .ok_or_else(|| PdError::AuthFailed("user no longer exists".into()))
    }
}
