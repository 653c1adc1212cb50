use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;

use crate::config::AuthConfig;

pub const DEFAULT_ROLE: &str = "user";

// Errors returned by access-token verification + strict claim validation.
// The variant is for server logs only; every one of them becomes the same 401.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("missing or invalid 'aud' claim")]
    MissingOrInvalidAud,
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
}

fn aud_is_present_and_valid(aud: &serde_json::Value) -> bool {
    match aud {
        // Typical: aud is a string
        serde_json::Value::String(s) => !s.trim().is_empty(),
        // Also valid: aud is an array of strings
        serde_json::Value::Array(arr) => arr.iter().any(|v| match v {
            serde_json::Value::String(s) => !s.trim().is_empty(),
            _ => false,
        }),
        // Missing claim ends up as Null due to #[serde(default)]
        _ => false,
    }
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - `aud` in JWT can be either string or array; jsonwebtoken validates it via `Validation::set_audience`.
/// - `role` is a single string, `scope` is space-separated.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    // Keep as Value to accept both string and array. Validation handles audience checks.
    #[serde(default)]
    pub aud: serde_json::Value,

    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub nbf: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,

    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// AuthService が返す「検証済み・アプリ側で使う型」
///
/// - `role` は未指定なら "user"
/// - `scope` は空白区切りのまま保持し、判定は AuthCtx 側で行う
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccessToken {
    pub subject: String,
    pub role: String,
    pub scope: String,
}

/// HMAC access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Result<Self, String> {
        if config.jwt_secret.is_empty() {
            return Err("empty jwt secret".to_string());
        }
        let first = *config
            .algorithms
            .first()
            .ok_or_else(|| "no jwt algorithm configured".to_string())?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(first);
        validation.algorithms = config.algorithms.clone();
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = config.leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks:
    /// - signature and algorithm allow-list
    /// - `exp` / `nbf` with leeway
    /// - `iss` and `aud` (because we set them)
    ///
    /// This method additionally checks:
    /// - required claims are present *and not empty* (`iss`, `aud`, `sub`, `exp`)
    pub fn verify_strict(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let claims = self.verify(token)?;

        if claims.iss.trim().is_empty() {
            return Err(AuthError::EmptyClaim("iss"));
        }
        if claims.sub.trim().is_empty() {
            return Err(AuthError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(AuthError::EmptyClaim("exp"));
        }
        if !aud_is_present_and_valid(&claims.aud) {
            return Err(AuthError::MissingOrInvalidAud);
        }

        Ok(claims)
    }

    /// Verify + strict claim validation, then convert claims into an application-friendly type.
    ///
    /// This is the recommended entry-point for middleware/handlers.
    pub fn verify_verified(&self, token: &str) -> Result<VerifiedAccessToken, AuthError> {
        let claims = self.verify_strict(token)?;

        let role = claims
            .role
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        Ok(VerifiedAccessToken {
            subject: claims.sub,
            role,
            scope: claims.scope.unwrap_or_default(),
        })
    }
}
