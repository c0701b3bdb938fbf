//! JWT token service
//!
//! Issues and validates HS256 access tokens and short-lived password reset
//! tokens, and turns validated claims into a [`CurrentUser`].

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::models::{Role, User};
use thiserror::Error;

/// Access token type
pub const TOKEN_TYPE_ACCESS: &str = "access";
/// Password reset token type; refused by `require_auth`
pub const TOKEN_TYPE_RESET: &str = "reset";

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret (at least 32 bytes)
    pub secret: String,
    /// Access token lifetime in minutes
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Read `JWT_SECRET`, `JWT_EXPIRATION_MINUTES`, `JWT_ISSUER`, `JWT_AUDIENCE`
    ///
    /// A missing secret is only tolerated in development, where a random
    /// printable key is generated (tokens will not survive a restart).
    pub fn from_env(is_development: bool) -> Result<Self, JwtError> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() >= 32 => secret,
            Ok(_) => {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET must be at least 32 characters long".to_string(),
                ));
            }
            Err(_) if is_development => {
                tracing::warn!("JWT_SECRET not set, generating a temporary development key");
                generate_secure_printable_jwt_secret()?
            }
            Err(_) => {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET environment variable must be set outside development".to_string(),
                ));
            }
        };

        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "hcm-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "hcm-clients".to_string()),
        })
    }
}

/// Claims carried in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<i64>,
    /// Comma joined permission list
    pub permissions: String,
    /// `access` or `reset`
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Generate a 64 character printable secret (development only)
pub fn generate_secure_printable_jwt_secret() -> Result<String, JwtError> {
    const ALLOWED: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{}";

    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    rng.fill(&mut bytes).map_err(|_| {
        JwtError::KeyGenerationFailed("Failed to generate secure random key".to_string())
    })?;

    Ok(bytes
        .iter()
        .map(|b| ALLOWED[(*b as usize) % ALLOWED.len()] as char)
        .collect())
}

/// JWT token service
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue an access token for a user
    pub fn generate_token(&self, user: &User, permissions: &[String]) -> Result<String, JwtError> {
        self.sign(
            user,
            permissions.join(","),
            TOKEN_TYPE_ACCESS,
            self.config.expiration_minutes,
        )
    }

    /// Issue a password reset token (no permissions, short lifetime)
    pub fn generate_reset_token(&self, user: &User, minutes: i64) -> Result<String, JwtError> {
        self.sign(user, String::new(), TOKEN_TYPE_RESET, minutes)
    }

    fn sign(
        &self,
        user: &User,
        permissions: String,
        token_type: &str,
        minutes: i64,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
            tenant_id: user.tenant_id.clone(),
            employee_id: user.employee_id,
            permissions,
            token_type: token_type.to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate signature, expiry, issuer and audience
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Extract the token from an `Authorization: Bearer ...` header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim)
    }
}

/// Authenticated caller, built from validated claims
///
/// Inserted into request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub tenant_id: String,
    /// Linked employee profile, if any
    pub employee_id: Option<i64>,
    pub permissions: Vec<String>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken("Malformed subject".to_string()))?;
        let role = claims
            .role
            .parse()
            .map_err(|e: String| JwtError::InvalidToken(e))?;
        let permissions = if claims.permissions.is_empty() {
            vec![]
        } else {
            claims
                .permissions
                .split(',')
                .map(|s| s.to_string())
                .collect()
        };

        Ok(Self {
            id,
            email: claims.email,
            name: claims.name,
            role,
            tenant_id: claims.tenant_id,
            employee_id: claims.employee_id,
            permissions,
        })
    }
}

impl CurrentUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Check a permission
    ///
    /// 1. super_admin has every permission
    /// 2. `"all"` grants every permission
    /// 3. exact match, or prefix match through a `resource:*` wildcard
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_super_admin() {
            return true;
        }

        if self.permissions.iter().any(|p| p == "all") {
            return true;
        }

        self.permissions.iter().any(|p| {
            if p == permission {
                return true;
            }
            if let Some(prefix) = p.strip_suffix(":*") {
                permission.starts_with(&format!("{}:", prefix))
            } else {
                false
            }
        })
    }

    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }

    pub fn has_all_permissions(&self, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.has_permission(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "unit-test-secret-key-with-enough-length".to_string(),
            expiration_minutes: 60,
            issuer: "hcm-server".to_string(),
            audience: "hcm-clients".to_string(),
        })
    }

    fn user(role: Role) -> User {
        User {
            id: 42,
            tenant_id: "acme".into(),
            email: "asha@acme.test".into(),
            password_hash: String::new(),
            name: "Asha".into(),
            role,
            department: None,
            designation: None,
            employee_id: Some(7),
            avatar: None,
            is_active: true,
            last_login: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = service();
        let permissions = vec!["leave:apply".to_string(), "attendance:mark".to_string()];
        let token = service
            .generate_token(&user(Role::Employee), &permissions)
            .expect("Failed to generate test token");

        let claims = service
            .validate_token(&token)
            .expect("Failed to validate test token");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.tenant_id, "acme");
        assert_eq!(claims.role, "employee");
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
        assert_eq!(claims.permissions, "leave:apply,attendance:mark");

        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.id, 42);
        assert_eq!(current.employee_id, Some(7));
        assert_eq!(current.role, Role::Employee);
    }

    #[test]
    fn test_reset_token_type() {
        let service = service();
        let token = service.generate_reset_token(&user(Role::Hr), 15).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.token_type, TOKEN_TYPE_RESET);
        assert!(claims.permissions.is_empty());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = service()
            .generate_token(&user(Role::Admin), &[])
            .unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "a-completely-different-secret-of-32-chars".to_string(),
            ..service().config
        });
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::with_config(JwtConfig {
            expiration_minutes: -10,
            ..service().config
        });
        let token = service.generate_token(&user(Role::Admin), &[]).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_current_user_permissions() {
        let current = CurrentUser {
            id: 1,
            email: "m@acme.test".into(),
            name: "M".into(),
            role: Role::Manager,
            tenant_id: "acme".into(),
            employee_id: None,
            permissions: vec!["leave:approve".to_string(), "attendance:*".to_string()],
        };

        assert!(current.has_permission("leave:approve"));
        assert!(current.has_permission("attendance:view_team"));
        assert!(!current.has_permission("payroll:process"));
        assert!(current.has_any_permission(&["payroll:process", "leave:approve"]));
        assert!(!current.has_all_permissions(&["payroll:process", "leave:approve"]));
    }

    #[test]
    fn test_super_admin_has_all_permissions() {
        let current = CurrentUser {
            id: 1,
            email: "root@acme.test".into(),
            name: "Root".into(),
            role: Role::SuperAdmin,
            tenant_id: "acme".into(),
            employee_id: None,
            permissions: vec![],
        };
        assert!(current.has_permission("system:audit"));
        assert!(current.has_all_permissions(&["payroll:process", "employee:delete"]));
    }

    #[test]
    fn test_printable_secret() {
        let a = generate_secure_printable_jwt_secret().unwrap();
        let b = generate_secure_printable_jwt_secret().unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
