//! JWT token management
//!
//! Provides JWT token generation, validation and refresh functionality

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::permissions::UserRole;
use crate::auth::types::{AuthConfig, JwtClaims};
use crate::error::Result;

/// JWT token manager
pub struct JwtManager {
    /// Encoding key
    encoding_key: EncodingKey,
    /// Decoding key
    decoding_key: DecodingKey,
    /// Validation configuration
    validation: Validation,
    /// Authentication configuration
    config: Arc<AuthConfig>,
}

impl JwtManager {
    /// Create new JWT manager
    pub fn new(config: Arc<AuthConfig>) -> Result<Self> {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["market-api"]);
        validation.set_audience(&["market-api-users"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 30; // 30 seconds tolerance

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    /// Generate access token
    pub fn generate_access_token(
        &self,
        user_id: i32,
        email: String,
        role: UserRole,
    ) -> Result<String> {
        let claims = JwtClaims::new(user_id, email, role, self.config.jwt_expires_in);
        let header = Header::new(Algorithm::HS256);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| crate::internal_error!("Token generation failed: {}", e))
    }

    /// Generate refresh token
    pub fn generate_refresh_token(&self, user_id: i32, email: String) -> Result<String> {
        // 刷新令牌不携带角色权限
        let claims = JwtClaims::new(
            user_id,
            email,
            UserRole::Customer,
            self.config.refresh_expires_in,
        );
        let header = Header::new(Algorithm::HS256);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| crate::internal_error!("Token generation failed: {}", e))
    }

    /// Validate and parse token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        let token_data: TokenData<JwtClaims> = decode(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    crate::auth_error!("认证令牌已过期")
                }
                _ => crate::auth_error!("Token validation failed: {}", e),
            })?;

        let claims = token_data.claims;

        // Additional check for token expiration
        if claims.is_expired() {
            return Err(crate::auth_error!("认证令牌已过期"));
        }

        Ok(claims)
    }

    /// Refresh access token
    pub fn refresh_access_token(&self, refresh_token: &str, role: UserRole) -> Result<String> {
        let claims = self.validate_token(refresh_token)?;

        let user_id = claims
            .user_id()
            .map_err(|_| crate::auth_error!("认证令牌格式无效"))?;

        self.generate_access_token(user_id, claims.email, role)
    }

    /// Extract claims ignoring expiry (signature is still verified)
    ///
    /// 过期令牌也要能登出，因此只放宽 exp 校验。
    #[must_use]
    pub fn extract_claims_lenient(&self, token: &str) -> Option<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["market-api"]);
        validation.set_audience(&["market-api-users"]);
        validation.validate_exp = false;

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .ok()
    }

    /// Get remaining token TTL
    #[must_use]
    pub fn get_token_ttl(&self, token: &str) -> Option<Duration> {
        self.extract_claims_lenient(token).and_then(|claims| {
            let exp_time = DateTime::<Utc>::from_timestamp(claims.exp, 0)?;
            let now = Utc::now();
            if exp_time > now {
                Some(exp_time - now)
            } else {
                None
            }
        })
    }

    /// Revoke token (returns the claims for blacklist storage)
    pub fn revoke_token(&self, token: &str) -> Result<JwtClaims> {
        self.extract_claims_lenient(token)
            .ok_or_else(|| crate::auth_error!("认证令牌格式无效"))
    }

    /// Get configuration reference
    #[must_use]
    pub fn get_config(&self) -> &AuthConfig {
        &self.config
    }

    /// Generate token pair (access + refresh tokens)
    pub fn generate_token_pair(
        &self,
        user_id: i32,
        email: String,
        role: UserRole,
    ) -> Result<TokenPair> {
        let access_token = self.generate_access_token(user_id, email.clone(), role)?;
        let refresh_token = self.generate_refresh_token(user_id, email)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.jwt_expires_in,
        })
    }
}

/// Token pair structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Token type
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}
