use crate::entry::TenantName;
use crate::error::TenancyError;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

pub const DEFAULT_TOKEN_ISSUER: &str = "tenancy-bench";
pub const DEFAULT_TOKEN_SUBJECT: &str = "benchmark";
pub const DEFAULT_TOKEN_AUDIENCE: &str = "tenancy-server";

/// Configuration for the benchmark token issuer. Defaults match the claim
/// values the authentication subsystem expects from benchmark clients:
/// ES256, a 12 hour validity window, and a 5 minute not-before grace.
#[derive(Debug, Clone)]
pub struct TokenIssuerConfig {
    pub algorithm: Algorithm,
    pub issuer: String,
    pub subject: String,
    pub audience: String,
    pub validity: Duration,
    pub not_before_grace: Duration,
}

impl Default for TokenIssuerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::ES256,
            issuer: DEFAULT_TOKEN_ISSUER.to_string(),
            subject: DEFAULT_TOKEN_SUBJECT.to_string(),
            audience: DEFAULT_TOKEN_AUDIENCE.to_string(),
            validity: Duration::from_secs(60 * 60 * 12),
            not_before_grace: Duration::from_secs(60 * 5),
        }
    }
}

/// Private signing key plus the key id advertised in token headers. Key
/// bytes are wiped from memory when the last copy is dropped.
#[derive(Clone)]
pub struct TokenSigningKey {
    key_id: String,
    pem: Zeroizing<Vec<u8>>,
}

impl TokenSigningKey {
    pub fn new(key_id: impl Into<String>, pem: impl Into<Vec<u8>>) -> Self {
        Self {
            key_id: key_id.into(),
            pem: Zeroizing::new(pem.into()),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

impl std::fmt::Debug for TokenSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigningKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// Claim set carried by issued tenant tokens. The `tenants` list is the
/// authorization-scoping claim; issued tokens always name exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantTokenClaims {
    pub jti: String,
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub tenants: Vec<String>,
    pub iat: u64,
    pub nbf: u64,
    pub exp: u64,
}

/// Stateless issuer of signed, time-bounded claims scoped to one tenant.
/// Holds no key material; callers pass the signing key per call.
#[derive(Debug, Clone, Default)]
pub struct TokenIssuer {
    config: TokenIssuerConfig,
}

impl TokenIssuer {
    pub fn new(config: TokenIssuerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenIssuerConfig {
        &self.config
    }

    /// Builds and signs a fresh claim set for `tenant_name`. Every call
    /// draws a new random token id, so repeated calls for the same tenant
    /// yield distinct valid tokens.
    pub fn issue_token(
        &self,
        tenant_name: &[u8],
        key: &TokenSigningKey,
    ) -> Result<String, TenancyError> {
        let tenant = std::str::from_utf8(tenant_name).map_err(|_| {
            TenancyError::Validation("tenant name in token claims must be valid utf-8".into())
        })?;
        let issued_at = unix_now()?;
        let claims = TenantTokenClaims {
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            sub: self.config.subject.clone(),
            aud: vec![self.config.audience.clone()],
            tenants: vec![tenant.to_string()],
            iat: issued_at,
            nbf: issued_at.saturating_sub(self.config.not_before_grace.as_secs()),
            exp: issued_at + self.config.validity.as_secs(),
        };
        let mut header = Header::new(self.config.algorithm);
        header.kid = Some(key.key_id.clone());
        let encoding_key = self.encoding_key(key)?;
        let token = jsonwebtoken::encode(&header, &claims, &encoding_key)
            .map_err(|error| TenancyError::Signing(error.to_string()))?;
        debug!(tenant, token_id = %claims.jti, "issued tenant token");
        Ok(token)
    }

    /// One fresh token per name. No caching: a second call with the same
    /// names produces a disjoint set of token ids.
    pub fn issue_tokens_for_tenants(
        &self,
        names: &[TenantName],
        key: &TokenSigningKey,
    ) -> Result<BTreeMap<TenantName, String>, TenancyError> {
        let mut tokens = BTreeMap::new();
        for name in names {
            let token = self.issue_token(name, key)?;
            tokens.insert(name.clone(), token);
        }
        Ok(tokens)
    }

    fn encoding_key(&self, key: &TokenSigningKey) -> Result<EncodingKey, TenancyError> {
        let parsed = match self.config.algorithm {
            Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(&key.pem),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => EncodingKey::from_rsa_pem(&key.pem),
            Algorithm::EdDSA => EncodingKey::from_ed_pem(&key.pem),
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                return Err(TenancyError::Signing(
                    "symmetric algorithms are not supported for tenant tokens".into(),
                ));
            }
        };
        parsed.map_err(|error| TenancyError::Signing(error.to_string()))
    }
}

fn unix_now() -> Result<u64, TenancyError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|_| TenancyError::Validation("system clock is before the unix epoch".into()))
}
