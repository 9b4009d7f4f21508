//! Public JWT verification.
//!
//! Only the signature and registered time claims are checked; the gate reads
//! no subject from the token.

use std::fs;
use std::str::FromStr;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::auth::collaborators::{CollaboratorError, JwtVerifier};
use crate::config::schema::{JwtConfig, PLACEHOLDER_JWT_SECRET};

#[derive(Debug, Error)]
pub enum JwtKeyError {
    #[error("unsupported JWT algorithm '{0}'")]
    Algorithm(String),

    #[error("no key configured for {0:?}")]
    MissingKey(Algorithm),

    #[error("JWT secret is empty or the sample placeholder")]
    WeakSecret,

    #[error("failed to read public key: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
}

pub struct JwtPublicVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtPublicVerifier {
    pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        Self { key, validation }
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self, JwtKeyError> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| JwtKeyError::Algorithm(config.algorithm.clone()))?;

        let key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = config
                    .secret
                    .as_deref()
                    .ok_or(JwtKeyError::MissingKey(algorithm))?;
                if secret.is_empty() || secret == PLACEHOLDER_JWT_SECRET {
                    return Err(JwtKeyError::WeakSecret);
                }
                DecodingKey::from_secret(secret.as_bytes())
            }
            _ => {
                let path = config
                    .public_key_path
                    .as_deref()
                    .ok_or(JwtKeyError::MissingKey(algorithm))?;
                let pem = fs::read(path)?;
                match algorithm {
                    Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(&pem)?,
                    Algorithm::EdDSA => DecodingKey::from_ed_pem(&pem)?,
                    _ => DecodingKey::from_rsa_pem(&pem)?,
                }
            }
        };

        Ok(Self::new(key, algorithm))
    }
}

#[async_trait]
impl JwtVerifier for JwtPublicVerifier {
    async fn verify(&self, jwt: &str) -> Result<bool, CollaboratorError> {
        match decode::<serde_json::Value>(jwt, &self.key, &self.validation) {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!(error = %e, "JWT rejected");
                Ok(false)
            }
        }
    }
}
