use std::time::SystemTime;

use axum::{extract::FromRequestParts, RequestPartsExt};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use http::{request::Parts, StatusCode};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiClaim {
    pub sub: String,
    pub username: String,
    pub is_staff: bool,
    pub exp: u64,
}

impl ApiClaim {
    pub fn new(user: &bookstore_dal::user::User) -> Self {
        Self {
            sub: user.id.to_string(),
            username: user.username.clone(),
            is_staff: user.is_staff,
            exp: 0,
        }
    }

    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub
            .parse()
            .map_err(|_| ApiError::InternalError(format!("Invalid token subject: {}", self.sub)))
    }

    fn set_validity(&mut self, until: SystemTime) {
        self.exp = until
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

pub struct TokenManager {
    keys: Keys,
    default_validity: std::time::Duration,
    header: Header,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: impl AsRef<[u8]>, default_validity: std::time::Duration) -> Self {
        let validation = Validation::default();
        let header = Header::default();
        Self {
            keys: Keys::new(secret),
            default_validity,
            header,
            validation,
        }
    }

    pub fn issue(&self, mut claim: ApiClaim) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now();
        claim.set_validity(now + self.default_validity);
        encode(&self.header, &claim, &self.keys.encoding)
    }

    #[cfg(test)]
    fn issue_expired(&self, mut claim: ApiClaim) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now();
        claim.set_validity(now - self.default_validity);
        encode(&self.header, &claim, &self.keys.encoding)
    }

    pub fn validate(&self, token: &str) -> Result<ApiClaim, jsonwebtoken::errors::Error> {
        let data = decode::<ApiClaim>(token, &self.keys.decoding, &self.validation)?;
        Ok(data.claims)
    }

    pub fn default_validity(&self) -> std::time::Duration {
        self.default_validity
    }
}

impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_token = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .ok()
            .map(|h| h.0.token().to_string());

        match header_token {
            Some(token) => {
                let claim = state.tokens().validate(&token).map_err(|e| {
                    error!("Failed to validate token: {}", e);
                    StatusCode::UNAUTHORIZED
                })?;
                Ok(claim)
            }
            None => {
                debug!("No token found");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
