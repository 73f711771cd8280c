use async_trait::async_trait;
use axum::http::HeaderMap;
use consult_core::Identity;
use thiserror::Error;

pub use consult_core::utils::{DISPLAY_NAME_HEADER, USER_ID_HEADER};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing {0} header")]
    Missing(&'static str),

    #[error("{0} header is not valid UTF-8")]
    Malformed(&'static str),
}

/// Resolves the verified user behind an incoming socket.
///
/// Authentication lives outside this service; implementations only read
/// what an upstream gateway has already established.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn identify(&self, headers: &HeaderMap) -> Result<Identity, IdentityError>;
}

/// Trusts the identity headers injected by an authenticating proxy.
#[derive(Debug, Default, Clone)]
pub struct HeaderIdentity;

#[async_trait]
impl IdentityProvider for HeaderIdentity {
    async fn identify(&self, headers: &HeaderMap) -> Result<Identity, IdentityError> {
        let user_id = header_value(headers, USER_ID_HEADER)?
            .ok_or(IdentityError::Missing(USER_ID_HEADER))?;
        let display_name =
            header_value(headers, DISPLAY_NAME_HEADER)?.unwrap_or_else(|| user_id.clone());

        Ok(Identity::new(user_id, display_name))
    }
}

fn header_value(headers: &HeaderMap, name: &'static str) -> Result<Option<String>, IdentityError> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(|s| Some(s.trim().to_string()).filter(|s| !s.is_empty()))
            .map_err(|_| IdentityError::Malformed(name)),
        None => Ok(None),
    }
}
