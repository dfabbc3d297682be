//! Share-link state for a file record.
//!
//! A record is either not shared or shared under exactly one token with one expiry.
//! Issuing again replaces both, which invalidates the previous token. Expiry is only
//! ever checked at access time; nothing sweeps expired links.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Lifetime of an issued share link.
pub const SHARE_LINK_TTL_HOURS: i64 = 24;

const TOKEN_BYTES: usize = 32;

/// Opaque capability string. 256 random bits rendered as 64 lowercase hex characters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ShareToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // prefix only
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "ShareToken({}…)", prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShareState {
    #[default]
    NoShare,
    Shared {
        token: ShareToken,
        expires_at: DateTime<Utc>,
    },
}

impl ShareState {
    /// New link valid for [`SHARE_LINK_TTL_HOURS`] from `now`.
    pub fn issue(now: DateTime<Utc>) -> Self {
        ShareState::Shared {
            token: ShareToken::generate(),
            expires_at: now + Duration::hours(SHARE_LINK_TTL_HOURS),
        }
    }

    /// Rebuild from stored columns. Both or neither must be present.
    pub fn from_parts(
        token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, AppError> {
        match (token, expires_at) {
            (None, None) => Ok(ShareState::NoShare),
            (Some(token), Some(expires_at)) => Ok(ShareState::Shared {
                token: ShareToken(token),
                expires_at,
            }),
            _ => Err(AppError::Internal(
                "share token and expiry must be set together".to_string(),
            )),
        }
    }

    pub fn token(&self) -> Option<&ShareToken> {
        match self {
            ShareState::NoShare => None,
            ShareState::Shared { token, .. } => Some(token),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ShareState::NoShare => None,
            ShareState::Shared { expires_at, .. } => Some(*expires_at),
        }
    }

    /// Gate for token-path downloads: the link must exist and `now` must not be past expiry.
    pub fn check_access(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        match self {
            ShareState::NoShare => Err(AppError::NotFound(
                "File not found or invalid link".to_string(),
            )),
            ShareState::Shared { expires_at, .. } if now > *expires_at => {
                Err(AppError::Expired("Link has expired".to_string()))
            }
            ShareState::Shared { .. } => Ok(()),
        }
    }
}
