//! API-token authentication, fronted by the shared TTL cache.
//!
//! Every authenticated call goes through [`authenticate`]. The cache holds
//! either a materialized account snapshot (positive entry, 15 minutes) or an
//! explicit "known invalid" sentinel (negative entry, 5 minutes) so repeated
//! garbage tokens do not hammer the store. The store remains the single
//! source of truth: a disabled cache simply degrades every call to a direct
//! lookup.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::cache::{self, CacheManager};
use crate::db::models::Account;
use crate::db::services::account_service;

/// TTL for a cached positive authentication result. A revoked or rotated
/// credential is evicted synchronously, so this bounds staleness only for
/// out-of-band store edits.
pub const POSITIVE_TTL: Duration = Duration::from_secs(15 * 60);
/// TTL for the negative sentinel; keeps repeated invalid-token lookups off
/// the store without making a typo unusable for long.
pub const NEGATIVE_TTL: Duration = Duration::from_secs(5 * 60);
/// Issued credentials expire after one year unless revoked earlier.
pub const TOKEN_LIFETIME_DAYS: i64 = 365;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("account not found")]
    AccountNotFound,
}

/// The cached, store-independent view of an authenticated account. Kept
/// small and explicitly serialized so cache entries are portable and
/// inspectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl AccountSnapshot {
    pub fn of(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
        }
    }
}

/// What the token cache can hold for a key: a resolved account, or the
/// sentinel recording that the token was looked up and found invalid.
/// The sentinel is distinct from a cache miss.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TokenCacheEntry {
    Valid { account: AccountSnapshot },
    Invalid,
}

/// A credential is valid iff it exists, is unexpired, and the account is
/// active.
pub fn credential_is_valid(account: &Account, now: DateTime<Utc>) -> bool {
    match (&account.api_token, account.token_expires_at) {
        (Some(_), Some(expires_at)) => account.is_active && now < expires_at,
        _ => false,
    }
}

/// Generates a new opaque API token: 32 random bytes, hex-encoded.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Resolves a bearer token to an account, consulting the cache first.
///
/// A cached snapshot is returned without re-checking expiry against the
/// wall clock; validity is enforced at population time and bounded by the
/// entry TTL. Credential mutations evict their entry synchronously, so the
/// staleness window only covers out-of-band expiry.
pub async fn authenticate(
    pool: &PgPool,
    cache: &CacheManager,
    token: &str,
) -> Result<Option<AccountSnapshot>, AuthError> {
    if token.is_empty() {
        return Ok(None);
    }

    let key = cache::token_key(token);
    if let Some(entry) = cache.get_json::<TokenCacheEntry>(&key) {
        return Ok(match entry {
            TokenCacheEntry::Valid { account } => Some(account),
            TokenCacheEntry::Invalid => None,
        });
    }

    match account_service::find_by_token(pool, token).await? {
        Some(account) if credential_is_valid(&account, Utc::now()) => {
            let snapshot = AccountSnapshot::of(&account);
            cache.set_json(
                &key,
                &TokenCacheEntry::Valid {
                    account: snapshot.clone(),
                },
                POSITIVE_TTL,
            );
            Ok(Some(snapshot))
        }
        _ => {
            cache.set_json(&key, &TokenCacheEntry::Invalid, NEGATIVE_TTL);
            Ok(None)
        }
    }
}

/// Issues (or rotates) the account's API token, evicting the previous
/// token's cache entry in the same operation so the old credential cannot
/// keep authenticating from cache.
pub async fn issue_token(
    pool: &PgPool,
    cache: &CacheManager,
    account_id: i32,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let account = account_service::find_by_id(pool, account_id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    let token = generate_token();
    let expires_at = Utc::now() + ChronoDuration::days(TOKEN_LIFETIME_DAYS);
    account_service::store_token(pool, account_id, &token, expires_at).await?;

    if let Some(old_token) = account.api_token.as_deref() {
        cache.delete(&cache::token_key(old_token));
        debug!(account_id, "evicted rotated token from auth cache");
    }

    Ok((token, expires_at))
}

/// Revokes the account's credential and evicts its cache entry
/// synchronously.
pub async fn revoke_token(
    pool: &PgPool,
    cache: &CacheManager,
    account_id: i32,
) -> Result<(), AuthError> {
    let account = account_service::find_by_id(pool, account_id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    account_service::clear_token(pool, account_id).await?;

    if let Some(old_token) = account.api_token.as_deref() {
        cache.delete(&cache::token_key(old_token));
        debug!(account_id, "evicted revoked token from auth cache");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn account(token: Option<&str>, expires_in: Option<i64>, active: bool) -> Account {
        let now = Utc::now();
        Account {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "x".to_string(),
            api_token: token.map(|t| t.to_string()),
            token_expires_at: expires_in.map(|secs| now + ChronoDuration::seconds(secs)),
            is_active: active,
            created_at: now,
        }
    }

    #[test]
    fn unexpired_active_credential_is_valid() {
        let a = account(Some("tok"), Some(3600), true);
        assert!(credential_is_valid(&a, Utc::now()));
    }

    #[test]
    fn expired_credential_is_invalid() {
        let a = account(Some("tok"), Some(-1), true);
        assert!(!credential_is_valid(&a, Utc::now()));
    }

    #[test]
    fn inactive_account_credential_is_invalid() {
        let a = account(Some("tok"), Some(3600), false);
        assert!(!credential_is_valid(&a, Utc::now()));
    }

    #[test]
    fn missing_token_or_expiry_is_invalid() {
        assert!(!credential_is_valid(&account(None, Some(3600), true), Utc::now()));
        assert!(!credential_is_valid(&account(Some("tok"), None, true), Utc::now()));
    }

    #[test]
    fn generated_tokens_are_distinct_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn cache_entry_serialization_is_inspectable() {
        let entry = TokenCacheEntry::Valid {
            account: AccountSnapshot {
                id: 3,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["state"], "valid");
        assert_eq!(json["account"]["id"], 3);

        let sentinel = serde_json::to_value(TokenCacheEntry::Invalid).unwrap();
        assert_eq!(sentinel, serde_json::json!({"state": "invalid"}));
    }

    #[test]
    fn sentinel_round_trips_through_json() {
        let raw = serde_json::to_string(&TokenCacheEntry::Invalid).unwrap();
        let parsed: TokenCacheEntry = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, TokenCacheEntry::Invalid);
    }
}
