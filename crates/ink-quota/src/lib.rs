//! Guest quota tracking and per-request size caps
//!
//! Guests are identified by browser fingerprint when one is supplied, with
//! the request IP as a fallback. A user whose fingerprint only appears after
//! their first request gets their IP-keyed usage merged into the
//! fingerprint-keyed counter exactly once.

#![allow(clippy::must_use_candidate)]

mod error;

use std::sync::Arc;

use ink_config::LimitsConfig;
use ink_core::RequestIdentity;
use ink_store::{ConsumeOutcome, IdentityKind, QuotaStore, UsageKey};
use jiff::Timestamp;
use jiff::tz::TimeZone;

pub use error::QuotaError;

/// Enforcement class for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserClass {
    /// Not logged in: per-request cap and daily cap
    Guest,
    /// Logged in without any lifetime spend: per-request cap only
    Regular,
    /// Logged in with lifetime spend: exempt from both caps
    Member,
}

/// Counter key for guests presenting neither fingerprint nor IP
const FALLBACK_IDENTITY: &str = "unknown";

/// Daily usage tracker for unauthenticated requests
pub struct QuotaTracker {
    store: Arc<dyn QuotaStore>,
    limits: LimitsConfig,
}

impl QuotaTracker {
    /// Create a tracker over the given store
    pub fn new(store: Arc<dyn QuotaStore>, limits: LimitsConfig) -> Self {
        Self { store, limits }
    }

    /// Enforce size caps and, for guests, consume daily quota
    ///
    /// Members pass unconditionally. Logged-in users only face the
    /// per-request cap. Guests face the per-request cap, then an atomic
    /// daily-cap check-and-increment on their identity counter.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::RequestTooLarge`] over the per-request cap,
    /// [`QuotaError::DailyCapExceeded`] over the daily cap
    pub async fn check_and_consume(
        &self,
        identity: &RequestIdentity,
        class: UserClass,
        text_len: u64,
    ) -> Result<(), QuotaError> {
        match class {
            UserClass::Member => Ok(()),
            UserClass::Regular => {
                if text_len > self.limits.per_request_logged {
                    return Err(QuotaError::RequestTooLarge {
                        limit: self.limits.per_request_logged,
                    });
                }
                Ok(())
            }
            UserClass::Guest => {
                if text_len > self.limits.per_request_guest {
                    return Err(QuotaError::RequestTooLarge {
                        limit: self.limits.per_request_guest,
                    });
                }
                self.consume_daily(identity, text_len).await
            }
        }
    }

    async fn consume_daily(
        &self,
        identity: &RequestIdentity,
        text_len: u64,
    ) -> Result<(), QuotaError> {
        let day = day_key(Timestamp::now());

        let key = match (&identity.fingerprint, &identity.ip) {
            (Some(fingerprint), ip) => {
                let fp_key = UsageKey::new(&day, IdentityKind::Fingerprint, fingerprint);

                // A fingerprint arriving after IP-only requests inherits
                // that usage once, while the fingerprint counter is still
                // untouched
                if let Some(ip) = ip {
                    let ip_key = UsageKey::new(&day, IdentityKind::Ip, ip);
                    let migrated = self.store.migrate_if_unused(&ip_key, &fp_key).await?;
                    if migrated > 0 {
                        tracing::info!(fingerprint, ip, migrated, "merged IP usage into fingerprint");
                    }
                }

                fp_key
            }
            (None, Some(ip)) => UsageKey::new(&day, IdentityKind::Ip, ip),
            // No fingerprint and no forwarded IP: all such requests share
            // one counter so the daily cap still binds
            (None, None) => UsageKey::new(&day, IdentityKind::Ip, FALLBACK_IDENTITY),
        };

        match self
            .store
            .try_consume(&key, text_len, self.limits.daily_cap_guest)
            .await?
        {
            ConsumeOutcome::Allowed { used_after } => {
                tracing::debug!(used_after, cap = self.limits.daily_cap_guest, "guest quota consumed");
                Ok(())
            }
            ConsumeOutcome::Denied { used } => {
                tracing::info!(used, cap = self.limits.daily_cap_guest, "guest daily cap hit");
                Err(QuotaError::DailyCapExceeded {
                    cap: self.limits.daily_cap_guest,
                })
            }
        }
    }
}

/// UTC date of `ts` as `YYYY-MM-DD`
#[must_use]
pub fn day_key(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::UTC).strftime("%Y-%m-%d").to_string()
}
