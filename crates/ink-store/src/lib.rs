//! Typed repositories over a document store
//!
//! Each collection gets a trait with struct records instead of stringly-typed
//! filters. Operations that used to be read-modify-write races (balance
//! deduction, quota increments, order redemption) are exposed as atomic
//! conditional operations so backends can close them under a per-entry lock.

#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod memory;
pub mod records;

use async_trait::async_trait;
use jiff::Timestamp;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use records::{AfdOrder, AnalysisRecord, BalancePool, IdentityKind, UsageKey, UserBilling};

/// Computes the grant-pool size from a lifetime spend total
pub type GrantForTotal<'a> = &'a (dyn Fn(f64) -> u32 + Send + Sync);

/// Result of an atomic quota consumption attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Within the cap; counter was incremented
    Allowed {
        /// Counter value after the increment
        used_after: u64,
    },
    /// Would exceed the cap; counter unchanged
    Denied {
        /// Counter value at the time of the check
        used: u64,
    },
}

/// Per-user call-credit ledger records
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Fetch a user's ledger record
    async fn get_billing(&self, uid: u64) -> Result<Option<UserBilling>, StoreError>;

    /// Insert a ledger record unless one already exists
    ///
    /// Returns whether the record was inserted.
    async fn insert_billing_if_absent(&self, record: UserBilling) -> Result<bool, StoreError>;

    /// Replace the grant pool when the last refresh fell in an earlier
    /// calendar month (UTC)
    ///
    /// The new pool size is computed from the record's lifetime spend via
    /// `grant_for_total`, under the same lock as the staleness check.
    /// Returns whether a refresh happened.
    async fn refresh_grant_if_stale(
        &self,
        uid: u64,
        now: Timestamp,
        grant_for_total: GrantForTotal<'_>,
    ) -> Result<bool, StoreError>;

    /// Atomically deduct one call, draining the grant pool before the paid
    /// pool
    ///
    /// Returns the pool charged, or `None` when both pools are empty.
    async fn deduct_preferring_grant(
        &self,
        uid: u64,
        now: Timestamp,
    ) -> Result<Option<BalancePool>, StoreError>;

    /// Atomically apply an order redemption to the ledger
    ///
    /// Adds `amount` to the lifetime total and the credited calls to both
    /// pools; returns the updated record.
    async fn credit_redemption(
        &self,
        uid: u64,
        amount: f64,
        grant_added: u32,
        paid_added: u32,
        now: Timestamp,
    ) -> Result<UserBilling, StoreError>;
}

/// Redeemed-order records
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch a redeemed order by order number
    async fn get_order(&self, order_no: &str) -> Result<Option<AfdOrder>, StoreError>;

    /// Record a redemption unless the order number was already redeemed
    ///
    /// Returns whether the record was inserted. This is the at-most-once
    /// redemption guard.
    async fn insert_order_if_absent(&self, order: AfdOrder) -> Result<bool, StoreError>;
}

/// Guest daily usage counters
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Current counter value, zero when absent
    async fn usage(&self, key: &UsageKey) -> Result<u64, StoreError>;

    /// Atomically add `amount` to the counter unless that would exceed `cap`
    async fn try_consume(
        &self,
        key: &UsageKey,
        amount: u64,
        cap: u64,
    ) -> Result<ConsumeOutcome, StoreError>;

    /// Move `from`'s accumulated usage into `to`, only when `to` has none
    ///
    /// Returns the migrated amount (zero when nothing moved).
    async fn migrate_if_unused(
        &self,
        from: &UsageKey,
        to: &UsageKey,
    ) -> Result<u64, StoreError>;
}

/// Persisted analysis results
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Fetch a persisted result by cache key
    async fn get_analysis(&self, cache_key: &str) -> Result<Option<AnalysisRecord>, StoreError>;

    /// Persist a result, replacing any previous record for the same key
    async fn put_analysis(&self, record: AnalysisRecord) -> Result<(), StoreError>;
}
