//! In-memory reference backend
//!
//! One `DashMap` per collection; atomic conditional operations run under the
//! map's per-entry lock.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::error::StoreError;
use crate::records::{AfdOrder, AnalysisRecord, BalancePool, UsageKey, UserBilling};
use crate::{AnalysisStore, BillingStore, ConsumeOutcome, GrantForTotal, OrderStore, QuotaStore};

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    billing: DashMap<u64, UserBilling>,
    orders: DashMap<String, AfdOrder>,
    usage: DashMap<UsageKey, u64>,
    analyses: DashMap<String, AnalysisRecord>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_utc_month(a: Timestamp, b: Timestamp) -> bool {
    let a = a.to_zoned(TimeZone::UTC);
    let b = b.to_zoned(TimeZone::UTC);
    a.year() == b.year() && a.month() == b.month()
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn get_billing(&self, uid: u64) -> Result<Option<UserBilling>, StoreError> {
        Ok(self.billing.get(&uid).map(|r| r.clone()))
    }

    async fn insert_billing_if_absent(&self, record: UserBilling) -> Result<bool, StoreError> {
        match self.billing.entry(record.uid) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn refresh_grant_if_stale(
        &self,
        uid: u64,
        now: Timestamp,
        grant_for_total: GrantForTotal<'_>,
    ) -> Result<bool, StoreError> {
        let mut record = self
            .billing
            .get_mut(&uid)
            .ok_or(StoreError::not_found("user_billing"))?;

        if same_utc_month(record.last_grant_refresh, now) {
            return Ok(false);
        }

        record.grant_calls_balance = grant_for_total(record.total_amount);
        record.last_grant_refresh = now;
        record.updated_at = now;
        Ok(true)
    }

    async fn deduct_preferring_grant(
        &self,
        uid: u64,
        now: Timestamp,
    ) -> Result<Option<BalancePool>, StoreError> {
        let mut record = self
            .billing
            .get_mut(&uid)
            .ok_or(StoreError::not_found("user_billing"))?;

        let pool = if record.grant_calls_balance > 0 {
            record.grant_calls_balance -= 1;
            BalancePool::Grant
        } else if record.paid_calls_balance > 0 {
            record.paid_calls_balance -= 1;
            BalancePool::Paid
        } else {
            return Ok(None);
        };

        record.updated_at = now;
        Ok(Some(pool))
    }

    async fn credit_redemption(
        &self,
        uid: u64,
        amount: f64,
        grant_added: u32,
        paid_added: u32,
        now: Timestamp,
    ) -> Result<UserBilling, StoreError> {
        let mut record = self
            .billing
            .get_mut(&uid)
            .ok_or(StoreError::not_found("user_billing"))?;

        record.total_amount += amount;
        record.grant_calls_balance += grant_added;
        record.paid_calls_balance += paid_added;
        record.updated_at = now;
        Ok(record.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_order(&self, order_no: &str) -> Result<Option<AfdOrder>, StoreError> {
        Ok(self.orders.get(order_no).map(|r| r.clone()))
    }

    async fn insert_order_if_absent(&self, order: AfdOrder) -> Result<bool, StoreError> {
        match self.orders.entry(order.order_no.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(order);
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl QuotaStore for MemoryStore {
    async fn usage(&self, key: &UsageKey) -> Result<u64, StoreError> {
        Ok(self.usage.get(key).map_or(0, |v| *v))
    }

    async fn try_consume(
        &self,
        key: &UsageKey,
        amount: u64,
        cap: u64,
    ) -> Result<ConsumeOutcome, StoreError> {
        match self.usage.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                let used = *slot.get();
                if used + amount > cap {
                    Ok(ConsumeOutcome::Denied { used })
                } else {
                    *slot.get_mut() = used + amount;
                    Ok(ConsumeOutcome::Allowed {
                        used_after: used + amount,
                    })
                }
            }
            Entry::Vacant(slot) => {
                if amount > cap {
                    Ok(ConsumeOutcome::Denied { used: 0 })
                } else {
                    slot.insert(amount);
                    Ok(ConsumeOutcome::Allowed { used_after: amount })
                }
            }
        }
    }

    async fn migrate_if_unused(
        &self,
        from: &UsageKey,
        to: &UsageKey,
    ) -> Result<u64, StoreError> {
        if self.usage.get(to).map_or(0, |v| *v) > 0 {
            return Ok(0);
        }

        // Take the source counter first so the two entries are never locked
        // at the same time
        let Some((_, migrated)) = self.usage.remove(from) else {
            return Ok(0);
        };
        if migrated == 0 {
            return Ok(0);
        }

        *self.usage.entry(to.clone()).or_insert(0) += migrated;
        Ok(migrated)
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn get_analysis(&self, cache_key: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        Ok(self.analyses.get(cache_key).map(|r| r.clone()))
    }

    async fn put_analysis(&self, record: AnalysisRecord) -> Result<(), StoreError> {
        self.analyses.insert(record.cache_key.clone(), record);
        Ok(())
    }
}
