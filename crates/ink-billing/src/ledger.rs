//! The uid-keyed call-credit ledger

use std::sync::Arc;

use ink_config::BillingConfig;
use ink_store::{AfdOrder, BalancePool, BillingStore, OrderStore, UserBilling};
use jiff::Timestamp;
use serde::Serialize;

use crate::afdian::OrderVerifier;
use crate::error::BillingError;
use crate::pricing;

/// A user's ledger with derived tier and pricing fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingInfo {
    /// The ledger record
    #[serde(flatten)]
    pub billing: UserBilling,
    /// Membership tier for the lifetime total
    pub tier: pricing::MemberTier,
    /// Discounted per-call price at the current tier
    pub call_price: f64,
    /// Grant-pool size the next monthly refresh will set
    pub monthly_grant_calls: u32,
}

/// Result of a successful order redemption
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionOutcome {
    /// Grant calls credited by this order
    pub grant_calls_added: u32,
    /// Paid calls credited by this order
    pub paid_calls_added: u32,
    /// Lifetime total after the order
    pub total_amount: f64,
    /// Grant balance after the order
    pub grant_calls_balance: u32,
    /// Paid balance after the order
    pub paid_calls_balance: u32,
}

/// Per-user call-credit ledger
///
/// Owns no state of its own; all mutation goes through the store's atomic
/// conditional operations.
pub struct BillingLedger {
    store: Arc<dyn BillingStore>,
    orders: Arc<dyn OrderStore>,
    verifier: Option<Arc<dyn OrderVerifier>>,
    config: BillingConfig,
}

impl BillingLedger {
    /// Create a ledger over the given stores
    ///
    /// `verifier` is `None` when order redemption is not configured.
    pub fn new(
        store: Arc<dyn BillingStore>,
        orders: Arc<dyn OrderStore>,
        verifier: Option<Arc<dyn OrderVerifier>>,
        config: BillingConfig,
    ) -> Self {
        Self {
            store,
            orders,
            verifier,
            config,
        }
    }

    /// Fetch a user's raw ledger record, if one exists
    ///
    /// # Errors
    ///
    /// Returns an error on store failure
    pub async fn get(&self, uid: u64) -> Result<Option<UserBilling>, BillingError> {
        Ok(self.store.get_billing(uid).await?)
    }

    /// Create a user's ledger record
    ///
    /// Idempotent: an existing record is left untouched. New records are
    /// seeded with the base monthly grant and the new-user paid bonus.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure
    pub async fn initialize(&self, uid: u64) -> Result<bool, BillingError> {
        let now = Timestamp::now();
        let record = UserBilling {
            uid,
            total_amount: 0.0,
            grant_calls_balance: self.config.monthly_grant_base,
            paid_calls_balance: self.config.new_user_bonus,
            last_grant_refresh: now,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_billing_if_absent(record).await?;
        if created {
            tracing::info!(uid, "initialized billing account");
        }
        Ok(created)
    }

    /// Replace the grant pool if the last refresh fell in an earlier month
    ///
    /// The pool is recomputed from the lifetime total, not incremented, so
    /// unused grants do not roll over.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::AccountNotFound`] when no record exists
    pub async fn refresh_grant_if_needed(&self, uid: u64) -> Result<bool, BillingError> {
        let refreshed = self
            .store
            .refresh_grant_if_stale(uid, Timestamp::now(), &|total| {
                pricing::calculate_monthly_grant_calls(&self.config, total)
            })
            .await
            .map_err(map_missing_account)?;

        if refreshed {
            tracing::info!(uid, "monthly grant refreshed");
        }
        Ok(refreshed)
    }

    /// Deduct one call, preferring the grant pool
    ///
    /// Runs the monthly refresh first so a stale record cannot deny a user
    /// their new grant.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::NoBalance`] when both pools are empty and
    /// [`BillingError::AccountNotFound`] when no record exists
    pub async fn deduct_call(&self, uid: u64) -> Result<BalancePool, BillingError> {
        self.refresh_grant_if_needed(uid).await?;

        let pool = self
            .store
            .deduct_preferring_grant(uid, Timestamp::now())
            .await
            .map_err(map_missing_account)?
            .ok_or(BillingError::NoBalance)?;

        tracing::debug!(uid, pool = ?pool, "deducted one call");
        Ok(pool)
    }

    /// Whether the user has any calls left after a refresh
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::AccountNotFound`] when no record exists
    pub async fn has_available_calls(&self, uid: u64) -> Result<bool, BillingError> {
        self.refresh_grant_if_needed(uid).await?;

        let billing = self
            .store
            .get_billing(uid)
            .await?
            .ok_or(BillingError::AccountNotFound)?;
        Ok(billing.grant_calls_balance > 0 || billing.paid_calls_balance > 0)
    }

    /// A user's ledger with derived tier and pricing fields
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::AccountNotFound`] when no record exists
    pub async fn info(&self, uid: u64) -> Result<BillingInfo, BillingError> {
        self.refresh_grant_if_needed(uid).await?;

        let billing = self
            .store
            .get_billing(uid)
            .await?
            .ok_or(BillingError::AccountNotFound)?;

        let tier = pricing::member_tier_info(&self.config, billing.total_amount);
        let call_price = pricing::calculate_paid_call_price(&self.config, billing.total_amount);
        let monthly_grant_calls =
            pricing::calculate_monthly_grant_calls(&self.config, billing.total_amount);

        Ok(BillingInfo {
            billing,
            tier,
            call_price,
            monthly_grant_calls,
        })
    }

    /// Redeem a sponsorship order into call credits
    ///
    /// The order is verified against the platform, then recorded with an
    /// atomic insert on its order number before any credit lands; a
    /// concurrent duplicate loses the insert and fails, never crediting
    /// twice. Paid calls are priced at the tier the user held before the
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error when redemption is unconfigured, the order fails
    /// verification, was already redeemed, or the account is missing
    pub async fn redeem_order(
        &self,
        uid: u64,
        afd_id: &str,
        order_no: &str,
    ) -> Result<RedemptionOutcome, BillingError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(BillingError::NotConfigured)?;

        // Fast-path duplicate check before the network round trip
        if self.orders.get_order(order_no).await?.is_some() {
            return Err(BillingError::AlreadyRedeemed);
        }

        let verified = verifier.verify_order(order_no, afd_id).await?;

        let billing = self
            .store
            .get_billing(uid)
            .await?
            .ok_or(BillingError::AccountNotFound)?;

        let credits =
            pricing::calculate_calls_from_order(&self.config, verified.amount, billing.total_amount);

        let now = Timestamp::now();
        let record = AfdOrder {
            order_no: order_no.to_owned(),
            uid,
            afd_id: afd_id.to_owned(),
            amount: verified.amount,
            redeemed_at: now,
            grant_calls_added: credits.grant_added,
            paid_calls_added: credits.paid_added,
        };

        if !self.orders.insert_order_if_absent(record).await? {
            return Err(BillingError::AlreadyRedeemed);
        }

        let updated = self
            .store
            .credit_redemption(uid, verified.amount, credits.grant_added, credits.paid_added, now)
            .await
            .map_err(map_missing_account)?;

        tracing::info!(
            uid,
            order_no,
            amount = verified.amount,
            grant_added = credits.grant_added,
            paid_added = credits.paid_added,
            "order redeemed"
        );

        Ok(RedemptionOutcome {
            grant_calls_added: credits.grant_added,
            paid_calls_added: credits.paid_added,
            total_amount: updated.total_amount,
            grant_calls_balance: updated.grant_calls_balance,
            paid_calls_balance: updated.paid_calls_balance,
        })
    }
}

fn map_missing_account(err: ink_store::StoreError) -> BillingError {
    match err {
        ink_store::StoreError::NotFound { .. } => BillingError::AccountNotFound,
        other => BillingError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ink_store::MemoryStore;

    use super::*;
    use crate::afdian::{OrderVerifier, VerifiedOrder};

    struct StubVerifier {
        owner: String,
        amount: f64,
    }

    #[async_trait]
    impl OrderVerifier for StubVerifier {
        async fn verify_order(
            &self,
            _order_no: &str,
            afd_id: &str,
        ) -> Result<VerifiedOrder, BillingError> {
            if afd_id == self.owner {
                Ok(VerifiedOrder {
                    amount: self.amount,
                })
            } else {
                Err(BillingError::OrderNotOwned)
            }
        }
    }

    fn ledger_with(amount: f64) -> BillingLedger {
        let store = Arc::new(MemoryStore::new());
        BillingLedger::new(
            store.clone(),
            store,
            Some(Arc::new(StubVerifier {
                owner: "afd-9".to_owned(),
                amount,
            })),
            BillingConfig::default(),
        )
    }

    #[tokio::test]
    async fn initialize_seeds_both_pools_once() {
        let ledger = ledger_with(30.0);

        assert!(ledger.initialize(1).await.unwrap());
        assert!(!ledger.initialize(1).await.unwrap());

        let billing = ledger.get(1).await.unwrap().unwrap();
        assert_eq!(billing.grant_calls_balance, 10);
        assert_eq!(billing.paid_calls_balance, 20);
    }

    #[tokio::test]
    async fn get_never_creates_state() {
        let ledger = ledger_with(30.0);
        assert!(ledger.get(7).await.unwrap().is_none());
        assert!(matches!(
            ledger.deduct_call(7).await.unwrap_err(),
            BillingError::AccountNotFound
        ));
    }

    #[tokio::test]
    async fn deduction_order_and_exhaustion() {
        let ledger = ledger_with(30.0);
        ledger.initialize(1).await.unwrap();

        // 10 grants first, then 20 paid
        for _ in 0..10 {
            assert_eq!(ledger.deduct_call(1).await.unwrap(), BalancePool::Grant);
        }
        for _ in 0..20 {
            assert_eq!(ledger.deduct_call(1).await.unwrap(), BalancePool::Paid);
        }

        assert!(matches!(
            ledger.deduct_call(1).await.unwrap_err(),
            BillingError::NoBalance
        ));
        assert!(!ledger.has_available_calls(1).await.unwrap());
    }

    #[tokio::test]
    async fn redeem_credits_and_is_idempotent() {
        let ledger = ledger_with(30.0);
        ledger.initialize(1).await.unwrap();

        let outcome = ledger.redeem_order(1, "afd-9", "ORDER-1").await.unwrap();
        assert_eq!(outcome.paid_calls_added, 20);
        assert_eq!(outcome.grant_calls_added, 25);
        assert!((outcome.total_amount - 30.0).abs() < 1e-9);
        assert_eq!(outcome.grant_calls_balance, 35);
        assert_eq!(outcome.paid_calls_balance, 40);

        let err = ledger.redeem_order(1, "afd-9", "ORDER-1").await.unwrap_err();
        assert!(matches!(err, BillingError::AlreadyRedeemed));

        // Balances unchanged by the failed duplicate
        let billing = ledger.get(1).await.unwrap().unwrap();
        assert_eq!(billing.paid_calls_balance, 40);
    }

    #[tokio::test]
    async fn redeem_rejects_foreign_order() {
        let ledger = ledger_with(30.0);
        ledger.initialize(1).await.unwrap();

        let err = ledger.redeem_order(1, "afd-other", "ORDER-1").await.unwrap_err();
        assert!(matches!(err, BillingError::OrderNotOwned));
    }

    #[tokio::test]
    async fn redeem_without_verifier_is_not_configured() {
        let store = Arc::new(MemoryStore::new());
        let ledger = BillingLedger::new(store.clone(), store, None, BillingConfig::default());
        ledger.initialize(1).await.unwrap();

        let err = ledger.redeem_order(1, "afd-9", "ORDER-1").await.unwrap_err();
        assert!(matches!(err, BillingError::NotConfigured));
    }

    #[tokio::test]
    async fn info_exposes_tier_and_price() {
        let ledger = ledger_with(100.0);
        ledger.initialize(1).await.unwrap();
        ledger.redeem_order(1, "afd-9", "ORDER-1").await.unwrap();

        let info = ledger.info(1).await.unwrap();
        assert_eq!(info.tier.name, "Bronze");
        assert!((info.call_price - 1.35).abs() < 1e-9);
        assert_eq!(info.monthly_grant_calls, 80);
    }
}
