//! Pure pricing math
//!
//! All functions are total over any non-negative lifetime spend; the tier
//! table is validated at config load so lookups always hit a band.

use ink_config::BillingConfig;
use serde::Serialize;

/// A resolved membership tier
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTier {
    /// Tier display name
    pub name: String,
    /// Minimum lifetime spend for this tier
    pub min_amount: f64,
    /// Discount applied to the paid-call price
    pub discount: f64,
}

/// Monthly grant-pool size for a lifetime spend total
///
/// Base grant plus one call per `grant_call_virtual_cost` CNY spent,
/// capped at `monthly_grant_max`.
#[must_use]
pub fn calculate_monthly_grant_calls(config: &BillingConfig, total_amount: f64) -> u32 {
    let extra = (total_amount / config.grant_call_virtual_cost).floor().max(0.0);
    let calculated = f64::from(config.monthly_grant_base) + extra;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        calculated.min(f64::from(config.monthly_grant_max)) as u32
    }
}

/// The tier band containing `total_amount`
#[must_use]
pub fn member_tier_info(config: &BillingConfig, total_amount: f64) -> MemberTier {
    let tier = config
        .tiers
        .iter()
        .rev()
        .find(|tier| total_amount >= tier.min_amount)
        .unwrap_or(&config.tiers[0]);

    MemberTier {
        name: tier.name.clone(),
        min_amount: tier.min_amount,
        discount: tier.discount,
    }
}

/// Per-call price after the tier discount
#[must_use]
pub fn calculate_paid_call_price(config: &BillingConfig, total_amount: f64) -> f64 {
    let discount = member_tier_info(config, total_amount).discount;
    config.advanced_model_base_cost * (1.0 - discount)
}

/// Calls credited by one order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditedCalls {
    /// Immediate grant-pool top-up
    pub grant_added: u32,
    /// Paid calls purchased by the order amount
    pub paid_added: u32,
}

/// Compute the calls one order credits
///
/// The grant top-up is the growth of the monthly grant between the old and
/// new lifetime totals. Paid calls are priced at the tier the user held
/// before the order, so a tier upgrade applies to the next order only.
#[must_use]
pub fn calculate_calls_from_order(
    config: &BillingConfig,
    order_amount: f64,
    current_total_amount: f64,
) -> CreditedCalls {
    let new_total = current_total_amount + order_amount;
    let grant_added = calculate_monthly_grant_calls(config, new_total)
        .saturating_sub(calculate_monthly_grant_calls(config, current_total_amount));

    let price = calculate_paid_call_price(config, current_total_amount);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let paid_added = (order_amount / price).floor().max(0.0) as u32;

    CreditedCalls {
        grant_added,
        paid_added,
    }
}
