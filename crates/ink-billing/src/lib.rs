//! Call-credit ledger and membership pricing
//!
//! One uid-keyed ledger with two pools: a monthly grant replaced from the
//! user's lifetime spend, and paid calls credited by redeeming sponsorship
//! orders. Initialization is explicit and idempotent; nothing is created
//! implicitly on read.

#![allow(clippy::must_use_candidate)]

pub mod afdian;
pub mod error;
pub mod ledger;
pub mod pricing;

pub use afdian::{AfdianClient, OrderVerifier, VerifiedOrder};
pub use error::BillingError;
pub use ledger::{BillingInfo, BillingLedger, RedemptionOutcome};
pub use pricing::{
    MemberTier, calculate_calls_from_order, calculate_monthly_grant_calls,
    calculate_paid_call_price, member_tier_info,
};
