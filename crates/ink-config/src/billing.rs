use serde::Deserialize;

/// Billing constants and the membership discount table
///
/// Amounts are in CNY. The defaults mirror the production pricing model;
/// all of them are overridable for staging environments.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Complimentary calls granted to every user each calendar month
    #[serde(default = "default_monthly_grant_base")]
    pub monthly_grant_base: u32,
    /// Upper bound on the monthly grant regardless of lifetime spend
    #[serde(default = "default_monthly_grant_max")]
    pub monthly_grant_max: u32,
    /// Virtual cost of one grant call, used to scale grants with spend
    #[serde(default = "default_grant_call_virtual_cost")]
    pub grant_call_virtual_cost: f64,
    /// One-time paid-call bonus credited at registration
    #[serde(default = "default_new_user_bonus")]
    pub new_user_bonus: u32,
    /// Undiscounted price of one premium-model call
    #[serde(default = "default_advanced_model_base_cost")]
    pub advanced_model_base_cost: f64,
    /// Membership tiers ordered by ascending minimum spend
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,
}

/// One membership tier band
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Tier display name
    pub name: String,
    /// Minimum lifetime spend (inclusive) for this tier
    pub min_amount: f64,
    /// Discount applied to the paid-call price, 0.0 to 1.0
    pub discount: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            monthly_grant_base: default_monthly_grant_base(),
            monthly_grant_max: default_monthly_grant_max(),
            grant_call_virtual_cost: default_grant_call_virtual_cost(),
            new_user_bonus: default_new_user_bonus(),
            advanced_model_base_cost: default_advanced_model_base_cost(),
            tiers: default_tiers(),
        }
    }
}

impl BillingConfig {
    /// Validate tier ordering and discount ranges
    ///
    /// # Errors
    ///
    /// Returns an error if tiers are empty, unsorted, or carry a
    /// discount outside [0, 1)
    pub fn validate(&self) -> Result<(), String> {
        if self.tiers.is_empty() {
            return Err("billing.tiers must not be empty".to_owned());
        }
        if self.tiers[0].min_amount != 0.0 {
            return Err("the first billing tier must start at 0".to_owned());
        }
        for window in self.tiers.windows(2) {
            if window[1].min_amount <= window[0].min_amount {
                return Err("billing.tiers must be sorted by ascending min_amount".to_owned());
            }
        }
        for tier in &self.tiers {
            if !(0.0..1.0).contains(&tier.discount) {
                return Err(format!("tier '{}' discount must be in [0, 1)", tier.name));
            }
        }
        if self.grant_call_virtual_cost <= 0.0 {
            return Err("billing.grant_call_virtual_cost must be positive".to_owned());
        }
        if self.advanced_model_base_cost <= 0.0 {
            return Err("billing.advanced_model_base_cost must be positive".to_owned());
        }
        Ok(())
    }
}

const fn default_monthly_grant_base() -> u32 {
    10
}

const fn default_monthly_grant_max() -> u32 {
    80
}

const fn default_grant_call_virtual_cost() -> f64 {
    1.2
}

const fn default_new_user_bonus() -> u32 {
    20
}

const fn default_advanced_model_base_cost() -> f64 {
    1.5
}

fn default_tiers() -> Vec<TierConfig> {
    [
        ("Regular", 0.0, 0.0),
        ("Supporter", 30.0, 0.05),
        ("Bronze", 100.0, 0.10),
        ("Silver", 300.0, 0.15),
        ("Gold", 600.0, 0.20),
    ]
    .into_iter()
    .map(|(name, min_amount, discount)| TierConfig {
        name: name.to_owned(),
        min_amount,
        discount,
    })
    .collect()
}
