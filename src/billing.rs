use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::{Currency, CurrencyError, to_smallest_unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

/// Plan prices in major units of a single currency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanPricing {
    pub monthly: Option<f64>,
    pub yearly: Option<f64>,
}

impl PlanPricing {
    /// Price for the cycle; a missing or zero price counts as not configured.
    pub fn amount(&self, cycle: BillingCycle) -> Option<f64> {
        let price = match cycle {
            BillingCycle::Monthly => self.monthly,
            BillingCycle::Yearly => self.yearly,
        }?;
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

/// Unused share of the current period's price.
///
/// Trials earn no credit, and neither does a period whose end is not after its
/// start.
pub fn proration_credit(
    current_price: f64,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    now: DateTime<Utc>,
    trialing: bool,
) -> f64 {
    if trialing {
        return 0.0;
    }

    let total = (period_end - period_start).num_milliseconds();
    if total <= 0 {
        return 0.0;
    }

    let elapsed = (now - period_start).num_milliseconds();
    let remaining = (total - elapsed).clamp(0, total);

    current_price * remaining as f64 / total as f64
}

/// Amount to charge now, in the currency's smallest unit. Only immediate
/// changes are prorated; deferred ones are billed in full at the end of the
/// current period.
///
/// Both prices are converted before subtracting so rounding happens at the
/// minor unit and never eats cents.
pub fn checkout_amount(
    target_price: f64,
    credit: f64,
    immediate: bool,
    currency: Currency,
) -> Result<i64, CurrencyError> {
    let target = to_smallest_unit(target_price, currency)?;
    if !immediate {
        return Ok(target);
    }
    let credit = to_smallest_unit(credit, currency)?;
    Ok((target - credit).max(0))
}

/// A change is immediate when it moves to a higher plan level, or stays on the
/// same level and moves to a longer billing cycle.
pub fn is_immediate_change(
    current_level: u32,
    current_cycle: BillingCycle,
    target_level: u32,
    target_cycle: BillingCycle,
) -> bool {
    target_level > current_level || (target_level == current_level && target_cycle > current_cycle)
}
