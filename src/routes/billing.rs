use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::billing::{self, BillingCycle, PlanPricing};
use crate::currency::{Currency, from_smallest_unit};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub currency: String,
    pub cycle: BillingCycle,
    pub pricing: PlanPricing,
    #[serde(default)]
    pub level: u32,
    pub current: Option<CurrentSubscription>,
}

#[derive(Deserialize)]
pub struct CurrentSubscription {
    #[serde(default)]
    pub level: u32,
    pub cycle: BillingCycle,
    pub pricing: PlanPricing,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(default)]
    pub trialing: bool,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub currency: Currency,
    pub cycle: BillingCycle,
    pub full_price: f64,
    pub credit: f64,
    pub immediate: bool,
    pub amount: f64,
    pub amount_in_smallest_unit: i64,
}

/// Quote what a checkout for the target plan charges right now.
pub async fn quote(
    auth: AuthUser,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let currency: Currency = req.currency.parse()?;

    let full_price = req.pricing.amount(req.cycle).ok_or_else(|| {
        AppError::BadRequest("Price not available for this billing cycle".to_string())
    })?;

    let (credit, immediate) = match &req.current {
        None => (0.0, true),
        Some(current) => {
            let immediate =
                billing::is_immediate_change(current.level, current.cycle, req.level, req.cycle);
            let credit = match current.pricing.amount(current.cycle) {
                Some(price) if immediate => billing::proration_credit(
                    price,
                    current.period_start,
                    current.period_end,
                    Utc::now(),
                    current.trialing,
                ),
                _ => 0.0,
            };
            (credit, immediate)
        }
    };

    let amount_in_smallest_unit =
        billing::checkout_amount(full_price, credit, immediate, currency)?;
    let amount = from_smallest_unit(amount_in_smallest_unit, currency);

    tracing::debug!(
        "Quote for user {}: {amount} {currency} (full {full_price}, credit {credit:.2})",
        auth.user_id
    );

    Ok(Json(QuoteResponse {
        currency,
        cycle: req.cycle,
        full_price,
        credit,
        immediate,
        amount,
        amount_in_smallest_unit,
    }))
}
