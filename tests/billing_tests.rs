use chrono::{Duration, TimeZone, Utc};

use gympro_auth::billing::{
    BillingCycle, PlanPricing, checkout_amount, is_immediate_change, proration_credit,
};
use gympro_auth::currency::Currency;

#[test]
fn plan_amount_ignores_missing_and_zero_prices() {
    let pricing = PlanPricing {
        monthly: Some(2500.0),
        yearly: Some(0.0),
    };
    assert_eq!(pricing.amount(BillingCycle::Monthly), Some(2500.0));
    assert_eq!(pricing.amount(BillingCycle::Yearly), None);
    assert_eq!(PlanPricing::default().amount(BillingCycle::Monthly), None);
}

#[test]
fn credit_is_the_unused_share_of_the_period() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(30);
    let now = start + Duration::days(10);

    let credit = proration_credit(3000.0, start, end, now, false);
    assert!((credit - 2000.0).abs() < 1e-6);
}

#[test]
fn credit_is_zero_for_trials_finished_or_empty_periods() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(30);

    assert_eq!(proration_credit(3000.0, start, end, start, true), 0.0);
    assert_eq!(
        proration_credit(3000.0, start, end, end + Duration::days(1), false),
        0.0
    );
    assert_eq!(proration_credit(3000.0, end, start, start, false), 0.0);
}

#[test]
fn credit_never_exceeds_the_price() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(30);
    let before_start = start - Duration::days(3);

    assert_eq!(proration_credit(3000.0, start, end, before_start, false), 3000.0);
}

#[test]
fn checkout_amount_prorates_only_immediate_changes() {
    assert_eq!(checkout_amount(5000.0, 1999.6, true, Currency::DZD), Ok(3000));
    assert_eq!(checkout_amount(1000.0, 2500.0, true, Currency::DZD), Ok(0));
    assert_eq!(checkout_amount(5000.0, 1999.6, false, Currency::DZD), Ok(5000));
}

#[test]
fn checkout_amount_keeps_cents() {
    assert_eq!(checkout_amount(29.99, 0.0, true, Currency::USD), Ok(2999));
    assert_eq!(checkout_amount(29.99, 10.004, true, Currency::USD), Ok(1999));
    assert_eq!(checkout_amount(49.95, 12.5, false, Currency::USD), Ok(4995));
    assert_eq!(checkout_amount(9.999, 0.0, true, Currency::KWD), Ok(9999));
}

#[test]
fn checkout_amount_rejects_non_finite_prices() {
    assert!(checkout_amount(f64::NAN, 0.0, true, Currency::USD).is_err());
    assert!(checkout_amount(10.0, f64::INFINITY, true, Currency::USD).is_err());
}

#[test]
fn upgrades_and_longer_cycles_are_immediate() {
    use BillingCycle::{Monthly, Yearly};

    assert!(is_immediate_change(1, Monthly, 2, Monthly));
    assert!(is_immediate_change(1, Monthly, 1, Yearly));
    assert!(!is_immediate_change(2, Monthly, 1, Yearly));
    assert!(!is_immediate_change(1, Yearly, 1, Monthly));
    assert!(!is_immediate_change(1, Monthly, 1, Monthly));
}
