//! Prorated cost of subscriptions over a month window.
//!
//! A subscription active during any part of a month is billed for that whole
//! month, so cost is `price` times the inclusive count of months in the
//! intersection of the subscription's active interval and the query window.
//! Open-ended subscriptions run through the window end.

use common::dates::MonthYear;
use db::models::subscription::Subscription;

/// Whether a subscription is active at some point inside the window.
pub fn overlaps(
    start_date: MonthYear,
    end_date: Option<MonthYear>,
    window_start: MonthYear,
    window_end: MonthYear,
) -> bool {
    start_date <= window_end && end_date.is_none_or(|end| end >= window_start)
}

/// Months billed inside the window, zero when the intervals do not meet.
pub fn billable_months(
    start_date: MonthYear,
    end_date: Option<MonthYear>,
    window_start: MonthYear,
    window_end: MonthYear,
) -> i64 {
    let effective_start = start_date.max(window_start);
    let effective_end = end_date.unwrap_or(window_end).min(window_end);

    if effective_end < effective_start {
        return 0;
    }
    effective_start.months_until(&effective_end)
}

/// Contribution of one subscription to the total over the window.
pub fn subscription_cost(
    subscription: &Subscription,
    window_start: MonthYear,
    window_end: MonthYear,
) -> i64 {
    billable_months(
        subscription.start_date,
        subscription.end_date,
        window_start,
        window_end,
    ) * i64::from(subscription.price)
}
