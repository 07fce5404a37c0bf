use common::dates::MonthYear;
use uuid::Uuid;

/// Listing filter; every field is optional and set fields are AND-ed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Filter for the total cost aggregate over the inclusive window
/// `window_start..=window_end`.
#[derive(Debug, Clone, PartialEq)]
pub struct CostFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    pub window_start: MonthYear,
    pub window_end: MonthYear,
}
