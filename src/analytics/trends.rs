use std::collections::BTreeMap;

use super::{TrendPoint, UploadTrend, UserTrend};

/// One day of the combined trend table. A series with no entry for the
/// date leaves its cells empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub date: String,
    pub users: Option<TrendPoint>,
    pub active_users: Option<TrendPoint>,
    pub uploads: Option<TrendPoint>,
}

impl TrendRow {
    fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            users: None,
            active_users: None,
            uploads: None,
        }
    }
}

/// Joins the user and upload series on their `date` key, newest first.
/// Dates are `YYYY-MM-DD`, so string order is chronological.
pub fn merge_trends(users: &[UserTrend], uploads: &[UploadTrend]) -> Vec<TrendRow> {
    let mut rows: BTreeMap<&str, TrendRow> = BTreeMap::new();

    for trend in users {
        let row = rows
            .entry(trend.date.as_str())
            .or_insert_with(|| TrendRow::empty(&trend.date));
        row.users = Some(trend.users);
        row.active_users = Some(trend.active_users);
    }
    for trend in uploads {
        let row = rows
            .entry(trend.date.as_str())
            .or_insert_with(|| TrendRow::empty(&trend.date));
        row.uploads = Some(trend.uploads);
    }

    rows.into_values().rev().collect()
}
