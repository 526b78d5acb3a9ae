//! Admin analytics summary: what `GET /api/admin/analytics` returns, and a
//! date-aligned view of its two daily trend series.

pub mod table;
pub mod trends;

use serde::{Deserialize, Serialize};

pub use table::render_report;
pub use trends::{TrendRow, merge_trends};

/// A count and its change against the previous period, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub increase: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadBreakdown {
    pub images: u64,
    pub documents: u64,
    pub others: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SentimentCounts {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub custom: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadStats {
    pub total: u64,
    pub breakdown: UploadBreakdown,
    pub voice_notes: u64,
    pub increase: f64,
    pub timeframe: String,
    pub sentiment_analysis: SentimentCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub users: TrendPoint,
    pub active_users: TrendPoint,
    pub timeframe: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadTrend {
    pub date: String,
    pub uploads: TrendPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserTrend {
    pub date: String,
    pub users: TrendPoint,
    pub active_users: TrendPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsReport {
    pub upload_stats: UploadStats,
    pub user_stats: UserStats,
    pub recent_upload_trends: Vec<UploadTrend>,
    pub recent_user_trends: Vec<UserTrend>,
}

impl AnalyticsReport {
    pub fn trend_rows(&self) -> Vec<TrendRow> {
        merge_trends(&self.recent_user_trends, &self.recent_upload_trends)
    }
}
