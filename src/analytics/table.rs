use std::fmt::Write;

use super::{AnalyticsReport, TrendPoint};

const MISSING: &str = "-";

/// `+12.5%`, `-3%`, `+0%`; rounded to two decimals.
pub fn format_increase(increase: f64) -> String {
    let rounded = (increase * 100.0).round() / 100.0;
    format!("{rounded:+}%")
}

fn cell(point: Option<TrendPoint>) -> String {
    match point {
        Some(point) => format!("{} ({})", point.total, format_increase(point.increase)),
        None => MISSING.to_string(),
    }
}

/// Plain-text rendition of the analytics dashboard.
pub fn render_report(report: &AnalyticsReport) -> String {
    let mut out = String::new();
    let uploads = &report.upload_stats;
    let users = &report.user_stats;

    let _ = writeln!(
        out,
        "Uploads: {} ({}) {}",
        uploads.total,
        format_increase(uploads.increase),
        uploads.timeframe
    );
    let _ = writeln!(
        out,
        "  images {} / documents {} / others {} / voice notes {}",
        uploads.breakdown.images,
        uploads.breakdown.documents,
        uploads.breakdown.others,
        uploads.voice_notes
    );
    let sentiment = &uploads.sentiment_analysis;
    let _ = writeln!(
        out,
        "  sentiment: positive {} / neutral {} / negative {} / custom {}",
        sentiment.positive, sentiment.neutral, sentiment.negative, sentiment.custom
    );
    let _ = writeln!(
        out,
        "Users: {} | Active users: {} {}",
        cell(Some(users.users)),
        cell(Some(users.active_users)),
        users.timeframe
    );

    let rows = report.trend_rows();
    if rows.is_empty() {
        let _ = writeln!(out, "\nNo recent trends.");
        return out;
    }

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.date.clone(),
                cell(row.users),
                cell(row.active_users),
                cell(row.uploads),
            ]
        })
        .collect();
    let header = ["Period", "Users", "Active Users", "Uploads"];
    let mut widths = header.map(str::len);
    for row in &cells {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let _ = writeln!(out, "\nRecent trends");
    let _ = writeln!(
        out,
        "{:<w0$}  {:<w1$}  {:<w2$}  {}",
        header[0],
        header[1],
        header[2],
        header[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2]
    );
    for row in &cells {
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        );
    }
    out
}
