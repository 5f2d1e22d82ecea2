//! Page data that bridges services with templates, plus the display helpers
//! templates use to format backend values.

pub mod console;
pub mod portal;

use crate::domain::collections::AgingBucket;

/// Decimal strings are shown with two digits; anything unparsable is shown as is.
pub fn format_money(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => format!("{parsed:.2}"),
        _ => value.to_string(),
    }
}

/// CSS classes of the status pill shown next to any backend status.
pub fn status_pill_class(status: &str) -> &'static str {
    match status {
        "active" | "paid" | "resolved" => "status-pill status-active",
        "suspended" | "issued" | "in_progress" => "status-pill status-suspended",
        "terminated" | "retired" | "overdue" | "open" => "status-pill status-terminated",
        "draft" | "closed" | "void" => "status-pill status-draft",
        _ => "status-pill status-neutral",
    }
}

/// `1_30` becomes `1-30 days`; unknown keys are returned unchanged.
pub fn aging_label(bucket: &str) -> String {
    AgingBucket::parse(bucket)
        .map(|bucket| bucket.label().to_string())
        .unwrap_or_else(|| bucket.to_string())
}
