//! Plain-text analytics report

use super::AnalyticsSummary;

/// Render a human-readable summary for the organisers
pub fn render_report(event_name: &str, summary: &AnalyticsSummary) -> String {
    let snap = &summary.snapshot;
    let mut lines = vec![
        format!("{} - Intake Report", event_name),
        "=".repeat(event_name.chars().count() + 16),
        String::new(),
        format!("Requests:        {}", snap.total_requests),
        format!("Codes issued:    {}", snap.total_issued),
        format!("Conversion rate: {:.1}%", summary.conversion_rate * 100.0),
        format!("Average score:   {:.2}/10", summary.average_score),
        format!("Average length:  {:.0} chars", summary.average_text_length),
        format!("Unique users:    {}", summary.unique_users),
    ];

    if let (Some(start), Some(end)) = (snap.started_at, snap.last_updated) {
        lines.push(format!(
            "Period:          {} .. {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        ));
    }

    if !snap.per_tier_counts.is_empty() {
        lines.push(String::new());
        lines.push("Tiers".to_string());
        for (tier, count) in &snap.per_tier_counts {
            lines.push(format!("  {:<12} {}", tier, count));
        }
    }

    if !snap.per_category_counts.is_empty() {
        lines.push(String::new());
        lines.push("Categories".to_string());
        for (category, count) in &snap.per_category_counts {
            lines.push(format!("  {:<12} {}", category, count));
        }
    }

    if !snap.per_sentiment_counts.is_empty() {
        lines.push(String::new());
        lines.push("Sentiment".to_string());
        for (sentiment, count) in &snap.per_sentiment_counts {
            lines.push(format!("  {:<12} {}", sentiment, count));
        }
    }

    if !summary.top_hours.is_empty() {
        lines.push(String::new());
        lines.push("Busiest hours (UTC)".to_string());
        for (hour, count) in &summary.top_hours {
            lines.push(format!("  {:02}:00        {}", hour, count));
        }
    }

    if !summary.top_domains.is_empty() {
        lines.push(String::new());
        lines.push("Top domains".to_string());
        for (domain, count) in &summary.top_domains {
            lines.push(format!("  {:<24} {}", domain, count));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsSnapshot;

    #[test]
    fn test_empty_report() {
        let report = render_report("TechHack 2024", &AnalyticsSnapshot::default().summary());
        assert!(report.starts_with("TechHack 2024 - Intake Report"));
        assert!(report.contains("Conversion rate: 0.0%"));
        assert!(!report.contains("Tiers"));
        assert!(!report.contains("Categories"));
        assert!(!report.contains("Sentiment"));
    }

    #[test]
    fn test_report_lists_tiers() {
        let mut snap = AnalyticsSnapshot::default();
        snap.total_requests = 4;
        snap.total_issued = 2;
        snap.per_tier_counts.insert("PREMIUM".into(), 2);
        let report = render_report("Hack", &snap.summary());
        assert!(report.contains("Conversion rate: 50.0%"));
        assert!(report.contains("PREMIUM"));
    }

    #[test]
    fn test_report_lists_categories_and_sentiment() {
        let mut snap = AnalyticsSnapshot::default();
        snap.per_category_counts.insert("LOGISTICS".into(), 3);
        snap.per_category_counts.insert("TECHNICAL".into(), 1);
        snap.per_sentiment_counts.insert("negative".into(), 2);
        snap.per_sentiment_counts.insert("positive".into(), 2);
        let report = render_report("Hack", &snap.summary());

        assert!(report.contains("Categories\n  LOGISTICS    3\n  TECHNICAL    1"));
        assert!(report.contains("Sentiment\n  negative     2\n  positive     2"));
    }
}
