//! Insight aggregation across chunk outputs.
//!
//! - insights: deduplicated by trimmed, case-insensitive text; first occurrence wins
//! - usage examples: ranked by trimmed-text frequency, ties in first-seen order
//! - freshness: newest parseable `last_updated` date decides hot/warm/cold

use chrono::{DateTime, Local, NaiveDate};
use std::collections::{HashMap, HashSet};

use crate::constants::freshness::{HOT_MAX_AGE_DAYS, WARM_MAX_AGE_DAYS};
use crate::types::{AggregatedInsights, Document, FreshnessSla, ModelInsightOutput};

/// Merge chunk outputs using today's local date for freshness
pub fn merge_insights(outputs: &[ModelInsightOutput], docs: &[Document]) -> AggregatedInsights {
    merge_insights_at(outputs, docs, Local::now().date_naive())
}

/// Merge chunk outputs relative to a fixed `today`
pub fn merge_insights_at(
    outputs: &[ModelInsightOutput],
    docs: &[Document],
    today: NaiveDate,
) -> AggregatedInsights {
    AggregatedInsights {
        insights: dedupe_insights(outputs),
        usage_examples: rank_usage_examples(outputs),
        freshness_sla: classify_freshness(docs, today),
    }
}

fn dedupe_insights(outputs: &[ModelInsightOutput]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut insights = Vec::new();

    for insight in outputs.iter().flat_map(|o| &o.insights) {
        let trimmed = insight.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            insights.push(trimmed.to_string());
        }
    }
    insights
}

fn rank_usage_examples(outputs: &[ModelInsightOutput]) -> Vec<String> {
    // (first-seen position, count) per example
    let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();

    for example in outputs.iter().flat_map(|o| &o.usage_examples) {
        let trimmed = example.trim();
        if trimmed.is_empty() {
            continue;
        }
        let next = tally.len();
        tally.entry(trimmed).or_insert((next, 0)).1 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = tally.into_iter().collect();
    ranked.sort_by(|(_, (pos_a, n_a)), (_, (pos_b, n_b))| n_b.cmp(n_a).then(pos_a.cmp(pos_b)));
    ranked.into_iter().map(|(s, _)| s.to_string()).collect()
}

/// Classify by the youngest document age; undated corpora are cold
pub fn classify_freshness(docs: &[Document], today: NaiveDate) -> FreshnessSla {
    let min_age = docs
        .iter()
        .filter_map(|d| d.last_updated.as_deref())
        .filter_map(parse_iso_date)
        .map(|date| (today - date).num_days())
        .min();

    match min_age {
        Some(age) if age <= HOT_MAX_AGE_DAYS => FreshnessSla::Hot,
        Some(age) if age <= WARM_MAX_AGE_DAYS => FreshnessSla::Warm,
        _ => FreshnessSla::Cold,
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
