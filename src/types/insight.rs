//! Model output records and the aggregates derived from them.

use serde::{Deserialize, Serialize};

/// Parsed result of one model call on one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInsightOutput {
    pub insights: Vec<String>,
    pub usage_examples: Vec<String>,
}

impl ModelInsightOutput {
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty() && self.usage_examples.is_empty()
    }
}

/// Coarse recency classification derived from document timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessSla {
    Hot,
    Warm,
    Cold,
}

impl std::fmt::Display for FreshnessSla {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FreshnessSla::Hot => "hot",
            FreshnessSla::Warm => "warm",
            FreshnessSla::Cold => "cold",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedInsights {
    pub insights: Vec<String>,
    pub usage_examples: Vec<String>,
    pub freshness_sla: FreshnessSla,
}

// =============================================================================
// Tagged insights
// =============================================================================

const KEY_COLUMN_TAG: &str = "<insight_1>";
const BUSINESS_MEANING_TAG: &str = "<insight_2>";
const GOTCHA_TAG: &str = "<insight_3>";

/// Insight string routed by its leading tag marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedInsight {
    KeyColumn(String),
    BusinessMeaning(String),
    Gotcha(String),
    Unrecognized,
}

impl TaggedInsight {
    pub fn parse(text: &str) -> Self {
        let text = text.trim_start();
        let tags: [(&str, fn(String) -> Self); 3] = [
            (KEY_COLUMN_TAG, Self::KeyColumn),
            (BUSINESS_MEANING_TAG, Self::BusinessMeaning),
            (GOTCHA_TAG, Self::Gotcha),
        ];

        for (tag, variant) in tags {
            let Some(head) = text.get(..tag.len()) else {
                continue;
            };
            if head.eq_ignore_ascii_case(tag) {
                return variant(text[tag.len()..].trim().to_string());
            }
        }
        Self::Unrecognized
    }
}

// =============================================================================
// Report parts
// =============================================================================

/// Reporter template variables, in template order
pub const REPORT_SECTIONS: [&str; 4] = [
    "key_columns",
    "business_meanings",
    "gotchas",
    "sample_queries",
];

/// Named report sections; empty sections are never present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_meanings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gotchas: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_queries: Option<Vec<String>>,
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() { None } else { Some(items) }
}

impl ReportParts {
    /// Route aggregated insights into sections and drop empty ones.
    pub fn derive(aggregated: &AggregatedInsights) -> Self {
        let mut key_columns = Vec::new();
        let mut business_meanings = Vec::new();
        let mut gotchas = Vec::new();

        for insight in &aggregated.insights {
            match TaggedInsight::parse(insight) {
                TaggedInsight::KeyColumn(text) => key_columns.push(text),
                TaggedInsight::BusinessMeaning(text) => business_meanings.push(text),
                TaggedInsight::Gotcha(text) => gotchas.push(text),
                TaggedInsight::Unrecognized => {}
            }
        }

        Self {
            key_columns: non_empty(key_columns),
            business_meanings: non_empty(business_meanings),
            gotchas: non_empty(gotchas),
            sample_queries: non_empty(aggregated.usage_examples.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections().next().is_none()
    }

    /// Present sections in template order
    pub fn sections(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        REPORT_SECTIONS
            .into_iter()
            .zip([
                &self.key_columns,
                &self.business_meanings,
                &self.gotchas,
                &self.sample_queries,
            ])
            .filter_map(|(name, items)| {
                items
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (name, v))
            })
    }
}
