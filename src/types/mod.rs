pub mod document;
pub mod error;
pub mod insight;
pub mod state;

pub use document::{Chunk, Column, DocType, Document, Lineage};
pub use error::{GuideError, Result};
pub use insight::{
    AggregatedInsights, FreshnessSla, ModelInsightOutput, REPORT_SECTIONS, ReportParts,
    TaggedInsight,
};
pub use state::{PlanStep, StateUpdate, TableResearchState};
