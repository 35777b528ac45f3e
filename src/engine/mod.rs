//! Document compliance evaluation: normalization, per-section keyword
//! analysis and weighted scoring. Everything here is pure and infallible.

mod analyzer;
mod normalize;
mod scorer;
mod taxonomy;

pub use scorer::{SectionWeights, Weighting};
pub use taxonomy::{SectionId, Severity, TOTAL_SECTIONS_REQUIRED};

use analyzer::analyze_all;
use normalize::NormalizedDocument;
use scorer::{ScoreCard, assign_section_weights, score, summarize};
use crate::model::SectionAnalysis;

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub card: ScoreCard,
    pub summary: String,
    pub analyses: Vec<SectionAnalysis>,
}

pub fn evaluate_text(text: &str, weighting: &Weighting) -> Evaluation {
    let document = NormalizedDocument::from_raw(text);
    let mut analyses = analyze_all(&document).to_vec();
    assign_section_weights(&mut analyses, weighting);

    let card = score(&analyses, weighting);
    let summary = summarize(&card, &analyses);

    Evaluation {
        card,
        summary,
        analyses,
    }
}
