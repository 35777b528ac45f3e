use serde::{Deserialize, Serialize};

use crate::engine::taxonomy::{TOTAL_SECTIONS_REQUIRED, WeightCategory};
use crate::model::SectionAnalysis;

pub const COMPLIANCE_THRESHOLD: f64 = 80.0;
pub const STRUCTURE_WEIGHT: f64 = 0.30;
pub const COMPLETENESS_WEIGHT: f64 = 0.70;

/// Percentage weights for the eight SPMP categories. A valid profile sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionWeights {
    pub overview: u32,
    pub references: u32,
    pub definitions: u32,
    pub organization: u32,
    pub managerial_process: u32,
    pub technical_process: u32,
    pub supporting_process: u32,
    pub additional_plans: u32,
}

impl Default for SectionWeights {
    fn default() -> Self {
        Self {
            overview: 10,
            references: 5,
            definitions: 5,
            organization: 15,
            managerial_process: 20,
            technical_process: 20,
            supporting_process: 15,
            additional_plans: 10,
        }
    }
}

impl SectionWeights {
    /// Widened so arbitrary user input cannot overflow.
    pub fn total(&self) -> u64 {
        WeightCategory::ALL
            .into_iter()
            .map(|category| u64::from(self.category_weight(category)))
            .sum()
    }

    pub fn is_valid(&self) -> bool {
        self.total() == 100
            && WeightCategory::ALL
                .into_iter()
                .all(|category| self.category_weight(category) <= 100)
    }

    pub fn category_weight(&self, category: WeightCategory) -> u32 {
        match category {
            WeightCategory::Overview => self.overview,
            WeightCategory::References => self.references,
            WeightCategory::Definitions => self.definitions,
            WeightCategory::Organization => self.organization,
            WeightCategory::ManagerialProcess => self.managerial_process,
            WeightCategory::TechnicalProcess => self.technical_process,
            WeightCategory::SupportingProcess => self.supporting_process,
            WeightCategory::AdditionalPlans => self.additional_plans,
        }
    }

    /// Splits each category weight evenly over its sections; remainders go
    /// to the earliest sections of the category.
    pub fn per_section(&self) -> [u32; TOTAL_SECTIONS_REQUIRED] {
        let mut weights = [0_u32; TOTAL_SECTIONS_REQUIRED];

        for category in WeightCategory::ALL {
            let sections = category.sections();
            if sections.is_empty() {
                continue;
            }

            let total = self.category_weight(category);
            let count = sections.len() as u32;
            let base = total / count;
            let mut remainder = total % count;

            for section in sections {
                let extra = if remainder > 0 {
                    remainder -= 1;
                    1
                } else {
                    0
                };
                weights[section.ordinal()] = base + extra;
            }
        }

        weights
    }
}

/// How completeness is aggregated across the twelve sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Weighting {
    /// Plain mean of section scores.
    Standard,
    /// Mean weighted by a grading profile.
    Profile {
        criteria_id: Option<i64>,
        weights: SectionWeights,
    },
}

impl Weighting {
    pub fn label(&self) -> String {
        match self {
            Weighting::Standard => "standard".to_string(),
            Weighting::Profile {
                criteria_id: Some(id),
                ..
            } => format!("criteria:{id}"),
            Weighting::Profile {
                criteria_id: None, ..
            } => "criteria:default".to_string(),
        }
    }

    /// Contribution of each section to completeness, summing to 100. The
    /// standard mean counts every section equally, so 100 is split evenly
    /// with the remainder going to the earliest sections.
    pub fn per_section(&self) -> [u32; TOTAL_SECTIONS_REQUIRED] {
        match self {
            Weighting::Standard => {
                let count = TOTAL_SECTIONS_REQUIRED as u32;
                let mut weights = [100 / count; TOTAL_SECTIONS_REQUIRED];
                for weight in weights.iter_mut().take((100 % count) as usize) {
                    *weight += 1;
                }
                weights
            }
            Weighting::Profile { weights, .. } => weights.per_section(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCard {
    pub structure_score: f64,
    pub completeness_score: f64,
    pub overall_score: f64,
    pub sections_found: u32,
    pub compliant: bool,
}

/// Stamps each analysis with its contribution weight under `weighting`.
pub fn assign_section_weights(analyses: &mut [SectionAnalysis], weighting: &Weighting) {
    let weights = weighting.per_section();
    for analysis in analyses.iter_mut() {
        analysis.section_weight = weights[analysis.section.ordinal()];
    }
}

pub fn score(analyses: &[SectionAnalysis], weighting: &Weighting) -> ScoreCard {
    let sections_found = analyses.iter().filter(|analysis| analysis.present).count() as u32;
    let structure_score =
        round2(f64::from(sections_found) / TOTAL_SECTIONS_REQUIRED as f64 * 100.0);

    let completeness_score = round2(match weighting {
        Weighting::Standard => {
            let total: f64 = analyses.iter().map(present_score).sum();
            total / TOTAL_SECTIONS_REQUIRED as f64
        }
        Weighting::Profile { .. } => {
            let per_section = weighting.per_section();
            let total: f64 = analyses
                .iter()
                .map(|analysis| {
                    present_score(analysis) * f64::from(per_section[analysis.section.ordinal()])
                })
                .sum();
            total / 100.0
        }
    })
    .clamp(0.0, 100.0);

    let overall_score = round2(
        STRUCTURE_WEIGHT * structure_score + COMPLETENESS_WEIGHT * completeness_score,
    )
    .clamp(0.0, 100.0);

    ScoreCard {
        structure_score,
        completeness_score,
        overall_score,
        sections_found,
        compliant: overall_score >= COMPLIANCE_THRESHOLD,
    }
}

pub fn summarize(card: &ScoreCard, analyses: &[SectionAnalysis]) -> String {
    let verdict = if card.compliant {
        "compliant"
    } else {
        "non-compliant"
    };

    let mut summary = format!(
        "{} of {} required sections found; overall {:.2} ({}, threshold {:.1}).",
        card.sections_found, TOTAL_SECTIONS_REQUIRED, card.overall_score, verdict, COMPLIANCE_THRESHOLD
    );

    let missing: Vec<&str> = analyses
        .iter()
        .filter(|analysis| !analysis.present)
        .map(|analysis| analysis.section.display_name())
        .collect();
    if !missing.is_empty() {
        summary.push_str(&format!(" Missing: {}.", missing.join(", ")));
    }

    summary
}

fn present_score(analysis: &SectionAnalysis) -> f64 {
    if analysis.present {
        analysis.section_score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
