use crate::engine::normalize::NormalizedDocument;
use crate::engine::taxonomy::{SectionId, Severity, TOTAL_SECTIONS_REQUIRED};
use crate::model::{SectionAnalysis, join_missing_subclauses};

const MAX_EVIDENCE_CHARS: usize = 200;
/// Share of a present section's score that depends on subclause coverage.
const SUBCLAUSE_PENALTY_SHARE: f64 = 50.0;

pub fn analyze_all(document: &NormalizedDocument) -> [SectionAnalysis; TOTAL_SECTIONS_REQUIRED] {
    SectionId::ALL.map(|section| analyze(section, document))
}

pub fn analyze(section: SectionId, document: &NormalizedDocument) -> SectionAnalysis {
    let keywords = section.keywords();
    let subclauses = section.subclauses();

    if !document.contains_any(keywords) {
        let missing: Vec<&str> = subclauses.iter().map(|subclause| subclause.label).collect();
        return SectionAnalysis {
            section,
            present: false,
            section_score: 0.0,
            coverage: 0.0,
            severity: section.absent_severity(),
            findings: format!(
                "No {} section detected; none of {} trigger terms were found.",
                section.display_name(),
                keywords.len()
            ),
            recommendations: format!(
                "Add a {} section covering: {}.",
                section.display_name(),
                missing.join("; ")
            ),
            evidence_snippet: String::new(),
            missing_subclauses: join_missing_subclauses(&missing),
            page_number: None,
            section_weight: 0,
        };
    }

    let matched = document.matched_keywords(keywords);
    let coverage = percentage(matched.len(), keywords.len());

    let missing: Vec<&str> = subclauses
        .iter()
        .filter(|subclause| !document.contains_any(subclause.keywords))
        .map(|subclause| subclause.label)
        .collect();
    let missing_ratio = if subclauses.is_empty() {
        0.0
    } else {
        missing.len() as f64 / subclauses.len() as f64
    };
    let section_score = (100.0 - SUBCLAUSE_PENALTY_SHARE * missing_ratio).clamp(0.0, 100.0);

    let evidence = document.first_line_matching(&matched);
    let evidence_snippet = evidence
        .map(|line| truncate_chars(&line.text, MAX_EVIDENCE_CHARS))
        .unwrap_or_default();
    let page_number = evidence.map(|line| line.page);

    let covered = subclauses.len() - missing.len();
    let findings = format!(
        "{} section detected ({} of {} trigger terms, {} of {} expected subclauses).",
        section.display_name(),
        matched.len(),
        keywords.len(),
        covered,
        subclauses.len()
    );

    let (severity, recommendations) = if missing.is_empty() {
        (
            Severity::Info,
            "No action required; all expected subclauses are addressed.".to_string(),
        )
    } else {
        (
            Severity::Low,
            format!("Expand the section to address: {}.", missing.join("; ")),
        )
    };

    SectionAnalysis {
        section,
        present: true,
        section_score,
        coverage,
        severity,
        findings,
        recommendations,
        evidence_snippet,
        missing_subclauses: join_missing_subclauses(&missing),
        page_number,
        section_weight: 0,
    }
}

fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64 * 100.0).clamp(0.0, 100.0)
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut truncated: String = input.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
