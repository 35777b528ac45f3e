use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::Connection;

use super::db_setup::DB_SCHEMA_VERSION;
use super::history::count_history_for_document;
use super::*;
use crate::engine::{SectionId, SectionWeights, Severity, TOTAL_SECTIONS_REQUIRED};
use crate::model::{
    ComplianceScore, Document, GradingCriteriaDraft, HistorySource, SectionAnalysis,
};

fn open() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory DB should open");
    ensure_schema(&connection).expect("schema should apply");
    connection
}

fn analysis(section: SectionId, present: bool) -> SectionAnalysis {
    SectionAnalysis {
        section,
        present,
        section_score: if present { 100.0 } else { 0.0 },
        coverage: if present { 50.0 } else { 0.0 },
        severity: if present {
            Severity::Info
        } else {
            section.absent_severity()
        },
        findings: format!("{} checked", section.display_name()),
        recommendations: String::new(),
        evidence_snippet: String::new(),
        missing_subclauses: String::new(),
        page_number: present.then_some(2),
        section_weight: 8,
    }
}

fn score(generation: i64, present: bool) -> ComplianceScore {
    ComplianceScore {
        score_id: "score-doc-a".to_string(),
        document_id: "doc-a".to_string(),
        generation,
        overall_score: if present { 100.0 } else { 0.0 },
        structure_score: if present { 100.0 } else { 0.0 },
        completeness_score: if present { 100.0 } else { 0.0 },
        sections_found: if present { 12 } else { 0 },
        total_sections_required: 12,
        compliant: present,
        summary: "summary".to_string(),
        weighting: "standard".to_string(),
        section_analyses: SectionId::ALL
            .iter()
            .map(|section| analysis(*section, present))
            .collect(),
        evaluated_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        professor_override: None,
        professor_notes: None,
        reviewed_by: None,
        reviewed_at: None,
        override_stale: false,
    }
}

fn save(connection: &mut Connection, score: &ComplianceScore) {
    let tx = connection.transaction().unwrap();
    save_score(&tx, score).unwrap();
    tx.commit().unwrap();
}

fn snapshot(
    connection: &mut Connection,
    score: &ComplianceScore,
    source: HistorySource,
    user_id: &str,
    recorded_at: DateTime<Utc>,
) -> i64 {
    let tx = connection.transaction().unwrap();
    let version = insert_history_snapshot(&tx, score, source, user_id, recorded_at).unwrap();
    tx.commit().unwrap();
    version
}

fn register(connection: &Connection) {
    upsert_document(
        connection,
        &Document {
            document_id: "doc-a".to_string(),
            filename: "plan.pdf".to_string(),
            sha256: "d".repeat(64),
            registered_at: Utc::now(),
        },
    )
    .unwrap();
}

#[test]
fn ensure_schema_is_idempotent_and_records_version() {
    let connection = open();
    ensure_schema(&connection).expect("second run should succeed");

    assert_eq!(
        read_metadata(&connection, "db_schema_version").unwrap().as_deref(),
        Some(DB_SCHEMA_VERSION)
    );
    assert!(read_metadata(&connection, "db_updated_at").unwrap().is_some());
    assert!(read_metadata(&connection, "missing").unwrap().is_none());
}

#[test]
fn score_round_trips_with_analyses_in_order() {
    let mut connection = open();
    register(&connection);
    let mut original = score(1, true);
    original.section_analyses[4].missing_subclauses =
        "5.2.1 Risk Identification, 5.2.2 Risk Mitigation".to_string();
    original.professor_override = Some(72.25);
    original.reviewed_by = Some("prof-b".to_string());
    original.reviewed_at = Some(original.evaluated_at + Duration::hours(1));

    save(&mut connection, &original);
    let loaded = find_score_by_document(&connection, "doc-a")
        .unwrap()
        .expect("score should load");

    assert_eq!(loaded, original);
    assert_eq!(loaded.section_analyses[4].missing_subclause_list().len(), 2);
    assert!(find_score_by_document(&connection, "doc-b").unwrap().is_none());
}

#[test]
fn saving_next_generation_drops_old_analyses() {
    let mut connection = open();
    register(&connection);
    save(&mut connection, &score(1, true));
    save(&mut connection, &score(2, false));

    let loaded = find_score_by_document(&connection, "doc-a")
        .unwrap()
        .expect("score should load");
    assert_eq!(loaded.generation, 2);
    assert_eq!(loaded.sections_found, 0);
    assert!(loaded.section_analyses.iter().all(|analysis| !analysis.present));
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM section_analyses").unwrap(),
        TOTAL_SECTIONS_REQUIRED as i64
    );
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM compliance_scores").unwrap(),
        1
    );
}

#[test]
fn history_sequence_never_reuses_versions() {
    let mut connection = open();
    let current = score(1, true);
    let recorded_at = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

    for offset in 0..3 {
        let version = snapshot(
            &mut connection,
            &current,
            HistorySource::ReEvaluation,
            "prof-a",
            recorded_at + Duration::minutes(offset),
        );
        assert_eq!(version, offset + 1);
    }

    // A row removed out of band must not let the next archive reuse a number.
    connection
        .execute(
            "DELETE FROM compliance_score_history WHERE version_number = 3",
            [],
        )
        .unwrap();
    let next = snapshot(
        &mut connection,
        &current,
        HistorySource::Override,
        "prof-a",
        recorded_at + Duration::minutes(5),
    );
    assert_eq!(next, 4);
    assert_eq!(count_history_for_document(&connection, "doc-a").unwrap(), 3);
}

#[test]
fn history_orders_by_recorded_at_then_version() {
    let mut connection = open();
    let current = score(1, true);
    let base = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

    snapshot(&mut connection, &current, HistorySource::AiEvaluation, "a", base);
    snapshot(&mut connection, &current, HistorySource::Override, "b", base);
    snapshot(
        &mut connection,
        &current,
        HistorySource::ReEvaluation,
        "c",
        base + Duration::seconds(30),
    );

    let sources: Vec<HistorySource> = list_history_for_document(&connection, "doc-a")
        .unwrap()
        .into_iter()
        .map(|entry| entry.source)
        .collect();
    assert_eq!(
        sources,
        vec![
            HistorySource::ReEvaluation,
            HistorySource::Override,
            HistorySource::AiEvaluation
        ]
    );
}

#[test]
fn criteria_rows_round_trip_and_activation_is_per_owner() {
    let mut connection = open();
    let now = Utc::now();
    let draft = |name: &str| GradingCriteriaDraft {
        name: name.to_string(),
        description: "weights".to_string(),
        active: false,
        weights: SectionWeights::default(),
    };

    let tx = connection.transaction().unwrap();
    let first = insert_criteria(&tx, "prof-a", &draft("Midterm"), now).unwrap();
    let second = insert_criteria(&tx, "prof-a", &draft("Final"), now).unwrap();
    let other = insert_criteria(&tx, "prof-b", &draft("Midterm"), now).unwrap();
    activate_criteria(&tx, first, "prof-a", now).unwrap();
    activate_criteria(&tx, other, "prof-b", now).unwrap();
    let deactivated = activate_criteria(&tx, second, "prof-a", now).unwrap();
    tx.commit().unwrap();

    assert_eq!(deactivated, 1);
    let active = find_active_criteria(&connection, "prof-a")
        .unwrap()
        .expect("prof-a should have an active profile");
    assert_eq!(active.id, second);
    assert_eq!(active.weights, SectionWeights::default());
    assert!(
        find_active_criteria(&connection, "prof-b")
            .unwrap()
            .is_some_and(|criteria| criteria.id == other)
    );

    let names: Vec<String> = list_criteria(&connection, "prof-a")
        .unwrap()
        .into_iter()
        .map(|criteria| criteria.name)
        .collect();
    assert_eq!(names, vec!["Final".to_string(), "Midterm".to_string()]);
    assert!(
        find_criteria_by_owner_and_name(&connection, "prof-b", "Final")
            .unwrap()
            .is_none()
    );

    assert_eq!(delete_criteria(&connection, first).unwrap(), 1);
    assert!(find_criteria(&connection, first).unwrap().is_none());
}

#[test]
fn duplicate_criteria_name_is_rejected_by_schema() {
    let mut connection = open();
    let draft = GradingCriteriaDraft {
        name: "Midterm".to_string(),
        description: String::new(),
        active: false,
        weights: SectionWeights::default(),
    };

    let tx = connection.transaction().unwrap();
    insert_criteria(&tx, "prof-a", &draft, Utc::now()).unwrap();
    assert!(insert_criteria(&tx, "prof-a", &draft, Utc::now()).is_err());
}

#[test]
fn users_upsert_display_names() {
    let connection = open();
    upsert_user(&connection, "prof-a", "A. Adams").unwrap();
    upsert_user(&connection, "prof-a", "Prof. Adams").unwrap();

    assert_eq!(
        display_name_for(&connection, "prof-a").unwrap().as_deref(),
        Some("Prof. Adams")
    );
    assert!(display_name_for(&connection, "nobody").unwrap().is_none());
}

#[test]
fn re_registering_a_document_keeps_first_registration_time() {
    let connection = open();
    let first_seen = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
    let document = Document {
        document_id: "doc-a".to_string(),
        filename: "plan-v1.pdf".to_string(),
        sha256: "1".repeat(64),
        registered_at: first_seen,
    };
    upsert_document(&connection, &document).unwrap();
    upsert_document(
        &connection,
        &Document {
            filename: "plan-v2.pdf".to_string(),
            sha256: "2".repeat(64),
            registered_at: first_seen + Duration::days(3),
            ..document
        },
    )
    .unwrap();

    let stored = find_document(&connection, "doc-a")
        .unwrap()
        .expect("document should exist");
    assert_eq!(stored.registered_at, first_seen);
    assert_eq!(stored.filename, "plan-v2.pdf");
    assert_eq!(stored.sha256, "2".repeat(64));
}

#[test]
fn score_table_declares_review_columns() {
    let connection = open();
    let mut statement = connection
        .prepare("PRAGMA table_info(compliance_scores)")
        .unwrap();
    let columns: Vec<String> = statement
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert!(columns.iter().any(|column| column == "override_stale"));
    assert!(columns.iter().any(|column| column == "weighting"));
}
