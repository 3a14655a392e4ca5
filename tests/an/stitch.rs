use dosleg::runtime::logging::Diagnostics;
use dosleg::sources::an::stitch::stitch;
use dosleg::types::{stage, Dossier, Institution, Step, StepKind};

fn step(institution: Institution, label: &str, kind: StepKind, url: &str) -> Step {
    Step::new(institution, label, Some(kind)).with_url(url)
}

fn urls(dossier: &Dossier) -> Vec<&str> {
    dossier
        .steps
        .iter()
        .filter_map(|step| step.source_url.as_deref())
        .collect()
}

fn promulgation(url: &str) -> Step {
    step(
        Institution::Gouvernement,
        stage::PROMULGATION,
        StepKind::Promulgation,
        url,
    )
}

#[test]
fn test_shared_step_splices_records() {
    let earlier = Dossier {
        url: Some("http://www.assemblee-nationale.fr/13/dossiers/sante.asp".to_string()),
        long_title: Some("Santé".to_string()),
        urgent: true,
        steps: vec![
            step(Institution::Assemblee, stage::FIRST_READING, StepKind::Depot, "A"),
            step(Institution::Assemblee, stage::FIRST_READING, StepKind::Hemicycle, "B"),
            promulgation("JO"),
        ],
        ..Dossier::default()
    };
    let later = Dossier {
        url: Some("http://www.assemblee-nationale.fr/14/dossiers/sante.asp".to_string()),
        senate_url: Some("https://www.senat.fr/dossier-legislatif/ppl13-500.html".to_string()),
        steps: vec![
            step(Institution::Assemblee, stage::FIRST_READING, StepKind::Hemicycle, "B"),
            step(Institution::Senat, stage::FIRST_READING, StepKind::Depot, "C"),
        ],
        ..Dossier::default()
    };

    let mut diagnostics = Diagnostics::quiet();
    let merged = stitch(later, earlier, &mut diagnostics);

    assert_eq!(urls(&merged), vec!["A", "B", "C"]);
    assert_eq!(
        merged.url.as_deref(),
        Some("http://www.assemblee-nationale.fr/14/dossiers/sante.asp")
    );
    assert_eq!(merged.long_title.as_deref(), Some("Santé"));
    assert!(merged.senate_url.is_some());
    assert!(merged.urgent);
    assert_eq!(diagnostics.warnings().count(), 0);
}

#[test]
fn test_later_steps_before_the_shared_step_are_kept() {
    let earlier = Dossier {
        steps: vec![
            step(Institution::Assemblee, stage::FIRST_READING, StepKind::Depot, "A"),
            step(Institution::Assemblee, stage::FIRST_READING, StepKind::Hemicycle, "B"),
        ],
        ..Dossier::default()
    };
    let later = Dossier {
        steps: vec![
            step(Institution::Senat, stage::FIRST_READING, StepKind::Depot, "X"),
            step(Institution::Assemblee, stage::FIRST_READING, StepKind::Hemicycle, "B"),
            step(Institution::Senat, stage::FIRST_READING, StepKind::Hemicycle, "C"),
        ],
        ..Dossier::default()
    };

    let mut diagnostics = Diagnostics::quiet();
    let merged = stitch(later, earlier, &mut diagnostics);

    assert_eq!(urls(&merged), vec!["A", "X", "B", "C"]);
    assert!(diagnostics.has_warning("steps before the shared step"));
}

#[test]
fn test_disjoint_records_are_concatenated() {
    let earlier = Dossier {
        steps: vec![step(Institution::Assemblee, stage::FIRST_READING, StepKind::Depot, "A")],
        previous_works: Some("http://www.assemblee-nationale.fr/12/dossiers/sante.asp".to_string()),
        ..Dossier::default()
    };
    let later = Dossier {
        steps: vec![step(Institution::Senat, stage::FIRST_READING, StepKind::Depot, "C")],
        ..Dossier::default()
    };

    let mut diagnostics = Diagnostics::quiet();
    let merged = stitch(later, earlier, &mut diagnostics);

    assert_eq!(urls(&merged), vec!["A", "C"]);
    assert_eq!(
        merged.previous_works.as_deref(),
        Some("http://www.assemblee-nationale.fr/12/dossiers/sante.asp")
    );
    assert!(diagnostics.has_warning("concatenating"));
}

#[test]
fn test_beginning_follows_merged_first_step() {
    let mut first = step(Institution::Assemblee, stage::FIRST_READING, StepKind::Depot, "A");
    first.date = chrono::NaiveDate::from_ymd_opt(2011, 3, 4);
    let earlier = Dossier {
        steps: vec![first],
        ..Dossier::default()
    };
    let later = Dossier {
        steps: vec![step(Institution::Senat, stage::FIRST_READING, StepKind::Depot, "C")],
        ..Dossier::default()
    };

    let merged = stitch(later, earlier, &mut Diagnostics::quiet());
    assert_eq!(merged.beginning, chrono::NaiveDate::from_ymd_opt(2011, 3, 4));
}
