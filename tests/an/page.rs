use crate::an::{AN_BASE, MODERN_URL};
use crate::common::{expect_step, load_fixture};
use dosleg::runtime::logging::Diagnostics;
use dosleg::sources::an::page::{parse_dossier_page, parse_metadata};
use dosleg::types::{stage, ActType, Institution, ProcedureKind, ReadingStageKind, StepKind, StepStatus};
use chrono::NaiveDate;

#[test]
fn test_modern_page_metadata() {
    let html = load_fixture("an/republique_numerique.html");
    let metadata = parse_metadata(&html, MODERN_URL).unwrap();

    assert_eq!(metadata.title.as_deref(), Some("République numérique"));
    assert_eq!(metadata.procedure, Some(ProcedureKind::Pjl));
    assert_eq!(
        metadata.senate_url.as_deref(),
        Some("https://www.senat.fr/dossier-legislatif/pjl15-325.html")
    );
    assert_eq!(metadata.legislature, Some(14));
}

#[test]
fn test_modern_page_reading_stages() {
    let html = load_fixture("an/republique_numerique.html");
    let mut diagnostics = Diagnostics::quiet();
    let (_, stages) = parse_dossier_page(&html, MODERN_URL, AN_BASE, &mut diagnostics).unwrap();

    let kinds: Vec<_> = stages.iter().map(|stage| stage.kind).collect();
    assert_eq!(
        kinds,
        vec![
            Some(ReadingStageKind::AnPremiereLecture),
            Some(ReadingStageKind::SenatPremiereLecture),
            Some(ReadingStageKind::Cmp),
        ]
    );

    let first_reading: Vec<ActType> = stages[0].acts.iter().map(|act| act.act_type).collect();
    assert_eq!(
        first_reading,
        vec![
            ActType::DepotInitiative,
            ActType::ProcedureAcceleree,
            ActType::EtudeImpact,
            ActType::AvisConseilEtat,
            ActType::DepotRapport,
            ActType::TexteCommission,
            ActType::DiscussionSeancePublique,
            ActType::DiscussionSeancePublique,
            ActType::Decision,
        ]
    );
    assert_eq!(stages[0].acts[0].date, NaiveDate::from_ymd_opt(2015, 12, 9));
    assert_eq!(stages[2].status, Some(StepStatus::Accord));
}

#[test]
fn test_modern_page_steps() {
    let html = load_fixture("an/republique_numerique.html");
    let mut diagnostics = Diagnostics::quiet();
    let (dossier, _) = parse_dossier_page(&html, MODERN_URL, AN_BASE, &mut diagnostics).unwrap();

    assert_eq!(dossier.steps.len(), 6);
    assert!(dossier.urgent);
    assert_eq!(dossier.url.as_deref(), Some(MODERN_URL));
    assert_eq!(dossier.beginning, NaiveDate::from_ymd_opt(2015, 12, 9));

    expect_step(&dossier, 0)
        .institution(Institution::Assemblee)
        .stage(stage::FIRST_READING)
        .kind(Some(StepKind::Depot))
        .url("http://www.assemblee-nationale.fr/14/projets/pl3318.asp")
        .date(2015, 12, 9);

    let committee = expect_step(&dossier, 1)
        .kind(Some(StepKind::Commission))
        .url("http://www.assemblee-nationale.fr/14/ta-commission/r3399-a0.asp")
        .date(2016, 1, 13);
    assert_eq!(
        committee.step.extra_urls,
        vec!["http://www.assemblee-nationale.fr/14/rapports/r3399.asp"]
    );
    assert!(diagnostics.has_warning("superseded"));

    let floor = expect_step(&dossier, 2)
        .institution(Institution::Assemblee)
        .kind(Some(StepKind::Hemicycle))
        .url("http://www.assemblee-nationale.fr/14/cri/2015-2016/20160101.asp")
        .status(StepStatus::Adopte)
        .date(2016, 1, 26);
    assert_eq!(floor.step.extra_urls.len(), 1);

    expect_step(&dossier, 3)
        .institution(Institution::Senat)
        .kind(Some(StepKind::Depot))
        .url("https://www.senat.fr/leg/pjl15-325.html")
        .date(2016, 1, 27);

    expect_step(&dossier, 4)
        .institution(Institution::Cmp)
        .stage(stage::CMP)
        .kind(Some(StepKind::Commission))
        .status(StepStatus::Accord);

    expect_step(&dossier, 5)
        .institution(Institution::Gouvernement)
        .kind(Some(StepKind::Promulgation))
        .url("https://www.legifrance.gouv.fr/affichTexte.do?cidTexte=JORFTEXT000033202746")
        .date(2016, 10, 7);

    assert_eq!(dossier.promulgation_date, NaiveDate::from_ymd_opt(2016, 10, 7));
    assert_eq!(dossier.journal_url, dossier.steps[5].source_url);
}

#[test]
fn test_page_without_acts_warns() {
    let html = "<html><body><p><strong>Titre seul</strong></p></body></html>";
    let mut diagnostics = Diagnostics::quiet();
    let (dossier, stages) = parse_dossier_page(html, MODERN_URL, AN_BASE, &mut diagnostics).unwrap();

    assert!(stages.is_empty());
    assert!(dossier.steps.is_empty());
    assert_eq!(dossier.beginning, None);
    assert!(diagnostics.has_warning("no procedural step"));
}
