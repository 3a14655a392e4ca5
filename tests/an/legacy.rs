use crate::an::LEGACY_URL;
use crate::common::{expect_step, load_fixture};
use chrono::NaiveDate;
use dosleg::runtime::logging::Diagnostics;
use dosleg::sources::an::legacy::{
    is_legacy_page, parse_legacy_page, parse_legacy_page_with_depth, LegacyOutcome,
};
use dosleg::types::{stage, Dossier, Institution, StepKind};

const HEADER: &str = r##"<font color="#000099" size="2" face="Arial">"##;
const WORKS: &str =
    r##"<p align="center"><b><font color="#000080">Travaux préparatoires</font></b><br>"##;
const COMMITTEE_SECTION: &str =
    r##"<br><b><font color="#000099">Travaux des commissions</font></b><br>"##;

fn single_dossier(html: &str) -> (Dossier, Diagnostics) {
    let mut diagnostics = Diagnostics::quiet();
    match parse_legacy_page(html, LEGACY_URL, &mut diagnostics) {
        LegacyOutcome::Dossiers(mut dossiers) => {
            assert_eq!(dossiers.len(), 1, "expected a single dossier");
            (dossiers.remove(0), diagnostics)
        }
        LegacyOutcome::Unsupported(reason) => panic!("unsupported page: {reason}"),
    }
}

#[test]
fn test_legacy_fixture_is_detected() {
    assert!(is_legacy_page(&load_fixture("an/sante_legacy.html")));
    assert!(!is_legacy_page(&load_fixture("an/republique_numerique.html")));
}

#[test]
fn test_legacy_fixture_steps() {
    let (dossier, diagnostics) = single_dossier(&load_fixture("an/sante_legacy.html"));

    assert_eq!(
        dossier.long_title.as_deref(),
        Some("Modernisation de notre système de santé")
    );
    assert_eq!(dossier.legislature, Some(14));
    assert!(dossier.urgent);
    assert_eq!(
        dossier.senate_url.as_deref(),
        Some("https://www.senat.fr/dossier-legislatif/pjl14-406.html")
    );
    assert_eq!(
        dossier.journal_url.as_deref(),
        Some("https://www.legifrance.gouv.fr/affichTexte.do?cidTexte=JORFTEXT000031912641")
    );
    assert_eq!(dossier.steps.len(), 6);

    expect_step(&dossier, 0)
        .institution(Institution::Assemblee)
        .stage(stage::FIRST_READING)
        .kind(Some(StepKind::Depot))
        .url("http://www.assemblee-nationale.fr/14/projets/pl2302.asp")
        .date(2014, 10, 15);

    let committee = expect_step(&dossier, 1)
        .kind(Some(StepKind::Commission))
        .url("http://www.assemblee-nationale.fr/14/ta-commission/r2673-a0.asp")
        .date(2015, 3, 24);
    assert_eq!(
        committee.step.extra_urls,
        vec!["http://www.assemblee-nationale.fr/14/rapports/r2673.asp"]
    );
    assert!(diagnostics.has_warning("double commission line"));

    expect_step(&dossier, 2)
        .institution(Institution::Assemblee)
        .kind(Some(StepKind::Hemicycle))
        .url("http://www.assemblee-nationale.fr/14/ta/ta0505.asp")
        .date(2015, 4, 14);

    expect_step(&dossier, 3)
        .institution(Institution::Senat)
        .stage(stage::FIRST_READING)
        .kind(Some(StepKind::Depot))
        .url("https://www.senat.fr/leg/pjl14-406.html")
        .date(2015, 4, 15);

    expect_step(&dossier, 4)
        .institution(Institution::ConseilConstitutionnel)
        .stage(stage::CONSTITUTIONALITY)
        .kind(Some(StepKind::Constitutionnalite))
        .url("http://www.conseil-constitutionnel.fr/decision/2016/2015727dc.htm");

    expect_step(&dossier, 5)
        .institution(Institution::Gouvernement)
        .stage(stage::PROMULGATION)
        .kind(Some(StepKind::Promulgation))
        .date(2016, 1, 26);

    assert_eq!(dossier.promulgation_date, NaiveDate::from_ymd_opt(2016, 1, 26));
    assert_eq!(dossier.beginning, NaiveDate::from_ymd_opt(2014, 10, 15));
}

#[test]
fn test_report_then_committee_text_keeps_one_step() {
    let html = [
        WORKS,
        &format!("{HEADER}Assemblée nationale - 1ère lecture</font>"),
        r#"<a href="/14/propositions/pion1000.asp">Proposition de loi</a> déposée le 2 juin 2013"#,
        COMMITTEE_SECTION,
        r#"<a href="/14/rapports/r1100.asp">Rapport</a> déposé le 3 juillet 2013"#,
        r#"<a href="/14/ta-commission/r1100-a0.asp">Texte adopté par la commission</a>"#,
    ]
    .join("\n");
    let (dossier, _) = single_dossier(&html);

    let committees: Vec<_> = dossier
        .steps
        .iter()
        .filter(|step| step.step == Some(StepKind::Commission))
        .collect();
    assert_eq!(committees.len(), 1);
    assert_eq!(
        committees[0].source_url.as_deref(),
        Some("http://www.assemblee-nationale.fr/14/ta-commission/r1100-a0.asp")
    );
}

#[test]
fn test_second_report_is_an_extra_url() {
    let html = [
        WORKS,
        &format!("{HEADER}Assemblée nationale - 1ère lecture</font>"),
        r#"<a href="/14/propositions/pion1000.asp">Proposition de loi</a> déposée le 2 juin 2013"#,
        COMMITTEE_SECTION,
        r#"<a href="/14/rapports/r1100.asp">Rapport</a> déposé le 3 juillet 2013"#,
        r#"<a href="/14/rapports/r1101.asp">Rapport supplémentaire</a> déposé le 4 juillet 2013"#,
    ]
    .join("\n");
    let (dossier, _) = single_dossier(&html);

    assert_eq!(dossier.steps.len(), 2);
    assert_eq!(
        dossier.steps[1].extra_urls,
        vec!["http://www.assemblee-nationale.fr/14/rapports/r1101.asp"]
    );
}

#[test]
fn test_open_section_predicts_next_step() {
    let html = [
        WORKS,
        &format!("{HEADER}Assemblée nationale - 1ère lecture</font>"),
        r#"<a href="/14/propositions/pion1000.asp">Proposition de loi</a> déposée le 2 juin 2013"#,
        COMMITTEE_SECTION,
    ]
    .join("\n");
    let (dossier, _) = single_dossier(&html);

    assert_eq!(dossier.steps.len(), 2);
    expect_step(&dossier, 1)
        .institution(Institution::Assemblee)
        .stage(stage::FIRST_READING)
        .kind(Some(StepKind::Commission))
        .predicted();
    assert_eq!(dossier.steps[1].source_url, None);
}

#[test]
fn test_second_senate_committee_text_is_another_deposit() {
    let html = [
        WORKS,
        &format!("{HEADER}Sénat - 1ère lecture</font>"),
        r#"<a href="https://www.senat.fr/leg/pjl14-406.html">Projet de loi</a> transmis au Sénat le 15 avril 2015"#,
        r#"<a href="https://www.senat.fr/leg/pjl14-407.html">Texte de la commission</a> déposé le 20 juillet 2015"#,
        r#"<a href="https://www.senat.fr/leg/pjl14-408.html">Texte de la commission</a> déposé le 22 juillet 2015"#,
    ]
    .join("\n");
    let (dossier, diagnostics) = single_dossier(&html);

    assert_eq!(dossier.steps.len(), 3);
    expect_step(&dossier, 1)
        .institution(Institution::Senat)
        .kind(Some(StepKind::Commission))
        .url("https://www.senat.fr/leg/pjl14-407.html");
    expect_step(&dossier, 2)
        .institution(Institution::Senat)
        .stage(stage::FIRST_READING)
        .kind(Some(StepKind::Depot))
        .url("https://www.senat.fr/leg/pjl14-408.html")
        .date(2015, 7, 22);
    assert!(diagnostics.has_warning("read as another deposit"));
}

#[test]
fn test_second_assembly_committee_text_is_an_extra_url() {
    let html = [
        WORKS,
        &format!("{HEADER}Assemblée nationale - 1ère lecture</font>"),
        r#"<a href="/14/ta-commission/r1100-a0.asp">Texte de la commission</a>"#,
        r#"<a href="/14/ta-commission/r1100-a1.asp">Texte de la commission</a>"#,
    ]
    .join("\n");
    let (dossier, diagnostics) = single_dossier(&html);

    assert_eq!(dossier.steps.len(), 1);
    assert_eq!(
        dossier.steps[0].extra_urls,
        vec!["http://www.assemblee-nationale.fr/14/ta-commission/r1100-a1.asp"]
    );
    assert!(diagnostics.has_warning("kept as extra url"));
}

#[test]
fn test_cmp_deposit_is_ignored() {
    let html = [
        WORKS,
        &format!("{HEADER}Commission Mixte Paritaire (désaccord)</font>"),
        r#"<a href="/14/ta/ta0300.asp">Projet de loi</a> transmis à la commission le 3 mars 2014"#,
    ]
    .join("\n");
    let (dossier, _) = single_dossier(&html);
    assert!(dossier.steps.is_empty());
}

#[test]
fn test_continuation_links_to_other_legislatures() {
    let html = [
        WORKS,
        r#"Voir le dossier de la <a href="/13/dossiers/sante.asp">13ème législature</a>"#,
        r#"Suite des travaux lors de la <a href="/15/dossiers/sante.asp">15ème législature</a>"#,
    ]
    .join("\n");
    let (dossier, _) = single_dossier(&html);
    assert_eq!(
        dossier.previous_works.as_deref(),
        Some("http://www.assemblee-nationale.fr/13/dossiers/sante.asp")
    );
    assert_eq!(
        dossier.next_works.as_deref(),
        Some("http://www.assemblee-nationale.fr/15/dossiers/sante.asp")
    );
}

#[test]
fn test_nested_dossiers_are_split() {
    let html = [
        WORKS,
        &format!("{HEADER}Assemblée nationale - 1ère lecture</font>"),
        r#"<a href="/14/propositions/pion1000.asp">Proposition de loi</a> déposée le 2 juin 2013"#,
        WORKS,
        &format!("{HEADER}Sénat - 1ère lecture</font>"),
        r#"<a href="http://www.senat.fr/leg/ppl13-500.html">Proposition de loi</a> déposée le 5 mai 2014"#,
    ]
    .join("\n");

    let mut diagnostics = Diagnostics::quiet();
    let LegacyOutcome::Dossiers(dossiers) = parse_legacy_page(&html, LEGACY_URL, &mut diagnostics)
    else {
        panic!("expected dossiers");
    };
    assert_eq!(dossiers.len(), 2);
    assert_eq!(dossiers[0].steps.len(), 1);
    assert_eq!(dossiers[0].steps[0].institution, Institution::Assemblee);
    assert_eq!(dossiers[1].steps.len(), 1);
    assert_eq!(dossiers[1].steps[0].institution, Institution::Senat);
    assert!(diagnostics.has_warning("another dossier"));

    let LegacyOutcome::Dossiers(bounded) =
        parse_legacy_page_with_depth(&html, LEGACY_URL, 1, &mut Diagnostics::quiet())
    else {
        panic!("expected dossiers");
    };
    assert_eq!(bounded.len(), 1);
}

#[test]
fn test_european_resolution_is_unsupported() {
    let html = [
        WORKS,
        r#"<b>Proposition de résolution européenne</b> sur le paquet ferroviaire"#,
    ]
    .join("\n");
    assert!(matches!(
        parse_legacy_page(&html, LEGACY_URL, &mut Diagnostics::quiet()),
        LegacyOutcome::Unsupported(_)
    ));
}
