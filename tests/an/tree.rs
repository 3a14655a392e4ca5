use crate::an::AN_BASE;
use crate::common::load_fixture;
use chrono::NaiveDate;
use dosleg::sources::an::page::strip_page_header;
use dosleg::sources::an::tree::{dossier_blocks, NodeKind, ProcedureTree};
use dosleg::types::{ActType, ReadingStageKind};

#[test]
fn test_deposit_and_impact_study_share_one_stage() {
    let html = r#"<html><body>
        <p>Assemblée nationale - 1ère lecture</p>
        <p><a href="/14/projets/pl3318.asp">Projet de loi pour une République numérique</a>, n° 3318, déposé le 9 décembre 2015</p>
        <p><a href="/14/projets/pl3318-ei.asp">Etude d'impact</a></p>
        </body></html>"#;
    let tree = ProcedureTree::from_html(html, AN_BASE).unwrap();
    let stages = tree.extract_data();

    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0].kind, Some(ReadingStageKind::AnPremiereLecture));
    assert_eq!(stages[0].acts.len(), 2);

    let deposit = &stages[0].acts[0];
    assert_eq!(deposit.act_type, ActType::DepotInitiative);
    assert_eq!(deposit.date, NaiveDate::from_ymd_opt(2015, 12, 9));
    assert_eq!(
        deposit.url.as_deref(),
        Some("http://www.assemblee-nationale.fr/14/projets/pl3318.asp")
    );

    let impact = &stages[0].acts[1];
    assert_eq!(impact.act_type, ActType::EtudeImpact);
    assert_eq!(
        impact.url.as_deref(),
        Some("http://www.assemblee-nationale.fr/14/projets/pl3318-ei.asp")
    );
}

#[test]
fn test_fixture_tree_shape() {
    let html = strip_page_header(&load_fixture("an/republique_numerique.html"));
    let tree = ProcedureTree::from_html(&html, AN_BASE).unwrap();

    let stages: Vec<NodeKind> = tree
        .root()
        .children()
        .map(|child| child.value().kind)
        .collect();
    assert_eq!(
        stages,
        vec![
            NodeKind::Stage(ReadingStageKind::AnPremiereLecture),
            NodeKind::Stage(ReadingStageKind::SenatPremiereLecture),
            NodeKind::Stage(ReadingStageKind::Cmp),
        ]
    );

    // Acts never nest below other acts.
    for stage in tree.root().children() {
        for act in stage.children() {
            assert!(matches!(act.value().kind, NodeKind::Act(_)));
            assert_eq!(act.children().count(), 0);
        }
    }

    // Blocks before the first stage header stay on the root.
    assert!(tree
        .root()
        .value()
        .blocks
        .iter()
        .any(|block| block.text == "République numérique"));
}

#[test]
fn test_breadcrumb_and_rules_are_filtered() {
    let html = "<p>Accueil &gt; Dossiers</p><p>______</p><p></p><p>Assemblée nationale - 1ère lecture</p>";
    let blocks = dossier_blocks(html).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text, "Assemblée nationale - 1ère lecture");
}

#[test]
fn test_stage_order_is_document_order() {
    let html = r#"
        <p>Sénat - 1ère lecture</p>
        <p>Assemblée nationale - 1ère lecture</p>
        <p>Commission mixte paritaire (Désaccord)</p>
        <p>Assemblée nationale - Nouvelle lecture</p>
        <p>Sénat - Nouvelle lecture</p>
        <p>Assemblée nationale - Lecture définitive</p>
        <p>Conseil constitutionnel</p>
    "#;
    let stages = ProcedureTree::from_html(html, AN_BASE).unwrap().extract_data();
    let kinds: Vec<_> = stages.iter().filter_map(|stage| stage.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ReadingStageKind::SenatPremiereLecture,
            ReadingStageKind::AnPremiereLecture,
            ReadingStageKind::Cmp,
            ReadingStageKind::AnNouvelleLecture,
            ReadingStageKind::SenatNouvelleLecture,
            ReadingStageKind::AnLectureDefinitive,
            ReadingStageKind::ConseilConstitutionnel,
        ]
    );
}
