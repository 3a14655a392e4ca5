//! Modern bill-detail pages: metadata plus the tree pipeline, converted to
//! the shared step vocabulary.

use crate::runtime::logging::Diagnostics;
use crate::sources::an::classifier::is_report_url;
use crate::sources::an::tree::ProcedureTree;
use crate::sources::common::{attribute, decode_entities, normalize_text, parse_dom, tag_name};
use crate::types::{
    stage, ActType, Dossier, Institution, LegislativeAct, ProcedureKind, ReadingStage,
    ReadingStageKind, Step, StepKind,
};
use crate::urls::{clean_url, legislature_from_url};
use regex::Regex;
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<header\b.*?</header>").unwrap());
static PROCEDURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(projet de loi|proposition de loi)").unwrap());
static LEGISLATURE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(\d{2})/").unwrap());

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub procedure: Option<ProcedureKind>,
    pub senate_url: Option<String>,
    pub legislature: Option<u32>,
}

pub fn is_senate_dossier_url(href: &str) -> bool {
    let href = href
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    href.starts_with("www.senat.fr/dossier-legislatif") || href.starts_with("www.senat.fr/dossierleg/")
}

pub fn strip_page_header(html: &str) -> String {
    HEADER_RE.replace_all(html, "").into_owned()
}

/// Title (first `<strong>`), procedure kind, senate dossier and legislature.
pub fn parse_metadata(html: &str, url: &str) -> Result<PageMetadata, String> {
    let html = strip_page_header(html);
    let dom = parse_dom(&html)?;
    let parser = dom.parser();
    let mut metadata = PageMetadata::default();
    let mut first_link_legislature = None;

    for node in dom.nodes().iter() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        match tag_name(tag).as_str() {
            "strong" if metadata.title.is_none() => {
                let text = normalize_text(&decode_entities(&tag.inner_text(parser)));
                if !text.is_empty() {
                    metadata.title = Some(text);
                }
            }
            "a" => {
                if metadata.procedure.is_none() {
                    let text = normalize_text(&decode_entities(&tag.inner_text(parser)));
                    metadata.procedure = PROCEDURE_RE.captures(&text).map(|captures| {
                        if captures[1].eq_ignore_ascii_case("projet de loi") {
                            ProcedureKind::Pjl
                        } else {
                            ProcedureKind::Ppl
                        }
                    });
                }
                let Some(href) = attribute(tag, "href") else {
                    continue;
                };
                if metadata.senate_url.is_none() && is_senate_dossier_url(&href) {
                    metadata.senate_url = Some(clean_url(&href));
                }
                if first_link_legislature.is_none() {
                    first_link_legislature = LEGISLATURE_LINK_RE
                        .captures(&href)
                        .and_then(|captures| captures[1].parse().ok());
                }
            }
            _ => {}
        }
    }

    let from_url = if url.contains("assemblee-nationale") {
        legislature_from_url(url)
    } else {
        None
    };
    metadata.legislature = from_url.or(first_link_legislature);
    Ok(metadata)
}

/// Parse a modern page into a [`Dossier`], also returning the reading stages
/// the steps were derived from.
pub fn parse_dossier_page(
    html: &str,
    url: &str,
    base_url: &str,
    diagnostics: &mut Diagnostics,
) -> Result<(Dossier, Vec<ReadingStage>), String> {
    let metadata = parse_metadata(html, url)?;
    let tree = ProcedureTree::from_html(&strip_page_header(html), base_url)?;
    let stages = tree.extract_data();

    let mut dossier = Dossier::new(Some(url));
    dossier.legislature = metadata.legislature;
    dossier.long_title = metadata.title;
    dossier.senate_url = metadata.senate_url;
    dossier.procedure = metadata.procedure;

    let (steps, urgent) = stages_to_steps(&stages, diagnostics);
    dossier.steps = steps;
    dossier.urgent = urgent;
    if let Some(promulgation) = dossier.steps.iter().find(|step| step.is_promulgation()) {
        dossier.journal_url = promulgation.source_url.clone();
        dossier.promulgation_date = promulgation.date;
    }
    dossier.refresh_beginning();

    if dossier.steps.is_empty() {
        diagnostics.warn(
            "no procedural step found on the page",
            Some(serde_json::json!({ "url": url })),
        );
    }
    Ok((dossier, stages))
}

/// Flatten reading stages into steps. Returns the steps and whether the
/// accelerated procedure was declared.
pub fn stages_to_steps(stages: &[ReadingStage], diagnostics: &mut Diagnostics) -> (Vec<Step>, bool) {
    let mut steps: Vec<Step> = Vec::new();
    let mut urgent = false;

    for reading in stages {
        let stage_start = steps.len();

        for act in &reading.acts {
            match act.act_type {
                ActType::ProcedureAcceleree => urgent = true,
                ActType::EtudeImpact | ActType::AvisConseilEtat => {}
                ActType::Promulgation => steps.push(
                    Step::new(
                        Institution::Gouvernement,
                        stage::PROMULGATION,
                        Some(StepKind::Promulgation),
                    )
                    .with_optional_url(act.url.clone())
                    .with_date(act.date),
                ),
                ActType::DecisionConseilConstit => steps.push(constitutional_step(act)),
                _ => match reading.kind {
                    Some(ReadingStageKind::ConseilConstitutionnel) => {
                        steps.push(constitutional_step(act))
                    }
                    Some(kind) => merge_stage_act(&mut steps, stage_start, kind, act, diagnostics),
                    None => diagnostics.debug("act outside of any reading stage ignored"),
                },
            }
        }

        if reading.kind == Some(ReadingStageKind::Cmp) && reading.status.is_some() {
            match steps[stage_start..]
                .iter_mut()
                .find(|step| step.step == Some(StepKind::Commission))
            {
                Some(commission) => commission.status = reading.status,
                None => {
                    let mut commission =
                        Step::new(Institution::Cmp, stage::CMP, Some(StepKind::Commission));
                    commission.status = reading.status;
                    steps.insert(stage_start, commission);
                }
            }
        }
    }

    (steps, urgent)
}

fn constitutional_step(act: &LegislativeAct) -> Step {
    Step::new(
        Institution::ConseilConstitutionnel,
        stage::CONSTITUTIONALITY,
        Some(StepKind::Constitutionnalite),
    )
    .with_optional_url(act.url.clone())
    .with_date(act.date)
}

/// Floor debates of a joint-committee stage happen in either chamber.
fn chamber_of(url: Option<&str>, fallback: Institution) -> Institution {
    match url {
        Some(url) if url.contains("senat.fr") => Institution::Senat,
        Some(url) if url.contains("assemblee-nationale.fr") => Institution::Assemblee,
        _ => fallback,
    }
}

fn merge_stage_act(
    steps: &mut Vec<Step>,
    stage_start: usize,
    kind: ReadingStageKind,
    act: &LegislativeAct,
    diagnostics: &mut Diagnostics,
) {
    let label = kind.stage_label();
    let institution = kind.institution();

    match act.act_type {
        ActType::DepotInitiative => {
            if let Some(previous) = steps
                .last()
                .filter(|step| step.step == Some(StepKind::Depot) && step.institution == institution)
            {
                diagnostics.warn(
                    "consecutive deposits in the same chamber",
                    Some(serde_json::json!({ "previous": previous.source_url, "next": act.url })),
                );
            }
            steps.push(
                Step::new(institution, label, Some(StepKind::Depot))
                    .with_optional_url(act.url.clone())
                    .with_date(act.date),
            );
        }
        ActType::TexteCommission | ActType::DepotRapport => {
            match steps[stage_start..]
                .last_mut()
                .filter(|step| step.step == Some(StepKind::Commission))
            {
                Some(previous) => prefer_committee_text(previous, act, diagnostics),
                None => steps.push(
                    Step::new(institution, label, Some(StepKind::Commission))
                        .with_optional_url(act.url.clone())
                        .with_date(act.date),
                ),
            }
        }
        ActType::DiscussionSeancePublique => {
            let institution = if kind == ReadingStageKind::Cmp {
                chamber_of(act.url.as_deref(), institution)
            } else {
                institution
            };
            match steps[stage_start..].last_mut().filter(|step| {
                step.step == Some(StepKind::Hemicycle) && step.institution == institution
            }) {
                Some(floor) => {
                    if let Some(url) = &act.url {
                        if floor.source_url.is_none() {
                            floor.source_url = Some(url.clone());
                        } else if floor.source_url.as_ref() != Some(url) {
                            floor.extra_urls.push(url.clone());
                        }
                    }
                    floor.date = floor.date.or(act.date);
                }
                None => steps.push(
                    Step::new(institution, label, Some(StepKind::Hemicycle))
                        .with_optional_url(act.url.clone())
                        .with_date(act.date),
                ),
            }
        }
        ActType::Decision => {
            match steps[stage_start..]
                .iter_mut()
                .rev()
                .find(|step| step.step == Some(StepKind::Hemicycle))
            {
                Some(floor) => {
                    floor.status = act.status;
                    floor.date = act.date.or(floor.date);
                    if floor.source_url.is_none() {
                        floor.source_url = act.url.clone();
                    }
                }
                None => {
                    let institution = if kind == ReadingStageKind::Cmp {
                        chamber_of(act.url.as_deref(), institution)
                    } else {
                        institution
                    };
                    let mut floor = Step::new(institution, label, Some(StepKind::Hemicycle))
                        .with_optional_url(act.url.clone())
                        .with_date(act.date);
                    floor.status = act.status;
                    steps.push(floor);
                }
            }
        }
        _ => {}
    }
}

/// Two committee acts in a row: the full text wins over the report, the
/// other url is kept as an extra.
fn prefer_committee_text(previous: &mut Step, act: &LegislativeAct, diagnostics: &mut Diagnostics) {
    let Some(url) = act.url.clone() else {
        return;
    };
    let previous_is_report = previous.source_url.as_deref().is_none_or(is_report_url);

    if previous_is_report && !is_report_url(&url) {
        diagnostics.warn(
            "committee report superseded by committee text",
            Some(serde_json::json!({ "report": previous.source_url, "text": url })),
        );
        if let Some(report) = previous.source_url.replace(url) {
            previous.extra_urls.push(report);
        }
        previous.date = act.date.or(previous.date);
    } else if previous.source_url.as_deref() != Some(url.as_str()) {
        diagnostics.debug("additional committee document kept as extra url");
        previous.extra_urls.push(url);
    }
}
