//! Line-oriented parser for the legacy flat-font-tag bill pages.
//!
//! Legacy markup is too malformed to trust a DOM, so the page is scanned one
//! raw line at a time. [`LegacyState`] carries everything the scan needs
//! between lines, and each line is parsed as a standalone fragment only when
//! a trigger fires.

use crate::config::DEFAULT_MAX_DEPTH;
use crate::dates::extract_date;
use crate::runtime::logging::Diagnostics;
use crate::sources::an::classifier::{
    classify_line, is_report_url, LineTrigger, Section, ACCELERATION_MARKERS,
    EUROPEAN_RESOLUTION_MARKER, JOURNAL_MARKER, LONG_TITLE_MARKER, PREPARATORY_WORKS_MARKER,
    SECTION_MARKER, STAGE_HEADER_MARKER,
};
use crate::sources::common::{attribute, parse_dom, parse_fragment, tag_name, TextBlock};
use crate::types::{stage, Dossier, Institution, Step, StepKind};
use crate::urls::{clean_url, legislature_from_url, resolve_url};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static DATE_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:deposee?|adoptee?|modifiee?|rejetee?|mise? en ligne)\b[^.;]*? le (\d+(?:er)? \w+ \d{4})",
    )
    .unwrap()
});
static LAW_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" du (\d+(?:er)? \w+ \d{4})").unwrap());
static DOSSIER_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{1,2})/dossiers/").unwrap());

const UNSUPPORTED_INQUIRY_STAGE: &str = "création de la commission d'enquête";

#[derive(Debug, Clone, PartialEq)]
pub enum LegacyOutcome {
    /// One dossier per bill found in the page, outermost first.
    Dossiers(Vec<Dossier>),
    /// A page shape that has no step representation.
    Unsupported(String),
}

/// Whether a page uses the legacy font-tag layout.
pub fn is_legacy_page(html: &str) -> bool {
    html.contains(STAGE_HEADER_MARKER) || html.contains(PREPARATORY_WORKS_MARKER)
}

enum LineOutcome {
    Next,
    /// A second dossier starts at this line.
    Nested,
    Unsupported(String),
}

/// Scanner state threaded through the lines of one dossier.
pub struct LegacyState {
    pub dossier: Dossier,
    pub institution: Institution,
    pub stage: Option<String>,
    pub section: Option<Section>,
    preparatory_works_seen: bool,
    promulgation: Option<Step>,
    predicted: Option<Step>,
    base_url: String,
}

impl LegacyState {
    pub fn new(url: &str) -> Self {
        let mut dossier = Dossier::new(Some(url));
        dossier.legislature = legislature_from_url(url);
        Self {
            dossier,
            institution: Institution::Assemblee,
            stage: None,
            section: None,
            preparatory_works_seen: false,
            promulgation: None,
            predicted: None,
            base_url: url.to_string(),
        }
    }

    fn stage_label(&self) -> String {
        self.stage
            .clone()
            .unwrap_or_else(|| stage::FIRST_READING.to_string())
    }

    fn last_step(&self) -> Option<&Step> {
        self.dossier.steps.last()
    }

    fn read_meta(&mut self, html: &str) {
        let Ok(dom) = parse_dom(html) else {
            return;
        };
        let journal = dom
            .nodes()
            .iter()
            .filter_map(|node| node.as_tag())
            .filter(|tag| tag_name(tag) == "meta")
            .find(|tag| attribute(tag, "name").as_deref() == Some("LIEN_LOI_PROMULGUEE"))
            .and_then(|tag| attribute(tag, "content"))
            .filter(|content| !content.trim().is_empty());

        if let Some(journal) = journal {
            let journal = clean_url(&journal);
            self.dossier.journal_url = Some(journal.clone());
            self.promulgation = Some(
                Step::new(
                    Institution::Gouvernement,
                    stage::PROMULGATION,
                    Some(StepKind::Promulgation),
                )
                .with_url(journal),
            );
        }
    }

    fn feed(&mut self, line: &str, previous: &str, diagnostics: &mut Diagnostics) -> LineOutcome {
        if line.contains(LONG_TITLE_MARKER) {
            let title = parse_fragment(line).text;
            if !title.is_empty() {
                self.dossier.long_title = Some(title);
            }
        }

        if line.contains(SECTION_MARKER) {
            let section = Section::from_header(&parse_fragment(line).text);
            self.section = Some(section);
            self.predicted = match section {
                Section::CommitteeWork => Some(StepKind::Commission),
                Section::FloorDebate => Some(StepKind::Hemicycle),
                Section::Other => None,
            }
            .map(|kind| {
                let mut step = Step::new(self.institution, self.stage_label(), Some(kind));
                step.predicted = true;
                step
            });
        }

        if line.contains(PREPARATORY_WORKS_MARKER) {
            if self.preparatory_works_seen {
                diagnostics.warn("found another dossier inside the dossier", None);
                return LineOutcome::Nested;
            }
            self.preparatory_works_seen = true;
        }

        if line.contains(STAGE_HEADER_MARKER) {
            if let Some(reason) = self.read_stage_header(line) {
                diagnostics.warn(&reason, None);
                return LineOutcome::Unsupported(reason);
            }
        }

        if line.contains(EUROPEAN_RESOLUTION_MARKER) {
            let reason = "european resolution proposal".to_string();
            diagnostics.warn(&reason, None);
            return LineOutcome::Unsupported(reason);
        }

        if line.contains("<a ") || line.contains("<A ") {
            self.read_continuation(line);
        }

        if !self.read_content(line, previous, diagnostics) {
            return LineOutcome::Next;
        }

        if line.contains(JOURNAL_MARKER) && !self.read_journal(line, diagnostics) {
            return LineOutcome::Next;
        }

        if ACCELERATION_MARKERS.iter().any(|marker| line.contains(marker)) {
            self.dossier.urgent = true;
        }

        LineOutcome::Next
    }

    /// Institution and stage from a stage header. Returns the reason when
    /// the page describes something that is not a bill.
    fn read_stage_header(&mut self, line: &str) -> Option<String> {
        let fragment = parse_fragment(line);
        let mut text = fragment.text.clone();
        self.section = None;

        if text.contains("Dossier en ligne sur le site du Sénat") {
            if let Some(link) = fragment.links.last() {
                self.dossier.senate_url = Some(clean_url(&link.href));
            }
            text = text.replace("(Dossier en ligne sur le site du Sénat)", "");
        }

        if text.contains("Sénat") {
            self.institution = Institution::Senat;
        } else if text.contains("Assemblée nationale") {
            self.institution = Institution::Assemblee;
        } else if text.contains("Commission Mixte Paritaire") || text.contains("Lecture texte CMP") {
            self.institution = Institution::Cmp;
            self.stage = Some(stage::CMP.to_string());
        } else if text.contains("Conseil Constitutionnel") {
            self.institution = Institution::ConseilConstitutionnel;
            self.stage = Some(stage::CONSTITUTIONALITY.to_string());
        } else if text.contains("Congrès du Parlement") {
            self.institution = Institution::Congres;
            self.stage = Some(stage::CONGRESS.to_string());
        }

        let reading = if text.contains("1ère lecture") {
            Some(stage::FIRST_READING)
        } else if text.contains("2e lecture") {
            Some(stage::SECOND_READING)
        } else if text.contains("3e lecture") {
            Some(stage::THIRD_READING)
        } else if text.contains("Nouvelle lecture") {
            Some(stage::NEW_READING)
        } else if text.contains("Lecture définitive") {
            Some(stage::FINAL_READING)
        } else {
            None
        };
        if let Some(reading) = reading {
            self.stage = Some(reading.to_string());
        }
        if self.stage.is_none() {
            let tail = text.rsplit('-').next().unwrap_or_default();
            self.stage = Some(tail.trim().to_lowercase());
        }

        (self.stage.as_deref() == Some(UNSUPPORTED_INQUIRY_STAGE))
            .then(|| "commission of inquiry creation".to_string())
    }

    /// Links to the same bill's dossier in another legislature.
    fn read_continuation(&mut self, line: &str) {
        let Some(current) = self.dossier.legislature else {
            return;
        };
        let fragment = parse_fragment(line);
        if !fragment.folded.contains("legislature") {
            return;
        }
        for link in &fragment.links {
            let Some(other) = DOSSIER_LINK_RE
                .captures(&link.href)
                .and_then(|captures| captures[1].parse::<u32>().ok())
            else {
                continue;
            };
            let url = clean_url(&resolve_url(&self.base_url, &link.href));
            if other < current && self.dossier.previous_works.is_none() {
                self.dossier.previous_works = Some(url);
            } else if other > current && self.dossier.next_works.is_none() {
                self.dossier.next_works = Some(url);
            }
        }
    }

    /// Emit the step a content line stands for. Returns false when the rest
    /// of the line must be ignored.
    fn read_content(&mut self, line: &str, previous: &str, diagnostics: &mut Diagnostics) -> bool {
        let current_stage = self.stage_label();
        let mut extra_urls = Vec::new();

        let step_kind = match classify_line(line, self.section) {
            LineTrigger::Skip => return false,
            LineTrigger::None => return true,
            LineTrigger::Deposit => {
                if self.stage.as_deref() == Some(stage::CMP) {
                    return false;
                }
                Some(StepKind::Depot)
            }
            LineTrigger::CommitteeText => {
                let previous_url = self
                    .last_step()
                    .filter(|step| step.step == Some(StepKind::Commission))
                    .map(|step| step.source_url.clone().unwrap_or_default());
                match previous_url {
                    None => Some(StepKind::Commission),
                    Some(previous_url) if is_report_url(&previous_url) => {
                        diagnostics.warn(
                            "double commission line, committee text replaces the report",
                            Some(serde_json::json!({ "report": previous_url })),
                        );
                        if let Some(report) = self.dossier.steps.pop() {
                            extra_urls.extend(report.source_url);
                            extra_urls.extend(report.extra_urls);
                        }
                        Some(StepKind::Commission)
                    }
                    Some(_) if self.institution == Institution::Senat
                        && self.stage.as_deref() != Some(stage::CMP) =>
                    {
                        diagnostics.warn("double commission line, read as another deposit", None);
                        Some(StepKind::Depot)
                    }
                    Some(_) => {
                        diagnostics.warn("double commission line, kept as extra url", None);
                        if let Some(url) = self.pick_url(line) {
                            if let Some(step) = self.dossier.steps.last_mut() {
                                step.extra_urls.push(url);
                            }
                        }
                        return false;
                    }
                }
            }
            LineTrigger::AdoptedText => {
                if self.last_step().map(|step| step.stage.as_str()) != Some(current_stage.as_str()) {
                    Some(StepKind::Depot)
                } else {
                    Some(StepKind::Hemicycle)
                }
            }
            LineTrigger::Report => {
                if self.last_step().and_then(|step| step.step) == Some(StepKind::Commission) {
                    diagnostics.warn("double commission line, report kept as extra url", None);
                    if let Some(url) = self.pick_url(line) {
                        if let Some(step) = self.dossier.steps.last_mut() {
                            step.extra_urls.push(url);
                        }
                    }
                    return false;
                }
                Some(StepKind::Commission)
            }
            LineTrigger::ConstitutionalLink => (self.institution
                == Institution::ConseilConstitutionnel)
                .then_some(StepKind::Constitutionnalite),
        };

        let Some(url) = self.pick_url(line) else {
            diagnostics.warn(
                "no link in line",
                Some(serde_json::json!({ "line": line.trim() })),
            );
            return false;
        };

        let institution = if self.stage.as_deref() == Some(stage::CMP)
            && step_kind == Some(StepKind::Hemicycle)
        {
            if url.contains("assemblee-nationale.fr") {
                Institution::Assemblee
            } else if url.contains("senat.fr") {
                Institution::Senat
            } else {
                self.institution
            }
        } else {
            self.institution
        };

        let mut step = Step::new(institution, current_stage, step_kind)
            .with_url(url)
            .with_date(step_date(line, previous));
        step.extra_urls = extra_urls;
        self.dossier.steps.push(step);
        self.predicted = None;
        true
    }

    /// Non-report link first, else the first report; relative to the page.
    fn pick_url(&self, line: &str) -> Option<String> {
        let fragment = parse_fragment(line);
        let links: Vec<&str> = fragment
            .links
            .iter()
            .map(|link| link.href.as_str())
            .filter(|href| {
                !href.is_empty()
                    && !href.contains("fiches_id")
                    && !href.contains("/senateur/")
                    && !href.contains("javascript:")
            })
            .collect();
        let href = links
            .iter()
            .find(|href| !is_report_url(href))
            .or_else(|| links.first())?;
        Some(clean_url(&resolve_url(&self.base_url, href)))
    }

    fn read_journal(&mut self, line: &str, diagnostics: &mut Diagnostics) -> bool {
        let fragment = parse_fragment(line);
        let Some(journal) = fragment
            .links
            .iter()
            .filter(|link| link.href.contains("legifrance"))
            .next_back()
            .map(|link| link.href.clone())
        else {
            diagnostics.warn(
                "no legifrance link in journal line",
                Some(serde_json::json!({ "line": line.trim() })),
            );
            return false;
        };

        if self.dossier.journal_url.is_none() {
            self.dossier.journal_url = Some(journal.clone());
        }
        self.promulgation = Some(
            Step::new(
                Institution::Gouvernement,
                stage::PROMULGATION,
                Some(StepKind::Promulgation),
            )
            .with_url(journal)
            .with_date(law_date(&fragment)),
        );
        true
    }

    fn finish(mut self) -> Dossier {
        if let Some(promulgation) = self.promulgation.take() {
            self.dossier.promulgation_date = promulgation.date;
            self.dossier.steps.push(promulgation);
        } else if let Some(predicted) = self.predicted.take() {
            let repeats_last = self
                .dossier
                .steps
                .last()
                .is_some_and(|last| last.same_position(&predicted));
            if !repeats_last {
                self.dossier.steps.push(predicted);
            }
        }
        self.dossier.refresh_beginning();
        self.dossier
    }
}

fn law_date(fragment: &TextBlock) -> Option<NaiveDate> {
    LAW_DATE_RE
        .captures(&fragment.folded)
        .and_then(|captures| extract_date(&captures[1]))
}

/// Date cue on the line itself, else on the line just before it.
fn step_date(line: &str, previous: &str) -> Option<NaiveDate> {
    [line, previous].into_iter().find_map(|raw| {
        if raw.trim().is_empty() {
            return None;
        }
        DATE_CUE_RE
            .captures(&parse_fragment(raw).folded)
            .and_then(|captures| extract_date(&captures[1]))
    })
}

pub fn parse_legacy_page(html: &str, url: &str, diagnostics: &mut Diagnostics) -> LegacyOutcome {
    parse_legacy_page_with_depth(html, url, DEFAULT_MAX_DEPTH, diagnostics)
}

/// Parse a legacy page, splitting out at most `max_depth` nested dossiers.
pub fn parse_legacy_page_with_depth(
    html: &str,
    url: &str,
    max_depth: usize,
    diagnostics: &mut Diagnostics,
) -> LegacyOutcome {
    parse_nested(html, url, true, 0, max_depth, diagnostics)
}

fn parse_nested(
    html: &str,
    url: &str,
    first_in_page: bool,
    depth: usize,
    max_depth: usize,
    diagnostics: &mut Diagnostics,
) -> LegacyOutcome {
    let mut state = LegacyState::new(url);
    if first_in_page {
        state.read_meta(html);
    }

    let lines: Vec<&str> = html.split('\n').collect();
    let mut nested_from = None;
    let mut previous = "";

    for (index, line) in lines.iter().copied().enumerate() {
        match state.feed(line, previous, diagnostics) {
            LineOutcome::Next => {}
            LineOutcome::Nested => {
                nested_from = Some(index);
                break;
            }
            LineOutcome::Unsupported(reason) => return LegacyOutcome::Unsupported(reason),
        }
        previous = line;
    }

    let mut dossiers = vec![state.finish()];

    if let Some(index) = nested_from {
        if depth + 1 >= max_depth {
            diagnostics.warn(
                "nested dossier ignored, depth limit reached",
                Some(serde_json::json!({ "depth": depth, "url": url })),
            );
        } else {
            let rest = lines[index..].join("\n");
            if let LegacyOutcome::Dossiers(others) =
                parse_nested(&rest, url, false, depth + 1, max_depth, diagnostics)
            {
                dossiers.extend(others);
            }
        }
    }

    LegacyOutcome::Dossiers(dossiers)
}
