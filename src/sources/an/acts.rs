//! Turn the blocks accumulated under one procedural-act node into facts.

use crate::dates::extract_date;
use crate::sources::an::classifier::{is_report_url, ActRole};
use crate::sources::common::TextBlock;
use crate::types::{ActType, LegislativeAct, StepStatus};
use crate::urls::{clean_url, resolve_url};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static DEPOSIT_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" deposee? le (\d+(?:er)? \w+ \d{4})").unwrap());
static COMMITTEE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:deposee?|mis en ligne) le (\d+(?:er)? \w+ \d{4})").unwrap()
});
static SITTING_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" le (\d+\s?\w* \w+ \d{4})").unwrap());
static OF_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" du (\d+(?:er)? \w+ \d{4})").unwrap());

fn first_date(pattern: &Regex, block: &TextBlock) -> Option<NaiveDate> {
    pattern
        .captures(&block.folded)
        .and_then(|captures| extract_date(&captures[1]))
}

fn absolute(base_url: &str, href: &str) -> String {
    clean_url(&resolve_url(base_url, href))
}

fn first_url(block: &TextBlock, base_url: &str) -> Option<String> {
    block.first_href().map(|href| absolute(base_url, href))
}

/// First link that is not a report, else the first report.
fn text_url(block: &TextBlock, base_url: &str) -> Option<String> {
    block
        .links
        .iter()
        .find(|link| !is_report_url(&link.href))
        .or_else(|| block.links.first())
        .map(|link| absolute(base_url, &link.href))
}

pub fn act_type(role: ActRole) -> ActType {
    match role {
        ActRole::FloorText => ActType::DiscussionSeancePublique,
        ActRole::Deposit => ActType::DepotInitiative,
        ActRole::AccelerationDeclaration => ActType::ProcedureAcceleree,
        ActRole::CouncilOfStateOpinion => ActType::AvisConseilEtat,
        ActRole::ImpactStudy => ActType::EtudeImpact,
        ActRole::CommitteeText => ActType::TexteCommission,
        ActRole::Report => ActType::DepotRapport,
        ActRole::PromulgationNotice => ActType::Promulgation,
        ActRole::ConstitutionalDecision => ActType::DecisionConseilConstit,
        ActRole::Decision => ActType::Decision,
    }
}

/// Adopted, then modified, then rejected: the first stem found wins.
pub fn decision_status(folded: &str) -> Option<StepStatus> {
    if folded.contains("adopte") {
        Some(StepStatus::Adopte)
    } else if folded.contains("modifie") {
        Some(StepStatus::Modifie)
    } else if folded.contains("rejete") {
        Some(StepStatus::Rejete)
    } else {
        None
    }
}

pub fn extract_acts(role: ActRole, blocks: &[TextBlock], base_url: &str) -> Vec<LegislativeAct> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };
    let mut act = LegislativeAct::new(act_type(role));

    match role {
        ActRole::FloorText => return extract_sittings(blocks, base_url),
        ActRole::AccelerationDeclaration => {
            act.date = first_date(&SITTING_DATE_RE, first);
        }
        ActRole::ImpactStudy => {
            act.url = first_url(first, base_url);
        }
        ActRole::CouncilOfStateOpinion => {
            act.url = first_url(first, base_url);
            if act.url.is_none() {
                return Vec::new();
            }
        }
        ActRole::Deposit | ActRole::Report => {
            act.url = text_url(first, base_url);
            act.date = first_date(&DEPOSIT_DATE_RE, first);
        }
        ActRole::CommitteeText => {
            act.url = text_url(first, base_url);
            act.date = first_date(&COMMITTEE_DATE_RE, first);
        }
        ActRole::Decision => {
            act.status = decision_status(&first.folded);
            act.date = first_date(&SITTING_DATE_RE, first);
            act.url = first_url(first, base_url);
        }
        ActRole::PromulgationNotice => {
            act.url = first
                .links
                .iter()
                .find(|link| link.href.contains("legifrance"))
                .or_else(|| first.links.first())
                .map(|link| absolute(base_url, &link.href));
            act.date = first_date(&OF_DATE_RE, first);
        }
        ActRole::ConstitutionalDecision => {
            act.url = first_url(first, base_url);
            act.date = first_date(&OF_DATE_RE, first);
        }
    }

    vec![act]
}

/// Either every link of an "au cours des séances" summary, or one dated act
/// per "séance du" line (vote lines excluded).
fn extract_sittings(blocks: &[TextBlock], base_url: &str) -> Vec<LegislativeAct> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };

    if first.folded.contains("au cours des seances") {
        return first
            .links
            .iter()
            .map(|link| LegislativeAct {
                url: Some(absolute(base_url, &link.href)),
                ..LegislativeAct::new(ActType::DiscussionSeancePublique)
            })
            .collect();
    }

    blocks
        .iter()
        .filter(|block| block.folded.contains("seance du ") && !block.folded.contains("scrutin"))
        .map(|block| {
            let date = block
                .folded
                .split_once("seance du ")
                .and_then(|(_, rest)| extract_date(rest));
            LegislativeAct {
                url: first_url(block, base_url),
                date,
                ..LegislativeAct::new(ActType::DiscussionSeancePublique)
            }
        })
        .collect()
}
