//! Pattern tables deciding which structural role a block or raw line plays.
//!
//! Block patterns run against [`TextBlock::folded`] (lowercase, no
//! diacritics), so they are written without accents. Stage headers are
//! checked first; act rules are then tried in table order and the first
//! match wins.

use crate::sources::common::TextBlock;
use crate::types::ReadingStageKind;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActRole {
    FloorText,
    Deposit,
    AccelerationDeclaration,
    CouncilOfStateOpinion,
    ImpactStudy,
    CommitteeText,
    Report,
    PromulgationNotice,
    ConstitutionalDecision,
    Decision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    ReadingStageHeader(ReadingStageKind),
    Act(ActRole),
    None,
}

struct ActRule {
    role: ActRole,
    pattern: Regex,
    needs_link: bool,
    /// The rule fails when the folded text contains this stem.
    excludes: Option<&'static str>,
}

impl ActRule {
    fn new(role: ActRole, pattern: &str) -> Self {
        Self {
            role,
            pattern: Regex::new(pattern).unwrap(),
            needs_link: false,
            excludes: None,
        }
    }

    fn with_link(mut self) -> Self {
        self.needs_link = true;
        self
    }

    fn excluding(mut self, stem: &'static str) -> Self {
        self.excludes = Some(stem);
        self
    }

    fn matches(&self, block: &TextBlock) -> bool {
        if self.needs_link && !block.has_link() {
            return false;
        }
        if let Some(stem) = self.excludes {
            if block.folded.contains(stem) {
                return false;
            }
        }
        self.pattern.is_match(&block.folded)
    }
}

static STAGE_RULES: LazyLock<Vec<(ReadingStageKind, Regex)>> = LazyLock::new(|| {
    use ReadingStageKind::*;
    [
        (AnPremiereLecture, r"^assemblee nationale - 1 ?ere lecture"),
        (SenatPremiereLecture, r"^senat - 1 ?ere lecture"),
        (AnDeuxiemeLecture, r"^assemblee nationale - 2 ?e lecture"),
        (SenatDeuxiemeLecture, r"^senat - 2 ?e lecture"),
        (AnTroisiemeLecture, r"^assemblee nationale - 3 ?e lecture"),
        (SenatTroisiemeLecture, r"^senat - 3 ?e lecture"),
        (AnNouvelleLecture, r"^assemblee nationale - nouvelle lecture"),
        (SenatNouvelleLecture, r"^senat - nouvelle lecture"),
        (AnLectureDefinitive, r"^assemblee nationale - lecture definitive"),
        (ConseilConstitutionnel, r"^conseil constitutionnel"),
        (Cmp, r"^commission mixte paritaire \((accord|desaccord)?\)$"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).unwrap()))
    .collect()
});

static ACT_RULES: LazyLock<Vec<ActRule>> = LazyLock::new(|| {
    use ActRole::*;
    vec![
        ActRule::new(FloorText, r"^discussion en seance publique"),
        ActRule::new(Deposit, r"^(projet de loi|proposition de loi).+deposee? le").with_link(),
        ActRule::new(
            AccelerationDeclaration,
            r"^le gouvernement a engage la procedure acceleree",
        ),
        ActRule::new(CouncilOfStateOpinion, r"^avis du conseil d'etat"),
        ActRule::new(ImpactStudy, r"^etude d'impact"),
        ActRule::new(
            CommitteeText,
            r"^texte de la commission.+(deposee?|mis en ligne) le",
        )
        .with_link(),
        ActRule::new(Report, r"^rapport.+deposee? le").with_link(),
        ActRule::new(
            PromulgationNotice,
            r"^loi n.+(promulguee|publiee au journal officiel)",
        )
        .with_link(),
        ActRule::new(
            ConstitutionalDecision,
            r"^decision (du conseil constitutionnel|n\S* ?\d{4}-\d+ ?dc)",
        )
        .with_link(),
        ActRule::new(Decision, r"^(projet de loi|proposition de loi)").excluding("depose"),
    ]
});

pub fn reading_stage_kind(block: &TextBlock) -> Option<ReadingStageKind> {
    STAGE_RULES
        .iter()
        .find(|(_, pattern)| pattern.is_match(&block.folded))
        .map(|(kind, _)| *kind)
}

pub fn classify_block(block: &TextBlock) -> BlockRole {
    if let Some(kind) = reading_stage_kind(block) {
        return BlockRole::ReadingStageHeader(kind);
    }
    ACT_RULES
        .iter()
        .find(|rule| rule.matches(block))
        .map_or(BlockRole::None, |rule| BlockRole::Act(rule.role))
}

// Raw-line markers of the legacy page layout.
pub const LONG_TITLE_MARKER: &str = r##"<font face="ARIAL" size="3" color="#000080">"##;
pub const SECTION_MARKER: &str = r##"<br><b><font color="#000099">"##;
pub const PREPARATORY_WORKS_MARKER: &str =
    r##"<p align="center"><b><font color="#000080">Travaux préparatoires</font></b><br>"##;
pub const STAGE_HEADER_MARKER: &str = r##"<font color="#000099" size="2" face="Arial">"##;
pub const EUROPEAN_RESOLUTION_MARKER: &str = ">Proposition de résolution européenne<";
pub const JOURNAL_MARKER: &str = "publiée au Journal Officiel";
pub const ACCELERATION_MARKERS: [&str; 2] = [
    "Le Gouvernement a engagé la procédure accélérée",
    "engagement de la procédure accélérée",
];

/// Section a legacy line sits in, set by the section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    CommitteeWork,
    FloorDebate,
    Other,
}

impl Section {
    pub fn from_header(text: &str) -> Self {
        let folded = crate::sources::common::fold(text);
        if folded.contains("commissions") {
            Section::CommitteeWork
        } else if folded.contains("seance publique") {
            Section::FloorDebate
        } else {
            Section::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTrigger {
    /// A line the legacy parser must not turn into anything.
    Skip,
    Deposit,
    CommitteeText,
    /// Link to an adopted text: deposit when it opens a stage, floor otherwise.
    AdoptedText,
    Report,
    ConstitutionalLink,
    None,
}

pub fn is_report_url(url: &str) -> bool {
    url.contains("/rapports/") || url.contains("/rap/")
}

/// Content trigger of one raw legacy line. Reports only count inside a
/// committee-work section.
pub fn classify_line(line: &str, section: Option<Section>) -> LineTrigger {
    if line.contains("Rapport portant également sur les propositions") {
        LineTrigger::Skip
    } else if line.contains(">Projet de loi")
        || line.contains(">Proposition de loi")
        || line.contains(">Proposition de résolution")
    {
        LineTrigger::Deposit
    } else if line.contains(">Texte de la commission") || line.contains("/ta-commission/") {
        LineTrigger::CommitteeText
    } else if line.contains("/ta/") || line.contains("/tas") {
        LineTrigger::AdoptedText
    } else if is_report_url(line) && section == Some(Section::CommitteeWork) {
        LineTrigger::Report
    } else if line.contains("www.conseil-constitutionnel.fr/decision/") {
        LineTrigger::ConstitutionalLink
    } else {
        LineTrigger::None
    }
}
