use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stage labels shared by every pipeline that emits [`Step`]s.
pub mod stage {
    pub const FIRST_READING: &str = "1ère lecture";
    pub const SECOND_READING: &str = "2ème lecture";
    pub const THIRD_READING: &str = "3ème lecture";
    pub const NEW_READING: &str = "nouv. lect.";
    pub const FINAL_READING: &str = "l. définitive";
    pub const SINGLE_READING: &str = "lecture unique";
    pub const CMP: &str = "CMP";
    pub const CONSTITUTIONALITY: &str = "constitutionnalité";
    pub const PROMULGATION: &str = "promulgation";
    pub const CONGRESS: &str = "congrès";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Institution {
    #[serde(rename = "assemblee")]
    Assemblee,
    #[serde(rename = "senat")]
    Senat,
    #[serde(rename = "CMP")]
    Cmp,
    #[serde(rename = "conseil constitutionnel")]
    ConseilConstitutionnel,
    #[serde(rename = "gouvernement")]
    Gouvernement,
    #[serde(rename = "congrès")]
    Congres,
}

impl Institution {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assemblee => "assemblee",
            Self::Senat => "senat",
            Self::Cmp => "CMP",
            Self::ConseilConstitutionnel => "conseil constitutionnel",
            Self::Gouvernement => "gouvernement",
            Self::Congres => "congrès",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Depot,
    Commission,
    Hemicycle,
    Promulgation,
    #[serde(rename = "constitutionnalité")]
    Constitutionnalite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Adopte,
    Rejete,
    Modifie,
    Accord,
    Desaccord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcedureKind {
    Pjl,
    Ppl,
}

/// One procedural event of a bill, in the vocabulary shared by the HTML and
/// open-data pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub institution: Institution,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepKind>,
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StepStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_urls: Vec<String>,
    /// Set on the synthetic "next step" appended to bills still in progress.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub predicted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_step_opendata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_text_opendata: Option<String>,
}

impl Step {
    pub fn new(institution: Institution, stage: impl Into<String>, step: Option<StepKind>) -> Self {
        Self {
            institution,
            stage: stage.into(),
            step,
            source_url: None,
            date: None,
            status: None,
            extra_urls: Vec::new(),
            predicted: false,
            id_step_opendata: None,
            id_text_opendata: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_optional_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// Same (institution, stage, step-kind) triple.
    pub fn same_position(&self, other: &Step) -> bool {
        self.institution == other.institution && self.stage == other.stage && self.step == other.step
    }

    pub fn is_promulgation(&self) -> bool {
        self.stage == stage::PROMULGATION
    }
}

/// A bill's legislative record, as produced by any of the parsing pipelines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub legislature: Option<u32>,
    pub long_title: Option<String>,
    pub senate_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<ProcedureKind>,
    pub urgent: bool,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beginning: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promulgation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_works: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_works: Option<String>,
}

impl Dossier {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.map(ToString::to_string),
            ..Self::default()
        }
    }

    /// `beginning` always mirrors the first step's date.
    pub fn refresh_beginning(&mut self) {
        self.beginning = self.steps.first().and_then(|step| step.date);
    }

    pub fn has_promulgation(&self) -> bool {
        self.steps.iter().any(Step::is_promulgation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStageKind {
    AnPremiereLecture,
    SenatPremiereLecture,
    AnDeuxiemeLecture,
    SenatDeuxiemeLecture,
    AnTroisiemeLecture,
    SenatTroisiemeLecture,
    AnNouvelleLecture,
    SenatNouvelleLecture,
    AnLectureDefinitive,
    #[serde(rename = "CONSEIL_CONSTITUT")]
    ConseilConstitutionnel,
    Cmp,
}

impl ReadingStageKind {
    pub fn institution(self) -> Institution {
        match self {
            Self::AnPremiereLecture
            | Self::AnDeuxiemeLecture
            | Self::AnTroisiemeLecture
            | Self::AnNouvelleLecture
            | Self::AnLectureDefinitive => Institution::Assemblee,
            Self::SenatPremiereLecture
            | Self::SenatDeuxiemeLecture
            | Self::SenatTroisiemeLecture
            | Self::SenatNouvelleLecture => Institution::Senat,
            Self::ConseilConstitutionnel => Institution::ConseilConstitutionnel,
            Self::Cmp => Institution::Cmp,
        }
    }

    pub fn stage_label(self) -> &'static str {
        match self {
            Self::AnPremiereLecture | Self::SenatPremiereLecture => stage::FIRST_READING,
            Self::AnDeuxiemeLecture | Self::SenatDeuxiemeLecture => stage::SECOND_READING,
            Self::AnTroisiemeLecture | Self::SenatTroisiemeLecture => stage::THIRD_READING,
            Self::AnNouvelleLecture | Self::SenatNouvelleLecture => stage::NEW_READING,
            Self::AnLectureDefinitive => stage::FINAL_READING,
            Self::ConseilConstitutionnel => stage::CONSTITUTIONALITY,
            Self::Cmp => stage::CMP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActType {
    EtudeImpact,
    #[serde(rename = "AVIS_CONSEIL_DETAT")]
    AvisConseilEtat,
    ProcedureAcceleree,
    TexteCommission,
    DepotRapport,
    DiscussionSeancePublique,
    Decision,
    DepotInitiative,
    Promulgation,
    DecisionConseilConstit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegislativeAct {
    #[serde(rename = "type")]
    pub act_type: ActType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StepStatus>,
}

impl LegislativeAct {
    pub fn new(act_type: ActType) -> Self {
        Self {
            act_type,
            url: None,
            date: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingStage {
    /// `None` for acts that appeared before any stage header.
    #[serde(rename = "type")]
    pub kind: Option<ReadingStageKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StepStatus>,
    pub acts: Vec<LegislativeAct>,
}
