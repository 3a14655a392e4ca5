//! Open-data export: loading, record lookup and step normalisation.

use crate::error::DossierError;
use crate::runtime::logging::Diagnostics;
use crate::sources::an::opendata_xml::xml_to_json;
use crate::types::{stage, Dossier, Institution, ProcedureKind, Step, StepKind};
use crate::urls::{an_text_url, clean_url};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

/// Document type the export uses for placeholder "related act" texts.
pub const RELATED_ACT_TYPE: &str = "ACTEREF";

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(values)) => values,
        Some(OneOrMany::One(value)) => vec![value],
        None => Vec::new(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenDataExport {
    pub export: ExportBody,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBody {
    #[serde(default)]
    pub textes_legislatifs: Option<TextesLegislatifs>,
    #[serde(default)]
    pub dossiers_legislatifs: Option<DossiersLegislatifs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextesLegislatifs {
    #[serde(default, deserialize_with = "one_or_many")]
    pub document: Vec<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub uid: String,
    #[serde(default)]
    pub legislature: Option<String>,
    #[serde(default)]
    pub classification: Option<Classification>,
}

impl Document {
    pub fn type_code(&self) -> Option<&str> {
        self.classification
            .as_ref()?
            .document_type
            .as_ref()?
            .code
            .as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    #[serde(rename = "type", default)]
    pub document_type: Option<CodeLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeLabel {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DossiersLegislatifs {
    #[serde(default, deserialize_with = "one_or_many")]
    pub dossier: Vec<DossierEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierEntry {
    pub dossier_parlementaire: DossierParlementaire,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierParlementaire {
    #[serde(default)]
    pub uid: Option<String>,
    pub legislature: String,
    pub titre_dossier: TitreDossier,
    #[serde(default)]
    pub actes_legislatifs: Option<ActesLegislatifs>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitreDossier {
    #[serde(default)]
    pub titre: Option<String>,
    pub titre_chemin: String,
    #[serde(default)]
    pub senat_chemin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActesLegislatifs {
    #[serde(default, deserialize_with = "one_or_many")]
    pub acte_legislatif: Vec<ActeLegislatif>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActeLegislatif {
    pub uid: String,
    #[serde(rename = "@xsi:type", default)]
    pub xsi_type: Option<String>,
    #[serde(default)]
    pub code_acte: Option<String>,
    #[serde(default)]
    pub date_acte: Option<String>,
    #[serde(default)]
    pub actes_legislatifs: Option<ActesLegislatifs>,
    #[serde(default)]
    pub texte_adopte: Option<String>,
    #[serde(default)]
    pub textes_associes: Option<TextesAssocies>,
    #[serde(default)]
    pub url_legifrance: Option<String>,
    #[serde(rename = "infoJO", default)]
    pub info_jo: Option<InfoJo>,
    #[serde(default)]
    pub url_conclusion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextesAssocies {
    #[serde(default, deserialize_with = "one_or_many")]
    pub texte_associe: Vec<TexteAssocie>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TexteAssocie {
    #[serde(default)]
    pub ref_texte_associe: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoJo {
    #[serde(default)]
    pub url_legifrance: Option<String>,
}

impl ActeLegislatif {
    pub fn children(&self) -> &[ActeLegislatif] {
        self.actes_legislatifs
            .as_ref()
            .map(|actes| actes.acte_legislatif.as_slice())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.xsi_type.as_deref().unwrap_or_default()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.date_acte.as_deref()?;
        let day = raw.split('T').next()?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Adopted text, else the first associated text.
    pub fn text_id(&self) -> Option<&str> {
        self.texte_adopte.as_deref().or_else(|| {
            self.textes_associes
                .as_ref()?
                .texte_associe
                .first()?
                .ref_texte_associe
                .as_deref()
        })
    }
}

/// Leaf acts in depth-first order, each with the chain of acts above it.
pub fn leaf_acts<'a>(act: &'a ActeLegislatif) -> Vec<(Vec<&'a ActeLegislatif>, &'a ActeLegislatif)> {
    fn walk<'a>(
        act: &'a ActeLegislatif,
        path: &mut Vec<&'a ActeLegislatif>,
        leaves: &mut Vec<(Vec<&'a ActeLegislatif>, &'a ActeLegislatif)>,
    ) {
        if act.children().is_empty() {
            leaves.push((path.clone(), act));
            return;
        }
        path.push(act);
        for child in act.children() {
            walk(child, path, leaves);
        }
        path.pop();
    }

    let mut leaves = Vec::new();
    walk(act, &mut Vec::new(), &mut leaves);
    leaves
}

pub fn parse_export_json(bytes: &[u8]) -> Result<OpenDataExport, DossierError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn parse_export_xml(xml: &str) -> Result<OpenDataExport, DossierError> {
    Ok(serde_json::from_value(xml_to_json(xml)?)?)
}

/// Zipped archive (first `.json` or `.xml` entry), plain JSON or XML.
pub fn load_export(bytes: &[u8]) -> Result<OpenDataExport, DossierError> {
    load_export_entry(bytes, None)
}

/// Like [`load_export`], reading the archive entry called `entry_name` when
/// there is one.
pub fn load_export_entry(
    bytes: &[u8],
    entry_name: Option<&str>,
) -> Result<OpenDataExport, DossierError> {
    if bytes.starts_with(b"PK") {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut chosen = None;
        for index in 0..archive.len() {
            let name = archive.by_index(index)?.name().to_string();
            if entry_name.is_some_and(|wanted| name.ends_with(wanted)) {
                chosen = Some(index);
                break;
            }
            let lowered = name.to_ascii_lowercase();
            if chosen.is_none() && (lowered.ends_with(".json") || lowered.ends_with(".xml")) {
                chosen = Some(index);
            }
        }
        let Some(index) = chosen else {
            return Err(DossierError::Export(
                "archive holds no .json or .xml entry".to_string(),
            ));
        };
        let mut contents = Vec::new();
        archive.by_index(index)?.read_to_end(&mut contents)?;
        return load_export_entry(&contents, None);
    }

    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    if bytes[start..].starts_with(b"<") {
        parse_export_xml(&String::from_utf8_lossy(&bytes[start..]))
    } else {
        parse_export_json(bytes)
    }
}

pub fn load_export_from_file(path: &Path) -> Result<OpenDataExport, DossierError> {
    load_export(&std::fs::read(path)?)
}

impl OpenDataExport {
    pub fn documents(&self) -> HashMap<&str, &Document> {
        self.export
            .textes_legislatifs
            .iter()
            .flat_map(|textes| textes.document.iter())
            .map(|document| (document.uid.as_str(), document))
            .collect()
    }

    pub fn dossiers(&self) -> impl Iterator<Item = &DossierParlementaire> {
        self.export
            .dossiers_legislatifs
            .iter()
            .flat_map(|dossiers| dossiers.dossier.iter())
            .map(|entry| &entry.dossier_parlementaire)
    }

    /// Record whose `<legislature>/dossiers/<titreChemin>` appears in `url`,
    /// so both old and `/dyn/` urls find it.
    pub fn find_dossier(&self, url: &str) -> Option<&DossierParlementaire> {
        self.dossiers()
            .find(|dossier| url.contains(&dossier.common_url_part()))
    }
}

impl DossierParlementaire {
    pub fn common_url_part(&self) -> String {
        format!("{}/dossiers/{}", self.legislature, self.titre_dossier.titre_chemin)
    }

    pub fn acts(&self) -> &[ActeLegislatif] {
        self.actes_legislatifs
            .as_ref()
            .map(|actes| actes.acte_legislatif.as_slice())
            .unwrap_or_default()
    }
}

/// Institution, stage and step kind encoded in an act code such as
/// `AN1-COM-FOND` or `CMP-DEBATS-SN-DEC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePosition {
    pub institution: Option<Institution>,
    pub stage: Option<&'static str>,
    pub step: Option<StepKind>,
    /// The joint committee's senate-side report, left out of the output.
    pub skip: bool,
}

pub fn decode_act_code(code: &str) -> CodePosition {
    let mut institution = if code.starts_with("AN") {
        Some(Institution::Assemblee)
    } else if code.starts_with("SN") {
        Some(Institution::Senat)
    } else {
        None
    };

    let mut step = if code.contains("-DEPOT") {
        Some(StepKind::Depot)
    } else if code.contains("-COM") {
        Some(StepKind::Commission)
    } else if code.contains("-DEBATS") {
        Some(StepKind::Hemicycle)
    } else {
        None
    };

    let mut skip = false;
    let stage_label = if code.contains("1-") {
        Some(stage::FIRST_READING)
    } else if code.contains("2-") {
        Some(stage::SECOND_READING)
    } else if code.contains("3-") {
        Some(stage::THIRD_READING)
    } else if code.contains("NLEC-") {
        Some(stage::NEW_READING)
    } else if code.contains("ANLDEF") {
        // A final reading goes straight to the floor.
        step = Some(StepKind::Hemicycle);
        Some(stage::FINAL_READING)
    } else if code.contains("ANLUNI") {
        Some(stage::SINGLE_READING)
    } else if code.contains("CMP") {
        if code.contains("RAPPORT-SN") {
            institution = Some(Institution::Senat);
            skip = true;
        } else {
            institution = Some(Institution::Cmp);
        }
        Some(stage::CMP)
    } else {
        None
    };

    CodePosition {
        institution,
        stage: stage_label,
        step,
        skip,
    }
}

/// Assembly documents carry `AN` right after the four-letter type.
fn is_assembly_document(identifier: &str) -> bool {
    identifier.get(4..).is_some_and(|rest| rest.starts_with("AN"))
}

/// Normalise the record matching `url`. `Ok(None)` when the export has no
/// such record; an unknown document type aborts the record.
pub fn parse_open_data(
    export: &OpenDataExport,
    url: &str,
    base_url: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Option<Dossier>, DossierError> {
    let Some(record) = export.find_dossier(url) else {
        diagnostics.debug("no open-data record for url");
        return Ok(None);
    };
    let documents = export.documents();

    let legislature = record.legislature.trim().parse::<u32>().ok();
    let slug = record.titre_dossier.titre_chemin.clone();
    let canonical_url = format!("{base_url}/dyn/{}", record.common_url_part());
    let mut dossier = Dossier::new(Some(canonical_url.as_str()));
    dossier.legislature = legislature;
    dossier.canonical_id = Some(format!("{}-{}", record.legislature, slug));
    dossier.slug = Some(slug);
    dossier.long_title = record.titre_dossier.titre.clone();
    dossier.senate_url = record
        .titre_dossier
        .senat_chemin
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(clean_url);

    let mut last_seen: Option<(Institution, &'static str, Option<StepKind>)> = None;

    for act in record.acts() {
        for (_path, leaf) in leaf_acts(act) {
            match leaf.kind() {
                "EtudeImpact_Type" | "DepotAvisConseilEtat_Type" => continue,
                "ProcedureAccelere_Type" => {
                    dossier.urgent = true;
                    continue;
                }
                "Promulgation_Type" => {
                    let journal = leaf
                        .url_legifrance
                        .as_deref()
                        .or_else(|| leaf.info_jo.as_ref()?.url_legifrance.as_deref())
                        .map(clean_url);
                    dossier.journal_url = journal.clone();
                    dossier.promulgation_date = leaf.date();
                    dossier.steps.push(
                        Step::new(
                            Institution::Gouvernement,
                            stage::PROMULGATION,
                            Some(StepKind::Promulgation),
                        )
                        .with_optional_url(journal)
                        .with_date(leaf.date()),
                    );
                    continue;
                }
                "ConclusionEtapeCC_Type" => {
                    dossier.steps.push(
                        Step::new(
                            Institution::ConseilConstitutionnel,
                            stage::CONSTITUTIONALITY,
                            Some(StepKind::Constitutionnalite),
                        )
                        .with_optional_url(leaf.url_conclusion.as_deref().map(clean_url))
                        .with_date(leaf.date()),
                    );
                    continue;
                }
                _ => {}
            }

            let code = leaf.code_acte.as_deref().unwrap_or_default();
            if code.contains("AVIS-RAPPORT") || code.contains("CMP-DEPOT") {
                continue;
            }
            let position = decode_act_code(code);
            if position.skip {
                continue;
            }
            let (Some(institution), Some(stage_label)) = (position.institution, position.stage)
            else {
                continue;
            };
            last_seen = Some((institution, stage_label, position.step));

            let Some(text_id) = leaf.text_id() else {
                continue;
            };

            if dossier.procedure.is_none() {
                if text_id.starts_with("PRJL") {
                    dossier.procedure = Some(ProcedureKind::Pjl);
                } else if text_id.starts_with("PION") {
                    dossier.procedure = Some(ProcedureKind::Ppl);
                }
            }

            let document = documents.get(text_id);
            if document.is_none() {
                diagnostics.warn(
                    "missing text in open-data export",
                    Some(serde_json::json!({ "text": text_id, "act": leaf.uid })),
                );
            }
            let type_code = document.and_then(|document| document.type_code());
            if type_code == Some(RELATED_ACT_TYPE) {
                continue;
            }

            let source_url = if is_assembly_document(text_id) {
                Some(an_text_url(base_url, text_id, type_code)?)
            } else {
                None
            };

            let mut step = Step::new(institution, stage_label, position.step)
                .with_optional_url(source_url)
                .with_date(leaf.date());
            step.id_step_opendata = Some(leaf.uid.clone());
            step.id_text_opendata = Some(text_id.to_string());

            if let Some(previous) = dossier.steps.last() {
                let superseded_deposit = step.step == Some(StepKind::Depot)
                    && previous.step == Some(StepKind::Depot)
                    && previous.institution == step.institution;
                let repeated_final_reading =
                    stage_label == stage::FINAL_READING && previous.same_position(&step);
                if superseded_deposit || repeated_final_reading {
                    diagnostics.debug(&format!(
                        "open-data step {} replaces the previous one",
                        leaf.uid
                    ));
                    dossier.steps.pop();
                }
            }
            dossier.steps.push(step);
        }
    }

    if !dossier.has_promulgation() {
        if let (Some((institution, stage_label, step_kind)), Some(last)) =
            (last_seen, dossier.steps.last())
        {
            let next = Step::new(institution, stage_label, step_kind);
            if !next.same_position(last) {
                let mut predicted = next;
                predicted.predicted = true;
                dossier.steps.push(predicted);
            }
        }
    }

    if dossier.steps.is_empty() {
        diagnostics.warn(
            "open-data record has no usable step",
            Some(serde_json::json!({ "record": record.uid, "url": url })),
        );
    }
    dossier.refresh_beginning();
    Ok(Some(dossier))
}
