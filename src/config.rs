use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const AN_BASE_URL: &str = "http://www.assemblee-nationale.fr";
pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSource {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    pub an_base_url: String,
    pub open_data_archives: BTreeMap<u32, ArchiveSource>,
    /// Bound on cross-legislature continuation and nested-dossier splitting.
    pub max_depth: usize,
    pub prefer_open_data: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let mut open_data_archives = BTreeMap::new();
        open_data_archives.insert(
            14,
            ArchiveSource {
                file_name: "Dossiers_Legislatifs_XIV.json".to_string(),
                url: "http://data.assemblee-nationale.fr/static/openData/repository/14/loi/dossiers_legislatifs/Dossiers_Legislatifs_XIV.json.zip".to_string(),
            },
        );
        open_data_archives.insert(
            15,
            ArchiveSource {
                file_name: "Dossiers_Legislatifs_XV.json".to_string(),
                url: "http://data.assemblee-nationale.fr/static/openData/repository/15/loi/dossiers_legislatifs/Dossiers_Legislatifs_XV.json.zip".to_string(),
            },
        );

        Self {
            an_base_url: AN_BASE_URL.to_string(),
            open_data_archives,
            max_depth: DEFAULT_MAX_DEPTH,
            prefer_open_data: true,
        }
    }
}

impl ResolverConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read resolver config: {e}"))?;
        let config: ResolverConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse resolver config: {e}"))?;
        Ok(config)
    }

    pub fn archive_for(&self, legislature: u32) -> Option<&ArchiveSource> {
        self.open_data_archives.get(&legislature)
    }
}
