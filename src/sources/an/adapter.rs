use crate::config::ResolverConfig;
use crate::error::DossierError;
use crate::runtime::fetcher::Fetcher;
use crate::runtime::logging::Diagnostics;
use crate::sources::an::legacy::{is_legacy_page, parse_legacy_page_with_depth, LegacyOutcome};
use crate::sources::an::opendata::{load_export_entry, parse_open_data, OpenDataExport};
use crate::sources::an::page::parse_dossier_page;
use crate::sources::an::stitch::stitch;
use crate::types::Dossier;
use crate::urls::legislature_from_url;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

type ResolveFuture<'r> = Pin<Box<dyn Future<Output = Result<Vec<Dossier>, DossierError>> + 'r>>;

/// Top-level entry point: picks the open-data normaliser, the legacy parser
/// or the tree pipeline for a dossier url and follows continuations into
/// adjacent legislatures.
///
/// Downloaded open-data exports are kept per resolver, keyed by legislature.
pub struct Resolver<'f> {
    fetcher: &'f dyn Fetcher,
    config: ResolverConfig,
    exports: HashMap<u32, OpenDataExport>,
}

impl<'f> Resolver<'f> {
    pub fn new(fetcher: &'f dyn Fetcher, config: ResolverConfig) -> Self {
        Self {
            fetcher,
            config,
            exports: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Use an already loaded export instead of downloading it.
    pub fn insert_export(&mut self, legislature: u32, export: OpenDataExport) {
        self.exports.insert(legislature, export);
    }

    /// Legislature whose open-data export should answer `url`.
    pub fn open_data_legislature(&self, url: &str) -> Option<u32> {
        if !self.config.prefer_open_data || !url.contains("/dossiers/") {
            return None;
        }
        legislature_from_url(url).filter(|legislature| {
            self.exports.contains_key(legislature) || self.config.archive_for(*legislature).is_some()
        })
    }

    async fn export_for(&mut self, legislature: u32) -> Result<&OpenDataExport, DossierError> {
        if !self.exports.contains_key(&legislature) {
            let archive = self.config.archive_for(legislature).ok_or_else(|| {
                DossierError::Export(format!("no open-data archive for legislature {legislature}"))
            })?;
            tracing::info!("[Dosleg] Downloading open-data export {}", archive.url);
            let response = self
                .fetcher
                .fetch(&archive.url, false)
                .await
                .map_err(DossierError::Fetch)?;
            if !response.is_success() {
                return Err(DossierError::Fetch(format!(
                    "{}: {}",
                    archive.url, response.status
                )));
            }
            let export = load_export_entry(&response.body, Some(&archive.file_name))?;
            self.exports.insert(legislature, export);
        }
        self.exports
            .get(&legislature)
            .ok_or_else(|| DossierError::Export(format!("export {legislature} unavailable")))
    }

    /// Dossiers of an already fetched HTML page. Unsupported legacy pages
    /// yield nothing.
    pub fn parse_html(
        &self,
        html: &str,
        url: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Dossier>, DossierError> {
        if is_legacy_page(html) {
            return Ok(
                match parse_legacy_page_with_depth(html, url, self.config.max_depth, diagnostics) {
                    LegacyOutcome::Dossiers(dossiers) => dossiers,
                    LegacyOutcome::Unsupported(reason) => {
                        diagnostics.debug(&format!("skipping unsupported page: {reason}"));
                        Vec::new()
                    }
                },
            );
        }

        let (dossier, _) = parse_dossier_page(html, url, &self.config.an_base_url, diagnostics)
            .map_err(DossierError::Html)?;
        Ok(vec![dossier])
    }

    pub async fn resolve(
        &mut self,
        url: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Dossier>, DossierError> {
        let mut visited = HashSet::new();
        self.resolve_at_depth(url.to_string(), 0, &mut visited, diagnostics)
            .await
    }

    fn resolve_at_depth<'r>(
        &'r mut self,
        url: String,
        depth: usize,
        visited: &'r mut HashSet<String>,
        diagnostics: &'r mut Diagnostics,
    ) -> ResolveFuture<'r> {
        Box::pin(async move {
            if !visited.insert(url.clone()) {
                diagnostics.debug(&format!("already resolved {url}"));
                return Ok(Vec::new());
            }

            let mut dossiers = match self.open_data_legislature(&url) {
                Some(legislature) => {
                    let base_url = self.config.an_base_url.clone();
                    let export = self.export_for(legislature).await?;
                    parse_open_data(export, &url, &base_url, diagnostics)?
                        .into_iter()
                        .collect()
                }
                None => Vec::new(),
            };

            if dossiers.is_empty() {
                let response = self
                    .fetcher
                    .fetch(&url, true)
                    .await
                    .map_err(DossierError::Fetch)?;
                if !response.is_success() {
                    return Err(DossierError::Fetch(format!("{url}: {}", response.status)));
                }
                dossiers = self.parse_html(&response.text(), &url, diagnostics)?;
            }

            let Some(mut current) = dossiers.first().cloned() else {
                return Ok(dossiers);
            };

            if current.previous_works.is_some() || current.next_works.is_some() {
                if depth + 1 >= self.config.max_depth {
                    diagnostics.warn(
                        "continuation ignored, depth limit reached",
                        Some(json!({ "url": url, "depth": depth })),
                    );
                } else {
                    if let Some(previous) = current.previous_works.clone() {
                        match self
                            .resolve_at_depth(previous.clone(), depth + 1, visited, diagnostics)
                            .await
                        {
                            Ok(earlier) => {
                                if let Some(earlier) = earlier.into_iter().next() {
                                    current = stitch(current, earlier, diagnostics);
                                }
                            }
                            Err(err) => diagnostics.warn(
                                "previous legislature unavailable",
                                Some(json!({ "url": previous, "error": err.to_string() })),
                            ),
                        }
                    }
                    if let Some(next) = current.next_works.clone() {
                        match self
                            .resolve_at_depth(next.clone(), depth + 1, visited, diagnostics)
                            .await
                        {
                            Ok(later) => {
                                if let Some(later) = later.into_iter().next() {
                                    current = stitch(later, current, diagnostics);
                                }
                            }
                            Err(err) => diagnostics.warn(
                                "next legislature unavailable",
                                Some(json!({ "url": next, "error": err.to_string() })),
                            ),
                        }
                    }
                }
            }

            dossiers[0] = current;
            Ok(dossiers)
        })
    }
}
