#![allow(dead_code)]
use async_trait::async_trait;
use dosleg::runtime::fetcher::{FetchResponse, Fetcher};
use dosleg::types::{Dossier, Institution, Step, StepKind, StepStatus};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub fn fixtures_dir() -> String {
    format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"))
}

pub fn load_fixture(filename: &str) -> String {
    let path = Path::new(&fixtures_dir()).join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

pub struct MockFetcher {
    pub fixtures: HashMap<String, (u16, Vec<u8>)>,
    /// Every fetched url with its `use_cache` flag, in call order.
    pub requests: Arc<Mutex<Vec<(String, bool)>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            fixtures: HashMap::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_fixture(&mut self, url: &str, content: &str) {
        self.add_bytes(url, content.as_bytes().to_vec());
    }

    pub fn add_bytes(&mut self, url: &str, content: Vec<u8>) {
        self.fixtures.insert(url.to_string(), (200, content));
    }

    pub fn add_status(&mut self, url: &str, status: u16) {
        self.fixtures.insert(url.to_string(), (status, Vec::new()));
    }

    pub fn requests(&self) -> Vec<(String, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, use_cache: bool) -> Result<FetchResponse, String> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), use_cache));
        let (status, body) = self
            .fixtures
            .get(url)
            .cloned()
            .ok_or_else(|| format!("MockFetcher: No fixture for URL: {}", url))?;
        Ok(FetchResponse {
            status,
            body,
            final_url: url.to_string(),
        })
    }
}

pub fn expect_step(dossier: &Dossier, index: usize) -> StepMatcher {
    let step = dossier.steps.get(index).cloned().unwrap_or_else(|| {
        panic!(
            "No step at index {}. Steps: {:?}",
            index,
            describe_steps(dossier)
        )
    });
    StepMatcher { index, step }
}

pub fn describe_steps(dossier: &Dossier) -> Vec<String> {
    dossier
        .steps
        .iter()
        .map(|step| {
            format!(
                "{} / {} / {:?} / {}",
                step.institution.as_str(),
                step.stage,
                step.step,
                step.source_url.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

pub struct StepMatcher {
    pub index: usize,
    pub step: Step,
}

impl StepMatcher {
    pub fn institution(self, institution: Institution) -> Self {
        assert_eq!(
            self.step.institution, institution,
            "Institution mismatch for step {}",
            self.index
        );
        self
    }

    pub fn stage(self, stage: &str) -> Self {
        assert_eq!(self.step.stage, stage, "Stage mismatch for step {}", self.index);
        self
    }

    pub fn kind(self, kind: Option<StepKind>) -> Self {
        assert_eq!(self.step.step, kind, "Step kind mismatch for step {}", self.index);
        self
    }

    pub fn url(self, url: &str) -> Self {
        assert_eq!(
            self.step.source_url.as_deref(),
            Some(url),
            "Url mismatch for step {}",
            self.index
        );
        self
    }

    pub fn date(self, year: i32, month: u32, day: u32) -> Self {
        assert_eq!(
            self.step.date,
            chrono::NaiveDate::from_ymd_opt(year, month, day),
            "Date mismatch for step {}",
            self.index
        );
        self
    }

    pub fn status(self, status: StepStatus) -> Self {
        assert_eq!(
            self.step.status,
            Some(status),
            "Status mismatch for step {}",
            self.index
        );
        self
    }

    pub fn predicted(self) -> Self {
        assert!(self.step.predicted, "Step {} is not predicted", self.index);
        self
    }
}
