use thiserror::Error;

#[derive(Debug, Error)]
pub enum DossierError {
    #[error("unknown document type {code:?} for identifier {identifier}")]
    UnknownDocumentType {
        identifier: String,
        code: Option<String>,
    },

    #[error("malformed document identifier: {0}")]
    MalformedIdentifier(String),

    #[error("open data export: {0}")]
    Export(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("html error: {0}")]
    Html(String),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
