use crate::config::AN_BASE_URL;
use crate::error::DossierError;
use regex::Regex;
use std::sync::LazyLock;

static DOCUMENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.{4})([ANS]*)(R[0-9])([LS]*)([0-9]*)([BTACP]*)(.*)").unwrap()
});
static LEGISLATURE_IN_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.fr/(?:dyn/)?(\d{1,2})/").unwrap());
static DOUBLE_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^:])//+").unwrap());

/// Where the publisher stores each document type: directory, file prefix,
/// file suffix.
const DOCUMENT_LOCATIONS: [(&str, &str, &str, &str); 19] = [
    ("PRJL", "projets", "pl", ""),
    ("PION", "propositions", "pion", ""),
    ("PNRECOMENQ", "propositions", "pion", ""),
    ("PNREAPPART341", "propositions", "pion", ""),
    ("PNREMODREGLTAN", "propositions", "pion", ""),
    ("AVCE", "projets", "pl", "-ace"),
    ("ETDI", "projets", "pl", "-ei"),
    ("ACIN", "projets", "pl", "-ai"),
    ("LETT", "projets", "pl", "-l"),
    ("PNRETVXINSTITEUROP", "europe/resolutions", "ppe", ""),
    ("PNRE", "europe/resolutions", "ppe", ""),
    ("RION", "", "", ""),
    ("TCOM", "ta-commission", "r", "-a0"),
    ("TCOMMODREGLTAN", "ta-commission", "r", "-a0"),
    ("TCOMTVXINSTITEUROP", "ta-commission", "r", "-a0"),
    ("TCOMCOMENQ", "ta-commission", "r", "-a0"),
    ("TADO", "ta", "ta", ""),
    ("RAPP", "rapports", "r", ""),
    ("RINF", "rapports", "r", ""),
];

fn document_location(code: &str) -> Option<(&'static str, &'static str, &'static str)> {
    DOCUMENT_LOCATIONS
        .iter()
        .find(|(key, ..)| *key == code)
        .map(|(_, directory, prefix, suffix)| (*directory, *prefix, *suffix))
}

/// Canonical page on `host` of an open-data document identifier such as
/// `PRJLANR5L15B1234`.
///
/// A `BTC`/`BTA` sub-type forces committee/adopted text. Otherwise the
/// caller's document-type code wins, falling back to the identifier's own
/// four-letter prefix when the caller has none. Types without a publisher
/// directory (`RION`) still compose, with an empty path segment.
pub fn an_text_url(
    host: &str,
    identifier: &str,
    code: Option<&str>,
) -> Result<String, DossierError> {
    let captures = DOCUMENT_ID_RE
        .captures(identifier)
        .ok_or_else(|| DossierError::MalformedIdentifier(identifier.to_string()))?;
    let legislature = &captures[5];
    let sub_type = &captures[6];
    let number = &captures[7];

    let document_type = match sub_type {
        "BTC" => "TCOM",
        "BTA" => "TADO",
        _ => code.unwrap_or(&captures[1]),
    };
    let (directory, prefix, suffix) =
        document_location(document_type).ok_or_else(|| DossierError::UnknownDocumentType {
            identifier: identifier.to_string(),
            code: Some(document_type.to_string()),
        })?;

    Ok(format!(
        "{}/{legislature}/{directory}/{prefix}{number}{suffix}.asp",
        host.trim_end_matches('/')
    ))
}

/// Join `href` against `base`, returning `href` untouched when either side is
/// not a usable url.
pub fn resolve_url(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match reqwest::Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

pub fn legislature_from_url(url: &str) -> Option<u32> {
    LEGISLATURE_IN_URL_RE
        .captures(url)
        .and_then(|captures| captures[1].parse().ok())
}

/// Repair the url shapes found across the publisher's archives.
pub fn clean_url(url: &str) -> String {
    if url.contains("legifrance.gouv.fr") {
        return clean_legifrance_url(url);
    }

    let mut url = url.trim().to_string();

    // Glued urls like `pjl09-518.htmlhttp://www.assemblee-nationale.fr/13/ta/ta0518.asp`.
    if let Some(position) = url.find("http://").filter(|position| *position > 0) {
        url = url[position..].to_string();
    }

    if let Some((_, rest)) = url.split_once("www.conseil-") {
        let repaired = format!("http://www.conseil-{rest}");
        url = DOUBLE_SLASH_RE.replace_all(&repaired, "$1/").to_string();
    }

    if url.contains("senat.fr") {
        url = url
            .replace("/dossierleg/", "/dossier-legislatif/")
            .replace("http://", "https://");
    }

    url.replace("http://webdim/", &format!("{AN_BASE_URL}/"))
        .trim()
        .to_string()
}

fn clean_legifrance_url(url: &str) -> String {
    let rebuilt = match reqwest::Url::parse(url.trim()) {
        Ok(mut parsed) => {
            let cid = parsed
                .query_pairs()
                .find(|(key, _)| key == "cidTexte")
                .map(|(_, value)| value.to_string());
            if let Some(cid) = cid {
                parsed.set_query(Some(&format!("cidTexte={cid}")));
            }
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    };

    rebuilt
        .replace("http://legifrance.gouv.fr", "https://www.legifrance.gouv.fr")
        .replace("/jo_pdf.do?id=", "/affichTexte.do?cidTexte=")
        .replace("/./affichTexte.do", "/affichTexte.do")
}
