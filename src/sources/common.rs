use regex::Regex;
use std::sync::LazyLock;
use tl::{Node, NodeHandle, Parser};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
}

/// One semantic run of text (a paragraph, a heading, or a `<br>`-separated
/// line) with the hyperlinks it embeds, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
    /// Lowercased, diacritic-free copy of `text` used for pattern matching.
    pub folded: String,
    pub links: Vec<Link>,
}

impl TextBlock {
    pub fn new(kind: BlockKind, text: &str, links: Vec<Link>) -> Self {
        let text = normalize_text(text);
        let folded = fold(&text);
        Self {
            kind,
            text,
            folded,
            links,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new(BlockKind::Paragraph, text, Vec::new())
    }

    pub fn with_link(mut self, href: &str, text: &str) -> Self {
        self.links.push(Link {
            href: href.to_string(),
            text: normalize_text(text),
        });
        self
    }

    pub fn first_href(&self) -> Option<&str> {
        self.links.first().map(|link| link.href.as_str())
    }

    pub fn has_link(&self) -> bool {
        !self.links.is_empty()
    }
}

pub fn normalize_text(input: &str) -> String {
    let normalized = input.replace('\u{00A0}', " ");
    WHITESPACE_RE
        .replace_all(normalized.trim(), " ")
        .trim()
        .to_string()
}

/// Lowercase and strip diacritics so patterns can be written once.
pub fn fold(input: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    for character in input.nfd().filter(|c| !is_combining_mark(*c)) {
        match character {
            'œ' | 'Œ' => folded.push_str("oe"),
            'æ' | 'Æ' => folded.push_str("ae"),
            '’' | '‘' => folded.push('\''),
            '\u{00A0}' => folded.push(' '),
            other => folded.extend(other.to_lowercase()),
        }
    }
    folded
}

pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end)));
        match decoded {
            Some((character, end)) => {
                output.push(character);
                rest = &candidate[end + 1..];
            }
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        // Legacy pages use windows-1252 code points for dashes and quotes.
        return match code {
            150 => Some('-'),
            151 => Some('—'),
            146 => Some('’'),
            156 => Some('œ'),
            _ => char::from_u32(code),
        };
    }

    let character = match name {
        "nbsp" => '\u{00A0}',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "eacute" => 'é',
        "Eacute" => 'É',
        "egrave" => 'è',
        "Egrave" => 'È',
        "ecirc" => 'ê',
        "Ecirc" => 'Ê',
        "euml" => 'ë',
        "agrave" => 'à',
        "Agrave" => 'À',
        "acirc" => 'â',
        "auml" => 'ä',
        "icirc" => 'î',
        "iuml" => 'ï',
        "ocirc" => 'ô',
        "ouml" => 'ö',
        "ugrave" => 'ù',
        "ucirc" => 'û',
        "uuml" => 'ü',
        "ccedil" => 'ç',
        "Ccedil" => 'Ç',
        "oelig" => 'œ',
        "OElig" => 'Œ',
        "laquo" => '«',
        "raquo" => '»',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "ndash" => '-',
        "mdash" => '—',
        "hellip" => '…',
        "deg" => '°',
        "ordm" => 'º',
        _ => return None,
    };
    Some(character)
}

pub fn parse_dom(html: &str) -> Result<tl::VDom<'_>, String> {
    tl::parse(html, tl::ParserOptions::default()).map_err(|e| format!("Failed to parse HTML: {e}"))
}

pub fn tag_name(tag: &tl::HTMLTag<'_>) -> String {
    tag.name().as_utf8_str().to_ascii_lowercase()
}

pub fn attribute(tag: &tl::HTMLTag<'_>, name: &str) -> Option<String> {
    tag.attributes()
        .get(name)
        .flatten()
        .map(|value| decode_entities(value.as_utf8_str().as_ref()))
}

pub fn node_text(node: &Node<'_>, parser: &Parser<'_>) -> String {
    normalize_text(&decode_entities(node.inner_text(parser).as_ref()))
}

fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "table"
            | "tr"
            | "td"
            | "th"
            | "ul"
            | "ol"
            | "li"
            | "dl"
            | "dt"
            | "dd"
            | "section"
            | "article"
            | "blockquote"
            | "center"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

struct BlockCollector {
    split: bool,
    blocks: Vec<TextBlock>,
    text: String,
    links: Vec<Link>,
    heading: Option<u8>,
}

impl BlockCollector {
    fn new(split: bool) -> Self {
        Self {
            split,
            blocks: Vec::new(),
            text: String::new(),
            links: Vec::new(),
            heading: None,
        }
    }

    fn flush(&mut self) {
        if !self.split {
            self.text.push(' ');
            return;
        }
        let text = std::mem::take(&mut self.text);
        let links = std::mem::take(&mut self.links);
        if text.trim().is_empty() && links.is_empty() {
            return;
        }
        let kind = match self.heading {
            Some(level) => BlockKind::Heading(level),
            None => BlockKind::Paragraph,
        };
        self.blocks.push(TextBlock::new(kind, &text, links));
    }

    fn finish(mut self) -> Vec<TextBlock> {
        if self.split {
            self.flush();
            return self.blocks;
        }
        let text = std::mem::take(&mut self.text);
        let links = std::mem::take(&mut self.links);
        vec![TextBlock::new(BlockKind::Paragraph, &text, links)]
    }

    fn walk(&mut self, handle: NodeHandle, parser: &Parser<'_>) {
        let Some(node) = handle.get(parser) else {
            return;
        };
        match node {
            Node::Raw(raw) => {
                self.text.push_str(&decode_entities(raw.as_utf8_str().as_ref()));
            }
            Node::Tag(tag) => {
                let name = tag_name(tag);
                match name.as_str() {
                    "header" | "script" | "style" | "head" | "noscript" => {}
                    "br" => self.flush(),
                    "a" => {
                        if let Some(href) = attribute(tag, "href") {
                            self.links.push(Link {
                                href: href.trim().to_string(),
                                text: node_text(node, parser),
                            });
                        }
                        self.walk_children(tag, parser);
                    }
                    _ if is_block_tag(&name) => {
                        self.flush();
                        let previous_heading = self.heading;
                        if let Some(level) = heading_level(&name) {
                            self.heading = Some(level);
                        }
                        self.walk_children(tag, parser);
                        self.flush();
                        self.heading = previous_heading;
                    }
                    _ => self.walk_children(tag, parser),
                }
            }
            Node::Comment(_) => {}
        }
    }

    fn walk_children(&mut self, tag: &tl::HTMLTag<'_>, parser: &Parser<'_>) {
        for child in tag.children().top().iter() {
            self.walk(*child, parser);
        }
    }
}

/// Flatten a page into text blocks: every block-level element and every
/// `<br>` starts a new block. Page headers, scripts and styles are dropped.
pub fn extract_blocks(html: &str) -> Result<Vec<TextBlock>, String> {
    let dom = parse_dom(html)?;
    let parser = dom.parser();
    let mut collector = BlockCollector::new(true);
    for handle in dom.children() {
        collector.walk(*handle, parser);
    }
    Ok(collector.finish())
}

/// Text and links of a single raw HTML line, tolerant of unbalanced markup.
pub fn parse_fragment(fragment: &str) -> TextBlock {
    let Ok(dom) = parse_dom(fragment) else {
        return TextBlock::paragraph("");
    };
    let parser = dom.parser();
    let mut collector = BlockCollector::new(false);
    for handle in dom.children() {
        collector.walk(*handle, parser);
    }
    collector
        .finish()
        .pop()
        .unwrap_or_else(|| TextBlock::paragraph(""))
}
