//! Namespace-aware walker over Metalex law documents.
//!
//! A single pass collects everything the pipelines need:
//! - the official heading (`ml:htitle name="predpisNadpis"`)
//! - the number of articles (`ml:hcontainer name="clanok"`)
//! - all `ml:meta` property/content pairs
//!
//! Elements are matched by resolved namespace URI, not by prefix.

use std::fmt::Display;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use slovlex_shared::{LawSummary, Result, SlovLexError, UNKNOWN_TITLE};

/// Namespace URI of the Metalex document schema.
pub const METALEX_NS: &str = "http://www.metalex.eu/metalex/1.0";

const HEADING_ELEMENT: &[u8] = b"htitle";
const HEADING_NAME: &str = "predpisNadpis";
const CONTAINER_ELEMENT: &[u8] = b"hcontainer";
const ARTICLE_NAME: &str = "clanok";
const META_ELEMENT: &[u8] = b"meta";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Structural facts extracted from one law document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLaw {
    /// Whitespace-collapsed heading text, `None` if missing or empty.
    pub title: Option<String>,
    /// Number of article containers.
    pub article_count: usize,
    /// `ml:meta` entries carrying both `property` and `content`.
    pub meta: Vec<MetaProperty>,
}

impl ParsedLaw {
    /// Summary with the `"Unknown"` sentinel for a missing heading.
    pub fn summary(&self) -> LawSummary {
        LawSummary {
            title: self
                .title
                .clone()
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            article_count: self.article_count,
        }
    }
}

/// One `<ml:meta property=".." content=".."/>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaProperty {
    pub property: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Heading collection state.
enum Heading {
    Pending,
    /// Inside the heading element opened at this depth.
    Open {
        depth: usize,
        text: String,
    },
    Done,
}

/// Parse a law document.
///
/// Fails on malformed XML, on input without a root element, on content
/// outside the root element and on unclosed elements.
pub fn parse_document(xml: &[u8]) -> Result<ParsedLaw> {
    let mut reader = NsReader::from_reader(xml);
    let mut buf = Vec::new();

    let mut parsed = ParsedLaw::default();
    let mut heading = Heading::Pending;
    let mut depth: usize = 0;
    let mut root_seen = false;

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| xml_error("malformed XML", e))?;
        let metalex = is_metalex(&ns)?;

        match event {
            Event::Start(e) => {
                open_element(depth, &mut root_seen)?;
                depth += 1;
                if metalex {
                    inspect_element(&e, &mut parsed)?;
                    if matches!(heading, Heading::Pending) && is_heading(&e)? {
                        heading = Heading::Open {
                            depth,
                            text: String::new(),
                        };
                    }
                }
            }
            Event::Empty(e) => {
                open_element(depth, &mut root_seen)?;
                if metalex {
                    inspect_element(&e, &mut parsed)?;
                    if matches!(heading, Heading::Pending) && is_heading(&e)? {
                        heading = Heading::Done;
                    }
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(SlovLexError::parse("closing tag without an open element"));
                }
                if let Heading::Open { depth: open, text } = &heading {
                    if *open == depth {
                        parsed.title = collapse_whitespace(text);
                        heading = Heading::Done;
                    }
                }
                depth -= 1;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| xml_error("bad text content", e))?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(SlovLexError::parse("text outside the root element"));
                    }
                } else if let Heading::Open { text: title, .. } = &mut heading {
                    title.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Heading::Open { text, .. } = &mut heading {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(SlovLexError::parse("document has no root element"));
    }
    if depth != 0 {
        return Err(SlovLexError::parse(format!(
            "document ended with {depth} unclosed element(s)"
        )));
    }

    Ok(parsed)
}

/// Whether a name resolved to the Metalex namespace. Unbound prefixes are malformed.
fn is_metalex(ns: &ResolveResult<'_>) -> Result<bool> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Ok(*uri == METALEX_NS.as_bytes()),
        ResolveResult::Unknown(prefix) => {
            let prefix = String::from_utf8_lossy(prefix);
            Err(SlovLexError::parse(format!("unbound namespace prefix '{prefix}'")))
        }
        ResolveResult::Unbound => Ok(false),
    }
}

/// Reject a second top-level element.
fn open_element(depth: usize, root_seen: &mut bool) -> Result<()> {
    if depth == 0 {
        if *root_seen {
            return Err(SlovLexError::parse("more than one root element"));
        }
        *root_seen = true;
    }
    Ok(())
}

fn inspect_element(e: &BytesStart<'_>, parsed: &mut ParsedLaw) -> Result<()> {
    let local = e.local_name();

    if local.as_ref() == CONTAINER_ELEMENT {
        if attribute(e, "name")?.as_deref() == Some(ARTICLE_NAME) {
            parsed.article_count += 1;
        }
    } else if local.as_ref() == META_ELEMENT {
        let property = attribute(e, "property")?;
        let content = attribute(e, "content")?;
        if let (Some(property), Some(content)) = (property, content) {
            parsed.meta.push(MetaProperty { property, content });
        }
    }

    Ok(())
}

fn is_heading(e: &BytesStart<'_>) -> Result<bool> {
    Ok(e.local_name().as_ref() == HEADING_ELEMENT
        && attribute(e, "name")?.as_deref() == Some(HEADING_NAME))
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    match e.try_get_attribute(key) {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|err| xml_error("bad attribute value", err)),
        Ok(None) => Ok(None),
        Err(err) => Err(xml_error("bad attribute", err)),
    }
}

fn collapse_whitespace(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn xml_error(context: &str, err: impl Display) -> SlovLexError {
    SlovLexError::parse(format!("{context}: {err}"))
}
