use std::io::BufRead;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::Config as ReaderConfig;
use quick_xml::NsReader;

use super::Ns;
use crate::error::GDataError;

/// An attribute with its namespace resolved and its value unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub ns: Ns,
    pub name: String,
    pub value: String,
}

/// A start (or self-closing) element.
///
/// Self-closing elements have `empty == true` and produce no matching
/// [`XmlEvent::End`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub ns: Ns,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub empty: bool,
}

impl StartTag {
    pub fn is(&self, ns: Ns, name: &str) -> bool {
        self.ns == ns && self.name == name
    }

    /// Value of an unprefixed attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attr_ns(Ns::None, name)
    }

    pub fn attr_ns(&self, ns: Ns, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.ns == ns && a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Start(StartTag),
    End { ns: Ns, name: String },
    Text(String),
    Eof,
}

/// Forward-only pull parser over one byte stream.
///
/// Declarations, comments, processing instructions and doctypes are
/// dropped; everything else is surfaced as an owned [`XmlEvent`].
pub struct PullParser<R> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    depth: usize,
    max_depth: usize,
}

impl<R: BufRead> PullParser<R> {
    pub(crate) fn new(stream: R, config: ReaderConfig, max_depth: usize) -> Self {
        let mut reader = NsReader::from_reader(stream);
        *reader.config_mut() = config;
        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Current element nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn next_event(&mut self) -> Result<XmlEvent, GDataError> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let (ns, event) = match self.reader.read_resolved_event_into(&mut self.buf) {
                Ok((resolved, event)) => (resolved_ns(&resolved), event),
                Err(e) => {
                    return Err(GDataError::malformed_by(
                        format!("malformed XML near byte {}", position),
                        e,
                    ))
                }
            };

            match event {
                Event::Start(e) => {
                    self.depth += 1;
                    // SEC-003: Reject excessively nested documents
                    if self.depth > self.max_depth {
                        return Err(GDataError::malformed(format!(
                            "element nesting exceeds maximum depth of {}",
                            self.max_depth
                        )));
                    }
                    return start_tag(&self.reader, ns, &e, false).map(XmlEvent::Start);
                }
                Event::Empty(e) => {
                    return start_tag(&self.reader, ns, &e, true).map(XmlEvent::Start);
                }
                Event::End(e) => {
                    self.depth = self.depth.saturating_sub(1);
                    let name = utf8(e.local_name().as_ref())?;
                    return Ok(XmlEvent::End { ns, name });
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| GDataError::malformed_by("invalid text content", err))?;
                    if !text.is_empty() {
                        return Ok(XmlEvent::Text(text.into_owned()));
                    }
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    return Ok(XmlEvent::Text(utf8(&raw)?));
                }
                Event::Eof => return Ok(XmlEvent::Eof),
                _ => {}
            }
        }
    }

    /// Read the text content of `start` and consume through its end tag.
    ///
    /// Nested markup is skipped; only direct text is collected.
    pub fn read_text(&mut self, start: &StartTag) -> Result<String, GDataError> {
        if start.empty {
            return Ok(String::new());
        }

        let mut text = String::new();
        loop {
            match self.next_event()? {
                XmlEvent::Text(t) => text.push_str(&t),
                XmlEvent::Start(nested) => self.skip(&nested)?,
                XmlEvent::End { .. } => return Ok(text),
                XmlEvent::Eof => {
                    return Err(GDataError::malformed(format!(
                        "unexpected end of document inside <{}>",
                        start.name
                    )))
                }
            }
        }
    }

    /// [`read_text`](Self::read_text) without surrounding whitespace, for
    /// identifiers and other token values.
    pub fn read_trimmed_text(&mut self, start: &StartTag) -> Result<String, GDataError> {
        let text = self.read_text(start)?;
        Ok(text.trim().to_string())
    }

    /// Read the children of `start` back as escaped markup and consume
    /// through its end tag.
    ///
    /// Elements keep their local names and unprefixed attributes only.
    pub fn read_markup(&mut self, start: &StartTag) -> Result<String, GDataError> {
        let mut markup = String::new();
        if start.empty {
            return Ok(markup);
        }

        let mut level: usize = 0;
        loop {
            match self.next_event()? {
                XmlEvent::Text(t) => markup.push_str(&escape(t.as_str())),
                XmlEvent::Start(tag) => {
                    markup.push('<');
                    markup.push_str(&tag.name);
                    for attr in tag.attributes.iter().filter(|a| a.ns == Ns::None) {
                        markup.push(' ');
                        markup.push_str(&attr.name);
                        markup.push_str("=\"");
                        markup.push_str(&escape(attr.value.as_str()));
                        markup.push('"');
                    }
                    if tag.empty {
                        markup.push_str("/>");
                    } else {
                        markup.push('>');
                        level += 1;
                    }
                }
                XmlEvent::End { name, .. } => {
                    if level == 0 {
                        return Ok(markup);
                    }
                    level -= 1;
                    markup.push_str("</");
                    markup.push_str(&name);
                    markup.push('>');
                }
                XmlEvent::Eof => {
                    return Err(GDataError::malformed(format!(
                        "unexpected end of document inside <{}>",
                        start.name
                    )))
                }
            }
        }
    }

    /// Skip over `start` and all its children.
    pub fn skip(&mut self, start: &StartTag) -> Result<(), GDataError> {
        if start.empty {
            return Ok(());
        }

        let mut level: usize = 1;
        loop {
            match self.next_event()? {
                XmlEvent::Start(nested) if !nested.empty => level += 1,
                XmlEvent::End { .. } => {
                    level -= 1;
                    if level == 0 {
                        return Ok(());
                    }
                }
                XmlEvent::Eof => {
                    return Err(GDataError::malformed(format!(
                        "unexpected end of document while skipping <{}>",
                        start.name
                    )))
                }
                _ => {}
            }
        }
    }
}

fn resolved_ns(resolved: &ResolveResult<'_>) -> Ns {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ns::from_uri(uri),
        ResolveResult::Unbound => Ns::None,
        ResolveResult::Unknown(_) => Ns::Other,
    }
}

fn utf8(bytes: &[u8]) -> Result<String, GDataError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| GDataError::malformed_by("document is not valid UTF-8", e))
}

fn start_tag<R>(
    reader: &NsReader<R>,
    ns: Ns,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<StartTag, GDataError> {
    let name = utf8(e.local_name().as_ref())?;
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| GDataError::malformed_by("malformed attribute", err))?;
        // Namespace declarations are consumed by the reader itself
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| GDataError::malformed_by("invalid attribute value", err))?;
        attributes.push(XmlAttribute {
            ns: resolved_ns(&resolved),
            name: utf8(local.as_ref())?,
            value: value.into_owned(),
        });
    }

    Ok(StartTag {
        ns,
        name,
        attributes,
        empty,
    })
}
