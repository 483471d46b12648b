use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::GDataError;

/// Element writer bound to one sink.
///
/// Attribute values and text are escaped by `quick-xml`.
pub struct XmlWriter<'w> {
    inner: Writer<&'w mut dyn Write>,
}

impl<'w> XmlWriter<'w> {
    pub(crate) fn new(sink: &'w mut dyn Write, indent: Option<(u8, usize)>) -> Self {
        let inner = match indent {
            Some((ch, size)) => Writer::new_with_indent(sink, ch, size),
            None => Writer::new(sink),
        };
        Self { inner }
    }

    /// `<?xml version="1.0" encoding="UTF-8"?>`
    pub fn declaration(&mut self) -> Result<(), GDataError> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), GDataError> {
        let mut tag = BytesStart::new(name);
        for attr in attributes {
            tag.push_attribute(*attr);
        }
        self.write(Event::Start(tag))
    }

    pub fn end(&mut self, name: &str) -> Result<(), GDataError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Self-closing element.
    pub fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), GDataError> {
        let mut tag = BytesStart::new(name);
        for attr in attributes {
            tag.push_attribute(*attr);
        }
        self.write(Event::Empty(tag))
    }

    /// `<name>text</name>`
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), GDataError> {
        self.start(name, &[])?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// `<name>text</name>`, skipped when the value is absent or empty.
    pub fn optional_text_element(
        &mut self,
        name: &str,
        text: Option<&str>,
    ) -> Result<(), GDataError> {
        match text {
            Some(t) if !t.is_empty() => self.text_element(name, t),
            _ => Ok(()),
        }
    }

    /// Escaped character data inside the current element.
    pub fn text(&mut self, text: &str) -> Result<(), GDataError> {
        self.write(Event::Text(BytesText::new(text)))
    }

    /// Markup written as is. The caller guarantees it is well-formed.
    pub fn raw(&mut self, markup: &str) -> Result<(), GDataError> {
        self.write(Event::Text(BytesText::from_escaped(markup)))
    }

    /// `<name value="..."/>`, the GData convention for scalar extensions.
    pub fn value_element(&mut self, name: &str, value: &str) -> Result<(), GDataError> {
        self.empty(name, &[("value", value)])
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), GDataError> {
        self.inner.write_event(event).map_err(GDataError::write_failed)
    }
}
