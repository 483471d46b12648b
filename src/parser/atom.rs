//! Atom feed and entry parsing shared by every calendar feed kind.
//!
//! [`AtomFeedParser`] walks the `<feed>` envelope and the standard Atom
//! children of each `<entry>`. Anything calendar-specific is delegated to a
//! [`FeedExtensions`] implementation, which sees every child element first
//! and reports whether it consumed it.

use std::io::BufRead;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::data::{
    parse_timestamp, BatchInfo, BatchOperation, BatchStatus, Entity, EntryBase, Feed, TextType,
};
use crate::error::GDataError;
use crate::xml::{Ns, PullParser, StartTag, XmlEvent};

use super::{GDataParser, ParserKind};

const REL_FEED: &str = "http://schemas.google.com/g/2005#feed";
const REL_POST: &str = "http://schemas.google.com/g/2005#post";
const REL_BATCH: &str = "http://schemas.google.com/g/2005#batch";

/// Feed-kind specific element handling plugged into [`AtomFeedParser`].
pub trait FeedExtensions {
    type Entry: Default;

    const KIND: ParserKind;

    fn base(entry: &mut Self::Entry) -> &mut EntryBase;

    fn into_entity(entry: Self::Entry) -> Entity;

    /// Handles a child of `<entry>`. Returns `false` to let the Atom core
    /// deal with it; when returning `true` the element must be consumed.
    fn entry_element<R: BufRead>(
        pull: &mut PullParser<R>,
        tag: &StartTag,
        entry: &mut Self::Entry,
    ) -> Result<bool, GDataError>;

    /// Same as [`entry_element`](Self::entry_element) for children of `<feed>`.
    fn feed_element<R: BufRead>(
        _pull: &mut PullParser<R>,
        _tag: &StartTag,
        _feed: &mut Feed,
    ) -> Result<bool, GDataError> {
        Ok(false)
    }
}

enum State {
    NotStarted,
    /// Inside `<feed>`, between children.
    InFeed,
    /// The envelope scan stopped at this `<entry>`.
    PendingEntry(StartTag),
    Finished,
}

/// Pull-based parser over an Atom feed of one entry kind.
pub struct AtomFeedParser<R, X> {
    pull: PullParser<R>,
    state: State,
    feed: Option<Feed>,
    _extensions: PhantomData<X>,
}

impl<R: BufRead, X: FeedExtensions> AtomFeedParser<R, X> {
    pub fn new(pull: PullParser<R>) -> Self {
        Self {
            pull,
            state: State::NotStarted,
            feed: None,
            _extensions: PhantomData,
        }
    }

    fn read_root(&mut self) -> Result<StartTag, GDataError> {
        loop {
            match self.pull.next_event()? {
                XmlEvent::Start(tag) => return Ok(tag),
                XmlEvent::Text(_) => {}
                XmlEvent::End { name, .. } => {
                    return Err(GDataError::malformed(format!(
                        "unexpected </{}> before the root element",
                        name
                    )))
                }
                XmlEvent::Eof => return Err(GDataError::malformed("document has no root element")),
            }
        }
    }

    fn read_envelope(&mut self) -> Result<Feed, GDataError> {
        let root = self.read_root()?;
        if !is_atom(&root, "feed") {
            return Err(GDataError::malformed(format!(
                "expected <feed> root element, found <{}>",
                root.name
            )));
        }

        let mut feed = Feed {
            etag: root.attr_ns(Ns::GData, "etag").map(str::to_string),
            ..Feed::default()
        };
        if root.empty {
            return Ok(feed);
        }

        loop {
            match self.pull.next_event()? {
                XmlEvent::Start(tag) if is_atom(&tag, "entry") => {
                    self.state = State::PendingEntry(tag);
                    break;
                }
                XmlEvent::Start(tag) => self.feed_child(&tag, &mut feed)?,
                XmlEvent::End { .. } => break,
                XmlEvent::Text(_) => {}
                XmlEvent::Eof => {
                    return Err(GDataError::malformed("unexpected end of document inside <feed>"))
                }
            }
        }

        tracing::debug!(
            kind = %X::KIND,
            title = ?feed.title,
            total_results = ?feed.total_results,
            "Parsed feed envelope"
        );
        Ok(feed)
    }

    fn feed_child(&mut self, tag: &StartTag, feed: &mut Feed) -> Result<(), GDataError> {
        let pull = &mut self.pull;
        match tag.ns {
            Ns::Atom | Ns::None => match tag.name.as_str() {
                "id" => feed.id = Some(pull.read_trimmed_text(tag)?),
                "title" => feed.title = Some(pull.read_text(tag)?),
                "updated" => feed.updated = Some(parse_timestamp(&pull.read_text(tag)?)?),
                "link" => {
                    let href = tag.attr("href").map(str::to_string);
                    match tag.attr("rel") {
                        Some(REL_FEED) => feed.feed_url = href,
                        Some(REL_POST) => feed.post_url = href,
                        Some(REL_BATCH) => feed.batch_url = href,
                        Some("next") => feed.next_url = href,
                        _ => {}
                    }
                    pull.skip(tag)?;
                }
                _ => pull.skip(tag)?,
            },
            Ns::OpenSearch => match tag.name.as_str() {
                "totalResults" => feed.total_results = Some(parse_number(&pull.read_text(tag)?)?),
                "startIndex" => feed.start_index = Some(parse_number(&pull.read_text(tag)?)?),
                "itemsPerPage" => feed.items_per_page = Some(parse_number(&pull.read_text(tag)?)?),
                _ => pull.skip(tag)?,
            },
            _ => {
                if !X::feed_element(pull, tag, feed)? {
                    pull.skip(tag)?;
                }
            }
        }
        Ok(())
    }

    fn parse_entry(&mut self, start: &StartTag) -> Result<Entity, GDataError> {
        let mut entry = X::Entry::default();
        X::base(&mut entry).etag = start.attr_ns(Ns::GData, "etag").map(str::to_string);

        for_each_child(&mut self.pull, start, |pull, child| {
            if X::entry_element(pull, &child, &mut entry)? {
                return Ok(());
            }
            entry_child(pull, &child, X::base(&mut entry))
        })?;

        tracing::trace!(kind = %X::KIND, id = ?X::base(&mut entry).id, "Parsed entry");
        Ok(X::into_entity(entry))
    }

    fn next_entry(&mut self) -> Result<Option<Entity>, GDataError> {
        loop {
            // Any error below leaves the parser finished
            match std::mem::replace(&mut self.state, State::Finished) {
                State::PendingEntry(tag) => {
                    let entity = self.parse_entry(&tag)?;
                    self.state = State::InFeed;
                    return Ok(Some(entity));
                }
                State::InFeed => match self.pull.next_event()? {
                    XmlEvent::Start(tag) if is_atom(&tag, "entry") => {
                        self.state = State::PendingEntry(tag);
                    }
                    XmlEvent::Start(tag) => {
                        self.pull.skip(&tag)?;
                        self.state = State::InFeed;
                    }
                    XmlEvent::Text(_) => self.state = State::InFeed,
                    XmlEvent::End { .. } => return Ok(None),
                    XmlEvent::Eof => {
                        return Err(GDataError::malformed(
                            "unexpected end of document inside <feed>",
                        ))
                    }
                },
                State::NotStarted | State::Finished => return Ok(None),
            }
        }
    }
}

impl<R: BufRead, X: FeedExtensions> GDataParser for AtomFeedParser<R, X> {
    fn kind(&self) -> ParserKind {
        X::KIND
    }

    fn parse_feed_envelope(&mut self) -> Result<Feed, GDataError> {
        if let Some(feed) = &self.feed {
            return Ok(feed.clone());
        }
        if !matches!(self.state, State::NotStarted) {
            return Err(GDataError::malformed(
                "feed envelope is not available: the stream was already consumed",
            ));
        }

        // read_envelope leaves a pending entry behind, or the feed is done
        self.state = State::Finished;
        let feed = self.read_envelope()?;
        self.feed = Some(feed.clone());
        Ok(feed)
    }

    fn read_next_entry(&mut self) -> Result<Option<Entity>, GDataError> {
        if matches!(self.state, State::NotStarted) {
            self.parse_feed_envelope()?;
        }
        self.next_entry()
    }

    fn parse_standalone_entry(&mut self) -> Result<Entity, GDataError> {
        if !matches!(self.state, State::NotStarted) {
            return Err(GDataError::malformed(
                "cannot parse a standalone entry: the stream was already consumed",
            ));
        }
        self.state = State::Finished;

        let root = self.read_root()?;
        if !is_atom(&root, "entry") {
            return Err(GDataError::malformed(format!(
                "expected <entry> root element, found <{}>",
                root.name
            )));
        }
        self.parse_entry(&root)
    }
}

// ============================================================================
// Entry children
// ============================================================================

fn entry_child<R: BufRead>(
    pull: &mut PullParser<R>,
    tag: &StartTag,
    base: &mut EntryBase,
) -> Result<(), GDataError> {
    match tag.ns {
        Ns::Atom | Ns::None => match tag.name.as_str() {
            "id" => base.id = Some(pull.read_trimmed_text(tag)?),
            "title" => {
                let (text, kind) = read_text_construct(pull, tag)?;
                base.title = Some(text);
                base.title_type = kind;
            }
            "summary" => {
                let (text, kind) = read_text_construct(pull, tag)?;
                base.summary = Some(text);
                base.summary_type = kind;
            }
            "content" => {
                let (text, kind) = read_text_construct(pull, tag)?;
                base.content = Some(text);
                base.content_type = kind;
            }
            "published" => base.published = Some(parse_timestamp(&pull.read_text(tag)?)?),
            "updated" => base.updated = Some(parse_timestamp(&pull.read_text(tag)?)?),
            "category" => {
                base.category = tag.attr("term").map(str::to_string);
                base.category_scheme = tag.attr("scheme").map(str::to_string);
                pull.skip(tag)?;
            }
            "link" => {
                let href = tag.attr("href").map(str::to_string);
                match (tag.attr("rel"), tag.attr("type")) {
                    (Some("edit"), _) => base.edit_uri = href,
                    (Some("alternate"), Some("text/html")) => base.html_uri = href,
                    _ => {}
                }
                pull.skip(tag)?;
            }
            "author" => for_each_child(pull, tag, |pull, child| {
                match child.name.as_str() {
                    "name" => base.author = Some(pull.read_trimmed_text(&child)?),
                    "email" => base.email = Some(pull.read_trimmed_text(&child)?),
                    _ => pull.skip(&child)?,
                }
                Ok(())
            })?,
            _ => pull.skip(tag)?,
        },
        Ns::GData if tag.name == "deleted" => {
            base.deleted = true;
            pull.skip(tag)?;
        }
        Ns::Batch => batch_child(pull, tag, base.batch.get_or_insert_with(BatchInfo::default))?,
        _ => pull.skip(tag)?,
    }
    Ok(())
}

/// Reads an Atom text construct and its `type`. Text is kept verbatim; an
/// `xhtml` value is the markup inside the wrapping xhtml `<div>`.
fn read_text_construct<R: BufRead>(
    pull: &mut PullParser<R>,
    tag: &StartTag,
) -> Result<(String, Option<TextType>), GDataError> {
    let kind = wire_value(tag, "type", TextType::from_wire);
    if kind != Some(TextType::Xhtml) {
        return Ok((pull.read_text(tag)?, kind));
    }

    let mut markup = String::new();
    for_each_child(pull, tag, |pull, child| {
        if child.is(Ns::Xhtml, "div") {
            markup = pull.read_markup(&child)?;
        } else {
            pull.skip(&child)?;
        }
        Ok(())
    })?;
    Ok((markup, kind))
}

fn batch_child<R: BufRead>(
    pull: &mut PullParser<R>,
    tag: &StartTag,
    batch: &mut BatchInfo,
) -> Result<(), GDataError> {
    match tag.name.as_str() {
        "id" => batch.id = Some(pull.read_trimmed_text(tag)?),
        "operation" => {
            batch.operation = wire_value(tag, "type", BatchOperation::from_wire);
            pull.skip(tag)?;
        }
        "status" => {
            let code = tag
                .attr("code")
                .ok_or_else(|| GDataError::malformed("batch:status is missing code"))?;
            batch.status = Some(BatchStatus {
                code: parse_number(code)?,
                reason: tag.attr("reason").map(str::to_string),
            });
            pull.skip(tag)?;
        }
        _ => pull.skip(tag)?,
    }
    Ok(())
}

// ============================================================================
// Helpers shared with the feed extensions
// ============================================================================

/// Atom elements are accepted with or without the Atom namespace bound.
pub(crate) fn is_atom(tag: &StartTag, name: &str) -> bool {
    matches!(tag.ns, Ns::Atom | Ns::None) && tag.name == name
}

/// Calls `f` for each child element of `parent`. `f` must consume the child.
pub(crate) fn for_each_child<R, F>(
    pull: &mut PullParser<R>,
    parent: &StartTag,
    mut f: F,
) -> Result<(), GDataError>
where
    R: BufRead,
    F: FnMut(&mut PullParser<R>, StartTag) -> Result<(), GDataError>,
{
    if parent.empty {
        return Ok(());
    }
    loop {
        match pull.next_event()? {
            XmlEvent::Start(child) => f(pull, child)?,
            XmlEvent::End { .. } => return Ok(()),
            XmlEvent::Text(_) => {}
            XmlEvent::Eof => {
                return Err(GDataError::malformed(format!(
                    "unexpected end of document inside <{}>",
                    parent.name
                )))
            }
        }
    }
}

pub(crate) fn parse_number<T>(text: &str) -> Result<T, GDataError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.trim()
        .parse()
        .map_err(|e| GDataError::malformed_by(format!("invalid number '{}'", text), e))
}

/// `value="true"` on a GData boolean extension.
pub(crate) fn bool_value(tag: &StartTag) -> bool {
    tag.attr("value") == Some("true")
}

pub(crate) fn string_attr(tag: &StartTag, name: &str) -> Option<String> {
    tag.attr(name).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Looks up an enumerated attribute. Unknown values are dropped.
pub(crate) fn wire_value<T>(
    tag: &StartTag,
    attr: &str,
    lookup: fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = tag.attr(attr)?;
    let value = lookup(raw);
    if value.is_none() {
        tracing::debug!(element = %tag.name, value = %raw, "Ignoring unknown enumerated value");
    }
    value
}
