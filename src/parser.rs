//! Feed document decoding.
//!
//! A document is classified once by its root element: `<rss>` is decoded as
//! RSS 2.0, anything else as Atom. Each schema has its own decoder producing a
//! [`RawFeed`] variant, and [`RawFeed::into_entries`] normalizes either one into
//! the shared [`Entry`] model.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::{NsReader, Reader};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::Entry;

/// Hard failures that abort decoding of a single document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML reader rejected the document
    #[error("XML error: {0}")]
    Xml(String),
    /// The document contains no element at all
    #[error("document has no root element")]
    NoRootElement,
    /// The document ended while an element was still open
    #[error("document ended before </{0}>")]
    Truncated(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Atom,
    Rss,
}

/// A decoded feed document, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFeed {
    Atom(AtomFeed),
    Rss(RssFeed),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomFeed {
    pub title: String,
    /// `href` of the feed-level `<link>`
    pub link: String,
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntry {
    pub title: String,
    pub link: String,
    /// Raw RFC 3339 text of `<updated>`
    pub updated: String,
    /// Raw RFC 3339 text of `<published>`, used when `<updated>` is absent
    pub published: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssFeed {
    /// `<channel><title>`
    pub title: String,
    /// `<channel><link>` text content
    pub link: String,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    /// Raw `<pubDate>` text
    pub pub_date: String,
}

/// Decodes a feed document and normalizes its items.
pub fn parse(xml: &[u8]) -> Result<Vec<Entry>, ParseError> {
    Ok(decode(xml)?.into_entries())
}

/// Decodes a feed document into the schema selected by its root element.
pub fn decode(xml: &[u8]) -> Result<RawFeed, ParseError> {
    match detect_format(xml)? {
        FeedFormat::Rss => {
            let mut decoder = RssDecoder::default();
            walk(xml, &mut decoder)?;
            Ok(RawFeed::Rss(decoder.finish()))
        }
        FeedFormat::Atom => {
            let mut decoder = AtomDecoder::default();
            walk(xml, &mut decoder)?;
            Ok(RawFeed::Atom(decoder.finish()))
        }
    }
}

/// Peeks the root element. Its local name `rss` selects RSS 2.0; every other
/// root is treated as Atom.
pub fn detect_format(xml: &[u8]) -> Result<FeedFormat, ParseError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(reader.buffer_position(), e))?
        {
            Event::Start(root) | Event::Empty(root) => {
                return Ok(if root.local_name().as_ref() == b"rss" {
                    FeedFormat::Rss
                } else {
                    FeedFormat::Atom
                });
            }
            Event::Eof => return Err(ParseError::NoRootElement),
            _ => {}
        }
        buf.clear();
    }
}

impl RawFeed {
    pub fn format(&self) -> FeedFormat {
        match self {
            RawFeed::Atom(_) => FeedFormat::Atom,
            RawFeed::Rss(_) => FeedFormat::Rss,
        }
    }

    /// Flattens the document into entries sharing the feed-level title and
    /// link. Items whose date does not parse are kept undated.
    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            RawFeed::Atom(AtomFeed {
                title: feed_name,
                link: feed_url,
                entries,
            }) => entries
                .into_iter()
                .map(|item| {
                    let raw_date = if item.updated.is_empty() {
                        &item.published
                    } else {
                        &item.updated
                    };
                    let when = item_time(FeedFormat::Atom, &item.title, raw_date);
                    Entry {
                        feed_name: feed_name.clone(),
                        feed_url: feed_url.clone(),
                        title: item.title,
                        url: item.link,
                        when,
                    }
                })
                .collect(),
            RawFeed::Rss(RssFeed {
                title: feed_name,
                link: feed_url,
                items,
            }) => items
                .into_iter()
                .map(|item| {
                    let when = item_time(FeedFormat::Rss, &item.title, &item.pub_date);
                    Entry {
                        feed_name: feed_name.clone(),
                        feed_url: feed_url.clone(),
                        title: item.title,
                        url: item.link,
                        when,
                    }
                })
                .collect(),
        }
    }
}

fn item_time(format: FeedFormat, title: &str, raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        debug!(title = %title, "Feed item has no date");
        return None;
    }

    let when = match format {
        FeedFormat::Atom => parse_rfc3339(raw),
        FeedFormat::Rss => parse_rss_date(raw),
    };
    if when.is_none() {
        warn!(
            title = %title,
            value = %raw,
            format = ?format,
            "Could not parse item date, keeping it undated"
        );
    }
    when
}

pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|when| when.with_timezone(&Utc))
}

struct RssLayout {
    format: &'static str,
    numeric_zone: bool,
}

/// RFC 822, RFC 822Z, RFC 1123, RFC 1123Z, tried in this order.
const RSS_DATE_LAYOUTS: &[RssLayout] = &[
    RssLayout {
        format: "%d %b %y %H:%M",
        numeric_zone: false,
    },
    RssLayout {
        format: "%d %b %y %H:%M %z",
        numeric_zone: true,
    },
    RssLayout {
        format: "%a, %d %b %Y %H:%M:%S",
        numeric_zone: false,
    },
    RssLayout {
        format: "%a, %d %b %Y %H:%M:%S %z",
        numeric_zone: true,
    },
];

/// Parses an RSS `pubDate`. Falls back to chrono's lenient RFC 2822 parser
/// when none of the fixed layouts match.
pub fn parse_rss_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    RSS_DATE_LAYOUTS
        .iter()
        .find_map(|layout| {
            if layout.numeric_zone {
                DateTime::parse_from_str(value, layout.format).ok()
            } else {
                parse_with_zone_name(value, layout.format)
            }
        })
        .or_else(|| DateTime::parse_from_rfc2822(value).ok())
        .map(|when| when.with_timezone(&Utc))
}

fn parse_with_zone_name(value: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    let (stamp, zone) = value.rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let offset = FixedOffset::east_opt(zone_offset_hours(zone) * 3600)?;
    let naive = NaiveDateTime::parse_from_str(stamp.trim_end(), format).ok()?;
    offset.from_local_datetime(&naive).single()
}

/// Unknown abbreviations resolve to UTC.
fn zone_offset_hours(zone: &str) -> i32 {
    match zone.to_ascii_uppercase().as_str() {
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => 0,
    }
}

fn xml_error(position: impl std::fmt::Display, err: quick_xml::Error) -> ParseError {
    ParseError::Xml(format!("{} at byte {}", err, position))
}

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

/// Callbacks driven by [`walk`]. `path` holds the names of all open
/// elements, root first.
///
/// An element in no namespace, in the root element's namespace, or in one of
/// [`Visitor::NAMESPACES`] appears under its local name. Any other element
/// appears as `{namespace}local` so schema patterns never match it.
trait Visitor {
    const NAMESPACES: &'static [&'static [u8]] = &[];

    fn open(&mut self, path: &[&str], element: &BytesStart<'_>);
    fn text(&mut self, path: &[&str], text: &str);
    fn close(&mut self, path: &[&str]);
}

/// Streams the root element through `visitor`, stopping once it closes.
fn walk<V: Visitor>(xml: &[u8], visitor: &mut V) -> Result<(), ParseError> {
    let mut reader = NsReader::from_reader(xml);
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut root_ns: Option<Vec<u8>> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(reader.buffer_position(), e))?
        {
            Event::Start(element) => {
                let ns = namespace_key(&reader.resolve_element(element.name()).0);
                if path.is_empty() {
                    root_ns = ns.clone();
                }
                path.push(path_name::<V>(ns, &root_ns, element.local_name().as_ref()));
                visitor.open(&names(&path), &element);
            }
            Event::Empty(element) => {
                let ns = namespace_key(&reader.resolve_element(element.name()).0);
                if path.is_empty() {
                    root_ns = ns.clone();
                }
                path.push(path_name::<V>(ns, &root_ns, element.local_name().as_ref()));
                let current = names(&path);
                visitor.open(&current, &element);
                visitor.close(&current);
                path.pop();
                if path.is_empty() {
                    return Ok(());
                }
            }
            Event::End(_) => {
                if path.is_empty() {
                    return Err(ParseError::Xml(format!(
                        "closing tag without an open element at byte {}",
                        reader.buffer_position()
                    )));
                }
                visitor.close(&names(&path));
                path.pop();
                if path.is_empty() {
                    return Ok(());
                }
            }
            Event::Text(text) if !path.is_empty() => {
                let value = text
                    .unescape()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                visitor.text(&names(&path), &value);
            }
            Event::CData(data) if !path.is_empty() => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                visitor.text(&names(&path), &value);
            }
            Event::Eof => {
                return Err(match path.last() {
                    Some(open) => ParseError::Truncated(open.clone()),
                    None => ParseError::NoRootElement,
                });
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Owned namespace of a resolved element. An undeclared prefix stands in
/// for its own namespace.
fn namespace_key(resolved: &ResolveResult<'_>) -> Option<Vec<u8>> {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => Some(ns.to_vec()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => Some(prefix.clone()),
    }
}

fn path_name<V: Visitor>(ns: Option<Vec<u8>>, root_ns: &Option<Vec<u8>>, local: &[u8]) -> String {
    let local = String::from_utf8_lossy(local).into_owned();
    match ns {
        None => local,
        Some(ns) if root_ns.as_ref() == Some(&ns) || V::NAMESPACES.contains(&ns.as_slice()) => {
            local
        }
        Some(ns) => format!("{{{}}}{}", String::from_utf8_lossy(&ns), local),
    }
}

fn names(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

fn tidy(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Tracks the best `<link href>` seen for one Atom feed or entry: the first
/// `rel="alternate"` (or rel-less) link, else the first link of any kind.
#[derive(Default)]
struct LinkChoice {
    href: Option<String>,
    preferred: bool,
}

impl LinkChoice {
    fn offer(&mut self, element: &BytesStart<'_>) {
        let mut href = None;
        let mut rel = None;
        for attr in element.attributes().flatten() {
            let value = attr
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }

        let Some(href) = href else {
            return;
        };
        let preferred = rel.as_deref().map_or(true, |rel| rel == "alternate");
        if self.href.is_none() || (preferred && !self.preferred) {
            self.href = Some(href.trim().to_string());
            self.preferred = preferred;
        }
    }

    fn take(&mut self) -> String {
        self.preferred = false;
        self.href.take().unwrap_or_default()
    }
}

#[derive(Default)]
struct AtomDecoder {
    feed: AtomFeed,
    entry: Option<AtomEntry>,
    feed_link: LinkChoice,
    entry_link: LinkChoice,
}

impl AtomDecoder {
    fn finish(mut self) -> AtomFeed {
        tidy(&mut self.feed.title);
        self.feed
    }
}

impl Visitor for AtomDecoder {
    const NAMESPACES: &'static [&'static [u8]] = &[ATOM_NS];

    fn open(&mut self, path: &[&str], element: &BytesStart<'_>) {
        match path {
            [_, "entry"] => {
                self.entry = Some(AtomEntry::default());
                self.entry_link = LinkChoice::default();
            }
            [_, "link"] => self.feed_link.offer(element),
            [_, "entry", "link"] => self.entry_link.offer(element),
            _ => {}
        }
    }

    fn text(&mut self, path: &[&str], text: &str) {
        match (path, self.entry.as_mut()) {
            ([_, "title"], _) => self.feed.title.push_str(text),
            ([_, "entry", "title"], Some(entry)) => entry.title.push_str(text),
            ([_, "entry", "updated"], Some(entry)) => entry.updated.push_str(text),
            ([_, "entry", "published"], Some(entry)) => entry.published.push_str(text),
            _ => {}
        }
    }

    fn close(&mut self, path: &[&str]) {
        match path {
            [_] => self.feed.link = self.feed_link.take(),
            [_, "entry"] => {
                if let Some(mut entry) = self.entry.take() {
                    entry.link = self.entry_link.take();
                    tidy(&mut entry.title);
                    tidy(&mut entry.updated);
                    tidy(&mut entry.published);
                    self.feed.entries.push(entry);
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct RssDecoder {
    feed: RssFeed,
    item: Option<RssItem>,
}

impl RssDecoder {
    fn finish(mut self) -> RssFeed {
        tidy(&mut self.feed.title);
        tidy(&mut self.feed.link);
        self.feed
    }
}

impl Visitor for RssDecoder {
    fn open(&mut self, path: &[&str], _element: &BytesStart<'_>) {
        if let [_, "channel", "item"] = path {
            self.item = Some(RssItem::default());
        }
    }

    fn text(&mut self, path: &[&str], text: &str) {
        match (path, self.item.as_mut()) {
            ([_, "channel", "title"], _) => self.feed.title.push_str(text),
            ([_, "channel", "link"], _) => self.feed.link.push_str(text),
            ([_, "channel", "item", "title"], Some(item)) => item.title.push_str(text),
            ([_, "channel", "item", "link"], Some(item)) => item.link.push_str(text),
            ([_, "channel", "item", "pubDate"], Some(item)) => item.pub_date.push_str(text),
            _ => {}
        }
    }

    fn close(&mut self, path: &[&str]) {
        if let [_, "channel", "item"] = path {
            if let Some(mut item) = self.item.take() {
                tidy(&mut item.title);
                tidy(&mut item.link);
                tidy(&mut item.pub_date);
                self.feed.items.push(item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
            <title>Example Atom</title>
            <link href="http://example.org/"/>
            <updated>2021-01-03T00:00:00Z</updated>
            <entry>
                <title>A</title>
                <link href="http://a/"/>
                <updated>2021-01-02T00:00:00Z</updated>
            </entry>
        </feed>
    "#;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
            <channel>
                <title>Tech News</title>
                <link>https://technews.example.com</link>
                <atom:link href="https://technews.example.com/rss" rel="self"/>
                <item>
                    <title>First</title>
                    <link>https://technews.example.com/1</link>
                    <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
                </item>
                <item>
                    <title>Second</title>
                    <link>https://technews.example.com/2</link>
                    <pubDate>Mon, 09 Dec 2024 10:00:00 GMT</pubDate>
                </item>
            </channel>
        </rss>
    "#;

    mod dispatch_tests {
        use super::*;

        #[test]
        fn test_rss_root_selects_rss() {
            assert_eq!(detect_format(RSS_SAMPLE.as_bytes()).unwrap(), FeedFormat::Rss);
        }

        #[test]
        fn test_feed_root_selects_atom() {
            assert_eq!(detect_format(ATOM_SAMPLE.as_bytes()).unwrap(), FeedFormat::Atom);
        }

        #[test]
        fn test_unknown_root_falls_back_to_atom() {
            let raw = decode(b"<rdf><title>Other</title></rdf>").unwrap();
            assert_eq!(raw.format(), FeedFormat::Atom);
            assert!(raw.into_entries().is_empty());
        }

        #[test]
        fn test_prefixed_rss_root_is_rss() {
            let xml = b"<x:rss xmlns:x=\"urn:x\"><channel/></x:rss>";
            assert_eq!(detect_format(xml).unwrap(), FeedFormat::Rss);
        }

        #[test]
        fn test_empty_document_has_no_root() {
            assert!(matches!(detect_format(b""), Err(ParseError::NoRootElement)));
            assert!(matches!(parse(b"not xml at all"), Err(ParseError::NoRootElement)));
        }
    }

    mod atom_tests {
        use super::*;

        #[test]
        fn test_atom_entry_normalizes() {
            let entries = parse(ATOM_SAMPLE.as_bytes()).unwrap();

            assert_eq!(
                entries,
                vec![Entry {
                    feed_name: "Example Atom".to_string(),
                    feed_url: "http://example.org/".to_string(),
                    title: "A".to_string(),
                    url: "http://a/".to_string(),
                    when: Some(Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap()),
                }]
            );
        }

        #[test]
        fn test_atom_bad_date_keeps_entry_undated() {
            let xml = r#"<feed>
                <title>F</title>
                <entry><title>Good</title><link href="http://g/"/><updated>2021-01-02T00:00:00+02:00</updated></entry>
                <entry><title>Bad</title><link href="http://b/"/><updated>yesterday</updated></entry>
            </feed>"#;

            let entries = parse(xml.as_bytes()).unwrap();

            assert_eq!(entries.len(), 2);
            assert_eq!(
                entries[0].when,
                Some(Utc.with_ymd_and_hms(2021, 1, 1, 22, 0, 0).unwrap())
            );
            assert_eq!(entries[1].title, "Bad");
            assert_eq!(entries[1].when, None);
        }

        #[test]
        fn test_atom_prefers_alternate_link() {
            let xml = r#"<feed>
                <title>F</title>
                <link rel="self" href="http://f/feed.xml"/>
                <link rel="alternate" href="http://f/"/>
                <entry>
                    <title>E</title>
                    <link rel="replies" href="http://f/e/comments"/>
                    <link href="http://f/e"/>
                    <updated>2021-01-02T00:00:00Z</updated>
                </entry>
            </feed>"#;

            let entries = parse(xml.as_bytes()).unwrap();

            assert_eq!(entries[0].feed_url, "http://f/");
            assert_eq!(entries[0].url, "http://f/e");
        }

        #[test]
        fn test_atom_falls_back_to_first_link() {
            let xml = r#"<feed><title>F</title>
                <entry><title>E</title><link rel="enclosure" href="http://f/e.mp3"/></entry>
            </feed>"#;

            let entries = parse(xml.as_bytes()).unwrap();
            assert_eq!(entries[0].url, "http://f/e.mp3");
        }

        #[test]
        fn test_atom_uses_published_without_updated() {
            let xml = r#"<feed><title>F</title>
                <entry><title>E</title><published>2020-05-01T12:00:00Z</published></entry>
            </feed>"#;

            let entries = parse(xml.as_bytes()).unwrap();
            assert_eq!(
                entries[0].when,
                Some(Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap())
            );
        }

        #[test]
        fn test_entry_title_does_not_leak_into_feed_title() {
            let xml = r#"<feed><entry><title>Inner</title></entry><title>Outer</title></feed>"#;

            let entries = parse(xml.as_bytes()).unwrap();
            assert_eq!(entries[0].feed_name, "Outer");
            assert_eq!(entries[0].title, "Inner");
        }

        #[test]
        fn test_atom_entities_and_cdata() {
            let xml = r#"<feed><title>Tom &amp; Jerry</title>
                <entry><title><![CDATA[<b>Bold</b> move]]></title></entry>
            </feed>"#;

            let entries = parse(xml.as_bytes()).unwrap();
            assert_eq!(entries[0].feed_name, "Tom & Jerry");
            assert_eq!(entries[0].title, "<b>Bold</b> move");
        }
    }

    mod rss_tests {
        use super::*;

        #[test]
        fn test_rss_items_normalize() {
            let entries = parse(RSS_SAMPLE.as_bytes()).unwrap();

            assert_eq!(entries.len(), 2);
            for entry in &entries {
                assert_eq!(entry.feed_name, "Tech News");
                assert_eq!(entry.feed_url, "https://technews.example.com");
            }
            assert_eq!(entries[0].title, "First");
            assert_eq!(entries[0].url, "https://technews.example.com/1");
            assert_eq!(entries[1].title, "Second");
        }

        #[test]
        fn test_rss_rfc1123z_date() {
            let entries = parse(RSS_SAMPLE.as_bytes()).unwrap();
            assert_eq!(
                entries[0].when,
                Some(Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap())
            );
        }

        #[test]
        fn test_rss_rfc1123_named_zone() {
            let entries = parse(RSS_SAMPLE.as_bytes()).unwrap();
            assert_eq!(
                entries[1].when,
                Some(Utc.with_ymd_and_hms(2024, 12, 9, 10, 0, 0).unwrap())
            );
        }

        #[test]
        fn test_atom_link_in_channel_is_ignored() {
            let raw = decode(RSS_SAMPLE.as_bytes()).unwrap();
            match raw {
                RawFeed::Rss(feed) => assert_eq!(feed.link, "https://technews.example.com"),
                RawFeed::Atom(_) => panic!("expected RSS"),
            }
        }

        #[test]
        fn test_rss_unparseable_date_keeps_item() {
            let xml = r#"<rss><channel><title>C</title><link>http://c/</link>
                <item><title>X</title><link>http://c/x</link><pubDate>sometime</pubDate></item>
                <item><title>Y</title><link>http://c/y</link></item>
            </channel></rss>"#;

            let entries = parse(xml.as_bytes()).unwrap();
            assert_eq!(entries.len(), 2);
            assert!(entries.iter().all(|e| e.when.is_none()));
        }

        #[test]
        fn test_empty_channel() {
            let entries = parse(b"<rss version=\"2.0\"><channel><title>Quiet</title></channel></rss>")
                .unwrap();
            assert!(entries.is_empty());
        }
    }

    mod date_tests {
        use super::*;

        #[test]
        fn test_rfc822() {
            assert_eq!(
                parse_rss_date("02 Jan 06 15:04 EST"),
                Some(Utc.with_ymd_and_hms(2006, 1, 2, 20, 4, 0).unwrap())
            );
        }

        #[test]
        fn test_rfc822z() {
            assert_eq!(
                parse_rss_date("02 Jan 06 15:04 +0100"),
                Some(Utc.with_ymd_and_hms(2006, 1, 2, 14, 4, 0).unwrap())
            );
        }

        #[test]
        fn test_unknown_zone_is_utc() {
            assert_eq!(
                parse_rss_date("Mon, 02 Jan 2006 15:04:05 XYZ"),
                Some(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap())
            );
        }

        #[test]
        fn test_lenient_fallback() {
            assert_eq!(
                parse_rss_date("Tue, 3 Jun 2008 11:05:30 +0000"),
                Some(Utc.with_ymd_and_hms(2008, 6, 3, 11, 5, 30).unwrap())
            );
        }

        #[test]
        fn test_garbage_date() {
            assert_eq!(parse_rss_date("not a date"), None);
            assert_eq!(parse_rfc3339("2021-13-40"), None);
        }
    }

    mod namespace_tests {
        use super::*;

        #[test]
        fn test_prefixed_atom_document() {
            let xml = r#"<a:feed xmlns:a="http://www.w3.org/2005/Atom">
                <a:title>Prefixed</a:title>
                <a:link href="http://p/"/>
                <a:entry>
                    <a:title>E</a:title>
                    <a:link href="http://p/e"/>
                    <a:updated>2021-01-02T00:00:00Z</a:updated>
                </a:entry>
            </a:feed>"#;

            let entries = parse(xml.as_bytes()).unwrap();

            assert_eq!(
                entries,
                vec![Entry {
                    feed_name: "Prefixed".to_string(),
                    feed_url: "http://p/".to_string(),
                    title: "E".to_string(),
                    url: "http://p/e".to_string(),
                    when: Some(Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap()),
                }]
            );
        }

        #[test]
        fn test_prefixed_rss_document() {
            let xml = r#"<x:rss xmlns:x="urn:x"><x:channel>
                <x:title>C</x:title>
                <x:link>http://c/</x:link>
                <x:item><x:title>I</x:title><x:link>http://c/i</x:link></x:item>
            </x:channel></x:rss>"#;

            let raw = decode(xml.as_bytes()).unwrap();
            assert_eq!(raw.format(), FeedFormat::Rss);

            let entries = raw.into_entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].feed_name, "C");
            assert_eq!(entries[0].url, "http://c/i");
        }

        #[test]
        fn test_foreign_namespace_elements_are_ignored() {
            let xml = r#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel>
                <title>C</title>
                <item>
                    <title>Real</title>
                    <media:title>Media</media:title>
                    <link xmlns="urn:other">http://wrong/</link>
                    <link>http://c/real</link>
                </item>
            </channel></rss>"#;

            let entries = parse(xml.as_bytes()).unwrap();

            assert_eq!(entries[0].title, "Real");
            assert_eq!(entries[0].url, "http://c/real");
        }
    }

    mod malformed_tests {
        use super::*;

        #[test]
        fn test_mismatched_tags_fail() {
            let result = parse(b"<rss><channel><title>x</channel></rss>");
            assert!(matches!(result, Err(ParseError::Xml(_))));
        }

        #[test]
        fn test_truncated_document_fails() {
            let result = parse(b"<feed><title>x</title><entry><title>y</title>");
            assert!(result.is_err());
        }
    }
}
