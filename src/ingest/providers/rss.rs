// src/ingest/providers/rss.rs
//! Event-driven parser for RSS 2.0, RSS 1.0 (RDF) and Atom documents.
//!
//! Elements are matched on their qualified name so `media:title` or
//! `itunes:summary` never shadow the plain fields.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::ingest::types::{FeedEntry, ParsedFeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FeedTitle,
    Title,
    Link,
    Published,
    Content,
    Description,
    Summary,
}

fn entry_field(qname: &[u8]) -> Option<Field> {
    match qname {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"pubDate" | b"published" | b"dc:date" | b"issued" | b"dcterms:issued" => {
            Some(Field::Published)
        }
        b"content:encoded" | b"content" => Some(Field::Content),
        b"description" => Some(Field::Description),
        b"summary" => Some(Field::Summary),
        _ => None,
    }
}

fn is_entry(qname: &[u8]) -> bool {
    matches!(qname, b"item" | b"entry")
}

/// Parse an RFC 2822 (RSS) or RFC 3339 (Atom, Dublin Core) timestamp.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn has_href(e: &BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|a| a.key.as_ref() == b"href")
}

/// Atom `<link href=..>`: `rel="alternate"` or no `rel` qualifies.
fn atom_href(e: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut alternate = true;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"href" => href = attr.unescape_value().ok().map(|v| v.into_owned()),
            b"rel" => {
                alternate = attr
                    .unescape_value()
                    .map(|v| v.as_ref() == "alternate")
                    .unwrap_or(false)
            }
            _ => {}
        }
    }
    href.filter(|_| alternate)
}

#[derive(Default)]
struct EntryBuilder {
    entry: FeedEntry,
    published_raw: Option<String>,
}

impl EntryBuilder {
    fn slot(&mut self, field: Field) -> Option<&mut String> {
        let slot = match field {
            Field::Title => &mut self.entry.title,
            Field::Link => &mut self.entry.link,
            Field::Published => &mut self.published_raw,
            Field::Content => &mut self.entry.content,
            Field::Description => &mut self.entry.description,
            Field::Summary => &mut self.entry.summary,
            Field::FeedTitle => return None,
        };
        Some(slot.get_or_insert_with(String::new))
    }

    fn finish(mut self) -> FeedEntry {
        for s in [
            &mut self.entry.title,
            &mut self.entry.link,
            &mut self.entry.content,
            &mut self.entry.description,
            &mut self.entry.summary,
        ]
        .into_iter()
        .flatten()
        {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
        self.entry.published = self.published_raw.as_deref().and_then(parse_feed_date);
        self.entry
    }
}

/// Parse a feed document into its channel title and entries.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut feed = ParsedFeed::default();
    let mut current: Option<EntryBuilder> = None;
    // depth of the open item/entry; only its direct children are fields, so
    // an Atom `<source>` or `<author>` never leaks into the entry
    let mut entry_depth = 0usize;
    // (field, depth of the element that opened it)
    let mut capture: Option<(Field, usize)> = None;
    let mut feed_title = String::new();
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("xml error at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => {
                depth += 1;
                if capture.is_some() {
                    // markup nested inside a captured field (xhtml content etc.)
                    continue;
                }
                let qname = e.name();
                let qname = qname.as_ref();
                if is_entry(qname) {
                    current = Some(EntryBuilder::default());
                    entry_depth = depth;
                    continue;
                }
                match current.as_mut() {
                    Some(_) if depth != entry_depth + 1 => {}
                    Some(b) => {
                        if qname == b"link" {
                            if has_href(&e) {
                                if let Some(href) = atom_href(&e) {
                                    b.entry.link.get_or_insert(href);
                                }
                                continue;
                            }
                            if b.entry.link.is_some() {
                                continue;
                            }
                        }
                        if let Some(field) = entry_field(qname) {
                            if field == Field::Published && b.published_raw.is_some() {
                                continue;
                            }
                            b.slot(field);
                            capture = Some((field, depth));
                        }
                    }
                    None => {
                        if qname == b"title" && feed.title.is_none() && depth <= 3 {
                            capture = Some((Field::FeedTitle, depth));
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if capture.is_some() {
                    continue;
                }
                if let Some(b) = current.as_mut().filter(|_| depth == entry_depth) {
                    if e.name().as_ref() == b"link" {
                        if let Some(href) = atom_href(&e) {
                            b.entry.link.get_or_insert(href);
                        }
                    }
                }
            }
            Event::End(e) => {
                if let Some((field, d)) = capture {
                    if d == depth {
                        capture = None;
                        if field == Field::FeedTitle {
                            let t = feed_title.trim();
                            if !t.is_empty() {
                                feed.title = Some(t.to_string());
                            }
                        }
                    }
                } else if depth == entry_depth && is_entry(e.name().as_ref()) {
                    if let Some(b) = current.take() {
                        feed.entries.push(b.finish());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                if let Some((field, _)) = capture {
                    // HTML entities (&nbsp; &aacute; ...) are not XML entities
                    let text = t.unescape().map(|s| s.into_owned()).unwrap_or_else(|_| {
                        let raw = String::from_utf8_lossy(t.as_ref());
                        html_escape::decode_html_entities(&raw).into_owned()
                    });
                    append(field, &text, current.as_mut(), &mut feed_title);
                }
            }
            Event::CData(c) => {
                if let Some((field, _)) = capture {
                    let text = String::from_utf8_lossy(c.as_ref()).into_owned();
                    append(field, &text, current.as_mut(), &mut feed_title);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(feed)
}

fn append(field: Field, text: &str, entry: Option<&mut EntryBuilder>, feed_title: &mut String) {
    let slot = match (field, entry) {
        (Field::FeedTitle, _) => Some(feed_title),
        (f, Some(b)) => b.slot(f),
        (_, None) => None,
    };
    if let Some(s) = slot {
        if !s.is_empty() {
            s.push(' ');
        }
        s.push_str(text);
    }
}
