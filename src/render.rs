// src/render.rs
//! HTML digest body. Output is a pure function of its inputs apart from the
//! single generation line, which `strip_generated_line` removes.

use chrono::NaiveDateTime;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;

use crate::artifact::{NewsRecord, SourceGroup};

/// Marker carried by the only non-deterministic line of a rendered digest.
/// Opening tag of the generation-timestamp line. Rendered text has `<`
/// escaped, so no other line can start with it.
pub const GENERATED_MARKER: &str = "<p class=\"generated\">";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub heading: String,
    pub footer: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            heading: "News Digest".into(),
            footer: "This email was generated automatically.".into(),
        }
    }
}

/// `[dd/mm HH:MM] <a href="link" target="_blank">title</a>`
pub fn format_item(rec: &NewsRecord) -> String {
    format!(
        "[{}] <a href=\"{}\" target=\"_blank\">{}</a>",
        rec.published.format("%d/%m %H:%M"),
        encode_double_quoted_attribute(&rec.link),
        encode_text(&rec.title)
    )
}

/// One `<h3>` per source in map order, one `<li>` per record in bucket order.
pub fn render_digest(
    digest: &SourceGroup,
    label: &str,
    generated_at: NaiveDateTime,
    opts: &RenderOptions,
) -> String {
    let mut body = String::new();
    body.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n");
    let _ = writeln!(body, "<h2>{}</h2>", encode_text(&opts.heading));
    let _ = writeln!(body, "<p>News from {}</p>", encode_text(label));
    let _ = writeln!(
        body,
        "{GENERATED_MARKER}Generated {}</p>",
        generated_at.format("%d/%m/%Y %H:%M")
    );

    for (source, records) in digest {
        let _ = writeln!(body, "<h3>{}</h3>", encode_text(source));
        body.push_str("<ul>\n");
        for rec in records {
            let _ = writeln!(body, "<li>{}</li>", format_item(rec));
        }
        body.push_str("</ul>\n");
    }

    let _ = writeln!(
        body,
        "<hr><p style=\"font-size:small;color:gray;\">{}</p>",
        encode_text(&opts.footer)
    );
    body.push_str("</body>\n</html>\n");
    body
}

/// Drop the generation-timestamp line so two renders can be compared.
pub fn strip_generated_line(html: &str) -> String {
    html.lines()
        .filter(|l| !l.trim_start().starts_with(GENERATED_MARKER))
        .map(|l| format!("{l}\n"))
        .collect()
}
