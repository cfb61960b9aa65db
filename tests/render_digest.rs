// tests/render_digest.rs
use chrono::{NaiveDate, NaiveDateTime};
use news_digest::artifact::parse_artifact;
use news_digest::render::{format_item, RenderOptions, GENERATED_MARKER};
use news_digest::{render_digest, strip_generated_line, SourceGroup};

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn digest() -> SourceGroup {
    parse_artifact(
        r#"{
        "LaNacion": [{"title": "Trigo en baja", "link": "http://b/1", "published": "2024-01-01T09:00:00"}],
        "Clarin": [
            {"title": "Sube el maiz", "link": "http://a/1", "published": "2024-01-01T08:00:00"},
            {"title": "Soja <record>", "link": "http://a/2?x=1&y=2", "published": "2024-01-01T10:05:00"}
        ]
    }"#,
    )
    .unwrap()
    .group
}

#[test]
fn one_heading_per_source_in_key_order() {
    let html = render_digest(&digest(), "the last day", at(7, 0), &RenderOptions::default());
    let clarin = html.find("<h3>Clarin</h3>").expect("Clarin heading");
    let lanacion = html.find("<h3>LaNacion</h3>").expect("LaNacion heading");
    assert!(clarin < lanacion);
    assert_eq!(html.matches("<h3>").count(), 2);
    assert_eq!(html.matches("<li>").count(), 3);
    assert!(html.contains("the last day"));
}

#[test]
fn items_carry_day_month_time_and_escaped_text() {
    let html = render_digest(&digest(), "x", at(7, 0), &RenderOptions::default());
    assert!(html.contains(
        "<li>[01/01 08:00] <a href=\"http://a/1\" target=\"_blank\">Sube el maiz</a></li>"
    ));
    assert!(html.contains("Soja &lt;record&gt;"));
    assert!(html.contains("http://a/2?x=1&amp;y=2"));
}

#[test]
fn only_generated_line_differs_between_renders() {
    let opts = RenderOptions {
        heading: "Agro Digest".into(),
        footer: "bye".into(),
    };
    let a = render_digest(&digest(), "x", at(7, 0), &opts);
    let b = render_digest(&digest(), "x", at(19, 45), &opts);
    assert_ne!(a, b);
    assert_eq!(strip_generated_line(&a), strip_generated_line(&b));

    let generated: Vec<_> = a.lines().filter(|l| l.contains(GENERATED_MARKER)).collect();
    assert_eq!(generated.len(), 1);
    assert!(generated[0].contains("02/01/2024 07:00"));
    assert!(!strip_generated_line(&a).contains(GENERATED_MARKER));
    assert!(a.contains("<h2>Agro Digest</h2>"));
    assert!(a.contains("bye"));
}

#[test]
fn empty_digest_renders_frame_only() {
    let html = render_digest(&SourceGroup::new(), "x", at(7, 0), &RenderOptions::default());
    assert!(!html.contains("<h3>"));
    assert!(html.contains("</html>"));
}

#[test]
fn format_item_matches_list_line() {
    let d = digest();
    assert_eq!(
        format_item(&d["LaNacion"][0]),
        "[01/01 09:00] <a href=\"http://b/1\" target=\"_blank\">Trigo en baja</a>"
    );
}

#[test]
fn title_mentioning_generated_class_survives_stripping() {
    let d = parse_artifact(
        r#"{"Clarin": [
            {"title": "a class=\"generated\" b", "link": "http://a/9", "published": "2024-01-01T08:00:00"},
            {"title": "<p class=\"generated\">x", "link": "http://a/10", "published": "2024-01-01T09:00:00"}
        ]}"#,
    )
    .unwrap()
    .group;
    let html = render_digest(&d, "x", at(7, 0), &RenderOptions::default());
    let stripped = strip_generated_line(&html);
    assert_eq!(stripped.matches("<li>").count(), 2);
    assert!(stripped.contains("http://a/9"));
    assert!(stripped.contains("http://a/10"));
    assert!(!stripped.contains("Generated 02/01/2024"));
}
