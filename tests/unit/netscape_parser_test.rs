//! Unit tests for the Netscape bookmark parser.
//!
//! Covers both exporter dialects (folder list nested in its `<DT>` or placed
//! right after it), `<p>` noise, attribute casing and the flat fallback.

use bookmark_cowboy::services::netscape_parser::{collapse_whitespace, parse_bookmarks};
use bookmark_cowboy::types::bookmark::RawBookmark;
use rstest::rstest;

fn titles_and_paths(records: &[RawBookmark]) -> Vec<(String, String)> {
    records.iter().map(|r| (r.title.clone(), r.folder_path())).collect()
}

// ─── Dialects ───

#[test]
fn test_nested_dialect_assigns_folder_paths() {
    let html = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
  <DT><H3>Folder A</H3>
  <DL><p>
    <DT><H3>Folder B</H3>
    <DL><p>
      <DT><A HREF="https://example.com" ADD_DATE="123">X</A>
    </DL><p>
  </DL><p>
  <DT><A HREF="https://top.example">Top</A>
</DL><p>
"#;
    let records = parse_bookmarks(html);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "X");
    assert_eq!(records[0].url, "https://example.com");
    assert_eq!(records[0].add_date.as_deref(), Some("123"));
    assert_eq!(records[0].folder_path_segments, vec!["Folder A", "Folder B"]);
    assert_eq!(records[1].title, "Top");
    assert!(records[1].folder_path_segments.is_empty());
    assert_eq!(records[1].add_date, None);
}

#[test]
fn test_sibling_dialect_assigns_folder_paths() {
    let html = r#"<DL><p>
<DT><H3>Work</H3></DT>
<DL><p>
  <DT><A HREF="https://a.dev">A</A></DT>
  <DT><H3>Reading</H3></DT>
  <DL><p>
    <DT><A HREF="https://b.dev">B</A></DT>
  </DL><p>
</DL><p>
<DT><A HREF="https://c.dev">C</A></DT>
</DL><p>"#;
    let records = parse_bookmarks(html);
    assert_eq!(
        titles_and_paths(&records),
        vec![
            ("A".to_string(), "Work".to_string()),
            ("B".to_string(), "Work/Reading".to_string()),
            ("C".to_string(), String::new()),
        ]
    );
}

/// A folder description in `<DD>` sits between the heading and its list.
/// Left open, the tree builder moves the list inside the `<DD>`.
#[rstest]
#[case::open_description(
    r#"<DL><p><DT><H3>A</H3><DD>Saved reading<DL><p><DT><A HREF="https://in.dev">in</A></DL><p><DT><A HREF="https://top.dev">top</A></DL>"#
)]
#[case::closed_description(
    r#"<DL><p><DT><H3>A</H3></DT><DD>Saved reading</DD><DL><p><DT><A HREF="https://in.dev">in</A></DL><p><DT><A HREF="https://top.dev">top</A></DL>"#
)]
fn test_folder_description_keeps_folder_contents(#[case] html: &str) {
    let records = parse_bookmarks(html);
    assert_eq!(
        titles_and_paths(&records),
        vec![
            ("in".to_string(), "A".to_string()),
            ("top".to_string(), String::new()),
        ]
    );
}

#[test]
fn test_bookmark_description_is_ignored() {
    let html = r#"<DL><p><DT><A HREF="https://a.dev">a</A><DD>about a<DT><A HREF="https://b.dev">b</A></DL>"#;
    let records = parse_bookmarks(html);
    assert_eq!(
        titles_and_paths(&records),
        vec![("a".to_string(), String::new()), ("b".to_string(), String::new())]
    );
}

#[test]
fn test_empty_folder_does_not_capture_following_bookmark() {
    let html = r#"<DL><p>
<DT><H3>Empty</H3></DT>
<DT><A HREF="https://after.dev">After</A></DT>
</DL>"#;
    let records = parse_bookmarks(html);
    assert_eq!(records.len(), 1);
    assert!(records[0].folder_path_segments.is_empty());
}

#[test]
fn test_document_order_is_preserved() {
    let html = r#"<DL><p>
<DT><A HREF="https://z.dev">Zulu</A>
<DT><A HREF="https://a.dev">Alpha</A>
<DT><A HREF="https://m.dev">Mike</A>
</DL>"#;
    let titles: Vec<String> = parse_bookmarks(html).into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["Zulu", "Alpha", "Mike"]);
}

// ─── Attributes and text ───

#[rstest]
#[case(r#"<DL><DT><A HREF="https://a.com" ADD_DATE="5">A</A></DL>"#)]
#[case(r#"<dl><dt><a href="https://a.com" add_date="5">A</a></dl>"#)]
#[case(r#"<DL><DT><a Href="https://a.com" Add_Date="5">A</a></DL>"#)]
fn test_attributes_are_case_insensitive(#[case] html: &str) {
    let records = parse_bookmarks(html);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "https://a.com");
    assert_eq!(records[0].add_date.as_deref(), Some("5"));
}

#[rstest]
#[case(r#"<DL><DT><A HREF="">No url</A></DL>"#)]
#[case(r#"<DL><DT><A HREF="https://a.com">   </A></DL>"#)]
#[case(r#"<DL><DT><A>No href</A></DL>"#)]
#[case(r#"<DL><DT><A HREF="   ">Blank url</A></DL>"#)]
fn test_anchors_without_title_or_url_are_skipped(#[case] html: &str) {
    assert!(parse_bookmarks(html).is_empty());
}

#[test]
fn test_whitespace_is_collapsed_in_titles_and_folder_names() {
    let html = "<DL><p>\n<DT><H3>  My\n   Folder </H3>\n<DL><p>\n<DT><A HREF=\" https://a.com \">  Some \n\t Title  </A>\n</DL><p>\n</DL>";
    let records = parse_bookmarks(html);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Some Title");
    assert_eq!(records[0].url, "https://a.com");
    assert_eq!(records[0].folder_path_segments, vec!["My Folder"]);
}

#[test]
fn test_entities_are_decoded() {
    let html = r#"<DL><DT><H3>R&amp;D</H3><DL><DT><A HREF="https://a.com/?x=1&amp;y=2">Fish &amp; Chips</A></DL></DL>"#;
    let records = parse_bookmarks(html);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Fish & Chips");
    assert_eq!(records[0].url, "https://a.com/?x=1&y=2");
    assert_eq!(records[0].folder_path(), "R&D");
}

#[test]
fn test_empty_add_date_is_dropped() {
    let records = parse_bookmarks(r#"<DL><DT><A HREF="https://a.com" ADD_DATE="">A</A></DL>"#);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].add_date, None);
}

// ─── Fallback ───

#[test]
fn test_without_lists_every_anchor_lands_at_root() {
    let html = r#"<html><body><div>
<a href="https://a.com">A</a>
<p><a href="https://b.com">B</a></p>
<a href="">skipped</a>
</div></body></html>"#;
    let records = parse_bookmarks(html);
    assert_eq!(
        titles_and_paths(&records),
        vec![("A".to_string(), String::new()), ("B".to_string(), String::new())]
    );
}

#[rstest]
#[case("")]
#[case("not html at all")]
#[case("<DL><p></DL><p>")]
fn test_documents_without_bookmarks_parse_to_nothing(#[case] html: &str) {
    assert!(parse_bookmarks(html).is_empty());
}

#[rstest]
#[case("  a   b ", "a b")]
#[case("\n\tx\n", "x")]
#[case("", "")]
fn test_collapse_whitespace_cases(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(collapse_whitespace(input), expected);
}
