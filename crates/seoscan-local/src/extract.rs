//! HTML → body text.

/// Concatenated text nodes of the first `<body>` element.
///
/// Notes:
/// - Text nodes are joined as-is (no separators added), like DOM `textContent`.
/// - Script and style contents inside the body are included.
/// - Returns an empty string when the input has no body text at all.
pub fn body_text(html: &str) -> String {
    let doc = html_scraper::Html::parse_document(html);
    let Ok(sel) = html_scraper::Selector::parse("body") else {
        return String::new();
    };
    doc.select(&sel)
        .next()
        .map(|body| body.text().collect::<String>())
        .unwrap_or_default()
}

pub fn has_any_text(s: &str) -> bool {
    s.chars().any(|c| !c.is_whitespace())
}
