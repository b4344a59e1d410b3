//! HTML parser for extracting links and text
//!
//! Links are returned exactly as written in the document. Turning them into
//! fetchable absolute URLs is the job of [`crate::url::normalize_link`].

use scraper::{Html, Selector};

/// Elements whose text never counts as page content
const NON_CONTENT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extracts the raw `href` of every `<a href>` element in document order
///
/// Anchors carrying the `download` attribute point at files, not pages, and
/// are skipped.
///
/// # Example
///
/// ```
/// use lemma_crawl::crawler::extract_links;
///
/// let html = r#"<body><a href="/about">About</a><a href="tel:+1-555">Call</a></body>"#;
/// assert_eq!(extract_links(html), vec!["/about", "tel:+1-555"]);
/// ```
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Extracts the human-readable text of a document
///
/// Text inside scripts, styles and similar elements is dropped. Text nodes
/// are separated by a single space so adjacent elements never glue words
/// together.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::with_capacity(html.len() / 2);

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|element| NON_CONTENT_ELEMENTS.contains(&element.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let fragment = fragment.trim();
        if !fragment.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(fragment);
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_relative_and_absolute_links() {
        let html = r#"
            <html>
            <body>
                <a href="/page1">Link 1</a>
                <a href="page2">Link 2</a>
                <a href="https://other.com/page3">Link 3</a>
            </body>
            </html>
        "#;
        assert_eq!(
            extract_links(html),
            vec!["/page1", "page2", "https://other.com/page3"]
        );
    }

    #[test]
    fn test_links_are_returned_raw() {
        let html = r##"<body>
            <a href="mailto:test@example.com">Email</a>
            <a href="#section">Jump</a>
            <a href=" /padded ">Padded</a>
        </body>"##;
        assert_eq!(
            extract_links(html),
            vec!["mailto:test@example.com", "#section", " /padded "]
        );
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        assert!(extract_links(html).is_empty());
    }

    #[test]
    fn test_anchor_without_href_is_ignored() {
        let html = r#"<html><body><a name="top">Top</a><a href="/x">X</a></body></html>"#;
        assert_eq!(extract_links(html), vec!["/x"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let html = r#"<body><a href="/a">1</a><a href="/a">2</a></body>"#;
        assert_eq!(extract_links(html).len(), 2);
    }

    #[test]
    fn test_extract_text_skips_scripts_and_styles() {
        let html = r#"
            <html>
            <head><title>Greeting</title><style>body { color: red; }</style></head>
            <body>
                <h1>Hello</h1><p>world</p>
                <script>var hidden = "secret";</script>
            </body>
            </html>
        "#;
        assert_eq!(extract_text(html), "Greeting Hello world");
    }

    #[test]
    fn test_extract_text_of_fragment() {
        assert_eq!(extract_text("plain words only"), "plain words only");
        assert_eq!(extract_text(""), "");
    }
}
