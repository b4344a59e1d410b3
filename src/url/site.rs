use url::Url;

/// Derives the stored page path of `page` relative to the site `root`
///
/// Pages on the root's origin are stored by path (plus query, if any);
/// pages elsewhere keep their full URL so they stay distinct.
///
/// # Examples
///
/// ```
/// use lemma_crawl::url::page_path;
/// use url::Url;
///
/// let root = Url::parse("https://x.com").unwrap();
/// assert_eq!(page_path(&root, &root), "/");
/// assert_eq!(page_path(&root, &Url::parse("https://x.com/a?b=1").unwrap()), "/a?b=1");
/// assert_eq!(page_path(&root, &Url::parse("https://y.com/a").unwrap()), "https://y.com/a");
/// ```
pub fn page_path(root: &Url, page: &Url) -> String {
    if page.origin() != root.origin() {
        return page.to_string();
    }

    match page.query() {
        Some(query) => format!("{}?{}", page.path(), query),
        None => page.path().to_string(),
    }
}

/// Returns true if `page` lives under the site `root`
///
/// Same origin is required; a root with a path (`https://x.com/blog`)
/// only owns pages below that path.
pub fn belongs_to_site(page: &Url, root: &Url) -> bool {
    if page.origin() != root.origin() {
        return false;
    }

    let root_path = root.path().trim_end_matches('/');
    let path = page.path();
    path == root_path
        || path
            .strip_prefix(root_path)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}
