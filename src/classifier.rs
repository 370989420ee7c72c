//! Splits a page's hrefs into PDF candidates and same-site pages to visit.

use std::path::Path;

use crate::models::PdfTarget;
use crate::url_utils;

/// Everything the classifier needs to know about the page being processed.
#[derive(Debug, Clone)]
pub struct ClassifyContext<'a> {
    pub page_url: &'a str,
    pub page_title: &'a str,
    /// Host crawled pages must stay on.
    pub base_domain: &'a str,
    /// `scheme://host` prefixed onto root-relative hrefs.
    pub site_root: &'a str,
    pub download_dir: &'a Path,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub pdf_targets: Vec<PdfTarget>,
    pub page_links: Vec<String>,
}

/// Classify every href of one page. Malformed or off-site hrefs are dropped.
///
/// Output may contain duplicates; the frontier and registry de-duplicate.
pub fn classify<S: AsRef<str>>(hrefs: &[S], ctx: &ClassifyContext<'_>) -> Classified {
    let mut classified = Classified::default();

    for href in hrefs {
        let href = href.as_ref().trim();
        if href.is_empty() {
            continue;
        }

        if url_utils::is_pdf_link(href) {
            if let Some(target) = pdf_target(href, ctx) {
                classified.pdf_targets.push(target);
            }
        } else if let Some(page) = page_link(href, ctx) {
            classified.page_links.push(page);
        }
    }

    classified
}

fn pdf_target(href: &str, ctx: &ClassifyContext<'_>) -> Option<PdfTarget> {
    let url = resolve_pdf(href, ctx)?;
    let file_name = url_utils::file_name_from_url(&url)?;

    Some(PdfTarget::new(
        url,
        file_name,
        ctx.download_dir,
        ctx.page_url.to_string(),
        ctx.page_title.to_string(),
    ))
}

fn resolve_pdf(href: &str, ctx: &ClassifyContext<'_>) -> Option<String> {
    let url = if url_utils::is_absolute_http(href) {
        href.to_string()
    } else if href.starts_with('/') && !href.starts_with("//") {
        format!("{}{}", ctx.site_root, href)
    } else {
        url_utils::convert_to_absolute_url(href, ctx.page_url).ok()?
    };

    url_utils::is_parseable(&url).then_some(url)
}

fn page_link(href: &str, ctx: &ClassifyContext<'_>) -> Option<String> {
    if href.starts_with('#') {
        return None;
    }

    if href.starts_with('/') && !href.starts_with("//") {
        let url = format!("{}{}", ctx.site_root, href);
        return url_utils::is_parseable(&url).then_some(url);
    }

    let absolute = if url_utils::is_absolute_http(href) {
        href.to_string()
    } else if href.starts_with("//") {
        url_utils::convert_to_absolute_url(href, ctx.page_url).ok()?
    } else {
        return None;
    };

    let host = url_utils::extract_host(&absolute)?;
    if host.eq_ignore_ascii_case(ctx.base_domain) {
        Some(absolute)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context<'a>(page_url: &'a str, dir: &'a Path) -> ClassifyContext<'a> {
        ClassifyContext {
            page_url,
            page_title: "Index",
            base_domain: "site",
            site_root: "https://site",
            download_dir: dir,
        }
    }

    #[test]
    fn test_relative_pdf_with_query() {
        let dir = Path::new("/data/pdf_downloads");
        let out = classify(&["/docs/x.pdf?v=2"], &context("https://site/a", dir));

        assert!(out.page_links.is_empty());
        assert_eq!(out.pdf_targets.len(), 1);
        let target = &out.pdf_targets[0];
        assert_eq!(target.url, "https://site/docs/x.pdf?v=2");
        assert_eq!(target.file_name, "x.pdf");
        assert_eq!(target.local_path, PathBuf::from("/data/pdf_downloads/x.pdf"));
        assert_eq!(target.from_page, "https://site/a");
        assert_eq!(target.title, "Index");
    }

    #[test]
    fn test_off_host_page_is_dropped() {
        let dir = Path::new("/tmp");
        let out = classify(&["https://other.host/page"], &context("https://site/a", dir));
        assert_eq!(out, Classified::default());
    }

    #[test]
    fn test_same_host_absolute_page_kept_unchanged() {
        let dir = Path::new("/tmp");
        let out = classify(&["https://site/b?page=2"], &context("https://site/a", dir));
        assert_eq!(out.page_links, vec!["https://site/b?page=2".to_string()]);
    }

    #[test]
    fn test_root_relative_page_is_resolved() {
        let dir = Path::new("/tmp");
        let out = classify(&["/law/list"], &context("https://site/a", dir));
        assert_eq!(out.page_links, vec!["https://site/law/list".to_string()]);
    }

    #[test]
    fn test_fragments_and_odd_schemes_dropped() {
        let dir = Path::new("/tmp");
        let hrefs = ["#top", "ftp://site/file", "relative/page", "http://[::1", ""];
        let out = classify(&hrefs, &context("https://site/a", dir));
        assert_eq!(out, Classified::default());
    }

    #[test]
    fn test_off_host_pdf_is_kept() {
        let dir = Path::new("/tmp");
        let out = classify(&["https://cdn.other/files/y.pdf"], &context("https://site/a", dir));
        assert_eq!(out.pdf_targets.len(), 1);
        assert_eq!(out.pdf_targets[0].url, "https://cdn.other/files/y.pdf");
        assert!(out.page_links.is_empty());
    }

    #[test]
    fn test_document_relative_pdf_joins_page_url() {
        let dir = Path::new("/tmp");
        let out = classify(&["files/z.pdf"], &context("https://site/docs/index.html", dir));
        assert_eq!(out.pdf_targets[0].url, "https://site/docs/files/z.pdf");
        assert_eq!(out.pdf_targets[0].file_name, "z.pdf");
    }

    #[test]
    fn test_protocol_relative_links() {
        let dir = Path::new("/tmp");
        let out = classify(&["//site/x", "//elsewhere/y"], &context("https://site/a", dir));
        assert_eq!(out.page_links, vec!["https://site/x".to_string()]);
    }

    #[test]
    fn test_duplicates_pass_through() {
        let dir = Path::new("/tmp");
        let out = classify(&["/a.pdf", "/a.pdf", "/p", "/p"], &context("https://site/", dir));
        assert_eq!(out.pdf_targets.len(), 2);
        assert_eq!(out.page_links.len(), 2);
    }
}
