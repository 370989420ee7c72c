//! URL utilities shared by the classifier and the crawler.

use url::Url;

/// Host (with port, when non-default) of an absolute URL.
pub fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// `scheme://host[:port]` of the seed URL, used to anchor root-relative hrefs.
pub fn site_root(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = extract_host(url)?;
    Some(format!("{}://{}", parsed.scheme(), host))
}

pub fn is_absolute_http(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Drop everything from the first `?` or `#`.
pub fn strip_query_and_fragment(href: &str) -> &str {
    match href.find(['?', '#']) {
        Some(pos) => &href[..pos],
        None => href,
    }
}

pub fn is_pdf_link(href: &str) -> bool {
    strip_query_and_fragment(href)
        .to_ascii_lowercase()
        .ends_with(".pdf")
}

/// Final path segment of a URL with query and fragment removed.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let path = strip_query_and_fragment(url);
    let name = path.rsplit('/').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn convert_to_absolute_url(link: &str, base_url: &str) -> Result<String, String> {
    let base = Url::parse(base_url).map_err(|e| e.to_string())?;
    let absolute_url = base.join(link).map_err(|e| e.to_string())?;
    Ok(absolute_url.to_string())
}

pub fn is_parseable(url: &str) -> bool {
    Url::parse(url).is_ok()
}
