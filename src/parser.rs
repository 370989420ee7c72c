use scraper::{Html, Selector};

pub const UNTITLED: &str = "No Title";

/// Anchor hrefs and title pulled from one HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub title: String,
    pub links: Vec<String>,
}

/// Parse the document once and extract both the title and the anchor hrefs.
pub fn parse_page(html_body: &str) -> ParsedPage {
    let document = Html::parse_document(html_body);
    ParsedPage {
        title: title_of(&document),
        links: links_of(&document),
    }
}

/// Extract all hyperlink URLs from HTML content
///
/// # Examples
/// ```
/// use pdf_harvester::parser::extract_links;
///
/// let html = r#"<html><body><a href="/files/report.pdf">Report</a></body></html>"#;
/// let links = extract_links(html);
/// assert_eq!(links, vec!["/files/report.pdf"]);
/// ```
pub fn extract_links(html_body: &str) -> Vec<String> {
    links_of(&Html::parse_document(html_body))
}

/// Trimmed `<title>` text, or [`UNTITLED`] when it is missing or blank.
pub fn extract_title(html_body: &str) -> String {
    title_of(&Html::parse_document(html_body))
}

fn links_of(document: &Html) -> Vec<String> {
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            let cleaned_href = href.trim();

            // Skip empty links, javascript links, mailto, tel, etc.
            if !cleaned_href.is_empty()
                && !cleaned_href.starts_with("javascript:")
                && !cleaned_href.starts_with("mailto:")
                && !cleaned_href.starts_with("tel:")
                && !cleaned_href.starts_with("data:")
            {
                links.push(cleaned_href.to_string());
            }
        }
    }

    links
}

fn title_of(document: &Html) -> String {
    let selector = match Selector::parse("title") {
        Ok(selector) => selector,
        Err(_) => return UNTITLED.to_string(),
    };

    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mixed_links() {
        let html = "<html><body><a href=\"https://example.com/page1\">Link 1</a><a href=\"/docs/a.pdf\">PDF</a><a href=\"#section\">Anchor</a></body></html>";

        let links = extract_links(html);
        let expected = vec![
            "https://example.com/page1".to_string(),
            "/docs/a.pdf".to_string(),
            "#section".to_string(),
        ];

        assert_eq!(links, expected);
    }

    #[test]
    fn test_skips_script_and_mail_links() {
        let html = "<a href=\"javascript:void(0)\">x</a><a href=\"mailto:a@b.c\">m</a><a href=\"  \">blank</a><a href=\" /ok \">ok</a>";
        assert_eq!(extract_links(html), vec!["/ok".to_string()]);
    }

    #[test]
    fn test_malformed_html() {
        let html = "<html><body><a href=\"https://example.com\">Valid Link</a><a href=\"https://broken.com\">Broken Link<div>Unclosed div<p>Some text without closing tag</body></html>";

        let links = extract_links(html);
        let expected = vec![
            "https://example.com".to_string(),
            "https://broken.com".to_string(),
        ];

        assert_eq!(links, expected);
    }

    #[test]
    fn test_empty_html() {
        assert!(extract_links("").is_empty());
        assert_eq!(extract_title(""), UNTITLED);
    }

    #[test]
    fn test_title_is_trimmed() {
        let html = "<html><head><title>\n  Regulations Index  \n</title></head><body></body></html>";
        assert_eq!(extract_title(html), "Regulations Index");
    }

    #[test]
    fn test_blank_title_falls_back() {
        let html = "<html><head><title>   </title></head></html>";
        assert_eq!(extract_title(html), UNTITLED);
    }

    #[test]
    fn test_parse_page_collects_both() {
        let html = "<html><head><title>T</title></head><body><a href=\"/a\">a</a><a href=\"/a\">again</a></body></html>";
        let page = parse_page(html);
        assert_eq!(page.title, "T");
        assert_eq!(page.links, vec!["/a".to_string(), "/a".to_string()]);
    }
}
