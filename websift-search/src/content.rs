//! Page fetch and HTML → text normalisation.
//!
//! Fetches a candidate page, keeps only the `<body>`, drops non-content
//! elements (scripts, styles, navigation), converts the remainder to
//! markdown and normalises whitespace. Paragraph boundaries survive as
//! blank lines because the chunker splits on them first.

use htmd::HtmlToMarkdown;
use scraper::{Html, Selector};

use crate::error::{Result, SearchError};
use crate::types::FetchedPage;

/// Pages larger than this are rejected rather than normalised.
pub const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

/// Elements removed together with their content before conversion.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe",
];

/// Fetch a page body. Only status 200 counts as success.
///
/// # Errors
///
/// Returns [`SearchError::Fetch`] on transport errors, any status other
/// than 200, unreadable bodies, or bodies above [`MAX_PAGE_BYTES`].
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<FetchedPage> {
    tracing::trace!(url, "fetching page");

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SearchError::fetch(url, format!("request failed: {e}")))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(SearchError::fetch(url, format!("HTTP {status}")));
    }

    if let Some(length) = response.content_length() {
        if length > MAX_PAGE_BYTES as u64 {
            return Err(SearchError::fetch(url, format!("body too large ({length} bytes)")));
        }
    }

    // Chunked responses carry no length; stop reading once the cap is passed.
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| SearchError::fetch(url, format!("body read failed: {e}")))?
    {
        if body.len() + chunk.len() > MAX_PAGE_BYTES {
            return Err(SearchError::fetch(
                url,
                format!("body too large (over {MAX_PAGE_BYTES} bytes)"),
            ));
        }
        body.extend_from_slice(&chunk);
    }
    let html = String::from_utf8_lossy(&body).into_owned();

    tracing::trace!(url, bytes = html.len(), "page fetched");
    Ok(FetchedPage {
        url: url.to_owned(),
        html,
    })
}

/// Convert HTML into markdown-flavoured text with normalised whitespace.
///
/// Returns an empty string when nothing readable remains.
pub fn html_to_text(html: &str) -> String {
    let body = select_body(html);
    let converter = HtmlToMarkdown::builder()
        .skip_tags(BOILERPLATE_TAGS.to_vec())
        .build();
    let markdown = converter.convert(&body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "markdown conversion failed, using raw text");
        body_text(&body)
    });
    normalise_whitespace(&markdown)
}

/// Outer HTML of `<body>`, or the whole input when there is none.
fn select_body(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("body") else {
        return html.to_owned();
    };
    document
        .select(&selector)
        .next()
        .map(|body| body.html())
        .unwrap_or_else(|| html.to_owned())
}

/// Plain text of an HTML fragment, one text node per line.
fn body_text(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse whitespace inside each line and keep at most one blank line
/// between non-empty lines.
fn normalise_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_pending = false;
    for line in text.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            blank_pending = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_pending { "\n\n" } else { "\n" });
        }
        blank_pending = false;
        out.push_str(&words.join(" "));
    }
    out
}
