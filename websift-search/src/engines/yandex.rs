//! Yandex Search XML API backend.
//!
//! The response is an XML document whose organic hits are nested as
//! `response/results/grouping/group/doc`. Each `doc` carries `url`,
//! `domain` and `properties/extended-text`; the extended text may contain
//! `<hlword>` highlight markup, which is flattened into plain text.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::config::YandexSettings;
use crate::engine::{RequestOptions, SearchBackend, SearchRequest};
use crate::error::SearchError;
use crate::types::{Provider, SearchHit};

/// Public Yandex XML endpoint.
pub const YANDEX_ENDPOINT: &str = "https://yandex.ru/search/xml";

/// Grouping mode: group by domain, five groups per page, three docs each.
const GROUP_BY: &str = "attr=d.mode=deep.groups-on-page=5.docs-in-group=3";

/// Yandex reports "nothing found" as error code 15 inside a 200 response.
const NO_RESULTS_CODE: &str = "15";

/// Yandex XML search adapter.
#[derive(Debug, Clone)]
pub struct YandexBackend {
    settings: YandexSettings,
}

impl YandexBackend {
    /// Create an adapter from resolved settings.
    pub fn new(settings: YandexSettings) -> Self {
        Self { settings }
    }
}

impl SearchBackend for YandexBackend {
    fn provider(&self) -> Provider {
        Provider::Yandex
    }

    fn build_request(&self, query: &str, options: &RequestOptions) -> SearchRequest {
        let endpoint = self
            .settings
            .endpoint
            .clone()
            .unwrap_or_else(|| YANDEX_ENDPOINT.to_owned());

        SearchRequest {
            endpoint,
            params: vec![
                ("folderid", self.settings.folder_id.clone()),
                ("apikey", self.settings.api_key.clone()),
                ("query", query.to_owned()),
                ("lr", self.settings.region.to_string()),
                ("l10n", self.settings.lang.clone()),
                ("sortby", "rlv".to_owned()),
                ("filter", "strict".to_owned()),
                ("maxpassages", "3".to_owned()),
                ("groupby", GROUP_BY.to_owned()),
                ("page", options.page.to_string()),
            ],
        }
    }

    fn parse_response(&self, body: &str) -> Result<Vec<SearchHit>, SearchError> {
        parse_yandex_xml(body)
    }
}

/// Which `doc` child the current text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Url,
    Domain,
    ExtendedText,
}

#[derive(Default)]
struct DocBuilder {
    url: String,
    domain: String,
    extended_text: String,
}

impl DocBuilder {
    fn push(&mut self, field: Field, text: &str) {
        match field {
            Field::Url => self.url.push_str(text),
            Field::Domain => self.domain.push_str(text),
            Field::ExtendedText => self.extended_text.push_str(text),
        }
    }

    fn finish(self) -> Option<SearchHit> {
        let url = self.url.trim();
        if url.is_empty() {
            return None;
        }
        Some(SearchHit {
            url: url.to_owned(),
            domain: non_empty(&self.domain),
            snippet: non_empty(&self.extended_text),
        })
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Map the element path inside a `doc` to the field it feeds.
fn field_for(path: &[String]) -> Option<Field> {
    let doc_at = path.iter().rposition(|tag| tag == "doc")?;
    match &path[doc_at + 1..] {
        [tag] if tag == "url" => Some(Field::Url),
        [tag] if tag == "domain" => Some(Field::Domain),
        [props, tag, ..] if props == "properties" && tag == "extended-text" => {
            Some(Field::ExtendedText)
        }
        _ => None,
    }
}

/// Parse a Yandex XML response into hits.
///
/// Extracted as a separate function for testability with fixture XML.
fn parse_yandex_xml(xml: &str) -> Result<Vec<SearchHit>, SearchError> {
    let provider = Provider::Yandex.name();
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<String> = Vec::new();
    let mut current: Option<DocBuilder> = None;
    let mut error: Option<(String, String)> = None;
    let mut hits = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if tag == "doc" && path.last().is_some_and(|parent| parent == "group") {
                    current = Some(DocBuilder::default());
                }
                if tag == "error" && path.last().is_some_and(|parent| parent == "response") {
                    let code = e
                        .attributes()
                        .filter_map(Result::ok)
                        .find(|attr| attr.key.as_ref() == b"code")
                        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
                        .unwrap_or_default();
                    error = Some((code, String::new()));
                }
                path.push(tag);
            }
            Ok(Event::End(_)) => {
                if let Some(tag) = path.pop() {
                    if tag == "doc" && path.last().is_some_and(|parent| parent == "group") {
                        if let Some(hit) = current.take().and_then(DocBuilder::finish) {
                            hits.push(hit);
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| SearchError::backend(provider, format!("bad XML text: {err}")))?;
                if path.last().is_some_and(|tag| tag == "error") {
                    if let Some((_, ref mut message)) = error {
                        message.push_str(&text);
                    }
                } else if let (Some(doc), Some(field)) = (current.as_mut(), field_for(&path)) {
                    doc.push(field, &text);
                }
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                let text = String::from_utf8_lossy(&bytes);
                if let (Some(doc), Some(field)) = (current.as_mut(), field_for(&path)) {
                    doc.push(field, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(SearchError::backend(
                    provider,
                    format!("malformed XML at position {}: {err}", reader.buffer_position()),
                ));
            }
            _ => {}
        }
    }

    if let Some((code, message)) = error {
        if code == NO_RESULTS_CODE {
            tracing::debug!("Yandex reported no results");
            return Ok(Vec::new());
        }
        return Err(SearchError::backend(
            provider,
            format!("API error {code}: {}", message.trim()),
        ));
    }

    tracing::debug!(count = hits.len(), "Yandex results parsed");
    Ok(hits)
}
