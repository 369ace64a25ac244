//! Municipal good-price store registry adapters
//!
//! Two registries share the standard `{items, totalCount, pageNo}` logical
//! shape but differ in transport format: the Jeju-si endpoint serves JSON,
//! the Seogwipo-si endpoint serves XML. Both use a query-parameter service
//! key. Records from either set the monotonic good-price flag downstream.

use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tokio_util::sync::CancellationToken;

use crate::domain::restaurant::{RawRecord, Source};
use crate::infrastructure::config::SourceEndpoint;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::sources::tourism::urlencode;
use crate::infrastructure::sources::{FetchError, SourceAdapter, SourcePage};

fn page_url(endpoint: &SourceEndpoint, page_no: u32) -> String {
    format!(
        "{}?serviceKey={}&pageNo={}&numOfRows={}",
        endpoint.base_url,
        urlencode(&endpoint.service_key),
        page_no,
        endpoint.page_size
    )
}

/// Jeju-si registry (JSON)
pub struct GoodPriceJejuAdapter {
    http: Arc<HttpClient>,
    endpoint: SourceEndpoint,
    shutdown: CancellationToken,
}

impl GoodPriceJejuAdapter {
    pub fn new(http: Arc<HttpClient>, endpoint: SourceEndpoint, shutdown: CancellationToken) -> Self {
        Self { http, endpoint, shutdown }
    }
}

#[async_trait]
impl SourceAdapter for GoodPriceJejuAdapter {
    fn source(&self) -> Source {
        Source::GoodPriceJeju
    }

    async fn fetch_page(&self, page_no: u32) -> Result<SourcePage, FetchError> {
        let url = page_url(&self.endpoint, page_no);
        let body = self
            .http
            .get_text_cancellable(&url, &[], &self.shutdown)
            .await?;
        decode_json_page(&body, page_no, self.endpoint.page_size)
    }
}

/// Seogwipo-si registry (XML)
pub struct GoodPriceSeogwipoAdapter {
    http: Arc<HttpClient>,
    endpoint: SourceEndpoint,
    shutdown: CancellationToken,
}

impl GoodPriceSeogwipoAdapter {
    pub fn new(http: Arc<HttpClient>, endpoint: SourceEndpoint, shutdown: CancellationToken) -> Self {
        Self { http, endpoint, shutdown }
    }
}

#[async_trait]
impl SourceAdapter for GoodPriceSeogwipoAdapter {
    fn source(&self) -> Source {
        Source::GoodPriceSeogwipo
    }

    async fn fetch_page(&self, page_no: u32) -> Result<SourcePage, FetchError> {
        let url = page_url(&self.endpoint, page_no);
        let body = self
            .http
            .get_text_cancellable(&url, &[], &self.shutdown)
            .await?;
        decode_xml_page(&body, page_no, self.endpoint.page_size)
    }
}

/// Decodes the JSON registry page.
pub fn decode_json_page(body: &str, page_no: u32, page_size: u32) -> Result<SourcePage, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Schema(format!("invalid JSON: {e}")))?;

    let items = value
        .get("items")
        .and_then(|v| v.as_array())
        .ok_or_else(|| FetchError::Schema("missing 'items' array".to_string()))?;

    let total_count = value
        .get("totalCount")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| FetchError::Schema("missing 'totalCount'".to_string()))? as u32;

    let records: Vec<RawRecord> = items
        .iter()
        .cloned()
        .map(|payload| RawRecord::new(Source::GoodPriceJeju, payload))
        .collect();

    let is_last_page = records.is_empty() || page_no.saturating_mul(page_size) >= total_count;
    Ok(SourcePage { records, total_count, is_last_page })
}

/// Decodes the XML registry page into the same record shape the JSON
/// sources produce: each `<item>` becomes an object keyed by its child
/// element names.
pub fn decode_xml_page(body: &str, page_no: u32, page_size: u32) -> Result<SourcePage, FetchError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut total_count: Option<u32> = None;

    let mut buf = Vec::new();
    let mut current_item: Option<serde_json::Map<String, serde_json::Value>> = None;
    let mut current_field: Option<String> = None;
    let mut saw_items = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "items" => saw_items = true,
                    "item" => current_item = Some(serde_json::Map::new()),
                    _ if current_item.is_some() => current_field = Some(name),
                    "totalCount" => current_field = Some(name),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if let Some(field) = current_field.as_deref() {
                    if let Some(item) = current_item.as_mut() {
                        item.insert(field.to_string(), serde_json::Value::String(text));
                    } else if field == "totalCount" {
                        total_count = text.trim().parse().ok();
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    if let Some(item) = current_item.take() {
                        records.push(RawRecord::new(
                            Source::GoodPriceSeogwipo,
                            serde_json::Value::Object(item),
                        ));
                    }
                }
                current_field = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(FetchError::Schema(format!("malformed XML: {err}"))),
        }
        buf.clear();
    }

    if !saw_items {
        return Err(FetchError::Schema("missing <items> element".to_string()));
    }
    let total_count =
        total_count.ok_or_else(|| FetchError::Schema("missing <totalCount>".to_string()))?;

    let is_last_page =
        records.is_empty() || page_no.saturating_mul(page_size) >= total_count;
    Ok(SourcePage { records, total_count, is_last_page })
}
