//! Tourism-content API adapter (JSON)
//!
//! Provincial visit-Jeju style endpoint: service key as a query parameter,
//! `{items: [...], totalCount, pageNo}` response shape.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::restaurant::{RawRecord, Source};
use crate::infrastructure::config::SourceEndpoint;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::sources::{FetchError, SourceAdapter, SourcePage};

pub struct TourismApiAdapter {
    http: Arc<HttpClient>,
    endpoint: SourceEndpoint,
    shutdown: CancellationToken,
}

impl TourismApiAdapter {
    pub fn new(http: Arc<HttpClient>, endpoint: SourceEndpoint, shutdown: CancellationToken) -> Self {
        Self { http, endpoint, shutdown }
    }

    fn page_url(&self, page_no: u32) -> String {
        format!(
            "{}?serviceKey={}&pageNo={}&numOfRows={}",
            self.endpoint.base_url,
            urlencode(&self.endpoint.service_key),
            page_no,
            self.endpoint.page_size
        )
    }
}

#[async_trait]
impl SourceAdapter for TourismApiAdapter {
    fn source(&self) -> Source {
        Source::TourismApi
    }

    async fn fetch_page(&self, page_no: u32) -> Result<SourcePage, FetchError> {
        let body = self
            .http
            .get_text_cancellable(&self.page_url(page_no), &[], &self.shutdown)
            .await?;
        decode_page(&body, page_no, self.endpoint.page_size)
    }
}

/// Decodes one `{items, totalCount, pageNo}` payload. Pure; exercised on
/// fixture payloads in tests.
pub fn decode_page(body: &str, page_no: u32, page_size: u32) -> Result<SourcePage, FetchError> {
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

    let records = items
        .iter()
        .cloned()
        .map(|payload| RawRecord::new(Source::TourismApi, payload))
        .collect::<Vec<_>>();

    let is_last_page = records.is_empty() || page_no.saturating_mul(page_size) >= total_count;

    Ok(SourcePage { records, total_count, is_last_page })
}

/// Minimal percent-encoding for the service key; registry keys contain
/// '+' and '=' which must not survive into the query string raw.
pub(crate) fn urlencode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_FIXTURE: &str = r#"{
        "items": [
            {"contentsid": "CONT_000001", "title": "올래국수", "roadaddress": "제주특별자치도 제주시 귀아랑길 24",
             "latitude": 33.4890, "longitude": 126.4983, "phoneno": "064-742-7355", "alltag": "고기국수,국수,향토음식"},
            {"contentsid": "CONT_000002", "title": "삼대국수회관", "roadaddress": "제주특별자치도 제주시 삼성로 41",
             "latitude": "33.5070", "longitude": "126.5288", "phoneno": "", "alltag": "국수,몸국"}
        ],
        "totalCount": 2,
        "pageNo": 1
    }"#;

    #[test]
    fn decodes_items_and_total() {
        let page = decode_page(PAGE_FIXTURE, 1, 100).expect("fixture decodes");
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total_count, 2);
        assert!(page.is_last_page);
        assert_eq!(page.records[0].source, Source::TourismApi);
        assert_eq!(page.records[0].str_field("title"), Some("올래국수"));
    }

    #[test]
    fn not_last_page_when_total_exceeds_window() {
        let body = r#"{"items": [{"contentsid": "C1", "title": "x"}], "totalCount": 500, "pageNo": 1}"#;
        let page = decode_page(body, 1, 100).expect("decodes");
        assert!(!page.is_last_page);
    }

    #[test]
    fn missing_items_is_a_schema_error() {
        let err = decode_page(r#"{"totalCount": 3}"#, 1, 100).unwrap_err();
        assert!(matches!(err, FetchError::Schema(_)));
    }

    #[test]
    fn malformed_json_is_a_schema_error() {
        let err = decode_page("<html>maintenance</html>", 1, 100).unwrap_err();
        assert!(matches!(err, FetchError::Schema(_)));
    }

    #[test]
    fn service_key_is_percent_encoded() {
        assert_eq!(urlencode("a+b=c"), "a%2Bb%3Dc");
        assert_eq!(urlencode("plainKey09"), "plainKey09");
    }
}
