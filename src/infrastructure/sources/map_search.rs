//! Commercial map-search API adapter (JSON)
//!
//! Kakao-local style endpoint: REST key in an Authorization header,
//! `{documents: [...], meta: {total_count, is_end}}` response shape,
//! keyword search anchored on a configured center coordinate.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::restaurant::{RawRecord, Source};
use crate::infrastructure::config::MapSearchEndpoint;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::sources::tourism::urlencode;
use crate::infrastructure::sources::{FetchError, SourceAdapter, SourcePage};

pub struct MapSearchAdapter {
    http: Arc<HttpClient>,
    endpoint: MapSearchEndpoint,
    shutdown: CancellationToken,
}

impl MapSearchAdapter {
    pub fn new(
        http: Arc<HttpClient>,
        endpoint: MapSearchEndpoint,
        shutdown: CancellationToken,
    ) -> Self {
        Self { http, endpoint, shutdown }
    }

    fn page_url(&self, page_no: u32) -> String {
        format!(
            "{}?query={}&x={}&y={}&radius={}&page={}&size={}&sort=accuracy",
            self.endpoint.base_url,
            urlencode(&self.endpoint.query),
            self.endpoint.center_longitude,
            self.endpoint.center_latitude,
            self.endpoint.radius_meters,
            page_no,
            self.endpoint.page_size
        )
    }
}

#[async_trait]
impl SourceAdapter for MapSearchAdapter {
    fn source(&self) -> Source {
        Source::MapSearch
    }

    async fn fetch_page(&self, page_no: u32) -> Result<SourcePage, FetchError> {
        let auth = format!("KakaoAK {}", self.endpoint.rest_api_key);
        let headers = [("Authorization", auth.as_str())];
        let body = self
            .http
            .get_text_cancellable(&self.page_url(page_no), &headers, &self.shutdown)
            .await?;
        decode_page(&body)
    }
}

/// Decodes one `{documents, meta}` payload.
pub fn decode_page(body: &str) -> Result<SourcePage, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Schema(format!("invalid JSON: {e}")))?;

    let documents = value
        .get("documents")
        .and_then(|v| v.as_array())
        .ok_or_else(|| FetchError::Schema("missing 'documents' array".to_string()))?;

    let meta = value
        .get("meta")
        .ok_or_else(|| FetchError::Schema("missing 'meta' object".to_string()))?;

    let total_count = meta
        .get("total_count")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| FetchError::Schema("missing 'meta.total_count'".to_string()))?
        as u32;

    let is_last_page = meta
        .get("is_end")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(documents.is_empty());

    let records = documents
        .iter()
        .cloned()
        .map(|payload| RawRecord::new(Source::MapSearch, payload))
        .collect();

    Ok(SourcePage { records, total_count, is_last_page })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_FIXTURE: &str = r#"{
        "documents": [
            {"id": "27338954", "place_name": "돈사돈 본점", "category_name": "음식점 > 한식 > 육류,고기",
             "phone": "064-746-8989", "road_address_name": "제주 제주시 우평로 19", "x": "126.4752", "y": "33.4802"},
            {"id": "8123345", "place_name": "자매국수", "category_name": "음식점 > 한식 > 국수",
             "phone": "064-727-1112", "road_address_name": "제주 제주시 항골남길 46", "x": "126.4632", "y": "33.4996"}
        ],
        "meta": {"total_count": 45, "pageable_count": 45, "is_end": false}
    }"#;

    #[test]
    fn decodes_documents_and_meta() {
        let page = decode_page(PAGE_FIXTURE).expect("fixture decodes");
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total_count, 45);
        assert!(!page.is_last_page);
        assert_eq!(page.records[0].str_field("place_name"), Some("돈사돈 본점"));
    }

    #[test]
    fn is_end_true_marks_last_page() {
        let body = r#"{"documents": [], "meta": {"total_count": 2, "is_end": true}}"#;
        let page = decode_page(body).expect("decodes");
        assert!(page.is_last_page);
        assert!(page.records.is_empty());
    }

    #[test]
    fn missing_meta_is_a_schema_error() {
        let err = decode_page(r#"{"documents": []}"#).unwrap_err();
        assert!(matches!(err, FetchError::Schema(_)));
    }
}
