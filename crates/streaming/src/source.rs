//! Upstream data sources.
//!
//! Both services are reached through dyn-compatible traits so the load queue
//! and the session can be driven by mocks in tests:
//! - [`BoundarySource`]: sub-region polygons from a geocoder.
//! - [`LeadSource`]: per-postal-code lead metrics.

use std::future::Future;
use std::pin::Pin;

use foundation::RegionKey;
use tracing::debug;

use crate::protocol::{BoundaryRecord, GeocodeHit, LeadQuery, LeadRecord};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

pub trait BoundarySource: Send + Sync {
    /// Best-match boundary for `key`.
    ///
    /// Returns `Ok(None)` when the geocoder has no areal match; that is not an
    /// error. Returns `Err` on transport failures and malformed responses.
    fn fetch_boundary<'a>(
        &'a self,
        key: &'a RegionKey,
    ) -> BoxFuture<'a, Result<Option<BoundaryRecord>, SourceError>>;
}

pub trait LeadSource: Send + Sync {
    fn fetch_leads<'a>(
        &'a self,
        query: &'a LeadQuery,
    ) -> BoxFuture<'a, Result<Vec<LeadRecord>, SourceError>>;
}

/// Nominatim-compatible geocoder.
pub struct HttpBoundarySource {
    base_url: String,
    provider: String,
    client: reqwest::Client,
}

impl HttpBoundarySource {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            provider: "nominatim".to_string(),
            client,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

impl BoundarySource for HttpBoundarySource {
    fn fetch_boundary<'a>(
        &'a self,
        key: &'a RegionKey,
    ) -> BoxFuture<'a, Result<Option<BoundaryRecord>, SourceError>> {
        Box::pin(async move {
            let url = self.search_url();
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("county", key.name.as_str()),
                    ("state", key.parent_area.as_str()),
                    ("format", "json"),
                    ("polygon_geojson", "1"),
                    ("limit", "1"),
                ])
                .send()
                .await?;
            let body = read_json_list(resp, &url).await?;

            let Some(first) = body.into_iter().next() else {
                debug!("geocoder has no match for {key}");
                return Ok(None);
            };
            let hit: GeocodeHit = serde_json::from_value(first)
                .map_err(|e| SourceError::Malformed(format!("geocode hit: {e}")))?;
            Ok(hit.into_boundary(key.clone(), &self.provider))
        })
    }
}

/// Lead metrics endpoint (`GET {base}/leads`).
pub struct HttpLeadSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLeadSource {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

impl LeadSource for HttpLeadSource {
    fn fetch_leads<'a>(
        &'a self,
        query: &'a LeadQuery,
    ) -> BoxFuture<'a, Result<Vec<LeadRecord>, SourceError>> {
        Box::pin(async move {
            let url = format!("{}/leads", self.base_url.trim_end_matches('/'));
            let resp = self
                .client
                .get(&url)
                .query(&query.query_pairs())
                .send()
                .await?;
            let body = read_json_list(resp, &url).await?;
            decode_leads(body)
        })
    }
}

async fn read_json_list(
    resp: reqwest::Response,
    url: &str,
) -> Result<Vec<serde_json::Value>, SourceError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let value: serde_json::Value = resp.json().await?;
    expect_list(value)
}

/// Upstream responses must be JSON arrays.
pub fn expect_list(value: serde_json::Value) -> Result<Vec<serde_json::Value>, SourceError> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        other => Err(SourceError::Malformed(format!(
            "expected a list, got {}",
            json_kind(&other)
        ))),
    }
}

pub fn decode_leads(items: Vec<serde_json::Value>) -> Result<Vec<LeadRecord>, SourceError> {
    items
        .into_iter()
        .map(|v| {
            serde_json::from_value(v)
                .map_err(|e| SourceError::Malformed(format!("lead record: {e}")))
        })
        .collect()
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{SourceError, decode_leads, expect_list};
    use serde_json::json;

    #[test]
    fn non_list_is_malformed() {
        let err = expect_list(json!({ "error": "nope" })).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(ref m) if m.contains("object")));
        assert_eq!(expect_list(json!([])).unwrap().len(), 0);
    }

    #[test]
    fn decodes_lead_list() {
        let items = expect_list(json!([
            { "postalCode": "78701", "requests": 3 },
            { "postalCode": "78702", "requests": 5, "campaign": "solar" }
        ]))
        .unwrap();
        let leads = decode_leads(items).unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[1].campaign, "solar");
    }

    #[test]
    fn bad_record_is_malformed() {
        let items = expect_list(json!([{ "requests": 3 }])).unwrap();
        assert!(matches!(
            decode_leads(items),
            Err(SourceError::Malformed(_))
        ));
    }
}
