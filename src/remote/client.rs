//! HTTP client for the Supabase REST and Storage APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use super::error::{RemoteError, RemoteResult};
use super::query::{encode_params, Filter, RowQuery};
use super::RemoteStore;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("legal-migrate/", env!("CARGO_PKG_VERSION"));

/// Supabase client authenticated with a single service key.
///
/// The key is sent both as the `apikey` header and as a bearer token.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> RemoteResult<Self> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RemoteError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                parsed.scheme(),
                base_url
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// REST endpoint for `table` with an encoded query string.
    fn rest_url(&self, table: &str, query: &str) -> RemoteResult<Url> {
        let mut url = format!("{}/rest/v1/{}", self.base_url, table);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        Ok(Url::parse(&url)?)
    }

    /// Storage endpoint for an object.
    fn object_url(&self, bucket: &str, key: &str) -> RemoteResult<Url> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            bucket,
            encode_object_key(key)
        );
        Ok(Url::parse(&url)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

/// Fail with the status and the head of the body on any non-2xx response.
async fn ensure_success(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::status(status.as_u16(), &body))
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    async fn fetch_rows(&self, query: &RowQuery) -> RemoteResult<Vec<serde_json::Value>> {
        let url = self.rest_url(query.table_name(), &query.to_query_string())?;
        debug!("GET {}", url);

        let response = self
            .authorized(self.client.get(url))
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.bytes().await?;
        let rows: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
        debug!("{} rows from {}", rows.len(), query.table_name());
        Ok(rows)
    }

    async fn update_row(
        &self,
        table: &str,
        fields: &serde_json::Value,
        matching: &[Filter],
    ) -> RemoteResult<u16> {
        let params: Vec<(String, String)> = matching.iter().map(Filter::to_param).collect();
        let url = self.rest_url(table, &encode_params(&params))?;
        debug!("PATCH {}", url);

        let response = self
            .authorized(self.client.patch(url))
            .header("Prefer", "return=minimal")
            .json(fields)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.status().as_u16())
    }

    async fn download_object(&self, bucket: &str, key: &str) -> RemoteResult<Vec<u8>> {
        let url = self.object_url(bucket, key)?;
        debug!("GET {}", url);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Percent-encode a storage key, keeping `/` as the path separator.
pub fn encode_object_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
