use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;

/// HTTP client for a PostgREST style API, authenticated with a service key
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Self::build_client(api_key, user_agent, timeout)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub async fn get(&self, table: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let request = self.client.get(self.table_url(table)).query(query);
        Self::send(request).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
        return_rows: bool,
    ) -> Result<reqwest::Response> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", Self::prefer(return_rows))
            .json(body);
        Self::send(request).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<reqwest::Response> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(query)
            .header("Prefer", Self::prefer(true))
            .json(body);
        Self::send(request).await
    }

    fn prefer(return_rows: bool) -> &'static str {
        if return_rows {
            "return=representation"
        } else {
            "return=minimal"
        }
    }

    fn build_client(api_key: &str, user_agent: &str, timeout: Duration) -> Result<Client> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("API key is not a valid header value")?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response> {
        request.send().await.context("Failed to send request to store")
    }
}
