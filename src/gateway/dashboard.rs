use super::{read_response, DashboardApi, DashboardRequest, UpstreamError};
use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;

pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Dashboard API client.
///
/// The underlying `reqwest::Client` should be built with a cookie store so the
/// dashboard session cookie rides along with every call.
pub struct DashboardClient {
    http: Client,
    api_root: String,
}

impl DashboardClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_root: format!("{}/api", base_url.trim_end_matches('/')),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }
}

#[async_trait]
impl DashboardApi for DashboardClient {
    async fn send(&self, request: DashboardRequest) -> Result<Value, UpstreamError> {
        let url = self.url(&request.path);
        debug!("{} dashboard {}", request.method, request.path);

        let mut builder = self
            .http
            .request(request.method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = request.csrf_token {
            builder = builder.header(CSRF_HEADER, token);
        }
        if let Some(body) = request.body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(UpstreamError::transport)?;
        read_response(response).await
    }
}
