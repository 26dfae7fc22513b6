use super::{read_response, GraphApi, UpstreamError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

/// Graph API client authenticated with a page or app access token.
pub struct GraphClient {
    http: Client,
    root: String,
    access_token: Option<SecretString>,
}

impl GraphClient {
    /// `base_url` is the graph host, `version` the API version segment
    /// (e.g. `v2.8`). An empty version targets the unversioned root.
    pub fn new(
        http: Client,
        base_url: &str,
        version: &str,
        access_token: Option<SecretString>,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        let root = if version.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{version}")
        };
        Self {
            http,
            root,
            access_token,
        }
    }

    fn resolve(&self, path: &str) -> Result<Url, UpstreamError> {
        let token = self.access_token.as_ref().map(|t| t.expose_secret());
        resolve_url(&self.root, path, token)
    }
}

/// Builds the request URL for `path`, appending the access token unless the
/// URL already carries one (paging links do).
pub(crate) fn resolve_url(
    root: &str,
    path: &str,
    token: Option<&str>,
) -> Result<Url, UpstreamError> {
    let raw = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{root}{path}")
    } else {
        format!("{root}/{path}")
    };

    let mut url = Url::parse(&raw).map_err(|e| {
        UpstreamError::new(None, Value::String(format!("invalid graph url {raw}: {e}")))
    })?;

    if let Some(token) = token {
        if !url.query_pairs().any(|(k, _)| k == "access_token") {
            url.query_pairs_mut().append_pair("access_token", token);
        }
    }
    Ok(url)
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn get(&self, path: &str) -> Result<Value, UpstreamError> {
        let url = self.resolve(path)?;
        debug!("GET graph {}", path);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::transport)?;
        read_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://graph.facebook.com/v2.8";

    #[test]
    fn test_relative_path_gets_token() {
        let url = resolve_url(ROOT, "/123/posts?fields=link&pretty=0", Some("tok")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v2.8/123/posts?fields=link&pretty=0&access_token=tok"
        );
    }

    #[test]
    fn test_batch_path_keeps_root_slash() {
        let url = resolve_url(ROOT, "/?ids=1,2&fields=name", None).unwrap();
        assert_eq!(url.path(), "/v2.8/");
        assert_eq!(url.query(), Some("ids=1,2&fields=name"));
    }

    #[test]
    fn test_absolute_paging_url_is_used_verbatim() {
        let next =
            "https://graph.facebook.com/v2.8/123/posts?fields=link&access_token=abc&after=XYZ";
        let url = resolve_url(ROOT, next, Some("other")).unwrap();
        assert_eq!(url.as_str(), next);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = resolve_url("not a url", "/x", None).unwrap_err();
        assert_eq!(err.status, None);
    }
}
