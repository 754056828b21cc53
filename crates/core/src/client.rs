//! Authenticated, cancellable JSON client used by the backends.

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::DiskCache;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::{Error, Result};

/// Outcome of a lookup where a missing resource is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// The resource exists.
    Found(Page<T>),
    /// The API answered 404.
    NotFound,
}

/// A decoded response body plus the pagination link, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Decoded body.
    pub value: T,
    /// URL of the next page from the `Link` header.
    pub next: Option<String>,
}

/// HTTP client shared by one provider for one resolution.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Option<SecretString>,
    headers: Vec<(String, String)>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("authenticated", &self.token.is_some())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client over `transport`.
    ///
    /// A configured `token` is sent as `Authorization: Bearer <token>`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, token: Option<SecretString>) -> Self {
        if token.is_some() {
            debug!("auth token provided");
        }
        Self {
            transport,
            token,
            headers: Vec::new(),
        }
    }

    /// Create a client whose transport is wrapped in the disk cache for `id`.
    #[must_use]
    pub fn cached<T>(transport: T, metadata_dir: &Path, id: &str, token: Option<SecretString>) -> Self
    where
        T: Transport + 'static,
    {
        let cache = DiskCache::new(transport, metadata_dir, id);
        debug!(dir = ?cache.dir(), "Using response cache");
        Self::new(Arc::new(cache), token)
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether a token is attached.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// GET `url` and decode a JSON body; 404 is reported as [`Fetched::NotFound`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Fetched<T>> {
        let response = self.send(url, cancel).await?;

        if response.status == 404 {
            debug!(%url, "Not found");
            return Ok(Fetched::NotFound);
        }
        if !response.is_success() {
            return Err(Error::status(url, response.status, status_message(&response)));
        }

        let value = serde_json::from_slice(&response.body)
            .map_err(|e| Error::status(url, response.status, format!("invalid JSON: {e}")))?;
        let next = response.header("link").and_then(next_link);

        Ok(Fetched::Found(Page { value, next }))
    }

    async fn send(&self, url: &str, cancel: &CancellationToken) -> Result<HttpResponse> {
        let mut request = HttpRequest::get(url).header("Accept", "application/json");
        for (name, value) in &self.headers {
            request = request.header(name.clone(), value.clone());
        }
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token.expose_secret()));
        }

        debug!(%url, "Requesting");
        cancellable(cancel, self.transport.get(&request)).await
    }
}

/// Run `fut` unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

fn status_message(response: &HttpResponse) -> String {
    #[derive(serde::Deserialize)]
    struct ApiMessage {
        message: String,
    }

    serde_json::from_slice::<ApiMessage>(&response.body)
        .map(|m| format!("HTTP {}: {}", response.status, m.message))
        .unwrap_or_else(|_| format!("HTTP {}", response.status))
}

/// Append percent-encoded path `segments` and `query` pairs to `base`.
///
/// A segment containing `/` stays one segment (`group/project` becomes
/// `group%2Fproject`), which is how GitLab addresses projects and tags.
pub fn join_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|e| Error::config(format!("invalid base URL '{base}': {e}"), "Use a full http(s) URL"))?;
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("base URL '{base}' cannot have a path"), "Use a full http(s) URL"))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.to_string())
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
#[must_use]
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            p.trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(String::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for Recording {
        async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    struct Hanging;

    #[async_trait]
    impl Transport for Hanging {
        async fn get(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            std::future::pending::<()>().await;
            Ok(HttpResponse::default())
        }
    }

    fn client(response: HttpResponse, token: Option<&str>) -> (Arc<Recording>, ApiClient) {
        let transport = Arc::new(Recording {
            response,
            ..Recording::default()
        });
        let client = ApiClient::new(transport.clone(), token.map(SecretString::from));
        (transport, client)
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Tag {
        tag_name: String,
    }

    #[tokio::test]
    async fn test_get_json_decodes_body_and_next_link() -> Result<()> {
        let response = HttpResponse::new(200, r#"{"tag_name":"v1.2.3"}"#).with_header(
            "Link",
            r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=5>; rel="last""#,
        );
        let (_, client) = client(response, None);

        let fetched = client
            .get_json::<Tag>("https://api.github.com/x", &CancellationToken::new())
            .await?;
        let Fetched::Found(page) = fetched else {
            panic!("expected a page");
        };
        assert_eq!(page.value.tag_name, "v1.2.3");
        assert_eq!(page.next.as_deref(), Some("https://api.github.com/x?page=2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_json_maps_404() -> Result<()> {
        let (_, client) = client(HttpResponse::new(404, r#"{"message":"Not Found"}"#), None);
        let fetched = client
            .get_json::<Tag>("https://api.github.com/x", &CancellationToken::new())
            .await?;
        assert_eq!(fetched, Fetched::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_json_other_status_is_transport_error() {
        let (_, client) = client(
            HttpResponse::new(403, r#"{"message":"API rate limit exceeded"}"#),
            None,
        );
        let err = client
            .get_json::<Tag>("https://api.github.com/x", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::Transport {
                status, message, ..
            } => {
                assert_eq!(status, Some(403));
                assert!(message.contains("rate limit"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_json_invalid_body() {
        let (_, client) = client(HttpResponse::new(200, "<html>"), None);
        let err = client
            .get_json::<Tag>("https://api.github.com/x", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[tokio::test]
    async fn test_bearer_token_and_headers_are_sent() -> Result<()> {
        let (transport, client) = client(HttpResponse::new(200, r#"{"tag_name":"v1"}"#), Some("secret"));
        let client = client.with_header("X-GitHub-Api-Version", "2022-11-28");
        assert!(client.is_authenticated());

        client
            .get_json::<Tag>("https://api.github.com/x", &CancellationToken::new())
            .await?;

        let seen = transport.seen.lock().unwrap().clone();
        assert_eq!(seen[0].header_value("Authorization"), Some("Bearer secret"));
        assert_eq!(seen[0].header_value("X-GitHub-Api-Version"), Some("2022-11-28"));
        assert_eq!(seen[0].header_value("Accept"), Some("application/json"));
        Ok(())
    }

    #[tokio::test]
    async fn test_no_token_no_authorization_header() -> Result<()> {
        let (transport, client) = client(HttpResponse::new(200, r#"{"tag_name":"v1"}"#), None);
        client
            .get_json::<Tag>("https://api.github.com/x", &CancellationToken::new())
            .await?;
        let seen = transport.seen.lock().unwrap().clone();
        assert!(seen[0].header_value("Authorization").is_none());
        Ok(())
    }

    #[test]
    fn test_debug_hides_token() {
        let (_, client) = client(HttpResponse::default(), Some("supersecret"));
        let debug = format!("{client:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("authenticated: true"));
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (transport, client) = client(HttpResponse::new(200, "{}"), None);

        let err = client
            .get_json::<Tag>("https://api.github.com/x", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_request() {
        let client = ApiClient::new(Arc::new(Hanging), None);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = client
            .get_json::<Tag>("https://api.github.com/x", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_join_url() -> Result<()> {
        assert_eq!(
            join_url("https://api.github.com", &["repos", "cli", "cli", "releases"], &[("per_page", "100")])?,
            "https://api.github.com/repos/cli/cli/releases?per_page=100"
        );
        assert_eq!(
            join_url("https://ghe.example.com/api/v3/", &["repos", "o", "r"], &[])?,
            "https://ghe.example.com/api/v3/repos/o/r"
        );
        assert_eq!(
            join_url("https://gitlab.com/api/v4", &["projects", "group/sub/tool", "releases", "v1.0.0"], &[])?,
            "https://gitlab.com/api/v4/projects/group%2Fsub%2Ftool/releases/v1.0.0"
        );
        assert!(join_url("not a url", &["x"], &[]).is_err());
        Ok(())
    }

    #[test]
    fn test_next_link() {
        assert_eq!(
            next_link(r#"<https://a/x?page=3>; rel="next""#).as_deref(),
            Some("https://a/x?page=3")
        );
        assert_eq!(
            next_link(r#"<https://a/x?page=1>; rel="prev", <https://a/x?page=3>; rel="next""#)
                .as_deref(),
            Some("https://a/x?page=3")
        );
        assert!(next_link(r#"<https://a/x?page=1>; rel="first""#).is_none());
        assert!(next_link("").is_none());
    }
}
