//! Ref listing endpoint.

use tracing::debug;
use url::Url;

use super::client::ApiClient;
use super::types::{ApiError, RefListing};
use crate::domain::RefSet;

impl ApiClient {
    /// List the refs of a server via `GET /ref/`.
    ///
    /// An empty body (or JSON `null`) is an empty listing. The refs keep the
    /// order the server sent them in.
    pub async fn fetch_refs(&self, server: &Url) -> Result<RefSet, ApiError> {
        let listing: Option<Option<RefListing>> = self.get_json(server, &["ref", ""]).await?;
        let refs = listing.flatten().map(|l| l.0).unwrap_or_default();
        debug!("Fetched {} ref(s) from {}", refs.len(), server);
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::parse_server_url;
    use crate::api::http::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ApiClient {
        ApiClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap()
    }

    async fn serve_refs(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ref/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_listing() {
        let server = serve_refs("").await;
        let base = parse_server_url(&server.uri()).unwrap();
        let refs = client().fetch_refs(&base).await.unwrap();
        assert!(refs.is_empty());
    }

    #[tokio::test]
    async fn test_null_body_is_empty_listing() {
        let server = serve_refs("null\n").await;
        let base = parse_server_url(&server.uri()).unwrap();
        let refs = client().fetch_refs(&base).await.unwrap();
        assert!(refs.is_empty());
    }

    #[tokio::test]
    async fn test_listing_in_server_order() {
        let server =
            serve_refs(r#"{"refs/heads/master":"sha256:aa","refs/heads/feature":"sha256:bb"}"#)
                .await;
        let base = parse_server_url(&server.uri()).unwrap();
        let refs = client().fetch_refs(&base).await.unwrap();

        assert_eq!(refs.len(), 2);
        assert_eq!(refs.get("refs/heads/master").unwrap().hash, "sha256:aa");
        assert_eq!(refs.default_ref(None).unwrap().name, "refs/heads/feature");
    }

    #[tokio::test]
    async fn test_not_implemented_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ref/"))
            .respond_with(ResponseTemplate::new(501).set_body_string("Not Implemented"))
            .mount(&server)
            .await;

        let base = parse_server_url(&server.uri()).unwrap();
        let err = client().fetch_refs(&base).await.unwrap_err();
        assert_eq!(err.status(), Some(501));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_malformed_listing_is_decode_error() {
        let server = serve_refs("{not json").await;
        let base = parse_server_url(&server.uri()).unwrap();
        let err = client().fetch_refs(&base).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
