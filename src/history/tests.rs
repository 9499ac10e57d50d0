//! Tests for history traversal.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::{ApiClient, ApiError, ObjectSource, RetryPolicy, ServerConnection};
    use crate::domain::Checkpoint;
    use crate::history::{fetch_history, HistoryEnd, HistoryWalker};

    enum Entry {
        Found(Vec<&'static str>),
        Empty,
        Fails,
    }

    /// In-memory object database that records every hash requested.
    #[derive(Default)]
    struct MemorySource {
        objects: HashMap<String, Entry>,
        requested: Mutex<Vec<String>>,
    }

    impl MemorySource {
        fn with(mut self, hash: &str, entry: Entry) -> Self {
            self.objects.insert(hash.to_string(), entry);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectSource for MemorySource {
        async fn fetch_checkpoint(&self, hash: &str) -> Result<Option<Checkpoint>, ApiError> {
            self.requested.lock().unwrap().push(hash.to_string());
            match self.objects.get(hash) {
                Some(Entry::Found(parents)) => Ok(Some(Checkpoint {
                    hash: hash.to_string(),
                    parent_hashes: parents.iter().map(|p| p.to_string()).collect(),
                    ..Default::default()
                })),
                Some(Entry::Empty) => Ok(None),
                Some(Entry::Fails) | None => Err(ApiError::Status {
                    url: format!("memory:///obj/{}", hash),
                    status: 500,
                    body: String::new(),
                }),
            }
        }
    }

    fn hashes(checkpoints: &[Checkpoint]) -> Vec<&str> {
        checkpoints.iter().map(|c| c.hash.as_str()).collect()
    }

    #[tokio::test]
    async fn test_root_checkpoint_only() {
        let source = MemorySource::default().with("h", Entry::Found(vec![]));
        let history = fetch_history(&source, "h").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].hash, "h");
    }

    #[tokio::test]
    async fn test_linear_chain_in_order() {
        let source = MemorySource::default()
            .with("h", Entry::Found(vec!["p1"]))
            .with("p1", Entry::Found(vec!["p2"]))
            .with("p2", Entry::Found(vec![]));

        let history = HistoryWalker::default().walk(&source, "h").await;
        assert_eq!(hashes(&history.checkpoints), vec!["h", "p1", "p2"]);
        assert!(history.is_complete());
        assert_eq!(source.requested(), vec!["h", "p1", "p2"]);
    }

    #[tokio::test]
    async fn test_follows_first_parent_only() {
        let source = MemorySource::default()
            .with("merge", Entry::Found(vec!["left", "right"]))
            .with("left", Entry::Found(vec![]))
            .with("right", Entry::Found(vec![]));

        let history = fetch_history(&source, "merge").await;
        assert_eq!(hashes(&history), vec!["merge", "left"]);
        assert!(!source.requested().contains(&"right".to_string()));
    }

    #[tokio::test]
    async fn test_unfetchable_start_is_empty() {
        let source = MemorySource::default().with("h", Entry::Fails);
        let history = HistoryWalker::default().walk(&source, "h").await;
        assert!(history.is_empty());
        assert!(matches!(history.end, HistoryEnd::FetchFailed { ref hash, .. } if hash == "h"));

        let source = MemorySource::default().with("h", Entry::Empty);
        assert!(fetch_history(&source, "h").await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_start_hash_makes_no_request() {
        let source = MemorySource::default();
        let history = HistoryWalker::default().walk(&source, "").await;
        assert!(history.is_empty());
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_intermediate_failure_ends_at_last_good() {
        let source = MemorySource::default()
            .with("h", Entry::Found(vec!["p1"]))
            .with("p1", Entry::Found(vec!["p2"]))
            .with("p2", Entry::Fails);

        let history = HistoryWalker::default().walk(&source, "h").await;
        assert_eq!(hashes(&history.checkpoints), vec!["h", "p1"]);
        assert!(matches!(history.end, HistoryEnd::FetchFailed { ref hash, .. } if hash == "p2"));
        assert!(!history.is_complete());
    }

    #[tokio::test]
    async fn test_empty_parent_body_ends_walk() {
        let source = MemorySource::default()
            .with("h", Entry::Found(vec!["p1"]))
            .with("p1", Entry::Empty);

        let history = HistoryWalker::default().walk(&source, "h").await;
        assert_eq!(hashes(&history.checkpoints), vec!["h"]);
        assert_eq!(
            history.end,
            HistoryEnd::Missing {
                hash: "p1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_cycle_is_detected() {
        let source = MemorySource::default()
            .with("a", Entry::Found(vec!["b"]))
            .with("b", Entry::Found(vec!["a"]));

        let history = HistoryWalker::default().walk(&source, "a").await;
        assert_eq!(hashes(&history.checkpoints), vec!["a", "b"]);
        assert_eq!(
            history.end,
            HistoryEnd::Cycle {
                hash: "a".to_string()
            }
        );
        assert_eq!(source.requested(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let source = MemorySource::default()
            .with("c3", Entry::Found(vec!["c2"]))
            .with("c2", Entry::Found(vec!["c1"]))
            .with("c1", Entry::Found(vec!["c0"]))
            .with("c0", Entry::Found(vec![]));

        let history = HistoryWalker::new(2).walk(&source, "c3").await;
        assert_eq!(hashes(&history.checkpoints), vec!["c3", "c2"]);
        assert_eq!(history.end, HistoryEnd::DepthLimit { limit: 2 });

        // A chain exactly as long as the limit still ends at its root
        let history = HistoryWalker::new(4).walk(&source, "c3").await;
        assert_eq!(history.len(), 4);
        assert!(history.is_complete());
    }

    #[tokio::test]
    async fn test_repeated_walks_are_not_cached() {
        let source = MemorySource::default().with("h", Entry::Found(vec![]));
        fetch_history(&source, "h").await;
        fetch_history(&source, "h").await;
        assert_eq!(source.requested(), vec!["h", "h"]);
    }

    #[tokio::test]
    async fn test_walk_over_http() {
        let server = MockServer::start().await;
        for (hash, parents) in [
            ("sha256:03", json!(["sha256:02"])),
            ("sha256:02", json!(["sha256:01"])),
            ("sha256:01", json!(null)),
        ] {
            Mock::given(method("GET"))
                .and(path(format!("/obj/{}", hash)))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "affixHash": "sha256:af",
                    "parentHashes": parents,
                    "commandDesc": "e30=",
                    "summary": ""
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = Arc::new(ApiClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap());
        let conn = ServerConnection::connect(client, &server.uri()).unwrap();

        let history = HistoryWalker::default().walk(&conn, "sha256:03").await;
        assert_eq!(
            hashes(&history.checkpoints),
            vec!["sha256:03", "sha256:02", "sha256:01"]
        );
        assert!(history.is_complete());
    }

    #[tokio::test]
    async fn test_walk_over_http_stops_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obj/sha256:02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "parentHashes": ["sha256:01"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/obj/sha256:01"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Arc::new(ApiClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap());
        let conn = ServerConnection::connect(client, &server.uri()).unwrap();

        let history = fetch_history(&conn, "sha256:02").await;
        assert_eq!(hashes(&history), vec!["sha256:02"]);
    }
}
