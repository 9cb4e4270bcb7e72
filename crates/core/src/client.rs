//! HTTP client for the backend's `show-players` and `connect` endpoints.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::models::ServerSnapshot;

/// Failure of a backend request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the body could not be read.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Absolute URL that was requested.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        /// Absolute URL that was requested.
        url: String,
        /// Response status.
        status: StatusCode,
    },
    /// The body was not a valid server snapshot.
    #[error("invalid snapshot from {url}: {source}")]
    Decode {
        /// Absolute URL that was requested.
        url: String,
        /// JSON decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// Thin wrapper over [`reqwest::Client`] rooted at the backend base URL.
#[derive(Debug, Clone)]
pub struct ServerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServerClient {
    /// Build a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a path-and-query produced by [`crate::query::url_for`].
    pub fn absolute(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path_and_query)
    }

    /// Fetch a server snapshot.
    pub async fn show_players(&self, path_and_query: &str) -> Result<ServerSnapshot, ClientError> {
        let (url, body) = self.get_text(path_and_query).await?;
        ServerSnapshot::from_json(&body).map_err(|source| ClientError::Decode { url, source })
    }

    /// Ask the backend to prepare a connection; the response body is returned
    /// for logging only.
    pub async fn connect(&self, path_and_query: &str) -> Result<String, ClientError> {
        let (_, body) = self.get_text(path_and_query).await?;
        Ok(body)
    }

    async fn get_text(&self, path_and_query: &str) -> Result<(String, String), ClientError> {
        let url = self.absolute(path_and_query);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Request {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { url, status });
        }
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Request {
                url: url.clone(),
                source,
            })?;
        Ok((url, body))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Serve exactly one HTTP response on a local port and return its base URL.
    pub(crate) async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write");
            socket.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    pub(crate) const SNAPSHOT_BODY: &str = r#"{"ping": 12, "players": 1, "max_players": 24,
        "bots": 0, "map_name": "de_dust2",
        "a2s_players": [{"name": "Alice", "score": 10, "duration": 125.0, "attributes": ""}]}"#;

    fn client(base_url: String) -> ServerClient {
        ServerClient::new(base_url, Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn absolute_joins_without_double_slash() {
        let client =
            ServerClient::new("http://127.0.0.1:5000/", Duration::from_secs(1)).expect("client");
        assert_eq!(
            client.absolute("/connect/1.2.3.4:27015?map_name=a&server_name=b"),
            "http://127.0.0.1:5000/connect/1.2.3.4:27015?map_name=a&server_name=b"
        );
        assert_eq!(client.base_url(), "http://127.0.0.1:5000/");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_request_error() {
        let client =
            ServerClient::new("http://127.0.0.1:1", Duration::from_secs(2)).expect("client");
        let err = client
            .show_players("/show-players/1.2.3.4:27015?map_name=&server_name=")
            .await
            .expect_err("nothing listens on port 1");
        assert!(matches!(err, ClientError::Request { .. }));
    }

    #[tokio::test]
    async fn show_players_decodes_snapshot() {
        let client = client(serve_once("200 OK", SNAPSHOT_BODY).await);
        let snapshot = client
            .show_players("/show-players/1.2.3.4:27015?map_name=&server_name=")
            .await
            .expect("snapshot");
        assert_eq!(snapshot.scalar_cells(), ["12", "1", "24", "0", "de_dust2"]);
        assert_eq!(snapshot.a2s_players[0].name, "Alice");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let client = client(serve_once("500 Internal Server Error", "{}").await);
        let err = client
            .show_players("/show-players/1.2.3.4:27015?map_name=&server_name=")
            .await
            .expect_err("server error");
        match err {
            ClientError::Status { url, status } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(url.ends_with("/show-players/1.2.3.4:27015?map_name=&server_name="));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let client = client(serve_once("200 OK", "not json").await);
        let err = client
            .show_players("/show-players/1.2.3.4:27015?map_name=&server_name=")
            .await
            .expect_err("garbage body");
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn connect_returns_body() {
        let client = client(serve_once("200 OK", "\"ok\"").await);
        let body = client
            .connect("/connect/1.2.3.4:27015?map_name=&server_name=")
            .await
            .expect("connect");
        assert_eq!(body, "\"ok\"");
    }
}
