use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::record::{self, Record, RecordError, Resource};
use crate::session::SessionContext;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed: {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("not authorized for {url} (HTTP {status}); log in again with --token")]
    Unauthorized { url: String, status: u16 },

    #[error("unexpected HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("invalid records from {url}: {source}")]
    Records {
        url: String,
        #[source]
        source: RecordError,
    },
}

impl FetchError {
    /// Whether the backend rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Only an explicit `proxy` is used; proxy environment variables are ignored.
pub fn build_client(
    timeout_seconds: u64,
    proxy: Option<&str>,
) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.max(1)))
        .user_agent(concat!("callgrid/", env!("CARGO_PKG_VERSION")));
    builder = match proxy.map(str::trim).filter(|p| !p.is_empty()) {
        Some(proxy) => {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|source| FetchError::ClientBuild { source })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };
    builder
        .build()
        .map_err(|source| FetchError::ClientBuild { source })
}

/// GETs one list endpoint and parses its body into records.
pub async fn fetch_records(
    client: &reqwest::Client,
    url: &str,
    session: &SessionContext,
    resource: Resource,
) -> Result<Vec<Record>, FetchError> {
    let mut request = client.get(url);
    if let Some(token) = session.token() {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!(url, status = status.as_u16(), "backend rejected session");
        return Err(FetchError::Unauthorized {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    let records = record::parse_records(&body, resource).map_err(|source| FetchError::Records {
        url: url.to_string(),
        source,
    })?;
    debug!(url, count = records.len(), "fetched records");
    Ok(records)
}

/// Fetches several endpoints concurrently. Records are concatenated in the
/// order the URLs were given, whatever order the responses arrive in.
pub async fn fetch_all(
    client: &reqwest::Client,
    urls: &[String],
    session: &SessionContext,
    resource: Resource,
) -> Result<Vec<Record>, FetchError> {
    let mut pending: FuturesUnordered<_> = urls
        .iter()
        .enumerate()
        .map(|(idx, url)| async move {
            (idx, fetch_records(client, url, session, resource).await)
        })
        .collect();

    let mut batches: Vec<Option<Vec<Record>>> = vec![None; urls.len()];
    while let Some((idx, result)) = pending.next().await {
        batches[idx] = Some(result?);
    }
    Ok(batches.into_iter().flatten().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serves one canned response and hands back the raw request head.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&head).to_string());
        });
        (format!("http://{addr}/leads"), rx)
    }

    #[tokio::test]
    async fn fetch_sends_bearer_and_unwraps_envelope() {
        let (url, request) = serve_once("200 OK", r#"{"leads":[{"name":"Alice"}]}"#).await;
        let mut session = SessionContext::in_memory();
        session.set_token("abc123");

        let client = build_client(5, None).unwrap();
        let records = fetch_records(&client, &url, &session, Resource::Leads)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);

        let head = request.await.unwrap().to_lowercase();
        assert!(head.contains("authorization: bearer abc123"));
    }

    #[tokio::test]
    async fn unauthorized_is_distinguished() {
        let (url, _request) = serve_once("401 Unauthorized", "{}").await;
        let client = build_client(5, None).unwrap();
        let err = fetch_records(&client, &url, &SessionContext::in_memory(), Resource::Leads)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn server_errors_carry_the_status() {
        let (url, _request) = serve_once("500 Internal Server Error", "{}").await;
        let client = build_client(5, None).unwrap();
        let err = fetch_records(&client, &url, &SessionContext::in_memory(), Resource::Leads)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn fetch_all_keeps_argument_order() {
        let (first, _a) = serve_once("200 OK", r#"[{"id":1},{"id":2}]"#).await;
        let (second, _b) = serve_once("200 OK", r#"[{"id":3}]"#).await;
        let client = build_client(5, None).unwrap();
        let records = fetch_all(
            &client,
            &[second, first],
            &SessionContext::in_memory(),
            Resource::Generic,
        )
        .await
        .unwrap();
        let ids: Vec<u64> = records
            .iter()
            .map(|r| r.get("id").and_then(|v| v.as_u64()).unwrap())
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
