//! Byte transport used by [`RemoteFetcher`](crate::RemoteFetcher).
//!
//! A transport retrieves the raw bytes behind a URL and reports progress as
//! they arrive. It does not interpret status codes; that is left to the
//! fetcher, which treats images and meshes differently.

use std::pin::Pin;

use futures::{Stream, stream};

use crate::error::{Error, Result};
use crate::types::LoadStatus;

/// Stream type returned by [`Transport::get`].
pub type TransferStream<'a> = Pin<Box<dyn Stream<Item = Result<TransferEvent>> + Send + 'a>>;

/// One step of a byte transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Bytes are still arriving.
    Progress(LoadStatus),
    /// The response body has been received in full.
    Complete {
        /// Final byte progress.
        status: LoadStatus,
        /// HTTP status code of the response.
        code: u16,
        /// The response body.
        body: Vec<u8>,
    },
}

/// Retrieves raw bytes by URL.
pub trait Transport: Send + Sync {
    /// Start a GET request.
    fn get(&self, url: String) -> TransferStream<'_>;
}

/// Whether an HTTP status code denotes success.
#[must_use]
pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

/// HTTP transport backed by reqwest.
///
/// The body is read chunk by chunk; a progress event follows every chunk.
/// The total comes from `Content-Length` and stays zero in progress events
/// while unknown. The completion event always carries the received size.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Create a transport with a custom HTTP client.
    #[must_use]
    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }
}

enum TransferState {
    Pending(String),
    Receiving {
        url: String,
        response: reqwest::Response,
        code: u16,
        body: Vec<u8>,
        total: u64,
    },
    Finished,
}

impl Transport for HttpTransport {
    fn get(&self, url: String) -> TransferStream<'_> {
        Box::pin(stream::unfold(TransferState::Pending(url), move |state| {
            step(&self.http, state)
        }))
    }
}

async fn step(
    http: &reqwest::Client,
    state: TransferState,
) -> Option<(Result<TransferEvent>, TransferState)> {
    match state {
        TransferState::Pending(url) => {
            tracing::debug!(url = %url, "fetching");

            let response = match http.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    let err = Error::Http {
                        url,
                        message: e.to_string(),
                    };
                    return Some((Err(err), TransferState::Finished));
                }
            };

            let code = response.status().as_u16();
            let total = response.content_length().unwrap_or(0);
            let next = TransferState::Receiving {
                url,
                response,
                code,
                body: Vec::new(),
                total,
            };
            Some((Ok(TransferEvent::Progress(LoadStatus::new(0, total))), next))
        }
        TransferState::Receiving {
            url,
            mut response,
            code,
            mut body,
            total,
        } => match response.chunk().await {
            Ok(Some(chunk)) => {
                body.extend_from_slice(&chunk);
                let loaded = body.len() as u64;
                tracing::trace!(url = %url, loaded, total, "received chunk");
                let next = TransferState::Receiving {
                    url,
                    response,
                    code,
                    body,
                    total,
                };
                Some((Ok(TransferEvent::Progress(LoadStatus::new(loaded, total))), next))
            }
            Ok(None) => {
                let loaded = body.len() as u64;
                // Once the body is complete its size is known even without
                // a Content-Length header.
                let status = LoadStatus::new(loaded, if total == 0 { loaded } else { total });
                tracing::debug!(url = %url, code, bytes = loaded, "fetched");
                let event = TransferEvent::Complete { status, code, body };
                Some((Ok(event), TransferState::Finished))
            }
            Err(e) => {
                let err = Error::Http {
                    url,
                    message: e.to_string(),
                };
                Some((Err(err), TransferState::Finished))
            }
        },
        TransferState::Finished => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one connection, writing `parts` with a pause between each.
    async fn serve_once(parts: Vec<&'static [u8]>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            for part in parts {
                socket.write_all(part).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        });

        format!("http://{addr}/asset")
    }

    fn local_transport() -> HttpTransport {
        HttpTransport::with_http(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    async fn transfer(url: String) -> (Vec<LoadStatus>, TransferEvent) {
        let transport = local_transport();
        let mut events: Vec<TransferEvent> = transport
            .get(url)
            .map(|event| event.unwrap())
            .collect()
            .await;
        let last = events.pop().unwrap();
        let progress = events
            .into_iter()
            .map(|event| match event {
                TransferEvent::Progress(status) => status,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        (progress, last)
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(304));
        assert!(!is_success(404));
        assert!(!is_success(500));
    }

    #[tokio::test]
    async fn test_unknown_length_keeps_total_unknown_until_complete() {
        let url = serve_once(vec![
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".as_slice(),
            b"4\r\nabcd\r\n".as_slice(),
            b"4\r\nefgh\r\n0\r\n\r\n".as_slice(),
        ])
        .await;

        let (progress, last) = transfer(url).await;

        assert!(progress.len() >= 2);
        assert!(progress.iter().all(|status| status.total == 0));
        assert!(progress.windows(2).all(|w| w[0].loaded <= w[1].loaded));
        assert_eq!(progress.last().map(|s| s.loaded), Some(8));
        assert_eq!(
            last,
            TransferEvent::Complete {
                status: LoadStatus::new(8, 8),
                code: 200,
                body: b"abcdefgh".to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn test_known_length_reports_total_from_the_start() {
        let url = serve_once(vec![
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 8\r\nConnection: close\r\n\r\nabcd".as_slice(),
            b"efgh".as_slice(),
        ])
        .await;

        let (progress, last) = transfer(url).await;

        assert_eq!(progress.first(), Some(&LoadStatus::new(0, 8)));
        assert!(progress.iter().all(|status| status.total == 8));
        assert_eq!(
            last,
            TransferEvent::Complete {
                status: LoadStatus::new(8, 8),
                code: 404,
                body: b"abcdefgh".to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_http_error() {
        let transport = HttpTransport::new();
        // Port 9 (discard) on localhost is not expected to accept connections.
        let mut stream = transport.get("http://127.0.0.1:9/nothing".to_string());

        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(Error::Http { .. })));
        assert!(stream.next().await.is_none());
    }
}
