//! Probing a single code against the remote service.

use crate::error::Result;
use async_trait::async_trait;
use keyprobe_core::{Code, ProbeConfig};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Outcome of checking one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The service accepted the code.
    Valid {
        /// Probed code
        code: Code,
        /// Link derived from the code
        join_link: String,
    },
    /// The service answered but rejected the code.
    Invalid {
        /// Probed code
        code: Code,
    },
    /// The request did not complete (timeout, connection error, bad response).
    ///
    /// The code is not retried within the current pass.
    Failed {
        /// Probed code
        code: Code,
        /// Transport error description
        reason: String,
    },
}

impl ProbeResult {
    /// The code this result is about.
    #[must_use]
    pub fn code(&self) -> &Code {
        match self {
            Self::Valid { code, .. } | Self::Invalid { code } | Self::Failed { code, .. } => code,
        }
    }

    /// Whether the code was accepted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Checks a single code against a remote service.
///
/// Implementations never return an error: transport failures are reported
/// as [`ProbeResult::Failed`] so that the scan keeps going.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one code.
    async fn probe(&self, code: &Code) -> ProbeResult;
}

/// Prober posting the code as the `code` form field to an HTTP endpoint.
///
/// HTTP 200 means valid; any other status means invalid.
pub struct HttpProber {
    client: Client,
    config: ProbeConfig,
}

impl HttpProber {
    /// Create a prober from validated probe settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = build_http_client(config.timeout(), &config.user_agent)?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Endpoint probed by this prober.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

/// Build an HTTP client with a request timeout and user agent.
///
/// # Errors
/// Returns error if the HTTP client cannot be created.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, code: &Code) -> ProbeResult {
        let response = self
            .client
            .post(&self.config.endpoint)
            .form(&[("code", code.as_str())])
            .send()
            .await;

        match response {
            Ok(response) if response.status() == StatusCode::OK => ProbeResult::Valid {
                code: code.clone(),
                join_link: self.config.join_link(code),
            },
            Ok(response) => {
                tracing::trace!(code = %code, status = %response.status(), "code rejected");
                ProbeResult::Invalid { code: code.clone() }
            }
            Err(e) => {
                tracing::warn!(code = %code, error = %e, "probe failed");
                ProbeResult::Failed {
                    code: code.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP response per connection, echoing the request body back
    /// through the returned channel. Status is 200 when the body contains `valid_body`.
    async fn spawn_endpoint(
        valid_body: &'static str,
    ) -> (String, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut request = String::new();
                    loop {
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        request.push_str(&String::from_utf8_lossy(&buf[..n]));
                        if let Some((head, body)) = request.split_once("\r\n\r\n") {
                            let length = head
                                .lines()
                                .find_map(|l| {
                                    let (name, value) = l.split_once(':')?;
                                    name.eq_ignore_ascii_case("content-length")
                                        .then(|| value.trim().parse::<usize>().ok())
                                        .flatten()
                                })
                                .unwrap_or(0);
                            if body.len() >= length {
                                break;
                            }
                        }
                    }
                    let body = request
                        .split_once("\r\n\r\n")
                        .map(|(_, b)| b.to_string())
                        .unwrap_or_default();
                    let status = if body.contains(valid_body) {
                        "200 OK"
                    } else {
                        "404 Not Found"
                    };
                    let _ = tx.send(body);
                    let reply = format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\n\r\n");
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{addr}/api/find"), rx)
    }

    fn config(endpoint: String) -> ProbeConfig {
        ProbeConfig {
            endpoint,
            join_url_template: "https://example.com/join?gc={code}".to_string(),
            timeout_secs: 5,
            ..ProbeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_http_prober_valid_code() {
        let (endpoint, mut bodies) = spawn_endpoint("code=004242").await;
        let prober = HttpProber::new(&config(endpoint)).expect("create prober");

        let code = Code::from_number(4242, 6);
        let result = prober.probe(&code).await;

        assert_eq!(
            result,
            ProbeResult::Valid {
                code,
                join_link: "https://example.com/join?gc=004242".to_string(),
            }
        );
        assert_eq!(bodies.recv().await.expect("request body"), "code=004242");
    }

    #[tokio::test]
    async fn test_http_prober_invalid_code() {
        let (endpoint, _bodies) = spawn_endpoint("code=004242").await;
        let prober = HttpProber::new(&config(endpoint)).expect("create prober");

        let code = Code::from_number(1, 6);
        assert_eq!(prober.probe(&code).await, ProbeResult::Invalid { code });
    }

    #[tokio::test]
    async fn test_http_prober_transport_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let prober =
            HttpProber::new(&config(format!("http://{addr}/api/find"))).expect("create prober");
        let code = Code::from_number(7, 6);
        let result = prober.probe(&code).await;

        assert!(matches!(result, ProbeResult::Failed { .. }));
        assert_eq!(result.code(), &code);
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn test_http_prober_timeout_is_failure() {
        // Accepts connections and holds them open without ever answering.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let prober = HttpProber::new(&ProbeConfig {
            timeout_secs: 1,
            ..config(format!("http://{addr}/api/find"))
        })
        .expect("create prober");

        let code = Code::from_number(8, 6);
        let started = std::time::Instant::now();
        let result = prober.probe(&code).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        match result {
            ProbeResult::Failed { code: failed, reason } => {
                assert_eq!(failed, code);
                assert!(!reason.is_empty());
            }
            other => panic!("expected a failed probe, got {other:?}"),
        }
    }
}
