// Pulse Wallet Engine — Advisory client
//
// POST {"totalSpent": n} → {"suggestion": "..."}. The wallet flow never
// waits on this service failing: every error becomes the fallback text.

use crate::atoms::constants::{ADVISORY_FALLBACK, ADVISORY_TIMEOUT_SECS};
use crate::atoms::error::{WalletError, WalletResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdviceRequest {
    total_spent: f64,
}

#[derive(Debug, Deserialize)]
struct AdviceResponse {
    suggestion: String,
}

#[derive(Debug, Clone)]
pub struct AdvisoryClient {
    endpoint: String,
    client: reqwest::Client,
}

impl AdvisoryClient {
    pub fn new(endpoint: impl Into<String>) -> WalletResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ADVISORY_TIMEOUT_SECS))
            .build()?;
        Ok(Self { endpoint: endpoint.into(), client })
    }

    /// One round-trip, every failure reported as `AdvisoryUnavailable`.
    pub async fn try_request_advice(&self, total_spent: f64) -> WalletResult<String> {
        let unavailable = |e: reqwest::Error| WalletError::AdvisoryUnavailable(e.to_string());
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&AdviceRequest { total_spent })
            .send()
            .await
            .map_err(unavailable)?
            // A non-2xx reply is a failure even when its body carries a suggestion.
            .error_for_status()
            .map_err(unavailable)?;
        let body: AdviceResponse = resp.json().await.map_err(unavailable)?;
        Ok(body.suggestion)
    }

    /// The suggestion, or the fixed fallback text.
    pub async fn request_advice(&self, total_spent: f64) -> String {
        match self.try_request_advice(total_spent).await {
            Ok(suggestion) => {
                debug!("[advisory] {} → {}", total_spent, suggestion);
                suggestion
            }
            Err(e) => {
                warn!("[advisory] call failed: {}", e);
                ADVISORY_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response with the given status and body and
    /// hand back the raw request text.
    async fn one_shot_server(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/analyze", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = String::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                request.push_str(&String::from_utf8_lossy(&buf[..n]));
                if n == 0 || request.contains("}") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            request
        });
        (url, handle)
    }

    #[tokio::test]
    async fn surfaces_the_suggestion() {
        let (url, server) = one_shot_server("200 OK", r#"{"suggestion":"Your spending looks good"}"#).await;
        let client = AdvisoryClient::new(url).unwrap();
        assert_eq!(client.request_advice(4.5).await, "Your spending looks good");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /analyze"));
        assert!(request.contains(r#"{"totalSpent":4.5}"#));
    }

    #[tokio::test]
    async fn unreachable_service_yields_fallback() {
        let client = AdvisoryClient::new("http://127.0.0.1:1/analyze").unwrap();
        assert_eq!(client.request_advice(12.0).await, ADVISORY_FALLBACK);
        assert!(matches!(
            client.try_request_advice(12.0).await,
            Err(WalletError::AdvisoryUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn malformed_body_yields_fallback() {
        let (url, _server) = one_shot_server("200 OK", r#"{"advice":"wrong field"}"#).await;
        let client = AdvisoryClient::new(url).unwrap();
        assert_eq!(client.request_advice(1.0).await, ADVISORY_FALLBACK);
    }

    #[tokio::test]
    async fn server_error_yields_fallback() {
        let (url, _server) = one_shot_server("500 Internal Server Error", r#"{"suggestion":"ignored"}"#).await;
        let client = AdvisoryClient::new(url).unwrap();
        assert_eq!(client.request_advice(1.0).await, ADVISORY_FALLBACK);
    }
}
