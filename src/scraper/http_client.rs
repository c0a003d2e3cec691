use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error};

use super::PageSource;

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }

    /// Single GET, no retry. Non-2xx is an error.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()?;

        let body = resp.bytes().await.context("Failed to read response body")?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_page(&self, url: &str) -> Vec<u8> {
        match self.get_bytes(url).await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to get page. {:#}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response; yields the raw request text.
    async fn serve_once(response: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            tx.send(String::from_utf8_lossy(&request).into_owned()).ok();
        });

        (format!("http://{}/summoner/na1/Faker/last-30-days", addr), rx)
    }

    fn client() -> HttpClient {
        HttpClient::new(&ScraperConfig {
            timeout_secs: 5,
            ..ScraperConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_body_and_sends_user_agent() {
        let (url, request) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;

        let body = client().fetch_page(&url).await;
        assert_eq!(body, b"hello");

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /summoner/na1/faker/last-30-days"));
        assert!(request.contains("user-agent: mozilla/5.0"));
    }

    #[tokio::test]
    async fn non_success_status_yields_empty_page() {
        let (url, _request) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        )
        .await;

        assert!(client().fetch_page(&url).await.is_empty());
    }

    #[tokio::test]
    async fn connection_refused_yields_empty_page() {
        // Bind then drop so the port is known to be closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/summoner/euw1/Nobody/last-30-days", addr);
        assert!(client().fetch_page(&url).await.is_empty());
    }
}
