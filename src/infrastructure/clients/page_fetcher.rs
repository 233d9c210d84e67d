use crate::config::FetchSettings;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Anything that can turn a URL into an HTML body.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with bounded retries and exponential backoff.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    max_attempts: u32,
    base_delay: Duration,
}

impl PageFetcher {
    pub fn new(client: Client, settings: &FetchSettings) -> Self {
        Self {
            client,
            max_attempts: settings.max_attempts.max(1),
            base_delay: settings.base_delay,
        }
    }

    /// Wait after the failed attempt with index `attempt` (zero based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs `attempt_once` up to `max_attempts` times, sleeping `backoff`
    /// between failures. There is no wait after the final attempt.
    async fn with_retries<F, Fut>(&self, url: &str, mut attempt_once: F) -> Result<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut last_error = String::new();

        for attempt in 0..self.max_attempts {
            match attempt_once().await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    warn!("Attempt {} failed for {}: {}", attempt + 1, url, e);
                    last_error = e.to_string();
                    if attempt + 1 < self.max_attempts {
                        sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(StockError::Fetch {
            url: url.to_string(),
            attempts: self.max_attempts,
            reason: last_error,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.with_retries(url, || self.fetch_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn fast_fetcher(max_attempts: u32) -> PageFetcher {
        let settings = FetchSettings {
            max_attempts,
            base_delay: Duration::from_millis(1),
            page_delay: Duration::from_millis(0),
        };
        PageFetcher::new(Client::new(), &settings)
    }

    /// Serves `responses` in order, one per connection, and counts connections.
    /// `None` closes the connection without answering.
    async fn serve(responses: Vec<Option<&'static str>>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for response in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                if let Some(response) = response {
                    let _ = stream.write_all(response.as_bytes()).await;
                }
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{}/screen/", addr), hits)
    }

    const OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello";
    const UNAVAILABLE: &str =
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    #[test]
    fn backoff_doubles_per_attempt() {
        let settings = FetchSettings {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            page_delay: Duration::from_millis(0),
        };
        let fetcher = PageFetcher::new(Client::new(), &settings);

        assert_eq!(fetcher.backoff(0), Duration::from_millis(500));
        assert_eq!(fetcher.backoff(1), Duration::from_millis(1000));
        assert_eq!(fetcher.backoff(2), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let (url, hits) = serve(vec![Some(OK)]).await;

        let body = fast_fetcher(3).fetch(&url).await.unwrap();

        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_after_server_errors() {
        let (url, hits) = serve(vec![Some(UNAVAILABLE), Some(UNAVAILABLE), Some(OK)]).await;

        let body = fast_fetcher(3).fetch(&url).await.unwrap();

        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let (url, hits) = serve(vec![Some(UNAVAILABLE), None, Some(UNAVAILABLE)]).await;

        let err = fast_fetcher(3).fetch(&url).await.unwrap_err();

        match err {
            StockError::Fetch { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_between_attempts_but_not_after_the_last() {
        let fetcher = PageFetcher::new(Client::new(), &FetchSettings::default());
        let start = tokio::time::Instant::now();
        let mut attempted_at = Vec::new();

        let err = fetcher
            .with_retries("https://screens.test/slow/", || {
                attempted_at.push(start.elapsed());
                async { Err::<String, _>(StockError::Parse("still down".to_string())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StockError::Fetch { attempts: 3, .. }));
        assert_eq!(
            attempted_at,
            vec![
                Duration::ZERO,
                Duration::from_millis(500),
                Duration::from_millis(1500)
            ]
        );
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }
}
