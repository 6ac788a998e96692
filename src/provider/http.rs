use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time;
use tracing::{info, warn};

use crate::{configuration::Config, error::Error};

#[derive(Debug)]
pub struct HTTP {
    pub config: Config,
    client: Client,
}

enum FetchFailure {
    /// Worth another attempt: connect/timeout errors, 5xx, 429.
    Transient(String),
    /// Fails the run immediately: other 4xx, malformed body.
    Fatal(Error),
}

impl HTTP {
    pub fn new(config: Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(HTTP { config, client })
    }

    /// Fetches one page of market snapshots from CoinGecko. Transient
    /// failures are retried up to `max_retries` total attempts with a
    /// linear backoff between them.
    pub async fn get_coingecko_markets(&self) -> Result<Vec<Value>, Error> {
        let url = self.config.get_coingecko_markets_url()?;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            info!(
                "fetching coingecko markets (page={}, per_page={}) attempt {}",
                self.config.page, self.config.per_page, attempt
            );

            match self.try_fetch(url.as_str()).await {
                Ok(records) => {
                    info!("fetched {} records from coingecko", records.len());
                    return Ok(records);
                },
                Err(FetchFailure::Fatal(err)) => return Err(err),
                Err(FetchFailure::Transient(reason)) => {
                    warn!("fetch attempt {} failed: {}", attempt, reason);
                    if attempt >= self.config.max_retries {
                        return Err(Error::Extraction(format!(
                            "max retries reached after {} attempts: {}",
                            attempt, reason
                        )));
                    }
                    let delay =
                        self.config.retry_backoff_secs * u64::from(attempt);
                    time::sleep(Duration::from_secs(delay)).await;
                },
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<Value>, FetchFailure> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => return Err(FetchFailure::Transient(err.to_string())),
        };

        let status = response.status();
        if is_retryable_status(status) {
            return Err(FetchFailure::Transient(format!(
                "upstream status {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(FetchFailure::Fatal(Error::Extraction(format!(
                "upstream status {}",
                status
            ))));
        }

        let body: Value = response.json().await.map_err(|err| {
            if err.is_decode() {
                FetchFailure::Fatal(Error::Extraction(format!(
                    "malformed response body: {}",
                    err
                )))
            } else {
                FetchFailure::Transient(err.to_string())
            }
        })?;

        match body {
            Value::Array(records) => Ok(records),
            _ => Err(FetchFailure::Fatal(Error::Extraction(
                "unexpected response format, expected a list".to_owned(),
            ))),
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    fn test_config(host: String) -> Config {
        Config {
            database_url: String::new(),
            coingecko_host: host,
            vs_currency: "usd".to_owned(),
            per_page: 250,
            page: 1,
            max_retries: 3,
            retry_backoff_secs: 0,
            timeout: 5,
        }
    }

    /// Serves one canned response per expected connection, counting hits.
    async fn stub_server(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = vec![0u8; 4096];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if buf[..n].windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        },
                    }
                }

                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    429 => "Too Many Requests",
                    _ => "Internal Server Error",
                };
                let response = format!(
                    "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    #[tokio::test]
    async fn transient_failures_exhaust_the_retry_budget() {
        let (host, hits) =
            stub_server(vec![(500, "[]"), (500, "[]"), (500, "[]")]).await;
        let http = HTTP::new(test_config(host)).unwrap();

        let err = http.get_coingecko_markets().await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_after_a_single_transient_failure() {
        let (host, hits) =
            stub_server(vec![(500, "[]"), (200, r#"[{"id":"bitcoin"}]"#)])
                .await;
        let http = HTTP::new(test_config(host)).unwrap();

        let records = http.get_coingecko_markets().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rate_limit_status_is_retryable() {
        let (host, hits) = stub_server(vec![(429, ""), (200, "[]")]).await;
        let http = HTTP::new(test_config(host)).unwrap();

        let records = http.get_coingecko_markets().await.unwrap();
        assert!(records.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let (host, hits) = stub_server(vec![(404, "")]).await;
        let http = HTTP::new(test_config(host)).unwrap();

        let err = http.get_coingecko_markets().await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_list_body_fails_without_retry() {
        let (host, hits) =
            stub_server(vec![(200, r#"{"error":"unexpected"}"#)]).await;
        let http = HTTP::new(test_config(host)).unwrap();

        let err = http.get_coingecko_markets().await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
