// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::FeedConfig;
use crate::feed::feedclient::{FeedBatch, FeedClient, FeedError, FeedResponse};

/// Fetches the channel feed from a ThingSpeak compatible service.
pub struct ThingSpeakFeedClient {
    client: reqwest::Client,
    url: String,
    query: Vec<(&'static str, String)>,
}

impl ThingSpeakFeedClient {
    pub fn new(config: &FeedConfig, channel_id: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: Self::feed_url(&config.base_url, channel_id),
            query: Self::query(config),
        })
    }

    fn feed_url(base_url: &str, channel_id: &str) -> String {
        format!("{}/channels/{}/feeds.json", base_url.trim_end_matches('/'), channel_id)
    }

    fn query(config: &FeedConfig) -> Vec<(&'static str, String)> {
        let mut query = vec![("results", config.results.to_string())];
        if let Some(key) = &config.read_api_key {
            query.push(("api_key", key.clone()));
        }

        query
    }
}

#[async_trait]
impl FeedClient for ThingSpeakFeedClient {
    async fn fetch(&self) -> Result<FeedBatch, FeedError> {
        log::debug!("-> GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .query(&self.query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| FeedError::Network(e.to_string()))?;

        log::debug!("<- {}", response.status());

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;
        let feed = FeedResponse::from_json(&body)?;

        if let Some(channel) = &feed.channel {
            log::debug!(
                "Channel {:?} ({:?}), last entry {:?}",
                channel.name,
                channel.id,
                channel.last_entry_id
            );
        }
        log::debug!("Received {} feed entries", feed.feeds.len());

        Ok(feed.into_batch())
    }
}

#[test]
fn test_feed_url_and_query() {
    let config = FeedConfig {
        base_url: "https://api.thingspeak.com/".into(),
        read_api_key: Some("READKEY".into()),
        ..Default::default()
    };

    let client = ThingSpeakFeedClient::new(&config, "2271830").unwrap();

    assert_eq!(client.url, "https://api.thingspeak.com/channels/2271830/feeds.json");
    assert_eq!(
        client.query,
        [("results", "7".to_string()), ("api_key", "READKEY".to_string())]
    );
}

#[test]
fn test_query_without_key() {
    let query = ThingSpeakFeedClient::query(&FeedConfig::default());

    assert_eq!(query, [("results", "7".to_string())]);
}

#[cfg(test)]
async fn local_server() -> (tokio::net::TcpListener, FeedConfig) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = FeedConfig {
        base_url: format!("http://{}", listener.local_addr().unwrap()),
        request_timeout_secs: 2,
        ..Default::default()
    };

    (listener, config)
}

/// Reads an HTTP request up to the end of its headers.
#[cfg(test)]
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    use tokio::io::AsyncReadExt;

    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..read]);
    }

    String::from_utf8_lossy(&request).into_owned()
}

#[tokio::test]
async fn test_closed_connection_is_network_error() {
    let (listener, config) = local_server().await;
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        drop(socket);
    });
    let client = ThingSpeakFeedClient::new(&config, "1").unwrap();

    let result = client.fetch().await;

    assert!(matches!(result, Err(FeedError::Network(_))));
    server.await.unwrap();
}

#[tokio::test]
async fn test_fetch_reads_local_feed() {
    use tokio::io::AsyncWriteExt;

    let (listener, config) = local_server().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let body = r#"{"feeds":[{"entry_id":1,"field3":"10"},{"entry_id":2,"field3":"11"}]}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();

        request
    });
    let client = ThingSpeakFeedClient::new(&config, "42").unwrap();

    let batch = client.fetch().await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /channels/42/feeds.json?results=7 HTTP/1.1"));
    assert_eq!(batch.latest().unwrap().entry_id, Some(2));
    assert_eq!(batch.len(), 2);
}

#[tokio::test]
async fn test_error_status_is_network_error() {
    use tokio::io::AsyncWriteExt;

    let (listener, config) = local_server().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();
    });
    let client = ThingSpeakFeedClient::new(&config, "1").unwrap();

    let result = client.fetch().await;

    assert!(matches!(result, Err(FeedError::Network(m)) if m.contains("404")));
    server.await.unwrap();
}
