// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::feed::feedclient::{FeedBatch, FeedClient, FeedError, FeedResponse};

/// Serves a bundled recording of the feed. Used when no channel is configured.
pub struct DummyFeedClient {
    response: FeedResponse,
}

impl DummyFeedClient {
    pub fn new() -> Result<Self, FeedError> {
        let json_data = std::include_str!("./dummyfeed.json");

        Ok(Self { response: FeedResponse::from_json(json_data)? })
    }
}

#[async_trait]
impl FeedClient for DummyFeedClient {
    async fn fetch(&self) -> Result<FeedBatch, FeedError> {
        Ok(self.response.clone().into_batch())
    }
}

#[tokio::test]
async fn test_dummy_feed_client() {
    use crate::feed::feedclient::{FeedField, WINDOW_LEN};

    let client = DummyFeedClient::new().unwrap();
    let batch = client.fetch().await.unwrap();

    assert_eq!(batch.len(), WINDOW_LEN);
    assert_eq!(batch.latest().unwrap().entry_id, Some(418));
    assert_eq!(batch.latest().unwrap().field(FeedField::GasLevel), Some("18"));
    assert_eq!(client.response.channel.as_ref().unwrap().name.as_deref(), Some("Smart Nest"));
}
