// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Number of samples the dashboard window shows.
pub const WINDOW_LEN: usize = 7;

/// The feed fields the dashboard reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedField {
    Temperature,
    Humidity,
    GasLevel,
    Actuator1,
    Actuator2,
}

impl FeedField {
    /// The name of the field in the feed payload.
    pub fn key(self) -> &'static str {
        match self {
            FeedField::Temperature => "field1",
            FeedField::Humidity => "field2",
            FeedField::GasLevel => "field3",
            FeedField::Actuator1 => "field4",
            FeedField::Actuator2 => "field5",
        }
    }
}

/// One record of the feed. Fields the dashboard does not know are ignored.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FeedSample {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub field1: Option<String>,
    #[serde(default)]
    pub field2: Option<String>,
    #[serde(default)]
    pub field3: Option<String>,
    #[serde(default)]
    pub field4: Option<String>,
    #[serde(default)]
    pub field5: Option<String>,
}

impl FeedSample {
    /// Raw value of `field`, if the provider sent one.
    pub fn field(&self, field: FeedField) -> Option<&str> {
        let value = match field {
            FeedField::Temperature => &self.field1,
            FeedField::Humidity => &self.field2,
            FeedField::GasLevel => &self.field3,
            FeedField::Actuator1 => &self.field4,
            FeedField::Actuator2 => &self.field5,
        };

        value.as_deref()
    }
}

/// Channel metadata sent along with the feed.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FeedChannel {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_entry_id: Option<u64>,
}

/// The response body of a feed request.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FeedResponse {
    #[serde(default)]
    pub channel: Option<FeedChannel>,
    pub feeds: Vec<FeedSample>,
}

impl FeedResponse {
    /// Parses a response body.
    pub fn from_json(body: &str) -> Result<Self, FeedError> {
        serde_json::from_str(body).map_err(|e| FeedError::MalformedResponse(e.to_string()))
    }

    /// Orders the samples newest-first by entry id. Unless every sample carries an entry id,
    /// the samples are kept in the order they were delivered.
    pub fn into_batch(self) -> FeedBatch {
        let mut samples = self.feeds;
        if samples.iter().all(|sample| sample.entry_id.is_some()) {
            samples.sort_by(|a, b| b.entry_id.cmp(&a.entry_id));
        }

        FeedBatch::newest_first(samples)
    }
}

/// The samples of one fetch, newest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedBatch {
    samples: Vec<FeedSample>,
}

impl FeedBatch {
    /// Wraps samples that are already ordered newest first.
    pub fn newest_first(samples: Vec<FeedSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The sample `age` steps back from the latest one.
    pub fn get(&self, age: usize) -> Option<&FeedSample> {
        self.samples.get(age)
    }

    pub fn latest(&self) -> Option<&FeedSample> {
        self.samples.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedSample> {
        self.samples.iter()
    }
}

/// Why a feed could not be turned into a display state.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum FeedError {
    /// The request could not complete.
    #[error("feed request failed: {0}")]
    Network(String),

    /// The response did not have the expected structure or content.
    #[error("malformed feed response: {0}")]
    MalformedResponse(String),
}

pub type FeedClientPointer = Arc<dyn FeedClient + Send + Sync>;

/// The feed client trait that provides the recent samples of the feed.
#[async_trait]
pub trait FeedClient {
    /// Fetches the most recent samples, newest first.
    async fn fetch(&self) -> Result<FeedBatch, FeedError>;
}

#[test]
fn test_response_ignores_unknown_fields() {
    let response = FeedResponse::from_json(
        r#"{"feeds":[{"entry_id":3,"field1":"21.5","field2":"40","field3":"12","field4":"0","field5":"1","field6":null,"field8":"x"}]}"#,
    )
    .unwrap();

    let batch = response.into_batch();
    let latest = batch.latest().unwrap();

    assert_eq!(latest.field(FeedField::Temperature), Some("21.5"));
    assert_eq!(latest.field(FeedField::Actuator2), Some("1"));
    assert_eq!(latest.entry_id, Some(3));
}

#[test]
fn test_into_batch_orders_newest_first() {
    let response = FeedResponse::from_json(
        r#"{"feeds":[{"entry_id":10,"field3":"a"},{"entry_id":11,"field3":"b"},{"entry_id":12,"field3":"c"}]}"#,
    )
    .unwrap();

    let batch = response.into_batch();
    let gas: Vec<_> = batch.iter().map(|s| s.field(FeedField::GasLevel).unwrap()).collect();

    assert_eq!(gas, ["c", "b", "a"]);
}

#[test]
fn test_into_batch_without_entry_ids_keeps_delivery_order() {
    let response =
        FeedResponse::from_json(r#"{"feeds":[{"field3":"new"},{"field3":"old"}]}"#).unwrap();

    let batch = response.into_batch();

    assert_eq!(batch.latest().unwrap().field(FeedField::GasLevel), Some("new"));
    assert_eq!(batch.get(1).unwrap().field(FeedField::GasLevel), Some("old"));
}

#[test]
fn test_into_batch_with_some_entry_ids_keeps_delivery_order() {
    let response = FeedResponse::from_json(
        r#"{"feeds":[{"field3":"new"},{"entry_id":4,"field3":"mid"},{"field3":"old"}]}"#,
    )
    .unwrap();

    let batch = response.into_batch();
    let gas: Vec<_> = batch.iter().map(|s| s.field(FeedField::GasLevel).unwrap()).collect();

    assert_eq!(gas, ["new", "mid", "old"]);
}

#[test]
fn test_rejected_key_answer_is_malformed() {
    let result = FeedResponse::from_json("-1");

    assert!(matches!(result, Err(FeedError::MalformedResponse(_))));
}

#[test]
fn test_missing_feeds_is_malformed() {
    let result = FeedResponse::from_json(r#"{"channel":{"id":1}}"#);

    assert!(matches!(result, Err(FeedError::MalformedResponse(_))));
}
