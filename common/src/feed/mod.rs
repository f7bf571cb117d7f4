// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod acquisition;
mod displaystate;
mod dummyfeedclient;
mod feedclient;
mod timelabels;

pub use acquisition::{AcquisitionLoop, ClockPointer, CycleOutcome, CycleStats, MIN_INTERVAL};
pub use displaystate::{ActuatorStatus, DisplayState, ACTUATOR_ON_SPEED};
pub use feedclient::{
    FeedBatch, FeedChannel, FeedClient, FeedClientPointer, FeedError, FeedField, FeedResponse,
    FeedSample, WINDOW_LEN,
};
pub use timelabels::{time_label, time_labels, Clock, FixedClock, LocalClock};

pub use dummyfeedclient::DummyFeedClient;

#[cfg(feature = "thingspeak")]
mod thingspeakclient;

#[cfg(feature = "thingspeak")]
pub use thingspeakclient::ThingSpeakFeedClient;
