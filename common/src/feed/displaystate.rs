// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use chrono::NaiveDateTime;

use crate::feed::feedclient::{FeedBatch, FeedError, FeedField, FeedSample, WINDOW_LEN};

/// Speed shown for a running fan. The feed only says whether a fan runs, not how fast.
pub const ACTUATOR_ON_SPEED: u8 = 255;

/// The read-only status of a fan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActuatorStatus {
    pub active: bool,
    pub speed: u8,
}

impl ActuatorStatus {
    pub const OFF: Self = Self { active: false, speed: 0 };
    pub const ON: Self = Self { active: true, speed: ACTUATOR_ON_SPEED };

    /// Maps a raw actuator field: `"0"` is off, anything else is on.
    pub fn from_raw(raw: &str) -> Self {
        if raw == "0" {
            Self::OFF
        } else {
            Self::ON
        }
    }
}

/// The normalized snapshot the screen renders from.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    pub temperature: f64,
    pub humidity: f64,

    /// Gas levels of the window, oldest first.
    pub gas_levels: [f64; WINDOW_LEN],
    /// One label per gas level.
    pub time_labels: [String; WINDOW_LEN],

    pub actuator1: ActuatorStatus,
    pub actuator2: ActuatorStatus,

    /// When the snapshot was acquired. `None` until the first successful cycle.
    pub acquired_at: Option<NaiveDateTime>,
}

impl DisplayState {
    /// The values shown before any data has arrived.
    pub fn placeholder(time_labels: [String; WINDOW_LEN]) -> Self {
        Self {
            temperature: 70.0,
            humidity: 20.0,
            gas_levels: [10.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0],
            time_labels,
            actuator1: ActuatorStatus::OFF,
            actuator2: ActuatorStatus::OFF,
            acquired_at: None,
        }
    }

    /// Normalizes a batch into a snapshot.
    ///
    /// The batch must hold at least [`WINDOW_LEN`] samples; only the newest ones are read.
    pub fn from_batch(
        batch: &FeedBatch,
        time_labels: [String; WINDOW_LEN],
        acquired_at: NaiveDateTime,
    ) -> Result<Self, FeedError> {
        if batch.is_empty() {
            return Err(FeedError::MalformedResponse("feed has no entries".into()));
        }
        if batch.len() < WINDOW_LEN {
            return Err(FeedError::MalformedResponse(format!(
                "expected at least {WINDOW_LEN} feed entries, got {}",
                batch.len()
            )));
        }

        let latest = sample_at(batch, 0)?;

        let mut gas_levels = [0.0; WINDOW_LEN];
        for (slot, age) in gas_levels.iter_mut().zip((0..WINDOW_LEN).rev()) {
            *slot = numeric_field(sample_at(batch, age)?, FeedField::GasLevel, age)?;
        }

        Ok(Self {
            temperature: numeric_field(latest, FeedField::Temperature, 0)?,
            humidity: numeric_field(latest, FeedField::Humidity, 0)?,
            gas_levels,
            time_labels,
            actuator1: ActuatorStatus::from_raw(raw_field(latest, FeedField::Actuator1, 0)?),
            actuator2: ActuatorStatus::from_raw(raw_field(latest, FeedField::Actuator2, 0)?),
            acquired_at: Some(acquired_at),
        })
    }

    /// Temperature as gauge progress.
    pub fn temperature_progress(&self) -> f64 {
        self.temperature / 100.0
    }

    /// Humidity as gauge progress.
    pub fn humidity_progress(&self) -> f64 {
        self.humidity / 100.0
    }
}

fn sample_at(batch: &FeedBatch, age: usize) -> Result<&FeedSample, FeedError> {
    batch
        .get(age)
        .ok_or_else(|| FeedError::MalformedResponse(format!("feed entry {age} missing")))
}

fn raw_field(sample: &FeedSample, field: FeedField, age: usize) -> Result<&str, FeedError> {
    sample.field(field).ok_or_else(|| {
        FeedError::MalformedResponse(format!("{} missing in feed entry {age}", field.key()))
    })
}

fn numeric_field(sample: &FeedSample, field: FeedField, age: usize) -> Result<f64, FeedError> {
    let raw = raw_field(sample, field, age)?;

    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FeedError::MalformedResponse(format!(
            "{} of feed entry {age} is not a number: {raw:?}",
            field.key()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::timelabels::time_labels;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 3, 0)
            .unwrap()
    }

    fn labels() -> [String; WINDOW_LEN] {
        time_labels(&now().and_utc())
    }

    fn sample(field1: &str, field2: &str, field3: &str, field4: &str, field5: &str) -> FeedSample {
        FeedSample {
            field1: Some(field1.into()),
            field2: Some(field2.into()),
            field3: Some(field3.into()),
            field4: Some(field4.into()),
            field5: Some(field5.into()),
            ..Default::default()
        }
    }

    /// Newest first: field3 of age `n` is `gas[n]`.
    fn batch_with_gas(gas: &[&str]) -> FeedBatch {
        FeedBatch::newest_first(gas.iter().map(|g| sample("72", "45", g, "0", "1")).collect())
    }

    #[test]
    fn actuator_zero_is_off() {
        assert_eq!(ActuatorStatus::from_raw("0"), ActuatorStatus { active: false, speed: 0 });
    }

    #[test]
    fn actuator_other_values_are_on_at_sentinel_speed() {
        for raw in ["1", "255", "17", "on"] {
            assert_eq!(
                ActuatorStatus::from_raw(raw),
                ActuatorStatus { active: true, speed: 255 }
            );
        }
    }

    #[test]
    fn gas_levels_are_oldest_first() {
        let batch = batch_with_gas(&["6", "5", "4", "3", "2", "1", "0"]);

        let state = DisplayState::from_batch(&batch, labels(), now()).unwrap();

        assert_eq!(state.gas_levels, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn only_newest_window_is_read() {
        let batch = batch_with_gas(&["7", "6", "5", "4", "3", "2", "1", "not read"]);

        let state = DisplayState::from_batch(&batch, labels(), now()).unwrap();

        assert_eq!(state.gas_levels, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn short_batch_is_malformed() {
        let batch = batch_with_gas(&["1", "2", "3"]);

        let result = DisplayState::from_batch(&batch, labels(), now());

        assert_eq!(
            result,
            Err(FeedError::MalformedResponse(
                "expected at least 7 feed entries, got 3".into()
            ))
        );
    }

    #[test]
    fn empty_batch_is_malformed() {
        let result = DisplayState::from_batch(&FeedBatch::default(), labels(), now());

        assert_eq!(result, Err(FeedError::MalformedResponse("feed has no entries".into())));
    }

    #[test]
    fn non_numeric_gas_level_is_malformed() {
        let batch = batch_with_gas(&["1", "2", "3", "high", "5", "6", "7"]);

        let result = DisplayState::from_batch(&batch, labels(), now());

        assert_eq!(
            result,
            Err(FeedError::MalformedResponse(
                "field3 of feed entry 3 is not a number: \"high\"".into()
            ))
        );
    }

    #[test]
    fn missing_actuator_field_is_malformed() {
        let mut samples: Vec<_> = (0..7).map(|_| sample("20", "30", "1", "0", "0")).collect();
        samples[0].field5 = None;

        let result =
            DisplayState::from_batch(&FeedBatch::newest_first(samples), labels(), now());

        assert!(matches!(result, Err(FeedError::MalformedResponse(m)) if m.contains("field5")));
    }

    #[test]
    fn numbers_are_trimmed_and_decimal() {
        let mut samples: Vec<_> = (0..7).map(|_| sample("20", "30", "1", "0", "0")).collect();
        samples[0] = sample(" 23.75 ", "41.5", "1", "1", "0");

        let state =
            DisplayState::from_batch(&FeedBatch::newest_first(samples), labels(), now())
                .unwrap();

        assert_eq!(state.temperature, 23.75);
        assert_eq!(state.humidity, 41.5);
        assert_eq!(state.actuator1, ActuatorStatus::ON);
        assert_eq!(state.actuator2, ActuatorStatus::OFF);
        assert_eq!(state.acquired_at, Some(now()));
    }

    #[test]
    fn progress_divides_by_hundred() {
        let state = DisplayState::placeholder(labels());

        assert_eq!(state.temperature_progress(), 0.7);
        assert_eq!(state.humidity_progress(), 0.2);
        assert_eq!(state.acquired_at, None);
    }
}
