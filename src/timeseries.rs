// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Load timeseries and the arithmetic used when aggregating them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A single datapoint of a [`Timeseries`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// An ordered sequence of samples with strictly increasing timestamps.
///
/// The empty timeseries is the identity element of [`Timeseries::add`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct Timeseries {
    samples: Vec<Sample>,
}

impl TryFrom<Vec<Sample>> for Timeseries {
    type Error = Error;

    fn try_from(samples: Vec<Sample>) -> Result<Self, Self::Error> {
        Self::try_new(samples)
    }
}

impl From<Timeseries> for Vec<Sample> {
    fn from(ts: Timeseries) -> Self {
        ts.samples
    }
}

impl Timeseries {
    /// Creates an empty timeseries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a timeseries from the given samples.
    ///
    /// Returns an error if the timestamps are not strictly increasing.
    pub fn try_new(samples: Vec<Sample>) -> Result<Self, Error> {
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[0].timestamp >= pair[1].timestamp)
        {
            return Err(Error::invalid_timeseries(format!(
                "Timestamps must be strictly increasing. Found {} followed by {}.",
                pair[0].timestamp, pair[1].timestamp
            )));
        }
        Ok(Self { samples })
    }

    /// Creates a timeseries from `(timestamp, value)` pairs.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (NaiveDateTime, f64)>,
    ) -> Result<Self, Error> {
        Self::try_new(
            pairs
                .into_iter()
                .map(|(timestamp, value)| Sample::new(timestamp, value))
                .collect(),
        )
    }

    /// Creates a timeseries with all values set to zero on the given
    /// timestamps.
    pub(crate) fn zeros_like(other: &Timeseries) -> Self {
        Self {
            samples: other
                .samples
                .iter()
                .map(|s| Sample::new(s.timestamp, 0.0))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.samples.iter().map(|s| s.timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Returns the value at the given timestamp, if there is a sample for it.
    pub fn value_at(&self, timestamp: NaiveDateTime) -> Option<f64> {
        self.samples
            .binary_search_by(|s| s.timestamp.cmp(&timestamp))
            .ok()
            .map(|i| self.samples[i].value)
    }

    /// Returns the highest value and its index, or `None` for an empty
    /// timeseries.
    pub fn max(&self) -> Option<(usize, f64)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.value))
            .fold(None, |acc, (i, v)| match acc {
                Some((_, best)) if best >= v => acc,
                _ => Some((i, v)),
            })
    }

    /// Returns the sum of the two timeseries.
    ///
    /// Timeseries of equal length are assumed to share their timestamps, and
    /// the timestamps of `self` are kept.  When the lengths differ, the
    /// longer timeseries is split at the first timestamp matching the start
    /// of the shorter one: the samples overlapping the shorter timeseries are
    /// summed with it, and those before and after the overlap are kept
    /// unchanged.
    ///
    /// Returns an error if no sample of the longer timeseries matches the
    /// start of the shorter one, or if the shorter one runs past its end.
    pub fn add(&self, other: &Timeseries) -> Result<Timeseries, Error> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }

        if self.len() == other.len() {
            return Ok(Timeseries {
                samples: self
                    .samples
                    .iter()
                    .zip(&other.samples)
                    .map(|(a, b)| Sample::new(a.timestamp, a.value + b.value))
                    .collect(),
            });
        }

        tracing::warn!(
            "Adding timeseries of mismatching lengths: {} and {}.",
            self.len(),
            other.len()
        );

        let (shortest, longest) = if self.len() < other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let first = shortest.samples[0].timestamp;
        let Some(split) = longest.samples.iter().position(|s| s.timestamp == first) else {
            return Err(Error::timeseries_mismatch(format!(
                "No sample at {first} in the longer timeseries to align the shorter one with."
            )));
        };

        let (head, tail) = longest.samples.split_at(split);
        if tail.len() < shortest.len() {
            return Err(Error::timeseries_mismatch(format!(
                "Timeseries of {} samples starting at {first} overruns the longer timeseries \
                 by {} samples.",
                shortest.len(),
                shortest.len() - tail.len()
            )));
        }
        let (matched, rest) = tail.split_at(shortest.len());

        let mut samples = head.to_vec();
        samples.extend(
            matched
                .iter()
                .zip(&shortest.samples)
                .map(|(a, b)| Sample::new(a.timestamp, a.value + b.value)),
        );
        samples.extend_from_slice(rest);
        Ok(Timeseries { samples })
    }

    /// Offsets all values by `delta`.
    pub fn offset(&mut self, delta: f64) -> &mut Self {
        self.samples.iter_mut().for_each(|s| s.value += delta);
        self
    }

    /// Scales all values by `factor`.
    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.samples.iter_mut().for_each(|s| s.value *= factor);
        self
    }

    /// Scales the timeseries so that its highest value becomes `new_max`.
    pub fn normalize(&mut self, new_max: f64) -> Result<&mut Self, Error> {
        match self.max() {
            Some((_, old_max)) if old_max != 0.0 => Ok(self.scale(new_max / old_max)),
            Some(_) => Err(Error::invalid_timeseries(
                "Can't normalize a timeseries whose maximum is zero.",
            )),
            None => Err(Error::invalid_timeseries(
                "Can't normalize an empty timeseries.",
            )),
        }
    }

    /// Returns the load duration curve: all values sorted from highest to
    /// lowest.
    pub fn load_duration_curve(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.values().collect();
        values.sort_by(|a, b| b.total_cmp(a));
        values
    }
}
