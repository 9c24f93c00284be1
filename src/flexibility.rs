// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
Characterization of overloads and the flexibility needed to avoid them.

An overload event is a maximal run of consecutive samples at or above a
power limit.  A [`FlexibilityNeed`] summarizes the events found in a load
timeseries: how often they occur, how large and long they are, and how much
time passes between them.
*/

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::aggregation::{aggregate_load_of_node, aggregate_load_through};
use crate::{BusId, Error, LoadPoints, RadialNetwork, Sample, Timeseries};

/// A maximal run of consecutive samples at or above a power limit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverloadEvent {
    /// Index of the first overloaded sample.
    pub start_index: usize,
    /// Index of the last overloaded sample.
    pub end_index: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Highest value during the event.
    pub peak: f64,
    pub peak_over_limit: f64,
    /// Energy above the limit, in value-hours.
    ///
    /// This is the max-Riemann sum of the excess over the limit, from the
    /// first overloaded sample up to and including the sample that ends the
    /// event.
    pub energy_over_limit: f64,
    /// Root mean square of the overloaded samples.
    pub rms: f64,
    /// Rate of change from the first overloaded sample to the peak, per hour.
    pub ramp_rate: f64,
}

impl OverloadEvent {
    /// Time from the first to the last overloaded sample.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    fn from_samples(samples: &[Sample], start: usize, end: usize, limit: f64) -> Self {
        let overloaded = &samples[start..=end];
        let (peak_offset, peak) = overloaded.iter().enumerate().fold(
            (0, f64::NEG_INFINITY),
            |best, (i, s)| if s.value > best.1 { (i, s.value) } else { best },
        );

        // The sample ending the event, if any, closes the last interval.
        let closing = (end + 1).min(samples.len() - 1);
        let excess = |s: &Sample| (s.value - limit).max(0.0);
        let energy_over_limit = samples[start..=closing]
            .windows(2)
            .map(|pair| {
                excess(&pair[0]).max(excess(&pair[1]))
                    * hours(pair[1].timestamp - pair[0].timestamp)
            })
            .sum();

        let rms = (overloaded.iter().map(|s| s.value.powi(2)).sum::<f64>()
            / overloaded.len() as f64)
            .sqrt();

        let first = &overloaded[0];
        let to_peak = hours(overloaded[peak_offset].timestamp - first.timestamp);
        let ramp_rate = if to_peak > 0.0 {
            (peak - first.value) / to_peak
        } else {
            0.0
        };

        Self {
            start_index: start,
            end_index: end,
            start: first.timestamp,
            end: samples[end].timestamp,
            peak,
            peak_over_limit: peak - limit,
            energy_over_limit,
            rms,
            ramp_rate,
        }
    }
}

fn hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

/// Returns the overload events of the given timeseries, in chronological
/// order.
///
/// An event starts at the first sample at or above `limit`, and ends before
/// the next sample below it.  An event still running at the end of the
/// timeseries ends at the last sample.
pub fn find_overloads(timeseries: &Timeseries, limit: f64) -> Vec<OverloadEvent> {
    let samples = timeseries.samples();
    let mut events = Vec::new();
    let mut start = None;

    for (i, sample) in samples.iter().enumerate() {
        match (sample.value >= limit, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                events.push(OverloadEvent::from_samples(samples, s, i - 1, limit));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        events.push(OverloadEvent::from_samples(samples, s, samples.len() - 1, limit));
    }

    tracing::debug!("Found {} overload events above {limit}.", events.len());
    events
}

/// The overload events of a load, with the time to recover after each.
#[derive(Clone, Debug, PartialEq)]
pub struct FlexibilityNeed {
    events: Vec<OverloadEvent>,
    recovery_times: Vec<Option<Duration>>,
}

impl FlexibilityNeed {
    /// Creates a `FlexibilityNeed` from the given events.
    ///
    /// The recovery time of an event is the time from its end to the start
    /// of the next event, and is `None` for the last event.
    pub fn new(mut events: Vec<OverloadEvent>) -> Self {
        events.sort_by_key(|e| e.start);
        let recovery_times = (0..events.len())
            .map(|i| events.get(i + 1).map(|next| next.start - events[i].end))
            .collect();
        Self {
            events,
            recovery_times,
        }
    }

    /// Finds the overload events of the given timeseries.
    pub fn from_timeseries(timeseries: &Timeseries, limit: f64) -> Self {
        Self::new(find_overloads(timeseries, limit))
    }

    pub fn events(&self) -> &[OverloadEvent] {
        &self.events
    }

    pub fn recovery_times(&self) -> &[Option<Duration>] {
        &self.recovery_times
    }

    /// Number of overload events.
    pub fn frequency(&self) -> usize {
        self.events.len()
    }

    pub fn max_peak_over_limit(&self) -> Option<f64> {
        self.events
            .iter()
            .map(|e| e.peak_over_limit)
            .reduce(f64::max)
    }

    pub fn mean_peak_over_limit(&self) -> Option<f64> {
        (!self.events.is_empty()).then(|| {
            self.events.iter().map(|e| e.peak_over_limit).sum::<f64>() / self.events.len() as f64
        })
    }

    /// Energy above the limit over all events, in value-hours.
    pub fn total_energy_over_limit(&self) -> f64 {
        self.events.iter().map(|e| e.energy_over_limit).sum()
    }

    pub fn mean_duration(&self) -> Option<Duration> {
        average(self.events.iter().map(OverloadEvent::duration))
    }

    /// Mean time between consecutive events.
    pub fn mean_recovery_time(&self) -> Option<Duration> {
        average(self.recovery_times.iter().flatten().copied())
    }
}

fn average(durations: impl Iterator<Item = Duration>) -> Option<Duration> {
    let (total, count) = durations.fold((Duration::zero(), 0), |(total, count), d| {
        (total + d, count + 1)
    });
    (count > 0).then(|| total / count)
}

/// The remaining capacity of a branch, relative to the peak of the load
/// flowing through it.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchMargin<I> {
    pub upstream_bus: I,
    pub downstream_bus: I,
    /// Thermal rating of the branch, in kW.
    pub rate_kw: f64,
    /// Peak of the load flowing through the branch, in kW.
    pub peak: f64,
    /// `rate_kw - peak`; negative when the branch is overloaded.
    pub margin: f64,
}

/// Returns the in-service branch of the radial with the smallest margin
/// between its thermal rating and the peak load flowing through it.
///
/// Branches with no load downstream are not considered, and `None` is
/// returned if no branch carries load.
pub fn find_branch_closest_to_overload<I: BusId>(
    loads: &LoadPoints<I>,
    network: &RadialNetwork<I>,
    reference: Option<&I>,
) -> Result<Option<BranchMargin<I>>, Error> {
    let tree = network.find_prev_and_next(reference)?;
    let mut closest: Option<BranchMargin<I>> = None;

    for branch in network.branches().filter(|br| br.in_service) {
        let (a, b) = (&branch.from_bus, &branch.to_bus);
        if !tree.contains(a) || !tree.contains(b) {
            continue;
        }
        let (upstream, downstream) = if tree.parent(b)? == Some(a) {
            (a, b)
        } else if tree.parent(a)? == Some(b) {
            (b, a)
        } else {
            continue;
        };

        let flow = aggregate_load_through(&tree, downstream, loads)?;
        let Some((_, peak)) = flow.max() else {
            continue;
        };
        let rate_kw = branch.rate_mva * 1000.0;
        let margin = rate_kw - peak;
        tracing::debug!("Branch ({upstream}, {downstream}): peak {peak} kW of {rate_kw} kW.");

        if closest.as_ref().map_or(true, |c| margin < c.margin) {
            closest = Some(BranchMargin {
                upstream_bus: upstream.clone(),
                downstream_bus: downstream.clone(),
                rate_kw,
                peak,
                margin,
            });
        }
    }

    Ok(closest)
}

/// Increases the load of `customer` until it induces overloads, and returns
/// the flexibility needed at the branch from `aggregation_bus` to
/// `downstream_bus`.
///
/// The customer's load is normalized so that its peak becomes `increase`
/// plus half of its old peak, and is then offset by half of `increase`.  The
/// new load replaces the old one in `loads`.  The load aggregated at
/// `aggregation_bus` is then checked against the thermal rating of the
/// branch, and `None` is returned if it is never reached.
pub fn increase_single_load<I: BusId>(
    customer: &I,
    increase: f64,
    aggregation_bus: &I,
    downstream_bus: &I,
    loads: &mut LoadPoints<I>,
    network: &RadialNetwork<I>,
    reference: Option<&I>,
) -> Result<Option<FlexibilityNeed>, Error> {
    let limit_kw = network.branch(aggregation_bus, downstream_bus)?.rate_mva * 1000.0;

    let load = loads
        .get_mut(customer)
        .ok_or_else(|| Error::node_not_found(format!("No load found for bus {customer}.")))?;
    let half_peak = load.max().map_or(0.0, |(_, peak)| peak / 2.0);
    load.normalize(increase + half_peak)?.offset(increase / 2.0);

    let aggregate = aggregate_load_of_node(aggregation_bus, loads, network, reference)?;
    let events = find_overloads(&aggregate, limit_kw);
    tracing::info!(
        "Increasing the load of {customer} by {increase} kW gives {} overloads at {aggregation_bus}.",
        events.len()
    );

    Ok((!events.is_empty()).then(|| FlexibilityNeed::new(events)))
}
