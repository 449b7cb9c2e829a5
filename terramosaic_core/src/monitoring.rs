//! Timestamps and min/max gauges for queue depths and cache size (§4.13).
//!
//! Owned by the orchestrator and threaded into the writer loop. Only the writer mutates the
//! gauges (§5: "written only by the writer thread... so need no synchronization"), so this
//! type carries no internal locking.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// A running min/max over values observed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinMax {
	pub min: u64,
	pub max: u64,
}

impl MinMax {
	fn update(&mut self, value: u64) {
		self.min = self.min.min(value);
		self.max = self.max.max(value);
	}
}

/// Start/end timestamps (milliseconds since the Unix epoch) for one named phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTiming {
	pub start: u64,
	pub end: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Monitoring {
	params: BTreeMap<String, String>,
	timestamps: BTreeMap<String, PhaseTiming>,
	block_cache_size: Option<MinMax>,
	block_queue_size: Option<MinMax>,
}

impl Monitoring {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_param(&mut self, key: &str, value: impl ToString) {
		self.params.insert(key.to_string(), value.to_string());
	}

	#[must_use]
	pub fn params(&self) -> &BTreeMap<String, String> {
		&self.params
	}

	pub fn start_phase(&mut self, name: &str) {
		self.timestamps.insert(name.to_string(), PhaseTiming { start: now_millis(), end: None });
	}

	pub fn end_phase(&mut self, name: &str) {
		if let Some(timing) = self.timestamps.get_mut(name) {
			timing.end = Some(now_millis());
		}
	}

	#[must_use]
	pub fn timestamps(&self) -> &BTreeMap<String, PhaseTiming> {
		&self.timestamps
	}

	pub fn update_block_cache_size(&mut self, size: usize) {
		update_gauge(&mut self.block_cache_size, size as u64);
	}

	pub fn update_block_queue_size(&mut self, size: usize) {
		update_gauge(&mut self.block_queue_size, size as u64);
	}

	#[must_use]
	pub fn block_cache_size(&self) -> Option<MinMax> {
		self.block_cache_size
	}

	#[must_use]
	pub fn block_queue_size(&self) -> Option<MinMax> {
		self.block_queue_size
	}
}

fn update_gauge(gauge: &mut Option<MinMax>, value: u64) {
	match gauge {
		Some(g) => g.update(value),
		None => *gauge = Some(MinMax { min: value, max: value }),
	}
}

fn now_millis() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gauge_tracks_min_and_max_across_updates() {
		let mut m = Monitoring::new();
		m.update_block_cache_size(3);
		m.update_block_cache_size(1);
		m.update_block_cache_size(7);
		let gauge = m.block_cache_size().unwrap();
		assert_eq!(gauge.min, 1);
		assert_eq!(gauge.max, 7);
	}

	#[test]
	fn phase_timing_records_start_and_end() {
		let mut m = Monitoring::new();
		m.start_phase("analysis");
		m.end_phase("analysis");
		let timing = m.timestamps()["analysis"];
		assert!(timing.end.unwrap() >= timing.start);
	}
}
