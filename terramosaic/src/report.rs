//! Renders a [`Monitoring`] snapshot as a JSON report (§4.13, C14).
//!
//! Hand-rolled rather than built on `serde_json`: monitoring is an external-collaborator
//! concern by design, so its concrete JSON shape belongs to the CLI, not the core library.

use terramosaic_core::Monitoring;

/// Serializes `monitoring` into a single-line JSON object.
#[must_use]
pub fn stringify(monitoring: &Monitoring) -> String {
	let mut fields = Vec::new();

	let params: Vec<String> = monitoring
		.params()
		.iter()
		.map(|(key, value)| format!("{}:{}", json_string(key), json_string(value)))
		.collect();
	fields.push(format!("\"params\":{{{}}}", params.join(",")));

	let timestamps: Vec<String> = monitoring
		.timestamps()
		.iter()
		.map(|(name, timing)| {
			let end = timing.end.map_or("null".to_string(), |e| e.to_string());
			format!("{}:{{\"start\":{},\"end\":{}}}", json_string(name), timing.start, end)
		})
		.collect();
	fields.push(format!("\"timestamps\":{{{}}}", timestamps.join(",")));

	if let Some(gauge) = monitoring.block_cache_size() {
		fields.push(format!("\"blockCacheSize\":{{\"min\":{},\"max\":{}}}", gauge.min, gauge.max));
	}
	if let Some(gauge) = monitoring.block_queue_size() {
		fields.push(format!("\"blockQueueSize\":{{\"min\":{},\"max\":{}}}", gauge.min, gauge.max));
	}

	format!("{{{}}}", fields.join(","))
}

fn json_string(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len() + 2);
	escaped.push('"');
	for c in input.chars() {
		match c {
			'"' => escaped.push_str("\\\""),
			'\\' => escaped.push_str("\\\\"),
			'\n' => escaped.push_str("\\n"),
			'\r' => escaped.push_str("\\r"),
			'\t' => escaped.push_str("\\t"),
			c if c.is_control() => escaped.push_str(&format!("\\u{:04x}", c as u32)),
			c => escaped.push(c),
		}
	}
	escaped.push('"');
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_params_and_timestamps() {
		let mut monitoring = Monitoring::new();
		monitoring.set_param("numThreads", 4);
		monitoring.start_phase("analysis");
		monitoring.end_phase("analysis");
		monitoring.update_block_cache_size(2);

		let json = stringify(&monitoring);
		assert!(json.contains("\"numThreads\":\"4\""));
		assert!(json.contains("\"analysis\":{\"start\":"));
		assert!(json.contains("\"blockCacheSize\":{\"min\":2,\"max\":2}"));
	}

	#[test]
	fn escapes_special_characters_in_keys() {
		assert_eq!(json_string("a\"b"), "\"a\\\"b\"");
	}
}
