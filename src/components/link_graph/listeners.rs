//! Host-declared listeners and the reports sent back to the host.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use super::events::EventType;
use super::types::ElementGroup;

/// Lower bound for a listener's debounce window.
pub const MIN_LISTENER_DEBOUNCE_MS: u64 = 100;

/// Maps graph events on matching elements to a named host action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListenerSpec {
	/// Action name reported to the host.
	pub name: String,
	/// One or more space-separated event names, e.g. `"dbltap"`.
	pub event_type: String,
	/// Restricts the listener to matching elements.
	#[serde(default)]
	pub selector: Option<String>,
	/// Requested debounce in milliseconds.
	#[serde(default, deserialize_with = "lenient_millis")]
	pub debounce: u64,
}

/// Accept any JSON number (or null) as milliseconds: fractions are rounded,
/// negative and non-finite values become 0.
fn lenient_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
	let raw = Option::<f64>::deserialize(deserializer)?;
	Ok(raw
		.filter(|ms| ms.is_finite())
		.map_or(0, |ms| ms.max(0.0).round() as u64))
}

impl ListenerSpec {
	/// A listener spec.
	pub fn new(name: &str, event_type: &str, selector: Option<&str>, debounce: u64) -> Self {
		Self {
			name: name.to_string(),
			event_type: event_type.to_string(),
			selector: selector.map(str::to_string),
			debounce,
		}
	}

	/// The debounce actually applied: never below
	/// [`MIN_LISTENER_DEBOUNCE_MS`].
	pub fn effective_debounce(&self) -> Duration {
		Duration::from_millis(self.debounce.max(MIN_LISTENER_DEBOUNCE_MS))
	}
}

/// Payload of an [`ActionReport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
	/// Event that fired.
	#[serde(rename = "type")]
	pub kind: EventType,
	/// Id of the event target.
	pub target_id: String,
	/// Group of the event target.
	pub target_group: ElementGroup,
}

/// One fired listener, as reported to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
	/// Listener name.
	pub action: String,
	/// Event details.
	pub data: ActionData,
	/// Milliseconds since the Unix epoch.
	pub timestamp: u64,
}

/// Receives action reports.
pub trait ReportSink {
	/// Deliver one report.
	fn send(&self, report: &ActionReport);
}

impl<F: Fn(&ActionReport)> ReportSink for F {
	fn send(&self, report: &ActionReport) {
		self(report)
	}
}

/// Posts reports to the parent frame as component values.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParentFrameSink;

impl ReportSink for ParentFrameSink {
	fn send(&self, report: &ActionReport) {
		let message = json!({
			"isStreamlitMessage": true,
			"type": "streamlit:setComponentValue",
			"value": report,
			"dataType": "json",
		});
		let Some(target) = web_sys::window().and_then(|w| w.parent().ok().flatten()) else {
			log::warn!("link-graph: no parent frame, dropping `{}` report", report.action);
			return;
		};
		let value = match js_sys::JSON::parse(&message.to_string()) {
			Ok(value) => value,
			Err(e) => {
				log::warn!("link-graph: could not encode report: {:?}", e);
				return;
			}
		};
		if let Err(e) = target.post_message(&value, "*") {
			log::warn!("link-graph: postMessage failed: {:?}", e);
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn debounce_has_a_floor() {
		assert_eq!(
			ListenerSpec::new("expand", "dbltap", None, 0).effective_debounce(),
			Duration::from_millis(100)
		);
		assert_eq!(
			ListenerSpec::new("expand", "dbltap", None, 450).effective_debounce(),
			Duration::from_millis(450)
		);
	}

	#[test]
	fn report_wire_shape() {
		let report = ActionReport {
			action: "expand".into(),
			data: ActionData {
				kind: EventType::DblTap,
				target_id: "n1".into(),
				target_group: ElementGroup::Nodes,
			},
			timestamp: 1_700_000_000_000,
		};
		assert_eq!(
			serde_json::to_value(&report).unwrap(),
			json!({
				"action": "expand",
				"data": {"type": "dbltap", "target_id": "n1", "target_group": "nodes"},
				"timestamp": 1_700_000_000_000u64
			})
		);
	}

	#[test]
	fn listener_defaults() {
		let listener: ListenerSpec =
			serde_json::from_value(json!({"name": "remove", "event_type": "cxttap"})).unwrap();
		assert_eq!(listener.selector, None);
		assert_eq!(listener.debounce, 0);
	}

	#[test]
	fn debounce_accepts_any_js_number() {
		let parse = |debounce: serde_json::Value| -> u64 {
			let listener: ListenerSpec = serde_json::from_value(
				json!({"name": "expand", "event_type": "dbltap", "debounce": debounce}),
			)
			.unwrap();
			listener.debounce
		};
		assert_eq!(parse(json!(250)), 250);
		assert_eq!(parse(json!(250.6)), 251);
		assert_eq!(parse(json!(-20)), 0);
		assert_eq!(parse(json!(null)), 0);
	}
}
