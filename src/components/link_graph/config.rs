//! Host-supplied configuration.
//!
//! Everything here is deserialized once from the host's props and then held
//! immutably.

use std::collections::HashMap;

use serde::Deserialize;

use super::layout::LayoutConfig;
use super::listeners::ListenerSpec;
use super::style::StyleState;
use super::types::{Element, GraphElements};

/// Which data keys are shown for a selected element.
///
/// Per-label maps take priority (an explicit empty list counts as defined),
/// then the deprecated global lists, then no restriction.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisibleProps {
	/// Node label to allowed data keys.
	pub node_visible_props: HashMap<String, Vec<String>>,
	/// Edge label to allowed data keys.
	pub edge_visible_props: HashMap<String, Vec<String>>,
	/// Deprecated: use `node_visible_props`.
	pub visible_node_data_keys: Option<Vec<String>>,
	/// Deprecated: use `edge_visible_props`.
	pub visible_edge_data_keys: Option<Vec<String>>,
}

impl VisibleProps {
	/// The allow-list for `element`, or `None` for "show everything".
	pub fn allowed_keys(&self, element: &Element) -> Option<&[String]> {
		let (per_label, global) = if element.is_edge() {
			(&self.edge_visible_props, &self.visible_edge_data_keys)
		} else {
			(&self.node_visible_props, &self.visible_node_data_keys)
		};
		element
			.label()
			.and_then(|label| per_label.get(label))
			.or(global.as_ref())
			.map(Vec::as_slice)
	}
}

fn default_container() -> String {
	"cy".to_string()
}

/// The complete props bag the host page hands to the component.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphProps {
	/// Nodes and edges to display.
	#[serde(default)]
	pub elements: GraphElements,
	/// Initial theme and custom style rules.
	#[serde(default)]
	pub style: StyleState,
	/// Initial layout.
	#[serde(default)]
	pub layout: LayoutConfig,
	/// Events reported back to the host.
	#[serde(default)]
	pub listeners: Vec<ListenerSpec>,
	/// Data keys shown for selected elements.
	#[serde(flatten)]
	pub visible: VisibleProps,
	/// Canvas height in pixels; the parent's height when unset.
	#[serde(default)]
	pub height: Option<f64>,
	/// Id of the canvas element.
	#[serde(default = "default_container")]
	pub container_id: String,
}

impl Default for GraphProps {
	fn default() -> Self {
		Self {
			elements: GraphElements::default(),
			style: StyleState::default(),
			layout: LayoutConfig::default(),
			listeners: Vec::new(),
			visible: VisibleProps::default(),
			height: None,
			container_id: default_container(),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::{Value, json};

	use super::*;
	use crate::components::link_graph::types::ElementGroup;

	fn element(group: ElementGroup, data: Value) -> Element {
		Element::from_data(group, data.as_object().cloned().unwrap()).unwrap()
	}

	fn keys(list: Option<&[String]>) -> Option<Vec<&str>> {
		list.map(|l| l.iter().map(String::as_str).collect())
	}

	#[test]
	fn per_label_beats_global() {
		let props: VisibleProps = serde_json::from_value(json!({
			"node_visible_props": {"Person": ["name"], "Hidden": []},
			"visible_node_data_keys": ["id"]
		}))
		.unwrap();

		let person = element(ElementGroup::Nodes, json!({"id": "1", "label": "Person"}));
		assert_eq!(keys(props.allowed_keys(&person)), Some(vec!["name"]));

		let hidden = element(ElementGroup::Nodes, json!({"id": "2", "label": "Hidden"}));
		assert_eq!(keys(props.allowed_keys(&hidden)), Some(vec![]));

		let other = element(ElementGroup::Nodes, json!({"id": "3", "label": "Org"}));
		assert_eq!(keys(props.allowed_keys(&other)), Some(vec!["id"]));

		let unlabeled = element(ElementGroup::Nodes, json!({"id": "4"}));
		assert_eq!(keys(props.allowed_keys(&unlabeled)), Some(vec!["id"]));
	}

	#[test]
	fn groups_are_resolved_independently() {
		let props: VisibleProps = serde_json::from_value(json!({
			"node_visible_props": {"knows": ["name"]},
			"visible_edge_data_keys": ["weight"]
		}))
		.unwrap();
		let edge = element(
			ElementGroup::Edges,
			json!({"id": "e", "label": "knows", "source": "a", "target": "b"}),
		);
		assert_eq!(keys(props.allowed_keys(&edge)), Some(vec!["weight"]));
	}

	#[test]
	fn nothing_configured_means_no_restriction() {
		let props = VisibleProps::default();
		let node = element(ElementGroup::Nodes, json!({"id": "1", "label": "Person"}));
		assert_eq!(props.allowed_keys(&node), None);
	}

	#[test]
	fn host_props_parse_with_defaults() {
		let props: GraphProps = serde_json::from_value(json!({
			"elements": {"nodes": [{"data": {"id": "a"}}]},
			"layout": {"name": "dagre"},
			"listeners": [{"name": "expand", "event_type": "dbltap", "selector": "node", "debounce": 250}],
			"edge_visible_props": {"knows": ["since"]}
		}))
		.unwrap();
		assert_eq!(props.container_id, "cy");
		assert_eq!(props.layout.name, "dagre");
		assert_eq!(props.listeners[0].debounce, 250);
		assert_eq!(props.visible.edge_visible_props["knows"], vec!["since"]);
		assert!(props.visible.visible_node_data_keys.is_none());
	}

	#[test]
	fn odd_listener_debounce_keeps_the_rest_of_the_props() {
		let props: GraphProps = serde_json::from_value(json!({
			"elements": {"nodes": [{"data": {"id": "a"}}]},
			"listeners": [{"name": "expand", "event_type": "dbltap", "debounce": 120.5}],
			"node_visible_props": {"Person": ["name"]}
		}))
		.unwrap();
		assert_eq!(props.elements.nodes.len(), 1);
		assert_eq!(props.listeners[0].debounce, 121);
		assert_eq!(props.visible.node_visible_props["Person"], vec!["name"]);
	}
}
