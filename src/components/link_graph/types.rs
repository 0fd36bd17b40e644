//! Graph element structures, both as received from the host and as held by
//! the graph instance.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::GraphError;

/// Ordered key/value data carried by an element.
pub type ElementData = Map<String, Value>;

/// Whether an element is a node or an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementGroup {
	/// A node.
	Nodes,
	/// An edge.
	Edges,
}

impl ElementGroup {
	/// Group name as used by the host.
	pub fn as_str(self) -> &'static str {
		match self {
			ElementGroup::Nodes => "nodes",
			ElementGroup::Edges => "edges",
		}
	}
}

/// A node or edge in the graph.
///
/// The data map is shared: cloning an element, or handing out its unfiltered
/// data, does not copy the map.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
	/// Unique id.
	pub id: String,
	/// Node or edge.
	pub group: ElementGroup,
	/// Shared data map.
	pub data: Rc<ElementData>,
}

impl Element {
	/// Build an element from its data map. The id is taken from `data.id`,
	/// which may be a string or a number.
	pub fn from_data(group: ElementGroup, data: ElementData) -> Result<Self, GraphError> {
		let id = match data.get("id") {
			Some(Value::String(s)) if !s.is_empty() => s.clone(),
			Some(Value::Number(n)) => n.to_string(),
			_ => {
				return Err(GraphError::MissingId {
					group: group.as_str(),
				});
			}
		};
		Ok(Self {
			id,
			group,
			data: Rc::new(data),
		})
	}

	/// Whether this is an edge.
	pub fn is_edge(&self) -> bool {
		self.group == ElementGroup::Edges
	}

	/// The element's `data.label`, if it is a string.
	pub fn label(&self) -> Option<&str> {
		self.data.get("label").and_then(Value::as_str)
	}

	/// Source node id (edges only).
	pub fn source(&self) -> Option<String> {
		self.endpoint("source")
	}

	/// Target node id (edges only).
	pub fn target(&self) -> Option<String> {
		self.endpoint("target")
	}

	fn endpoint(&self, key: &str) -> Option<String> {
		if !self.is_edge() {
			return None;
		}
		match self.data.get(key)? {
			Value::String(s) => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			_ => None,
		}
	}
}

/// An element definition as provided by the host: `{ "data": { ... } }`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ElementDef {
	/// Element data, including `id`.
	#[serde(default)]
	pub data: ElementData,
}

/// Complete graph input: nodes and edges.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GraphElements {
	/// Node definitions.
	#[serde(default)]
	pub nodes: Vec<ElementDef>,
	/// Edge definitions.
	#[serde(default)]
	pub edges: Vec<ElementDef>,
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn data(value: Value) -> ElementData {
		value.as_object().cloned().unwrap_or_default()
	}

	#[test]
	fn numeric_ids_are_stringified() {
		let el = Element::from_data(ElementGroup::Nodes, data(json!({"id": 7}))).unwrap();
		assert_eq!(el.id, "7");
	}

	#[test]
	fn missing_id_is_rejected() {
		let err = Element::from_data(ElementGroup::Edges, data(json!({"label": "x"}))).unwrap_err();
		assert!(matches!(err, GraphError::MissingId { group: "edges" }));
	}

	#[test]
	fn endpoints_only_exist_on_edges() {
		let node = Element::from_data(
			ElementGroup::Nodes,
			data(json!({"id": "a", "source": "b"})),
		)
		.unwrap();
		assert_eq!(node.source(), None);

		let edge = Element::from_data(
			ElementGroup::Edges,
			data(json!({"id": "e", "source": "a", "target": 2})),
		)
		.unwrap();
		assert_eq!(edge.source().as_deref(), Some("a"));
		assert_eq!(edge.target().as_deref(), Some("2"));
	}

	#[test]
	fn parses_host_elements() {
		let raw = r#"{"nodes":[{"data":{"id":"a","label":"Person"}}],"edges":[]}"#;
		let elements: GraphElements = serde_json::from_str(raw).unwrap();
		assert_eq!(elements.nodes.len(), 1);
		assert_eq!(elements.nodes[0].data["label"], "Person");
	}
}
