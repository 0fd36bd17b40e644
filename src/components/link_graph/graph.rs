//! The graph instance: element store with per-element classes, selection
//! flags and positions, plus the style sheet and layout registry applied to it.

use std::collections::{BTreeSet, HashMap};

use super::error::GraphError;
use super::layout::{Bounds, LayoutConfig, LayoutRegistry, Position};
use super::selector::Selector;
use super::style::{ElementStyle, StyleRule, StyleSheet};
use super::types::{Element, ElementGroup, GraphElements};

/// Borrowed view of an element together with its mutable display state.
/// This is what selectors and style rules are evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct ElementState<'a> {
	/// The element itself.
	pub element: &'a Element,
	/// Classes currently applied.
	pub classes: &'a BTreeSet<String>,
	/// Whether the element is selected.
	pub selected: bool,
}

#[derive(Clone, Debug)]
struct Entry {
	element: Element,
	classes: BTreeSet<String>,
	selected: bool,
	position: Position,
}

impl Entry {
	fn state(&self) -> ElementState<'_> {
		ElementState {
			element: &self.element,
			classes: &self.classes,
			selected: self.selected,
		}
	}
}

/// A graph of nodes and edges bound to a viewport.
pub struct Graph {
	entries: Vec<Entry>,
	index: HashMap<String, usize>,
	viewport: Bounds,
	style: StyleSheet,
	layouts: LayoutRegistry,
	hovered: Option<usize>,
}

impl Graph {
	/// Build a graph from host elements. Nodes are inserted before edges so that
	/// every edge endpoint can be checked.
	pub fn new(
		elements: &GraphElements,
		viewport: Bounds,
		layouts: LayoutRegistry,
	) -> Result<Self, GraphError> {
		let mut graph = Self {
			entries: Vec::with_capacity(elements.nodes.len() + elements.edges.len()),
			index: HashMap::new(),
			viewport,
			style: StyleSheet::default(),
			layouts,
			hovered: None,
		};

		for def in &elements.nodes {
			graph.insert(Element::from_data(ElementGroup::Nodes, def.data.clone())?)?;
		}
		for def in &elements.edges {
			let edge = Element::from_data(ElementGroup::Edges, def.data.clone())?;
			for endpoint in [edge.source(), edge.target()] {
				let node = endpoint.unwrap_or_default();
				if !is_node(&graph.index, &graph.entries, &node) {
					return Err(GraphError::MissingEndpoint {
						edge: edge.id.clone(),
						node,
					});
				}
			}
			graph.insert(edge)?;
		}

		graph.seed_positions();
		Ok(graph)
	}

	fn insert(&mut self, element: Element) -> Result<(), GraphError> {
		if self.index.contains_key(&element.id) {
			return Err(GraphError::DuplicateId(element.id));
		}
		self.index.insert(element.id.clone(), self.entries.len());
		self.entries.push(Entry {
			element,
			classes: BTreeSet::new(),
			selected: false,
			position: Position::default(),
		});
		Ok(())
	}

	/// Place nodes on a circle around the viewport center until a layout runs.
	fn seed_positions(&mut self) {
		let ids: Vec<String> = self.nodes().map(|n| n.id.clone()).collect();
		if ids.is_empty() {
			return;
		}
		let (cx, cy) = self.viewport.center();
		let n = ids.len() as f64;
		for (i, id) in ids.iter().enumerate() {
			let angle = i as f64 * std::f64::consts::TAU / n;
			self.set_position(
				id,
				Position {
					x: cx + 100.0 * angle.cos(),
					y: cy + 100.0 * angle.sin(),
				},
			);
		}
	}

	/// Number of elements (nodes and edges).
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the graph has no elements.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Area layouts fit into.
	pub fn viewport(&self) -> Bounds {
		self.viewport
	}

	/// Element by id.
	pub fn get(&self, id: &str) -> Option<&Element> {
		self.entry(id).map(|e| &e.element)
	}

	fn entry(&self, id: &str) -> Option<&Entry> {
		self.index.get(id).map(|&i| &self.entries[i])
	}

	fn entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
		self.index.get(id).map(|&i| &mut self.entries[i])
	}

	/// Display state of a single element.
	pub fn state(&self, id: &str) -> Option<ElementState<'_>> {
		self.entry(id).map(Entry::state)
	}

	/// All elements in insertion order (nodes first).
	pub fn elements(&self) -> impl Iterator<Item = &Element> {
		self.entries.iter().map(|e| &e.element)
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = &Element> {
		self.elements().filter(|e| !e.is_edge())
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> impl Iterator<Item = &Element> {
		self.elements().filter(|e| e.is_edge())
	}

	/// Ids of elements matching `selector`.
	pub fn filter(&self, selector: &Selector) -> Vec<String> {
		self.entries
			.iter()
			.filter(|e| selector.matches(&e.state()))
			.map(|e| e.element.id.clone())
			.collect()
	}

	/// Whether `id` is selected.
	pub fn is_selected(&self, id: &str) -> bool {
		self.entry(id).is_some_and(|e| e.selected)
	}

	/// Ids of the current multi-selection, in element order.
	pub fn selected(&self) -> Vec<String> {
		self.entries
			.iter()
			.filter(|e| e.selected)
			.map(|e| e.element.id.clone())
			.collect()
	}

	/// Set the selection flag; returns `true` if it changed.
	pub fn set_selected(&mut self, id: &str, selected: bool) -> bool {
		match self.entry_mut(id) {
			Some(entry) if entry.selected != selected => {
				entry.selected = selected;
				true
			}
			_ => false,
		}
	}

	/// Add `class` to element `id`.
	pub fn add_class(&mut self, id: &str, class: &str) {
		if let Some(entry) = self.entry_mut(id) {
			entry.classes.insert(class.to_string());
		}
	}

	/// Whether element `id` carries `class`.
	pub fn has_class(&self, id: &str, class: &str) -> bool {
		self.entry(id).is_some_and(|e| e.classes.contains(class))
	}

	/// Remove `class` from every element.
	pub fn clear_class(&mut self, class: &str) {
		for entry in &mut self.entries {
			entry.classes.remove(class);
		}
	}

	/// Ids of elements carrying `class`.
	pub fn with_class(&self, class: &str) -> Vec<String> {
		self.entries
			.iter()
			.filter(|e| e.classes.contains(class))
			.map(|e| e.element.id.clone())
			.collect()
	}

	/// Edges incident to the node `id`.
	pub fn connected_edges(&self, id: &str) -> Vec<String> {
		self.edges()
			.filter(|e| {
				e.source().as_deref() == Some(id) || e.target().as_deref() == Some(id)
			})
			.map(|e| e.id.clone())
			.collect()
	}

	/// Endpoint nodes of the edge `id`.
	pub fn connected_nodes(&self, id: &str) -> Vec<String> {
		let Some(edge) = self.get(id).filter(|e| e.is_edge()) else {
			return Vec::new();
		};
		let mut nodes: Vec<String> = [edge.source(), edge.target()].into_iter().flatten().collect();
		nodes.dedup();
		nodes
	}

	/// Source and target ids of every edge, for layouts.
	pub fn edge_endpoints(&self) -> Vec<(String, String)> {
		self.edges()
			.filter_map(|e| Some((e.source()?, e.target()?)))
			.collect()
	}

	/// Node position. Edges report the midpoint of their endpoints.
	pub fn position(&self, id: &str) -> Option<Position> {
		let entry = self.entry(id)?;
		if entry.element.is_edge() {
			let s = self.position(&entry.element.source()?)?;
			let t = self.position(&entry.element.target()?)?;
			return Some(Position {
				x: (s.x + t.x) / 2.0,
				y: (s.y + t.y) / 2.0,
			});
		}
		Some(entry.position)
	}

	/// Move a node.
	pub fn set_position(&mut self, id: &str, position: Position) {
		if let Some(entry) = self.entry_mut(id) {
			entry.position = position;
		}
	}

	/// Element under the pointer.
	pub fn hovered(&self) -> Option<&Element> {
		self.hovered.map(|i| &self.entries[i].element)
	}

	/// Record the hovered element, returning the previous one's id.
	pub fn set_hovered(&mut self, id: Option<&str>) -> Option<String> {
		let next = id.and_then(|id| self.index.get(id).copied());
		let previous = std::mem::replace(&mut self.hovered, next);
		previous.map(|i| self.entries[i].element.id.clone())
	}

	/// Find the element under a graph-space point. Nodes win over edges.
	pub fn element_at(&self, x: f64, y: f64) -> Option<String> {
		// Topmost (last inserted) node first.
		let node = self.entries.iter().rev().map(|e| &e.element).filter(|e| !e.is_edge()).find(|n| {
			let (Some(pos), Some(style)) = (self.position(&n.id), self.resolved_style(&n.id)) else {
				return false;
			};
			let (dx, dy) = (pos.x - x, pos.y - y);
			(dx * dx + dy * dy).sqrt() <= style.size / 2.0
		});
		if let Some(node) = node {
			return Some(node.id.clone());
		}

		self.edges()
			.find(|e| {
				let (Some(s), Some(t)) = (
					e.source().and_then(|s| self.position(&s)),
					e.target().and_then(|t| self.position(&t)),
				) else {
					return false;
				};
				let tolerance = self.resolved_style(&e.id).map_or(2.0, |st| st.width / 2.0 + 3.0);
				distance_to_segment((x, y), (s.x, s.y), (t.x, t.y)) <= tolerance
			})
			.map(|e| e.id.clone())
	}

	/// Replace the style sheet.
	pub fn set_style(&mut self, rules: Vec<StyleRule>) {
		self.style = StyleSheet::compile(rules);
	}

	/// The active style sheet.
	pub fn style(&self) -> &StyleSheet {
		&self.style
	}

	/// Style for one element after applying every matching rule in order.
	pub fn resolved_style(&self, id: &str) -> Option<ElementStyle> {
		self.state(id).map(|s| self.style.resolve(&s))
	}

	/// Run a registered layout and apply the resulting node positions.
	pub fn run_layout(&mut self, config: &LayoutConfig) -> Result<(), GraphError> {
		let layout = self
			.layouts
			.get(&config.name)
			.ok_or_else(|| GraphError::UnknownLayout(config.name.clone()))?;
		let positions = layout.run(self, config);
		log::debug!(
			"link-graph: layout `{}` placed {} nodes",
			config.name,
			positions.len()
		);
		for (id, position) in positions {
			self.set_position(&id, position);
		}
		Ok(())
	}
}

fn is_node(index: &HashMap<String, usize>, entries: &[Entry], id: &str) -> bool {
	index
		.get(id)
		.is_some_and(|&i| entries[i].element.group == ElementGroup::Nodes)
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq < f64::EPSILON {
		0.0
	} else {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
	((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn sample() -> Graph {
		let elements: GraphElements = serde_json::from_value(json!({
			"nodes": [
				{"data": {"id": "a", "label": "Person"}},
				{"data": {"id": "b", "label": "Person"}},
				{"data": {"id": "c", "label": "Org"}}
			],
			"edges": [
				{"data": {"id": "ab", "label": "knows", "source": "a", "target": "b"}},
				{"data": {"id": "ac", "label": "works_at", "source": "a", "target": "c"}}
			]
		}))
		.unwrap();
		Graph::new(&elements, Bounds::new(800.0, 600.0), LayoutRegistry::with_builtins()).unwrap()
	}

	#[test]
	fn connectivity() {
		let g = sample();
		assert_eq!(g.connected_edges("a"), vec!["ab", "ac"]);
		assert_eq!(g.connected_edges("c"), vec!["ac"]);
		assert_eq!(g.connected_nodes("ab"), vec!["a", "b"]);
		assert!(g.connected_nodes("a").is_empty());
	}

	#[test]
	fn rejects_dangling_edges_and_duplicates() {
		let dangling: GraphElements = serde_json::from_value(json!({
			"nodes": [{"data": {"id": "a"}}],
			"edges": [{"data": {"id": "e", "source": "a", "target": "zz"}}]
		}))
		.unwrap();
		let err = Graph::new(&dangling, Bounds::new(1.0, 1.0), LayoutRegistry::default())
			.err()
			.unwrap();
		assert!(matches!(err, GraphError::MissingEndpoint { ref node, .. } if node == "zz"));

		let duplicate: GraphElements = serde_json::from_value(json!({
			"nodes": [{"data": {"id": "a"}}, {"data": {"id": "a"}}]
		}))
		.unwrap();
		let err = Graph::new(&duplicate, Bounds::new(1.0, 1.0), LayoutRegistry::default())
			.err()
			.unwrap();
		assert!(matches!(err, GraphError::DuplicateId(ref id) if id == "a"));
	}

	#[test]
	fn selection_and_classes() {
		let mut g = sample();
		assert!(g.set_selected("b", true));
		assert!(!g.set_selected("b", true));
		assert!(g.set_selected("a", true));
		assert_eq!(g.selected(), vec!["a", "b"]);

		g.add_class("ab", "highlight");
		g.add_class("c", "highlight");
		assert_eq!(g.with_class("highlight"), vec!["c", "ab"]);
		g.clear_class("highlight");
		assert!(g.with_class("highlight").is_empty());
	}

	#[test]
	fn filter_by_selector() {
		let g = sample();
		let people: Selector = "node[label = \"Person\"]".parse().unwrap();
		assert_eq!(g.filter(&people), vec!["a", "b"]);
	}

	#[test]
	fn hit_testing_prefers_nodes() {
		let mut g = sample();
		g.set_position("a", Position { x: 0.0, y: 0.0 });
		g.set_position("b", Position { x: 200.0, y: 0.0 });
		g.set_position("c", Position { x: 0.0, y: 200.0 });
		assert_eq!(g.element_at(1.0, 1.0).as_deref(), Some("a"));
		assert_eq!(g.element_at(100.0, 1.0).as_deref(), Some("ab"));
		assert_eq!(g.element_at(150.0, 150.0), None);
	}

	#[test]
	fn unknown_layout_is_an_error() {
		let mut g = sample();
		let err = g.run_layout(&LayoutConfig::named("nope")).unwrap_err();
		assert!(matches!(err, GraphError::UnknownLayout(ref n) if n == "nope"));
	}
}
