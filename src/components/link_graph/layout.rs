//! Named layout algorithms and the registry the graph instance resolves them
//! from.
//!
//! Built-ins are `preset`, `grid`, `circle`, `concentric`, `breadthfirst` and
//! `cose`. The extensions `fcose`, `cola` and `dagre` are added by
//! [`LayoutRegistry::register_extensions`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::TAU;
use std::rc::Rc;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::Graph;

/// A point in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

/// Size of the area layouts fit into.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
	/// Width in pixels.
	pub width: f64,
	/// Height in pixels.
	pub height: f64,
}

impl Bounds {
	/// Bounds of the given size.
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Center point.
	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}

/// Layout request as stored in shared state: a layout name plus free-form
/// options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
	/// Registered layout name.
	pub name: String,
	/// Layout-specific options.
	#[serde(flatten)]
	pub options: Map<String, Value>,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self::named("cose")
	}
}

impl LayoutConfig {
	/// A config for `name` with no options.
	pub fn named(name: &str) -> Self {
		Self {
			name: name.to_string(),
			options: Map::new(),
		}
	}

	/// Set one option.
	pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.options.insert(key.to_string(), value.into());
		self
	}

	fn number(&self, key: &str) -> Option<f64> {
		self.options.get(key).and_then(Value::as_f64)
	}

	fn padding(&self) -> f64 {
		self.number("padding").unwrap_or(30.0).max(0.0)
	}

	fn spacing(&self) -> f64 {
		self.number("spacingFactor").unwrap_or(1.0).max(0.1)
	}
}

/// A layout algorithm. Returns new positions for (some of) the graph's nodes.
pub trait Layout {
	/// Compute positions for `graph`.
	fn run(&self, graph: &Graph, config: &LayoutConfig) -> Vec<(String, Position)>;
}

/// Layouts by name.
#[derive(Clone, Default)]
pub struct LayoutRegistry {
	layouts: HashMap<String, Rc<dyn Layout>>,
}

impl LayoutRegistry {
	/// Registry holding the built-in layouts.
	pub fn with_builtins() -> Self {
		let mut registry = Self::default();
		registry.register("preset", PresetLayout);
		registry.register("grid", GridLayout);
		registry.register("circle", CircleLayout);
		registry.register("concentric", ConcentricLayout);
		registry.register("breadthfirst", LayeredLayout { directed: false });
		registry.register("cose", ForceLayout::default());
		registry
	}

	/// Add the extension layouts: two force-directed variants and a layered
	/// layout that follows edge direction.
	pub fn register_extensions(&mut self) {
		self.register(
			"fcose",
			ForceLayout {
				charge: 200.0,
				spring: 0.08,
				iterations: 400,
			},
		);
		self.register(
			"cola",
			ForceLayout {
				charge: 120.0,
				spring: 0.04,
				iterations: 250,
			},
		);
		self.register("dagre", LayeredLayout { directed: true });
	}

	/// Add or replace a layout.
	pub fn register(&mut self, name: &str, layout: impl Layout + 'static) {
		log::debug!("link-graph: registered layout `{name}`");
		self.layouts.insert(name.to_string(), Rc::new(layout));
	}

	/// Layout by name.
	pub fn get(&self, name: &str) -> Option<Rc<dyn Layout>> {
		self.layouts.get(name).cloned()
	}

	/// Whether `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.layouts.contains_key(name)
	}
}

fn node_ids(graph: &Graph) -> Vec<String> {
	graph.nodes().map(|n| n.id.clone()).collect()
}

/// Keep current positions.
struct PresetLayout;

impl Layout for PresetLayout {
	fn run(&self, _graph: &Graph, _config: &LayoutConfig) -> Vec<(String, Position)> {
		Vec::new()
	}
}

struct GridLayout;

impl Layout for GridLayout {
	/// Compute positions for `graph`.
	fn run(&self, graph: &Graph, config: &LayoutConfig) -> Vec<(String, Position)> {
		let ids = node_ids(graph);
		if ids.is_empty() {
			return Vec::new();
		}
		let bounds = graph.viewport();
		let pad = config.padding();
		let cols = (ids.len() as f64).sqrt().ceil() as usize;
		let rows = ids.len().div_ceil(cols);
		let cell_w = (bounds.width - 2.0 * pad).max(1.0) / cols as f64;
		let cell_h = (bounds.height - 2.0 * pad).max(1.0) / rows as f64;

		ids.into_iter()
			.enumerate()
			.map(|(i, id)| {
				let (row, col) = (i / cols, i % cols);
				let position = Position {
					x: pad + cell_w * (col as f64 + 0.5),
					y: pad + cell_h * (row as f64 + 0.5),
				};
				(id, position)
			})
			.collect()
	}
}

struct CircleLayout;

impl Layout for CircleLayout {
	/// Compute positions for `graph`.
	fn run(&self, graph: &Graph, config: &LayoutConfig) -> Vec<(String, Position)> {
		let ids = node_ids(graph);
		let bounds = graph.viewport();
		let (cx, cy) = bounds.center();
		let radius = ((bounds.width.min(bounds.height) / 2.0 - config.padding()) * config.spacing())
			.max(1.0);
		ring(&ids, cx, cy, radius)
	}
}

fn ring(ids: &[String], cx: f64, cy: f64, radius: f64) -> Vec<(String, Position)> {
	if ids.len() == 1 {
		return vec![(ids[0].clone(), Position { x: cx, y: cy })];
	}
	let n = ids.len() as f64;
	ids.iter()
		.enumerate()
		.map(|(i, id)| {
			let angle = i as f64 * TAU / n - TAU / 4.0;
			let position = Position {
				x: cx + radius * angle.cos(),
				y: cy + radius * angle.sin(),
			};
			(id.clone(), position)
		})
		.collect()
}

/// Rings by degree, most connected nodes in the center.
struct ConcentricLayout;

impl Layout for ConcentricLayout {
	/// Compute positions for `graph`.
	fn run(&self, graph: &Graph, config: &LayoutConfig) -> Vec<(String, Position)> {
		let mut degree: HashMap<String, usize> = node_ids(graph).into_iter().map(|id| (id, 0)).collect();
		for (s, t) in graph.edge_endpoints() {
			*degree.entry(s).or_insert(0) += 1;
			*degree.entry(t).or_insert(0) += 1;
		}

		let mut levels: Vec<usize> = degree.values().copied().collect::<HashSet<_>>().into_iter().collect();
		levels.sort_unstable_by(|a, b| b.cmp(a));
		if levels.is_empty() {
			return Vec::new();
		}

		let bounds = graph.viewport();
		let (cx, cy) = bounds.center();
		let max_radius = (bounds.width.min(bounds.height) / 2.0 - config.padding()).max(1.0);
		let step = if levels.len() > 1 {
			max_radius / (levels.len() - 1) as f64
		} else {
			0.0
		};

		let ids = node_ids(graph);
		let mut positions = Vec::with_capacity(ids.len());
		for (ring_index, level) in levels.iter().enumerate() {
			let members: Vec<String> = ids
				.iter()
				.filter(|id| degree.get(*id) == Some(level))
				.cloned()
				.collect();
			let radius = (step * ring_index as f64).max(min_ring_radius(members.len()));
			positions.extend(ring(&members, cx, cy, radius * config.spacing()));
		}
		positions
	}
}

/// Center distance between neighbors on a ring.
const RING_SPACING: f64 = 40.0;

/// Smallest radius at which `members` nodes sit `RING_SPACING` apart.
fn min_ring_radius(members: usize) -> f64 {
	if members < 2 {
		return 0.0;
	}
	RING_SPACING / (2.0 * (std::f64::consts::PI / members as f64).sin())
}

/// Nodes in rows by BFS depth from the roots. When `directed`, roots are nodes
/// without incoming edges and traversal follows edge direction.
struct LayeredLayout {
	directed: bool,
}

impl Layout for LayeredLayout {
	/// Compute positions for `graph`.
	fn run(&self, graph: &Graph, config: &LayoutConfig) -> Vec<(String, Position)> {
		let ids = node_ids(graph);
		if ids.is_empty() {
			return Vec::new();
		}

		let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
		let mut has_incoming: HashSet<&str> = HashSet::new();
		let endpoints = graph.edge_endpoints();
		for (s, t) in &endpoints {
			adjacency.entry(s.as_str()).or_default().push(t.as_str());
			has_incoming.insert(t.as_str());
			if !self.directed {
				adjacency.entry(t.as_str()).or_default().push(s.as_str());
			}
		}

		let mut depth: HashMap<&str, usize> = HashMap::new();
		let mut queue = VecDeque::new();
		let roots = ids
			.iter()
			.filter(|id| !self.directed || !has_incoming.contains(id.as_str()));
		// Every component needs a root; cycles without a source fall back to
		// their first node in element order.
		for id in roots.chain(ids.iter()) {
			if depth.contains_key(id.as_str()) {
				continue;
			}
			depth.insert(id.as_str(), 0);
			queue.push_back(id.as_str());
			while let Some(current) = queue.pop_front() {
				let next_depth = depth[current] + 1;
				for &neighbor in adjacency.get(current).map(Vec::as_slice).unwrap_or_default() {
					if !depth.contains_key(neighbor) {
						depth.insert(neighbor, next_depth);
						queue.push_back(neighbor);
					}
				}
			}
		}

		let layers = depth.values().copied().max().unwrap_or(0) + 1;
		let horizontal = config
			.options
			.get("rankDir")
			.and_then(Value::as_str)
			.is_some_and(|d| d.eq_ignore_ascii_case("LR"));

		let bounds = graph.viewport();
		let pad = config.padding();
		let (main, cross) = if horizontal {
			(bounds.width, bounds.height)
		} else {
			(bounds.height, bounds.width)
		};
		let layer_step = (main - 2.0 * pad).max(1.0) / layers as f64;

		let mut positions = Vec::with_capacity(ids.len());
		for layer in 0..layers {
			let members: Vec<&String> = ids.iter().filter(|id| depth.get(id.as_str()) == Some(&layer)).collect();
			let slot = (cross - 2.0 * pad).max(1.0) / members.len().max(1) as f64;
			for (i, id) in members.into_iter().enumerate() {
				let along = pad + layer_step * (layer as f64 + 0.5);
				let across = pad + slot * (i as f64 + 0.5);
				let position = if horizontal {
					Position { x: along, y: across }
				} else {
					Position { x: across, y: along }
				};
				positions.push((id.clone(), position));
			}
		}
		positions
	}
}

/// Force-directed placement using the `force_graph` simulation, fitted to the
/// viewport afterwards.
struct ForceLayout {
	charge: f32,
	spring: f32,
	iterations: usize,
}

impl Default for ForceLayout {
	fn default() -> Self {
		Self {
			charge: 150.0,
			spring: 0.05,
			iterations: 300,
		}
	}
}

impl Layout for ForceLayout {
	/// Compute positions for `graph`.
	fn run(&self, graph: &Graph, config: &LayoutConfig) -> Vec<(String, Position)> {
		let ids = node_ids(graph);
		if ids.is_empty() {
			return Vec::new();
		}

		let mut sim: ForceGraph<String, ()> = ForceGraph::new(SimulationParameters {
			force_charge: self.charge,
			force_spring: self.spring,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});

		let n = ids.len() as f64;
		let mut indices = HashMap::new();
		for (i, id) in ids.iter().enumerate() {
			let angle = i as f64 * TAU / n;
			let idx = sim.add_node(NodeData {
				x: (100.0 * angle.cos()) as f32,
				y: (100.0 * angle.sin()) as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: id.clone(),
			});
			indices.insert(id.clone(), idx);
		}
		for (s, t) in graph.edge_endpoints() {
			if let (Some(&a), Some(&b)) = (indices.get(&s), indices.get(&t)) {
				if a != b {
					sim.add_edge(a, b, EdgeData::default());
				}
			}
		}

		let iterations = config
			.number("iterations")
			.map_or(self.iterations, |i| i.max(1.0) as usize);
		for _ in 0..iterations {
			sim.update(0.016);
		}

		let mut raw = Vec::with_capacity(ids.len());
		sim.visit_nodes(|node| {
			raw.push((
				node.data.user_data.clone(),
				Position {
					x: node.x() as f64,
					y: node.y() as f64,
				},
			));
		});
		fit(raw, graph.viewport(), config.padding())
	}
}

/// Scale and translate positions so their bounding box fits the viewport.
fn fit(positions: Vec<(String, Position)>, bounds: Bounds, pad: f64) -> Vec<(String, Position)> {
	let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
	let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
	for (_, p) in &positions {
		min_x = min_x.min(p.x);
		min_y = min_y.min(p.y);
		max_x = max_x.max(p.x);
		max_y = max_y.max(p.y);
	}
	let (w, h) = (max_x - min_x, max_y - min_y);
	let avail_w = (bounds.width - 2.0 * pad).max(1.0);
	let avail_h = (bounds.height - 2.0 * pad).max(1.0);
	let scale = match (w > f64::EPSILON, h > f64::EPSILON) {
		(true, true) => (avail_w / w).min(avail_h / h),
		(true, false) => avail_w / w,
		(false, true) => avail_h / h,
		(false, false) => 1.0,
	};
	let (cx, cy) = bounds.center();
	let (mid_x, mid_y) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

	positions
		.into_iter()
		.map(|(id, p)| {
			let position = Position {
				x: cx + (p.x - mid_x) * scale,
				y: cy + (p.y - mid_y) * scale,
			};
			(id, position)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::link_graph::types::GraphElements;

	fn chain() -> Graph {
		let elements: GraphElements = serde_json::from_value(json!({
			"nodes": [
				{"data": {"id": "a"}},
				{"data": {"id": "b"}},
				{"data": {"id": "c"}},
				{"data": {"id": "d"}}
			],
			"edges": [
				{"data": {"id": "ab", "source": "a", "target": "b"}},
				{"data": {"id": "bc", "source": "b", "target": "c"}},
				{"data": {"id": "bd", "source": "b", "target": "d"}}
			]
		}))
		.unwrap();
		let mut registry = LayoutRegistry::with_builtins();
		registry.register_extensions();
		Graph::new(&elements, Bounds::new(400.0, 300.0), registry).unwrap()
	}

	fn inside(graph: &Graph, id: &str) -> bool {
		let p = graph.position(id).unwrap();
		let b = graph.viewport();
		(0.0..=b.width).contains(&p.x) && (0.0..=b.height).contains(&p.y)
	}

	#[test]
	fn extensions_are_registered_on_demand() {
		let mut registry = LayoutRegistry::with_builtins();
		assert!(!registry.contains("dagre"));
		registry.register_extensions();
		for name in ["fcose", "cola", "dagre"] {
			assert!(registry.contains(name), "{name} missing");
		}
	}

	#[test]
	fn dagre_puts_children_below_parents() {
		let mut g = chain();
		g.run_layout(&LayoutConfig::named("dagre")).unwrap();
		let (a, b, c) = (
			g.position("a").unwrap(),
			g.position("b").unwrap(),
			g.position("c").unwrap(),
		);
		assert!(a.y < b.y && b.y < c.y);
		assert_eq!(c.y, g.position("d").unwrap().y);
	}

	#[test]
	fn dagre_left_to_right() {
		let mut g = chain();
		g.run_layout(&LayoutConfig::named("dagre").with_option("rankDir", "LR"))
			.unwrap();
		assert!(g.position("a").unwrap().x < g.position("b").unwrap().x);
	}

	#[test]
	fn every_layout_stays_in_bounds() {
		for name in ["grid", "circle", "concentric", "breadthfirst", "cose", "fcose", "cola"] {
			let mut g = chain();
			g.run_layout(&LayoutConfig::named(name).with_option("iterations", 50))
				.unwrap();
			for id in ["a", "b", "c", "d"] {
				assert!(inside(&g, id), "{name} placed {id} outside the viewport");
			}
		}
	}

	#[test]
	fn concentric_spreads_equal_degree_nodes() {
		let elements: GraphElements = serde_json::from_value(json!({
			"nodes": [{"data": {"id": "a"}}, {"data": {"id": "b"}}, {"data": {"id": "c"}}]
		}))
		.unwrap();
		let mut g = Graph::new(&elements, Bounds::new(400.0, 300.0), LayoutRegistry::with_builtins()).unwrap();
		g.run_layout(&LayoutConfig::named("concentric")).unwrap();

		let points: Vec<Position> = ["a", "b", "c"].iter().map(|id| g.position(id).unwrap()).collect();
		for (i, p) in points.iter().enumerate() {
			for q in &points[i + 1..] {
				assert!((p.x - q.x).hypot(p.y - q.y) >= RING_SPACING - 1e-6);
			}
		}
		for id in ["a", "b", "c"] {
			assert!(inside(&g, id));
			assert_eq!(g.element_at(g.position(id).unwrap().x, g.position(id).unwrap().y).as_deref(), Some(id));
		}
	}

	#[test]
	fn concentric_keeps_a_lone_hub_centered() {
		let mut g = chain();
		g.run_layout(&LayoutConfig::named("concentric")).unwrap();
		assert_eq!(g.position("b"), Some(Position { x: 200.0, y: 150.0 }));
	}

	#[test]
	fn preset_keeps_positions() {
		let mut g = chain();
		g.set_position("a", Position { x: 7.0, y: 9.0 });
		g.run_layout(&LayoutConfig::named("preset")).unwrap();
		assert_eq!(g.position("a"), Some(Position { x: 7.0, y: 9.0 }));
	}

	#[test]
	fn layout_config_round_trips_options() {
		let config: LayoutConfig =
			serde_json::from_value(json!({"name": "dagre", "rankDir": "LR"})).unwrap();
		assert_eq!(config.name, "dagre");
		assert_eq!(config.options["rankDir"], "LR");
	}
}
