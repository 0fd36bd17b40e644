//! Reactive callbacks: push shared state into the graph instance whenever the
//! corresponding field changes.

use std::rc::Rc;

use web_sys::HtmlElement;

use super::events::GraphHandle;
use super::state::{StateKey, StateStore};
use super::style::build_style_sheet;
use super::theme::ThemeName;
use super::types::ElementGroup;

/// Class applied to elements adjacent to the last selection.
pub const HIGHLIGHT_CLASS: &str = "highlight";

/// Document-level side effects the callbacks need from the host page.
pub trait HostDocument {
	/// Return keyboard focus to the page body.
	fn focus_body(&self);
	/// Expose the active theme to page CSS.
	fn set_theme_marker(&self, theme: ThemeName);
}

/// [`HostDocument`] for the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserDocument;

impl BrowserDocument {
	fn body() -> Option<HtmlElement> {
		web_sys::window()?.document()?.body()
	}
}

impl HostDocument for BrowserDocument {
	fn focus_body(&self) {
		if let Some(body) = Self::body() {
			// `<body>` is only focusable with a tabindex.
			if !body.has_attribute("tabindex") {
				let _ = body.set_attribute("tabindex", "-1");
			}
			let _ = body.focus();
		}
	}

	fn set_theme_marker(&self, theme: ThemeName) {
		if let Some(body) = Self::body() {
			if let Err(e) = body.set_attribute("data-theme", theme.as_str()) {
				log::warn!("link-graph: could not set data-theme: {:?}", e);
			}
		}
	}
}

/// [`HostDocument`] for targets without a page.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDocument;

impl HostDocument for NoopDocument {
	fn focus_body(&self) {}
	fn set_theme_marker(&self, _theme: ThemeName) {}
}

/// Re-flag the neighbors of the last selection.
pub fn update_highlight(graph: &GraphHandle, store: &StateStore) {
	let last = store.selection().last_selected;
	graph.with_mut(|g| {
		g.clear_class(HIGHLIGHT_CLASS);
		let Some(last) = last else {
			return;
		};
		let targets = match last.element.group {
			ElementGroup::Nodes => g.connected_edges(&last.element.id),
			ElementGroup::Edges => g.connected_nodes(&last.element.id),
		};
		for id in targets {
			g.add_class(&id, HIGHLIGHT_CLASS);
		}
	});
}

/// Re-run the configured layout.
pub fn update_layout(graph: &GraphHandle, store: &StateStore) {
	let config = store.layout();
	if let Err(e) = graph.with_mut(|g| g.run_layout(&config)) {
		log::warn!("link-graph: layout not applied: {e}");
	}
}

/// Rebuild the style sheet from the theme and the host's custom rules.
pub fn update_style(graph: &GraphHandle, store: &StateStore, document: &dyn HostDocument) {
	let style = store.style();
	let sheet = build_style_sheet(style.theme, &style.custom_style);
	document.set_theme_marker(style.theme);
	graph.with_mut(|g| g.set_style(sheet));
}

/// Subscribe the three callbacks to their state fields.
pub fn bind_callbacks(graph: &GraphHandle, store: &StateStore, document: Rc<dyn HostDocument>) {
	let (g, s) = (graph.downgrade(), store.clone());
	store.subscribe(StateKey::Selection, move || {
		if let Some(g) = g.upgrade() {
			update_highlight(&g, &s);
		}
	});

	let (g, s) = (graph.downgrade(), store.clone());
	store.subscribe(StateKey::Layout, move || {
		if let Some(g) = g.upgrade() {
			update_layout(&g, &s);
		}
	});

	let (g, s) = (graph.downgrade(), store.clone());
	store.subscribe(StateKey::Style, move || {
		if let Some(g) = g.upgrade() {
			update_style(&g, &s, document.as_ref());
		}
	});
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use serde_json::json;

	use super::*;
	use crate::components::link_graph::graph::Graph;
	use crate::components::link_graph::layout::{Bounds, LayoutConfig, LayoutRegistry, Position};
	use crate::components::link_graph::selection::{LastSelected, Selection};
	use crate::components::link_graph::style::{StyleRule, StyleState};
	use crate::components::link_graph::types::GraphElements;

	#[derive(Default)]
	struct RecordingDocument {
		themes: RefCell<Vec<ThemeName>>,
	}

	impl HostDocument for RecordingDocument {
		fn focus_body(&self) {}
		fn set_theme_marker(&self, theme: ThemeName) {
			self.themes.borrow_mut().push(theme);
		}
	}

	fn handle() -> GraphHandle {
		let elements: GraphElements = serde_json::from_value(json!({
			"nodes": [
				{"data": {"id": "a"}},
				{"data": {"id": "b"}},
				{"data": {"id": "c"}}
			],
			"edges": [
				{"data": {"id": "ab", "source": "a", "target": "b"}},
				{"data": {"id": "bc", "source": "b", "target": "c"}}
			]
		}))
		.unwrap();
		GraphHandle::new(
			Graph::new(&elements, Bounds::new(300.0, 300.0), LayoutRegistry::with_builtins()).unwrap(),
		)
	}

	fn pin(graph: &GraphHandle, store: &StateStore, id: &str) {
		let element = graph.with(|g| g.get(id).cloned()).unwrap();
		store.set_selection(Selection {
			selected: vec![id.to_string()],
			last_selected: Some(LastSelected {
				filtered_data: element.data.clone(),
				element,
			}),
		});
	}

	#[test]
	fn highlight_follows_node_and_edge_selection() {
		let graph = handle();
		let store = StateStore::default();
		bind_callbacks(&graph, &store, Rc::new(NoopDocument));

		pin(&graph, &store, "b");
		assert_eq!(graph.with(|g| g.with_class(HIGHLIGHT_CLASS)), vec!["ab", "bc"]);

		pin(&graph, &store, "bc");
		assert_eq!(graph.with(|g| g.with_class(HIGHLIGHT_CLASS)), vec!["b", "c"]);

		store.set_selection(Selection::default());
		assert!(graph.with(|g| g.with_class(HIGHLIGHT_CLASS)).is_empty());
	}

	#[test]
	fn style_is_theme_custom_highlight() {
		let graph = handle();
		let store = StateStore::default();
		let document = Rc::new(RecordingDocument::default());
		bind_callbacks(&graph, &store, document.clone());

		let custom = vec![StyleRule {
			selector: "node".into(),
			style: json!({"background-color": "#123456"}).as_object().cloned().unwrap(),
		}];
		store.set_style(StyleState {
			theme: ThemeName::Dark,
			custom_style: custom.clone(),
		});

		let applied = graph.with(|g| g.style().rules().to_vec());
		assert_eq!(applied, build_style_sheet(ThemeName::Dark, &custom));
		assert_eq!(*document.themes.borrow(), vec![ThemeName::Dark]);
	}

	#[test]
	fn layout_change_moves_nodes_and_bad_names_are_ignored() {
		let graph = handle();
		let store = StateStore::default();
		bind_callbacks(&graph, &store, Rc::new(NoopDocument));

		graph.with_mut(|g| g.set_position("a", Position { x: -5.0, y: -5.0 }));
		store.set_layout(LayoutConfig::named("nonexistent"));
		assert_eq!(graph.with(|g| g.position("a")), Some(Position { x: -5.0, y: -5.0 }));

		store.set_layout(LayoutConfig::named("grid"));
		assert_ne!(graph.with(|g| g.position("a")), Some(Position { x: -5.0, y: -5.0 }));
	}
}
