//! link-graph: interactive link-analysis graph for a host page.
//!
//! This crate provides a WASM-based graph component whose selection, layout and
//! styling live in a shared reactive store, with declared listeners reporting
//! user actions back to the host frame.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

/// UI components.
pub mod components;

pub use components::link_graph::{
	GraphProps, InfoPanel, Initializer, LinkGraphCanvas, PanelData, Selection, StateKey, StateStore,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("link-graph: logging initialized");
}

/// Load component props from a script element with id="graph-props".
fn load_graph_props() -> Option<GraphProps> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-props")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<GraphProps>(&json_text) {
		Ok(props) => {
			info!(
				"link-graph: loaded {} nodes, {} edges, {} listeners",
				props.elements.nodes.len(),
				props.elements.edges.len(),
				props.listeners.len()
			);
			Some(props)
		}
		Err(e) => {
			warn!("link-graph: failed to parse graph props: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads props from the DOM and renders the graph next to its info panel.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let props = load_graph_props().unwrap_or_default();
	let store = StateStore::default();

	let panel = RwSignal::new(None::<PanelData>);
	let reader = store.clone();
	store.subscribe(StateKey::Selection, move || {
		panel.set(PanelData::from_selection(&reader.selection()));
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Link Analysis" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="link-graph">
			<LinkGraphCanvas props=props store=store />
			<InfoPanel data=panel />
		</div>
	}
}
