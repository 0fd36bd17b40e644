//! Leptos components: the graph canvas and the selection info panel.
//!
//! The canvas component resolves its container, runs the initializer, binds
//! the reactive callbacks and seeds the store with the host's style and
//! layout. Mouse input is translated into graph interactions (tap, toggle,
//! double tap, context tap, hover, drag, pan, zoom); an animation loop driven
//! by `requestAnimationFrame` redraws the graph every frame.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::callbacks::{BrowserDocument, bind_callbacks};
use super::config::GraphProps;
use super::debounce::BrowserScheduler;
use super::error::InitError;
use super::events::GraphHandle;
use super::init::{Container, Initializer};
use super::layout::Position;
use super::listeners::ParentFrameSink;
use super::render::{self, ViewTransform};
use super::selection::Selection;
use super::state::StateStore;

/// Pointer travel (in screen pixels) below which a press counts as a click.
const CLICK_SLOP: f64 = 4.0;

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
struct DragState {
	node: Option<String>,
	start_x: f64,
	start_y: f64,
	node_start: Position,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// Everything the event handlers share once the instance exists.
struct CanvasSession {
	graph: GraphHandle,
	view: ViewTransform,
	drag: DragState,
	pan: PanState,
	press: Option<(f64, f64)>,
	moved: bool,
}

/// Find the canvas the graph is drawn into and measure it.
fn locate_container(
	id: &str,
	height: Option<f64>,
) -> Result<(HtmlCanvasElement, Container), InitError> {
	let missing = || InitError::MissingContainer(id.to_string());
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(missing)?;
	let canvas: HtmlCanvasElement = document
		.get_element_by_id(id)
		.ok_or_else(missing)?
		.dyn_into()
		.map_err(|_| missing())?;

	let parent = canvas.parent_element();
	let width = parent
		.as_ref()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(800.0);
	let height = height.unwrap_or_else(|| {
		parent
			.as_ref()
			.map(|p| p.client_height() as f64)
			.filter(|h| *h > 0.0)
			.unwrap_or(600.0)
	});
	canvas.set_width(width as u32);
	canvas.set_height(height as u32);

	let container = Container {
		id: id.to_string(),
		width,
		height,
	};
	Ok((canvas, container))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Element under the pointer, if any, plus the session's graph handle.
fn hit(session: &Rc<RefCell<Option<CanvasSession>>>, x: f64, y: f64) -> Option<(GraphHandle, Option<String>)> {
	let guard = session.borrow();
	let s = guard.as_ref()?;
	let (gx, gy) = s.view.screen_to_graph(x, y);
	let id = s.graph.with(|g| g.element_at(gx, gy));
	Some((s.graph.clone(), id))
}

/// Renders the link graph on a canvas element and reports interactions to the
/// host.
#[component]
pub fn LinkGraphCanvas(
	/// Elements, style, layout and listeners supplied by the host.
	props: GraphProps,
	/// Shared store the graph reads from and publishes to.
	store: StateStore,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let session: Rc<RefCell<Option<CanvasSession>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let container_id = props.container_id.clone();
	let initializer = Rc::new(Initializer::new(
		BrowserScheduler,
		store.clone(),
		Rc::new(ParentFrameSink),
		Rc::new(BrowserDocument),
	));
	let (session_init, animate_init, store_init) = (session.clone(), animate.clone(), store.clone());

	Effect::new(move |_| {
		if canvas_ref.get().is_none() {
			return;
		}

		let (canvas, container) = match locate_container(&props.container_id, props.height) {
			Ok(found) => found,
			Err(e) => {
				log::error!("link-graph: {e}");
				return;
			}
		};
		let graph = match initializer.init(
			&container,
			&props.elements,
			&props.listeners,
			props.visible.clone(),
		) {
			Ok(graph) => graph,
			Err(InitError::AlreadyInitialized) => return,
			Err(e) => {
				log::error!("link-graph: {e}");
				return;
			}
		};

		bind_callbacks(&graph, &store_init, Rc::new(BrowserDocument));
		store_init.set_style(props.style.clone());
		store_init.set_layout(props.layout.clone());

		*session_init.borrow_mut() = Some(CanvasSession {
			graph,
			view: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			press: None,
			moved: false,
		});

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::error!("link-graph: canvas has no 2d context");
			return;
		};

		let (session_anim, animate_inner, store_anim) =
			(session_init.clone(), animate_init.clone(), store_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref s) = *session_anim.borrow() {
				let theme = store_anim.style().theme;
				s.graph.with(|g| render::render(g, &ctx, &s.view, theme));
			}
			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let (Some(window), Some(cb)) = (web_sys::window(), animate_init.borrow().as_ref()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let Some((graph, target)) = hit(&session_md, x, y) else {
			return;
		};
		if let Some(ref mut s) = *session_md.borrow_mut() {
			s.press = Some((x, y));
			s.moved = false;
			let node = target.filter(|id| graph.with(|g| g.get(id).is_some_and(|e| !e.is_edge())));
			if let Some(id) = node {
				s.drag = DragState {
					node_start: graph.with(|g| g.position(&id)).unwrap_or_default(),
					node: Some(id),
					start_x: x,
					start_y: y,
				};
			} else {
				s.pan = PanState {
					active: true,
					start_x: x,
					start_y: y,
					transform_start_x: s.view.x,
					transform_start_y: s.view.y,
				};
			}
		}
	};

	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut hover = None;
		if let Some(ref mut s) = *session_mm.borrow_mut() {
			if let Some((px, py)) = s.press {
				if (x - px).hypot(y - py) > CLICK_SLOP {
					s.moved = true;
				}
			}
			if let Some(id) = s.drag.node.clone() {
				if s.moved {
					let position = Position {
						x: s.drag.node_start.x + (x - s.drag.start_x) / s.view.k,
						y: s.drag.node_start.y + (y - s.drag.start_y) / s.view.k,
					};
					s.graph.with_mut(|g| g.set_position(&id, position));
				}
			} else if s.pan.active {
				s.view.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.view.y = s.pan.transform_start_y + (y - s.pan.start_y);
			} else {
				hover = Some(s.graph.clone());
			}
		}
		if let Some(graph) = hover {
			if let Some((_, target)) = hit(&session_mm, x, y) {
				graph.hover(target.as_deref());
			}
		}
	};

	let session_mu = session.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let click = match *session_mu.borrow_mut() {
			Some(ref mut s) => {
				let click = s.press.is_some() && !s.moved;
				s.drag = DragState::default();
				s.pan.active = false;
				s.press = None;
				click
			}
			None => false,
		};
		if !click {
			return;
		}
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some((graph, target)) = hit(&session_mu, x, y) {
			match target {
				Some(id) if ev.shift_key() || ev.ctrl_key() || ev.meta_key() => graph.toggle(&id),
				target => graph.tap(target.as_deref()),
			}
		}
	};

	let session_dc = session.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some((graph, Some(id))) = hit(&session_dc, x, y) {
			graph.double_tap(&id);
		}
	};

	let session_cm = session.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some((graph, Some(id))) = hit(&session_cm, x, y) {
			graph.context_tap(&id);
		}
	};

	let session_ml = session.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let graph = match *session_ml.borrow_mut() {
			Some(ref mut s) => {
				s.drag = DragState::default();
				s.pan.active = false;
				s.press = None;
				s.graph.clone()
			}
			None => return,
		};
		graph.hover(None);
	};

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *session_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.view.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			id=container_id
			class="link-graph-canvas"
			tabindex="0"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:dblclick=on_dblclick
			on:contextmenu=on_contextmenu
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

/// What the info panel shows for the last selection.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelData {
	/// Element label, or its id when unlabeled.
	pub title: String,
	/// Element group, `nodes` or `edges`.
	pub group: &'static str,
	/// Visible data as display strings.
	pub rows: Vec<(String, String)>,
}

impl PanelData {
	/// Build panel content from the filtered data of the last selection.
	pub fn from_selection(selection: &Selection) -> Option<Self> {
		let last = selection.last_selected.as_ref()?;
		let rows = last
			.filtered_data
			.iter()
			.map(|(k, v)| {
				let text = match v {
					Value::String(s) => s.clone(),
					other => other.to_string(),
				};
				(k.clone(), text)
			})
			.collect();
		Some(Self {
			title: last.element.label().unwrap_or(&last.element.id).to_string(),
			group: last.element.group.as_str(),
			rows,
		})
	}
}

/// Key/value table for the last selected element.
#[component]
pub fn InfoPanel(
	/// Data of the last selected element, if any.
	#[prop(into)]
	data: Signal<Option<PanelData>>,
) -> impl IntoView {
	view! {
		<aside class="info-panel">
			{move || match data.get() {
				None => view! { <p class="info-empty">"Select a node or edge to see its data."</p> }.into_any(),
				Some(panel) => view! {
					<h3 class="info-title" data-group=panel.group>{panel.title}</h3>
					<table class="info-table">
						{panel
							.rows
							.into_iter()
							.map(|(key, value)| view! { <tr><th>{key}</th><td>{value}</td></tr> })
							.collect_view()}
					</table>
				}
					.into_any(),
			}}
		</aside>
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::link_graph::selection::{LastSelected, filter_data};
	use crate::components::link_graph::types::{Element, ElementGroup};

	#[test]
	fn panel_lists_filtered_data_in_order() {
		let element = Element::from_data(
			ElementGroup::Nodes,
			json!({"id": "p1", "label": "Person", "name": "Ana", "age": 30})
				.as_object()
				.cloned()
				.unwrap(),
		)
		.unwrap();
		let allowed = ["age".to_string(), "name".to_string()];
		let selection = Selection {
			selected: vec!["p1".into()],
			last_selected: Some(LastSelected {
				filtered_data: filter_data(&element, Some(&allowed)),
				element,
			}),
		};
		let panel = PanelData::from_selection(&selection).unwrap();
		assert_eq!(panel.title, "Person");
		assert_eq!(panel.group, "nodes");
		assert_eq!(
			panel.rows,
			vec![
				("age".to_string(), "30".to_string()),
				("name".to_string(), "Ana".to_string())
			]
		);
	}

	#[test]
	fn empty_selection_has_no_panel() {
		assert_eq!(PanelData::from_selection(&Selection::default()), None);
	}
}
