//! Event types, selector-filtered bindings and the shared instance handle.
//!
//! [`GraphHandle`] is what the initializer returns and what the component,
//! callbacks and handlers hold on to. Handlers run after the graph borrow has
//! been released, so they are free to read or mutate the graph themselves.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::graph::Graph;
use super::selector::Selector;
use super::types::Element;

/// Events emitted by the graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
	/// An element became selected.
	Select,
	/// An element was removed from the selection.
	Unselect,
	/// Primary click on an element.
	Tap,
	/// Double click on an element.
	DblTap,
	/// Context (right) click on an element.
	CxtTap,
	/// Pointer entered an element.
	MouseOver,
	/// Pointer left an element.
	MouseOut,
}

impl EventType {
	/// Event name as used in listener specs.
	pub fn as_str(self) -> &'static str {
		match self {
			EventType::Select => "select",
			EventType::Unselect => "unselect",
			EventType::Tap => "tap",
			EventType::DblTap => "dbltap",
			EventType::CxtTap => "cxttap",
			EventType::MouseOver => "mouseover",
			EventType::MouseOut => "mouseout",
		}
	}

	/// Parse a space-separated event list such as `"select unselect"`.
	pub fn parse_list(events: &str) -> Result<Vec<Self>, GraphError> {
		events.split_whitespace().map(str::parse).collect()
	}
}

impl FromStr for EventType {
	type Err = GraphError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"select" => EventType::Select,
			"unselect" => EventType::Unselect,
			"tap" | "click" => EventType::Tap,
			"dbltap" | "dblclick" => EventType::DblTap,
			"cxttap" => EventType::CxtTap,
			"mouseover" => EventType::MouseOver,
			"mouseout" => EventType::MouseOut,
			other => return Err(GraphError::UnknownEvent(other.to_string())),
		})
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An event delivered to handlers. The target is a snapshot of the element
/// at emit time.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEvent {
	/// What happened.
	pub kind: EventType,
	/// The element it happened to.
	pub target: Element,
}

type Handler = Rc<dyn Fn(&GraphEvent)>;

struct Binding {
	kinds: Vec<EventType>,
	selector: Selector,
	handler: Handler,
}

/// Shared handle to a graph instance and its event bindings.
#[derive(Clone)]
pub struct GraphHandle {
	graph: Rc<RefCell<Graph>>,
	bindings: Rc<RefCell<Vec<Binding>>>,
}

impl fmt::Debug for GraphHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut out = f.debug_struct("GraphHandle");
		match self.graph.try_borrow() {
			Ok(graph) => out.field("elements", &graph.len()),
			Err(_) => out.field("elements", &"<borrowed>"),
		};
		out.field("bindings", &self.bindings.borrow().len()).finish()
	}
}

/// Non-owning counterpart of [`GraphHandle`], for handlers stored on the
/// instance itself.
#[derive(Clone)]
pub struct WeakGraphHandle {
	graph: Weak<RefCell<Graph>>,
	bindings: Weak<RefCell<Vec<Binding>>>,
}

impl WeakGraphHandle {
	/// The live handle, if the instance still exists.
	pub fn upgrade(&self) -> Option<GraphHandle> {
		Some(GraphHandle {
			graph: self.graph.upgrade()?,
			bindings: self.bindings.upgrade()?,
		})
	}
}

impl GraphHandle {
	/// Wrap a graph with an empty binding list.
	pub fn new(graph: Graph) -> Self {
		Self {
			graph: Rc::new(RefCell::new(graph)),
			bindings: Rc::new(RefCell::new(Vec::new())),
		}
	}

	/// A handle that does not keep the instance alive.
	pub fn downgrade(&self) -> WeakGraphHandle {
		WeakGraphHandle {
			graph: Rc::downgrade(&self.graph),
			bindings: Rc::downgrade(&self.bindings),
		}
	}

	/// Read the graph.
	pub fn with<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
		f(&self.graph.borrow())
	}

	/// Mutate the graph. Must not be called from inside `with`.
	pub fn with_mut<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
		f(&mut self.graph.borrow_mut())
	}

	/// Bind `handler` to a space-separated list of events, optionally
	/// restricted to elements matching `selector`.
	pub fn on(
		&self,
		events: &str,
		selector: Option<&str>,
		handler: impl Fn(&GraphEvent) + 'static,
	) -> Result<(), GraphError> {
		let kinds = EventType::parse_list(events)?;
		if kinds.is_empty() {
			return Err(GraphError::UnknownEvent(events.to_string()));
		}
		let selector = Selector::parse_optional(selector)?;
		log::debug!(
			"link-graph: bound `{}` ({} handlers)",
			events,
			self.bindings.borrow().len() + 1
		);
		self.bindings.borrow_mut().push(Binding {
			kinds,
			selector,
			handler: Rc::new(handler),
		});
		Ok(())
	}

	/// Number of registered bindings.
	pub fn binding_count(&self) -> usize {
		self.bindings.borrow().len()
	}

	/// Deliver `kind` on element `id` to every matching binding.
	pub fn emit(&self, kind: EventType, id: &str) {
		let (event, handlers) = {
			let graph = self.graph.borrow();
			let Some(state) = graph.state(id) else {
				return;
			};
			let handlers: Vec<Handler> = self
				.bindings
				.borrow()
				.iter()
				.filter(|b| b.kinds.contains(&kind) && b.selector.matches(&state))
				.map(|b| b.handler.clone())
				.collect();
			let event = GraphEvent {
				kind,
				target: state.element.clone(),
			};
			(event, handlers)
		};
		for handler in handlers {
			handler(&event);
		}
	}

	/// Select an element, emitting `select` if its state changed.
	pub fn select(&self, id: &str) -> bool {
		let changed = self.with_mut(|g| g.set_selected(id, true));
		if changed {
			self.emit(EventType::Select, id);
		}
		changed
	}

	/// Unselect an element, emitting `unselect` if its state changed.
	pub fn unselect(&self, id: &str) -> bool {
		let changed = self.with_mut(|g| g.set_selected(id, false));
		if changed {
			self.emit(EventType::Unselect, id);
		}
		changed
	}

	/// Unselect every selected element.
	pub fn unselect_all(&self) {
		for id in self.with(Graph::selected) {
			self.unselect(&id);
		}
	}

	/// A primary click. On an element: selects it exclusively, then emits
	/// `tap`. On the background (`None`): clears the selection.
	pub fn tap(&self, id: Option<&str>) {
		let Some(id) = id.filter(|id| self.with(|g| g.get(id).is_some())) else {
			self.unselect_all();
			return;
		};
		for other in self.with(Graph::selected) {
			if other != id {
				self.unselect(&other);
			}
		}
		self.select(id);
		self.emit(EventType::Tap, id);
	}

	/// Toggle an element in or out of the selection without touching others.
	pub fn toggle(&self, id: &str) {
		if self.with(|g| g.is_selected(id)) {
			self.unselect(id);
		} else {
			self.select(id);
		}
	}

	/// Emit `dbltap` on `id`.
	pub fn double_tap(&self, id: &str) {
		self.emit(EventType::DblTap, id);
	}

	/// Emit `cxttap` on `id`.
	pub fn context_tap(&self, id: &str) {
		self.emit(EventType::CxtTap, id);
	}

	/// Move the pointer onto `id` (or off everything), emitting `mouseout`
	/// and `mouseover` as needed.
	pub fn hover(&self, id: Option<&str>) {
		let current = self.with(|g| g.hovered().map(|e| e.id.clone()));
		if current.as_deref() == id {
			return;
		}
		let previous = self.with_mut(|g| g.set_hovered(id));
		if let Some(previous) = previous {
			self.emit(EventType::MouseOut, &previous);
		}
		if let Some(id) = id {
			self.emit(EventType::MouseOver, id);
		}
	}
}
