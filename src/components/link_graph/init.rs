//! Builds the graph instance and wires its events to shared state and to the
//! host.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use super::callbacks::HostDocument;
use super::config::VisibleProps;
use super::debounce::{Debounced, Scheduler};
use super::error::InitError;
use super::events::{GraphEvent, GraphHandle};
use super::graph::Graph;
use super::layout::{Bounds, LayoutRegistry};
use super::listeners::{ActionData, ActionReport, ListenerSpec, ReportSink};
use super::selection::SelectionFilter;
use super::state::StateStore;
use super::types::GraphElements;

/// Window that collapses bursts of `select`/`unselect` into one update.
pub const SELECT_DEBOUNCE: Duration = Duration::from_millis(100);

/// The element the graph is drawn into.
#[derive(Clone, Debug, PartialEq)]
pub struct Container {
	/// Element id.
	pub id: String,
	/// Width in pixels.
	pub width: f64,
	/// Height in pixels.
	pub height: f64,
}

impl Container {
	/// Container size as layout bounds.
	pub fn bounds(&self) -> Bounds {
		Bounds::new(self.width, self.height)
	}
}

/// Creates the single graph instance for a page.
pub struct Initializer<S: Scheduler> {
	scheduler: S,
	store: StateStore,
	sink: Rc<dyn ReportSink>,
	document: Rc<dyn HostDocument>,
	initialized: Cell<bool>,
}

impl<S: Scheduler> Initializer<S> {
	/// An initializer that has not built an instance yet.
	pub fn new(
		scheduler: S,
		store: StateStore,
		sink: Rc<dyn ReportSink>,
		document: Rc<dyn HostDocument>,
	) -> Self {
		Self {
			scheduler,
			store,
			sink,
			document,
			initialized: Cell::new(false),
		}
	}

	/// Whether `init` has succeeded.
	pub fn is_initialized(&self) -> bool {
		self.initialized.get()
	}

	/// Build the instance and register its handlers. Succeeds at most once;
	/// a failed attempt may be retried.
	pub fn init(
		&self,
		container: &Container,
		elements: &GraphElements,
		listeners: &[ListenerSpec],
		visible: VisibleProps,
	) -> Result<GraphHandle, InitError> {
		if self.initialized.get() {
			return Err(InitError::AlreadyInitialized);
		}

		let mut layouts = LayoutRegistry::with_builtins();
		layouts.register_extensions();

		let graph = GraphHandle::new(Graph::new(elements, container.bounds(), layouts)?);
		self.bind_selection(&graph, SelectionFilter::new(visible))?;
		for listener in listeners {
			self.bind_listener(&graph, listener)?;
		}

		self.initialized.set(true);
		log::info!(
			"link-graph: initialized `{}` with {} elements, {} listeners",
			container.id,
			graph.with(Graph::len),
			listeners.len()
		);
		Ok(graph)
	}

	fn bind_selection(&self, graph: &GraphHandle, filter: SelectionFilter) -> Result<(), InitError> {
		let (weak, store, document) = (graph.downgrade(), self.store.clone(), self.document.clone());
		let publish = Debounced::new(
			self.scheduler.clone(),
			SELECT_DEBOUNCE,
			move |event: GraphEvent| {
				let Some(graph) = weak.upgrade() else {
					return;
				};
				let selected = graph.with(Graph::selected);
				let next = filter.apply(&store.selection(), &event, selected);
				store.set_selection(next);
				document.focus_body();
			},
		);
		graph.on("select unselect", None, move |e| publish.call(e.clone()))?;
		Ok(())
	}

	fn bind_listener(&self, graph: &GraphHandle, listener: &ListenerSpec) -> Result<(), InitError> {
		let sink = self.sink.clone();
		let report = Debounced::new(
			self.scheduler.clone(),
			listener.effective_debounce(),
			move |report: ActionReport| sink.send(&report),
		);
		let (name, clock) = (listener.name.clone(), self.scheduler.clone());
		graph.on(&listener.event_type, listener.selector.as_deref(), move |e| {
			report.call(ActionReport {
				action: name.clone(),
				data: ActionData {
					kind: e.kind,
					target_id: e.target.id.clone(),
					target_group: e.target.group,
				},
				timestamp: clock.now_ms(),
			});
		})?;
		log::debug!(
			"link-graph: listener `{}` on `{}` ({:?})",
			listener.name,
			listener.event_type,
			listener.effective_debounce()
		);
		Ok(())
	}
}
