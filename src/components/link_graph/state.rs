//! Shared application state with per-field change notification.
//!
//! The store is `Rc`-based and therefore confined to the thread that owns the
//! event loop; every write goes through a setter that notifies the
//! subscribers of that field after the borrow is released.

use std::cell::RefCell;
use std::rc::Rc;

use super::layout::LayoutConfig;
use super::selection::Selection;
use super::style::StyleState;

/// Fields of [`AppState`] that can be subscribed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKey {
	/// The `selection` field.
	Selection,
	/// The `layout` field.
	Layout,
	/// The `style` field.
	Style,
}

/// Everything the callbacks react to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
	/// Published selection.
	pub selection: Selection,
	/// Active layout.
	pub layout: LayoutConfig,
	/// Active theme and custom rules.
	pub style: StyleState,
}

type Subscriber = Rc<dyn Fn()>;

/// Single-writer store for [`AppState`].
#[derive(Clone, Default)]
pub struct StateStore {
	state: Rc<RefCell<AppState>>,
	subscribers: Rc<RefCell<Vec<(StateKey, Subscriber)>>>,
}

impl StateStore {
	/// Call `f` after every write to `key`.
	pub fn subscribe(&self, key: StateKey, f: impl Fn() + 'static) {
		self.subscribers.borrow_mut().push((key, Rc::new(f)));
	}

	/// Copy of the whole state.
	pub fn snapshot(&self) -> AppState {
		self.state.borrow().clone()
	}

	/// Current selection.
	pub fn selection(&self) -> Selection {
		self.state.borrow().selection.clone()
	}

	/// Current layout.
	pub fn layout(&self) -> LayoutConfig {
		self.state.borrow().layout.clone()
	}

	/// Current style.
	pub fn style(&self) -> StyleState {
		self.state.borrow().style.clone()
	}

	/// Replace the selection and notify.
	pub fn set_selection(&self, selection: Selection) {
		self.state.borrow_mut().selection = selection;
		self.notify(StateKey::Selection);
	}

	/// Replace the layout and notify.
	pub fn set_layout(&self, layout: LayoutConfig) {
		self.state.borrow_mut().layout = layout;
		self.notify(StateKey::Layout);
	}

	/// Replace the style and notify.
	pub fn set_style(&self, style: StyleState) {
		self.state.borrow_mut().style = style;
		self.notify(StateKey::Style);
	}

	fn notify(&self, key: StateKey) {
		let subscribers: Vec<Subscriber> = self
			.subscribers
			.borrow()
			.iter()
			.filter(|(k, _)| *k == key)
			.map(|(_, f)| f.clone())
			.collect();
		for f in subscribers {
			f();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::components::link_graph::theme::ThemeName;

	#[test]
	fn notifies_only_matching_subscribers() {
		let store = StateStore::default();
		let layout_calls = Rc::new(Cell::new(0));
		let style_calls = Rc::new(Cell::new(0));
		let (l, s) = (layout_calls.clone(), style_calls.clone());
		store.subscribe(StateKey::Layout, move || l.set(l.get() + 1));
		store.subscribe(StateKey::Style, move || s.set(s.get() + 1));

		store.set_layout(LayoutConfig::named("grid"));
		store.set_layout(LayoutConfig::named("circle"));
		assert_eq!(layout_calls.get(), 2);
		assert_eq!(style_calls.get(), 0);
		assert_eq!(store.layout().name, "circle");
	}

	#[test]
	fn subscribers_can_read_and_write_the_store() {
		let store = StateStore::default();
		let reader = store.clone();
		store.subscribe(StateKey::Style, move || {
			if reader.style().theme == ThemeName::Dark {
				reader.set_layout(LayoutConfig::named("grid"));
			}
		});
		store.set_style(StyleState {
			theme: ThemeName::Dark,
			custom_style: Vec::new(),
		});
		assert_eq!(store.snapshot().layout.name, "grid");
	}
}
