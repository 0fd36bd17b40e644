//! Selection filtering: turns `select`/`unselect` events into the published
//! [`Selection`] state, trimming the selected element's data to its
//! allow-list.

use std::rc::Rc;

use super::config::VisibleProps;
use super::events::{EventType, GraphEvent};
use super::types::{Element, ElementData};

/// The most recently selected element and the data the info panel shows.
#[derive(Clone, Debug, PartialEq)]
pub struct LastSelected {
	/// The selected element.
	pub element: Element,
	/// Its data restricted to the visible keys.
	pub filtered_data: Rc<ElementData>,
}

/// Published selection state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
	/// Ids of every currently selected element.
	pub selected: Vec<String>,
	/// Kept across `unselect` so highlighting stays pinned to the last pick.
	pub last_selected: Option<LastSelected>,
}

/// Restrict `element`'s data to `allowed`.
///
/// With no allow-list, or an empty one, the element's own data map is
/// returned (shared, not copied). Otherwise the result holds the allowed keys
/// present in the data, in allow-list order.
pub fn filter_data(element: &Element, allowed: Option<&[String]>) -> Rc<ElementData> {
	match allowed {
		Some(keys) if !keys.is_empty() => Rc::new(
			keys.iter()
				.filter_map(|k| Some((k.clone(), element.data.get(k)?.clone())))
				.collect(),
		),
		_ => Rc::clone(&element.data),
	}
}

/// Applies the visible-key configuration to selection events.
#[derive(Clone, Debug, Default)]
pub struct SelectionFilter {
	visible: Rc<VisibleProps>,
}

impl SelectionFilter {
	/// A filter over `visible`.
	pub fn new(visible: VisibleProps) -> Self {
		Self {
			visible: Rc::new(visible),
		}
	}

	/// Filtered data for one element.
	pub fn filtered(&self, element: &Element) -> Rc<ElementData> {
		filter_data(element, self.visible.allowed_keys(element))
	}

	/// Compute the next selection state from the previous one, the (debounced)
	/// trailing event and the instance's current selection.
	pub fn apply(&self, previous: &Selection, event: &GraphEvent, selected: Vec<String>) -> Selection {
		let last_selected = match event.kind {
			EventType::Select => Some(LastSelected {
				element: event.target.clone(),
				filtered_data: self.filtered(&event.target),
			}),
			_ => previous.last_selected.clone(),
		};
		Selection {
			selected,
			last_selected,
		}
	}
}
