//! Style rules, style sheet assembly and per-element style resolution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::ElementState;
use super::selector::Selector;
use super::theme::{Color, ThemeName, theme_styles};

/// One selector-keyed block of style properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
	/// Elements the rule applies to.
	pub selector: String,
	/// Property name to value.
	pub style: Map<String, Value>,
}

/// Style inputs kept in shared state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleState {
	/// Active theme.
	#[serde(default)]
	pub theme: ThemeName,
	/// Host rules, applied between the theme defaults and highlight rules.
	#[serde(default)]
	pub custom_style: Vec<StyleRule>,
}

/// Assemble the full rule list for a theme: theme defaults, then the host's
/// custom rules, then the theme's highlight rules.
pub fn build_style_sheet(theme: ThemeName, custom_style: &[StyleRule]) -> Vec<StyleRule> {
	let tables = theme_styles(theme);
	tables
		.default
		.into_iter()
		.chain(custom_style.iter().cloned())
		.chain(tables.highlight)
		.collect()
}

/// A compiled rule list. Rules whose selector does not parse are dropped.
#[derive(Clone, Debug, Default)]
pub struct StyleSheet {
	rules: Vec<StyleRule>,
	compiled: Vec<(Selector, Map<String, Value>)>,
}

impl StyleSheet {
	/// Parse the selectors of `rules`.
	pub fn compile(rules: Vec<StyleRule>) -> Self {
		let compiled = rules
			.iter()
			.filter_map(|rule| match rule.selector.parse::<Selector>() {
				Ok(selector) => Some((selector, rule.style.clone())),
				Err(e) => {
					log::warn!("link-graph: skipping style rule: {e}");
					None
				}
			})
			.collect();
		Self { rules, compiled }
	}

	/// The rules as given, in application order.
	pub fn rules(&self) -> &[StyleRule] {
		&self.rules
	}

	/// Apply every matching rule in order; later rules override earlier ones.
	pub fn resolve(&self, state: &ElementState<'_>) -> ElementStyle {
		let mut style = ElementStyle::base(state.element.is_edge());
		for (selector, props) in &self.compiled {
			if selector.matches(state) {
				for (key, value) in props {
					style.apply(key, value, state);
				}
			}
		}
		style
	}
}

/// Resolved visual properties of one element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementStyle {
	/// Node fill.
	pub color: Color,
	/// Node diameter.
	pub size: f64,
	/// Edge color.
	pub line_color: Color,
	/// Edge line width.
	pub width: f64,
	/// Overall opacity.
	pub opacity: f64,
	/// Label text.
	pub label: Option<String>,
	/// Label color.
	pub text_color: Color,
	/// Label size.
	pub font_size: f64,
	/// Node border width.
	pub border_width: f64,
	/// Node border color.
	pub border_color: Color,
}

impl ElementStyle {
	fn base(is_edge: bool) -> Self {
		Self {
			color: Color::rgb(153, 153, 153),
			size: 30.0,
			line_color: Color::rgb(153, 153, 153),
			width: if is_edge { 2.0 } else { 30.0 },
			opacity: 1.0,
			label: None,
			text_color: Color::rgb(0, 0, 0),
			font_size: 10.0,
			border_width: 0.0,
			border_color: Color::rgb(0, 0, 0),
		}
	}

	fn apply(&mut self, key: &str, value: &Value, state: &ElementState<'_>) {
		let number = || value.as_f64().or_else(|| value.as_str()?.trim_end_matches("px").parse().ok());
		let color = || value.as_str().and_then(Color::parse);
		let is_edge = state.element.is_edge();
		match key {
			"background-color" => self.color = color().unwrap_or(self.color),
			"line-color" => self.line_color = color().unwrap_or(self.line_color),
			"color" => self.text_color = color().unwrap_or(self.text_color),
			"border-color" => self.border_color = color().unwrap_or(self.border_color),
			"width" => {
				if let Some(w) = number() {
					self.width = w;
					if !is_edge {
						self.size = w;
					}
				}
			}
			"height" if !is_edge => self.size = number().map_or(self.size, |h| self.size.max(h)),
			"opacity" => self.opacity = number().map_or(self.opacity, |o| o.clamp(0.0, 1.0)),
			"border-width" => self.border_width = number().unwrap_or(self.border_width),
			"font-size" => self.font_size = number().unwrap_or(self.font_size),
			"label" => self.label = label_text(value, state),
			_ => {}
		}
	}
}

/// A label is either literal text or a `data(key)` mapping into the element's
/// data.
fn label_text(value: &Value, state: &ElementState<'_>) -> Option<String> {
	let text = value.as_str()?;
	let Some(key) = text
		.strip_prefix("data(")
		.and_then(|rest| rest.strip_suffix(')'))
	else {
		return (!text.is_empty()).then(|| text.to_string());
	};
	match state.element.data.get(key.trim())? {
		Value::String(s) => Some(s.clone()),
		Value::Null => None,
		other => Some(other.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use serde_json::json;

	use super::*;
	use crate::components::link_graph::types::{Element, ElementGroup};

	fn rule(selector: &str, style: Value) -> StyleRule {
		StyleRule {
			selector: selector.to_string(),
			style: style.as_object().cloned().unwrap(),
		}
	}

	#[test]
	fn highlight_rules_come_last() {
		let custom = vec![rule("node[label = \"Person\"]", json!({"background-color": "#00ff00"}))];
		let sheet = build_style_sheet(ThemeName::Dark, &custom);
		let tables = theme_styles(ThemeName::Dark);

		let expected: Vec<StyleRule> = tables
			.default
			.iter()
			.chain(&custom)
			.chain(&tables.highlight)
			.cloned()
			.collect();
		assert_eq!(sheet, expected);
	}

	#[test]
	fn later_rules_win_and_labels_map_data() {
		let el = Element::from_data(
			ElementGroup::Nodes,
			json!({"id": "a", "label": "Person", "name": "Ana"})
				.as_object()
				.cloned()
				.unwrap(),
		)
		.unwrap();
		let classes: BTreeSet<String> = ["highlight".to_string()].into();
		let state = ElementState {
			element: &el,
			classes: &classes,
			selected: false,
		};

		let sheet = StyleSheet::compile(vec![
			rule("node", json!({"background-color": "#ff0000", "label": "data(name)"})),
			rule("not a selector ((", json!({"background-color": "#000000"})),
			rule(".highlight", json!({"background-color": "#0000ff", "width": "40px"})),
		]);
		let style = sheet.resolve(&state);
		assert_eq!(style.color, Color::rgb(0, 0, 255));
		assert_eq!(style.size, 40.0);
		assert_eq!(style.label.as_deref(), Some("Ana"));
		assert_eq!(sheet.rules().len(), 3);
	}

	#[test]
	fn style_state_defaults() {
		let state: StyleState = serde_json::from_value(json!({})).unwrap();
		assert_eq!(state.theme, ThemeName::Light);
		assert!(state.custom_style.is_empty());
	}
}
