//! Colors and the per-theme style tables.
//!
//! Each theme contributes two rule blocks: `default` rules that go first in
//! the style sheet and `highlight` rules that go last, so highlight styling
//! wins over anything the host adds in between.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::style::StyleRule;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red.
	pub r: u8,
	/// Green.
	pub g: u8,
	/// Blue.
	pub b: u8,
	/// Alpha, 0.0 to 1.0.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// CSS color string.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses a CSS color string.
	/// Supports hex (`#RGB`, `#RRGGBB`), `rgb()`/`rgba()` and a few names.
	pub fn parse(input: &str) -> Option<Self> {
		let s = input.trim();
		if let Some(hex) = s.strip_prefix('#') {
			let channel = |i: usize, width: usize| {
				let v = u8::from_str_radix(hex.get(i * width..(i + 1) * width)?, 16).ok()?;
				Some(if width == 1 { v * 17 } else { v })
			};
			let width = match hex.len() {
				3 => 1,
				6 => 2,
				_ => return None,
			};
			return Some(Self::rgb(channel(0, width)?, channel(1, width)?, channel(2, width)?));
		}
		if s.starts_with("rgb") {
			let nums: Vec<&str> = s
				.trim_start_matches("rgba(")
				.trim_start_matches("rgb(")
				.trim_end_matches(')')
				.split(',')
				.map(str::trim)
				.collect();
			let r = nums.first()?.parse().ok()?;
			let g = nums.get(1)?.parse().ok()?;
			let b = nums.get(2)?.parse().ok()?;
			let a = nums.get(3).and_then(|a| a.parse().ok()).unwrap_or(1.0);
			return Some(Self::rgba(r, g, b, a));
		}
		match s {
			"white" => Some(Self::rgb(255, 255, 255)),
			"black" => Some(Self::rgb(0, 0, 0)),
			"transparent" => Some(Self::rgba(0, 0, 0, 0.0)),
			_ => None,
		}
	}
}

/// Theme selected by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
	/// Light background.
	#[default]
	Light,
	/// Dark background.
	Dark,
}

impl ThemeName {
	/// Theme name as used by the host.
	pub fn as_str(self) -> &'static str {
		match self {
			ThemeName::Light => "light",
			ThemeName::Dark => "dark",
		}
	}

	/// Canvas background.
	pub fn background(self) -> Color {
		match self {
			ThemeName::Light => Color::rgb(255, 255, 255),
			ThemeName::Dark => Color::rgb(14, 17, 23),
		}
	}
}

/// The two rule blocks a theme contributes to the style sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeStyles {
	/// Base rules, applied first.
	pub default: Vec<StyleRule>,
	/// Highlight rules, applied last.
	pub highlight: Vec<StyleRule>,
}

struct Palette {
	node: Color,
	node_text: Color,
	edge: Color,
	selected: Color,
	highlight: Color,
}

const LIGHT: Palette = Palette {
	node: Color::rgb(94, 129, 172),
	node_text: Color::rgb(38, 39, 48),
	edge: Color::rgb(170, 178, 189),
	selected: Color::rgb(255, 75, 75),
	highlight: Color::rgb(255, 164, 33),
};

const DARK: Palette = Palette {
	node: Color::rgb(129, 161, 193),
	node_text: Color::rgb(250, 250, 250),
	edge: Color::rgb(90, 98, 112),
	selected: Color::rgb(255, 75, 75),
	highlight: Color::rgb(255, 189, 69),
};

fn rule(selector: &str, style: Value) -> StyleRule {
	StyleRule {
		selector: selector.to_string(),
		style: style.as_object().cloned().unwrap_or_default(),
	}
}

/// Style tables for `theme`.
pub fn theme_styles(theme: ThemeName) -> ThemeStyles {
	let p = match theme {
		ThemeName::Light => &LIGHT,
		ThemeName::Dark => &DARK,
	};
	ThemeStyles {
		default: vec![
			rule(
				"node",
				json!({
					"background-color": p.node.to_css(),
					"width": 30,
					"label": "data(label)",
					"color": p.node_text.to_css(),
					"font-size": 10,
				}),
			),
			rule(
				"edge",
				json!({
					"line-color": p.edge.to_css(),
					"width": 2,
					"color": p.node_text.to_css(),
					"font-size": 8,
				}),
			),
			rule(
				"node:selected",
				json!({
					"border-width": 3,
					"border-color": p.selected.to_css(),
				}),
			),
			rule("edge:selected", json!({ "line-color": p.selected.to_css() })),
		],
		highlight: vec![
			rule(
				"node.highlight",
				json!({
					"border-width": 3,
					"border-color": p.highlight.to_css(),
				}),
			),
			rule(
				"edge.highlight",
				json!({
					"line-color": p.highlight.to_css(),
					"width": 3,
				}),
			),
		],
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_css_colors() {
		assert_eq!(Color::parse("#ff0000"), Some(Color::rgb(255, 0, 0)));
		assert_eq!(Color::parse("#0f0"), Some(Color::rgb(0, 255, 0)));
		assert_eq!(
			Color::parse("rgba(1, 2, 3, 0.5)"),
			Some(Color::rgba(1, 2, 3, 0.5))
		);
		assert_eq!(Color::parse("chartreuse-ish"), None);
		assert_eq!(Color::parse("#12345"), None);
	}

	#[test]
	fn highlight_block_targets_highlight_class() {
		for theme in [ThemeName::Light, ThemeName::Dark] {
			let styles = theme_styles(theme);
			assert!(styles.highlight.iter().all(|r| r.selector.contains(".highlight")));
			assert!(!styles.default.is_empty());
		}
	}
}
