//! Canvas rendering for the link graph.
//!
//! Each frame draws, in order:
//! 1. Background (screen space)
//! 2. Edges with arrowheads and labels (world space)
//! 3. Nodes, with selected and highlighted nodes drawn last so they sit on top

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::callbacks::HIGHLIGHT_CLASS;
use super::graph::Graph;
use super::style::ElementStyle;
use super::theme::ThemeName;

const ARROW_SIZE: f64 = 8.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal pan in pixels.
	pub x: f64,
	/// Vertical pan in pixels.
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Map a canvas point into graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zoom by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// Renders the complete graph to the canvas.
pub fn render(
	graph: &Graph,
	ctx: &CanvasRenderingContext2d,
	view: &ViewTransform,
	theme: ThemeName,
) {
	let viewport = graph.viewport();
	ctx.set_fill_style_str(&theme.background().to_css());
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);

	ctx.save();
	let _ = ctx.translate(view.x, view.y);
	let _ = ctx.scale(view.k, view.k);

	draw_edges(graph, ctx);
	draw_nodes(graph, ctx);

	ctx.restore();
}

fn draw_edges(graph: &Graph, ctx: &CanvasRenderingContext2d) {
	for edge in graph.edges() {
		let (Some(source), Some(target)) = (edge.source(), edge.target()) else {
			continue;
		};
		let (Some(s), Some(t), Some(style)) = (
			graph.position(&source),
			graph.position(&target),
			graph.resolved_style(&edge.id),
		) else {
			continue;
		};
		let (dx, dy) = (t.x - s.x, t.y - s.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let source_r = node_radius(graph, &source);
		let target_r = node_radius(graph, &target);

		ctx.set_global_alpha(style.opacity);
		ctx.set_stroke_style_str(&style.line_color.to_css());
		ctx.set_line_width(style.width);
		ctx.begin_path();
		ctx.move_to(s.x + ux * source_r, s.y + uy * source_r);
		ctx.line_to(
			t.x - ux * (target_r + ARROW_SIZE),
			t.y - uy * (target_r + ARROW_SIZE),
		);
		ctx.stroke();

		let (tip_x, tip_y) = (t.x - ux * target_r, t.y - uy * target_r);
		let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.set_fill_style_str(&style.line_color.to_css());
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if let Some(label) = &style.label {
			draw_label(ctx, &style, label, (s.x + t.x) / 2.0, (s.y + t.y) / 2.0 - 4.0);
		}
		ctx.set_global_alpha(1.0);
	}
}

fn node_radius(graph: &Graph, id: &str) -> f64 {
	graph.resolved_style(id).map_or(15.0, |s| s.size / 2.0)
}

fn draw_nodes(graph: &Graph, ctx: &CanvasRenderingContext2d) {
	// Plain nodes first, then anything selected or highlighted on top.
	let (mut plain, mut raised) = (Vec::new(), Vec::new());
	for node in graph.nodes() {
		if graph.is_selected(&node.id) || graph.has_class(&node.id, HIGHLIGHT_CLASS) {
			raised.push(node);
		} else {
			plain.push(node);
		}
	}

	for node in plain.into_iter().chain(raised) {
		let (Some(pos), Some(style)) = (graph.position(&node.id), graph.resolved_style(&node.id)) else {
			continue;
		};
		let radius = style.size / 2.0;

		ctx.set_global_alpha(style.opacity);
		ctx.begin_path();
		let _ = ctx.arc(pos.x, pos.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&style.color.to_css());
		ctx.fill();

		if style.border_width > 0.0 {
			ctx.set_stroke_style_str(&style.border_color.to_css());
			ctx.set_line_width(style.border_width);
			ctx.stroke();
		}

		if let Some(label) = &style.label {
			draw_label(ctx, &style, label, pos.x, pos.y + radius + style.font_size + 2.0);
		}
		ctx.set_global_alpha(1.0);
	}
}

fn draw_label(ctx: &CanvasRenderingContext2d, style: &ElementStyle, text: &str, x: f64, y: f64) {
	ctx.set_fill_style_str(&style.text_color.to_css());
	ctx.set_font(&format!("{}px sans-serif", style.font_size));
	ctx.set_text_align("center");
	let _ = ctx.fill_text(text, x, y);
}
