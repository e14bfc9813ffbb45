// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::datamodel::{Edge, Node, NodeKind, Rect};
use crate::engine::DiagramEngine;

const RENDER_STYLES: &str = r#"
/* Canvas */
.storm-canvas text {
  fill: #000000;
  font-size: 12px;
  font-family: "Roboto", "Open Sans", "Arial", sans-serif;
  text-anchor: middle;
  white-space: nowrap;
}

.storm-canvas text.storm-kind {
  font-size: 9px;
  fill: #555555;
}

/* Contexts */
.storm-context rect {
  stroke-width: 1.5px;
  stroke: #5c6bc0;
  fill: #e8eaf6;
  fill-opacity: 0.6;
}

.storm-context text {
  font-weight: 600;
}

.storm-context.storm-collapsed rect {
  stroke-dasharray: 4 2;
}

/* Leaf nodes */
.storm-node rect {
  stroke-width: 1px;
  stroke: #333333;
}

.storm-aggregate rect { fill: #ffe66d; }
.storm-command rect { fill: #8ecae6; }
.storm-event rect { fill: #ffb86c; }
.storm-policy rect { fill: #cdb4db; }
.storm-readmodel rect { fill: #95d5b2; }
.storm-ui rect { fill: #ffffff; }

.storm-selected rect {
  stroke: #4444dd;
  stroke-width: 2.5px;
}

/* Edges */
.storm-edge {
  stroke-width: 1px;
  stroke: #333333;
  fill: none;
}

.storm-edge.storm-animated {
  stroke: #d62828;
  stroke-dasharray: 6 3;
}

.storm-bundle {
  stroke-width: 2px;
  stroke: #5c6bc0;
  stroke-dasharray: 8 4;
  fill: none;
}

.storm-canvas text.storm-bundle-count {
  fill: #5c6bc0;
  font-weight: 600;
}
"#;

const VIEW_MARGIN: f64 = 10.0;

fn escape_xml_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

fn escape_xml_attr(s: &str) -> String {
    escape_xml_text(s).replace('"', "&quot;")
}

/// Integers print without a trailing ".0".
fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n:.2}")
    }
}

fn kind_class(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Context => "storm-context",
        NodeKind::Aggregate => "storm-aggregate",
        NodeKind::Command => "storm-command",
        NodeKind::Event => "storm-event",
        NodeKind::Policy => "storm-policy",
        NodeKind::ReadModel => "storm-readmodel",
        NodeKind::Ui => "storm-ui",
    }
}

fn render_rect(rect: &Rect, rx: f64) -> String {
    format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\"></rect>",
        format_number(rect.x),
        format_number(rect.y),
        format_number(rect.width),
        format_number(rect.height),
        format_number(rx)
    )
}

fn render_context(node: &Node, bounds: &Rect, collapsed: bool, selected: bool) -> String {
    let mut class = String::from("storm-context");
    if collapsed {
        class.push_str(" storm-collapsed");
    }
    if selected {
        class.push_str(" storm-selected");
    }

    let mut svg = format!(
        "<g class=\"{}\" data-id=\"{}\">",
        class,
        escape_xml_attr(&node.id)
    );
    svg.push_str(&render_rect(bounds, 8.0));
    let title_y = if collapsed {
        bounds.center().y + 4.0
    } else {
        bounds.y + 20.0
    };
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\">{}</text>",
        format_number(bounds.center().x),
        format_number(title_y),
        escape_xml_text(node.display_name())
    ));
    svg.push_str("</g>");
    svg
}

fn render_leaf(node: &Node, bounds: &Rect, selected: bool) -> String {
    let mut svg = format!(
        "<g class=\"storm-node {}{}\" data-id=\"{}\">",
        kind_class(node.kind),
        if selected { " storm-selected" } else { "" },
        escape_xml_attr(&node.id)
    );
    svg.push_str(&render_rect(bounds, 2.0));
    let center = bounds.center();
    svg.push_str(&format!(
        "<text class=\"storm-kind\" x=\"{}\" y=\"{}\">{}</text>",
        format_number(center.x),
        format_number(bounds.y + 14.0),
        node.kind
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\">{}</text>",
        format_number(center.x),
        format_number(center.y + 6.0),
        escape_xml_text(node.display_name())
    ));
    svg.push_str("</g>");
    svg
}

fn render_edge(edge: &Edge, from: &Rect, to: &Rect) -> String {
    let a = from.center();
    let b = to.center();
    let line = |class: &str| {
        format!(
            "<path class=\"{}\" data-id=\"{}\" d=\"M{},{}L{},{}\"></path>",
            class,
            escape_xml_attr(&edge.id),
            format_number(a.x),
            format_number(a.y),
            format_number(b.x),
            format_number(b.y)
        )
    };

    if !edge.bundled {
        return line(if edge.animated {
            "storm-edge storm-animated"
        } else {
            "storm-edge"
        });
    }

    let mut svg = line("storm-bundle");
    svg.push_str(&format!(
        "<text class=\"storm-bundle-count\" x=\"{}\" y=\"{}\">{}</text>",
        format_number((a.x + b.x) / 2.0),
        format_number((a.y + b.y) / 2.0 - 4.0),
        edge.count
    ));
    svg
}

/// Render every visible node and edge of the diagram as a standalone SVG
/// document. Containers draw first, then edges, then leaf nodes on top.
pub fn render_svg(engine: &DiagramEngine) -> String {
    let mut containers = Vec::new();
    let mut leaves = Vec::new();
    let mut edges = Vec::new();
    let mut view_box: Option<Rect> = None;

    for node in engine.graph().nodes().filter(|n| !n.hidden) {
        let Some(bounds) = engine.absolute_bounds(&node.id) else {
            continue;
        };
        view_box = Some(match view_box {
            Some(vb) => vb.union(&bounds),
            None => bounds,
        });
        let selected = engine.selection().contains(&node.id);
        if node.kind == NodeKind::Context {
            let collapsed = engine.is_collapsed(&node.id).unwrap_or(true);
            containers.push(render_context(node, &bounds, collapsed, selected));
        } else {
            leaves.push(render_leaf(node, &bounds, selected));
        }
    }

    for edge in engine.graph().edges().filter(|e| !e.hidden) {
        let (Some(from), Some(to)) = (
            engine.absolute_bounds(&edge.source),
            engine.absolute_bounds(&edge.target),
        ) else {
            continue;
        };
        edges.push(render_edge(edge, &from, &to));
    }

    let (vb_str, width, height) = match view_box {
        Some(vb) => {
            let left = vb.x.floor() - VIEW_MARGIN;
            let top = vb.y.floor() - VIEW_MARGIN;
            let width = (vb.right() - left).ceil() + VIEW_MARGIN;
            let height = (vb.bottom() - top).ceil() + VIEW_MARGIN;
            (
                format!(
                    "{} {} {} {}",
                    format_number(left),
                    format_number(top),
                    format_number(width),
                    format_number(height)
                ),
                width,
                height,
            )
        }
        None => ("0 0 100 100".to_owned(), 100.0, 100.0),
    };

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg style=\"width: {}; height: {};\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{}\" preserveAspectRatio=\"xMinYMin\" class=\"storm-canvas\">",
        format_number(width),
        format_number(height),
        vb_str
    ));
    svg.push_str("<style>\n");
    svg.push_str(RENDER_STYLES);
    svg.push_str("\n</style>\n");
    svg.push_str("<g>");
    for fragment in containers.iter().chain(&edges).chain(&leaves) {
        svg.push_str(fragment);
    }
    svg.push_str("</g>");
    svg.push_str("</svg>");
    svg
}
