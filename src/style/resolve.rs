//! Per-edge border and shading resolution.
//!
//! A declaration chain is ordered most specific first (cell, row, table).
//! Each edge attribute is resolved on its own: the first level that says
//! anything about it wins, and within a level the edge-specific value is
//! consulted before the `Borders` shorthand. An explicit width counts as
//! "visible" unless visibility is declared at the same or a more specific
//! level.

use serde::Serialize;

use super::{Borders, Color, Edge, Shading};

/// Effective style of one border edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEdge {
    pub width: f64,
    pub visible: bool,
    pub color: Color,
}

impl ResolvedEdge {
    /// Whether this edge produces a stroke.
    pub fn is_drawn(&self) -> bool {
        self.visible && self.width > 0.0
    }
}

/// Effective border style for all four edges of a box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBorders {
    pub top: ResolvedEdge,
    pub right: ResolvedEdge,
    pub bottom: ResolvedEdge,
    pub left: ResolvedEdge,
}

impl ResolvedBorders {
    pub fn edge(&self, edge: Edge) -> ResolvedEdge {
        match edge {
            Edge::Top => self.top,
            Edge::Right => self.right,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
        }
    }

    /// Edges that produce a stroke, in top/right/bottom/left order.
    pub fn drawn_edges(&self) -> impl Iterator<Item = (Edge, ResolvedEdge)> + '_ {
        Edge::ALL
            .into_iter()
            .map(move |e| (e, self.edge(e)))
            .filter(|(_, r)| r.is_drawn())
    }
}

/// Resolve a single edge against a declaration chain.
pub fn resolve_edge(chain: &[&Borders], edge: Edge, default_width: f64) -> ResolvedEdge {
    let width = chain
        .iter()
        .find_map(|b| b.edge(edge).width.or(b.width))
        .map(|w| w.points())
        .unwrap_or(default_width);

    let visible = chain
        .iter()
        .find_map(|b| {
            let e = b.edge(edge);
            e.visible
                .or(e.width.map(|_| true))
                .or(b.visible)
                .or(b.width.map(|_| true))
        })
        .unwrap_or(false);

    let color = chain
        .iter()
        .find_map(|b| b.edge(edge).color.or(b.color))
        .unwrap_or(Color::BLACK);

    ResolvedEdge {
        width: width.max(0.0),
        visible,
        color,
    }
}

/// Resolve all four edges against a declaration chain.
pub fn resolve_borders(chain: &[&Borders], default_width: f64) -> ResolvedBorders {
    ResolvedBorders {
        top: resolve_edge(chain, Edge::Top, default_width),
        right: resolve_edge(chain, Edge::Right, default_width),
        bottom: resolve_edge(chain, Edge::Bottom, default_width),
        left: resolve_edge(chain, Edge::Left, default_width),
    }
}

/// Resolve the fill color of a shading chain. An explicit `visible: false`
/// at a more specific level hides inherited shading.
pub fn resolve_shading(chain: &[&Shading]) -> Option<Color> {
    chain
        .iter()
        .find_map(|s| match (s.visible, s.color) {
            (Some(false), _) => Some(None),
            (_, Some(c)) => Some(Some(c)),
            _ => None,
        })
        .flatten()
        .filter(|c| c.a > 0.0)
}
