//! The relationship chart: members as avatars, connections as coloured arcs.

use hearth_common::{HearthError, Result, UserId};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::HashMap;
use tracing::info;

use crate::avatar::Avatar;
use crate::canvas::{render_png, Overlay, BACKGROUND};
use crate::connections::{Connection, ConnectionKind};
use crate::layout::spring_layout;

const WIDTH: u32 = 1600;
const HEIGHT: u32 = 1200;
const SIDE_MARGIN: f64 = 140.0;
const TOP_MARGIN: f64 = 120.0;
const BOTTOM_MARGIN: f64 = 230.0;
const LAYOUT_ITERATIONS: usize = 200;
const ARC_SAMPLES: usize = 32;

/// Side length of a node's avatar.
pub const AVATAR_SIZE: u32 = 64;

/// A member on the chart.
#[derive(Debug, Clone)]
pub struct ChartNode {
    /// Member id.
    pub user: UserId,
    /// Label under the avatar.
    pub name: String,
    /// Avatar, when it could be fetched.
    pub avatar: Option<Avatar>,
}

/// Everything needed to draw the chart.
#[derive(Debug, Clone)]
pub struct ConnectionChart {
    /// Caption, e.g. `Hearth Connection Chart`.
    pub title: String,
    /// Members in first-appearance order.
    pub nodes: Vec<ChartNode>,
    /// One edge per stored connection, as node indexes.
    pub edges: Vec<(usize, usize, ConnectionKind)>,
}

impl ConnectionChart {
    /// Chart for `connections`; names default to `User(<id>)` until resolved.
    pub fn from_connections(guild_name: &str, connections: &[Connection]) -> Self {
        let mut index: HashMap<UserId, usize> = HashMap::new();
        let mut nodes = Vec::new();
        let mut node_for = |user: UserId, nodes: &mut Vec<ChartNode>| {
            *index.entry(user).or_insert_with(|| {
                nodes.push(ChartNode {
                    user,
                    name: format!("User({user})"),
                    avatar: None,
                });
                nodes.len() - 1
            })
        };

        let edges = connections
            .iter()
            .map(|c| {
                let a = node_for(c.user1, &mut nodes);
                let b = node_for(c.user2, &mut nodes);
                (a, b, c.connection)
            })
            .collect();

        Self {
            title: format!("{guild_name} Connection Chart"),
            nodes,
            edges,
        }
    }
}

/// Control-point offset of each edge, so parallel edges between one pair fan out.
fn arc_bends(edges: &[(usize, usize, ConnectionKind)]) -> Vec<f64> {
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
    edges
        .iter()
        .map(|&(a, b, _)| {
            let pair = (a.min(b), a.max(b));
            let nth = seen.entry(pair).or_insert(0);
            let bend = 0.5 - 0.35 * *nth as f64;
            *nth += 1;
            if a <= b {
                bend
            } else {
                -bend
            }
        })
        .collect()
}

/// Points along a quadratic arc from `from` to `to`, bent by `bend` times their distance.
fn arc_points(from: (f64, f64), to: (f64, f64), bend: f64) -> Vec<(i32, i32)> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let control = ((from.0 + to.0) / 2.0 + bend * dy, (from.1 + to.1) / 2.0 - bend * dx);
    (0..=ARC_SAMPLES)
        .map(|i| {
            let t = i as f64 / ARC_SAMPLES as f64;
            let u = 1.0 - t;
            let x = u * u * from.0 + 2.0 * u * t * control.0 + t * t * to.0;
            let y = u * u * from.1 + 2.0 * u * t * control.1 + t * t * to.1;
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}

fn to_pixels((x, y): (f64, f64)) -> (f64, f64) {
    let usable_w = f64::from(WIDTH) - 2.0 * SIDE_MARGIN;
    let usable_h = f64::from(HEIGHT) - TOP_MARGIN - BOTTOM_MARGIN;
    (
        SIDE_MARGIN + (x + 1.0) / 2.0 * usable_w,
        TOP_MARGIN + (1.0 - (y + 1.0) / 2.0) * usable_h,
    )
}

/// Render the chart as PNG bytes.
pub fn render_connection_chart(chart: &ConnectionChart) -> Result<Vec<u8>> {
    if chart.nodes.is_empty() {
        return Err(HearthError::graph("No connections to draw"));
    }

    let pairs: Vec<(usize, usize)> = chart.edges.iter().map(|&(a, b, _)| (a, b)).collect();
    let centers: Vec<(f64, f64)> = spring_layout(chart.nodes.len(), &pairs, LAYOUT_ITERATIONS)
        .into_iter()
        .map(to_pixels)
        .collect();

    let png = render_png(WIDTH, HEIGHT, |root| {
        root.fill(&BACKGROUND)?;

        let title_style = ("sans-serif", 36)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Center, VPos::Center));
        root.draw(&Text::new(chart.title.as_str(), (WIDTH as i32 / 2, 50), title_style))?;

        for (&(a, b, kind), bend) in chart.edges.iter().zip(arc_bends(&chart.edges)) {
            let points = arc_points(centers[a], centers[b], bend);
            root.draw(&PathElement::new(points, kind.color().mix(0.8).stroke_width(6)))?;
        }

        let label_style = ("sans-serif", 20)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Center, VPos::Top));
        let mut overlays = Vec::new();
        for (node, &(x, y)) in chart.nodes.iter().zip(&centers) {
            let center = (x.round() as i32, y.round() as i32);
            match &node.avatar {
                Some(avatar) => overlays.push(Overlay { avatar, center }),
                None => {
                    root.draw(&Circle::new(center, AVATAR_SIZE as i32 / 2, RGBColor(0x72, 0x89, 0xDA).filled()))?;
                }
            }

            let (w, h) = root.estimate_text_size(&node.name, &label_style)?;
            let top = center.1 + AVATAR_SIZE as i32 / 2 + 6;
            let half = w as i32 / 2 + 6;
            root.draw(&Rectangle::new(
                [(center.0 - half, top - 3), (center.0 + half, top + h as i32 + 3)],
                BLACK.mix(0.7).filled(),
            ))?;
            root.draw(&Text::new(node.name.as_str(), (center.0, top), label_style.clone()))?;
        }

        draw_legend(root)?;
        Ok(overlays)
    })?;

    info!(
        nodes = chart.nodes.len(),
        edges = chart.edges.len(),
        "Rendered connection chart"
    );
    Ok(png)
}

fn draw_legend(root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>) -> Result<()> {
    const COLUMNS: usize = 3;
    const COLUMN_WIDTH: i32 = 260;
    const ROW_HEIGHT: i32 = 44;

    let style = ("sans-serif", 22)
        .into_font()
        .color(&WHITE)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let left = WIDTH as i32 / 2 - COLUMN_WIDTH * COLUMNS as i32 / 2;
    let top = HEIGHT as i32 - BOTTOM_MARGIN as i32 + 110;

    for (i, kind) in ConnectionKind::ALL.into_iter().enumerate() {
        let x = left + (i % COLUMNS) as i32 * COLUMN_WIDTH;
        let y = top + (i / COLUMNS) as i32 * ROW_HEIGHT;
        root.draw(&Rectangle::new([(x, y - 10), (x + 36, y + 10)], kind.color().filled()))?;
        root.draw(&Text::new(kind.label(), (x + 48, y), style.clone()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(a: u64, b: u64, kind: ConnectionKind) -> Connection {
        Connection {
            user1: UserId(a),
            user2: UserId(b),
            connection: kind,
        }
    }

    #[test]
    fn test_nodes_follow_first_appearance() {
        let chart = ConnectionChart::from_connections(
            "Hearth",
            &[
                connection(5, 7, ConnectionKind::Friend),
                connection(7, 9, ConnectionKind::Sibling),
                connection(9, 5, ConnectionKind::Cousin),
            ],
        );

        assert_eq!(chart.title, "Hearth Connection Chart");
        let users: Vec<u64> = chart.nodes.iter().map(|n| n.user.0).collect();
        assert_eq!(users, vec![5, 7, 9]);
        assert_eq!(chart.nodes[2].name, "User(9)");
        assert_eq!(
            chart.edges,
            vec![
                (0, 1, ConnectionKind::Friend),
                (1, 2, ConnectionKind::Sibling),
                (2, 0, ConnectionKind::Cousin),
            ]
        );
    }

    #[test]
    fn test_parallel_edges_bend_apart() {
        let bends = arc_bends(&[
            (0, 1, ConnectionKind::Friend),
            (1, 0, ConnectionKind::Roommate),
            (0, 2, ConnectionKind::Friend),
        ]);
        assert_eq!(bends[0], 0.5);
        assert!((bends[1] + 0.15).abs() < 1e-9);
        assert_eq!(bends[2], 0.5);
    }

    #[test]
    fn test_arc_starts_and_ends_on_nodes() {
        let points = arc_points((10.0, 10.0), (110.0, 10.0), 0.5);
        assert_eq!(points.first(), Some(&(10, 10)));
        assert_eq!(points.last(), Some(&(110, 10)));
        assert!(points.iter().any(|&(_, y)| y != 10));
    }

    #[test]
    fn test_empty_chart_is_an_error() {
        let chart = ConnectionChart::from_connections("Hearth", &[]);
        assert!(render_connection_chart(&chart).is_err());
    }
}
