//! Force-directed node placement.

use std::f64::consts::TAU;

/// Closest two nodes are treated as being when computing forces.
const MIN_DISTANCE: f64 = 0.01;

/// Positions for `count` nodes joined by `edges`, scaled into `[-1, 1]`.
///
/// Nodes start evenly spaced on a circle, repel each other and are pulled
/// together along edges (Fruchterman-Reingold) for `iterations` rounds with a
/// cooling step size. The same input always yields the same layout.
pub fn spring_layout(count: usize, edges: &[(usize, usize)], iterations: usize) -> Vec<(f64, f64)> {
    match count {
        0 => return Vec::new(),
        1 => return vec![(0.0, 0.0)],
        _ => {}
    }

    let mut positions: Vec<(f64, f64)> = (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            (angle.cos(), angle.sin())
        })
        .collect();
    let k = (4.0 / count as f64).sqrt();
    let mut temperature = 0.2;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut shift = vec![(0.0, 0.0); count];

        for i in 0..count {
            for j in (i + 1)..count {
                let (dx, dy, dist) = delta(positions[i], positions[j]);
                let force = k * k / dist;
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                shift[i].0 += fx;
                shift[i].1 += fy;
                shift[j].0 -= fx;
                shift[j].1 -= fy;
            }
        }

        for &(a, b) in edges.iter().filter(|(a, b)| a != b && *a < count && *b < count) {
            let (dx, dy, dist) = delta(positions[a], positions[b]);
            let force = dist * dist / k;
            let (fx, fy) = (dx / dist * force, dy / dist * force);
            shift[a].0 -= fx;
            shift[a].1 -= fy;
            shift[b].0 += fx;
            shift[b].1 += fy;
        }

        for (position, (sx, sy)) in positions.iter_mut().zip(shift) {
            let length = (sx * sx + sy * sy).sqrt();
            if length > 0.0 {
                let step = length.min(temperature);
                position.0 += sx / length * step;
                position.1 += sy / length * step;
            }
        }
        temperature -= cooling;
    }

    normalize(positions)
}

fn delta(a: (f64, f64), b: (f64, f64)) -> (f64, f64, f64) {
    let (dx, dy) = (a.0 - b.0, a.1 - b.1);
    (dx, dy, (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE))
}

/// Centre on the origin and scale the widest coordinate to 1.
fn normalize(mut positions: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let n = positions.len() as f64;
    let (mx, my) = positions
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mx, my) = (mx / n, my / n);
    let extent = positions
        .iter()
        .map(|(x, y)| (x - mx).abs().max((y - my).abs()))
        .fold(0.0, f64::max);
    let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
    for position in &mut positions {
        *position = ((position.0 - mx) * scale, (position.1 - my) * scale);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
        delta(a, b).2
    }

    #[test]
    fn test_trivial_graphs() {
        assert!(spring_layout(0, &[], 50).is_empty());
        assert_eq!(spring_layout(1, &[], 50), vec![(0.0, 0.0)]);
    }

    #[test]
    fn test_connected_nodes_end_up_closer() {
        let positions = spring_layout(3, &[(0, 1)], 100);
        assert!(distance(positions[0], positions[1]) < distance(positions[0], positions[2]));
        assert!(distance(positions[0], positions[1]) < distance(positions[1], positions[2]));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let edges = [(0, 1), (1, 2), (2, 3), (3, 0), (0, 4)];
        assert_eq!(spring_layout(5, &edges, 80), spring_layout(5, &edges, 80));
    }

    proptest! {
        #[test]
        fn prop_positions_fit_the_unit_square(
            count in 2usize..12,
            edges in proptest::collection::vec((0usize..12, 0usize..12), 0..20),
        ) {
            let positions = spring_layout(count, &edges, 60);
            prop_assert_eq!(positions.len(), count);
            for (x, y) in positions {
                prop_assert!(x.is_finite() && y.is_finite());
                prop_assert!(x.abs() <= 1.0 + 1e-9 && y.abs() <= 1.0 + 1e-9);
            }
        }
    }
}
