// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convex hull of 2D points (Andrew's monotone chain).

use nalgebra::Point2;

/// Returns the convex polygon surrounding `points`.
///
/// Points are sorted by descending x, then descending y, before the hull is
/// built, which makes the result deterministic for duplicated or collinear
/// points. The returned polygon is closed: its first point is repeated at
/// its end. An empty input gives an empty polygon.
pub fn surrounding_polygon(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut vertices = points.to_vec();
    vertices.sort_by(|a, b| b.x.total_cmp(&a.x).then_with(|| b.y.total_cmp(&a.y)));
    let count = vertices.len();
    let mut polygon: Vec<Point2<f64>> = Vec::with_capacity(count + 1);

    // Indices of the first and last points sharing the first x
    let min_min = 0;
    let first_x = vertices[0].x;
    let min_max = vertices.iter().take_while(|v| v.x == first_x).count() - 1;
    if min_max == count - 1 {
        // All points are on a vertical line
        polygon.push(vertices[min_min]);
        if vertices[min_max].y != vertices[min_min].y {
            polygon.push(vertices[min_max]);
        }
        polygon.push(vertices[min_min]);
        return polygon;
    }

    // Indices of the first and last points sharing the last x
    let max_max = count - 1;
    let last_x = vertices[max_max].x;
    let max_min = count - vertices.iter().rev().take_while(|v| v.x == last_x).count();

    // Lower chain
    polygon.push(vertices[min_min]);
    for i in min_max + 1..=max_min {
        if is_left(&vertices[min_min], &vertices[max_min], &vertices[i]) >= 0.0 && i < max_min {
            continue;
        }
        while polygon.len() > 1 {
            let top = polygon.len() - 1;
            if is_left(&polygon[top - 1], &polygon[top], &vertices[i]) > 0.0 {
                break;
            }
            polygon.pop();
        }
        polygon.push(vertices[i]);
    }

    // Upper chain
    if max_max != max_min {
        polygon.push(vertices[max_max]);
    }
    let bottom = polygon.len() - 1;
    for i in (min_max..max_min).rev() {
        if is_left(&vertices[max_max], &vertices[min_max], &vertices[i]) >= 0.0 && i > min_max {
            continue;
        }
        while polygon.len() - 1 > bottom {
            let top = polygon.len() - 1;
            if is_left(&polygon[top - 1], &polygon[top], &vertices[i]) > 0.0 {
                break;
            }
            polygon.pop();
        }
        polygon.push(vertices[i]);
    }
    if min_max != min_min {
        polygon.push(vertices[min_min]);
    }
    polygon
}

/// > 0 if `p2` is left of the line through `p0` and `p1`, < 0 if right, 0 if on it
#[inline]
fn is_left(p0: &Point2<f64>, p1: &Point2<f64>, p2: &Point2<f64>) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn test_square_with_inner_point() {
        let hull = surrounding_polygon(&[p(0.0, 0.0), p(1.0, 0.0), p(0.5, 0.5), p(1.0, 1.0), p(0.0, 1.0)]);
        assert_eq!(hull, vec![p(1.0, 1.0), p(0.0, 1.0), p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
    }

    #[test]
    fn test_hull_contains_every_point() {
        let points: Vec<_> = (0..40)
            .map(|i| {
                let angle = i as f64 * 0.7;
                p(angle.cos() * (1.0 + (i % 3) as f64), angle.sin() * 2.0)
            })
            .collect();
        let hull = surrounding_polygon(&points);
        assert_eq!(hull.first(), hull.last());
        for window in hull.windows(2) {
            for point in &points {
                assert!(is_left(&window[0], &window[1], point) >= -1e-9);
            }
        }
    }

    #[test]
    fn test_collinear_points() {
        let hull = surrounding_polygon(&[p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0)]);
        assert_eq!(hull, vec![p(2.0, 2.0), p(0.0, 0.0), p(2.0, 2.0)]);
    }

    #[test]
    fn test_vertical_line_and_single_point() {
        assert_eq!(
            surrounding_polygon(&[p(1.0, 0.0), p(1.0, 3.0), p(1.0, 1.0)]),
            vec![p(1.0, 3.0), p(1.0, 0.0), p(1.0, 3.0)]
        );
        assert_eq!(surrounding_polygon(&[p(2.0, 2.0)]), vec![p(2.0, 2.0), p(2.0, 2.0)]);
        assert!(surrounding_polygon(&[]).is_empty());
    }
}
