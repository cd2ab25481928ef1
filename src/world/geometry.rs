//! Convex polygon vs AABB intersection (separating axis test)
//!
//! The one geometric primitive the whole collision path rests on. Pure,
//! allocation-free, deterministic; it runs once per polygon per collision
//! query, so it stays branch-light and works in f32 throughout.

use crate::math::{Vec2, Vec3};

/// Minimal translation vector for a convex polygon against an AABB.
///
/// `polygon` must be an ordered, planar, convex loop of at least 3
/// vertices; that is assumed, not verified. Returns `None` if a separating
/// axis exists, otherwise the smallest translation of the box that removes
/// the overlap.
///
/// Axis families are tested in a fixed order and the candidate with the
/// smallest absolute push wins, ties keeping the earliest:
/// 1. each polygon edge crossed against the world axes, evaluated as 2D
///    axes in the three coordinate-plane projections (degenerate axes
///    skipped),
/// 2. the box face normals (the world axes),
/// 3. the polygon face normal.
pub fn polygon_aabb_mtv(center: Vec3, extent: Vec3, polygon: &[Vec3]) -> Option<Vec3> {
    assert!(polygon.len() >= 3, "polygon must have at least 3 vertices");

    let mut best_distance = 1e10f32;
    let mut best_axis = Vec3::ZERO;

    // Edge cross products as separating axes. Crossing an edge with a
    // world axis zeroes one component, so each test collapses to 2D in
    // the plane spanned by the other two axes.
    let mut prev = polygon.len() - 1;
    for pi in 0..polygon.len() {
        let edge = polygon[pi] - polygon[prev];
        let mut ai_prev = 2;
        for ai in 0..3 {
            let x = Vec2::new(-edge.axis(ai_prev), edge.axis(ai));
            let xlsqr = x.dot(x);
            if xlsqr == 0.0 {
                // a skipped degenerate axis leaves ai_prev stale; the next
                // test pairs its axis with the last non-degenerate plane
                continue;
            }
            let x = x.scale(1.0 / xlsqr.sqrt());

            // project the polygon onto the axis; find the min/max interval
            let mut min = 0.0f32;
            let mut max = 0.0f32;
            for (i, p) in polygon.iter().enumerate() {
                let v = Vec2::new(
                    p.axis(ai) - center.axis(ai),
                    p.axis(ai_prev) - center.axis(ai_prev),
                );
                let d = x.dot(v);
                if i == 0 {
                    min = d;
                    max = d;
                } else if d < min {
                    min = d;
                } else if d > max {
                    max = d;
                }
            }

            // project the box onto the axis
            let e = extent.axis(ai) * x.x.abs() + extent.axis(ai_prev) * x.y.abs();

            let ld = if min > e || max < -e {
                return None;
            } else if min < -e {
                -max - e
            } else {
                e - min
            };

            if ld.abs() < best_distance.abs() {
                best_distance = ld;
                let mut axis = Vec3::ZERO;
                axis.set_axis(ai, x.x);
                axis.set_axis(ai_prev, x.y);
                best_axis = axis;
            }

            ai_prev = ai;
        }
        prev = pi;
    }

    // Box face normals as separating axes.
    for ai in 0..3 {
        let mut min = 0.0f32;
        let mut max = 0.0f32;
        for (i, p) in polygon.iter().enumerate() {
            let v = p.axis(ai) - center.axis(ai);
            if i == 0 {
                min = v;
                max = v;
            } else if v < min {
                min = v;
            } else if v > max {
                max = v;
            }
        }
        let e = extent.axis(ai);

        let ld = if min > e || max < -e {
            return None;
        } else if min < -e {
            -max - e
        } else {
            e - min
        };

        if ld.abs() < best_distance.abs() {
            best_distance = ld;
            let mut axis = Vec3::ZERO;
            axis.set_axis(ai, 1.0);
            best_axis = axis;
        }
    }

    // Polygon face normal as separating axis.
    {
        let e0 = polygon[0] - polygon[1];
        let e1 = polygon[2] - polygon[1];
        let x = e0.cross(e1).normalize();
        let d = x.dot(polygon[0] - center);
        let e = extent.x * x.x.abs() + extent.y * x.y.abs() + extent.z * x.z.abs();
        if d.abs() > e {
            return None;
        }
        let ld = (if d > 0.0 { e } else { -e }) - d;
        if ld.abs() < best_distance.abs() {
            best_distance = ld;
            best_axis = x;
        }
    }

    Some(best_axis * -best_distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_quad(y: f32, half: f32) -> [Vec3; 4] {
        [
            Vec3::new(-half, y, -half),
            Vec3::new(half, y, -half),
            Vec3::new(half, y, half),
            Vec3::new(-half, y, half),
        ]
    }

    #[test]
    fn test_disjoint_returns_none() {
        let poly = floor_quad(0.0, 2.0);
        let mtv = polygon_aabb_mtv(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.5, 0.5, 0.5), &poly);
        assert!(mtv.is_none());
    }

    #[test]
    fn test_disjoint_laterally_returns_none() {
        let poly = floor_quad(0.0, 1.0);
        let mtv = polygon_aabb_mtv(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.5, 0.5, 0.5), &poly);
        assert!(mtv.is_none());
    }

    #[test]
    fn test_shallow_floor_overlap_pushes_up() {
        // box center slightly less than a half-extent above the plane
        let poly = floor_quad(0.0, 4.0);
        let center = Vec3::new(0.0, 0.4, 0.0);
        let extent = Vec3::new(0.5, 0.5, 0.5);
        let mtv = polygon_aabb_mtv(center, extent, &poly).expect("should intersect");
        assert!(mtv.x.abs() < 1e-4 && mtv.z.abs() < 1e-4);
        assert!((mtv.y - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_mtv_separates_box() {
        let poly = floor_quad(0.0, 4.0);
        let center = Vec3::new(0.3, 0.35, -0.2);
        let extent = Vec3::new(0.5, 0.5, 0.5);
        let mtv = polygon_aabb_mtv(center, extent, &poly).expect("should intersect");
        // applying the MTV must remove (or reduce to touching) the overlap
        let moved = center + mtv;
        let after = polygon_aabb_mtv(moved, extent, &poly);
        if let Some(residual) = after {
            assert!(residual.len() < 1e-4, "residual overlap {:?}", residual);
        }
    }

    #[test]
    fn test_vertical_wall_pushes_back() {
        let wall = [
            Vec3::new(2.0, -2.0, -2.0),
            Vec3::new(2.0, 2.0, -2.0),
            Vec3::new(2.0, 2.0, 2.0),
            Vec3::new(2.0, -2.0, 2.0),
        ];
        let center = Vec3::new(1.6, 0.0, 0.0);
        let extent = Vec3::new(0.5, 1.0, 0.5);
        let mtv = polygon_aabb_mtv(center, extent, &wall).expect("should intersect");
        assert!((mtv.x + 0.1).abs() < 1e-4, "mtv {:?}", mtv);
        assert!(mtv.y.abs() < 1e-4 && mtv.z.abs() < 1e-4);
    }

    #[test]
    fn test_touching_counts_as_intersecting_with_zero_mtv() {
        let poly = floor_quad(0.0, 4.0);
        let center = Vec3::new(0.0, 0.5, 0.0);
        let extent = Vec3::new(0.5, 0.5, 0.5);
        let mtv = polygon_aabb_mtv(center, extent, &poly).expect("touching intersects");
        assert!(mtv.len() < 1e-6);
    }

    #[test]
    fn test_triangle_overlap() {
        let tri = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let mtv = polygon_aabb_mtv(Vec3::new(0.0, 0.05, 0.0), Vec3::new(0.25, 0.25, 0.25), &tri);
        assert!(mtv.is_some());
    }

    #[test]
    fn test_axis_parallel_edges_push_along_face_normal() {
        // every edge is parallel to a world axis, so each edge's cross
        // tests include a degenerate axis that must be skipped without
        // disturbing the remaining candidates
        let quad = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let center = Vec3::new(0.0, 0.0, 0.4);
        let extent = Vec3::new(0.5, 0.5, 0.5);
        let mtv = polygon_aabb_mtv(center, extent, &quad).expect("should intersect");
        assert!(mtv.x.abs() < 1e-4 && mtv.y.abs() < 1e-4);
        assert!((mtv.z - 0.1).abs() < 1e-4, "mtv {:?}", mtv);
    }

    #[test]
    fn test_deterministic() {
        let poly = floor_quad(0.0, 4.0);
        let center = Vec3::new(0.17, 0.31, -0.23);
        let extent = Vec3::new(0.5, 1.0, 0.5);
        let a = polygon_aabb_mtv(center, extent, &poly).unwrap();
        let b = polygon_aabb_mtv(center, extent, &poly).unwrap();
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
        assert_eq!(a.z.to_bits(), b.z.to_bits());
    }

    #[test]
    #[should_panic(expected = "at least 3")]
    fn test_degenerate_polygon_panics() {
        let _ = polygon_aabb_mtv(
            Vec3::ZERO,
            Vec3::new(1.0, 1.0, 1.0),
            &[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
        );
    }
}
