//! Planar geometry helpers shared by localization, segmentation and matching

/// Polar angle in degrees of (x2, y2) as seen from (x1, y1)
///
/// Image rows grow downward, so the y difference is negated: 0° points
/// right, 90° points up, ±180° points left and -90° points down.
pub fn angle_v(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (-(y2 - y1)).atan2(x2 - x1).to_degrees()
}

/// Euclidean distance between two points
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}

/// Whether (px, py) lies inside or on the circle at (cx, cy)
pub fn point_in_circle(cx: f64, cy: f64, radius: f64, px: f64, py: f64) -> bool {
    distance(cx, cy, px, py) <= radius
}

/// Solve the NxN system `a * x = b` by Gaussian elimination with partial pivoting
///
/// Returns `None` when the matrix is (numerically) singular.
#[allow(clippy::needless_range_loop)]
pub fn solve_linear_system<const N: usize>(a: &[[f32; N]; N], b: &[f32; N]) -> Option<[f32; N]> {
    let mut a = *a;
    let mut b = *b;

    // Forward elimination
    for i in 0..N {
        let mut max_val = a[i][i].abs();
        let mut max_row = i;
        for k in (i + 1)..N {
            if a[k][i].abs() > max_val {
                max_val = a[k][i].abs();
                max_row = k;
            }
        }

        if max_val < 1e-10 {
            return None;
        }

        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        for k in (i + 1)..N {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];
            for j in i..N {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    // Back substitution
    let mut x = [0.0f32; N];
    for i in (0..N).rev() {
        let mut sum = b[i];
        for j in (i + 1)..N {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_v_quadrants() {
        assert!((angle_v(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((angle_v(0.0, 0.0, 0.0, -1.0) - 90.0).abs() < 1e-9);
        assert!((angle_v(0.0, 0.0, 0.0, 1.0) + 90.0).abs() < 1e-9);
        assert!((angle_v(0.0, 0.0, -1.0, 0.0).abs() - 180.0).abs() < 1e-9);
        assert!((angle_v(10.0, 10.0, 11.0, 9.0) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance() {
        assert!((distance(0.0, 0.0, 3.0, 4.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_in_circle_inclusive() {
        assert!(point_in_circle(0.0, 0.0, 5.0, 3.0, 4.0));
        assert!(!point_in_circle(0.0, 0.0, 5.0, 3.0, 4.01));
    }

    #[test]
    fn test_solve_3x3() {
        let a = [[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]];
        let b = [8.0, -11.0, -3.0];
        let x = solve_linear_system(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-4);
        assert!((x[1] - 3.0).abs() < 1e-4);
        assert!((x[2] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_solve_singular() {
        let a = [[1.0, 2.0], [2.0, 4.0]];
        assert!(solve_linear_system(&a, &[1.0, 2.0]).is_none());
    }
}
