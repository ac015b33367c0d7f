//! Quadratic equation solver used by the swept-sphere tests

/// Solve `a·t² + b·t + c = 0`
///
/// Returns both real roots in ascending order, or `None` when the
/// discriminant is negative or `a` is zero. Uses the cancellation-free form
/// of the quadratic formula.
pub fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a == 0.0 {
        return None;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let q = if b < 0.0 { -0.5 * (b - root) } else { -0.5 * (b + root) };

    let (t1, t2) = if q == 0.0 {
        // b == 0 and c == 0: double root at zero
        (0.0, 0.0)
    } else {
        (q / a, c / q)
    };

    if t1 <= t2 {
        Some((t1, t2))
    } else {
        Some((t2, t1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_roots() {
        // (t - 1)(t - 3) = t² - 4t + 3
        let (t1, t2) = solve_quadratic(1.0, -4.0, 3.0).unwrap();
        assert!((t1 - 1.0).abs() < 1e-6);
        assert!((t2 - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_real_roots() {
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn test_degenerate_linear() {
        assert!(solve_quadratic(0.0, 2.0, 1.0).is_none());
    }

    #[test]
    fn test_double_root_at_zero() {
        assert_eq!(solve_quadratic(2.0, 0.0, 0.0), Some((0.0, 0.0)));
    }

    #[test]
    fn test_straddling_roots() {
        // Inside the sphere: one negative and one positive root
        let (t1, t2) = solve_quadratic(1.0, 0.0, -4.0).unwrap();
        assert!((t1 + 2.0).abs() < 1e-6);
        assert!((t2 - 2.0).abs() < 1e-6);
    }
}
