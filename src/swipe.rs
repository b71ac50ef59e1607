//! Human-like gesture synthesis
//!
//! Swipes are sampled every 2 ms along a smooth-in/smooth-out cubic so the
//! replayed trajectory accelerates and decelerates like a finger would.
//! Rectangle targets are collapsed to Poisson-distributed points biased
//! toward the rect centre rather than the exact midpoint.

use crate::types::{Point, Rect, SwipeStep};
use rand::thread_rng;
use rand_distr::{Distribution, Poisson};

/// Waypoint sampling interval.
const SAMPLE_DELAY_MS: u32 = 2;

/// Smooth-in/smooth-out cubic: s(0) = 0, s(1) = 1, s'(0) = s'(1) = 0.
fn smooth(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Sample a swipe from `from` to `to` over `duration_ms`, one waypoint
/// every 2 ms. Each waypoint carries the fixed sample delay.
pub fn smooth_steps(from: Point, to: Point, duration_ms: u32) -> Vec<SwipeStep> {
    let mut steps = Vec::with_capacity((duration_ms / SAMPLE_DELAY_MS) as usize);

    let mut elapsed = 0;
    while elapsed < duration_ms {
        let progress = smooth(f64::from(elapsed) / f64::from(duration_ms));
        steps.push(SwipeStep {
            x: lerp(f64::from(from.x), f64::from(to.x), progress).round() as i32,
            y: lerp(f64::from(from.y), f64::from(to.y), progress).round() as i32,
            delay_ms: SAMPLE_DELAY_MS,
        });
        elapsed += SAMPLE_DELAY_MS;
    }
    steps
}

/// Pick a touch point inside (or near) `rect`, Poisson-distributed around
/// half the side length on each axis. Draws are not clamped to the rect.
pub fn rand_point(rect: Rect) -> Point {
    Point {
        x: poisson_offset(rect.x, rect.width),
        y: poisson_offset(rect.y, rect.height),
    }
}

fn poisson_offset(origin: i32, side: i32) -> i32 {
    if side <= 0 {
        return origin;
    }
    match Poisson::new(f64::from(side) / 2.0) {
        Ok(dist) => origin + dist.sample(&mut thread_rng()) as i32,
        Err(_) => origin + side / 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count_and_delays() {
        let steps = smooth_steps(Point::new(0, 0), Point::new(100, 0), 100);
        assert_eq!(steps.len(), 50);
        assert!(steps.iter().all(|s| s.delay_ms == 2));
    }

    #[test]
    fn test_monotone_progress_and_endpoints() {
        let steps = smooth_steps(Point::new(0, 0), Point::new(100, 0), 100);
        for pair in steps.windows(2) {
            assert!(pair[1].x >= pair[0].x);
        }
        assert_eq!(steps.first().unwrap().x, 0);
        assert!((steps.last().unwrap().x - 100).abs() <= 1);
        assert!(steps.iter().all(|s| s.y == 0));
    }

    #[test]
    fn test_smooth_in_and_out_shape() {
        let steps = smooth_steps(Point::new(0, 0), Point::new(100, 0), 200);
        assert_eq!(steps.len(), 100);

        let deltas: Vec<i32> = steps.windows(2).map(|p| p[1].x - p[0].x).collect();
        let edge_max = deltas[..10]
            .iter()
            .chain(&deltas[deltas.len() - 10..])
            .copied()
            .max()
            .unwrap();
        let mid_max = deltas[40..60].iter().copied().max().unwrap();
        assert!(mid_max >= edge_max);
        assert!(mid_max >= 1);
    }

    #[test]
    fn test_zero_duration_yields_no_steps() {
        assert!(smooth_steps(Point::new(0, 0), Point::new(10, 10), 0).is_empty());
    }

    #[test]
    fn test_rand_point_degenerate_rect_is_origin() {
        let point = rand_point(Rect::new(42, 7, 0, 0));
        assert_eq!(point, Point::new(42, 7));
    }

    #[test]
    fn test_rand_point_offsets_are_non_negative() {
        for _ in 0..100 {
            let point = rand_point(Rect::new(10, 20, 30, 40));
            assert!(point.x >= 10);
            assert!(point.y >= 20);
        }
    }
}
