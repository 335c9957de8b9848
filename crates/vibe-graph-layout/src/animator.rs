//! Frame-driven animator: eased interpolation between two position maps
//! over a fixed wall-clock duration.
//!
//! Parameterised over "now" rather than reading a clock itself —
//! [`Animator::tick`] takes an explicit [`Instant`]; [`Animator::tick_now`]
//! is the convenience wrapper for non-test callers. This keeps the
//! animator's timing properties exercisable without sleeping in tests.

use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default animation duration, per [`crate::engine::EngineConfig`].
pub const DEFAULT_DURATION_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOutCubic,
}

impl Default for Easing {
    fn default() -> Self {
        Easing::EaseInOutCubic
    }
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// One frame's worth of output from [`Animator::tick`].
#[derive(Debug, Clone)]
pub struct Frame<Id> {
    pub positions: HashMap<Id, Vec2>,
    /// `true` on the final frame only; the animator has stopped running.
    pub done: bool,
}

struct Run<Id> {
    from: HashMap<Id, Vec2>,
    to: HashMap<Id, Vec2>,
    start: Instant,
    duration: Duration,
    easing: Easing,
    progress: f64,
}

/// Drives one interpolation between a `from` and `to` position map at a
/// time. Starting a new run cancels whatever was in flight.
pub struct Animator<Id> {
    run: Option<Run<Id>>,
}

impl<Id: Copy + Eq + Hash> Default for Animator<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq + Hash> Animator<Id> {
    pub fn new() -> Self {
        Self { run: None }
    }

    /// Start a new interpolation from `from` to `to`. Any in-flight
    /// animation is cancelled without its completion being signalled.
    pub fn animate(
        &mut self,
        from: HashMap<Id, Vec2>,
        to: HashMap<Id, Vec2>,
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) {
        self.run = Some(Run {
            from,
            to,
            start: now,
            duration,
            easing,
            progress: 0.0,
        });
    }

    /// Cancel the running animation, if any. No further frame is emitted
    /// for it.
    pub fn stop(&mut self) {
        self.run = None;
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Raw, un-eased progress of the current run in `[0, 1]`, or `0` if
    /// nothing is running.
    pub fn progress(&self) -> f64 {
        self.run.as_ref().map(|r| r.progress).unwrap_or(0.0)
    }

    /// Advance to wall-clock time `now`, producing interpolated positions.
    /// Returns `None` if nothing is running.
    pub fn tick(&mut self, now: Instant) -> Option<Frame<Id>> {
        let run = self.run.as_mut()?;

        let elapsed = now.saturating_duration_since(run.start);
        let raw = if run.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / run.duration.as_secs_f64()).min(1.0)
        };
        run.progress = raw;
        let done = raw >= 1.0;

        let positions = if done {
            run.to.clone()
        } else {
            let t = run.easing.apply(raw);
            run.from
                .iter()
                .map(|(id, from_pos)| {
                    let pos = match run.to.get(id) {
                        Some(to_pos) => *from_pos + (*to_pos - *from_pos) * t,
                        None => *from_pos,
                    };
                    (*id, pos)
                })
                .collect()
        };

        if done {
            self.run = None;
        }

        Some(Frame { positions, done })
    }

    /// [`Animator::tick`] against the system clock.
    pub fn tick_now(&mut self) -> Option<Frame<Id>> {
        self.tick(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOutCubic,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9);
        }
        assert!((Easing::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn s6_animator_scenario() {
        let mut from = HashMap::new();
        from.insert("A", Vec2::new(0.0, 0.0));
        let mut to = HashMap::new();
        to.insert("A", Vec2::new(100.0, 100.0));

        let mut animator = Animator::new();
        let start = Instant::now();
        animator.animate(from, to.clone(), Duration::from_millis(500), Easing::Linear, start);

        let mid = animator.tick(start + Duration::from_millis(250)).unwrap();
        assert!(mid.positions[&"A"].x > 0.0 && mid.positions[&"A"].x < 100.0);
        assert!(!mid.done);

        let end = animator.tick(start + Duration::from_millis(600)).unwrap();
        assert!(end.done);
        assert_eq!(end.positions[&"A"], to[&"A"]);
        assert!(!animator.is_running());
    }

    #[test]
    fn progress_is_monotone_and_bounded() {
        let mut from = HashMap::new();
        from.insert("A", Vec2::ZERO);
        let mut to = HashMap::new();
        to.insert("A", Vec2::new(10.0, 0.0));

        let mut animator = Animator::new();
        let start = Instant::now();
        animator.animate(from, to, Duration::from_millis(100), Easing::Linear, start);
        assert_eq!(animator.progress(), 0.0);

        let mut last = 0.0;
        for ms in [10, 40, 80, 120] {
            animator.tick(start + Duration::from_millis(ms));
            let p = animator.progress();
            assert!(p >= last);
            last = p;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn stop_cancels_without_completion() {
        let mut from = HashMap::new();
        from.insert("A", Vec2::ZERO);
        let mut to = HashMap::new();
        to.insert("A", Vec2::new(1.0, 0.0));

        let mut animator = Animator::new();
        animator.animate(from, to, Duration::from_millis(500), Easing::Linear, Instant::now());
        animator.stop();
        assert!(!animator.is_running());
        assert!(animator.tick(Instant::now()).is_none());
    }

    #[test]
    fn ids_only_in_from_stay_put() {
        let mut from = HashMap::new();
        from.insert("A", Vec2::new(5.0, 5.0));
        from.insert("orphan", Vec2::new(9.0, 9.0));
        let mut to = HashMap::new();
        to.insert("A", Vec2::new(50.0, 50.0));

        let mut animator = Animator::new();
        let start = Instant::now();
        animator.animate(from, to, Duration::from_millis(100), Easing::Linear, start);
        let frame = animator.tick(start + Duration::from_millis(50)).unwrap();
        assert_eq!(frame.positions[&"orphan"], Vec2::new(9.0, 9.0));
    }
}
