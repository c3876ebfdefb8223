//! Smooth-scroll physics.
//!
//! Turns discrete wheel ticks into a stream of pixel frames. Each tick adds
//! a step to the outstanding distance, which is then travelled at constant
//! speed so that it completes `ms_per_tick` after the latest tick. Once the
//! distance is covered the motion continues as momentum, decelerated by
//! friction, until it falls below the stop speed.
//!
//! # Tick grouping
//!
//! Ticks closer than `consecutive_tick_max_interval_ms` form a *burst*; a
//! burst of `swipe_threshold_ticks` is a *swipe*. Swipes that follow each
//! other within `consecutive_swipe_max_interval_ms` accumulate, and past
//! `fast_scroll_threshold_swipes` every step is multiplied by an
//! exponentially growing factor.
//!
//! This module is pure computation: time is passed in by the caller as
//! monotonic nanoseconds, and frames are returned rather than posted.

use glide_platform_core::event::{ScrollAxis, ScrollOutput, ScrollPhase};

use crate::params::ScrollParameters;

/// Longest frame interval considered, so a stalled driver does not jump.
const MAX_FRAME_MS: f64 = 100.0;

const NS_PER_MS: f64 = 1_000_000.0;

/// Remaining distances below this are treated as covered.
const DISTANCE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Idle,
    Linear,
    Momentum,
}

/// Smooth-scroll animation state for one gesture at a time.
#[derive(Debug, Clone)]
pub struct Animator {
    params: ScrollParameters,

    motion: Motion,
    axis: ScrollAxis,
    /// +1 or -1 for the current gesture.
    direction: i32,
    /// Linear distance still to travel (pixels, unsigned).
    remaining_px: f64,
    /// Linear speed (px/ms).
    linear_speed: f64,
    /// Momentum speed (px/ms).
    velocity: f64,
    /// Fractional pixels travelled but not yet emitted.
    carry: f64,
    last_frame_ns: Option<u64>,
    /// An `End` frame is owed to the consumer.
    pending_end: bool,

    burst_ticks: u32,
    last_tick_ns: Option<u64>,
    swipes: u32,
    last_swipe_ns: Option<u64>,
}

impl Animator {
    /// Create an idle animator.
    pub fn new(params: ScrollParameters) -> Self {
        Self {
            params,
            motion: Motion::Idle,
            axis: ScrollAxis::Vertical,
            direction: 0,
            remaining_px: 0.0,
            linear_speed: 0.0,
            velocity: 0.0,
            carry: 0.0,
            last_frame_ns: None,
            pending_end: false,
            burst_ticks: 0,
            last_tick_ns: None,
            swipes: 0,
            last_swipe_ns: None,
        }
    }

    /// Replace the parameters. A gesture in flight keeps its remaining
    /// distance and continues under the new values.
    pub fn set_params(&mut self, params: ScrollParameters) {
        self.params = params;
    }

    /// Whether the animator will produce more frames.
    pub fn is_busy(&self) -> bool {
        self.motion != Motion::Idle || self.pending_end
    }

    /// Phase of the gesture in flight, if any.
    pub fn phase(&self) -> Option<ScrollPhase> {
        match self.motion {
            Motion::Idle => None,
            Motion::Linear => Some(ScrollPhase::Linear),
            Motion::Momentum => Some(ScrollPhase::Momentum),
        }
    }

    /// Linear distance left to travel, in pixels.
    pub fn remaining_px(&self) -> f64 {
        self.remaining_px
    }

    /// Consecutive swipe count.
    pub fn swipes(&self) -> u32 {
        self.swipes
    }

    /// Current fast-scroll multiplier.
    pub fn fast_scroll_factor(&self) -> f64 {
        let threshold = self.params.fast_scroll_threshold_swipes;
        if self.swipes <= threshold {
            return 1.0;
        }
        let exponent = (self.swipes - threshold).min(i32::MAX as u32) as i32;
        self.params
            .fast_scroll_base
            .powi(exponent)
            .min(self.params.fast_scroll_max_factor)
    }

    /// Register `ticks` wheel detents on `axis` at `now_ns`.
    ///
    /// Returns the signed distance (pixels) added to the gesture.
    pub fn tick(&mut self, now_ns: u64, axis: ScrollAxis, ticks: i32) -> f64 {
        if ticks == 0 {
            return 0.0;
        }

        let ticks = if self.params.invert {
            ticks.saturating_neg()
        } else {
            ticks
        };
        let direction = ticks.signum();

        // A reversal or axis switch ends the gesture in flight; its `End`
        // is delivered before the first frame of the new one.
        let mut owed_end = false;
        if axis != self.axis || direction != self.direction {
            owed_end = self.is_busy();
            self.reset_gesture();
            self.reset_counters();
            self.axis = axis;
            self.direction = direction;
        }

        self.count_tick(now_ns);

        let step = if self.motion == Motion::Idle && self.burst_ticks <= self.params.one_pixel_ticks
        {
            1.0
        } else {
            self.params.px_per_tick * f64::from(ticks.unsigned_abs()) * self.fast_scroll_factor()
        };

        if self.motion == Motion::Momentum {
            self.velocity = 0.0;
            self.carry = 0.0;
        }
        if self.motion == Motion::Idle {
            self.last_frame_ns = Some(now_ns);
        }

        self.remaining_px += step;
        self.linear_speed = self.remaining_px / self.params.ms_per_tick;
        self.motion = Motion::Linear;
        self.pending_end = owed_end;

        tracing::trace!(
            step,
            remaining = self.remaining_px,
            burst = self.burst_ticks,
            swipes = self.swipes,
            "Scroll tick"
        );

        step * f64::from(direction)
    }

    /// Advance the animation to `now_ns` and return the frame to post, if
    /// any whole pixels (or the end of the gesture) are due.
    pub fn frame(&mut self, now_ns: u64) -> Option<ScrollOutput> {
        if self.motion == Motion::Idle || self.pending_end {
            return self.take_pending_end();
        }

        let last = self.last_frame_ns.unwrap_or(now_ns);
        let dt_ms = (now_ns.saturating_sub(last) as f64 / NS_PER_MS).min(MAX_FRAME_MS);
        self.last_frame_ns = Some(now_ns);

        match self.motion {
            Motion::Linear => self.linear_frame(dt_ms),
            Motion::Momentum => self.momentum_frame(dt_ms),
            Motion::Idle => None,
        }
    }

    /// Abort the gesture in flight. Returns the `End` frame owed to the
    /// consumer, if a gesture was interrupted.
    pub fn finish(&mut self) -> Option<ScrollOutput> {
        let was_busy = self.is_busy();
        self.reset_gesture();
        self.reset_counters();
        was_busy.then(ScrollOutput::end)
    }

    fn linear_frame(&mut self, dt_ms: f64) -> Option<ScrollOutput> {
        let travel = (self.linear_speed * dt_ms).min(self.remaining_px);
        self.remaining_px -= travel;
        let mut pixels = self.take_whole_pixels(travel);

        if self.remaining_px > DISTANCE_EPSILON {
            return self.emit(pixels, ScrollPhase::Linear);
        }

        // Distance covered: flush rounding so the linear phase is exact.
        let flush = self.carry.round();
        self.carry = 0.0;
        self.remaining_px = 0.0;
        pixels = pixels.saturating_add(flush as i32 * self.direction);

        let speed = self.linear_speed;
        if self.params.friction > 0.0 && speed >= self.params.momentum_stop_speed {
            self.motion = Motion::Momentum;
            self.velocity = speed;
            self.emit(pixels, ScrollPhase::Linear)
        } else {
            self.end_motion(pixels, ScrollPhase::Linear)
        }
    }

    fn momentum_frame(&mut self, dt_ms: f64) -> Option<ScrollOutput> {
        let v = self.velocity;
        let deceleration =
            self.params.friction * v.powf(self.params.friction_depth) * dt_ms / 100.0;
        self.velocity = (v - deceleration).max(0.0);

        let pixels = self.take_whole_pixels(self.velocity * dt_ms);

        if self.velocity < self.params.momentum_stop_speed {
            self.carry = 0.0;
            return self.end_motion(pixels, ScrollPhase::Momentum);
        }
        self.emit(pixels, ScrollPhase::Momentum)
    }

    /// Stop moving. The last moving frame (if any) is returned now and the
    /// `End` frame on the next call; otherwise `End` is returned directly.
    fn end_motion(&mut self, pixels: i32, phase: ScrollPhase) -> Option<ScrollOutput> {
        self.motion = Motion::Idle;
        self.velocity = 0.0;
        self.linear_speed = 0.0;
        self.last_frame_ns = None;
        if pixels != 0 {
            self.pending_end = true;
            Some(ScrollOutput::along(self.axis, pixels, phase))
        } else {
            self.pending_end = false;
            Some(ScrollOutput::end())
        }
    }

    fn emit(&self, pixels: i32, phase: ScrollPhase) -> Option<ScrollOutput> {
        (pixels != 0).then(|| ScrollOutput::along(self.axis, pixels, phase))
    }

    fn take_pending_end(&mut self) -> Option<ScrollOutput> {
        if self.pending_end {
            self.pending_end = false;
            Some(ScrollOutput::end())
        } else {
            None
        }
    }

    fn take_whole_pixels(&mut self, travel: f64) -> i32 {
        self.carry += travel;
        let whole = self.carry.trunc();
        self.carry -= whole;
        whole as i32 * self.direction
    }

    fn count_tick(&mut self, now_ns: u64) {
        let tick_window = ms_to_ns(self.params.consecutive_tick_max_interval_ms);
        let swipe_window = ms_to_ns(self.params.consecutive_swipe_max_interval_ms);

        let within_burst = self
            .last_tick_ns
            .is_some_and(|t| now_ns.saturating_sub(t) <= tick_window);

        if within_burst {
            self.burst_ticks = self.burst_ticks.saturating_add(1);
        } else {
            self.burst_ticks = 1;
            let continues_swipes = self
                .last_swipe_ns
                .is_some_and(|t| now_ns.saturating_sub(t) <= swipe_window);
            if !continues_swipes {
                self.swipes = 0;
            }
        }

        if self.burst_ticks == self.params.swipe_threshold_ticks {
            self.swipes = self.swipes.saturating_add(1);
        }
        if self.burst_ticks >= self.params.swipe_threshold_ticks {
            self.last_swipe_ns = Some(now_ns);
        }
        self.last_tick_ns = Some(now_ns);
    }

    fn reset_gesture(&mut self) {
        self.motion = Motion::Idle;
        self.remaining_px = 0.0;
        self.linear_speed = 0.0;
        self.velocity = 0.0;
        self.carry = 0.0;
        self.last_frame_ns = None;
        self.pending_end = false;
    }

    fn reset_counters(&mut self) {
        self.burst_ticks = 0;
        self.last_tick_ns = None;
        self.swipes = 0;
        self.last_swipe_ns = None;
    }
}

fn ms_to_ns(ms: f64) -> u64 {
    (ms.max(0.0) * NS_PER_MS) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_NS: u64 = 8_333_333; // 120 Hz

    fn no_momentum() -> ScrollParameters {
        ScrollParameters {
            friction: 0.0,
            ..ScrollParameters::default()
        }
    }

    /// Run frames from `start_ns` until the animator goes idle.
    fn drain(animator: &mut Animator, start_ns: u64) -> Vec<ScrollOutput> {
        let mut frames = Vec::new();
        let mut now = start_ns;
        for _ in 0..10_000 {
            now += FRAME_NS;
            if let Some(frame) = animator.frame(now) {
                frames.push(frame);
            }
            if !animator.is_busy() {
                break;
            }
        }
        frames
    }

    fn sum_dy(frames: &[ScrollOutput], phase: ScrollPhase) -> i32 {
        frames.iter().filter(|f| f.phase == phase).map(|f| f.dy).sum()
    }

    #[test]
    fn idle_animator_emits_nothing() {
        let mut animator = Animator::new(ScrollParameters::default());
        assert!(!animator.is_busy());
        assert_eq!(animator.frame(1_000_000), None);
        assert_eq!(animator.finish(), None);
    }

    #[test]
    fn single_tick_linear_distance_is_exact() {
        let mut animator = Animator::new(no_momentum());
        let step = animator.tick(0, ScrollAxis::Vertical, 1);
        assert!((step - 76.0).abs() < 1e-9);

        let frames = drain(&mut animator, 0);
        assert_eq!(sum_dy(&frames, ScrollPhase::Linear), 76);
        assert_eq!(frames.last().unwrap().phase, ScrollPhase::End);
        assert!(frames.iter().all(|f| f.dx == 0 && f.dy >= 0));
    }

    #[test]
    fn linear_phase_completes_within_ms_per_tick() {
        let mut animator = Animator::new(no_momentum());
        animator.tick(0, ScrollAxis::Vertical, 1);

        let mut now = 0;
        while animator.phase() == Some(ScrollPhase::Linear) {
            now += FRAME_NS;
            animator.frame(now);
        }
        // 90 ms at 120 Hz is 10.8 frames.
        assert!(now <= 11 * FRAME_NS);
        assert!(now >= 10 * FRAME_NS);
    }

    #[test]
    fn negative_ticks_scroll_down() {
        let mut animator = Animator::new(no_momentum());
        let step = animator.tick(0, ScrollAxis::Vertical, -2);
        assert!((step + 152.0).abs() < 1e-9);

        let frames = drain(&mut animator, 0);
        assert_eq!(sum_dy(&frames, ScrollPhase::Linear), -152);
        assert!(frames.iter().all(|f| f.dy <= 0));
    }

    #[test]
    fn momentum_follows_linear_and_ends() {
        let mut animator = Animator::new(ScrollParameters::default());
        animator.tick(0, ScrollAxis::Vertical, 1);

        let frames = drain(&mut animator, 0);
        assert_eq!(sum_dy(&frames, ScrollPhase::Linear), 76);
        assert!(sum_dy(&frames, ScrollPhase::Momentum) > 0);
        assert_eq!(frames.last().unwrap().phase, ScrollPhase::End);
        assert!(!animator.is_busy());

        let momentum_start = frames
            .iter()
            .position(|f| f.phase == ScrollPhase::Momentum)
            .unwrap();
        assert!(frames[..momentum_start]
            .iter()
            .all(|f| f.phase == ScrollPhase::Linear));
    }

    #[test]
    fn momentum_with_tiny_stop_speed_still_ends() {
        let mut animator = Animator::new(ScrollParameters {
            momentum_stop_speed: 1e-9,
            ..ScrollParameters::default()
        });
        animator.tick(0, ScrollAxis::Vertical, 1);

        let frames = drain(&mut animator, 0);
        assert!(!animator.is_busy());
        assert_eq!(frames.last().map(|f| f.phase), Some(ScrollPhase::End));
    }

    #[test]
    fn invert_flips_direction() {
        let mut animator = Animator::new(ScrollParameters {
            invert: true,
            ..no_momentum()
        });
        animator.tick(0, ScrollAxis::Vertical, 1);
        let frames = drain(&mut animator, 0);
        assert_eq!(sum_dy(&frames, ScrollPhase::Linear), -76);
    }

    #[test]
    fn direction_change_drops_outstanding_distance() {
        let mut animator = Animator::new(no_momentum());
        animator.tick(0, ScrollAxis::Vertical, 3);
        animator.frame(FRAME_NS);
        animator.tick(FRAME_NS * 2, ScrollAxis::Vertical, -1);

        assert!((animator.remaining_px() - 76.0).abs() < 1e-9);
        let frames = drain(&mut animator, FRAME_NS * 2);
        assert!(frames.iter().all(|f| f.dy <= 0));
        assert_eq!(sum_dy(&frames, ScrollPhase::Linear), -76);
    }

    #[test]
    fn reversal_ends_the_interrupted_gesture_first() {
        let mut animator = Animator::new(ScrollParameters::default());
        animator.tick(0, ScrollAxis::Vertical, 3);
        let mut frames = Vec::new();
        for i in 1..=3 {
            frames.extend(animator.frame(FRAME_NS * i));
        }
        assert!(frames.iter().all(|f| f.dy > 0));

        animator.tick(FRAME_NS * 3, ScrollAxis::Vertical, -1);
        let after = drain(&mut animator, FRAME_NS * 3);
        assert_eq!(after[0], ScrollOutput::end());
        assert!(after[1..].iter().all(|f| f.dy <= 0));
        assert_eq!(sum_dy(&after, ScrollPhase::Linear), -76);

        frames.extend(after);
        let ends = frames.iter().filter(|f| f.phase == ScrollPhase::End).count();
        assert_eq!(ends, 2);
    }

    #[test]
    fn axis_switch_of_a_settled_gesture_still_owes_its_end() {
        let mut animator = Animator::new(no_momentum());
        animator.tick(0, ScrollAxis::Vertical, 1);
        let mut now = 0;
        while animator.phase().is_some() {
            now += FRAME_NS;
            animator.frame(now);
        }
        // Motion finished, End not yet taken.
        assert!(animator.is_busy());

        animator.tick(now, ScrollAxis::Horizontal, 1);
        assert_eq!(animator.frame(now + FRAME_NS), Some(ScrollOutput::end()));
        let rest = drain(&mut animator, now + FRAME_NS);
        assert_eq!(rest.iter().map(|f| f.dx).sum::<i32>(), 76);
        assert_eq!(rest.last().map(|f| f.phase), Some(ScrollPhase::End));
    }

    #[test]
    fn extreme_tick_counts_do_not_overflow() {
        let mut animator = Animator::new(ScrollParameters {
            invert: true,
            ..no_momentum()
        });
        let step = animator.tick(0, ScrollAxis::Vertical, i32::MIN);
        assert!(step > 0.0);

        let frames = drain(&mut animator, 0);
        assert!(frames.iter().all(|f| f.dy >= 0));
        assert_eq!(frames.last().map(|f| f.phase), Some(ScrollPhase::End));
    }

    #[test]
    fn horizontal_axis_emits_dx() {
        let mut animator = Animator::new(no_momentum());
        animator.tick(0, ScrollAxis::Horizontal, 1);
        let frames = drain(&mut animator, 0);
        assert!(frames.iter().all(|f| f.dy == 0));
        assert_eq!(frames.iter().map(|f| f.dx).sum::<i32>(), 76);
    }

    #[test]
    fn ticks_during_animation_accumulate() {
        let mut animator = Animator::new(no_momentum());
        animator.tick(0, ScrollAxis::Vertical, 1);
        let first = animator.frame(FRAME_NS).unwrap();
        animator.tick(FRAME_NS + 1, ScrollAxis::Vertical, 1);

        let rest = drain(&mut animator, FRAME_NS + 1);
        let total: i32 = first.dy + sum_dy(&rest, ScrollPhase::Linear);
        assert_eq!(total, 152);
    }

    #[test]
    fn consecutive_swipes_accelerate() {
        let mut animator = Animator::new(no_momentum());
        let tick_gap = 50_000_000; // 50 ms inside a burst
        let swipe_gap = 200_000_000; // 200 ms between bursts

        let mut now = 0;
        let mut last_step = 0.0;
        for _swipe in 0..7 {
            for _ in 0..3 {
                last_step = animator.tick(now, ScrollAxis::Vertical, 1);
                now += tick_gap;
            }
            now += swipe_gap;
        }

        assert_eq!(animator.swipes(), 7);
        // 7 swipes, threshold 4: factor 1.1^3.
        assert!((animator.fast_scroll_factor() - 1.1f64.powi(3)).abs() < 1e-9);
        assert!(last_step > 76.0);
    }

    #[test]
    fn slow_ticks_never_accelerate() {
        let mut animator = Animator::new(no_momentum());
        for i in 0..20u64 {
            let step = animator.tick(i * 500_000_000, ScrollAxis::Vertical, 1);
            assert!((step - 76.0).abs() < 1e-9);
        }
        assert_eq!(animator.swipes(), 0);
    }

    #[test]
    fn fast_scroll_factor_is_capped() {
        let mut animator = Animator::new(ScrollParameters {
            fast_scroll_base: 3.0,
            fast_scroll_max_factor: 4.0,
            fast_scroll_threshold_swipes: 0,
            swipe_threshold_ticks: 1,
            ..no_momentum()
        });
        // Every tick is its own burst, and therefore its own swipe.
        for i in 0..10u64 {
            animator.tick(i * 200_000_000, ScrollAxis::Vertical, 1);
        }
        assert_eq!(animator.swipes(), 10);
        assert!((animator.fast_scroll_factor() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn one_pixel_ticks_for_isolated_bursts() {
        let mut animator = Animator::new(ScrollParameters {
            one_pixel_ticks: 1,
            ..no_momentum()
        });
        let step = animator.tick(0, ScrollAxis::Vertical, 1);
        assert!((step - 1.0).abs() < 1e-9);
        let frames = drain(&mut animator, 0);
        assert_eq!(sum_dy(&frames, ScrollPhase::Linear), 1);

        // Second tick of the same burst scrolls a full step.
        let step = animator.tick(120_000_000, ScrollAxis::Vertical, 1);
        assert!((step - 76.0).abs() < 1e-9);
    }

    #[test]
    fn finish_owes_end_frame_only_when_busy() {
        let mut animator = Animator::new(ScrollParameters::default());
        animator.tick(0, ScrollAxis::Vertical, 1);
        animator.frame(FRAME_NS);
        assert_eq!(animator.finish(), Some(ScrollOutput::end()));
        assert!(!animator.is_busy());
        assert_eq!(animator.frame(FRAME_NS * 2), None);
    }

    #[test]
    fn stalled_frames_are_capped() {
        let mut animator = Animator::new(no_momentum());
        animator.tick(0, ScrollAxis::Vertical, 10);
        // 10 ticks = 760 px over 90 ms; a 5 s stall only advances 100 ms.
        let frame = animator.frame(5_000_000_000).unwrap();
        assert_eq!(frame.dy, 760);
    }
}
