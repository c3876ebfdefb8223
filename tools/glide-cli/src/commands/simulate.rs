//! Offline trajectory of a burst of wheel ticks.

use glide_common::clock::{interval_for_hz, MonotonicClock};
use glide_common::config::AppConfig;
use glide_platform_core::event::{ScrollAxis, ScrollOutput, ScrollPhase};
use glide_scroll_engine::params::parse_assignments;
use glide_scroll_engine::{Animator, ScrollParameters};
use serde::Serialize;

/// Upper bound on simulated frames, in case parameters never settle.
const MAX_FRAMES: usize = 100_000;

#[derive(Debug, Serialize)]
struct TimedFrame {
    t_ms: f64,
    #[serde(flatten)]
    frame: ScrollOutput,
}

pub fn run(
    config: &AppConfig,
    ticks: u32,
    interval_ms: u64,
    detents: i32,
    assignments: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let params = ScrollParameters::from_map(&config.scroll.parameters)?
        .overlay(&parse_assignments(assignments)?)?;
    let interval_ns = MonotonicClock::ms_to_ns(interval_ms as f64);
    let frames = trajectory(params, ticks, interval_ns, detents);

    if json {
        for frame in &frames {
            println!("{}", serde_json::to_string(frame)?);
        }
        return Ok(());
    }

    println!("{ticks} tick(s) of {detents} detent(s), {interval_ms} ms apart");
    println!();
    for timed in &frames {
        let phase = match timed.frame.phase {
            ScrollPhase::Linear => "linear",
            ScrollPhase::Momentum => "momentum",
            ScrollPhase::End => "end",
        };
        println!("{:>9.1} ms  {:<8} {:>+5}", timed.t_ms, phase, timed.frame.dy);
    }

    let linear: i32 = frames
        .iter()
        .filter(|f| f.frame.phase == ScrollPhase::Linear)
        .map(|f| f.frame.dy)
        .sum();
    let total: i32 = frames.iter().map(|f| f.frame.dy).sum();
    let duration = frames.last().map(|f| f.t_ms).unwrap_or_default();
    println!();
    println!("Linear: {linear} px");
    println!("Momentum: {} px", total - linear);
    println!("Total: {total} px in {duration:.1} ms ({} frames)", frames.len());
    Ok(())
}

/// Feed `ticks` wheel events `interval_ns` apart into an animator and
/// sample it at its frame rate until it settles.
fn trajectory(
    params: ScrollParameters,
    ticks: u32,
    interval_ns: u64,
    detents: i32,
) -> Vec<TimedFrame> {
    let frame_ns = interval_for_hz(params.frame_rate_hz).as_nanos() as u64;
    let mut animator = Animator::new(params);
    let mut frames = Vec::new();
    let mut next_tick = 0u64;
    let mut remaining_ticks = ticks;
    let mut now = 0u64;

    while frames.len() < MAX_FRAMES {
        while remaining_ticks > 0 && next_tick <= now {
            animator.tick(next_tick, ScrollAxis::Vertical, detents);
            remaining_ticks -= 1;
            next_tick += interval_ns;
        }
        if let Some(frame) = animator.frame(now) {
            frames.push(TimedFrame {
                t_ms: MonotonicClock::ns_to_ms(now),
                frame,
            });
        }
        if remaining_ticks == 0 && !animator.is_busy() {
            break;
        }
        now += frame_ns;
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tick_without_friction_scrolls_one_step() {
        let params = ScrollParameters {
            friction: 0.0,
            ..ScrollParameters::default()
        };
        let frames = trajectory(params, 1, 0, -1);
        let total: i32 = frames.iter().map(|f| f.frame.dy).sum();
        assert_eq!(total, -76);
        assert_eq!(frames.last().map(|f| f.frame.phase), Some(ScrollPhase::End));
    }

    #[test]
    fn no_ticks_no_frames() {
        assert!(trajectory(ScrollParameters::default(), 0, 0, 1).is_empty());
    }
}
