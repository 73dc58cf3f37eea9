//! The shared temporal state machine. Every animatable node — leaf
//! [`Tween`](crate::tween::Tween) or composite
//! [`Timeline`](crate::timeline::Timeline) — embeds a [`Timing`] and drives it
//! through [`advance`]. This is the one place the delay → iteration →
//! repeat-delay → … → terminal phase walk is implemented; everything above it
//! only has to answer "what does an iteration look like" via
//! [`TimingBody::update_override`].
//!
//! A duration-backed timer advanced by a signed delta, built as a small
//! explicit state machine rather than a coroutine: a longer delay →
//! iteration → repeat-delay → … → terminal phase chain, not just a single
//! wrapping/ping-ponging span.

use crate::callback::{fire, CallbackTriggers, NodeHandle, Trigger};

/// Number of additional iterations after the first. `Finite(0)` means the
/// tween plays once; unbounded repeats are [`RepeatCount::Infinite`] rather
/// than a numeric sentinel (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatCount {
    Finite(u32),
    Infinite,
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount::Finite(0)
    }
}

impl RepeatCount {
    fn has_more_after(self, k: i64) -> bool {
        match self {
            RepeatCount::Finite(r) => k < r as i64,
            RepeatCount::Infinite => true,
        }
    }

    fn terminal_step(self) -> Option<i64> {
        match self {
            RepeatCount::Finite(r) => Some(2 * (1 + r as i64) + 1),
            RepeatCount::Infinite => None,
        }
    }

    fn last_iteration_step(self) -> i64 {
        match self {
            RepeatCount::Finite(r) => 2 * r as i64,
            // Never actually reached: with infinite repeat there's always a
            // "next" iteration, but a backward re-entry needs *some* step to
            // land on if it's ever called past the current position.
            RepeatCount::Infinite => i64::MAX - 1,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            RepeatCount::Finite(r) => r as f64,
            RepeatCount::Infinite => f64::INFINITY,
        }
    }
}

/// The common temporal state shared by every tween and timeline.
#[derive(Debug, Clone)]
pub struct Timing {
    pub duration: f64,
    pub repeat_count: RepeatCount,
    pub repeat_delay: f64,
    pub delay: f64,
    pub is_yoyo: bool,
    pub step: i64,
    pub current_time: f64,
    pub is_started: bool,
    pub is_initialized: bool,
    pub is_finished: bool,
    pub is_killed: bool,
    pub is_paused: bool,
    pub callback_triggers: CallbackTriggers,
    pub callback: Option<crate::callback::Callback>,
}

impl Timing {
    pub fn new(duration: f64) -> Self {
        Timing {
            duration,
            repeat_count: RepeatCount::default(),
            repeat_delay: 0.0,
            delay: 0.0,
            is_yoyo: false,
            step: -1,
            current_time: 0.0,
            is_started: false,
            is_initialized: false,
            is_finished: false,
            is_killed: false,
            is_paused: false,
            callback_triggers: CallbackTriggers::ANY,
            callback: None,
        }
    }

    /// Reset every field to the freshly-constructed state, for pooling:
    /// a freed instance must have every reference it held cleared.
    pub fn reset(&mut self) {
        *self = Timing::new(0.0);
    }

    /// True once `step` has reached the terminal phase.
    pub fn is_terminal(&self) -> bool {
        self.repeat_count.terminal_step() == Some(self.step)
    }

    /// `step >= 0` and `step` is even: an iteration phase (as opposed to the
    /// pre-delay, a repeat-delay, or the terminal phase).
    pub fn is_iteration_step(&self) -> bool {
        is_iteration_step(self.step)
    }

    /// Whether the active iteration (if any) runs reversed under yoyo: odd
    /// iteration index, yoyo enabled.
    pub fn is_reversed_iteration(&self) -> bool {
        self.is_yoyo && self.is_iteration_step() && (self.step / 2) % 2 == 1
    }

    /// `currentTime / duration` while in an iteration, `0` in the pre-delay or
    /// a repeat-delay, `1` at/after terminal.
    pub fn normal_time(&self) -> f64 {
        if self.is_terminal() {
            1.0
        } else if self.is_iteration_step() {
            if self.duration > 0.0 {
                (self.current_time / self.duration).clamp(0.0, 1.0)
            } else {
                0.0
            }
        } else {
            0.0
        }
    }

    /// `delay + (1+R)*duration + R*repeatDelay`.
    pub fn full_duration(&self) -> f64 {
        self.delay
            + (1.0 + self.repeat_count.as_f64()) * self.duration
            + self.repeat_count.as_f64() * self.repeat_delay
    }

    /// Reset playback position back to a fresh, never-started state (used
    /// when a [`Timeline`](crate::timeline::Timeline) re-arms a child for a
    /// new repeat pass), or to just-finished if `reversed` is set, so a
    /// subsequent negative delta walks the state machine backward through
    /// the whole span rather than finding nothing behind a bare `step = -1`.
    /// `isInitialized` is deliberately left untouched: a child's start
    /// values are sampled once, the first real time it reaches step 0, and
    /// every later pass (forward or re-armed-reversed) reuses them — exactly
    /// how an ordinary repeating tween already behaves without any
    /// re-arming at all.
    pub fn rearm(&mut self, reversed: bool) {
        self.is_started = false;
        if reversed {
            self.step = self
                .repeat_count
                .terminal_step()
                .unwrap_or_else(|| self.repeat_count.last_iteration_step());
            self.current_time = 0.0;
            self.is_finished = true;
        } else {
            self.step = -1;
            self.current_time = 0.0;
            self.is_finished = false;
        }
    }

    fn width_for_step(&self, step: i64) -> f64 {
        if step == -1 {
            self.delay
        } else if step % 2 == 0 {
            self.duration
        } else {
            self.repeat_delay
        }
    }
}

fn is_iteration_step(step: i64) -> bool {
    step >= 0 && step % 2 == 0
}

/// Anything driven by the shared state machine: supplies the two hooks a
/// leaf or composite node implements to react to the timing walk.
pub trait TimingBody: NodeHandle {
    /// Runs exactly once, the first time `step` transitions to `0`.
    fn initialize_override(&mut self);

    /// Runs on every entry into, exit from, or stay within an iteration step.
    /// `applied_delta` is the signed amount `current_time` just moved by
    /// (positive forward, negative backward); a [`Timeline`](crate::timeline::Timeline)
    /// forwards it verbatim to its children.
    fn update_override(&mut self, applied_delta: f64);
}

/// Advance `body`'s timing state by signed `delta` seconds, firing lifecycle
/// triggers and the iteration hook along the way.
pub fn advance<B: TimingBody>(body: &mut B, delta: f64) {
    if body.timing().is_killed || body.timing().is_paused {
        return;
    }
    body.timing_mut().is_started = true;

    let forward = delta >= 0.0;
    let mut remaining = delta.abs();

    loop {
        if body.timing().is_killed {
            return;
        }

        if body.timing().is_terminal() {
            if forward || remaining == 0.0 {
                return;
            }
            // Backward re-entry into the last iteration from terminal.
            let r = body.timing().repeat_count;
            let last = r.last_iteration_step();
            let width = body.timing().width_for_step(last);
            body.timing_mut().step = last;
            body.timing_mut().current_time = width;
            body.timing_mut().is_finished = false;
            fire(body, Trigger::BackStart);
            continue;
        }

        let step = body.timing().step;
        let width = body.timing().width_for_step(step);
        let pos = body.timing().current_time;
        let is_iter = is_iteration_step(step);

        // Reaching the boundary exactly (remaining == room) still triggers
        // the transition below rather than sitting at the edge: deltas
        // summing to exactly the full duration must still finish the tween.
        if forward {
            let room = width - pos;
            if remaining < room {
                body.timing_mut().current_time = pos + remaining;
                if is_iter {
                    body.update_override(remaining);
                }
                return;
            }

            let consumed = room;
            remaining -= consumed;
            body.timing_mut().current_time = width;
            if is_iter {
                body.update_override(consumed);
                fire(body, Trigger::End);
                if body.timing().is_killed {
                    return;
                }
            }

            if is_iter {
                let k = step / 2;
                let r = body.timing().repeat_count;
                if r.has_more_after(k) {
                    body.timing_mut().step = step + 1;
                    body.timing_mut().current_time = 0.0;
                } else if let Some(terminal) = r.terminal_step() {
                    body.timing_mut().step = terminal;
                    body.timing_mut().is_finished = true;
                    fire(body, Trigger::Complete);
                    if body.timing().is_killed {
                        return;
                    }
                    return;
                } else {
                    // Infinite repeat never reaches "no more after"; unreachable.
                    unreachable!("infinite repeat has no terminal step");
                }
            } else {
                // Leaving a repeat-delay forward always enters the next iteration.
                body.timing_mut().step = step + 1;
                body.timing_mut().current_time = 0.0;
            }

            let next = body.timing().step;
            if is_iteration_step(next) {
                if next == 0 && !body.timing().is_initialized {
                    body.timing_mut().is_initialized = true;
                    body.initialize_override();
                    fire(body, Trigger::Begin);
                    if body.timing().is_killed {
                        return;
                    }
                }
                fire(body, Trigger::Start);
                if body.timing().is_killed {
                    return;
                }
            }
        } else {
            if remaining < pos {
                body.timing_mut().current_time = pos - remaining;
                if is_iter {
                    body.update_override(-remaining);
                }
                return;
            }

            let consumed = pos;
            remaining -= consumed;
            body.timing_mut().current_time = 0.0;
            if is_iter {
                body.update_override(-consumed);
                fire(body, Trigger::BackEnd);
                if body.timing().is_killed {
                    return;
                }
            }

            if step == -1 {
                // Nothing precedes the pre-delay; absorb and stop.
                return;
            } else if step == 0 {
                body.timing_mut().step = -1;
                let width = body.timing().delay;
                body.timing_mut().current_time = width;
                fire(body, Trigger::BackComplete);
                if body.timing().is_killed {
                    return;
                }
            } else {
                let prev = step - 1;
                let width = body.timing().width_for_step(prev);
                body.timing_mut().step = prev;
                body.timing_mut().current_time = width;
                if is_iteration_step(prev) {
                    fire(body, Trigger::BackStart);
                    if body.timing().is_killed {
                        return;
                    }
                }
            }
        }
    }
}
