//! The composite node: an ordered group of children played sequentially or
//! concurrently, recomputing its own duration from theirs.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::accessor::{AccessorRegistry, TypeCode};
use crate::callback::NodeHandle;
use crate::error::TweenError;
use crate::node::Node;
use crate::timing::{advance, Timing, TimingBody};

/// Whether a timeline's children run back to back or all at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineMode {
    Sequence,
    Parallel,
}

/// A group of child nodes under one shared [`Timing`].
///
/// Each child's own `delay` field carries its placement within the parent:
/// cumulative prior duration for a [`TimelineMode::Sequence`] parent, `0` for
/// a [`TimelineMode::Parallel`] one. Because every child is itself a full
/// state machine (a [`Node`] wrapping a [`crate::tween::Tween`] or nested
/// `Timeline`), forwarding the parent's own applied delta straight to every
/// child via [`advance`] reproduces delay/skip/overflow handling for free —
/// the parent does not need to track "which children are currently active"
/// itself.
pub struct Timeline {
    pub timing: Timing,
    mode: TimelineMode,
    children: Vec<Node>,
    built: bool,
    kill_signal: Rc<Cell<bool>>,
    parent_kill_signal: Option<Rc<Cell<bool>>>,
    /// Highest repeat iteration index (`step / 2`) whose children have
    /// already been re-armed for this pass. A repeating timeline keeps
    /// reusing the same [`Node`]s across iterations instead of cloning them,
    /// so each child has to be reset back to a fresh (or, under yoyo, a
    /// just-finished) state exactly once per new iteration — never mid-way
    /// through one, or progress already made this pass would be lost.
    max_iteration_seen: i64,
}

impl Timeline {
    pub fn sequence() -> Self {
        Self::new(TimelineMode::Sequence)
    }

    pub fn parallel() -> Self {
        Self::new(TimelineMode::Parallel)
    }

    fn new(mode: TimelineMode) -> Self {
        Timeline {
            timing: Timing::new(0.0),
            mode,
            children: Vec::new(),
            built: false,
            kill_signal: Rc::new(Cell::new(false)),
            parent_kill_signal: None,
            max_iteration_seen: -1,
        }
    }

    fn ensure_mutable(&self) {
        assert!(!self.timing.is_started, "{}", TweenError::MutateAfterStart);
    }

    /// Suspend this timeline and every currently in-flight child forwards
    /// through it: further `advance` calls are no-ops until [`Self::resume`].
    pub fn pause(&mut self) -> &mut Self {
        self.timing.is_paused = true;
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        self.timing.is_paused = false;
        self
    }

    /// Append a child. A child that has already started cannot be adopted:
    /// it would already be mid-flight under whatever previously drove it.
    pub fn push(&mut self, child: impl Into<Node>) -> &mut Self {
        self.ensure_mutable();
        let mut child = child.into();
        assert!(
            !child.timing().is_started,
            "cannot push an already-started node into a timeline"
        );
        child.set_parent_kill_signal(self.kill_signal.clone());
        self.children.push(child);
        self
    }

    pub fn delay(&mut self, delay: f64) -> &mut Self {
        self.ensure_mutable();
        self.timing.delay = delay;
        self
    }

    pub fn repeat(&mut self, count: crate::timing::RepeatCount, delay: f64) -> &mut Self {
        self.ensure_mutable();
        self.timing.repeat_count = count;
        self.timing.repeat_delay = delay;
        self.timing.is_yoyo = false;
        self
    }

    pub fn repeat_yoyo(&mut self, count: crate::timing::RepeatCount, delay: f64) -> &mut Self {
        self.ensure_mutable();
        self.timing.repeat_count = count;
        self.timing.repeat_delay = delay;
        self.timing.is_yoyo = true;
        self
    }

    pub fn callback(
        &mut self,
        callback: impl FnMut(crate::callback::Trigger, &mut dyn NodeHandle) + 'static,
    ) -> &mut Self {
        self.ensure_mutable();
        self.timing.callback = Some(Box::new(callback));
        self
    }

    pub fn callback_triggers(&mut self, mask: crate::callback::CallbackTriggers) -> &mut Self {
        self.ensure_mutable();
        self.timing.callback_triggers = mask;
        self
    }

    /// Walk children depth-first, building each and assigning its `delay`
    /// from this timeline's mode, then derive this timeline's own
    /// `duration` from the built children.
    pub fn build(&mut self, registry: &AccessorRegistry, combined_attrs_limit: usize) -> Result<(), TweenError> {
        if self.built {
            return Ok(());
        }
        let mut cumulative = 0.0;
        for child in &mut self.children {
            match self.mode {
                TimelineMode::Sequence => child.timing_mut().delay = cumulative,
                TimelineMode::Parallel => child.timing_mut().delay = 0.0,
            }
            child.build(registry, combined_attrs_limit)?;
            cumulative += child.timing().full_duration();
        }
        self.timing.duration = match self.mode {
            TimelineMode::Sequence => cumulative,
            TimelineMode::Parallel => self
                .children
                .iter()
                .map(|c| c.timing().full_duration())
                .fold(0.0, f64::max),
        };
        tracing::debug!(duration = self.timing.duration, mode = ?self.mode, "timeline built");
        self.built = true;
        Ok(())
    }

    pub(crate) fn set_parent_kill_signal(&mut self, signal: Rc<Cell<bool>>) {
        self.parent_kill_signal = Some(signal);
    }

    pub(crate) fn matches_target(&self, handle: &Rc<RefCell<dyn Any>>, type_code: Option<TypeCode>) -> bool {
        self.children.iter().any(|c| c.matches_target(handle, type_code))
    }

    /// Clear every reference this timeline (and transitively its children)
    /// holds, for returning it to a pool.
    pub(crate) fn reset(&mut self) {
        let mode = self.mode;
        *self = Timeline::new(mode);
    }

    /// Re-arm for another pass inside a repeating parent timeline. Resets
    /// this timeline's own position and forgets which of its children have
    /// been re-armed, so its own `update_override` re-arms them in turn the
    /// next time it actually runs.
    pub(crate) fn rearm(&mut self, reversed: bool) {
        self.timing.rearm(reversed);
        self.max_iteration_seen = -1;
    }

    pub(crate) fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl NodeHandle for Timeline {
    fn timing(&self) -> &Timing {
        &self.timing
    }
    fn timing_mut(&mut self) -> &mut Timing {
        &mut self.timing
    }
    fn kill(&mut self) {
        self.timing.is_killed = true;
        for child in &mut self.children {
            child.kill();
        }
    }
    fn kill_parent(&mut self) {
        if let Some(signal) = &self.parent_kill_signal {
            signal.set(true);
        }
    }
}

impl TimingBody for Timeline {
    fn initialize_override(&mut self) {}

    fn update_override(&mut self, applied_delta: f64) {
        // A repeating timeline reuses the same children every pass rather
        // than rebuilding them, so the first time this runs for a new
        // iteration (moving forward in real time, never on a backward
        // re-entry into one already visited) every child needs re-arming:
        // to a fresh start for a forward pass, or to its own finished state
        // for a yoyo-reversed one, so the negative delta below walks it
        // backward through the whole span instead of finding nothing behind
        // it.
        let raw_forward = applied_delta >= 0.0;
        let iteration = self.timing.step / 2;
        if raw_forward && iteration > self.max_iteration_seen {
            let reversed = self.timing.is_reversed_iteration();
            for child in &mut self.children {
                child.rearm(reversed);
            }
            self.max_iteration_seen = iteration;
        }

        let effective = if self.timing.is_reversed_iteration() {
            -applied_delta
        } else {
            applied_delta
        };
        let forward = effective >= 0.0;
        let len = self.children.len();
        let order: Box<dyn Iterator<Item = usize>> = if forward {
            Box::new(0..len)
        } else {
            Box::new((0..len).rev())
        };

        for i in order {
            if self.kill_signal.get() {
                self.kill();
                return;
            }
            advance(&mut self.children[i], effective);
            if self.timing.is_killed {
                return;
            }
        }

        if self.kill_signal.get() {
            self.kill();
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Timeline::new(TimelineMode::Sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{Accessor, AccessorRegistry};
    use crate::callback::Trigger;
    use crate::tween::Tween;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Num(f64);

    struct NumAccessor;
    impl Accessor for NumAccessor {
        fn get_values(&self, target: &dyn Any, _type_code: TypeCode, out: &mut [f64]) -> usize {
            out[0] = target.downcast_ref::<Num>().unwrap().0;
            1
        }
        fn set_values(&self, target: &mut dyn Any, _type_code: TypeCode, values: &[f64]) {
            target.downcast_mut::<Num>().unwrap().0 = values[0];
        }
    }

    fn registry() -> AccessorRegistry {
        let mut r = AccessorRegistry::new();
        r.register::<Num>(NumAccessor);
        r
    }

    fn tween_to(value: f64, target_value: f64, duration: f64) -> (Rc<RefCell<Num>>, Tween) {
        let target = Rc::new(RefCell::new(Num(value)));
        let mut tween = Tween::to(target.clone(), 0, duration).unwrap();
        tween.target(&[target_value]);
        (target, tween)
    }

    #[test]
    fn sequence_runs_children_back_to_back() {
        let (t1, tw1) = tween_to(0.0, 40.0, 0.1);
        let (t2, tw2) = tween_to(0.0, 40.0, 0.1);

        let mut timeline = Timeline::sequence();
        timeline.push(tw1);
        timeline.push(tw2);
        timeline.build(&registry(), 3).unwrap();
        assert!((timeline.timing.duration - 0.2).abs() < 1e-9);

        let mut node: Node = timeline.into();
        advance(&mut node, 0.2);
        assert!((t1.borrow().0 - 40.0).abs() < 1e-9);
        assert!((t2.borrow().0 - 40.0).abs() < 1e-9);
        assert!(node.timing().is_finished);
    }

    #[test]
    fn sequence_fires_begin_start_end_complete_in_order() {
        // Each child is its own BaseTween with a full Begin/Start/End/Complete
        // lifecycle; filter each side to the triggers the scenario cares
        // about so the merged, time-ordered trace is just the timeline's own
        // BEGIN, then each child's START/END pair in sequence order, then
        // the timeline's own COMPLETE.
        use crate::callback::CallbackTriggers;

        let log = Rc::new(RefCell::new(Vec::new()));

        let (_t1, mut tw1) = tween_to(0.0, 40.0, 0.1);
        let (_t2, mut tw2) = tween_to(0.0, 40.0, 0.1);
        let log1 = log.clone();
        let log2 = log.clone();
        tw1.callback(move |trigger, _h| log1.borrow_mut().push(trigger))
            .callback_triggers(CallbackTriggers::START | CallbackTriggers::END);
        tw2.callback(move |trigger, _h| log2.borrow_mut().push(trigger))
            .callback_triggers(CallbackTriggers::START | CallbackTriggers::END);

        let mut timeline = Timeline::sequence();
        timeline.push(tw1);
        timeline.push(tw2);
        let log3 = log.clone();
        timeline
            .callback(move |trigger, _h| log3.borrow_mut().push(trigger))
            .callback_triggers(CallbackTriggers::BEGIN | CallbackTriggers::COMPLETE);
        timeline.build(&registry(), 3).unwrap();

        advance(&mut timeline, 0.2);
        assert_eq!(
            *log.borrow(),
            vec![
                Trigger::Begin,
                Trigger::Start,
                Trigger::End,
                Trigger::Start,
                Trigger::End,
                Trigger::Complete,
            ]
        );
    }

    #[test]
    fn parallel_completes_no_earlier_than_its_longest_child() {
        let (_t1, tw1) = tween_to(0.0, 1.0, 0.1);
        let (_t2, tw2) = tween_to(0.0, 1.0, 0.12);

        let mut timeline = Timeline::parallel();
        timeline.push(tw1);
        timeline.push(tw2);
        timeline.build(&registry(), 3).unwrap();
        assert!((timeline.timing.duration - 0.12).abs() < 1e-9);

        advance(&mut timeline, 0.1);
        assert!(!timeline.timing.is_finished);
        advance(&mut timeline, 0.02);
        assert!(timeline.timing.is_finished);
    }

    #[test]
    fn repeat_one_runs_two_full_passes() {
        let (_t1, tw1) = tween_to(0.0, 1.0, 0.1);

        let log = Rc::new(RefCell::new(Vec::new()));
        let log2 = log.clone();

        let mut timeline = Timeline::sequence();
        timeline.push(tw1);
        timeline.repeat(crate::timing::RepeatCount::Finite(1), 0.0);
        timeline.callback(move |trigger, _h| log2.borrow_mut().push(trigger));
        timeline.build(&registry(), 3).unwrap();

        advance(&mut timeline, 0.2);
        let log = log.borrow();
        assert_eq!(log.iter().filter(|t| **t == Trigger::Start).count(), 2);
        assert_eq!(log.iter().filter(|t| **t == Trigger::End).count(), 2);
        assert_eq!(log.iter().filter(|t| **t == Trigger::Begin).count(), 1);
        assert_eq!(log.iter().filter(|t| **t == Trigger::Complete).count(), 1);
    }

    #[test]
    fn repeat_yoyo_second_pass_returns_to_the_start() {
        let (target, tw1) = tween_to(0.0, 1.0, 0.1);

        let mut timeline = Timeline::sequence();
        timeline.push(tw1);
        timeline.repeat_yoyo(crate::timing::RepeatCount::Finite(1), 0.0);
        timeline.build(&registry(), 3).unwrap();

        advance(&mut timeline, 0.2);
        assert!((target.borrow().0 - 0.0).abs() < 1e-9);
    }

    #[test]
    fn a_child_can_kill_its_parent_timeline_from_its_complete_callback() {
        let (_t1, mut tw1) = tween_to(0.0, 1.0, 0.1);
        tw1.callback(|trigger, handle| {
            if trigger == Trigger::Complete {
                handle.kill_parent();
            }
        });
        let (_t2, tw2) = tween_to(0.0, 1.0, 0.1);

        let mut timeline = Timeline::sequence();
        timeline.push(tw1);
        timeline.push(tw2);
        timeline.build(&registry(), 3).unwrap();
        let full_duration = timeline.timing.full_duration();

        // Tick in increments smaller than the timeline's own total duration,
        // as a real driver would: the first tick lands exactly on child 1's
        // own boundary, which is where its COMPLETE (and the kill) fires.
        advance(&mut timeline, 0.1);
        assert!(timeline.timing.is_killed);
        assert!(timeline.timing.current_time < full_duration);
    }
}
