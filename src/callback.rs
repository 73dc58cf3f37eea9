//! The callback protocol: the trigger bitmask, the handle passed back to a
//! firing callback, and the dispatcher the timing core calls into.

use crate::timing::Timing;
use bitflags::bitflags;

bitflags! {
    /// Bitmask over the lifecycle edges a callback wants to hear about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CallbackTriggers: u32 {
        const BEGIN = 1 << 0;
        const START = 1 << 1;
        const END = 1 << 2;
        const COMPLETE = 1 << 3;
        const BACK_START = 1 << 4;
        const BACK_END = 1 << 5;
        const BACK_COMPLETE = 1 << 6;
    }
}

impl CallbackTriggers {
    /// Union of every trigger, matching the builder surface's `ANY` constant.
    pub const ANY: CallbackTriggers = CallbackTriggers::all();
}

impl Default for CallbackTriggers {
    fn default() -> Self {
        CallbackTriggers::ANY
    }
}

/// A single lifecycle edge fired during [`crate::timing::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Begin,
    Start,
    End,
    Complete,
    BackStart,
    BackEnd,
    BackComplete,
}

impl Trigger {
    /// The single bit this trigger occupies in [`CallbackTriggers`].
    pub fn bit(self) -> CallbackTriggers {
        match self {
            Trigger::Begin => CallbackTriggers::BEGIN,
            Trigger::Start => CallbackTriggers::START,
            Trigger::End => CallbackTriggers::END,
            Trigger::Complete => CallbackTriggers::COMPLETE,
            Trigger::BackStart => CallbackTriggers::BACK_START,
            Trigger::BackEnd => CallbackTriggers::BACK_END,
            Trigger::BackComplete => CallbackTriggers::BACK_COMPLETE,
        }
    }
}

/// A handle to the node (tween or timeline) currently firing a callback.
/// Lets a callback inspect the shared timing state and kill the node that
/// fired it (or, for a timeline, cascade the kill to its children).
pub trait NodeHandle {
    fn timing(&self) -> &Timing;
    fn timing_mut(&mut self) -> &mut Timing;

    /// Kill this node. The default only flips this node's own flag;
    /// [`crate::timeline::Timeline`] overrides it to cascade to children.
    fn kill(&mut self) {
        self.timing_mut().is_killed = true;
    }

    /// Request that the nearest enclosing timeline be killed too, once
    /// control returns to it. A no-op on a node with no parent; a child
    /// pushed into a timeline gets this wired up to a flag the parent
    /// polls after each child it advances.
    fn kill_parent(&mut self) {}
}

/// A lifecycle callback: `(trigger, node) -> ()`. Not `Send`/`Sync`: the
/// engine is single-threaded cooperative, so a callback is free to close over
/// `Rc`/`RefCell` state the way ordinary single-threaded game logic does.
pub type Callback = Box<dyn FnMut(Trigger, &mut dyn NodeHandle)>;

/// Invoke `body`'s callback for `trigger` if its mask is enabled, taking the
/// closure out for the duration of the call so a callback that mutates
/// `body` (including killing it) never aliases the boxed closure it's
/// currently running inside.
pub(crate) fn fire<B: NodeHandle>(body: &mut B, trigger: Trigger) {
    if !body.timing().callback_triggers.contains(trigger.bit()) {
        return;
    }
    let Some(mut callback) = body.timing_mut().callback.take() else {
        return;
    };
    callback(trigger, body);
    body.timing_mut().callback = Some(callback);
}
