//! The tagged-variant root of the composition tree: a single type that is
//! either a leaf [`Tween`] or a composite [`Timeline`], so a
//! [`Timeline`]'s children and a [`crate::manager::TweenManager`]'s roots can
//! both be stored as one homogeneous `Vec` without a trait object.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use crate::accessor::{AccessorRegistry, TypeCode};
use crate::callback::NodeHandle;
use crate::error::TweenError;
use crate::timing::{Timing, TimingBody};
use crate::tween::Tween;
use crate::timeline::Timeline;

/// Either a leaf interpolation or a composite sequence/parallel group.
/// Delegates every operation to whichever variant it holds.
pub enum Node {
    Tween(Tween),
    Timeline(Timeline),
}

impl From<Tween> for Node {
    fn from(tween: Tween) -> Self {
        Node::Tween(tween)
    }
}

impl From<Timeline> for Node {
    fn from(timeline: Timeline) -> Self {
        Node::Timeline(timeline)
    }
}

impl Node {
    pub fn as_tween(&self) -> Option<&Tween> {
        match self {
            Node::Tween(t) => Some(t),
            Node::Timeline(_) => None,
        }
    }

    pub fn as_timeline(&self) -> Option<&Timeline> {
        match self {
            Node::Tween(_) => None,
            Node::Timeline(t) => Some(t),
        }
    }

    pub fn is_timeline(&self) -> bool {
        matches!(self, Node::Timeline(_))
    }

    pub fn build(&mut self, registry: &AccessorRegistry, combined_attrs_limit: usize) -> Result<(), TweenError> {
        match self {
            Node::Tween(t) => t.build(registry, combined_attrs_limit),
            Node::Timeline(t) => t.build(registry, combined_attrs_limit),
        }
    }

    pub(crate) fn set_parent_kill_signal(&mut self, signal: Rc<Cell<bool>>) {
        match self {
            Node::Tween(t) => t.set_parent_kill_signal(signal),
            Node::Timeline(t) => t.set_parent_kill_signal(signal),
        }
    }

    pub(crate) fn matches_target(&self, handle: &Rc<std::cell::RefCell<dyn Any>>, type_code: Option<TypeCode>) -> bool {
        match self {
            Node::Tween(t) => t.matches_target(handle, type_code),
            Node::Timeline(t) => t.matches_target(handle, type_code),
        }
    }

    pub(crate) fn reset(&mut self) {
        match self {
            Node::Tween(t) => t.reset(),
            Node::Timeline(t) => t.reset(),
        }
    }

    pub(crate) fn rearm(&mut self, reversed: bool) {
        match self {
            Node::Tween(t) => t.rearm(reversed),
            Node::Timeline(t) => t.rearm(reversed),
        }
    }

    /// Suspend this node in place, independent of whatever manager holds it.
    pub fn pause(&mut self) -> &mut Self {
        match self {
            Node::Tween(t) => {
                t.pause();
            }
            Node::Timeline(t) => {
                t.pause();
            }
        }
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        match self {
            Node::Tween(t) => {
                t.resume();
            }
            Node::Timeline(t) => {
                t.resume();
            }
        }
        self
    }
}

impl NodeHandle for Node {
    fn timing(&self) -> &Timing {
        match self {
            Node::Tween(t) => t.timing(),
            Node::Timeline(t) => t.timing(),
        }
    }

    fn timing_mut(&mut self) -> &mut Timing {
        match self {
            Node::Tween(t) => t.timing_mut(),
            Node::Timeline(t) => t.timing_mut(),
        }
    }

    fn kill(&mut self) {
        match self {
            Node::Tween(t) => t.kill(),
            Node::Timeline(t) => t.kill(),
        }
    }

    fn kill_parent(&mut self) {
        match self {
            Node::Tween(t) => t.kill_parent(),
            Node::Timeline(t) => t.kill_parent(),
        }
    }
}

impl TimingBody for Node {
    fn initialize_override(&mut self) {
        match self {
            Node::Tween(t) => t.initialize_override(),
            Node::Timeline(t) => t.initialize_override(),
        }
    }

    fn update_override(&mut self, applied_delta: f64) {
        match self {
            Node::Tween(t) => t.update_override(applied_delta),
            Node::Timeline(t) => t.update_override(applied_delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{Accessor, AccessorRegistry};
    use crate::timing::advance;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Value(f64);

    struct ValueAccessor;
    impl Accessor for ValueAccessor {
        fn get_values(&self, target: &dyn Any, _type_code: TypeCode, out: &mut [f64]) -> usize {
            out[0] = target.downcast_ref::<Value>().unwrap().0;
            1
        }
        fn set_values(&self, target: &mut dyn Any, _type_code: TypeCode, values: &[f64]) {
            target.downcast_mut::<Value>().unwrap().0 = values[0];
        }
    }

    fn registry() -> AccessorRegistry {
        let mut r = AccessorRegistry::new();
        r.register::<Value>(ValueAccessor);
        r
    }

    #[test]
    fn node_delegates_to_its_tween_variant() {
        let target = Rc::new(RefCell::new(Value(0.0)));
        let mut tween = Tween::to(target.clone(), 0, 1.0).unwrap();
        tween.target(&[5.0]);
        tween.build(&registry(), 3).unwrap();
        let mut node: Node = tween.into();
        advance(&mut node, 1.0);
        assert!((target.borrow().0 - 5.0).abs() < 1e-9);
    }
}
