//! Object pool: a free-list per [`Node`] variant, so a finished tween or
//! timeline can be handed back and reused instead of dropped and
//! reallocated.

use crate::node::Node;
use crate::timeline::Timeline;
use crate::tween::Tween;

/// Two separate free-lists, one per [`Node`] variant, rather than one pool of
/// boxed trait objects: recycling a `Tween` back in never has to go through
/// an indirection the tagged-variant design was meant to avoid in the first
/// place.
#[derive(Default)]
pub struct Pool {
    tweens: Vec<Tween>,
    timelines: Vec<Timeline>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow both free-lists until each holds at least `n` spare instances,
    /// logging only when growth actually allocates something.
    pub fn ensure_capacity(&mut self, n: usize) {
        if self.tweens.len() < n {
            let grow = n - self.tweens.len();
            tracing::debug!(grow, kind = "tween", "pool grown");
            self.tweens.resize_with(n, Tween::default);
        }
        if self.timelines.len() < n {
            let grow = n - self.timelines.len();
            tracing::debug!(grow, kind = "timeline", "pool grown");
            self.timelines.resize_with(n, Timeline::sequence);
        }
    }

    /// Take a spare `Tween`, or build a fresh one if the free-list is empty.
    pub fn take_tween(&mut self) -> Tween {
        self.tweens.pop().unwrap_or_default()
    }

    /// Take a spare `Timeline`, or build a fresh one if the free-list is
    /// empty.
    pub fn take_timeline(&mut self) -> Timeline {
        self.timelines.pop().unwrap_or_else(Timeline::sequence)
    }

    /// Return `node` to the pool. A timeline's children are recycled
    /// transitively first, so nothing reachable from `node` is ever dropped
    /// while the pool still has room for it.
    pub fn recycle(&mut self, mut node: Node) {
        match &mut node {
            Node::Tween(tween) => {
                tween.reset();
            }
            Node::Timeline(timeline) => {
                for child in timeline.take_children() {
                    self.recycle(child);
                }
                timeline.reset();
            }
        }
        match node {
            Node::Tween(tween) => self.tweens.push(tween),
            Node::Timeline(timeline) => self.timelines.push(timeline),
        }
    }

    /// Total spare instances currently held, across both free-lists.
    pub fn len(&self) -> usize {
        self.tweens.len() + self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
