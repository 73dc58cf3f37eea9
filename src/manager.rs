//! The driver: owns a flat list of root [`Node`]s, advances them once per
//! `update` call, and reaps finished or killed roots back into a [`Pool`].

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::accessor::{AccessorRegistry, TypeCode};
use crate::callback::NodeHandle;
use crate::config::EngineConfig;
use crate::error::TweenError;
use crate::node::Node;
use crate::pool::Pool;
use crate::timing::advance;

/// Owns every running tween/timeline, drives them forward with `update`, and
/// recycles finished ones through its own [`Pool`].
///
/// Not `Send`/`Sync`: the whole engine is single-threaded cooperative, driven
/// by one caller calling `update` with successive frame deltas.
pub struct TweenManager {
    config: EngineConfig,
    registry: AccessorRegistry,
    roots: Vec<Node>,
    pool: Pool,
    is_paused: bool,
}

impl TweenManager {
    pub fn new(config: EngineConfig, registry: AccessorRegistry) -> Self {
        let mut pool = Pool::new();
        pool.ensure_capacity(config.pool_capacity);
        TweenManager {
            config,
            registry,
            roots: Vec::new(),
            pool,
            is_paused: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build `node` against this manager's registry and caps, then adopt it
    /// as a new root.
    pub fn add(&mut self, mut node: Node) -> Result<(), TweenError> {
        node.build(&self.registry, self.config.combined_attrs_limit)?;
        self.roots.push(node);
        Ok(())
    }

    /// Advance every root by `delta` seconds, then reap any that finished or
    /// were killed this tick back into the pool.
    ///
    /// A no-op while [`Self::pause`] is in effect.
    pub fn update(&mut self, delta: f64) {
        if self.is_paused {
            return;
        }
        for root in &mut self.roots {
            if root.timing().is_killed || root.timing().is_finished {
                tracing::warn!("update() asked to advance an already-finished or killed root");
                continue;
            }
            advance(root, delta);
        }
        self.reap();
    }

    fn reap(&mut self) {
        let mut i = 0;
        while i < self.roots.len() {
            let done = self.roots[i].timing().is_killed || self.roots[i].timing().is_finished;
            if done {
                let node = self.roots.swap_remove(i);
                self.pool.recycle(node);
            } else {
                i += 1;
            }
        }
    }

    /// Kill every running root immediately; the next `update` reaps them.
    pub fn kill_all(&mut self) {
        for root in &mut self.roots {
            root.kill();
        }
    }

    /// Kill every root (transitively, for a timeline, every child) whose
    /// target is `target` by handle identity, optionally filtered to
    /// `type_code`.
    pub fn kill_target<T: 'static>(&mut self, target: &Rc<RefCell<T>>, type_code: Option<TypeCode>) {
        let erased: Rc<RefCell<dyn Any>> = target.clone();
        for root in &mut self.roots {
            if root.matches_target(&erased, type_code) {
                root.kill();
            }
        }
    }

    /// True if some running root (transitively, for a timeline, some child)
    /// targets `target`, optionally filtered to `type_code`.
    pub fn contains_target<T: 'static>(&self, target: &Rc<RefCell<T>>, type_code: Option<TypeCode>) -> bool {
        let erased: Rc<RefCell<dyn Any>> = target.clone();
        self.roots.iter().any(|root| root.matches_target(&erased, type_code))
    }

    pub fn pause(&mut self) {
        self.is_paused = true;
    }

    pub fn resume(&mut self) {
        self.is_paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Number of roots currently held (running or pending reap), a live scan
    /// rather than a cached counter.
    pub fn size(&self) -> usize {
        self.roots.len()
    }

    pub fn running_tweens_count(&self) -> usize {
        self.roots.iter().filter(|r| r.as_tween().is_some()).count()
    }

    pub fn running_timelines_count(&self) -> usize {
        self.roots.iter().filter(|r| r.is_timeline()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::Accessor;
    use crate::timeline::Timeline;
    use crate::tween::Tween;

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

    fn manager() -> TweenManager {
        let mut registry = AccessorRegistry::new();
        registry.register::<Num>(NumAccessor);
        TweenManager::new(EngineConfig::default(), registry)
    }

    #[test]
    fn added_tween_runs_to_completion_and_gets_reaped() {
        let mut manager = manager();
        let target = Rc::new(RefCell::new(Num(0.0)));
        let mut tween = Tween::to(target.clone(), 0, 0.1).unwrap();
        tween.target(&[5.0]);
        manager.add(tween.into()).unwrap();
        assert_eq!(manager.size(), 1);

        manager.update(0.1);
        assert!((target.borrow().0 - 5.0).abs() < 1e-9);
        assert_eq!(manager.size(), 0);
    }

    #[test]
    fn kill_target_stops_a_running_tween_by_handle_identity() {
        let mut manager = manager();
        let a = Rc::new(RefCell::new(Num(0.0)));
        let b = Rc::new(RefCell::new(Num(0.0)));
        let mut tween_a = Tween::to(a.clone(), 0, 1.0).unwrap();
        tween_a.target(&[5.0]);
        let mut tween_b = Tween::to(b.clone(), 0, 1.0).unwrap();
        tween_b.target(&[5.0]);
        manager.add(tween_a.into()).unwrap();
        manager.add(tween_b.into()).unwrap();

        manager.kill_target(&a, None);
        assert!(!manager.contains_target(&a, None));
        assert!(manager.contains_target(&b, None));

        manager.update(0.1);
        assert_eq!(manager.size(), 1);
        assert!((a.borrow().0 - 0.0).abs() < 1e-9);
    }

    #[test]
    fn contains_target_respects_a_type_code_filter() {
        let mut manager = manager();
        let target = Rc::new(RefCell::new(Num(0.0)));
        let mut tween = Tween::to(target.clone(), 7, 1.0).unwrap();
        tween.target(&[5.0]);
        manager.add(tween.into()).unwrap();

        assert!(manager.contains_target(&target, Some(7)));
        assert!(!manager.contains_target(&target, Some(8)));
        assert!(manager.contains_target(&target, None));
    }

    #[test]
    fn pause_stops_update_from_advancing_anything() {
        let mut manager = manager();
        let target = Rc::new(RefCell::new(Num(0.0)));
        let mut tween = Tween::to(target.clone(), 0, 1.0).unwrap();
        tween.target(&[5.0]);
        manager.add(tween.into()).unwrap();

        manager.pause();
        manager.update(1.0);
        assert_eq!(manager.size(), 1);
        assert!((target.borrow().0 - 0.0).abs() < 1e-9);

        manager.resume();
        manager.update(1.0);
        assert_eq!(manager.size(), 0);
    }

    #[test]
    fn counts_distinguish_tweens_from_timelines() {
        let mut manager = manager();
        let t1 = Rc::new(RefCell::new(Num(0.0)));
        let mut tw1 = Tween::to(t1.clone(), 0, 1.0).unwrap();
        tw1.target(&[1.0]);
        manager.add(tw1.into()).unwrap();

        let t2 = Rc::new(RefCell::new(Num(0.0)));
        let mut tw2 = Tween::to(t2.clone(), 0, 1.0).unwrap();
        tw2.target(&[1.0]);
        let mut timeline = Timeline::sequence();
        timeline.push(tw2);
        manager.add(timeline.into()).unwrap();

        assert_eq!(manager.size(), 2);
        assert_eq!(manager.running_tweens_count(), 1);
        assert_eq!(manager.running_timelines_count(), 1);
    }

    #[test]
    fn kill_all_reaps_every_root_on_the_next_update() {
        let mut manager = manager();
        let t1 = Rc::new(RefCell::new(Num(0.0)));
        let mut tw1 = Tween::to(t1, 0, 1.0).unwrap();
        tw1.target(&[1.0]);
        manager.add(tw1.into()).unwrap();

        manager.kill_all();
        manager.update(0.0);
        assert_eq!(manager.size(), 0);
    }
}
