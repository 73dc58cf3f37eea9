//! The leaf node: one [`Timing`] that samples an easing curve each iteration
//! and writes the result through an [`Accessor`].

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::accessor::{Accessor, AccessorRegistry, TypeCode};
use crate::callback::{NodeHandle, Trigger};
use crate::easing::Ease;
use crate::error::TweenError;
use crate::path::{CatmullRom, Path};
use crate::timing::{Timing, TimingBody};

/// One interpolation of a single attribute group of a single target.
///
/// The target is held as `Rc<RefCell<dyn Any>>` rather than owned outright:
/// the caller keeps its own clone of the handle, which is what lets
/// [`crate::manager::TweenManager::kill_target`] and `contains_target` find a
/// running tween by comparing handles rather than needing to reach back into
/// a value the engine alone owns.
pub struct Tween {
    pub timing: Timing,
    target: Option<Rc<RefCell<dyn Any>>>,
    type_code: TypeCode,
    accessor: Option<Rc<dyn Accessor>>,
    ease: Ease,
    path: Option<Box<dyn Path>>,
    is_from: bool,
    is_relative: bool,
    combined_attrs_cnt: usize,
    start_values: Vec<f64>,
    target_values: Vec<f64>,
    waypoints: Vec<Vec<f64>>,
    user_data: Option<Box<dyn Any>>,
    built: bool,
    parent_kill_signal: Option<Rc<Cell<bool>>>,
}

impl Tween {
    /// Animate towards `target_values`, sampling the start values from
    /// `target` the first time this tween enters its active iteration.
    pub fn to<T: 'static>(target: Rc<RefCell<T>>, type_code: TypeCode, duration: f64) -> Result<Self, TweenError> {
        Self::with_target(target, type_code, duration, false)
    }

    /// Sample the current values as the declared target, then swap
    /// start/target once initialized, so the tween runs from the declared
    /// values back to wherever `target` started.
    pub fn from<T: 'static>(target: Rc<RefCell<T>>, type_code: TypeCode, duration: f64) -> Result<Self, TweenError> {
        Self::with_target(target, type_code, duration, true)
    }

    /// An instantaneous write: duration 0, no easing to sample.
    pub fn set<T: 'static>(target: Rc<RefCell<T>>, type_code: TypeCode) -> Result<Self, TweenError> {
        Self::with_target(target, type_code, 0.0, false)
    }

    /// A target-less timer: fires its callback on the usual lifecycle edges
    /// but never touches an accessor.
    pub fn call(duration: f64, callback: impl FnMut(Trigger, &mut dyn NodeHandle) + 'static) -> Result<Self, TweenError> {
        let mut tween = Self::bare(duration)?;
        tween.timing.callback = Some(Box::new(callback));
        Ok(tween)
    }

    /// A zero-duration, target-less beacon: fires BEGIN/START/END/COMPLETE
    /// back to back on its first advance, useful purely as a sequencing
    /// placeholder inside a [`crate::timeline::Timeline`].
    pub fn mark() -> Result<Self, TweenError> {
        Self::bare(0.0)
    }

    fn bare(duration: f64) -> Result<Self, TweenError> {
        if duration < 0.0 {
            return Err(TweenError::InvalidDuration(duration));
        }
        Ok(Tween {
            timing: Timing::new(duration),
            target: None,
            type_code: 0,
            accessor: None,
            ease: Ease::default(),
            path: None,
            is_from: false,
            is_relative: false,
            combined_attrs_cnt: 0,
            start_values: Vec::new(),
            target_values: Vec::new(),
            waypoints: Vec::new(),
            user_data: None,
            built: false,
            parent_kill_signal: None,
        })
    }

    fn with_target<T: 'static>(
        target: Rc<RefCell<T>>,
        type_code: TypeCode,
        duration: f64,
        is_from: bool,
    ) -> Result<Self, TweenError> {
        let mut tween = Self::bare(duration)?;
        let target: Rc<RefCell<dyn Any>> = target;
        tween.target = Some(target);
        tween.type_code = type_code;
        tween.is_from = is_from;
        Ok(tween)
    }

    /// Panics with [`TweenError::MutateAfterStart`]'s message if this tween
    /// has already been advanced once. Builder setters are infallible once
    /// past that point, so they chain without `?`; misuse is a programmer
    /// error caught here, not a `Result` the caller is meant to handle.
    fn ensure_mutable(&self) {
        assert!(!self.timing.is_started, "{}", TweenError::MutateAfterStart);
    }

    pub fn ease(&mut self, ease: Ease) -> &mut Self {
        self.ensure_mutable();
        self.ease = ease;
        self
    }

    pub fn path(&mut self, path: impl Path + 'static) -> &mut Self {
        self.ensure_mutable();
        self.path = Some(Box::new(path));
        self
    }

    pub fn target(&mut self, values: &[f64]) -> &mut Self {
        self.ensure_mutable();
        self.is_relative = false;
        self.target_values = values.to_vec();
        self
    }

    pub fn target_relative(&mut self, values: &[f64]) -> &mut Self {
        self.ensure_mutable();
        self.is_relative = true;
        self.target_values = values.to_vec();
        self
    }

    /// Append one waypoint, copying every component.
    pub fn waypoint(&mut self, values: &[f64], waypoints_limit: usize) -> Result<&mut Self, TweenError> {
        self.ensure_mutable();
        if self.waypoints.len() >= waypoints_limit {
            return Err(TweenError::WaypointsOverflow {
                declared: self.waypoints.len() + 1,
                limit: waypoints_limit,
            });
        }
        self.waypoints.push(values.to_vec());
        Ok(self)
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

    pub fn callback(&mut self, callback: impl FnMut(Trigger, &mut dyn NodeHandle) + 'static) -> &mut Self {
        self.ensure_mutable();
        self.timing.callback = Some(Box::new(callback));
        self
    }

    pub fn callback_triggers(&mut self, mask: crate::callback::CallbackTriggers) -> &mut Self {
        self.ensure_mutable();
        self.timing.callback_triggers = mask;
        self
    }

    pub fn user_data(&mut self, data: impl Any) -> &mut Self {
        self.ensure_mutable();
        self.user_data = Some(Box::new(data));
        self
    }

    pub fn user_data_ref<T: 'static>(&self) -> Option<&T> {
        self.user_data.as_deref().and_then(<dyn Any>::downcast_ref)
    }

    /// Suspend this tween: further `advance` calls (direct, or forwarded by
    /// an enclosing timeline) are no-ops until [`Self::resume`]. Unlike the
    /// builder setters above, pausing a started tween is normal use, not
    /// misuse, so this never panics.
    pub fn pause(&mut self) -> &mut Self {
        self.timing.is_paused = true;
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        self.timing.is_paused = false;
        self
    }

    /// Resolve the accessor for this tween's target type (if any target was
    /// given), probe its component count, and validate it against
    /// `combined_attrs_limit`. Must run before the first
    /// [`crate::timing::advance`]. A no-op for a `call`/`mark` timer, which
    /// has no target to resolve.
    pub fn build(&mut self, registry: &AccessorRegistry, combined_attrs_limit: usize) -> Result<(), TweenError> {
        if self.built {
            return Ok(());
        }
        if let Some(target) = &self.target {
            let type_id = target.borrow().type_id();
            let accessor = registry.resolve_erased(type_id).ok_or(TweenError::NoAccessor)?;

            let mut probe = vec![0.0; combined_attrs_limit.max(self.target_values.len()).max(1)];
            let n = {
                let borrowed = target.borrow();
                accessor.get_values(&*borrowed, self.type_code, &mut probe)
            };
            if n > combined_attrs_limit {
                return Err(TweenError::CombinedAttrsOverflow {
                    declared: n,
                    limit: combined_attrs_limit,
                });
            }
            self.combined_attrs_cnt = n;
            self.accessor = Some(accessor);
        }
        self.built = true;
        Ok(())
    }

    pub(crate) fn set_parent_kill_signal(&mut self, signal: Rc<Cell<bool>>) {
        self.parent_kill_signal = Some(signal);
    }

    /// Re-arm for another pass inside a repeating parent timeline: see
    /// [`Timing::rearm`].
    pub(crate) fn rearm(&mut self, reversed: bool) {
        self.timing.rearm(reversed);
    }

    pub(crate) fn matches_target(&self, handle: &Rc<RefCell<dyn Any>>, type_code: Option<TypeCode>) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        Rc::ptr_eq(target, handle) && type_code.map_or(true, |tc| tc == self.type_code)
    }

    /// Clear every reference this tween holds, for returning it to a pool.
    pub(crate) fn reset(&mut self) {
        *self = Tween::default();
    }

    /// Collapse `[start, w0, w1, ..., target]` for component `i` into the
    /// control-point vector the path evaluator expects.
    fn control_points(&self, component: usize) -> Vec<f64> {
        let mut points = Vec::with_capacity(self.waypoints.len() + 2);
        points.push(self.start_values[component]);
        for wp in &self.waypoints {
            points.push(wp[component]);
        }
        points.push(self.target_values[component]);
        points
    }

    fn write_endpoint(&mut self, use_target: bool) {
        let Some(accessor) = self.accessor.clone() else {
            return;
        };
        let Some(target) = &self.target else {
            return;
        };
        let values: &[f64] = if use_target { &self.target_values } else { &self.start_values };
        let mut borrowed = target.borrow_mut();
        accessor.set_values(&mut *borrowed, self.type_code, values);
    }
}

impl NodeHandle for Tween {
    fn timing(&self) -> &Timing {
        &self.timing
    }
    fn timing_mut(&mut self) -> &mut Timing {
        &mut self.timing
    }
    fn kill_parent(&mut self) {
        if let Some(signal) = &self.parent_kill_signal {
            signal.set(true);
        }
    }
}

impl TimingBody for Tween {
    fn initialize_override(&mut self) {
        let Some(accessor) = self.accessor.clone() else {
            return;
        };
        let Some(target) = &self.target else {
            return;
        };
        let mut buf = vec![0.0; self.combined_attrs_cnt];
        {
            let borrowed = target.borrow();
            accessor.get_values(&*borrowed, self.type_code, &mut buf);
        }
        self.start_values = buf;

        if self.target_values.len() < self.combined_attrs_cnt {
            self.target_values.resize(self.combined_attrs_cnt, 0.0);
        }

        if self.is_relative {
            for i in 0..self.combined_attrs_cnt {
                self.target_values[i] += self.start_values[i];
            }
            for wp in &mut self.waypoints {
                for i in 0..self.combined_attrs_cnt.min(wp.len()) {
                    wp[i] += self.start_values[i];
                }
            }
        }

        if self.is_from {
            std::mem::swap(&mut self.start_values, &mut self.target_values);
        }
    }

    fn update_override(&mut self, _applied_delta: f64) {
        if self.accessor.is_none() || self.combined_attrs_cnt == 0 {
            return;
        }

        let reversed = self.timing.is_reversed_iteration();

        if self.timing.duration.abs() < 1e-12 {
            self.write_endpoint(!reversed);
            return;
        }

        let u = if reversed {
            (self.timing.duration - self.timing.current_time) / self.timing.duration
        } else {
            self.timing.current_time / self.timing.duration
        }
        .clamp(0.0, 1.0);
        let t = self.ease.eval(u);

        let mut values = vec![0.0; self.combined_attrs_cnt];
        if self.waypoints.is_empty() || self.path.is_none() {
            for (i, v) in values.iter_mut().enumerate() {
                *v = self.start_values[i] + t * (self.target_values[i] - self.start_values[i]);
            }
        } else {
            let path = self.path.as_deref().unwrap();
            for (i, v) in values.iter_mut().enumerate() {
                let points = self.control_points(i);
                *v = path.compute(t, &points);
            }
        }

        if let Some(accessor) = self.accessor.clone() {
            if let Some(target) = &self.target {
                let mut borrowed = target.borrow_mut();
                accessor.set_values(&mut *borrowed, self.type_code, &values);
            }
        }
    }
}

impl Default for Tween {
    fn default() -> Self {
        Tween {
            timing: Timing::new(0.0),
            target: None,
            type_code: 0,
            accessor: None,
            ease: Ease::default(),
            path: Some(Box::new(CatmullRom)),
            is_from: false,
            is_relative: false,
            combined_attrs_cnt: 0,
            start_values: Vec::new(),
            target_values: Vec::new(),
            waypoints: Vec::new(),
            user_data: None,
            built: false,
            parent_kill_signal: None,
        }
    }
}
