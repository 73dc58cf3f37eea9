//! The accessor registry: a capability table mapping a target's runtime type
//! to a read/write capability over one of its named attribute groups.
//!
//! A single trait object capability covers both "how do I write this field"
//! and "which implementation applies to this target type", since this engine
//! has no query machinery that would otherwise need those split apart.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

/// A user-defined integer identifying which attribute group of a target to
/// animate. Opaque to the engine; meaning is entirely up to the accessor
/// implementation.
pub type TypeCode = i32;

/// A read/write capability over one attribute group of a target's type.
///
/// `get_values` writes the current `n` scalar components into `out` and
/// returns `n`; `set_values` writes them back. Not `Send`/`Sync`: the engine
/// is single-threaded cooperative, so an accessor is free to close over `Rc`
/// state the way the target objects it reads often do.
pub trait Accessor {
    /// Read the current components of `type_code` on `target` into `out`,
    /// returning how many components were written.
    fn get_values(&self, target: &dyn Any, type_code: TypeCode, out: &mut [f64]) -> usize;

    /// Write `values` back onto `target` for `type_code`.
    fn set_values(&self, target: &mut dyn Any, type_code: TypeCode, values: &[f64]);
}

/// Implemented directly by a target type that wants to be its own accessor,
/// skipping the registry lookup entirely.
pub trait SelfAccessor: 'static {
    /// See [`Accessor::get_values`].
    fn get_values(&self, type_code: TypeCode, out: &mut [f64]) -> usize;
    /// See [`Accessor::set_values`].
    fn set_values(&mut self, type_code: TypeCode, values: &[f64]);
}

/// Bridges a [`SelfAccessor`] target type into the [`Accessor`] capability
/// table, so `build()` can resolve it through the same registry as any other
/// target.
struct SelfAccessorAdapter<T>(PhantomData<fn() -> T>);

impl<T: SelfAccessor> Accessor for SelfAccessorAdapter<T> {
    fn get_values(&self, target: &dyn Any, type_code: TypeCode, out: &mut [f64]) -> usize {
        let t = target
            .downcast_ref::<T>()
            .expect("self-accessor registered for the wrong concrete type");
        t.get_values(type_code, out)
    }

    fn set_values(&self, target: &mut dyn Any, type_code: TypeCode, values: &[f64]) {
        let t = target
            .downcast_mut::<T>()
            .expect("self-accessor registered for the wrong concrete type");
        t.set_values(type_code, values);
    }
}

/// Mapping from a target's runtime type to its [`Accessor`].
///
/// Lookup is exact-match only: no superclass or supertrait walk, just the
/// registered `TypeId`.
#[derive(Default)]
pub struct AccessorRegistry {
    by_type: HashMap<TypeId, Rc<dyn Accessor>>,
}

impl AccessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accessor for target type `T`. Idempotent: a later call for
    /// the same `T` overwrites the earlier registration.
    pub fn register<T: 'static>(&mut self, accessor: impl Accessor + 'static) {
        self.by_type.insert(TypeId::of::<T>(), Rc::new(accessor));
    }

    /// Register `T` as its own accessor via [`SelfAccessor`].
    pub fn register_self<T: SelfAccessor>(&mut self) {
        self.by_type
            .insert(TypeId::of::<T>(), Rc::new(SelfAccessorAdapter::<T>(PhantomData)));
    }

    /// Resolve the accessor registered for `T`, if any. `build()` clones the
    /// `Rc` into the tween so repeated updates never touch the registry
    /// again.
    pub fn resolve<T: 'static>(&self) -> Option<Rc<dyn Accessor>> {
        self.by_type.get(&TypeId::of::<T>()).cloned()
    }

    /// Resolve by a runtime [`TypeId`] rather than a static type parameter,
    /// for callers (like [`crate::tween::Tween::build`]) that only hold the
    /// target behind a type-erased `Box<dyn Any>`.
    pub fn resolve_erased(&self, type_id: TypeId) -> Option<Rc<dyn Accessor>> {
        self.by_type.get(&type_id).cloned()
    }

    /// True if some accessor is registered for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position {
        x: f64,
        y: f64,
    }

    struct PositionAccessor;
    impl Accessor for PositionAccessor {
        fn get_values(&self, target: &dyn Any, _type_code: TypeCode, out: &mut [f64]) -> usize {
            let p = target.downcast_ref::<Position>().unwrap();
            out[0] = p.x;
            out[1] = p.y;
            2
        }
        fn set_values(&self, target: &mut dyn Any, _type_code: TypeCode, values: &[f64]) {
            let p = target.downcast_mut::<Position>().unwrap();
            p.x = values[0];
            p.y = values[1];
        }
    }

    #[test]
    fn register_then_resolve_round_trips() {
        let mut registry = AccessorRegistry::new();
        assert!(!registry.contains::<Position>());
        registry.register::<Position>(PositionAccessor);
        assert!(registry.contains::<Position>());

        let accessor = registry.resolve::<Position>().unwrap();
        let mut p = Position { x: 1.0, y: 2.0 };
        let mut buf = [0.0; 2];
        let n = accessor.get_values(&p, 0, &mut buf);
        assert_eq!(n, 2);
        assert_eq!(buf, [1.0, 2.0]);

        accessor.set_values(&mut p, 0, &[5.0, 6.0]);
        assert_eq!((p.x, p.y), (5.0, 6.0));
    }

    #[test]
    fn later_registration_overwrites_earlier_one() {
        struct AltAccessor;
        impl Accessor for AltAccessor {
            fn get_values(&self, _t: &dyn Any, _c: TypeCode, out: &mut [f64]) -> usize {
                out[0] = 42.0;
                1
            }
            fn set_values(&self, _t: &mut dyn Any, _c: TypeCode, _v: &[f64]) {}
        }
        let mut registry = AccessorRegistry::new();
        registry.register::<Position>(PositionAccessor);
        registry.register::<Position>(AltAccessor);
        let accessor = registry.resolve::<Position>().unwrap();
        let p = Position { x: 1.0, y: 2.0 };
        let mut buf = [0.0; 1];
        accessor.get_values(&p, 0, &mut buf);
        assert_eq!(buf, [42.0]);
    }

    struct SelfAnimated {
        value: f64,
    }
    impl SelfAccessor for SelfAnimated {
        fn get_values(&self, _type_code: TypeCode, out: &mut [f64]) -> usize {
            out[0] = self.value;
            1
        }
        fn set_values(&mut self, _type_code: TypeCode, values: &[f64]) {
            self.value = values[0];
        }
    }

    #[test]
    fn self_accessor_reads_and_writes_through_itself() {
        let mut registry = AccessorRegistry::new();
        registry.register_self::<SelfAnimated>();
        let accessor = registry.resolve::<SelfAnimated>().unwrap();
        let mut obj = SelfAnimated { value: 3.0 };
        let mut buf = [0.0; 1];
        accessor.get_values(&obj, 0, &mut buf);
        assert_eq!(buf, [3.0]);
        accessor.set_values(&mut obj, 0, &[9.0]);
        assert_eq!(obj.value, 9.0);
    }

    #[test]
    fn missing_registration_is_absent() {
        let registry = AccessorRegistry::new();
        assert!(registry.resolve::<Position>().is_none());
    }
}
