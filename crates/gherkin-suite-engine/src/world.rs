//! Per-scenario execution context.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use gherkin_suite_adapter::WorldParameters;

/// State shared by the hooks and steps of one scenario.
///
/// Every scenario gets a fresh world. It exposes the remote context handed
/// to the run and stores at most one value per type.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::WorldParameters;
/// use gherkin_suite_engine::World;
///
/// let mut world = World::new(WorldParameters::with_remote("browser"));
/// world.insert(5_i64);
/// *world.get_or_default::<Vec<i64>>() = vec![1];
/// assert_eq!(world.get::<i64>(), Some(&5));
/// assert_eq!(world.remote::<&str>(), Some(&"browser"));
/// ```
#[derive(Default)]
pub struct World {
    parameters: WorldParameters,
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl World {
    /// A world with no stored values.
    #[must_use]
    pub fn new(parameters: WorldParameters) -> Self {
        Self {
            parameters,
            values: HashMap::new(),
        }
    }

    /// Parameters the run was started with.
    #[must_use]
    pub fn parameters(&self) -> &WorldParameters {
        &self.parameters
    }

    /// The remote context, if one was supplied and has type `T`.
    #[must_use]
    pub fn remote<T: Any>(&self) -> Option<&T> {
        self.parameters.remote::<T>()
    }

    /// Store `value`, returning the previous value of the same type.
    pub fn insert<T: Any>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// The stored value of type `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.values.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }

    /// Mutable access to the stored value of type `T`.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.values.get_mut(&TypeId::of::<T>())?.downcast_mut::<T>()
    }

    /// The stored value of type `T`, inserting `T::default()` first if absent.
    pub fn get_or_default<T: Any + Default>(&mut self) -> &mut T {
        let slot = self
            .values
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("values are keyed by their own type"),
        }
    }

    /// Remove and return the stored value of type `T`.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("parameters", &self.parameters)
            .field("values", &self.values.len())
            .finish()
    }
}
