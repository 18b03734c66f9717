use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{error, warn};

struct Tool {
    name: &'static str,
    instance: Rc<dyn Any>,
}

/// Type-keyed registry of shared services.
///
/// Each service is stored under a key type and handed back by that type.
/// Lookups never fail hard: a missing service is either absent or lazily
/// created, and a service stored under the wrong key is reported and
/// treated as absent.
#[derive(Default)]
pub struct Toolbox {
    tools: HashMap<TypeId, Tool>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under its own type, replacing any previous entry.
    pub fn provide<T: Any>(&mut self, tool: Rc<T>) {
        self.provide_as::<T>(tool);
    }

    /// Registers an arbitrary instance under key `K`.
    pub fn provide_as<K: Any>(&mut self, tool: Rc<dyn Any>) {
        self.tools.insert(
            TypeId::of::<K>(),
            Tool {
                name: type_name::<K>(),
                instance: tool,
            },
        );
    }

    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        let tool = self.tools.get(&TypeId::of::<T>())?;
        match Rc::clone(&tool.instance).downcast::<T>() {
            Ok(instance) => Some(instance),
            Err(_) => {
                error!(key = tool.name, expected = type_name::<T>(), "tool registered under key does not match the requested type");
                None
            }
        }
    }

    /// Like [`Toolbox::get`], but builds and registers a default `T` when nothing is stored yet.
    pub fn get_or_default<T: Any + Default>(&mut self) -> Option<Rc<T>> {
        if !self.contains::<T>() {
            warn!(tool = type_name::<T>(), "expected tool was not found, generated it");
            self.provide(Rc::new(T::default()));
        }
        self.get::<T>()
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.tools.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;

    #[test]
    fn provided_tool_is_shared() {
        let mut toolbox = Toolbox::new();
        let bus = Rc::new(EventBus::new());
        toolbox.provide(Rc::clone(&bus));
        let got = toolbox.get::<EventBus>().unwrap();
        assert!(Rc::ptr_eq(&bus, &got));
    }

    #[test]
    fn missing_tool_is_generated_once() {
        let mut toolbox = Toolbox::new();
        assert!(toolbox.get::<EventBus>().is_none());
        let first = toolbox.get_or_default::<EventBus>().unwrap();
        let second = toolbox.get_or_default::<EventBus>().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(toolbox.len(), 1);
    }

    #[test]
    fn mismatched_tool_resolves_to_none() {
        let mut toolbox = Toolbox::new();
        toolbox.provide_as::<EventBus>(Rc::new(42u32));
        assert!(toolbox.contains::<EventBus>());
        assert!(toolbox.get::<EventBus>().is_none());
        assert!(toolbox.get_or_default::<EventBus>().is_none());
    }
}
