//! "Value or factory" fields and the trigger context they are resolved against.

use std::fmt;
use std::rc::Rc;

use crate::dom::NodeId;

/// Pointer event as seen by the menu: coordinates plus the two flags a
/// handler may flip.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub page_x: f64,
    pub page_y: f64,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl PointerEvent {
    pub fn at(page_x: f64, page_y: f64) -> Self {
        Self {
            page_x,
            page_y,
            ..Default::default()
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Everything a factory or callback gets to look at: the element the menu was
/// requested on, the datum bound to it, its index and the trigger event.
pub struct Context<'a, D> {
    pub element: NodeId,
    pub data: &'a D,
    pub index: usize,
    pub event: &'a PointerEvent,
}

impl<D> Clone for Context<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Context<'_, D> {}

/// Owned trigger context, kept for callbacks that fire after the trigger
/// handler has returned (item actions, the close callback).
pub struct Trigger<D> {
    element: NodeId,
    data: Rc<D>,
    index: usize,
    event: PointerEvent,
}

impl<D: 'static> Trigger<D> {
    pub fn new(element: NodeId, data: D, index: usize, event: PointerEvent) -> Self {
        Self {
            element,
            data: Rc::new(data),
            index,
            event,
        }
    }

    pub fn context(&self) -> Context<'_, D> {
        Context {
            element: self.element,
            data: &self.data,
            index: self.index,
            event: &self.event,
        }
    }

    pub fn event(&self) -> &PointerEvent {
        &self.event
    }

    /// Binds `callback` to this trigger so it can be invoked without arguments.
    pub fn bind(&self, callback: Rc<dyn Fn(&Context<'_, D>)>) -> Rc<dyn Fn()> {
        let trigger = self.clone();
        Rc::new(move || callback(&trigger.context()))
    }
}

impl<D> Clone for Trigger<D> {
    fn clone(&self) -> Self {
        Self {
            element: self.element,
            data: Rc::clone(&self.data),
            index: self.index,
            event: self.event,
        }
    }
}

/// A field that is either a constant or computed from the trigger context.
pub enum Dynamic<D, T> {
    Literal(T),
    Factory(Rc<dyn Fn(&Context<'_, D>) -> T>),
}

impl<D, T> Dynamic<D, T> {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> T + 'static,
    {
        Dynamic::Factory(Rc::new(f))
    }

    pub fn resolve(&self, ctx: &Context<'_, D>) -> T
    where
        T: Clone,
    {
        match self {
            Dynamic::Literal(value) => value.clone(),
            Dynamic::Factory(f) => f(ctx),
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, Dynamic::Factory(_))
    }
}

impl<D, T: Clone> Clone for Dynamic<D, T> {
    fn clone(&self) -> Self {
        match self {
            Dynamic::Literal(value) => Dynamic::Literal(value.clone()),
            Dynamic::Factory(f) => Dynamic::Factory(Rc::clone(f)),
        }
    }
}

impl<D, T> From<T> for Dynamic<D, T> {
    fn from(value: T) -> Self {
        Dynamic::Literal(value)
    }
}

impl<D> From<&str> for Dynamic<D, String> {
    fn from(value: &str) -> Self {
        Dynamic::Literal(value.to_string())
    }
}

impl<D, T: fmt::Debug> fmt::Debug for Dynamic<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Dynamic::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Normalizes an optional field into something that can always be resolved.
///
/// A missing value becomes `fallback`; a factory is passed through untouched.
pub fn to_factory<D, T>(value: Option<Dynamic<D, T>>, fallback: T) -> Dynamic<D, T> {
    value.unwrap_or(Dynamic::Literal(fallback))
}
