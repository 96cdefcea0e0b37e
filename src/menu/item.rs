//! Menu item descriptions.

use std::fmt;
use std::rc::Rc;

use crate::resolve::{Context, Dynamic};

pub type Action<D> = Rc<dyn Fn(&Context<'_, D>)>;

/// One node of the menu tree. Every field except `action` may be computed
/// from the trigger context.
pub struct MenuItem<D> {
    /// HTML content of the row. Not evaluated for dividers.
    pub title: Dynamic<D, String>,
    /// Invoked on click. Items without one (and without children) are headers.
    pub action: Option<Action<D>>,
    pub divider: Dynamic<D, bool>,
    pub disabled: Dynamic<D, bool>,
    /// Nested items. `Some` (even when empty) makes the row a submenu parent.
    pub children: Dynamic<D, Option<Vec<MenuItem<D>>>>,
}

/// What a resolved item renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Divider,
    Parent,
    Header,
    Actionable,
}

impl ItemKind {
    /// Kind of a non-divider row. Dividers are decided before anything else
    /// about the item is evaluated.
    pub fn classify(has_children: bool, has_action: bool) -> Self {
        match (has_children, has_action) {
            (true, _) => ItemKind::Parent,
            (false, false) => ItemKind::Header,
            (false, true) => ItemKind::Actionable,
        }
    }
}

impl<D> MenuItem<D> {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_title(Dynamic::Literal(title.into()))
    }

    pub fn with_title(title: Dynamic<D, String>) -> Self {
        Self {
            title,
            action: None,
            divider: Dynamic::Literal(false),
            disabled: Dynamic::Literal(false),
            children: Dynamic::Literal(None),
        }
    }

    pub fn divider() -> Self {
        Self {
            divider: Dynamic::Literal(true),
            ..Self::with_title(Dynamic::Literal(String::new()))
        }
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Context<'_, D>) + 'static,
    {
        self.action = Some(Rc::new(action));
        self
    }

    pub fn disabled(mut self, disabled: impl Into<Dynamic<D, bool>>) -> Self {
        self.disabled = disabled.into();
        self
    }

    pub fn divider_when(mut self, divider: Dynamic<D, bool>) -> Self {
        self.divider = divider;
        self
    }

    pub fn children(mut self, children: Vec<MenuItem<D>>) -> Self {
        self.children = Dynamic::Literal(Some(children));
        self
    }

    pub fn children_with<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> Option<Vec<MenuItem<D>>> + 'static,
    {
        self.children = Dynamic::factory(factory);
        self
    }
}

impl<D> Clone for MenuItem<D> {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            action: self.action.clone(),
            divider: self.divider.clone(),
            disabled: self.disabled.clone(),
            children: self.children.clone(),
        }
    }
}

impl<D> fmt::Debug for MenuItem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("title", &self.title)
            .field("action", &self.action.as_ref().map(|_| ".."))
            .field("divider", &self.divider)
            .field("disabled", &self.disabled)
            .field("children", &self.children)
            .finish()
    }
}
