use std::rc::Rc;

use serde::Deserialize;

use crate::resolve::{Context, Dynamic};

pub const DEFAULT_THEME: &str = "d3-context-menu-theme";

/// Page coordinates of the menu's top-left corner, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

pub type OpenCallback<D> = Rc<dyn Fn(&Context<'_, D>) -> bool>;
pub type CloseCallback<D> = Rc<dyn Fn(&Context<'_, D>)>;

/// Per-menu options. Unset fields fall back to the defaults when the
/// handler is built.
pub struct MenuConfig<D> {
    /// Runs before the menu is shown; returning `false` keeps it hidden.
    pub on_open: Option<OpenCallback<D>>,
    /// Runs whenever the menu closes, for any reason.
    pub on_close: Option<CloseCallback<D>>,
    /// Overrides the pointer-derived position when it resolves to `Some`.
    pub position: Option<Dynamic<D, Option<Position>>>,
    /// Extra class on the container; defaults to [`DEFAULT_THEME`].
    pub theme: Option<Dynamic<D, String>>,
}

impl<D> Default for MenuConfig<D> {
    fn default() -> Self {
        Self {
            on_open: None,
            on_close: None,
            position: None,
            theme: None,
        }
    }
}

impl<D> MenuConfig<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a config that only has an open callback.
    pub fn opening<F>(on_open: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> bool + 'static,
    {
        Self::new().on_open(on_open)
    }

    pub fn on_open<F>(mut self, on_open: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> bool + 'static,
    {
        self.on_open = Some(Rc::new(on_open));
        self
    }

    pub fn on_close<F>(mut self, on_close: F) -> Self
    where
        F: Fn(&Context<'_, D>) + 'static,
    {
        self.on_close = Some(Rc::new(on_close));
        self
    }

    pub fn position(mut self, position: impl Into<Dynamic<D, Option<Position>>>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn at(self, left: f64, top: f64) -> Self {
        self.position(Some(Position { left, top }))
    }

    pub fn theme(mut self, theme: impl Into<Dynamic<D, String>>) -> Self {
        self.theme = Some(theme.into());
        self
    }
}
