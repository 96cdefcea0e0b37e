//! Context menu: item descriptions, options, rendering and lifecycle.

pub mod controller;
pub mod item;
pub mod options;
pub mod render;

pub use controller::{ContextMenu, MenuController, MenuSource, MENU_CLASS};
pub use item::{Action, ItemKind, MenuItem};
pub use options::{MenuConfig, Position, DEFAULT_THEME};
