//! Nested, data-driven context menus for DOM-like documents.
//!
//! A [`ContextMenu`](menu::ContextMenu) handler is built from a list of
//! [`MenuItem`](menu::MenuItem)s and a [`MenuConfig`](menu::MenuConfig), and is
//! invoked when an element asks for a context menu. A single
//! [`MenuController`](menu::MenuController) makes sure at most one menu is
//! open at a time.

pub mod config;
pub mod dom;
pub mod menu;
pub mod resolve;
