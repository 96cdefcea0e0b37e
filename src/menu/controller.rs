//! Open/close lifecycle of the context menu.

use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::{Dom, EventKind, Listener, NodeId};
use crate::menu::item::MenuItem;
use crate::menu::options::{CloseCallback, MenuConfig, OpenCallback, Position, DEFAULT_THEME};
use crate::menu::render::{self, Binding};
use crate::resolve::{to_factory, Context, Dynamic, PointerEvent, Trigger};

/// Class of the menu container.
pub const MENU_CLASS: &str = "d3-context-menu";
/// Namespace of the dismissal listeners.
pub const NAMESPACE: &str = "d3-context-menu";

/// First argument of [`MenuController::context_menu`]: menu content, or the
/// `close` command.
pub enum MenuSource<D> {
    Items(Dynamic<D, Vec<MenuItem<D>>>),
    Close,
}

impl<D> MenuSource<D> {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> Vec<MenuItem<D>> + 'static,
    {
        MenuSource::Items(Dynamic::factory(f))
    }
}

impl<D> From<Vec<MenuItem<D>>> for MenuSource<D> {
    fn from(items: Vec<MenuItem<D>>) -> Self {
        MenuSource::Items(Dynamic::Literal(items))
    }
}

impl<D> From<Dynamic<D, Vec<MenuItem<D>>>> for MenuSource<D> {
    fn from(items: Dynamic<D, Vec<MenuItem<D>>>) -> Self {
        MenuSource::Items(items)
    }
}

struct OpenMenu {
    close_callback: Box<dyn FnOnce()>,
    actions: HashMap<NodeId, Rc<dyn Fn()>>,
}

/// Owner of the one menu that may be open at a time.
///
/// Every way a menu can go away (outside mousedown, right-click on the menu,
/// a new trigger, an explicit close, an item action) ends in [`close`].
///
/// [`close`]: MenuController::close
#[derive(Default)]
pub struct MenuController {
    open: Option<OpenMenu>,
}

impl MenuController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Builds a trigger handler, or runs the `close` command.
    pub fn context_menu<D: 'static>(
        &mut self,
        dom: &mut dyn Dom,
        source: impl Into<MenuSource<D>>,
        config: MenuConfig<D>,
    ) -> Option<ContextMenu<D>> {
        match source.into() {
            MenuSource::Close => {
                self.close(dom);
                None
            }
            MenuSource::Items(items) => Some(ContextMenu::new(items, config)),
        }
    }

    /// Tears down the open menu, if any, and runs its close callback.
    pub fn close(&mut self, dom: &mut dyn Dom) {
        let Some(menu) = self.open.take() else {
            return;
        };
        for container in dom.select_all(MENU_CLASS) {
            dom.remove(container);
        }
        let body = dom.body();
        dom.off(body, EventKind::MouseDown, NAMESPACE, true);
        log::debug!("context menu closed");
        (menu.close_callback)();
    }

    /// Delivers a host event to the listeners the menu has installed.
    pub fn dispatch(&mut self, dom: &mut dyn Dom, target: NodeId, kind: EventKind, event: &mut PointerEvent) {
        for (current, listener) in dom.propagation_path(target, kind) {
            match listener {
                Listener::Dismiss => self.close(dom),
                Listener::DismissFromMenu => {
                    self.close(dom);
                    event.prevent_default();
                    event.stop_propagation();
                }
                // Only the clicked row reacts; ancestor rows never see it.
                Listener::ClickItem => {
                    self.activate(dom, current);
                    break;
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
    }

    fn activate(&mut self, dom: &mut dyn Dom, row: NodeId) {
        let Some(action) = self.open.as_ref().and_then(|m| m.actions.get(&row).cloned()) else {
            return;
        };
        log::debug!("context menu item {} activated", row.to_raw());
        action();
        self.close(dom);
    }

    fn install(&mut self, close_callback: Box<dyn FnOnce()>) {
        self.open = Some(OpenMenu {
            close_callback,
            actions: HashMap::new(),
        });
    }

    fn bind_actions(&mut self, bindings: Vec<Binding>) {
        if let Some(menu) = self.open.as_mut() {
            menu.actions.extend(bindings);
        }
    }
}

/// Handler for "context menu requested" on an element.
pub struct ContextMenu<D> {
    items: Dynamic<D, Vec<MenuItem<D>>>,
    on_open: Option<OpenCallback<D>>,
    on_close: Option<CloseCallback<D>>,
    position: Dynamic<D, Option<Position>>,
    theme: Dynamic<D, String>,
}

impl<D: 'static> ContextMenu<D> {
    pub fn new(items: impl Into<Dynamic<D, Vec<MenuItem<D>>>>, config: MenuConfig<D>) -> Self {
        Self {
            items: items.into(),
            on_open: config.on_open,
            on_close: config.on_close,
            position: to_factory(config.position, None),
            theme: to_factory(config.theme, DEFAULT_THEME.to_string()),
        }
    }

    /// Opens the menu for `element`, closing whatever menu was open before.
    pub fn handle(
        &self,
        controller: &mut MenuController,
        dom: &mut dyn Dom,
        element: NodeId,
        data: D,
        index: usize,
        event: &mut PointerEvent,
    ) {
        controller.close(dom);

        let trigger = Trigger::new(element, data, index, *event);
        controller.install(self.bound_close(&trigger));
        let ctx = trigger.context();

        let root = dom.document_element();
        if dom.select_all(MENU_CLASS).is_empty() {
            let container = dom.append(root, "div");
            let theme = self.theme.resolve(&ctx);
            dom.set_attribute(container, "class", &format!("{MENU_CLASS} {theme}"));
        }

        let body = dom.body();
        dom.on(body, EventKind::MouseDown, NAMESPACE, true, Listener::Dismiss);

        let mut bindings = Vec::new();
        for container in dom.select_all(MENU_CLASS) {
            dom.on(container, EventKind::ContextMenu, NAMESPACE, false, Listener::DismissFromMenu);
            let list = dom.append(container, "ul");
            let items = self.items.resolve(&ctx);
            render::build_level(dom, list, &items, &trigger, 0, &mut bindings);
        }
        controller.bind_actions(bindings);

        if let Some(on_open) = &self.on_open {
            if !on_open(&ctx) {
                log::debug!("context menu for element {} held back by on_open", element.to_raw());
                return;
            }
        }

        let position = self.position.resolve(&ctx).unwrap_or(Position {
            left: trigger.event().page_x - 2.0,
            top: trigger.event().page_y - 2.0,
        });

        if let Some(&container) = dom.select_all(MENU_CLASS).first() {
            dom.set_style(container, "left", &format!("{}px", position.left));
            dom.set_style(container, "top", &format!("{}px", position.top));
            dom.set_style(container, "display", "block");
        }
        log::debug!(
            "context menu opened for element {} at ({}, {})",
            element.to_raw(),
            position.left,
            position.top
        );

        event.prevent_default();
        event.stop_propagation();
    }

    fn bound_close(&self, trigger: &Trigger<D>) -> Box<dyn FnOnce()> {
        let on_close = self.on_close.clone();
        let trigger = trigger.clone();
        Box::new(move || {
            if let Some(on_close) = on_close {
                on_close(&trigger.context());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dom::MemoryDom;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn record(log: &Log, entry: &str) -> impl Fn(&Context<'_, String>) + 'static {
        let log = Rc::clone(log);
        let entry = entry.to_string();
        move |ctx| {
            log.borrow_mut()
                .push(format!("{entry}:{}:{}", ctx.data, ctx.index))
        }
    }

    fn sample_items(log: &Log) -> Vec<MenuItem<String>> {
        vec![
            MenuItem::new("A").action(record(log, "A")),
            MenuItem::divider(),
            MenuItem::new("B").children(vec![MenuItem::new("C").action(record(log, "C"))]),
        ]
    }

    struct Page {
        dom: MemoryDom,
        controller: MenuController,
        target: NodeId,
    }

    impl Page {
        fn new() -> Self {
            let mut dom = MemoryDom::new();
            let body = dom.body();
            let target = dom.append(body, "circle");
            Self {
                dom,
                controller: MenuController::new(),
                target,
            }
        }

        fn open(&mut self, menu: &ContextMenu<String>, data: &str, index: usize) -> PointerEvent {
            let mut event = PointerEvent::at(100.0, 50.0);
            menu.handle(
                &mut self.controller,
                &mut self.dom,
                self.target,
                data.to_string(),
                index,
                &mut event,
            );
            event
        }

        fn container(&self) -> Option<NodeId> {
            self.dom.select_all(MENU_CLASS).first().copied()
        }

        fn rows(&self, list: NodeId) -> Vec<NodeId> {
            self.dom.children_by_tag(list, "li")
        }

        fn top_rows(&self) -> Vec<NodeId> {
            let container = self.container().expect("menu container");
            let list = self.dom.children_by_tag(container, "ul")[0];
            self.rows(list)
        }

        fn fire(&mut self, target: NodeId, kind: EventKind) -> PointerEvent {
            let mut event = PointerEvent::at(0.0, 0.0);
            self.controller.dispatch(&mut self.dom, target, kind, &mut event);
            event
        }
    }

    #[test]
    fn renders_nested_markup() {
        let log = recorder();
        let mut page = Page::new();
        let menu = ContextMenu::new(sample_items(&log), MenuConfig::new());
        page.open(&menu, "d", 0);

        let rows = page.top_rows();
        assert_eq!(rows.len(), 3);

        assert_eq!(page.dom.html(rows[0]), "A");
        assert!(page.dom.classes(rows[0]).is_empty());

        assert_eq!(page.dom.classes(rows[1]), ["is-divider".to_string()]);
        assert_eq!(page.dom.html(rows[1]), "<hr>");

        assert!(page.dom.has_class(rows[2], "is-parent"));
        let nested = page.dom.children_by_tag(rows[2], "ul");
        assert_eq!(nested.len(), 1);
        assert!(page.dom.has_class(nested[0], "is-children"));
        let nested_rows = page.rows(nested[0]);
        assert_eq!(nested_rows.len(), 1);
        assert_eq!(page.dom.html(nested_rows[0]), "C");
    }

    #[test]
    fn container_is_sibling_of_body_with_default_theme() {
        let mut page = Page::new();
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("only")], MenuConfig::new());
        page.open(&menu, "d", 0);

        let container = page.container().unwrap();
        let root = page.dom.document_element();
        assert!(page.dom.children(root).contains(&container));
        assert_eq!(
            page.dom.attribute(container, "class").as_deref(),
            Some("d3-context-menu d3-context-menu-theme")
        );
    }

    #[test]
    fn theme_factory_sees_trigger_data() {
        let mut page = Page::new();
        let config = MenuConfig::new().theme(Dynamic::factory(|ctx: &Context<'_, String>| {
            format!("theme-{}", ctx.data)
        }));
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("x")], config);
        page.open(&menu, "dark", 0);
        let container = page.container().unwrap();
        assert!(page.dom.has_class(container, "theme-dark"));
    }

    #[test]
    fn click_runs_action_once_then_closes() {
        let log = recorder();
        let closes = recorder();
        let mut page = Page::new();
        let menu = ContextMenu::new(
            sample_items(&log),
            MenuConfig::new().on_close(record(&closes, "close")),
        );
        page.open(&menu, "node-7", 7);

        let first = page.top_rows()[0];
        page.fire(first, EventKind::Click);

        assert_eq!(*log.borrow(), vec!["A:node-7:7"]);
        assert_eq!(*closes.borrow(), vec!["close:node-7:7"]);
        assert!(!page.controller.is_open());
        assert!(page.container().is_none());
    }

    #[test]
    fn nested_click_runs_only_the_clicked_item() {
        let log = recorder();
        let mut page = Page::new();
        let items = vec![MenuItem::new("B")
            .action(record(&log, "B"))
            .children(vec![MenuItem::new("C").action(record(&log, "C"))])];
        let menu = ContextMenu::new(items, MenuConfig::new());
        page.open(&menu, "d", 1);

        let parent = page.top_rows()[0];
        let nested = page.dom.children_by_tag(parent, "ul")[0];
        let child = page.rows(nested)[0];
        page.fire(child, EventKind::Click);

        assert_eq!(*log.borrow(), vec!["C:d:1"]);
        assert!(!page.controller.is_open());
    }

    #[test]
    fn disabled_and_header_clicks_are_ignored() {
        let log = recorder();
        let mut page = Page::new();
        let items = vec![
            MenuItem::new("off").action(record(&log, "off")).disabled(true),
            MenuItem::new("Section"),
            MenuItem::divider(),
        ];
        let menu = ContextMenu::new(items, MenuConfig::new());
        page.open(&menu, "d", 0);

        let rows = page.top_rows();
        assert!(page.dom.has_class(rows[0], "is-disabled"));
        assert!(page.dom.has_class(rows[1], "is-header"));
        for row in rows {
            page.fire(row, EventKind::Click);
        }

        assert!(log.borrow().is_empty());
        assert!(page.controller.is_open());
        assert!(page.container().is_some());
    }

    #[test]
    fn dynamic_fields_resolve_against_trigger() {
        let mut page = Page::new();
        let items = MenuSource::factory(|ctx: &Context<'_, String>| {
            vec![
                MenuItem::with_title(Dynamic::factory(|ctx: &Context<'_, String>| {
                    format!("Delete {}", ctx.data)
                }))
                .disabled(Dynamic::factory(|ctx: &Context<'_, String>| ctx.index == 0)),
                MenuItem::<String>::new("More").children_with(|ctx| {
                    (ctx.index > 0).then(|| vec![MenuItem::new("Nested")])
                }),
                MenuItem::new(format!("row {}", ctx.index)),
            ]
        });
        let MenuSource::Items(items) = items else {
            unreachable!()
        };
        let menu = ContextMenu::new(items, MenuConfig::new());

        page.open(&menu, "alpha", 0);
        let rows = page.top_rows();
        assert_eq!(page.dom.html(rows[0]), "Delete alpha");
        assert!(page.dom.has_class(rows[0], "is-disabled"));
        assert!(page.dom.has_class(rows[1], "is-header"));
        assert_eq!(page.dom.html(rows[2]), "row 0");

        page.open(&menu, "beta", 2);
        let rows = page.top_rows();
        assert!(!page.dom.has_class(rows[0], "is-disabled"));
        assert!(page.dom.has_class(rows[1], "is-parent"));
        assert_eq!(page.dom.html(rows[2]), "row 2");
    }

    #[test]
    fn empty_children_still_make_a_parent() {
        let mut page = Page::new();
        let menu = ContextMenu::new(
            vec![MenuItem::<String>::new("Empty").children(Vec::new())],
            MenuConfig::new(),
        );
        page.open(&menu, "d", 0);
        let row = page.top_rows()[0];
        assert!(page.dom.has_class(row, "is-parent"));
        let nested = page.dom.children_by_tag(row, "ul")[0];
        assert!(page.rows(nested).is_empty());
    }

    #[test]
    fn new_trigger_replaces_open_menu() {
        let closes = recorder();
        let mut page = Page::new();
        let menu = ContextMenu::new(
            vec![MenuItem::<String>::new("x")],
            MenuConfig::new().on_close(record(&closes, "close")),
        );

        page.open(&menu, "first", 0);
        page.open(&menu, "second", 1);
        assert_eq!(*closes.borrow(), vec!["close:first:0"]);
        assert_eq!(page.dom.select_all(MENU_CLASS).len(), 1);
        assert!(page.controller.is_open());

        page.open(&menu, "third", 2);
        assert_eq!(*closes.borrow(), vec!["close:first:0", "close:second:1"]);
        assert_eq!(page.dom.select_all(MENU_CLASS).len(), 1);
    }

    #[test]
    fn close_command() {
        let closes = recorder();
        let mut page = Page::new();

        let none = page
            .controller
            .context_menu::<String>(&mut page.dom, MenuSource::Close, MenuConfig::new());
        assert!(none.is_none());
        assert!(!page.controller.is_open());

        let menu = page
            .controller
            .context_menu(
                &mut page.dom,
                vec![MenuItem::<String>::new("x")],
                MenuConfig::new().on_close(record(&closes, "close")),
            )
            .expect("handler");
        page.open(&menu, "d", 3);
        assert!(page.controller.is_open());

        page.controller
            .context_menu::<String>(&mut page.dom, MenuSource::Close, MenuConfig::new());
        assert!(!page.controller.is_open());
        assert!(page.container().is_none());
        assert_eq!(*closes.borrow(), vec!["close:d:3"]);

        page.controller.close(&mut page.dom);
        assert_eq!(closes.borrow().len(), 1);
    }

    #[test]
    fn outside_mousedown_dismisses_inside_does_not() {
        let closes = recorder();
        let mut page = Page::new();
        let menu = ContextMenu::new(
            vec![MenuItem::<String>::new("x")],
            MenuConfig::new().on_close(record(&closes, "close")),
        );
        page.open(&menu, "d", 0);

        let row = page.top_rows()[0];
        page.fire(row, EventKind::MouseDown);
        assert!(page.controller.is_open());

        let target = page.target;
        page.fire(target, EventKind::MouseDown);
        assert!(!page.controller.is_open());
        assert_eq!(closes.borrow().len(), 1);
        let body = page.dom.body();
        assert_eq!(page.dom.listener_count(body), 0);
    }

    #[test]
    fn right_click_on_menu_dismisses_and_suppresses() {
        let mut page = Page::new();
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("x")], MenuConfig::new());
        page.open(&menu, "d", 0);

        let row = page.top_rows()[0];
        let event = page.fire(row, EventKind::ContextMenu);
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert!(!page.controller.is_open());
    }

    #[test]
    fn default_position_follows_pointer() {
        let mut page = Page::new();
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("x")], MenuConfig::new());
        let event = page.open(&menu, "d", 0);

        let container = page.container().unwrap();
        assert_eq!(page.dom.style(container, "left"), Some("98px"));
        assert_eq!(page.dom.style(container, "top"), Some("48px"));
        assert_eq!(page.dom.style(container, "display"), Some("block"));
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
    }

    #[test]
    fn configured_position_overrides_pointer() {
        let mut page = Page::new();
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("x")], MenuConfig::new().at(10.0, 20.0));
        page.open(&menu, "d", 0);
        let container = page.container().unwrap();
        assert_eq!(page.dom.style(container, "left"), Some("10px"));
        assert_eq!(page.dom.style(container, "top"), Some("20px"));

        let config = MenuConfig::new().position(Dynamic::factory(|ctx: &Context<'_, String>| {
            Some(Position {
                left: ctx.index as f64 * 5.0,
                top: ctx.event.page_y,
            })
        }));
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("x")], config);
        page.open(&menu, "d", 4);
        let container = page.container().unwrap();
        assert_eq!(page.dom.style(container, "left"), Some("20px"));
        assert_eq!(page.dom.style(container, "top"), Some("50px"));
    }

    #[test]
    fn on_open_false_keeps_menu_hidden_but_dismissable() {
        let opens = recorder();
        let closes = recorder();
        let mut page = Page::new();
        let seen = Rc::clone(&opens);
        let config = MenuConfig::opening(move |ctx: &Context<'_, String>| {
            seen.borrow_mut().push(ctx.data.clone());
            false
        })
        .on_close(record(&closes, "close"));
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("x")], config);

        let event = page.open(&menu, "d", 0);
        assert_eq!(*opens.borrow(), vec!["d"]);
        assert!(!event.default_prevented());
        assert!(page.controller.is_open());
        let container = page.container().expect("menu stays attached");
        assert_eq!(page.dom.style(container, "display"), None);
        assert_eq!(page.dom.style(container, "left"), None);

        let target = page.target;
        page.fire(target, EventKind::MouseDown);
        assert!(!page.controller.is_open());
        assert_eq!(*closes.borrow(), vec!["close:d:0"]);
    }

    #[test]
    fn stale_rows_do_nothing_after_close() {
        let log = recorder();
        let mut page = Page::new();
        let menu = ContextMenu::new(sample_items(&log), MenuConfig::new());
        page.open(&menu, "d", 0);
        let first = page.top_rows()[0];

        page.controller.close(&mut page.dom);
        page.fire(first, EventKind::Click);
        assert!(log.borrow().is_empty());
    }
    #[test]
    fn inert_child_rows_do_not_reach_parent_action() {
        let log = recorder();
        let mut page = Page::new();
        let items = vec![MenuItem::new("B").action(record(&log, "B")).children(vec![
            MenuItem::new("C").action(record(&log, "C")).disabled(true),
            MenuItem::new("Hdr"),
            MenuItem::divider(),
        ])];
        let menu = ContextMenu::new(items, MenuConfig::new());
        page.open(&menu, "d", 1);

        let parent = page.top_rows()[0];
        let nested = page.dom.children_by_tag(parent, "ul")[0];
        for row in page.rows(nested) {
            page.fire(row, EventKind::Click);
        }
        assert!(log.borrow().is_empty());
        assert!(page.controller.is_open());

        page.fire(parent, EventKind::Click);
        assert_eq!(*log.borrow(), vec!["B:d:1"]);
        assert!(!page.controller.is_open());
    }

    #[test]
    fn on_open_false_menu_closes_on_right_click() {
        let closes = recorder();
        let mut page = Page::new();
        let config = MenuConfig::opening(|_: &Context<'_, String>| false)
            .on_close(record(&closes, "close"));
        let menu = ContextMenu::new(vec![MenuItem::<String>::new("x")], config);
        page.open(&menu, "d", 0);
        assert!(page.controller.is_open());

        let row = page.top_rows()[0];
        let event = page.fire(row, EventKind::ContextMenu);
        assert!(event.default_prevented());
        assert!(!page.controller.is_open());
        assert!(page.container().is_none());
        assert_eq!(*closes.borrow(), vec!["close:d:0"]);
    }

    #[test]
    fn three_levels_render_and_click_deepest() {
        let log = recorder();
        let mut page = Page::new();
        let deep = log.clone();
        let items = vec![
            MenuItem::new("Top").children(vec![
                MenuItem::new("Plain"),
                MenuItem::<String>::new("Middle").children_with(move |ctx| {
                    Some(vec![
                        MenuItem::new(format!("Leaf {}", ctx.data)).action(record(&deep, "leaf")),
                        MenuItem::new(format!("Index {}", ctx.index)),
                    ])
                }),
            ]),
            MenuItem::new("Sibling").action(record(&log, "sibling")),
        ];
        let menu = ContextMenu::new(items, MenuConfig::new());
        page.open(&menu, "n9", 5);

        let top = page.top_rows();
        assert_eq!(top.len(), 2);
        let level1 = page.dom.children_by_tag(top[0], "ul")[0];
        assert!(page.dom.has_class(level1, "is-children"));
        let mid_rows = page.rows(level1);
        assert_eq!(mid_rows.len(), 2);
        assert!(page.dom.has_class(mid_rows[0], "is-header"));
        assert!(page.dom.has_class(mid_rows[1], "is-parent"));

        let level2 = page.dom.children_by_tag(mid_rows[1], "ul")[0];
        assert!(page.dom.has_class(level2, "is-children"));
        let leaves = page.rows(level2);
        assert_eq!(leaves.len(), 2);
        assert_eq!(page.dom.html(leaves[0]), "Leaf n9");
        assert_eq!(page.dom.html(leaves[1]), "Index 5");
        assert_eq!(page.dom.select_all("is-children").len(), 2);

        page.fire(leaves[0], EventKind::Click);
        assert_eq!(*log.borrow(), vec!["leaf:n9:5"]);
        assert!(!page.controller.is_open());
    }
}
