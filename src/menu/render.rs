//! Turns resolved item lists into nested `<ul>`/`<li>` markup.

use std::rc::Rc;

use crate::dom::{Dom, EventKind, Listener, NodeId};
use crate::menu::item::{ItemKind, MenuItem};
use crate::resolve::Trigger;

pub const CLASS_DIVIDER: &str = "is-divider";
pub const CLASS_DISABLED: &str = "is-disabled";
pub const CLASS_HEADER: &str = "is-header";
pub const CLASS_PARENT: &str = "is-parent";
pub const CLASS_CHILDREN: &str = "is-children";

/// Clickable row and the action it runs, already bound to the trigger.
pub(crate) type Binding = (NodeId, Rc<dyn Fn()>);

/// Appends one `<li>` per item to `parent`, recursing into children.
///
/// Rows whose click should do something are pushed to `bindings`; every row
/// gets a click listener regardless.
pub(crate) fn build_level<D: 'static>(
    dom: &mut dyn Dom,
    parent: NodeId,
    items: &[MenuItem<D>],
    trigger: &Trigger<D>,
    depth: usize,
    bindings: &mut Vec<Binding>,
) {
    let ctx = trigger.context();

    for item in items {
        let row = dom.append(parent, "li");
        dom.on(row, EventKind::Click, "", false, Listener::ClickItem);

        let (kind, children) = if item.divider.resolve(&ctx) {
            (ItemKind::Divider, None)
        } else {
            let children = item.children.resolve(&ctx);
            let kind = ItemKind::classify(children.is_some(), item.action.is_some());
            (kind, children)
        };

        if kind == ItemKind::Divider {
            log::trace!("depth {depth}: divider");
            dom.classed(row, CLASS_DIVIDER, true);
            dom.set_html(row, "<hr>");
            continue;
        }

        let disabled = item.disabled.resolve(&ctx);
        let title = item.title.resolve(&ctx);
        log::trace!("depth {depth}: {kind:?} {title:?} (disabled: {disabled})");

        dom.classed(row, CLASS_DISABLED, disabled);
        dom.classed(row, CLASS_HEADER, kind == ItemKind::Header);
        dom.classed(row, CLASS_PARENT, kind == ItemKind::Parent);
        dom.set_html(row, &title);

        if let (false, Some(action)) = (disabled, &item.action) {
            bindings.push((row, trigger.bind(Rc::clone(action))));
        }

        if let Some(children) = children {
            let list = dom.append(row, "ul");
            dom.classed(list, CLASS_CHILDREN, true);
            build_level(dom, list, &children, trigger, depth + 1, bindings);
        }
    }
}
