use std::{env, fs, path::Path, path::PathBuf, rc::Rc};

use anyhow::{anyhow, Context as _, Result};
use serde::Deserialize;

use crate::menu::{MenuConfig, MenuItem, Position};
use crate::resolve::Context;

/// A menu described in JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuFile {
    /// Container theme class; the library default applies when absent.
    #[serde(default)]
    pub theme: Option<String>,

    /// Fixed position. When absent the menu opens at the pointer.
    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemSpec {
    #[serde(default)]
    pub title: Option<String>,

    /// Identifier handed to the action sink when the item is clicked.
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub divider: bool,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub children: Option<Vec<ItemSpec>>,
}

/// Receives the `action` id of a clicked item together with the trigger context.
pub type ActionSink<D> = Rc<dyn Fn(&str, &Context<'_, D>)>;

impl MenuFile {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing menu JSON")
    }

    /// Builds the menu items and options this file describes.
    pub fn into_menu<D: 'static>(self, sink: ActionSink<D>) -> (Vec<MenuItem<D>>, MenuConfig<D>) {
        let items = self.items.iter().map(|spec| spec.to_item(&sink)).collect();

        let mut config = MenuConfig::new();
        if let Some(theme) = self.theme {
            config = config.theme(theme);
        }
        if let Some(position) = self.position {
            config = config.position(Some(position));
        }
        (items, config)
    }
}

impl ItemSpec {
    pub fn to_item<D: 'static>(&self, sink: &ActionSink<D>) -> MenuItem<D> {
        if self.divider {
            return MenuItem::divider();
        }

        let mut item = MenuItem::new(self.title.clone().unwrap_or_default()).disabled(self.disabled);
        if let Some(id) = self.action.clone() {
            let sink = Rc::clone(sink);
            item = item.action(move |ctx| sink(id.as_str(), ctx));
        }
        if let Some(children) = &self.children {
            item = item.children(children.iter().map(|c| c.to_item(sink)).collect());
        }
        item
    }
}

pub fn load(path: &Path) -> Result<MenuFile> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading menu {}", path.display()))?;
    let menu: MenuFile =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    log::debug!("loaded {} top-level items from {}", menu.items.len(), path.display());
    Ok(menu)
}

pub fn load_optional() -> Result<Option<MenuFile>> {
    let Some(path) = resolve_menu_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load(&path).map(Some)
}

pub fn resolve_menu_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("D3CM_MENU") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    let local = PathBuf::from("menu.json");
    if local.exists() {
        return Some(local);
    }

    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("d3cm").join("menu.json"));
    }

    if let Some(home) = env::var_os("HOME") {
        return Some(PathBuf::from(home).join(".config").join("d3cm").join("menu.json"));
    }

    None
}

/// Writes a starter menu to `path` unless a file is already there.
pub fn ensure_menu_file_exists(path: Option<PathBuf>) -> Result<PathBuf> {
    let Some(path) = path.or_else(resolve_menu_path) else {
        return Err(anyhow!(
            "No menu path available (set D3CM_MENU or ensure XDG_CONFIG_HOME/HOME is present)"
        ));
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create menu dir {}", parent.display()))?;
    }

    if !path.exists() {
        let template = serde_json::json!({
            "items": [
                { "title": "Open", "action": "open" },
                { "title": "Rename", "action": "rename", "disabled": true },
                { "divider": true },
                { "title": "Export", "children": [
                    { "title": "As PNG", "action": "export-png" },
                    { "title": "As SVG", "action": "export-svg" }
                ]}
            ]
        });
        let mut s = serde_json::to_string_pretty(&template).context("serialize menu template")?;
        s.push('\n');
        fs::write(&path, s.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    }

    Ok(path)
}
