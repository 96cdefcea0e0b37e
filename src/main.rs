use std::{cell::RefCell, path::PathBuf, rc::Rc};

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};

use d3_context_menu::{
    config::{self, ActionSink, MenuFile},
    dom::{Dom, EventKind, MemoryDom, NodeId},
    menu::{ContextMenu, MenuController, MENU_CLASS},
    resolve::{Context, PointerEvent},
};

#[derive(Parser, Debug)]
#[command(name = "d3cm", version, about = "Render and exercise context menus from JSON")]
struct Cli {
    /// Log menu lifecycle events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Opens the menu on a target element and prints the resulting markup.
    Render(Trigger),
    /// Opens the menu, clicks the item at a dotted index path (e.g. `2.0`) and
    /// prints the action ids that fired.
    Click {
        path: String,
        #[command(flatten)]
        trigger: Trigger,
    },
    /// Writes a starter menu file if none exists and prints its path.
    Init {
        path: Option<PathBuf>,
    },
    /// Prints the menu file path that would be used (if any).
    MenuPath,
}

#[derive(Args, Debug)]
struct Trigger {
    /// Menu file. Defaults to `D3CM_MENU`, `./menu.json` or the user config dir.
    #[arg(long)]
    menu: Option<PathBuf>,
    /// Pointer x in page coordinates.
    #[arg(long, default_value_t = 0.0)]
    x: f64,
    /// Pointer y in page coordinates.
    #[arg(long, default_value_t = 0.0)]
    y: f64,
    /// Datum bound to the target element.
    #[arg(long, default_value = "")]
    data: String,
    /// Index of the target element within its selection.
    #[arg(long, default_value_t = 0)]
    index: usize,
    /// Overrides the theme class from the menu file.
    #[arg(long)]
    theme: Option<String>,
}

struct Session {
    dom: MemoryDom,
    controller: MenuController,
    fired: Rc<RefCell<Vec<String>>>,
}

impl Session {
    fn open(trigger: Trigger) -> Result<Self> {
        let file = match trigger.menu.as_deref() {
            Some(path) => config::load(path)?,
            None => config::load_optional()?
                .context("no menu file found (pass --menu or run `d3cm init`)")?,
        };

        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink_log = Rc::clone(&fired);
        let sink: ActionSink<String> = Rc::new(move |id: &str, ctx: &Context<'_, String>| {
            sink_log.borrow_mut().push(id.to_string());
            log::info!("action '{id}' on datum '{}' (index {})", ctx.data, ctx.index);
        });

        let (items, mut menu_config) = MenuFile::into_menu(file, sink);
        if let Some(theme) = trigger.theme {
            menu_config = menu_config.theme(theme);
        }

        let mut dom = MemoryDom::new();
        let body = dom.body();
        let target = dom.append(body, "g");
        let mut controller = MenuController::new();

        let handler = controller
            .context_menu(&mut dom, items, menu_config)
            .context("menu handler")?;
        let mut event = PointerEvent::at(trigger.x, trigger.y);
        handler.handle(&mut controller, &mut dom, target, trigger.data, trigger.index, &mut event);

        Ok(Self {
            dom,
            controller,
            fired,
        })
    }

    fn container(&self) -> Result<NodeId> {
        self.dom
            .select_all(MENU_CLASS)
            .first()
            .copied()
            .context("menu was not rendered")
    }

    fn item_at(&self, path: &str) -> Result<NodeId> {
        let container = self.container()?;
        let mut list = *self
            .dom
            .children_by_tag(container, "ul")
            .first()
            .context("menu has no item list")?;
        let mut row = None;

        for (depth, step) in path.split('.').enumerate() {
            if depth > 0 {
                let Some(current) = row else {
                    bail!("empty item path");
                };
                list = *self
                    .dom
                    .children_by_tag(current, "ul")
                    .first()
                    .with_context(|| format!("item at depth {depth} has no children"))?;
            }
            let index: usize = step
                .trim()
                .parse()
                .with_context(|| format!("invalid path segment '{step}'"))?;
            let rows = self.dom.children_by_tag(list, "li");
            row = Some(
                *rows
                    .get(index)
                    .with_context(|| format!("no item {index} at depth {depth} ({} items)", rows.len()))?,
            );
        }

        row.context("empty item path")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match cli.command {
        Command::Render(trigger) => {
            let session = Session::open(trigger)?;
            let container = session.container()?;
            println!("{}", session.dom.outer_html(container));
        }
        Command::Click { path, trigger } => {
            let mut session = Session::open(trigger)?;
            let row = session.item_at(&path)?;
            let mut event = PointerEvent::default();
            session
                .controller
                .dispatch(&mut session.dom, row, EventKind::Click, &mut event);

            let fired = session.fired.borrow();
            if fired.is_empty() {
                println!("(no action)");
            }
            for id in fired.iter() {
                println!("{id}");
            }
            println!(
                "menu {}",
                if session.controller.is_open() {
                    "open"
                } else {
                    "closed"
                }
            );
        }
        Command::Init { path } => {
            let path = config::ensure_menu_file_exists(path)?;
            println!("{}", path.display());
        }
        Command::MenuPath => {
            if let Some(path) = config::resolve_menu_path() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
