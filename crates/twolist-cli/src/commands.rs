//! CLI command implementations

use anyhow::{Result, bail};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};
use twolist_core::{Answer, Config, Confirm, Error, FileStorage, Item, ItemId, Mode, TodoStore};

/// Config and store location for one invocation
pub struct Context {
    config: Config,
    config_path: PathBuf,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        let mut config = Config::load(&config_path)?;
        if data_dir.is_some() {
            config.data_dir = data_dir;
        }
        if !config.display.colors {
            colored::control::set_override(false);
        }
        Ok(Self {
            config,
            config_path,
        })
    }

    fn open_store(&self) -> Result<TodoStore<FileStorage>> {
        let data_dir = self.config.data_dir()?;
        debug!(data_dir = %data_dir.display(), "opening store");
        let storage = FileStorage::new(data_dir);
        Ok(TodoStore::open(storage, self.config.load_policy)?)
    }
}

/// Asks on the terminal, defaulting to no
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        print!("{} {} [y/N] ", title.red(), message);
        if let Err(e) = std::io::stdout().flush() {
            warn!(error = %e, "could not show prompt, answering no");
            return false;
        }

        let mut input = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut input) {
            warn!(error = %e, "could not read answer, answering no");
            return false;
        }
        input.trim().eq_ignore_ascii_case("y")
    }
}

fn resolve_mode(store: &TodoStore<FileStorage>, mode: Option<String>) -> Result<Mode> {
    match mode {
        Some(m) => Ok(m.parse()?),
        None => Ok(store.mode()),
    }
}

fn find<'a>(store: &'a TodoStore<FileStorage>, id: ItemId) -> Result<&'a Item> {
    Ok(store.get(id).ok_or(Error::NotFound(id))?)
}

fn print_item(item: &Item) {
    let check = if item.is_done() { "[x]" } else { "[ ]" };
    let text = if item.is_done() {
        item.text().dimmed().strikethrough()
    } else {
        item.text().normal()
    };
    println!("{} {} {}", item.id().to_string().cyan(), check, text);
}

pub fn add(ctx: &Context, text: &str, mode: Option<String>, json: bool) -> Result<()> {
    let mut store = ctx.open_store()?;
    let mode = resolve_mode(&store, mode)?;

    let Some(id) = store.add(text, mode)? else {
        bail!("Item text cannot be empty");
    };

    if json {
        println!("{}", serde_json::to_string(find(&store, id)?)?);
    } else {
        println!("{} Added to {}: {}", "✓".green(), mode.label(), id);
    }

    Ok(())
}

pub fn list(ctx: &Context, mode: Option<String>, all: bool, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let modes = if all {
        vec![Mode::Work, Mode::Travel]
    } else {
        vec![resolve_mode(&store, mode)?]
    };

    if json {
        let items: Vec<&Item> = modes
            .iter()
            .flat_map(|&m| store.visible_items(m))
            .collect();
        println!("{}", serde_json::to_string(&items)?);
        return Ok(());
    }

    for (n, mode) in modes.into_iter().enumerate() {
        if n > 0 {
            println!();
        }

        let header = if ctx.config.display.show_counts {
            let (open, done) = store.counts(mode);
            format!("{} ({} open, {} done)", mode.label(), open, done)
        } else {
            mode.label().to_string()
        };
        println!("{}", header.bold());

        let mut any = false;
        for item in store.visible_items(mode) {
            print_item(item);
            any = true;
        }
        if !any {
            println!("  {}", mode.placeholder().dimmed());
        }
    }

    Ok(())
}

pub fn show(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let item = find(&store, id.parse()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{} {}", item.id().to_string().cyan().bold(), item.text().bold());
        println!();
        println!("List:     {}", item.mode().label());
        println!("Done:     {}", if item.is_done() { "yes" } else { "no" });
        if let Some(created) = item.id().created_at() {
            let local = created.with_timezone(&chrono::Local);
            println!("Created:  {}", local.format(&ctx.config.display.date_format));
        }
    }

    Ok(())
}

pub fn done(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let mut store = ctx.open_store()?;
    let id: ItemId = id.parse()?;

    if !store.toggle_done(id)? {
        return Err(Error::NotFound(id).into());
    }
    let item = find(&store, id)?;

    if json {
        println!("{}", serde_json::to_string(item)?);
    } else if item.is_done() {
        println!("{} Done: {}", "✓".green(), item.text());
    } else {
        println!("{} Reopened: {}", "✓".green(), item.text());
    }

    Ok(())
}

pub fn edit(ctx: &Context, id: &str, text: &str, json: bool) -> Result<()> {
    let mut store = ctx.open_store()?;
    let id: ItemId = id.parse()?;
    find(&store, id)?;

    if !store.edit_text(id, text)? {
        bail!("Item text cannot be empty");
    }

    if json {
        println!("{}", serde_json::to_string(find(&store, id)?)?);
    } else {
        println!("{} Updated {}", "✓".green(), id);
    }

    Ok(())
}

pub fn rm(ctx: &Context, id: &str, yes: bool, json: bool) -> Result<()> {
    let mut store = ctx.open_store()?;
    let id: ItemId = id.parse()?;
    find(&store, id)?;

    let removed = if yes {
        store.remove(id, &mut Answer::Yes)?
    } else {
        store.remove(id, &mut StdinConfirm)?
    };

    if json {
        println!("{}", serde_json::json!({ "id": id, "removed": removed }));
    } else if removed {
        println!("{} Deleted {}", "✓".green(), id);
    } else {
        println!("Aborted");
    }

    Ok(())
}

pub fn mode(ctx: &Context, mode: Option<String>, json: bool) -> Result<()> {
    let mut store = ctx.open_store()?;

    if let Some(m) = mode {
        store.set_mode(m.parse()?)?;
    }

    if json {
        println!("{}", serde_json::json!({ "mode": store.mode().to_string() }));
    } else {
        println!("{}", store.mode().label());
    }

    Ok(())
}

/// Show current configuration
pub fn config_show(ctx: &Context, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        println!("data_dir = \"{}\"", ctx.config.data_dir()?.display());
        println!("load_policy = \"{}\"", ctx.config.load_policy);
        println!();
        println!("[display]");
        println!("colors = {}", ctx.config.display.colors);
        println!("date_format = \"{}\"", ctx.config.display.date_format);
        println!("show_counts = {}", ctx.config.display.show_counts);
    }

    Ok(())
}

/// Print where config and data live
pub fn config_path(ctx: &Context, json: bool) -> Result<()> {
    let data_dir = ctx.config.data_dir()?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "config": ctx.config_path, "data_dir": data_dir })
        );
    } else {
        println!("Config: {}", ctx.config_path.display());
        println!("Data:   {}", data_dir.display());
    }

    Ok(())
}

/// Reset configuration to defaults
pub fn config_reset(ctx: &Context) -> Result<()> {
    if let Some(parent) = ctx.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&ctx.config_path, Config::default_with_comments())?;

    println!("{} Configuration reset to defaults", "✓".green());
    Ok(())
}
