use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use serde_json::{Map, Value};
use sprig::api::{CmdResult, ConfigAction, OutlineApi};
use sprig::commands;
use sprig::config::SprigConfig;
use sprig::error::{Result, SprigError};
use sprig::pending::Settlement;
use sprig::store::fs::JsonFileSource;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

mod args;
mod render;

use args::{Cli, Commands};
use render::{print_json, print_messages, print_tree};

const DATA_DIR_NAME: &str = ".sprig";

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

struct AppContext {
    dir: PathBuf,
    config: SprigConfig,
}

impl AppContext {
    fn api(&self) -> Result<OutlineApi<JsonFileSource>> {
        OutlineApi::open(JsonFileSource::new(&self.dir), self.config.clone())
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Init) => handle_result(commands::init::run(&ctx.dir)?),
        Some(Commands::List { json }) => handle_list(&ctx, json),
        Some(Commands::Show { id, json }) => handle_show(&ctx, &id, json),
        Some(Commands::Add { parent, fields }) => handle_add(&ctx, parent, fields),
        Some(Commands::Edit { id, fields, unset }) => handle_edit(&ctx, &id, fields, unset),
        Some(Commands::Delete { id, yes }) => handle_delete(&ctx, &id, yes),
        Some(Commands::Promote { id }) => handle_result(ctx.api()?.promote(&id)?),
        Some(Commands::Demote { id }) => handle_result(ctx.api()?.demote(&id)?),
        Some(Commands::Up { id }) => handle_result(ctx.api()?.move_up(&id)?),
        Some(Commands::Down { id }) => handle_result(ctx.api()?.move_down(&id)?),
        Some(Commands::Move { id, to }) => handle_result(ctx.api()?.move_to(&id, to.as_deref())?),
        Some(Commands::Renumber) => handle_result(ctx.api()?.renumber()?),
        Some(Commands::Doctor { fix }) => handle_result(ctx.api()?.doctor(fix)?),
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
        None => handle_list(&ctx, false),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let dir = match (&cli.dir, cli.global) {
        (Some(dir), _) => dir.clone(),
        (None, true) => ProjectDirs::from("com", "sprig", "sprig")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| SprigError::Config("Could not determine the user data dir".into()))?,
        (None, false) => std::env::current_dir()?.join(DATA_DIR_NAME),
    };
    let config = SprigConfig::load(&dir)?;
    tracing::debug!(dir = %dir.display(), "using data directory");
    Ok(AppContext { dir, config })
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // RUST_LOG wins over -v when set
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

fn handle_result(result: CmdResult) -> Result<()> {
    print_messages(&result.messages);
    Ok(())
}

fn handle_list(ctx: &AppContext, json: bool) -> Result<()> {
    let result = ctx.api()?.list()?;
    if json {
        return print_json(&result.listed);
    }
    print_tree(&result.listed, &ctx.config);
    print_messages(&result.messages);
    Ok(())
}

fn handle_show(ctx: &AppContext, id: &str, json: bool) -> Result<()> {
    let result = ctx.api()?.show(id)?;
    if json {
        return print_json(&result.listed);
    }
    print_tree(&result.listed, &ctx.config);
    Ok(())
}

fn handle_add(ctx: &AppContext, parent: Option<String>, fields: Vec<String>) -> Result<()> {
    let fields = parse_fields(&fields, &ctx.config.title_field)?;
    let result = ctx.api()?.insert(parent.as_deref(), fields)?;
    handle_result(result)
}

fn handle_edit(ctx: &AppContext, id: &str, fields: Vec<String>, unset: Vec<String>) -> Result<()> {
    let fields = parse_fields(&fields, &ctx.config.title_field)?;
    let result = ctx.api()?.update(id, fields, &unset)?;
    handle_result(result)
}

fn handle_delete(ctx: &AppContext, id: &str, yes: bool) -> Result<()> {
    let mut api = ctx.api()?;
    let ticket = api.request_delete(id)?;

    if !yes && !confirm(&api, id)? {
        api.cancel_delete(ticket)?;
        print_messages(&[sprig::api::CmdMessage::info("Operation cancelled.")]);
        return Ok(());
    }

    match api.confirm_delete(ticket)? {
        Settlement::Applied(result) => handle_result(result),
        Settlement::AlreadySettled => Ok(()),
    }
}

fn confirm(api: &OutlineApi<JsonFileSource>, id: &str) -> Result<bool> {
    let shown = api.show(id)?;
    let count: usize = shown.listed.iter().map(|node| node.size()).sum();
    println!("This will delete the following record(s):");
    print_tree(&shown.listed, api.config());
    if count > 1 {
        println!(
            "{}",
            format!("Delete policy: {}", api.config().delete_policy).dimmed()
        );
    }
    print!("[Y] To delete: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == "Y")
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = commands::config::run(&ctx.dir, action)?;
    if show_all {
        if let Some(config) = &result.config {
            for key in SprigConfig::KEYS {
                println!("{} = {}", key, config.get(key)?);
            }
        }
    }
    print_messages(&result.messages);
    Ok(())
}

/// Turns `key=value` arguments into record fields.
///
/// Values that parse as JSON (numbers, booleans, quoted strings, arrays) are
/// stored as such; anything else is a string. Arguments without `=` are joined
/// into the title field.
fn parse_fields(args: &[String], title_field: &str) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    let mut title_words: Vec<&str> = Vec::new();

    for arg in args {
        match arg.split_once('=') {
            Some((key, raw)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(SprigError::Api(format!("Missing field name in '{}'", arg)));
                }
                let value = serde_json::from_str::<Value>(raw)
                    .unwrap_or_else(|_| Value::String(raw.to_string()));
                fields.insert(key.to_string(), value);
            }
            None => title_words.push(arg),
        }
    }

    if !title_words.is_empty() {
        fields.insert(title_field.to_string(), Value::String(title_words.join(" ")));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fields_parse_json_or_fall_back_to_text() {
        let fields = parse_fields(&args(&["done=true", "points=3", "owner=ana"]), "name").unwrap();
        assert_eq!(fields["done"], json!(true));
        assert_eq!(fields["points"], json!(3));
        assert_eq!(fields["owner"], json!("ana"));
    }

    #[test]
    fn bare_words_become_the_title() {
        let fields = parse_fields(&args(&["Write", "the", "plan", "due=friday"]), "name").unwrap();
        assert_eq!(fields["name"], json!("Write the plan"));
        assert_eq!(fields["due"], json!("friday"));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(parse_fields(&args(&["=x"]), "name").is_err());
    }
}
