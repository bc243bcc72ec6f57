//! Cohortree CLI - command-line admin client for the teaching hierarchy
//!
//! Usage: cohortree [OPTIONS] <COMMAND>
//!
//! Lists the college/department/batch/topic hierarchy, drives the
//! interactive picker, and bulk-creates content against every selected
//! leaf. Supports JSON output for scripting.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use cohortree_lib::{
    api::AdminApi,
    bulk::{self, BulkPlan},
    catalog::{BatchLeaf, TopicLeaf},
    entity::{Entity, Level},
    render,
    selector::{HierarchySelector, LeafSelection, SelectorConfig},
    settings, utils,
};
use chrono::{Datelike, Local, Timelike};
use std::path::PathBuf;

// ============================================================================
// Logging Infrastructure
// ============================================================================

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

pub(crate) static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Initialize logging - creates log file and cleans old logs
fn init_logging() -> Option<PathBuf> {
    let log_dir = dirs::data_dir()
        .map(|p| p.join("cohortree").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    // Clean logs older than 7 days
    if let Ok(entries) = fs::read_dir(&log_dir) {
        let cutoff = Local::now() - chrono::Duration::days(7);
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with("cohortree-") && name.ends_with(".log") {
                    // Parse date from filename: cohortree-YYYY-MM-DD.log
                    if let Some(date_str) = name
                        .strip_prefix("cohortree-")
                        .and_then(|s| s.strip_suffix(".log"))
                    {
                        if let Ok(date) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
                            if date < cutoff.date_naive() {
                                let _ = fs::remove_file(&path);
                            }
                        }
                    }
                }
            }
        }
    }

    // Create today's log file
    let today = Local::now();
    let log_filename = format!(
        "cohortree-{:04}-{:02}-{:02}.log",
        today.year(),
        today.month(),
        today.day()
    );
    let log_path = log_dir.join(&log_filename);

    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        *LOG_FILE.lock().unwrap() = Some(file);
        Some(log_path)
    } else {
        None
    }
}

/// Log to both terminal and file
#[allow(unused)]
pub(crate) fn log_both(msg: &str) {
    let now = Local::now();
    let timestamp = format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second());

    // Print to terminal
    println!("{}", msg);

    // Write to log file
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{} {}", timestamp, msg);
        }
    }
}

/// Log error to both terminal and file
#[allow(unused)]
pub(crate) fn elog_both(msg: &str) {
    let now = Local::now();
    let timestamp = format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second());

    // Print to terminal
    eprintln!("{}", msg);

    // Write to log file
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{} [ERROR] {}", timestamp, msg);
        }
    }
}

/// Macro for logging to both terminal and file
macro_rules! log {
    ($($arg:tt)*) => {
        log_both(&format!($($arg)*))
    };
}

/// Macro for error logging to both terminal and file
macro_rules! elog {
    ($($arg:tt)*) => {
        elog_both(&format!($($arg)*))
    };
}

#[path = "cli/tui.rs"]
mod tui;

// ============================================================================
// Main CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "cohortree")]
#[command(version, about = "Teaching hierarchy admin CLI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL (default: COHORTREE_API_URL or stored config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (default: COHORTREE_TOKEN or stored config)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Detailed logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entities at one level (colleges, departments, batches, topics)
    List {
        /// Level to list, plural form
        level: String,
    },
    /// Print the full hierarchy as an indented tree
    Tree {
        /// Include the topic level
        #[arg(long)]
        topics: bool,
    },
    /// Interactively pick a slice of the hierarchy
    Pick {
        /// Extend the cascade down to topics
        #[arg(long)]
        topics: bool,
        /// Print resolved leaf records instead of the id snapshot
        #[arg(long)]
        leaves: bool,
    },
    /// Create a record in every selected leaf
    Create {
        #[command(subcommand)]
        cmd: CreateCommands,
    },
    /// Configuration settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CreateCommands {
    /// Create a drive-linked note in every selected batch
    Note {
        /// Note title
        #[arg(long)]
        title: String,
        /// Google Drive link for the note content
        #[arg(long)]
        drive_link: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Create a topic in every selected batch
    Topic {
        /// Topic name
        #[arg(long)]
        name: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Create a question under every selected topic
    Question {
        /// Question title
        #[arg(long)]
        title: String,
        /// Question description
        #[arg(long)]
        description: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current settings
    List,
    /// Get a config value
    Get {
        /// Config key (api-url, auth-token)
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key (api-url, auth-token)
        key: String,
        /// New value (empty clears auth-token)
        value: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    // println! panics when the pipe closes under it, e.g.
    // `cohortree tree | head`. Exit quietly instead.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    // Initialize logging
    if let Some(log_path) = init_logging() {
        eprintln!("Logging to: {}", log_path.display());
    }

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli).await {
        elog!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<(), String> {
    let config_dir = dirs::config_dir()
        .map(|p| p.join("cohortree"))
        .unwrap_or_else(|| PathBuf::from("."));
    settings::init(config_dir);

    match cli.command {
        // No API client needed for these
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "cohortree", &mut std::io::stdout());
            Ok(())
        }
        Commands::Config { cmd } => handle_config(cmd, cli.json),
        command => {
            let base_url = cli
                .api_url
                .unwrap_or_else(settings::get_api_base_url);
            let token = cli.token.or_else(settings::get_auth_token);
            let api = AdminApi::new(&base_url, token)?;

            if cli.verbose {
                eprintln!("[verbose] Using API: {}", api.base_url());
            }

            match command {
                Commands::List { level } => handle_list(&level, &api, cli.json).await,
                Commands::Tree { topics } => handle_tree(topics, &api, cli.json).await,
                Commands::Pick { topics, leaves } => {
                    handle_pick(topics, leaves, &api, cli.json, cli.quiet, cli.verbose).await
                }
                Commands::Create { cmd } => handle_create(cmd, &api, cli.json, cli.quiet).await,
                Commands::Config { .. } | Commands::Completions { .. } => unreachable!(),
            }
        }
    }
}

// ============================================================================
// List / Tree Commands
// ============================================================================

fn parse_level_arg(s: &str) -> Result<Level, String> {
    Level::from_plural(&s.to_lowercase()).ok_or_else(|| {
        format!(
            "Unknown level: {}. Valid: colleges, departments, batches, topics",
            s
        )
    })
}

fn entity_line(entity: &Entity) -> String {
    match &entity.parent_id {
        Some(parent) => format!("{}  {}  [{}]", entity.id, entity.name, parent),
        None => format!("{}  {}", entity.id, entity.name),
    }
}

async fn handle_list(level_arg: &str, api: &AdminApi, json: bool) -> Result<(), String> {
    let level = parse_level_arg(level_arg)?;
    let entities = api.fetch_level(level).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string(&entities)
                .map_err(|e| format!("Failed to serialize: {}", e))?
        );
    } else {
        for entity in &entities {
            println!("{}", entity_line(entity));
        }
        let label = level.label().to_lowercase();
        eprintln!(
            "{}",
            utils::format_count(entities.len(), &label, level.plural())
        );
    }
    Ok(())
}

async fn handle_tree(topics: bool, api: &AdminApi, json: bool) -> Result<(), String> {
    let catalog = api.load_catalog(topics).await;

    if json {
        let mut value = serde_json::json!({
            "colleges": catalog.level(Level::College),
            "departments": catalog.level(Level::Department),
            "batches": catalog.level(Level::Batch),
        });
        if topics {
            value["topics"] = serde_json::json!(catalog.level(Level::Topic));
        }
        println!("{}", value);
    } else if catalog.is_empty(Level::College) {
        log!("No colleges available");
    } else {
        print!("{}", render::render_tree(&catalog, topics));
    }
    Ok(())
}

// ============================================================================
// Pick Command
// ============================================================================

fn batch_path(leaf: &BatchLeaf) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(college) = &leaf.college_name {
        parts.push(college);
    }
    if let Some(department) = &leaf.department_name {
        parts.push(department);
    }
    parts.push(&leaf.batch_name);
    format!("{}  {}", leaf.batch_id, parts.join(" / "))
}

fn topic_path(leaf: &TopicLeaf) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(college) = &leaf.college_name {
        parts.push(college);
    }
    if let Some(department) = &leaf.department_name {
        parts.push(department);
    }
    if let Some(batch) = &leaf.batch_name {
        parts.push(batch);
    }
    parts.push(&leaf.topic_name);
    format!("{}  {}", leaf.topic_id, parts.join(" / "))
}

/// Load the catalog into a fresh selector, logging what arrived.
async fn load_selector(
    include_topics: bool,
    api: &AdminApi,
    quiet: bool,
) -> Result<HierarchySelector, String> {
    let mut selector = HierarchySelector::new(SelectorConfig { include_topics });
    selector.load(api).await;

    if !quiet {
        let catalog = selector.catalog();
        let mut counts = format!(
            "Loaded {} colleges, {} departments, {} batches",
            catalog.level(Level::College).len(),
            catalog.level(Level::Department).len(),
            catalog.level(Level::Batch).len()
        );
        if include_topics {
            counts.push_str(&format!(", {} topics", catalog.level(Level::Topic).len()));
        }
        eprintln!("{}", counts);
    }
    Ok(selector)
}

async fn handle_pick(
    topics: bool,
    leaves: bool,
    api: &AdminApi,
    json: bool,
    quiet: bool,
    verbose: bool,
) -> Result<(), String> {
    let mut selector = load_selector(topics, api, quiet).await?;

    if verbose {
        selector.set_on_change(Box::new(move |snapshot| {
            elog!("[verbose] {}", render::summarize(snapshot, topics));
        }));
    }

    let confirmed = tui::run_selector(&mut selector)?;
    if !confirmed {
        if !quiet {
            eprintln!("Selection cancelled");
        }
        return Ok(());
    }

    if leaves {
        let selected = selector.selected_leaves();
        if json {
            println!(
                "{}",
                serde_json::to_string(&selected)
                    .map_err(|e| format!("Failed to serialize: {}", e))?
            );
        } else {
            match &selected {
                LeafSelection::Batches(records) => {
                    for leaf in records {
                        println!("{}", batch_path(leaf));
                    }
                }
                LeafSelection::Topics(records) => {
                    for leaf in records {
                        println!("{}", topic_path(leaf));
                    }
                }
            }
            eprintln!("{} leaves", selected.len());
        }
    } else {
        let snapshot = selector.snapshot();
        if json {
            println!(
                "{}",
                serde_json::to_string(&snapshot)
                    .map_err(|e| format!("Failed to serialize: {}", e))?
            );
        } else {
            for level in selector.levels() {
                let ids = snapshot.level(*level);
                if ids.is_empty() {
                    continue;
                }
                println!("{}:", level.title_plural());
                for id in ids {
                    match selector.catalog().get(*level, id) {
                        Some(entity) => println!("  {}  {}", id, entity.name),
                        None => println!("  {}", id),
                    }
                }
            }
            eprintln!("{}", render::summarize(&snapshot, topics));
        }
    }
    Ok(())
}

// ============================================================================
// Create Command
// ============================================================================

async fn handle_create(
    cmd: CreateCommands,
    api: &AdminApi,
    json: bool,
    quiet: bool,
) -> Result<(), String> {
    let include_topics = matches!(cmd, CreateCommands::Question { .. });
    let mut selector = load_selector(include_topics, api, quiet).await?;

    let confirmed = tui::run_selector(&mut selector)?;
    if !confirmed {
        if !quiet {
            eprintln!("Selection cancelled");
        }
        return Ok(());
    }

    let (plan, yes) = match cmd {
        CreateCommands::Note {
            title,
            drive_link,
            yes,
        } => (
            BulkPlan::Notes {
                title,
                drive_link,
                leaves: selector.selected_batch_leaves(),
            },
            yes,
        ),
        CreateCommands::Topic { name, yes } => (
            BulkPlan::Topics {
                topic_name: name,
                leaves: selector.selected_batch_leaves(),
            },
            yes,
        ),
        CreateCommands::Question {
            title,
            description,
            yes,
        } => (
            BulkPlan::Questions {
                title,
                description,
                leaves: selector.selected_topic_leaves(),
            },
            yes,
        ),
    };

    if plan.is_empty() {
        if !quiet {
            eprintln!("Nothing selected, nothing to create");
        }
        return Ok(());
    }

    let (singular, plural) = plan.noun();
    if !yes {
        let targets = if include_topics {
            utils::format_count(plan.len(), "topic", "topics")
        } else {
            utils::format_count(plan.len(), "batch", "batches")
        };
        eprint!("Create {} in {}? [y/N] ", singular, targets);
        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| format!("Failed to read input: {}", e))?;
        if !input.trim().eq_ignore_ascii_case("y") {
            return Err("Aborted.".to_string());
        }
    }

    let outcome = bulk::run(api, &plan).await;

    if json {
        println!(
            "{}",
            serde_json::to_string(&outcome)
                .map_err(|e| format!("Failed to serialize: {}", e))?
        );
    } else {
        log!("{}", outcome.summary(singular, plural));
        for error in &outcome.errors {
            elog!("  {}", error);
        }
    }
    Ok(())
}

// ============================================================================
// Config Command
// ============================================================================

fn handle_config(cmd: ConfigCommands, json: bool) -> Result<(), String> {
    match cmd {
        ConfigCommands::List => {
            let url = settings::get_api_base_url();
            let token_set = settings::has_auth_token();

            if json {
                println!(
                    r#"{{"api_url":"{}","auth_token":{}}}"#,
                    url, token_set
                );
            } else {
                println!("api-url:    {}", url);
                println!("auth-token: {}", if token_set { "set" } else { "not set" });
            }
        }
        ConfigCommands::Get { key } => {
            let value: String = match key.as_str() {
                "api-url" => settings::get_api_base_url(),
                "auth-token" => settings::get_masked_auth_token()
                    .unwrap_or_else(|| "not set".to_string()),
                _ => return Err(format!("Unknown config key: {}", key)),
            };

            if json {
                println!(r#"{{"{}":"{}"}}"#, key, value);
            } else {
                println!("{}", value);
            }
        }
        ConfigCommands::Set { key, value } => match key.as_str() {
            "api-url" => settings::set_api_base_url(value)?,
            "auth-token" => settings::set_auth_token(value)?,
            _ => return Err(format!("Unknown config key: {}", key)),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_arg() {
        assert_eq!(parse_level_arg("colleges").unwrap(), Level::College);
        assert_eq!(parse_level_arg("Batches").unwrap(), Level::Batch);
        assert!(parse_level_arg("college").is_err());
        assert!(parse_level_arg("").is_err());
    }

    #[test]
    fn test_entity_line() {
        let college = Entity::new("c1", "Tech U");
        assert_eq!(entity_line(&college), "c1  Tech U");
        let dept = Entity::with_parent("d1", "CS", "c1");
        assert_eq!(entity_line(&dept), "d1  CS  [c1]");
    }

    #[test]
    fn test_batch_path_skips_missing_ancestors() {
        let full = BatchLeaf {
            batch_id: "b1".to_string(),
            batch_name: "2024".to_string(),
            department_id: Some("d1".to_string()),
            department_name: Some("CS".to_string()),
            college_id: Some("c1".to_string()),
            college_name: Some("Tech U".to_string()),
        };
        assert_eq!(batch_path(&full), "b1  Tech U / CS / 2024");

        let orphan = BatchLeaf {
            batch_id: "b9".to_string(),
            batch_name: "2030".to_string(),
            department_id: None,
            department_name: None,
            college_id: None,
            college_name: None,
        };
        assert_eq!(batch_path(&orphan), "b9  2030");
    }

    #[test]
    fn test_topic_path() {
        let leaf = TopicLeaf {
            topic_id: "t1".to_string(),
            topic_name: "Arrays".to_string(),
            batch_id: Some("b1".to_string()),
            batch_name: Some("2024".to_string()),
            department_id: Some("d1".to_string()),
            department_name: Some("CS".to_string()),
            college_id: Some("c1".to_string()),
            college_name: Some("Tech U".to_string()),
        };
        assert_eq!(topic_path(&leaf), "t1  Tech U / CS / 2024 / Arrays");
    }
}
