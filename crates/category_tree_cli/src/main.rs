//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `category_tree_core` linkage and database wiring.
//! - Print the normalized tree of the configured database.
//!
//! Usage: `category_tree_cli [config.json]`

use category_tree_core::db::{open_db, open_db_in_memory};
use category_tree_core::{
    init_logging_from_config, load_config, CategoryNode, CategoryStore, OrganizerConfig,
    SqliteCategoryStore, TreeOrganizer,
};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("category_tree_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path).map_err(|err| err.to_string())?,
        None => OrganizerConfig::default(),
    };
    init_logging_from_config(&config)?;

    println!("category_tree_core ping={}", category_tree_core::ping());
    println!(
        "category_tree_core version={}",
        category_tree_core::core_version()
    );

    let conn = match &config.database_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    let store = SqliteCategoryStore::try_new(&conn).map_err(|err| err.to_string())?;
    let organizer = TreeOrganizer::new(&store).map_err(|err| err.to_string())?;

    let total = store
        .list_categories()
        .map_err(|err| err.to_string())?
        .len();
    info!(
        "event=cli_tree_dump module=cli status=ok nodes={} total={}",
        organizer.level_index().len(),
        total
    );

    if organizer.tree().is_empty() {
        println!("(no categories)");
    }
    for node in organizer.tree() {
        print_node(node, 0);
    }
    Ok(())
}

fn print_node(node: &CategoryNode, depth: usize) {
    println!(
        "{}- [{}] {} (courses={})",
        "  ".repeat(depth),
        node.level,
        node.name,
        node.course_count
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}
