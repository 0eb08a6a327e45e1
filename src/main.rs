//! Headless arena runner.
//!
//! Usage: `arcane-arena [combat-config.json]`

use std::path::PathBuf;

fn main() {
    let config = std::env::args_os().nth(1).map(PathBuf::from);
    arcane_arena::game::run(config.as_deref());
}
