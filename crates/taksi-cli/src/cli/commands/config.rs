//! Config command handlers.

use taksi_core::config;

pub fn path() {
    println!("{}", config::paths::config_path().display());
}
