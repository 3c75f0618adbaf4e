//! Mode listing command for Mindchat
//!
//! Shows the configured conversation modes, where each keeps its history,
//! and whether it carries a system instruction.

use crate::config::{Config, ModeConfig};
use crate::error::Result;
use prettytable::{row, Table};

/// List configured modes
///
/// # Arguments
///
/// * `config` - Configuration containing the mode table
///
/// # Errors
///
/// Returns error if the history directory cannot be determined
///
/// # Examples
///
/// ```
/// use mindchat::commands::modes::list_modes;
/// use mindchat::config::Config;
///
/// # fn main() -> anyhow::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let mut config = Config::default();
/// config.history.data_dir = Some(dir.path().to_path_buf());
/// list_modes(&config)?;
/// # Ok(())
/// # }
/// ```
pub fn list_modes(config: &Config) -> Result<()> {
    let dir = config.history_dir()?;
    println!("\nAvailable modes:\n");
    modes_table(&config.modes, &config.default_mode).printstd();
    println!("\nHistory directory: {}\n", dir.display());
    Ok(())
}

/// Build the mode table; the default mode is marked with `*`
pub fn modes_table(modes: &[ModeConfig], default_mode: &str) -> Table {
    let mut table = Table::new();
    table.add_row(row!["", "Key", "Name", "History File", "Instruction"]);

    for mode in modes {
        let marker = if mode.key == default_mode { "*" } else { "" };
        let instruction = match mode.system_prompt.as_deref() {
            Some(prompt) if !prompt.is_empty() => "yes",
            _ => "none",
        };
        table.add_row(row![
            marker,
            mode.key,
            mode.display_name,
            mode.history_file,
            instruction
        ]);
    }

    table
}

/// Print modes inline for the interactive session; the active one is marked
pub fn print_mode_list<'a>(modes: impl Iterator<Item = &'a ModeConfig>, active_key: &str) {
    println!();
    for mode in modes {
        let marker = if mode.key == active_key { "*" } else { " " };
        println!("  {} {:<14} {}", marker, mode.key, mode.display_name);
    }
    println!();
}
