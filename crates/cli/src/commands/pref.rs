//! Preference management commands

use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use pick_core::config::PREFERENCE_KEYS;
use pick_core::{ConfigManager, Preferences};

/// Preference subcommands
#[derive(Subcommand, Debug)]
pub enum PrefCommands {
    /// Write the default preferences, replacing the current ones
    Init,

    /// Change one preference
    Set(SetArgs),

    /// Show the current preferences
    Show,
}

/// Arguments for the `pref set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Preference key
    #[arg(value_parser = clap::builder::PossibleValuesParser::new(PREFERENCE_KEYS.iter().copied()))]
    pub key: String,

    /// New value; `none` clears an optional preference
    pub value: String,
}

/// Execute a preference subcommand
pub fn execute(cmd: PrefCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            formatter.error(&format!("Failed to locate config: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let result = match cmd {
        PrefCommands::Init => manager.init().map(|config| {
            formatter.success(&format!(
                "Preferences initialized at {}",
                manager.config_path().display()
            ));
            config
        }),
        PrefCommands::Set(args) => manager.set_preference(&args.key, &args.value).map(|config| {
            formatter.success(&format!("Set {} = {}", args.key, args.value));
            config
        }),
        PrefCommands::Show => manager.load().map(|config| {
            show(&formatter, &config.preferences);
            config
        }),
    };

    match result {
        Ok(_) => ExitCode::Success,
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

fn show(formatter: &Formatter, prefs: &Preferences) {
    let entries = prefs.entries();
    if formatter.is_json() {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.into()))
            .collect();
        formatter.json(&map);
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(["Key", "Value"]);
    for (key, value) in entries {
        table.add_row([key.to_string(), value]);
    }
    formatter.println(&table.to_string());
}
