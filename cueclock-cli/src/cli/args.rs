//! CLI argument definitions for `cueclock`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    // Build the CLI definition in one place to keep main.rs slim.
    Command::new("Cueclock")
        .version("1.0")
        .about("Display a synchronized timecode clock for a remote cue playback source")
        .arg(
            Arg::new("host")
                .long("host")
                .short('H')
                .value_name("HOST")
                .help("Remote source host (overrides settings file and CUECLOCK_HOST)"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .value_name("PORT")
                .help("Remote source port (overrides settings file and CUECLOCK_PORT)"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .short('s')
                .value_name("PATH")
                .default_value("cueclock.json")
                .help("Path to the JSON settings file"),
        )
        .arg(
            Arg::new("no-auto-reload")
                .long("no-auto-reload")
                .action(ArgAction::SetTrue)
                .help("Halt on errors instead of reconnecting automatically"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Log every raw frame and decoded snapshot"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Run without the terminal UI (log-only)"),
        )
}
