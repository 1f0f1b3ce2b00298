//! # Cueclock
//!
//! A terminal timecode display client: connects to a remote cue
//! playback source, keeps a locally smooth clock between its status
//! updates, and renders the timecode full-screen.

use log::error;

mod cli;
mod controls;
mod logging;
mod runner;
mod transport;
mod ui;

fn main() {
    dotenv::dotenv().ok();
    let log_buffer = logging::init();
    let args = cli::args::build_cli().get_matches();

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
