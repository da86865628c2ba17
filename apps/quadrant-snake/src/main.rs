//! Snake
//!
//! Steer a growing snake around a 48x27 board that wraps at every edge.
//! Eating food adds a segment; running into yourself ends the game.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p quadrant-snake -- [OPTIONS]
//! ```
//!
//! The compiled shaders `vertexshader.spv` and `fragmentshader.spv` must be in
//! the working directory.
//!
//! ## Options
//!
//! - `-fullscreen`, `--fullscreen`: Borderless fullscreen at desktop resolution
//! - `-h, --help`: Print help message
//!
//! ## Controls
//!
//! - Arrow keys: Steer
//! - Escape: Quit
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod app;
mod board;

use std::time::Duration;

use quadrant_app::{run_app, AppConfig};

use crate::app::Snake;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 540;
const TICK: Duration = Duration::from_millis(100);

/// Command line options.
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    fullscreen: bool,
    help: bool,
}

impl Options {
    /// Parse options from arguments, program name excluded. Unknown
    /// arguments are ignored.
    fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for arg in args {
            match arg.as_ref() {
                "-fullscreen" | "--fullscreen" => options.fullscreen = true,
                "-h" | "--help" => options.help = true,
                _ => {}
            }
        }
        options
    }
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse(std::env::args().skip(1));

    // Check for help flag before starting the app
    if options.help {
        print_help();
        return Ok(());
    }

    run_app::<Snake>(
        AppConfig::new("Snake")
            .with_size(WIDTH, HEIGHT)
            .with_fullscreen(options.fullscreen)
            .with_tick_interval(TICK),
    )
}

fn print_help() {
    eprintln!(
        "Snake on the Quadrant renderer

USAGE:
    cargo run -p quadrant-snake -- [OPTIONS]

OPTIONS:
    -fullscreen, --fullscreen   Borderless fullscreen at desktop resolution
    -h, --help                  Print this help message

CONTROLS:
    Arrow keys                  Steer
    Escape                      Quit

FILES:
    vertexshader.spv            Compiled vertex shader, read from the working directory
    fragmentshader.spv          Compiled fragment shader, read from the working directory

ENVIRONMENT VARIABLES:
    RUST_LOG                    Set log level (e.g., info, debug, trace)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windowed_by_default() {
        assert_eq!(Options::parse(Vec::<String>::new()), Options::default());
    }

    #[test]
    fn both_fullscreen_spellings() {
        assert!(Options::parse(["-fullscreen"]).fullscreen);
        assert!(Options::parse(["--fullscreen"]).fullscreen);
        assert!(!Options::parse(["fullscreen"]).fullscreen);
    }

    #[test]
    fn help_flag() {
        let options = Options::parse(["--fullscreen", "-h"]);
        assert!(options.help);
        assert!(options.fullscreen);
    }
}
