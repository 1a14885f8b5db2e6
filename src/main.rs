//! Fruit Crush TUI: match-3 fruit puzzle in the terminal.

mod app;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use fruitcrushtui::EngineConfig;
use std::path::PathBuf;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        log::warn!("theme not loaded, using defaults: {err}");
        theme::Theme::default()
    });
    let mut app = App::new(args, theme)?;
    app.run()
}

/// Match-3 fruit puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "fruitcrushtui",
    version,
    about = "Match-3 fruit puzzle in the terminal. Swap neighbouring fruit to line up three or more.",
    long_about = "Fruit Crush in the terminal.\n\n\
        Swap two neighbouring fruits to line up three or more of a kind. Matches clear, \
        fruit above falls down and new fruit drops in; chains score combo bonuses. Reach \
        the target score before the moves run out.\n\n\
        CONTROLS:\n  Arrows/hjkl  Move cursor   Space/Enter  Select / swap / fire\n  \
        1 Hammer  2 Shuffle  3 Bomb  4 Hint   Esc  Cancel\n  \
        P  Pause   S  Shop   A  Achievements   N  Next level   R  Restart   Q  Quit\n\n\
        Use --theme to load a btop-style theme; `theme[fruit_apple]=\"#RRGGBB\"` keys set fruit colours."
)]
pub struct Args {
    /// Seed for fruit generation; the same seed replays the same game.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Start at this level instead of the saved one.
    #[arg(short, long, value_name = "N")]
    pub level: Option<u32>,

    /// Moves per level.
    #[arg(short, long, default_value = "30", value_name = "N")]
    pub moves: u32,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable clear animation (resolutions show their final board at once).
    #[arg(long)]
    pub no_animation: bool,

    /// Milliseconds per cascade step during playback.
    #[arg(long, default_value = "220", value_name = "MS")]
    pub step_ms: u64,

    /// Player record file. Defaults to the platform config dir.
    #[arg(long, value_name = "FILE")]
    pub save_file: Option<PathBuf>,

    /// Do not read or write the player record.
    #[arg(long, conflicts_with = "save_file")]
    pub no_save: bool,

    /// Append analytics events as JSON lines to this file.
    #[arg(long, value_name = "FILE")]
    pub analytics: Option<PathBuf>,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            moves_per_level: self.moves.max(1),
            seed: self.seed,
            ..EngineConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["fruitcrushtui"]);
        let config = args.engine_config();
        assert_eq!(config.moves_per_level, 30);
        assert_eq!(config.seed, None);
        assert_eq!(args.palette, Palette::Normal);
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "fruitcrushtui",
            "--seed",
            "7",
            "--moves",
            "12",
            "--palette",
            "colourblind",
            "--no-save",
        ]);
        assert_eq!(args.engine_config().seed, Some(7));
        assert_eq!(args.engine_config().moves_per_level, 12);
        assert_eq!(args.palette, Palette::Colorblind);
        assert!(args.no_save);
    }

    #[test]
    fn test_no_save_conflicts_with_save_file() {
        assert!(Args::try_parse_from(["fruitcrushtui", "--no-save", "--save-file", "x.json"]).is_err());
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
