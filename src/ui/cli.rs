//! Command-line interface implementation

use clap::Parser;
use std::error::Error;

use crate::catalog::SoundCatalog;

/// Command-line arguments for r-ambient
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Ambient sound player for the terminal", long_about = None)]
pub struct Args {
    /// Sound to select at startup
    #[arg(short, long, env = "R_AMBIENT_SOUND")]
    pub sound: Option<String>,

    /// Volume in percent, overriding the saved value
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,

    /// Auto-stop after this many minutes
    #[arg(short, long)]
    pub timer: Option<u32>,

    /// ALSA device to use
    #[arg(short = 'd', long, env = "R_AMBIENT_ALSA_DEVICE")]
    pub alsa_device: Option<String>,

    /// Directory or URL the sound files are served from
    #[arg(short = 'b', long, env = "R_AMBIENT_SOUNDS_BASE")]
    pub sounds_base: Option<String>,

    /// Config file path
    #[arg(short, long, env = "R_AMBIENT_CONFIG")]
    pub config: Option<String>,

    /// List the available sounds and exit
    #[arg(short, long)]
    pub list: bool,

    /// Skip the silent warm-up write before the first playback
    #[arg(long)]
    pub no_prime: bool,

    /// Fetch a sound only when it is first played instead of on selection
    #[arg(long)]
    pub no_preload: bool,
}

/// CLI user interface for interacting with the application
pub struct Cli {
    pub args: Args,
}

impl Cli {
    /// Create a new CLI instance
    pub fn new() -> Self {
        Cli { args: Args::parse() }
    }

    /// Lines printed by `--list`.
    pub fn format_sounds(catalog: &SoundCatalog) -> Vec<String> {
        let mut lines = vec![format!("{:<5} {:<26} {}", "#", "Id", "Name"), "-".repeat(60)];
        for (index, sound) in catalog.iter().enumerate() {
            lines.push(format!("{:<5} {:<26} {}", index + 1, sound.id, sound.label));
        }
        lines
    }

    /// Display the available sounds
    pub fn display_sounds(&self, catalog: &SoundCatalog) {
        println!("\nAvailable sounds:");
        for line in Self::format_sounds(catalog) {
            println!("{}", line);
        }
        println!();
    }

    /// Display error messages
    pub fn display_error(&self, error: &dyn Error) {
        eprintln!("Error: {}", error);
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}
