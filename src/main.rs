use r_ambient::audio::{AlsaChannel, Preload};
use r_ambient::config::{JsonSettingsStore, Settings, SettingsStore};
use r_ambient::player::{Player, PlayerOptions};
use r_ambient::ui::{self, Cli};
use r_ambient::{init_app_dirs, log_file_path};
use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_TARGET: &str = "r_ambient::main";

fn init_logging(log_path: &Path) -> Result<(), Box<dyn Error>> {
    let log_file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("r_ambient=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(Arc::new(log_file)))
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::new();
    let args = &cli.args;

    let config_path = match &args.config {
        Some(path) => PathBuf::from(path),
        None => Settings::default_path(),
    };
    init_app_dirs(&config_path)?;
    init_logging(&log_file_path(&config_path))?;

    let mut settings = Settings::load(&config_path)?;

    // Command-line arguments and their environment fallbacks override the file.
    if let Some(device) = &args.alsa_device {
        settings.alsa_device = device.clone();
    }
    if let Some(base) = &args.sounds_base {
        settings.sounds_base = base.clone();
    }
    if let Some(sound) = &args.sound {
        settings.default_sound = Some(sound.clone());
    }
    if args.no_prime {
        settings.prime_on_first_play = false;
    }
    settings.validate()?;

    let catalog = settings.catalog()?;
    if args.list {
        cli.display_sounds(&catalog);
        return Ok(());
    }

    let store = Arc::new(JsonSettingsStore::new(&config_path));
    if let Some(volume) = args.volume {
        store.save_volume_percent(volume).await?;
    }

    info!(target: LOG_TARGET, "Starting with device '{}' and sounds from '{}'.", settings.alsa_device, settings.sounds_base);
    let channel = Box::new(AlsaChannel::new(&settings.alsa_device));
    let options = PlayerOptions {
        prime_on_first_play: settings.prime_on_first_play,
        preload: if args.no_preload { Preload::None } else { Preload::Auto },
        ..PlayerOptions::default()
    };
    let (mut player, handle) = Player::new(channel, catalog.clone(), store, options);
    let player_task = tokio::spawn(async move { player.run().await });

    let initial_sound = settings
        .default_sound
        .clone()
        .or_else(|| catalog.first().map(|s| s.id.clone()));
    if let Some(sound) = initial_sound {
        if let Err(e) = handle.select_sound(&sound).await {
            cli.display_error(&e);
        }
    }
    if let Some(minutes) = args.timer {
        handle.set_timer(minutes).await?;
    }

    let session = ui::run_interactive(handle.clone(), catalog).await;

    if let Err(e) = handle.shutdown().await {
        error!(target: LOG_TARGET, "Player already stopped: {}", e);
    }
    if let Err(e) = player_task.await {
        error!(target: LOG_TARGET, "Player task failed: {:?}", e);
    }
    info!(target: LOG_TARGET, "Exiting.");
    session
}
