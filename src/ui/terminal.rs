//! Interactive key loop driving a [`PlayerHandle`].

use super::keys::{self, KeyAction};
use super::status::{self, Banner};
use crate::catalog::SoundCatalog;
use crate::player::{PlayerError, PlayerHandle, PlayerStateUpdate};
use crossterm::event::{self, Event, KeyEvent};
use crossterm::{cursor, execute, style::Print, terminal};
use std::error::Error;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "r_ambient::ui::terminal";

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

/// Enables raw mode for its lifetime.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to restore terminal: {}", e);
        }
        println!();
    }
}

/// Reads key presses on a blocking thread until `stop` is set or the receiver goes away.
fn spawn_key_reader(stop: Arc<AtomicBool>) -> mpsc::Receiver<KeyEvent> {
    let (key_tx, key_rx) = mpsc::channel(16);
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(KEY_POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if key_tx.blocking_send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(target: LOG_TARGET, "Reading terminal event failed: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!(target: LOG_TARGET, "Polling terminal failed: {}", e);
                    break;
                }
            }
        }
    });
    key_rx
}

/// Applies one key action. Returns `false` when the user asked to quit.
async fn apply_action(
    handle: &PlayerHandle,
    catalog: &SoundCatalog,
    action: KeyAction,
    banner: &mut Banner,
) -> Result<bool, PlayerError> {
    let snapshot = handle.state().await?;
    let result = match action {
        KeyAction::Quit => return Ok(false),
        KeyAction::TogglePlay => handle.toggle_play().await.map(|_| ()),
        KeyAction::ToggleMute => handle.toggle_mute().await,
        KeyAction::VolumeUp => handle.set_volume(keys::volume_up(snapshot.volume_percent())).await,
        KeyAction::VolumeDown => handle.set_volume(keys::volume_down(snapshot.volume_percent())).await,
        KeyAction::CycleTimer => handle.set_timer(keys::next_timer_preset(snapshot.timer_minutes)).await,
        KeyAction::NextSound | KeyAction::PreviousSound => {
            let current = snapshot.selected_sound.as_deref();
            let next = if action == KeyAction::NextSound {
                catalog.next_after(current)
            } else {
                catalog.previous_before(current)
            };
            match next {
                Some(sound) => handle.select_sound(&sound.id).await,
                None => Ok(()),
            }
        }
    };
    match result {
        Err(PlayerError::ChannelClosed) => Err(PlayerError::ChannelClosed),
        // The player broadcasts its own warnings; keep the banner in sync in case the update was missed.
        Err(e) => {
            banner.show(e.to_string(), Instant::now());
            Ok(true)
        }
        Ok(()) => Ok(true),
    }
}

fn draw(line: &str, banner: Option<&str>) -> io::Result<()> {
    let mut stdout = io::stdout();
    let text = match banner {
        Some(message) => format!("{}  ! {}", line, message),
        None => line.to_string(),
    };
    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(terminal::ClearType::CurrentLine),
        Print(text)
    )?;
    stdout.flush()
}

/// Runs the interactive session until the user quits or the player stops.
pub async fn run_interactive(handle: PlayerHandle, catalog: SoundCatalog) -> Result<(), Box<dyn Error>> {
    println!("{}", status::KEY_HELP);
    let _raw_mode = RawModeGuard::enable()?;
    let stop = Arc::new(AtomicBool::new(false));
    let mut key_rx = spawn_key_reader(stop.clone());
    let mut updates = handle.subscribe();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let mut banner = Banner::new();

    let outcome: Result<(), Box<dyn Error>> = loop {
        tokio::select! {
            key = key_rx.recv() => {
                let Some(key) = key else { break Ok(()) };
                let Some(action) = keys::map_key(&key) else { continue };
                debug!(target: LOG_TARGET, "Key action: {:?}", action);
                match apply_action(&handle, &catalog, action, &mut banner).await {
                    Ok(true) => {}
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e.into()),
                }
            }
            update = updates.recv() => match update {
                Ok(PlayerStateUpdate::Warning(message)) => banner.show(message, Instant::now()),
                Ok(PlayerStateUpdate::Stopped) | Err(broadcast::error::RecvError::Closed) => {
                    info!(target: LOG_TARGET, "Player stopped; leaving interactive loop.");
                    break Ok(());
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(target: LOG_TARGET, "Status view lagged by {} updates.", skipped);
                }
            },
            _ = redraw.tick() => {}
        }

        match handle.state().await {
            Ok(snapshot) => {
                let line = status::render_status(&snapshot, &catalog);
                if let Err(e) = draw(&line, banner.message(Instant::now())) {
                    break Err(e.into());
                }
            }
            Err(e) => break Err(e.into()),
        }
    };

    stop.store(true, Ordering::Relaxed);
    outcome
}
