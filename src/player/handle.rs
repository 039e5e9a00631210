use super::error::PlayerError;
use super::fade::PendingFade;
use super::state::{PlayerCommand, PlayerSnapshot, PlayerStateUpdate};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Cloneable front end for a running [`Player`](super::Player) task.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    command_tx: mpsc::Sender<PlayerCommand>,
    state_update_tx: broadcast::Sender<PlayerStateUpdate>,
}

impl PlayerHandle {
    pub(super) fn new(command_tx: mpsc::Sender<PlayerCommand>, state_update_tx: broadcast::Sender<PlayerStateUpdate>) -> Self {
        Self {
            command_tx,
            state_update_tx,
        }
    }

    /// Subscribes to player state updates.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerStateUpdate> {
        self.state_update_tx.subscribe()
    }

    async fn send(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        self.command_tx.send(command).await.map_err(|_| PlayerError::ChannelClosed)
    }

    pub async fn select_sound(&self, id: &str) -> Result<(), PlayerError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlayerCommand::SelectSound {
            id: id.to_string(),
            responder,
        })
        .await?;
        rx.await.map_err(|_| PlayerError::ChannelClosed)?
    }

    /// Starts the opposite fade. The returned [`PendingFade`] resolves when it
    /// completes or is superseded; dropping it is fine.
    pub async fn toggle_play(&self) -> Result<PendingFade, PlayerError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlayerCommand::TogglePlay(responder)).await?;
        rx.await.map_err(|_| PlayerError::ChannelClosed)?
    }

    pub async fn set_volume(&self, percent: u8) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SetVolume(percent)).await
    }

    pub async fn toggle_mute(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::ToggleMute).await
    }

    pub async fn set_timer(&self, minutes: u32) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SetTimer(minutes)).await
    }

    pub async fn state(&self) -> Result<PlayerSnapshot, PlayerError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlayerCommand::GetState(responder)).await?;
        rx.await.map_err(|_| PlayerError::ChannelClosed)
    }

    pub async fn shutdown(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Shutdown).await
    }
}
