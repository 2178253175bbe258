//! Outbound player notifications.
//!
//! Delivery is best-effort and lives in its own failure domain: the engine
//! applies and persists state first, then notifies, and a failed or
//! timed-out dispatch is logged and counted but never retried here and
//! never rolls anything back. Retry and backoff, if wanted, belong to the
//! sink implementation behind this trait.

use log::info;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::game::types::{Player, PlayerId};
use crate::logutil::escape_log;

/// Errors a sink may report. The engine treats all of them as transient.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The receiving side of a channel-backed sink is gone.
    #[error("notification channel closed")]
    ChannelClosed,

    /// Any other sink-specific delivery failure.
    #[error("notification sink failure: {0}")]
    Sink(String),
}

/// One message for one player, as handed to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
}

/// Seam to whatever front end delivers text to players.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, player: &Player, text: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log. The default sink for `start` until a
/// chat front end is attached.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, player: &Player, text: &str) -> Result<(), NotifyError> {
        info!("[{}] {}", player.name, escape_log(text));
        Ok(())
    }
}

/// Forwards notifications into a tokio channel. Used by tests and by front
/// ends embedding the engine.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, player: &Player, text: &str) -> Result<(), NotifyError> {
        self.tx
            .send(Notification {
                player_id: player.id,
                player_name: player.name.clone(),
                text: text.to_string(),
            })
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_notifier_forwards_messages() {
        let (sink, mut rx) = ChannelNotifier::new();
        let player = Player::new(5, "mira", "");
        sink.notify(&player, "hello there").expect("notify");
        let received = tokio_test::block_on(rx.recv()).expect("message queued");
        assert_eq!(received.player_id, 5);
        assert_eq!(received.player_name, "mira");
        assert_eq!(received.text, "hello there");
    }

    #[test]
    fn closed_channel_reports_channel_closed() {
        let (sink, rx) = ChannelNotifier::new();
        drop(rx);
        let player = Player::new(5, "mira", "");
        assert!(matches!(
            sink.notify(&player, "anyone?"),
            Err(NotifyError::ChannelClosed)
        ));
    }
}
