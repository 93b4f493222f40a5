//! The sender's view model and the observer interface views implement.

use ttt_core::board::{Board, Mark};

/// Status text shown before a game starts or after the session is gone.
pub const STATUS_NOT_STARTED: &str = "Game not started.";
pub const STATUS_WAITING: &str = "Waiting for another player to join.";
pub const STATUS_IN_PROGRESS: &str = "Game in progress.";
pub const STATUS_OBSERVING: &str = "Observing a game.";
pub const STATUS_GAME_OVER: &str = "Game over.";

/// Everything a view needs to render the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    /// The board, once the receiver has sent its layout.
    pub board: Option<Board>,
    /// Human-readable status line.
    pub status: String,
    /// This client asked to join a game.
    pub started: bool,
    /// This client is a player in a running game.
    pub game_in_progress: bool,
    pub my_turn: bool,
    /// A game is running that this client is not part of.
    pub observing: bool,
    /// The receiver reported the end of the game.
    pub game_over: bool,
    /// End state reported by the receiver, e.g. `"X-won"`.
    pub outcome: Option<String>,
    /// The mark the receiver assigned to this client.
    pub symbol: Option<Mark>,
    /// Accumulated diagnostics, one per line.
    pub message: String,
    /// The transport reported it is ready for use.
    pub api_initialized: bool,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            board: None,
            status: STATUS_NOT_STARTED.to_string(),
            started: false,
            game_in_progress: false,
            my_turn: false,
            observing: false,
            game_over: false,
            outcome: None,
            symbol: None,
            message: String::new(),
            api_initialized: false,
        }
    }
}

impl ViewModel {
    /// Return every game field to its default.
    ///
    /// The diagnostic log and the transport readiness flag survive a reset.
    pub fn reset(&mut self) {
        *self = Self {
            message: std::mem::take(&mut self.message),
            api_initialized: self.api_initialized,
            ..Self::default()
        };
    }

    /// Append a diagnostic line. Empty messages are dropped.
    pub fn append_message(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.message.push('\n');
        self.message.push_str(line);
    }

    /// Player number of this client's mark (1 for X, 2 for O).
    pub fn player_number(&self) -> Option<u8> {
        self.symbol.map(Mark::player_number)
    }

    /// Diagnostic lines, oldest first.
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.message.lines().filter(|l| !l.is_empty())
    }
}

/// Receives model updates from the controller.
///
/// The controller calls `model_changed` once at the end of every turn that
/// may have changed the model, so views never need to poll.
pub trait ModelObserver: Send {
    fn model_changed(&mut self, model: &ViewModel);

    /// A blocking-style notification: receiver errors and rejected moves.
    fn alert(&mut self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_log_and_readiness() {
        let mut model = ViewModel {
            board: Some(Board::empty()),
            status: STATUS_IN_PROGRESS.into(),
            started: true,
            game_in_progress: true,
            my_turn: true,
            observing: true,
            game_over: true,
            outcome: Some("draw".into()),
            symbol: Some(Mark::O),
            api_initialized: true,
            ..Default::default()
        };
        model.append_message("launching...");

        model.reset();

        assert_eq!(model.board, None);
        assert_eq!(model.status, STATUS_NOT_STARTED);
        assert!(!model.started && !model.game_in_progress && !model.my_turn && !model.observing);
        assert!(!model.game_over);
        assert_eq!(model.outcome, None);
        assert_eq!(model.symbol, None);
        assert!(model.api_initialized);
        assert_eq!(model.log_lines().collect::<Vec<_>>(), vec!["launching..."]);
    }

    #[test]
    fn empty_messages_dropped() {
        let mut model = ViewModel::default();
        model.append_message("");
        assert!(model.message.is_empty());
        model.append_message("a");
        model.append_message("b");
        assert_eq!(model.message, "\na\nb");
    }

    #[test]
    fn default_alert_is_ignored() {
        struct Counter(usize);
        impl ModelObserver for Counter {
            fn model_changed(&mut self, _model: &ViewModel) {
                self.0 += 1;
            }
        }

        let mut observer = Counter(0);
        observer.alert("receiver on fire");
        observer.model_changed(&ViewModel::default());
        assert_eq!(observer.0, 1);
    }
}
