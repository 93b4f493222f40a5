//! Terminal rendering of the view model.

use std::fmt::Write;

use crossterm::style::Stylize;
use ttt_core::board::Cell;
use ttt_sender::{ModelObserver, ViewModel};

/// Prints the game whenever it changes, and optionally the diagnostic log.
pub struct TerminalView {
    styled: bool,
    show_log: bool,
    last_frame: String,
    log_lines_shown: usize,
}

impl TerminalView {
    pub fn new(styled: bool, show_log: bool) -> Self {
        Self {
            styled,
            show_log,
            last_frame: String::new(),
            log_lines_shown: 0,
        }
    }
}

impl ModelObserver for TerminalView {
    fn model_changed(&mut self, model: &ViewModel) {
        if self.show_log {
            let lines: Vec<&str> = model.log_lines().collect();
            for line in lines.iter().skip(self.log_lines_shown) {
                if self.styled {
                    eprintln!("{}", line.dim());
                } else {
                    eprintln!("{line}");
                }
            }
            self.log_lines_shown = lines.len();
        }

        let frame = render(model, false);
        if frame != self.last_frame {
            print!("{}", render(model, self.styled));
            self.last_frame = frame;
        }
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{}", alert_line(message, self.styled));
    }
}

fn alert_line(message: &str, styled: bool) -> String {
    if styled {
        format!("{} {}", "error:".red().bold(), message)
    } else {
        format!("error: {message}")
    }
}

/// Render the status, the player line, the board and the outcome.
pub fn render(model: &ViewModel, styled: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}]", model.status);

    if let Some(mark) = model.symbol {
        let turn = if model.my_turn {
            "your turn"
        } else {
            "waiting for opponent"
        };
        let _ = writeln!(
            out,
            "You are {} (player {}), {}",
            mark,
            mark.player_number(),
            turn
        );
    } else if model.observing {
        let _ = writeln!(out, "Watching as a spectator");
    }

    if let Some(board) = &model.board {
        for (i, row) in board.rows().iter().enumerate() {
            if i > 0 {
                let _ = writeln!(out, "---+---+---");
            }
            let _ = writeln!(
                out,
                " {} | {} | {}",
                cell(row[0], styled),
                cell(row[1], styled),
                cell(row[2], styled)
            );
        }
    }

    if let Some(outcome) = &model.outcome {
        let _ = writeln!(out, "Result: {outcome}");
    }
    out
}

fn cell(cell: Cell, styled: bool) -> String {
    let symbol = cell.symbol().to_string();
    if !styled {
        return symbol;
    }
    match cell {
        Cell::PlayerOne => symbol.red().bold().to_string(),
        Cell::PlayerTwo => symbol.blue().bold().to_string(),
        Cell::Empty => symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttt_core::board::{Board, Mark};

    #[test]
    fn alerts_are_labelled() {
        assert_eq!(
            alert_line("Cannot move: board layout not known yet", false),
            "error: Cannot move: board layout not known yet"
        );
    }

    #[test]
    fn render_idle() {
        let model = ViewModel::default();
        assert_eq!(render(&model, false), "[Game not started.]\n");
    }

    #[test]
    fn render_game() {
        let model = ViewModel {
            board: Some(Board::from_layout(&[1, 0, 0, 0, 2, 0, 0, 0, 0]).unwrap()),
            status: "Game in progress.".into(),
            started: true,
            game_in_progress: true,
            my_turn: true,
            symbol: Some(Mark::X),
            ..Default::default()
        };
        assert_eq!(
            render(&model, false),
            "[Game in progress.]\n\
             You are X (player 1), your turn\n \
             X |   |  \n\
             ---+---+---\n   \
             | O |  \n\
             ---+---+---\n   \
             |   |  \n"
        );
    }

    #[test]
    fn render_outcome_and_spectator() {
        let model = ViewModel {
            status: "Game over.".into(),
            observing: true,
            outcome: Some("O-won".into()),
            ..Default::default()
        };
        let text = render(&model, false);
        assert!(text.contains("Watching as a spectator"));
        assert!(text.ends_with("Result: O-won\n"));
    }
}
