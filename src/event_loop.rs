//! Async dashboard loop: keyboard input, loop snapshots, and redraws.

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use crate::app::AppError;
use crate::input::{handle_key_event, KeyAction};
use crate::polling::{LoopCommand, LoopState, Snapshot};
use crate::terminal::{StatusBar, Tui};

/// Redraw at least this often so the terminal recovers from stray output.
const REDRAW_INTERVAL: Duration = Duration::from_millis(500);

/// Drive the dashboard until the user quits or the polling loop exits.
///
/// Handles three concurrent concerns with `tokio::select!`:
/// 1. Terminal events (keys, resize) via crossterm EventStream
/// 2. New snapshots published by the polling loop
/// 3. A slow redraw timer
pub async fn run(
    tui: &mut Tui,
    mut snapshots: watch::Receiver<Snapshot>,
    commands: &mpsc::Sender<LoopCommand>,
    status_bar: &StatusBar,
) -> Result<(), AppError> {
    let mut event_stream = EventStream::new();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    redraw.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut current = snapshots.borrow_and_update().clone();
    tui.draw(&current, status_bar)?;

    loop {
        tokio::select! {
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => match handle_key_event(key_event) {
                        KeyAction::Quit => break,
                        KeyAction::TogglePause => {
                            if !request_toggle(commands, current.loop_state) {
                                break;
                            }
                        }
                        KeyAction::None => {}
                    },
                    Some(Ok(Event::Resize(_, _))) => {
                        tui.draw(&current, status_bar)?;
                    }
                    Some(Ok(_)) => {
                        // Ignore other events (mouse, focus, paste)
                    }
                    Some(Err(e)) => return Err(AppError::Terminal(e)),
                    None => break,
                }
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    // Polling loop is gone
                    break;
                }
                current = snapshots.borrow_and_update().clone();
                tui.draw(&current, status_bar)?;
            }

            _ = redraw.tick() => {
                tui.draw(&current, status_bar)?;
            }
        }
    }

    Ok(())
}

/// Ask the polling loop to pause or resume without waiting on it.
///
/// Returns `false` once the loop is gone.
fn request_toggle(commands: &mpsc::Sender<LoopCommand>, state: LoopState) -> bool {
    let command = if state == LoopState::Stopped {
        LoopCommand::Resume
    } else {
        LoopCommand::Pause
    };
    log::info!("Key: {:?}", command);
    match commands.try_send(command) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log::warn!("Polling loop busy, dropping {:?}", command);
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_pauses_then_resumes() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(request_toggle(&tx, LoopState::Active));
        assert!(request_toggle(&tx, LoopState::Stopped));
        assert_eq!(rx.try_recv().unwrap(), LoopCommand::Pause);
        assert_eq!(rx.try_recv().unwrap(), LoopCommand::Resume);
    }

    #[test]
    fn test_toggle_never_blocks_on_full_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(request_toggle(&tx, LoopState::Active));
        assert!(request_toggle(&tx, LoopState::Active));
        assert_eq!(rx.try_recv().unwrap(), LoopCommand::Pause);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_toggle_reports_closed_loop() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(!request_toggle(&tx, LoopState::Idle));
    }
}
