/*
 * This module provides the per-window application logic for undo, centered on
 * `UndoCoordinator`, which merges file-operation undo with the closed tab and
 * closed window histories and queues `UndoEvent`s for the window chrome.
 * Unit tests for `UndoCoordinator` are in `undo_coordinator_tests.rs`.
 */
pub mod error;
pub mod ui_constants;
pub mod undo_coordinator;


pub use error::UndoError;
pub use undo_coordinator::{UndoCoordinator, UndoEvent};
