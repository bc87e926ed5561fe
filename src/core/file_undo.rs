/*
 * Boundary to the file-operation undo subsystem. The undo coordinator consumes it
 * through `FileUndoOperations` only: availability, label, the serial number of the
 * newest recorded command, the shared serial generator, and `undo()`.
 *
 * `CoreFileUndoManager` is the in-process implementation. It records commands with
 * serials drawn from the shared `CommandSerialCounter` and pops them on undo.
 * Carrying out the reverse filesystem operation belongs to the file-operation
 * layer and is not done here.
 */
use super::models::WindowId;
use super::serial_counter::CommandSerialCounter;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const FILE_UNDO_TEXT_EMPTY: &str = "Und&o";

pub trait FileUndoOperations: Send + Sync {
    fn undo_available(&self) -> bool;
    fn undo_text(&self) -> String;
    fn current_command_serial_number(&self) -> u64;
    fn new_command_serial_number(&self) -> u64;
    fn undo(&self);
    // Window used as parent for any confirmation prompt shown during `undo()`.
    fn set_ui_parent(&self, window: Option<WindowId>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperationKind {
    Copy,
    Link,
    Move,
    Rename,
    Trash,
    CreateFolder,
    CreateFile,
}

impl FileOperationKind {
    pub fn label(self) -> &'static str {
        match self {
            FileOperationKind::Copy => "Copy",
            FileOperationKind::Link => "Link",
            FileOperationKind::Move => "Move",
            FileOperationKind::Rename => "Rename",
            FileOperationKind::Trash => "Trash",
            FileOperationKind::CreateFolder => "Create Folder",
            FileOperationKind::CreateFile => "Create File",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUndoCommand {
    pub serial_number: u64,
    pub kind: FileOperationKind,
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
}

#[derive(Debug, Default)]
struct FileUndoState {
    commands: Vec<FileUndoCommand>,
    ui_parent: Option<WindowId>,
}

pub struct CoreFileUndoManager {
    serial_counter: Arc<CommandSerialCounter>,
    state: Mutex<FileUndoState>,
}

impl CoreFileUndoManager {
    pub fn new(serial_counter: Arc<CommandSerialCounter>) -> Self {
        CoreFileUndoManager {
            serial_counter,
            state: Mutex::new(FileUndoState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FileUndoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a finished file operation and returns the serial it was given.
    pub fn record_command(
        &self,
        kind: FileOperationKind,
        sources: Vec<PathBuf>,
        destination: PathBuf,
    ) -> u64 {
        let serial_number = self.serial_counter.next();
        log::debug!(
            "CoreFileUndoManager: Recording {:?} of {} item(s) to {destination:?} as serial {serial_number}",
            kind,
            sources.len()
        );
        self.lock_state().commands.push(FileUndoCommand {
            serial_number,
            kind,
            sources,
            destination,
        });
        serial_number
    }

    pub fn ui_parent(&self) -> Option<WindowId> {
        self.lock_state().ui_parent
    }

    pub fn command_count(&self) -> usize {
        self.lock_state().commands.len()
    }
}

impl FileUndoOperations for CoreFileUndoManager {
    fn undo_available(&self) -> bool {
        !self.lock_state().commands.is_empty()
    }

    fn undo_text(&self) -> String {
        match self.lock_state().commands.last() {
            Some(command) => format!("{FILE_UNDO_TEXT_EMPTY}: {}", command.kind.label()),
            None => FILE_UNDO_TEXT_EMPTY.to_string(),
        }
    }

    fn current_command_serial_number(&self) -> u64 {
        self.lock_state()
            .commands
            .last()
            .map_or(0, |command| command.serial_number)
    }

    fn new_command_serial_number(&self) -> u64 {
        self.serial_counter.next()
    }

    fn undo(&self) {
        let mut state = self.lock_state();
        let parent = state.ui_parent;
        match state.commands.pop() {
            Some(command) => log::info!(
                "CoreFileUndoManager: Undoing {:?} (serial {}) of {:?} -> {:?}, prompts parented to {:?}",
                command.kind,
                command.serial_number,
                command.sources,
                command.destination,
                parent
            ),
            None => log::debug!("CoreFileUndoManager: Nothing to undo."),
        }
    }

    fn set_ui_parent(&self, window: Option<WindowId>) {
        self.lock_state().ui_parent = window;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (Arc<CommandSerialCounter>, CoreFileUndoManager) {
        let counter = Arc::new(CommandSerialCounter::new());
        let manager = CoreFileUndoManager::new(counter.clone());
        (counter, manager)
    }

    #[test]
    fn test_empty_manager() {
        let (_, manager) = manager();
        assert!(!manager.undo_available());
        assert_eq!(manager.undo_text(), "Und&o");
        assert_eq!(manager.current_command_serial_number(), 0);
        manager.undo();
        assert_eq!(manager.command_count(), 0);
    }

    #[test]
    fn test_record_and_undo_follow_stack_order() {
        let (_, manager) = manager();
        let copy = manager.record_command(
            FileOperationKind::Copy,
            vec![PathBuf::from("/tmp/a")],
            PathBuf::from("/tmp/b"),
        );
        let trash = manager.record_command(
            FileOperationKind::Trash,
            vec![PathBuf::from("/tmp/c")],
            PathBuf::from("trash:/"),
        );
        assert!(trash > copy);
        assert_eq!(manager.current_command_serial_number(), trash);
        assert_eq!(manager.undo_text(), "Und&o: Trash");

        manager.undo();
        assert_eq!(manager.current_command_serial_number(), copy);
        assert_eq!(manager.undo_text(), "Und&o: Copy");
    }

    #[test]
    fn test_serials_are_shared_with_other_consumers() {
        let (counter, manager) = manager();
        let closed_tab_serial = manager.new_command_serial_number();
        let rename = manager.record_command(
            FileOperationKind::Rename,
            vec![PathBuf::from("/tmp/old")],
            PathBuf::from("/tmp/new"),
        );
        assert_eq!(closed_tab_serial, 1);
        assert_eq!(rename, 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_ui_parent_is_remembered() {
        let (_, manager) = manager();
        manager.set_ui_parent(Some(WindowId(4)));
        assert_eq!(manager.ui_parent(), Some(WindowId(4)));
    }
}
