/*
 * This module consolidates the platform-agnostic services the undo machinery is
 * built on: the process-wide command serial counter, the file-operation undo
 * boundary (`FileUndoOperations`), settings (`ConfigManagerOperations`,
 * `UndoSettingsProvider`), persisted window state (`SessionStoreOperations`),
 * the closed-item data model, and the shared `ClosedWindowsManager`.
 */
pub mod closed_windows_manager;
pub mod config;
pub mod file_undo;
pub mod models;
pub mod path_utils;
pub mod serial_counter;
pub mod session_store;

pub use closed_windows_manager::{ClosedWindowsManager, ClosedWindowsObserver, ObserverId};

pub use config::{
    AppSettings, ConfigError, ConfigManagerOperations, CoreConfigManager, UndoSettingsProvider,
};

pub use file_undo::{CoreFileUndoManager, FileOperationKind, FileUndoCommand, FileUndoOperations};

pub use models::{
    ClosedItem, ClosedRemoteWindowItem, ClosedTabItem, ClosedWindowItem, ItemOwner,
    SharedWindowItem, WindowId,
};

pub use serial_counter::CommandSerialCounter;

pub use session_store::{
    ConfigGroup, CoreSessionStore, SessionStoreError, SessionStoreOperations, WindowState,
};
