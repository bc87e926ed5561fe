// src/main.rs

use closed_item_undo::app_logic::{UndoCoordinator, UndoEvent};
use closed_item_undo::core::{
    AppSettings, ClosedTabItem, ClosedWindowItem, ClosedWindowsManager, CommandSerialCounter,
    ConfigManagerOperations, CoreConfigManager, CoreFileUndoManager, CoreSessionStore,
    FileOperationKind, SessionStoreOperations, UndoSettingsProvider, WindowId, WindowState,
    path_utils,
};
use simplelog::{Config, LevelFilter, SimpleLogger};
use std::path::PathBuf;
use std::sync::Arc;

const APP_NAME: &str = "ClosedItemUndo";

fn log_events(name: &str, coordinator: &UndoCoordinator) {
    while let Some(event) = coordinator.try_dequeue_event() {
        match event {
            UndoEvent::OpenClosedTab(tab) => {
                log::info!("{name}: reopen tab '{}' ({}) at {}", tab.title, tab.url, tab.position)
            }
            UndoEvent::OpenClosedWindow { item, state } => log::info!(
                "{name}: reopen window '{}' with {} tab(s), restored state: {:?}",
                item.title(),
                item.num_tabs(),
                state
            ),
            other => log::debug!("{name}: {other:?}"),
        }
    }
}

fn main() {
    if let Err(e) = SimpleLogger::init(LevelFilter::Info, Config::default()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let settings = match CoreConfigManager::new().load_settings(APP_NAME) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Main: Could not load settings, using defaults: {e}");
            AppSettings::default()
        }
    };
    log::info!(
        "Main: Remembering up to {} closed item(s)",
        settings.max_num_closed_items()
    );

    let storage_dir = path_utils::get_closed_items_dir(APP_NAME)
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME));
    let session_store: Arc<dyn SessionStoreOperations> =
        Arc::new(CoreSessionStore::new(storage_dir));
    let settings: Arc<AppSettings> = Arc::new(settings);
    let serial_counter = Arc::new(CommandSerialCounter::new());
    let file_undo = Arc::new(CoreFileUndoManager::new(serial_counter));
    let closed_windows = Arc::new(ClosedWindowsManager::new(settings.clone()));

    let first = UndoCoordinator::new(
        WindowId(1),
        closed_windows.clone(),
        file_undo.clone(),
        settings.clone(),
    );
    let second = UndoCoordinator::new(
        WindowId(2),
        closed_windows.clone(),
        file_undo.clone(),
        settings.clone(),
    );
    first.update_supports_file_undo(settings.supports_file_undo);
    second.update_supports_file_undo(settings.supports_file_undo);

    // A tab is closed in the first window.
    first.add_closed_tab_item(ClosedTabItem::new(
        first.new_command_serial_number(),
        "KDE".to_string(),
        "https://kde.org".to_string(),
        1,
    ));

    // A third window is closed; both remaining windows can reopen it.
    let serial = first.new_command_serial_number();
    let window_state = WindowState {
        title: "Projects".to_string(),
        tab_urls: vec![
            "file:///home/user/projects".to_string(),
            "file:///home/user/projects/notes".to_string(),
        ],
        active_tab: 0,
    };
    match ClosedWindowItem::persist(serial, &window_state, session_store.clone()) {
        Ok(window) => first.add_closed_window_item(window.into()),
        Err(e) => log::error!("Main: Failed to save state of closed window: {e}"),
    }
    log::info!("Main: Window 2 undo label: {}", second.undo_text());

    // A file operation happens after both closes, so it is undone first.
    file_undo.record_command(
        FileOperationKind::Move,
        vec![PathBuf::from("/home/user/a.txt")],
        PathBuf::from("/home/user/archive"),
    );
    first.on_file_undo_available_changed(true);
    log::info!("Main: Window 1 undo label: {}", first.undo_text());

    first.undo();
    first.on_file_undo_text_changed("Und&o");
    log::info!("Main: Window 1 undo label after file undo: {}", first.undo_text());

    second.undo();
    log::info!("Main: Window 1 undo label after window 2 reopened the window: {}", first.undo_text());

    first.undo();
    log_events("Window 1", &first);
    log_events("Window 2", &second);

    second.clear_closed_items_list(false);
    log::info!(
        "Main: Closed windows still tracked: {}",
        closed_windows.closed_window_item_list().len()
    );
}
