use crate::app_logic::error::{Result, UndoError};
use crate::app_logic::ui_constants::{UNDO_TEXT_CLOSED_TAB, UNDO_TEXT_CLOSED_WINDOW};
use crate::core::{
    ClosedItem, ClosedTabItem, ClosedWindowsManager, ClosedWindowsObserver, FileUndoOperations,
    ItemOwner, ObserverId, SharedWindowItem, UndoSettingsProvider, WindowId, WindowState,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/*
 * Notifications for the window chrome. They are queued by the coordinator and
 * dequeued by the window, in the order they were produced.
 */
#[derive(Debug, Clone)]
pub enum UndoEvent {
    UndoAvailable(bool),
    UndoTextChanged(String),
    ClosedItemsListChanged,
    OpenClosedTab(ClosedTabItem),
    // `state` is read before the window's persisted group is deleted; it is
    // `None` for remote windows, whose state lives with their source.
    OpenClosedWindow {
        item: SharedWindowItem,
        state: Option<WindowState>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopulateState {
    Uninitialized,
    Populated,
}

struct CoordinatorState {
    populate_state: PopulateState,
    // Newest first.
    closed_items: VecDeque<ClosedItem>,
    supports_file_undo: bool,
    pending_events: VecDeque<UndoEvent>,
}

/*
 * Per-window undo coordinator. It answers "can we undo", "what is the label" and
 * "undo" by merging three histories: the file-operation undo stack, the closed
 * windows shared by all windows of the process, and this window's closed tabs.
 * Which one `undo()` acts on is decided by comparing serial numbers drawn from the
 * one process-wide counter.
 *
 * The shared closed-window list is pulled in lazily on first use (`populate`),
 * since coordinators are created before the rest of the window is ready.
 *
 * No internal lock is held while calling into the `ClosedWindowsManager`, since
 * the manager calls straight back into every coordinator, this one included.
 */
pub struct UndoCoordinator {
    window_id: WindowId,
    observer_id: ObserverId,
    closed_windows: Arc<ClosedWindowsManager>,
    file_undo: Arc<dyn FileUndoOperations>,
    settings: Arc<dyn UndoSettingsProvider>,
    state: Mutex<CoordinatorState>,
}

impl UndoCoordinator {
    pub fn new(
        window_id: WindowId,
        closed_windows: Arc<ClosedWindowsManager>,
        file_undo: Arc<dyn FileUndoOperations>,
        settings: Arc<dyn UndoSettingsProvider>,
    ) -> Arc<Self> {
        let observer_id = closed_windows.allocate_observer_id();
        let coordinator = Arc::new(UndoCoordinator {
            window_id,
            observer_id,
            closed_windows,
            file_undo,
            settings,
            state: Mutex::new(CoordinatorState {
                populate_state: PopulateState::Uninitialized,
                closed_items: VecDeque::new(),
                supports_file_undo: false,
                pending_events: VecDeque::new(),
            }),
        });
        let weak_self: Weak<UndoCoordinator> = Arc::downgrade(&coordinator);
        coordinator.closed_windows.subscribe_as(observer_id, weak_self);
        log::debug!(
            "UndoCoordinator[{}]: Created as observer {observer_id:?}",
            window_id.0
        );
        coordinator
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the state and makes sure the shared closed windows have been pulled in.
    fn populated_state(&self) -> MutexGuard<'_, CoordinatorState> {
        let mut state = self.lock_state();
        self.populate_locked(&mut state);
        state
    }

    pub fn populate(&self) {
        let _state = self.populated_state();
    }

    /*
     * The manager's list is newest first and inserting prepends, so it is walked
     * oldest first. One set of state events is queued for the whole batch.
     */
    fn populate_locked(&self, state: &mut CoordinatorState) {
        if state.populate_state == PopulateState::Populated {
            return;
        }
        state.populate_state = PopulateState::Populated;

        let windows = self.closed_windows.closed_window_item_list();
        log::debug!(
            "UndoCoordinator[{}]: Populating with {} shared closed window(s)",
            self.window_id.0,
            windows.len()
        );
        let mut inserted = 0;
        for window in windows.into_iter().rev() {
            if self.insert_window_locked(state, window) {
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.emit_state_changes_locked(state);
        }
    }

    /*
     * Prepends `item`, first evicting from the old end while the list is at
     * capacity. Tab items are destroyed on eviction; for window items only this
     * coordinator's reference goes away, the shared manager still owns them.
     */
    fn push_front_bounded(&self, state: &mut CoordinatorState, item: ClosedItem) {
        let max = self.settings.max_num_closed_items();
        while state.closed_items.len() >= max {
            let Some(oldest) = state.closed_items.pop_back() else {
                break;
            };
            match oldest.owner() {
                ItemOwner::Coordinator => log::debug!(
                    "UndoCoordinator[{}]: Destroying evicted closed tab '{}' (serial {})",
                    self.window_id.0,
                    oldest.title(),
                    oldest.serial_number()
                ),
                ItemOwner::SharedManager => log::debug!(
                    "UndoCoordinator[{}]: Dropping reference to evicted closed window '{}' (serial {})",
                    self.window_id.0,
                    oldest.title(),
                    oldest.serial_number()
                ),
            }
        }
        state.closed_items.push_front(item);
    }

    // Returns false when the window is already in the list. Queues no events.
    fn insert_window_locked(&self, state: &mut CoordinatorState, window: SharedWindowItem) -> bool {
        if state.closed_items.iter().any(|item| item.is_window(&window)) {
            log::trace!(
                "UndoCoordinator[{}]: Closed window serial {} already listed",
                self.window_id.0,
                window.serial_number()
            );
            return false;
        }
        self.push_front_bounded(state, ClosedItem::Window(window));
        true
    }

    fn emit_state_changes_locked(&self, state: &mut CoordinatorState) {
        let available = self.undo_available_locked(state);
        let text = self.undo_text_locked(state);
        state.pending_events.push_back(UndoEvent::UndoAvailable(available));
        state.pending_events.push_back(UndoEvent::UndoTextChanged(text));
        state
            .pending_events
            .push_back(UndoEvent::ClosedItemsListChanged);
    }

    fn newest_closed_item_is_newer_than_file_undo(&self, state: &CoordinatorState) -> bool {
        state.closed_items.front().is_some_and(|newest| {
            newest.serial_number() > self.file_undo.current_command_serial_number()
        })
    }

    fn undo_available_locked(&self, state: &CoordinatorState) -> bool {
        !state.closed_items.is_empty()
            || self.closed_windows.undo_available()
            || (state.supports_file_undo && self.file_undo.undo_available())
    }

    fn undo_text_locked(&self, state: &CoordinatorState) -> String {
        match state.closed_items.front() {
            Some(newest) if self.newest_closed_item_is_newer_than_file_undo(state) => {
                if newest.is_tab() {
                    UNDO_TEXT_CLOSED_TAB.to_string()
                } else {
                    UNDO_TEXT_CLOSED_WINDOW.to_string()
                }
            }
            None if self.closed_windows.undo_available() => UNDO_TEXT_CLOSED_WINDOW.to_string(),
            _ => self.file_undo.undo_text(),
        }
    }

    pub fn undo_available(&self) -> bool {
        let state = self.populated_state();
        self.undo_available_locked(&state)
    }

    pub fn undo_text(&self) -> String {
        let state = self.populated_state();
        self.undo_text_locked(&state)
    }

    /*
     * Undoes whichever happened last: closing the newest closed item, or the newest
     * file operation. Ties go to the file-undo subsystem.
     */
    pub fn undo(&self) {
        let reopen_closed_item = {
            let state = self.populated_state();
            self.newest_closed_item_is_newer_than_file_undo(&state)
        };

        if reopen_closed_item {
            if let Err(e) = self.undo_closed_item(0) {
                log::error!("UndoCoordinator[{}]: Undo failed: {e}", self.window_id.0);
            }
            return;
        }

        log::debug!(
            "UndoCoordinator[{}]: Delegating undo to the file-undo subsystem",
            self.window_id.0
        );
        self.file_undo.set_ui_parent(Some(self.window_id));
        self.file_undo.undo();
    }

    /*
     * Reopens the closed item at `index`. Calling this on an empty list (or with an
     * out-of-range index) is a contract violation: it is reported and changes nothing.
     */
    pub fn undo_closed_item(&self, index: usize) -> Result<()> {
        let removed = {
            let mut state = self.populated_state();
            if state.closed_items.is_empty() {
                log::error!(
                    "UndoCoordinator[{}]: undo_closed_item({index}) called with no closed items",
                    self.window_id.0
                );
                return Err(UndoError::InvariantViolation(
                    "undo_closed_item called while the closed-items list is empty".to_string(),
                ));
            }
            let len = state.closed_items.len();
            let Some(removed) = state.closed_items.remove(index) else {
                log::error!(
                    "UndoCoordinator[{}]: undo_closed_item({index}) out of range for {len} item(s)",
                    self.window_id.0
                );
                return Err(UndoError::InvariantViolation(format!(
                    "closed item index {index} out of range for {len} item(s)"
                )));
            };

            log::info!(
                "UndoCoordinator[{}]: Reopening closed item '{}' (serial {})",
                self.window_id.0,
                removed.title(),
                removed.serial_number()
            );
            let event = match &removed {
                ClosedItem::Tab(tab) => UndoEvent::OpenClosedTab(tab.clone()),
                ClosedItem::Window(window) => UndoEvent::OpenClosedWindow {
                    item: window.clone(),
                    state: Self::read_window_state(window),
                },
            };
            state.pending_events.push_back(event);
            removed
        };

        if let ClosedItem::Window(window) = &removed {
            self.closed_windows
                .remove_closed_window_item(Some(self.observer_id), window, false);
            // The window is open again; its saved state must not come back a second time.
            window.discard_persisted_state();
        }
        drop(removed);

        let mut state = self.lock_state();
        self.emit_state_changes_locked(&mut state);
        Ok(())
    }

    fn read_window_state(window: &SharedWindowItem) -> Option<WindowState> {
        match window {
            SharedWindowItem::Local(item) => match item.config_group.load() {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "UndoCoordinator: Failed to read state of closed window '{}': {e}",
                        item.title
                    );
                    None
                }
            },
            SharedWindowItem::Remote(_) => None,
        }
    }

    pub fn undo_last_closed_item(&self) -> Result<()> {
        self.undo_closed_item(0)
    }

    /*
     * Records a window closed in this process. The window is listed here right
     * away; the manager then tells every other coordinator, and the echo it sends
     * back to this one is ignored.
     */
    pub fn add_closed_window_item(&self, item: SharedWindowItem) {
        {
            let mut state = self.populated_state();
            log::debug!(
                "UndoCoordinator[{}]: Closed window '{}' (serial {})",
                self.window_id.0,
                item.title(),
                item.serial_number()
            );
            if self.insert_window_locked(&mut state, item.clone()) {
                self.emit_state_changes_locked(&mut state);
            }
        }
        self.closed_windows
            .add_closed_window_item(Some(self.observer_id), item);
    }

    pub fn add_closed_tab_item(&self, tab: ClosedTabItem) {
        let mut state = self.populated_state();
        log::debug!(
            "UndoCoordinator[{}]: Closed tab '{}' (serial {})",
            self.window_id.0,
            tab.title,
            tab.serial_number
        );
        self.push_front_bounded(&mut state, ClosedItem::Tab(tab));
        self.emit_state_changes_locked(&mut state);
    }

    /*
     * Empties the closed-items list. Tabs are always destroyed. Windows are only
     * forgotten for good when `only_in_this_window` is false: then they are removed
     * from the shared manager as well and their persisted state is deleted.
     */
    pub fn clear_closed_items_list(&self, only_in_this_window: bool) {
        let drained: Vec<ClosedItem> = {
            let mut state = self.populated_state();
            state.closed_items.drain(..).collect()
        };
        log::debug!(
            "UndoCoordinator[{}]: Clearing {} closed item(s), only in this window: {only_in_this_window}",
            self.window_id.0,
            drained.len()
        );

        for item in drained {
            match item {
                ClosedItem::Tab(_) => {}
                ClosedItem::Window(window) if !only_in_this_window => {
                    self.closed_windows
                        .remove_closed_window_item(Some(self.observer_id), &window, true);
                    window.discard_persisted_state();
                }
                ClosedItem::Window(_) => {}
            }
        }

        let mut state = self.lock_state();
        state
            .pending_events
            .push_back(UndoEvent::ClosedItemsListChanged);
        let available = self.undo_available_locked(&state);
        state
            .pending_events
            .push_back(UndoEvent::UndoAvailable(available));
        let text = self.undo_text_locked(&state);
        state.pending_events.push_back(UndoEvent::UndoTextChanged(text));
    }

    /// Snapshot of the closed items, newest first, for the "closed items" menu.
    pub fn closed_items_list(&self) -> Vec<ClosedItem> {
        self.populated_state().closed_items.iter().cloned().collect()
    }

    pub fn new_command_serial_number(&self) -> u64 {
        self.file_undo.new_command_serial_number()
    }

    pub fn update_supports_file_undo(&self, enable: bool) {
        let mut state = self.populated_state();
        state.supports_file_undo = enable;
        let available = self.undo_available_locked(&state);
        state
            .pending_events
            .push_back(UndoEvent::UndoAvailable(available));
    }

    pub fn on_file_undo_available_changed(&self, available: bool) {
        let mut state = self.populated_state();
        log::trace!(
            "UndoCoordinator[{}]: File undo availability changed to {available}",
            self.window_id.0
        );
        let available = self.undo_available_locked(&state);
        state
            .pending_events
            .push_back(UndoEvent::UndoAvailable(available));
    }

    // A newer file operation can hide a closed item's label, so the text is re-derived.
    pub fn on_file_undo_text_changed(&self, text: &str) {
        let mut state = self.populated_state();
        log::trace!(
            "UndoCoordinator[{}]: File undo text changed to '{text}'",
            self.window_id.0
        );
        let text = self.undo_text_locked(&state);
        state.pending_events.push_back(UndoEvent::UndoTextChanged(text));
    }

    pub fn try_dequeue_event(&self) -> Option<UndoEvent> {
        self.lock_state().pending_events.pop_front()
    }

    pub fn drain_events(&self) -> Vec<UndoEvent> {
        self.lock_state().pending_events.drain(..).collect()
    }
}

impl ClosedWindowsObserver for UndoCoordinator {
    fn on_window_item_added(&self, origin: Option<ObserverId>, item: &SharedWindowItem) {
        if origin == Some(self.observer_id) {
            return;
        }
        let mut state = self.populated_state();
        if self.insert_window_locked(&mut state, item.clone()) {
            self.emit_state_changes_locked(&mut state);
        }
    }

    fn on_window_item_removed(&self, origin: Option<ObserverId>, item: &SharedWindowItem) {
        if origin == Some(self.observer_id) {
            return;
        }
        let mut state = self.populated_state();
        if let Some(index) = state.closed_items.iter().position(|own| own.is_window(item)) {
            state.closed_items.remove(index);
            log::debug!(
                "UndoCoordinator[{}]: Closed window serial {} removed elsewhere",
                self.window_id.0,
                item.serial_number()
            );
            self.emit_state_changes_locked(&mut state);
        }
    }
}

// Tabs die with their window; closed windows stay with the shared manager.
impl Drop for UndoCoordinator {
    fn drop(&mut self) {
        self.closed_windows.unsubscribe(self.observer_id);
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let tabs = state.closed_items.iter().filter(|item| item.is_tab()).count();
        state.closed_items.clear();
        log::debug!(
            "UndoCoordinator[{}]: Dropped, destroyed {tabs} closed tab(s)",
            self.window_id.0
        );
    }
}
