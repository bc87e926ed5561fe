/*
 * The process-wide list of closed windows. Every window's undo coordinator
 * subscribes here; the manager is the only place the canonical list is mutated,
 * and every change is broadcast synchronously to all subscribers, including the
 * one that requested it. Events carry the requesting subscriber's id as `origin`
 * so it can skip work it has already done; changes the manager makes on its own
 * (capacity eviction) carry `None`.
 *
 * Subscribers are held weakly. The internal lock is released before observers
 * run, so an observer may call back into the manager while handling an event.
 */
use super::config::UndoSettingsProvider;
use super::models::SharedWindowItem;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

pub trait ClosedWindowsObserver: Send + Sync {
    fn on_window_item_added(&self, origin: Option<ObserverId>, item: &SharedWindowItem);
    fn on_window_item_removed(&self, origin: Option<ObserverId>, item: &SharedWindowItem);
}

#[derive(Debug, Clone, Copy)]
enum Broadcast {
    Added,
    Removed,
}

#[derive(Default)]
struct ManagerState {
    items: VecDeque<SharedWindowItem>,
    observers: Vec<(ObserverId, Weak<dyn ClosedWindowsObserver>)>,
    next_observer_id: u64,
}

pub struct ClosedWindowsManager {
    settings: Arc<dyn UndoSettingsProvider>,
    state: Mutex<ManagerState>,
}

impl ClosedWindowsManager {
    pub fn new(settings: Arc<dyn UndoSettingsProvider>) -> Self {
        ClosedWindowsManager {
            settings,
            state: Mutex::new(ManagerState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, observer: Weak<dyn ClosedWindowsObserver>) -> ObserverId {
        let id = self.allocate_observer_id();
        self.subscribe_as(id, observer);
        id
    }

    /// Hands out an id without registering anything, for observers that need to
    /// know their id before they can be subscribed.
    pub fn allocate_observer_id(&self) -> ObserverId {
        let mut state = self.lock_state();
        state.next_observer_id += 1;
        ObserverId(state.next_observer_id)
    }

    // `observer` must be upgradable; entries that are not are pruned on broadcast.
    pub fn subscribe_as(&self, id: ObserverId, observer: Weak<dyn ClosedWindowsObserver>) {
        self.lock_state().observers.push((id, observer));
        log::debug!("ClosedWindowsManager: Subscribed observer {id:?}");
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.lock_state()
            .observers
            .retain(|(observer_id, _)| *observer_id != id);
        log::debug!("ClosedWindowsManager: Unsubscribed observer {id:?}");
    }

    pub fn observer_count(&self) -> usize {
        self.lock_state().observers.len()
    }

    /*
     * Prepends `item` to the canonical list, first evicting the oldest entries while
     * the list is at capacity. Evicted windows can no longer be reopened from any
     * window, so their removal is broadcast and their persisted state discarded.
     */
    pub fn add_closed_window_item(&self, origin: Option<ObserverId>, item: SharedWindowItem) {
        log::trace!(
            "ClosedWindowsManager: Adding '{}' (serial {}) from {origin:?}",
            item.title(),
            item.serial_number()
        );
        let max = self.settings.max_num_closed_items();
        let evicted: Vec<SharedWindowItem> = {
            let mut state = self.lock_state();
            let mut evicted = Vec::new();
            while state.items.len() >= max {
                match state.items.pop_back() {
                    Some(oldest) => evicted.push(oldest),
                    None => break,
                }
            }
            state.items.push_front(item.clone());
            evicted
        };

        for oldest in &evicted {
            log::debug!(
                "ClosedWindowsManager: Evicting '{}' (serial {}) at capacity {max}",
                oldest.title(),
                oldest.serial_number()
            );
            self.broadcast(Broadcast::Removed, None, oldest);
            oldest.discard_persisted_state();
        }
        self.broadcast(Broadcast::Added, origin, &item);
    }

    /*
     * Removes `item` if tracked and broadcasts the removal. `permanent_discard` is
     * informational: the manager keeps no persisted state itself, so callers that
     * forget the window for good release it with `discard_persisted_state()`.
     */
    pub fn remove_closed_window_item(
        &self,
        origin: Option<ObserverId>,
        item: &SharedWindowItem,
        permanent_discard: bool,
    ) {
        let removed = {
            let mut state = self.lock_state();
            match state.items.iter().position(|own| own.same_item(item)) {
                Some(index) => state.items.remove(index).is_some(),
                None => false,
            }
        };
        if !removed {
            log::debug!(
                "ClosedWindowsManager: '{}' (serial {}) is not tracked, nothing to remove",
                item.title(),
                item.serial_number()
            );
            return;
        }
        log::debug!(
            "ClosedWindowsManager: Removed '{}' (serial {}) from {origin:?}, permanent: {permanent_discard}",
            item.title(),
            item.serial_number()
        );
        self.broadcast(Broadcast::Removed, origin, item);
    }

    /// Newest first.
    pub fn closed_window_item_list(&self) -> Vec<SharedWindowItem> {
        self.lock_state().items.iter().cloned().collect()
    }

    pub fn undo_available(&self) -> bool {
        !self.lock_state().items.is_empty()
    }

    fn broadcast(&self, kind: Broadcast, origin: Option<ObserverId>, item: &SharedWindowItem) {
        let observers: Vec<Arc<dyn ClosedWindowsObserver>> = {
            let mut state = self.lock_state();
            state
                .observers
                .retain(|(_, observer)| observer.strong_count() > 0);
            state
                .observers
                .iter()
                .filter_map(|(_, observer)| observer.upgrade())
                .collect()
        };
        log::trace!(
            "ClosedWindowsManager: Broadcasting {kind:?} of serial {} to {} observer(s)",
            item.serial_number(),
            observers.len()
        );
        for observer in observers {
            match kind {
                Broadcast::Added => observer.on_window_item_added(origin, item),
                Broadcast::Removed => observer.on_window_item_removed(origin, item),
            }
        }
    }
}
