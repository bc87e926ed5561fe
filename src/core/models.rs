use super::session_store::{self, ConfigGroup, SessionStoreOperations, WindowState};
use std::sync::Arc;

// Identifies a browser window. Used as the UI parent for file-undo confirmation prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

// Who is responsible for destroying a closed item once it leaves a coordinator's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOwner {
    Coordinator,
    SharedManager,
}

// A tab closed inside one window. Only the coordinator that recorded it holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedTabItem {
    pub serial_number: u64,
    pub title: String,
    pub url: String,
    // Index the tab had in its tab bar, so it can be reopened in place.
    pub position: usize,
}

impl ClosedTabItem {
    pub fn new(serial_number: u64, title: String, url: String, position: usize) -> Self {
        ClosedTabItem {
            serial_number,
            title,
            url,
            position,
        }
    }
}

/*
 * A browser window closed in this process. The restoration state lives in the
 * session store under `config_group`; it is deleted once the window has been
 * reopened or permanently discarded.
 */
#[derive(Debug)]
pub struct ClosedWindowItem {
    pub serial_number: u64,
    pub title: String,
    pub num_tabs: usize,
    pub config_group: ConfigGroup,
}

impl ClosedWindowItem {
    pub fn new(serial_number: u64, title: String, num_tabs: usize, config_group: ConfigGroup) -> Self {
        ClosedWindowItem {
            serial_number,
            title,
            num_tabs,
            config_group,
        }
    }

    pub fn group_name_for(serial_number: u64) -> String {
        format!("Closed_Window{serial_number}")
    }

    /// Saves `state` to the session store and returns the record pointing at it.
    pub fn persist(
        serial_number: u64,
        state: &WindowState,
        store: Arc<dyn SessionStoreOperations>,
    ) -> session_store::Result<Self> {
        let group_name = Self::group_name_for(serial_number);
        store.save_group(&group_name, state)?;
        Ok(ClosedWindowItem::new(
            serial_number,
            state.title.clone(),
            state.tab_urls.len(),
            ConfigGroup::new(group_name, store),
        ))
    }
}

// A window closed by another instance or session. Its state belongs to `source`,
// so there is nothing local to delete when it is reopened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedRemoteWindowItem {
    pub serial_number: u64,
    pub title: String,
    pub num_tabs: usize,
    pub group_name: String,
    pub source: String,
}

impl ClosedRemoteWindowItem {
    pub fn new(
        serial_number: u64,
        title: String,
        num_tabs: usize,
        group_name: String,
        source: String,
    ) -> Self {
        ClosedRemoteWindowItem {
            serial_number,
            title,
            num_tabs,
            group_name,
            source,
        }
    }
}

/*
 * A closed window as held by the shared manager and referenced by every
 * coordinator. Cloning shares the allocation; identity is the allocation itself,
 * so two records with equal fields are still different windows.
 */
#[derive(Debug, Clone)]
pub enum SharedWindowItem {
    Local(Arc<ClosedWindowItem>),
    Remote(Arc<ClosedRemoteWindowItem>),
}

impl SharedWindowItem {
    pub fn serial_number(&self) -> u64 {
        match self {
            SharedWindowItem::Local(item) => item.serial_number,
            SharedWindowItem::Remote(item) => item.serial_number,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SharedWindowItem::Local(item) => &item.title,
            SharedWindowItem::Remote(item) => &item.title,
        }
    }

    pub fn num_tabs(&self) -> usize {
        match self {
            SharedWindowItem::Local(item) => item.num_tabs,
            SharedWindowItem::Remote(item) => item.num_tabs,
        }
    }

    pub fn same_item(&self, other: &SharedWindowItem) -> bool {
        match (self, other) {
            (SharedWindowItem::Local(a), SharedWindowItem::Local(b)) => Arc::ptr_eq(a, b),
            (SharedWindowItem::Remote(a), SharedWindowItem::Remote(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Discards the persisted restoration state, if this window has any locally.
    pub fn discard_persisted_state(&self) {
        if let SharedWindowItem::Local(item) = self {
            item.config_group.delete_group();
        }
    }
}

impl From<ClosedWindowItem> for SharedWindowItem {
    fn from(item: ClosedWindowItem) -> Self {
        SharedWindowItem::Local(Arc::new(item))
    }
}

impl From<ClosedRemoteWindowItem> for SharedWindowItem {
    fn from(item: ClosedRemoteWindowItem) -> Self {
        SharedWindowItem::Remote(Arc::new(item))
    }
}

// An entry in a coordinator's closed-items list.
#[derive(Debug, Clone)]
pub enum ClosedItem {
    Tab(ClosedTabItem),
    Window(SharedWindowItem),
}

impl ClosedItem {
    pub fn serial_number(&self) -> u64 {
        match self {
            ClosedItem::Tab(tab) => tab.serial_number,
            ClosedItem::Window(window) => window.serial_number(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ClosedItem::Tab(tab) => &tab.title,
            ClosedItem::Window(window) => window.title(),
        }
    }

    pub fn owner(&self) -> ItemOwner {
        match self {
            ClosedItem::Tab(_) => ItemOwner::Coordinator,
            ClosedItem::Window(_) => ItemOwner::SharedManager,
        }
    }

    pub fn is_tab(&self) -> bool {
        self.owner() == ItemOwner::Coordinator
    }

    pub fn is_window(&self, window: &SharedWindowItem) -> bool {
        match self {
            ClosedItem::Window(own) => own.same_item(window),
            ClosedItem::Tab(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session_store::{ConfigGroup, CoreSessionStore};
    use tempfile::tempdir;

    fn remote(serial: u64) -> SharedWindowItem {
        ClosedRemoteWindowItem::new(
            serial,
            "Remote".to_string(),
            2,
            "Closed_Window7".to_string(),
            "session-b".to_string(),
        )
        .into()
    }

    #[test]
    fn test_owner_follows_variant() {
        let tab = ClosedItem::Tab(ClosedTabItem::new(1, "t".into(), "file:///t".into(), 0));
        let window = ClosedItem::Window(remote(2));
        assert_eq!(tab.owner(), ItemOwner::Coordinator);
        assert!(tab.is_tab());
        assert_eq!(window.owner(), ItemOwner::SharedManager);
        assert!(!window.is_tab());
    }

    #[test]
    fn test_same_item_uses_identity_not_equality() {
        let a = remote(3);
        let b = remote(3);
        assert!(a.same_item(&a.clone()));
        assert!(!a.same_item(&b));
        assert!(ClosedItem::Window(a.clone()).is_window(&a));
        assert!(!ClosedItem::Window(b).is_window(&a));
    }

    #[test]
    fn test_local_window_accessors() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(CoreSessionStore::new(dir.path().to_path_buf()));
        let group = ConfigGroup::new("Closed_Window1".to_string(), store);
        let window: SharedWindowItem =
            ClosedWindowItem::new(9, "Home".to_string(), 4, group).into();
        assert_eq!(window.serial_number(), 9);
        assert_eq!(window.title(), "Home");
        assert_eq!(window.num_tabs(), 4);
        assert!(!window.same_item(&remote(9)));
    }

    #[test]
    fn test_persist_saves_state_under_serial_group() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(CoreSessionStore::new(dir.path().to_path_buf()));
        let state = WindowState {
            title: "Downloads".to_string(),
            tab_urls: vec!["file:///a".to_string(), "file:///b".to_string()],
            active_tab: 0,
        };

        let item = ClosedWindowItem::persist(12, &state, store.clone()).unwrap();

        assert_eq!(item.config_group.name(), "Closed_Window12");
        assert_eq!(item.num_tabs, 2);
        assert_eq!(item.title, "Downloads");
        assert_eq!(store.load_group("Closed_Window12").unwrap(), Some(state));

        let shared: SharedWindowItem = item.into();
        shared.discard_persisted_state();
        assert_eq!(store.load_group("Closed_Window12").unwrap(), None);
    }
}
