//! Connection context shared by every operation of a client.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::driver::{Driver, Selection};

/// The live driver handle plus the current namespace/database selection.
///
/// Driver calls hold a read guard on `gate` for as long as they run, and
/// selection changes hold the write guard. A selection switch therefore waits
/// for in-flight calls, and no call starts halfway through a switch.
pub struct ConnectionContext {
    driver: Arc<dyn Driver>,
    selection: ArcSwap<Selection>,
    gate: Arc<RwLock<()>>,
}

impl ConnectionContext {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            selection: ArcSwap::from_pointee(Selection::default()),
            gate: Arc::new(RwLock::new(())),
        }
    }

    pub fn driver(&self) -> Arc<dyn Driver> {
        self.driver.clone()
    }

    /// Snapshot of the current selection.
    pub fn selection(&self) -> Selection {
        self.selection.load().as_ref().clone()
    }

    pub(crate) fn set_selection(&self, selection: Selection) {
        self.selection.store(Arc::new(selection));
    }

    /// Guard held by a driver call for its whole run.
    pub(crate) async fn enter(gate: Arc<RwLock<()>>) -> OwnedRwLockReadGuard<()> {
        gate.read_owned().await
    }

    /// Exclusive guard for a selection switch.
    pub(crate) async fn exclusive(&self) -> OwnedRwLockWriteGuard<()> {
        self.gate.clone().write_owned().await
    }

    pub(crate) fn gate(&self) -> Arc<RwLock<()>> {
        self.gate.clone()
    }
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("selection", &self.selection())
            .finish()
    }
}
