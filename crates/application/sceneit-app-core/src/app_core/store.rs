use std::sync::{Arc, Mutex};

use crate::domain::AppState;

use super::{events::DomainEvent, reducer::reduce};

#[derive(Clone)]
pub struct AppStore {
    inner: Arc<Mutex<AppState>>,
}

impl AppStore {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> AppState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Reads part of the state without cloning all of it.
    pub fn select<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.inner.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn apply(&self, ev: DomainEvent) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let prev = std::mem::take(&mut *guard);
        *guard = reduce(prev, ev);
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}
