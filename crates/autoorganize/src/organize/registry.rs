//! In-memory guard: at most one active operation per result id.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default, Clone)]
pub struct InProgressRegistry {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ids(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set holds no invariant a panicking holder could break.
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomically claims `id`. Returns `None` when someone else holds it;
    /// the claim is released when the guard is dropped.
    pub fn try_acquire(&self, id: &str) -> Option<InProgressGuard> {
        if self.ids().insert(id.to_string()) {
            Some(InProgressGuard {
                registry: self.clone(),
                id: id.to_string(),
            })
        } else {
            None
        }
    }

    pub fn release(&self, id: &str) {
        self.ids().remove(id);
    }

    pub fn is_in_progress(&self, id: &str) -> bool {
        self.ids().contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct InProgressGuard {
    registry: InProgressRegistry,
    id: String,
}

impl InProgressGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}
