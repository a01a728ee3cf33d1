use std::sync::{Arc, RwLock};

use crate::config::schema::AutoOrganizeConfig;

/// The live configuration. Each run works on the snapshot it took at the
/// start; `replace` only affects later runs.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    current: Arc<RwLock<Arc<AutoOrganizeConfig>>>,
}

impl SharedConfig {
    pub fn new(config: AutoOrganizeConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn snapshot(&self) -> Arc<AutoOrganizeConfig> {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, config: AutoOrganizeConfig) {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        *guard = Arc::new(config);
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(AutoOrganizeConfig::default())
    }
}
