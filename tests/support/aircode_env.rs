use std::{
    path::Path,
    sync::{Mutex, OnceLock},
};

const CONFIG_HOME_ENV: &str = "AIRCODE_CONFIG_HOME";

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points `AIRCODE_CONFIG_HOME` at a test directory until dropped.
pub struct AircodeEnvGuard {
    previous: Option<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl AircodeEnvGuard {
    pub fn set_config_home(path: &Path) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(CONFIG_HOME_ENV).ok();
        // SAFETY: env mutations are serialized by ENV_LOCK.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for AircodeEnvGuard {
    fn drop(&mut self) {
        // SAFETY: env mutations are serialized by ENV_LOCK.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}
