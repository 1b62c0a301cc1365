use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

use crate::logging::syslog::info;

pub struct ShutdownManager {
    should_terminate: AtomicBool,
    cancellation_token: CancellationToken,
}

impl ShutdownManager {
    pub fn new() -> Self {
        ShutdownManager {
            should_terminate: AtomicBool::new(false),
            cancellation_token: CancellationToken::new(),
        }
    }

    #[cfg(test)]
    fn should_terminate(&self) -> bool {
        self.should_terminate.load(Ordering::SeqCst)
    }

    pub fn initiate_shutdown(&self) {
        // Only the first caller cancels
        if self.should_terminate.swap(true, Ordering::SeqCst) {
            return;
        }
        info("Shutting down, no new connections will be accepted");
        self.cancellation_token.cancel();
    }

    pub fn get_cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

static SHUTDOWN_MANAGER_SINGLETON: OnceLock<ShutdownManager> = OnceLock::new();

pub fn get_shutdown_manager() -> &'static ShutdownManager {
    SHUTDOWN_MANAGER_SINGLETON.get_or_init(ShutdownManager::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_cancels_token_once() {
        let manager = ShutdownManager::new();
        let token = manager.get_cancellation_token();
        assert!(!manager.should_terminate());
        assert!(!token.is_cancelled());

        manager.initiate_shutdown();
        manager.initiate_shutdown();
        assert!(manager.should_terminate());
        assert!(token.is_cancelled());
    }
}
