//! Process-wide shutdown request flag.
//!
//! Raised from the interrupt handler (another thread) and read by the scene
//! machine at the top of every update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::EngineError;

#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise this flag on Ctrl-C / SIGTERM.
    ///
    /// Only one handler may be installed per process.
    pub fn install_interrupt_handler(&self) -> Result<(), EngineError> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, shutting down");
            flag.request();
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();
        assert!(!other.is_requested());
        flag.request();
        assert!(other.is_requested());
    }

    #[test]
    fn request_from_another_thread_is_visible() {
        let flag = ShutdownFlag::new();
        let remote = flag.clone();
        std::thread::spawn(move || remote.request()).join().unwrap();
        assert!(flag.is_requested());
    }
}
