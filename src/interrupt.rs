use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, TableResult};

/// Cooperative cancellation flag shared between a caller and a running
/// concatenation. Checked between input tables, never inside one.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the running operation to stop at its next checkpoint.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// # Errors
    /// [Error::Interrupted] once [Interrupt::interrupt] has been called.
    pub fn check(&self, operation: &'static str, position: usize) -> TableResult<()> {
        if self.is_interrupted() {
            log::debug!("{operation}: interrupted before input {position}");
            return Err(Error::Interrupted { operation, position });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();

        assert!(interrupt.check("bind_rows", 1).is_ok());
        handle.interrupt();
        assert_eq!(
            interrupt.check("bind_rows", 2),
            Err(Error::Interrupted {
                operation: "bind_rows",
                position: 2,
            })
        );
    }
}
