/*
 * Process-wide command serial numbers. Every undoable action (file operation,
 * closed tab, closed window) draws its serial from the one counter shared by the
 * file-undo subsystem, which is what makes comparisons between the separate
 * histories meaningful.
 */
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CommandSerialCounter {
    last_issued: AtomicU64,
}

impl CommandSerialCounter {
    pub fn new() -> Self {
        CommandSerialCounter {
            last_issued: AtomicU64::new(0),
        }
    }

    /// Issues a fresh serial number. The first value is 1; 0 means "nothing recorded".
    pub fn next(&self) -> u64 {
        let serial = self.last_issued.fetch_add(1, Ordering::SeqCst) + 1;
        log::trace!("CommandSerialCounter: Issued serial {serial}");
        serial
    }

    pub fn current(&self) -> u64 {
        self.last_issued.load(Ordering::SeqCst)
    }
}
