//! Prelude module - commonly used types for convenient import.
//!
//! Use `use dispatch_queue::prelude::*;` to import all essential types.

// Errors
pub use crate::{QueueError, QueueResult};

// Items
pub use crate::{WorkItem, WorkStatus};

// The queue
pub use crate::{QUEUE_FILE, WipRates, WorkQueue, WorkQueueState};
