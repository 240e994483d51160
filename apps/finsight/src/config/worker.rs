//! Background download worker configuration.

use serde::{Deserialize, Serialize};

/// Worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Pending downloads accepted before the queue reports full.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

const fn default_queue_capacity() -> usize {
    64
}
