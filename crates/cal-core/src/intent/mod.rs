//! Intent model and confirmation state machine
//!
//! An [`Intent`] describes one desired calendar operation and its current
//! approval state. The [`IntentMachine`] owns its lifecycle: conflict
//! check, the pending-confirmation checkpoint, and the commit after
//! explicit approval.

mod checkpoint;
mod machine;
mod types;

pub use checkpoint::CheckpointStore;
pub use machine::IntentMachine;
pub use types::{Intent, IntentOp, IntentStatus};
