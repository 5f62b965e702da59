//! Application services.
//!
//! - [`ActivityProcessingService`]: one diff-and-route cycle over all channels
//! - [`Scheduler`]: drives cycles on a fixed interval
//! - [`VoiceWatch`]: wires everything together

pub mod container;
pub mod processing;
pub mod scheduler;

pub use container::{Backends, VoiceWatch};
pub use processing::{ActivityProcessingService, CycleReport};
pub use scheduler::Scheduler;
