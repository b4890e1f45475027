pub mod at_channel;

pub use at_channel::{AtChannel, Capability, CapabilitySet};
