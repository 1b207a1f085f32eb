//! Cosmetic rewards and the gate that hands them out in order.

mod catalog;
mod gate;

pub use catalog::{default_catalog, Reward, RewardCategory, RewardStatus};
pub use gate::{GateError, Identity, RewardGate};
