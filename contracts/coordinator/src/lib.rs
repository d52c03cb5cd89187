pub mod contract;
pub mod dispute;
pub mod error;
pub mod fees;
pub mod msg;
pub mod query;
pub mod registry;
pub mod renewal;
pub mod request;
pub mod selection;
pub mod sequencer;
pub mod state;
pub mod submit;
pub mod windows;

#[cfg(test)]
mod testing;

pub use crate::error::ContractError;
