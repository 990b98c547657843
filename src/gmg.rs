//! Transfers between levels of a patch hierarchy
mod error;
mod in_flight;
mod inter_level_comm;
mod plan;

pub use error::InterLevelCommError;
pub use in_flight::EXCHANGE_TAG;
pub use inter_level_comm::InterLevelComm;
pub use plan::{ExchangePlan, TransferList};
