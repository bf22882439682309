pub mod client;
pub mod contract;
pub mod payloads;

pub use client::{AptosClient, BillLedger};
pub use contract::BillContract;
pub use payloads::EntryFunctionPayload;
