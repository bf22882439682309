//! Turns raw `get_user_bills` records into the [`Bill`](crate::models::Bill)
//! shape the dashboard works with.

pub mod decoder;
pub mod normalizer;
pub mod samples;
pub mod units;

pub use normalizer::normalize_batch;
pub use units::{apt_to_octas, octas_to_apt};
