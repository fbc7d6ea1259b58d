//! Domain service: validation, CRUD over benefits, and transfers.

pub mod benefit;
pub mod transfer;
pub mod validation;
