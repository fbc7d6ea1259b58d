//! Persistence access - queries and version-checked writes over the storage layer.

pub mod benefits;

pub use benefits::{
    NewBenefit, active, count_all, find_active_by_id, find_all_active, find_by_id, insert,
    save_versioned, search_active_by_name,
};
