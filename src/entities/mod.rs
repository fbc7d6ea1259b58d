//! Entity module - Contains the SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod benefit;

pub use benefit::{Entity as Benefit, Model as BenefitModel};
