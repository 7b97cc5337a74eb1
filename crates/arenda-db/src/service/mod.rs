//! # Service Layer
//!
//! Transactional operations spanning multiple tables. This is the
//! surface the excluded HTTP/UI layer consumes.
//!
//! ## Why a service layer?
//! Entities never reach across and mutate each other (an order never
//! touches product stock from a save hook). Every cross-entity write
//! (admission + insert, restore + status, checkout + cart clear) lives
//! in a service method that owns one transaction, so the atomicity
//! requirements are visible in exactly one place.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod notify;
pub mod order;
