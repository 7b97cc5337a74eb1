//! # Repository Layer
//!
//! Per-table query sets over the SQLite pool.
//!
//! ## Conventions
//! - One repository struct per aggregate table, holding a pool clone
//! - `*_in(conn, ...)` associated variants run on an explicit connection
//!   so services can compose them inside one transaction
//! - Reads return `Option<T>`; guarded writes map `rows_affected() == 0`
//!   to `DbError::NotFound`
//!
//! Cross-table workflows (admission, checkout, restore) do NOT live
//! here; they belong to the service layer, which owns transactions.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
