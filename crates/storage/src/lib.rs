#![forbid(unsafe_code)]

//! SQLite-backed storage for context widget menus.
//!
//! Every mutation runs inside one write transaction: the group is read, the
//! tree engine computes a plan, and the plan is written back before commit.

mod store;

pub use store::*;
