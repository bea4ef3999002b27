//! Repository modules implementing store operations for all Haven entities.
//!
//! Each module adds methods to `HavenService` via `impl HavenService` blocks.

pub mod contact;
pub mod event;
pub mod feedback;
pub mod place;
pub mod session;
