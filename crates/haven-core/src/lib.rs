//! # haven-core
//!
//! Core types, state machines and pure computations for Haven.
//!
//! This crate provides the foundational pieces shared across all Haven crates:
//! - Entity structs for all domain objects (sessions, contacts, places, feedback)
//! - State enums with transition tables
//! - The timed-session lifecycle (create, resolve, cancel, escalate, extend, locate)
//! - Great-circle distance and bounding boxes
//! - The community helpfulness score for places
//! - ID prefix constants, cross-cutting error types, clocks and the alarm guard

pub mod alarm;
pub mod clock;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod geo;
pub mod identity;
pub mod ids;
pub mod lifecycle;
pub mod scoring;
