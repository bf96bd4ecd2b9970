//! Storage adapters for the table catalog.
//!
//! The port itself (`Storage`) and the in-memory implementation live in
//! `tableside-seating`; this module provides backends that touch the outside world.

pub mod json_file;

pub use json_file::JsonFileStorage;
