//! Testing utilities for ingestion pipelines.
//!
//! - [`destination`] provides [`destination::ScriptedDestination`], a destination that records
//!   every batch and can reject chosen records or fail whole bulk calls.
//! - [`source`] provides sources with scripted failures.
//! - [`progress`] provides a progress sink capturing every snapshot.
//! - [`records`] builds numbered JSON records and reads their ids back.
//! - [`notify`] provides timed waiting helpers.

pub mod destination;
pub mod notify;
pub mod progress;
pub mod records;
pub mod source;
