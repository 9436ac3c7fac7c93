//! Core types and trait definitions for the Ligtas case-management service.
//!
//! Holds the case record, the status transition guard and the store trait.
//! No HTTP or database code lives here.

pub mod assignment;
pub mod case;
pub mod chat;
pub mod error;
pub mod form;
pub mod mask;
pub mod news;
pub mod reference;
pub mod report;
pub mod staff;
pub mod status;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
