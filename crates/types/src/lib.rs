#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the plugkit installation orchestrator
//!
//! This crate provides the fundamental types used throughout the system:
//! package identifiers, distribution channels, the fixed pipeline step
//! order, and the persisted run/item progress records.

pub mod package;
pub mod run;

pub use package::{Channel, PackageId};
pub use run::{CurrentStep, ItemState, RunState, RunStatus, StepName};
