#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for plugkit
//!
//! This crate provides the HTTP client used to talk to the package
//! registry and to fetch package artifacts. Downloads stream to a
//! temporary file, verify an optional blake3 checksum, and land at
//! their destination via atomic rename.

mod client;
mod download;

pub use client::{NetClient, NetConfig};
pub use download::{download_file, Download, DownloadResult};
