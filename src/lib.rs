#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
/// Error handling and custom [`Error`](std::error::Error) types
pub mod errors;
/// Functions for decoding transfer requests and reporting account states
pub mod io;
/// Business logic for emitting, destroying and transferring money
mod ops;
/// Data types used throughout the ledger
pub mod types;
