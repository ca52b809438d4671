//! package-nominal: nominal package dimensions from tolerance ranges
//!
//! Computes the nominal value of each package dimension from its min/max
//! tolerance range and derives the secondary geometry a land pattern
//! designer needs: BGA overmold/laminate split, standoff-adjusted lead
//! height, die size and lead shoulder width.
//!
//! # Modules
//!
//! - [`nominal`] - The calculation engine (pure, no I/O)
//! - [`export`] - Appending summaries to a text file
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types
//! - [`mcp`] - MCP server exposing the calculator as tools

pub mod config;
pub mod error;
pub mod export;
pub mod mcp;
pub mod nominal;
