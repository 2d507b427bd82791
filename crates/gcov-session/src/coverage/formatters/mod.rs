//! Coverage Report Formatters
//!
//! LCOV export of accumulated reports for CI integration.

mod lcov;

pub use lcov::LcovFormatter;
