//! Host-facing input and output formats used by the command line driver.

pub mod json;
