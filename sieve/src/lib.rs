//! Filter-condition engine and HTML sanitizer for admin consoles.
//!
//! [`domain::filters`] evaluates AND/OR condition trees against JSON records
//! and converts them to and from URL parameters. [`domain::sanitize`] cleans
//! user-supplied markup. [`core`] and the `sieve` binary expose both on the
//! command line.

mod app;
pub mod core;
pub mod domain;
pub mod utils;
