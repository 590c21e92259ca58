//! Terminal output for the command-line interface

mod report;

pub use report::{Timings, print_summary};
