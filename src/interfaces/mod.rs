//! Input and output formats of the command line tool.

pub mod csv;
pub mod json;
