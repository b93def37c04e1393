//! Terminal output: status lines, progress and tables.

pub mod reporter;
pub mod table;
pub mod theme;

pub use reporter::ConsoleReporter;
