//! Database repositories for each table.

pub mod options;

pub use options::OptionsRepo;
