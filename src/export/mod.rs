//! Writing tables back to disk.

pub mod csv;

pub use self::csv::{write_csv_to_path, write_csv_to_writer};
