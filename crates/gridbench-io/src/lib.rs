//! # gridbench-io: persisted dataset layout
//!
//! One directory per benchmark, one sub-directory per split, one Arrow IPC table
//! per attribute plus a checksummed `manifest.json`. Generation goes through a
//! [`StagedDirectory`] so the live directory is only replaced once every split
//! has been written.

pub mod manifest;
pub mod report;
pub mod split_reader;
pub mod split_writer;
pub mod staging;

pub use manifest::{compute_sha256, AttributeInfo, SplitManifest, CURRENT_SCHEMA_VERSION};
pub use report::write_report;
pub use split_reader::{read_manifest, read_split};
pub use split_writer::{attribute_file_name, split_dir, write_split};
pub use staging::StagedDirectory;
