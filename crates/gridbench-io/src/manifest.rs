//! Manifest schema for persisted dataset splits.
//!
//! Each split directory contains a `manifest.json` file that:
//! - Tracks schema version for migration support
//! - Records the sample count and the ordered attribute list
//! - Stores SHA256 checksums and widths of all attribute files
//!
//! The manifest is written last, so its presence marks a complete split.

use chrono::{DateTime, Utc};
use gridbench_core::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Current schema version (semver)
pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

/// File name of the manifest inside a split directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Complete manifest for one persisted split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitManifest {
    /// Schema version for migration support (e.g., "1.0.0")
    pub schema_version: String,

    /// Timestamp when the split was written
    pub created_at: DateTime<Utc>,

    /// gridbench version that wrote this split
    pub gridbench_version: String,

    /// Split name ("train", "val", ...)
    pub split: String,

    /// Number of samples shared by every attribute
    pub sample_count: u64,

    /// Attribute files in split order
    pub attributes: Vec<AttributeInfo>,
}

/// Metadata for a single attribute file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    /// Attribute name (e.g., "p_or")
    pub name: String,

    /// File name relative to the split directory
    pub file: String,

    /// Number of elements per sample
    pub width: u64,

    /// Number of rows written
    pub row_count: u64,

    /// SHA256 checksum of the .arrow file
    pub sha256: String,

    /// File size in bytes
    pub file_size_bytes: u64,
}

impl SplitManifest {
    pub fn new(split: impl Into<String>, sample_count: u64) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            gridbench_version: env!("CARGO_PKG_VERSION").to_string(),
            split: split.into(),
            sample_count,
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, info: AttributeInfo) {
        self.attributes.push(info);
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|info| info.name == name)
    }

    /// Check if this manifest's schema version is compatible with current code
    pub fn is_compatible(&self) -> BenchResult<()> {
        use semver::Version;

        let manifest_version = Version::parse(&self.schema_version).map_err(|e| {
            BenchError::corrupt(&self.split, format!("invalid schema version: {e}"))
        })?;
        let current_version = Version::parse(CURRENT_SCHEMA_VERSION)
            .map_err(|e| BenchError::Other(e.to_string()))?;

        // Same major version reads fine; a newer major is rejected
        if manifest_version.major > current_version.major {
            return Err(BenchError::corrupt(
                &self.split,
                format!(
                    "schema v{} is too new (this version supports up to v{})",
                    self.schema_version, CURRENT_SCHEMA_VERSION
                ),
            ));
        }
        Ok(())
    }

    /// Verify every recorded attribute agrees with the manifest sample count
    pub fn verify_counts(&self) -> BenchResult<()> {
        for info in &self.attributes {
            if info.row_count != self.sample_count {
                return Err(BenchError::corrupt(
                    &self.split,
                    format!(
                        "attribute '{}' has {} samples but the split records {}",
                        info.name, info.row_count, self.sample_count
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Validate checksums of all attribute files
    pub fn validate_checksums(&self, base_path: &Path) -> BenchResult<()> {
        for info in &self.attributes {
            let file_path = base_path.join(&info.file);
            if !file_path.exists() {
                return Err(BenchError::corrupt(
                    &self.split,
                    format!("attribute file not found: {}", file_path.display()),
                ));
            }
            let actual = compute_sha256(&file_path)?;
            if actual != info.sha256 {
                return Err(BenchError::corrupt(
                    &self.split,
                    format!(
                        "checksum mismatch for attribute '{}': expected {}, got {}",
                        info.name, info.sha256, actual
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Compute SHA256 hash of a file
pub fn compute_sha256(path: &Path) -> BenchResult<String> {
    use sha2::{Digest, Sha256};

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, rows: u64) -> AttributeInfo {
        AttributeInfo {
            name: name.into(),
            file: format!("{name}.arrow"),
            width: 3,
            row_count: rows,
            sha256: "abc123".into(),
            file_size_bytes: 1024,
        }
    }

    #[test]
    fn new_manifest_uses_current_schema() {
        let manifest = SplitManifest::new("train", 0);
        assert_eq!(manifest.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(manifest.gridbench_version, env!("CARGO_PKG_VERSION"));
        assert!(manifest.attributes.is_empty());
    }

    #[test]
    fn newer_major_version_is_rejected() {
        let mut manifest = SplitManifest::new("val", 0);
        manifest.schema_version = "1.4.0".into();
        assert!(manifest.is_compatible().is_ok());
        manifest.schema_version = "2.0.0".into();
        assert!(manifest.is_compatible().is_err());
    }

    #[test]
    fn verify_counts_flags_mismatched_attribute() {
        let mut manifest = SplitManifest::new("test", 5);
        manifest.add_attribute(info("p_or", 5));
        assert!(manifest.verify_counts().is_ok());
        manifest.add_attribute(info("p_ex", 4));
        assert!(matches!(
            manifest.verify_counts(),
            Err(BenchError::CorruptData { .. })
        ));
    }

    #[test]
    fn attribute_lookup_by_name() {
        let mut manifest = SplitManifest::new("test", 5);
        manifest.add_attribute(info("a_or", 5));
        assert_eq!(manifest.attribute("a_or").map(|i| i.width), Some(3));
        assert!(manifest.attribute("v_or").is_none());
    }
}
