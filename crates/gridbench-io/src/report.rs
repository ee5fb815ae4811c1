use gridbench_core::BenchResult;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write an evaluation report as pretty JSON, creating parent directories.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> BenchResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn report_writes_and_reads_back() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("val.json");
        let mut report = BTreeMap::new();
        report.insert("mae".to_string(), 0.25);
        write_report(&path, &report).unwrap();
        let parsed: BTreeMap<String, f64> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["mae"], 0.25);
    }
}
