//! Sample containers shared by dataset generation, persistence and evaluation.
//!
//! A [`SampleSet`] maps attribute names (`prod_p`, `p_or`, ...) to an
//! [`AttributeArray`], a dense row-major `n_samples x n_elements` block of
//! `f64`. Row order is the temporal order in which samples were produced.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Dense row-major matrix holding one attribute for every sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeArray {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl AttributeArray {
    /// Empty array whose width is fixed by the first pushed row.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> BenchResult<Self> {
        if rows * cols != data.len() {
            return Err(BenchError::Validation(format!(
                "{} values cannot form a {}x{} array",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> BenchResult<Self> {
        let mut array = Self::empty();
        for row in rows {
            array.push_row(row)?;
        }
        Ok(array)
    }

    pub fn push_row(&mut self, row: &[f64]) -> BenchResult<()> {
        if self.rows == 0 {
            self.cols = row.len();
        } else if row.len() != self.cols {
            return Err(BenchError::Validation(format!(
                "row of width {} does not match array width {}",
                row.len(),
                self.cols
            )));
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.cols;
        Some(&self.data[start..start + self.cols])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |idx| {
            let start = idx * self.cols;
            &self.data[start..start + self.cols]
        })
    }

    /// Values of column `col` across all rows.
    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        if col >= self.cols {
            return None;
        }
        Some(self.iter_rows().map(|row| row[col]).collect())
    }

    /// Per-row sum across elements.
    pub fn row_sums(&self) -> Vec<f64> {
        self.iter_rows().map(|row| row.iter().sum()).collect()
    }

    /// Copy of the rows in `range`, clamped to the array bounds.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let start = range.start.min(self.rows);
        let end = range.end.clamp(start, self.rows);
        Self {
            rows: end - start,
            cols: self.cols,
            data: self.data[start * self.cols..end * self.cols].to_vec(),
        }
    }

    /// Append all rows of `other`.
    pub fn extend(&mut self, other: &AttributeArray) -> BenchResult<()> {
        for row in other.iter_rows() {
            self.push_row(row)?;
        }
        Ok(())
    }
}

/// One accepted simulator state, keyed by attribute name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    values: BTreeMap<String, Vec<f64>>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.values.insert(name.into(), values);
    }

    pub fn with(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Ordered attribute name list plus one [`AttributeArray`] per attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleSet {
    names: Vec<String>,
    arrays: BTreeMap<String, AttributeArray>,
}

impl SampleSet {
    /// Empty set with a fixed attribute list.
    pub fn new(attribute_names: &[String]) -> Self {
        let arrays = attribute_names
            .iter()
            .map(|name| (name.clone(), AttributeArray::empty()))
            .collect();
        Self {
            names: attribute_names.to_vec(),
            arrays,
        }
    }

    /// Insert or replace an attribute, appending its name if it is new.
    pub fn insert(&mut self, name: impl Into<String>, array: AttributeArray) {
        let name = name.into();
        if !self.arrays.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.arrays.insert(name, array);
    }

    /// Decompose an observation into the configured attributes and append it.
    pub fn push_observation(&mut self, observation: &Observation) -> BenchResult<()> {
        let mut rows = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let values = observation.get(name).ok_or_else(|| {
                BenchError::Validation(format!("observation has no attribute '{name}'"))
            })?;
            rows.push(values);
        }
        // Validate every width before mutating so a bad observation leaves the set untouched.
        for (name, values) in self.names.iter().zip(&rows) {
            let array = &self.arrays[name];
            if array.rows() > 0 && array.cols() != values.len() {
                return Err(BenchError::Validation(format!(
                    "attribute '{}' changed width from {} to {}",
                    name,
                    array.cols(),
                    values.len()
                )));
            }
        }
        for (name, values) in self.names.iter().zip(rows) {
            if let Some(array) = self.arrays.get_mut(name) {
                array.push_row(values)?;
            }
        }
        Ok(())
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&AttributeArray> {
        self.arrays.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeArray)> {
        self.names
            .iter()
            .filter_map(|name| self.arrays.get(name).map(|arr| (name.as_str(), arr)))
    }

    /// Number of samples (rows of the first attribute).
    pub fn len(&self) -> usize {
        self.names
            .first()
            .and_then(|name| self.arrays.get(name))
            .map(AttributeArray::rows)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every attribute is present and all have the same sample count.
    pub fn check_consistent(&self, split: &str) -> BenchResult<()> {
        let expected = self.len();
        for name in &self.names {
            let array = self
                .arrays
                .get(name)
                .ok_or_else(|| BenchError::corrupt(split, format!("attribute '{name}' missing")))?;
            if array.rows() != expected {
                return Err(BenchError::corrupt(
                    split,
                    format!(
                        "attribute '{}' has {} samples, expected {}",
                        name,
                        array.rows(),
                        expected
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Subset restricted to `names`, in that order. Unknown names are an error.
    pub fn select(&self, names: &[String]) -> BenchResult<SampleSet> {
        let mut out = SampleSet::default();
        for name in names {
            let array = self.arrays.get(name).ok_or_else(|| {
                BenchError::Validation(format!("sample set has no attribute '{name}'"))
            })?;
            out.insert(name.clone(), array.clone());
        }
        Ok(out)
    }

    /// Copy of the samples in `range` for every attribute.
    pub fn slice(&self, range: Range<usize>) -> SampleSet {
        let mut out = SampleSet::default();
        for (name, array) in self.iter() {
            out.insert(name, array.slice_rows(range.clone()));
        }
        out
    }

    /// Append the samples of `other`, attribute by attribute.
    pub fn extend(&mut self, other: &SampleSet) -> BenchResult<()> {
        for (name, array) in other.iter() {
            match self.arrays.get_mut(name) {
                Some(existing) => existing.extend(array)?,
                None => self.insert(name, array.clone()),
            }
        }
        Ok(())
    }
}
