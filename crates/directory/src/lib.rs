//! Customer directory backed by the collections dataset
//!
//! The dataset is an externally maintained CSV with one row per customer.
//! Malformed cells are coerced at load time, not at lookup time, so lookup
//! itself never fails: a missing or unreadable dataset degrades to an
//! always-not-found directory and the rest of the system proceeds in
//! unknown-customer mode.

use std::path::Path;

use loanmate_core::CustomerRecord;

/// Dataset column headers, matched case-insensitively
const COL_NAME: &str = "Random_Name";
const COL_CREDIT_SCORE: &str = "Credit Score";
const COL_MONTHLY_DEBT: &str = "Monthly Debt";
const COL_LOAN_AMOUNT: &str = "Current Loan Amount";

/// Name stored for rows whose name cell is empty
const UNKNOWN_NAME: &str = "Unknown Customer";

/// Read-only customer lookup over the collections dataset
pub struct CustomerDirectory {
    records: Vec<Entry>,
}

struct Entry {
    /// Trimmed, case-folded name used for matching
    normalized_name: String,
    record: CustomerRecord,
}

impl CustomerDirectory {
    /// Load the directory from a CSV file
    ///
    /// Never fails: a missing or malformed file yields an empty directory
    /// with a logged warning.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let directory = Self::parse(&contents);
                tracing::info!(
                    path = %path.display(),
                    customers = directory.len(),
                    "customer directory loaded"
                );
                directory
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "customer dataset unavailable; lookups will find nothing"
                );
                Self::empty()
            }
        }
    }

    /// An empty, always-not-found directory
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Build a directory from in-memory records (used by tests)
    pub fn from_records(records: impl IntoIterator<Item = CustomerRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| Entry {
                    normalized_name: normalize(&record.name),
                    record,
                })
                .collect(),
        }
    }

    fn parse(contents: &str) -> Self {
        let mut lines = contents.lines();

        let Some(header) = lines.next() else {
            tracing::warn!("customer dataset is empty");
            return Self::empty();
        };

        // Dataset cells are plain unquoted values
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name))
        };

        let Some(name_idx) = find(COL_NAME) else {
            tracing::warn!(
                column = COL_NAME,
                "customer dataset is missing the name column; lookups will find nothing"
            );
            return Self::empty();
        };
        let score_idx = find(COL_CREDIT_SCORE);
        let debt_idx = find(COL_MONTHLY_DEBT);
        let loan_idx = find(COL_LOAN_AMOUNT);

        let mut records = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();

            let name = cells
                .get(name_idx)
                .filter(|c| !c.is_empty())
                .copied()
                .unwrap_or(UNKNOWN_NAME);

            let record = CustomerRecord::new(
                name,
                cell_u32(&cells, score_idx),
                cell_f64(&cells, debt_idx),
                cell_f64(&cells, loan_idx),
            );

            records.push(Entry {
                normalized_name: normalize(name),
                record,
            });
        }

        Self { records }
    }

    /// Look up a customer by spoken/typed name
    ///
    /// Both sides are trimmed and case-folded before exact comparison.
    /// Returns the first matching row.
    pub fn lookup(&self, name: &str) -> Option<CustomerRecord> {
        let needle = normalize(name);
        if needle.is_empty() {
            return None;
        }

        let found = self
            .records
            .iter()
            .find(|e| e.normalized_name == needle)
            .map(|e| e.record.clone());

        if found.is_none() {
            tracing::info!(name = %name.trim(), "customer not found in directory");
        }
        found
    }

    /// Number of loaded customer rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no rows are loaded (missing or degraded dataset)
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Numeric cell coerced to 0 when missing or malformed
fn cell_f64(cells: &[&str], idx: Option<usize>) -> f64 {
    idx.and_then(|i| cells.get(i))
        .and_then(|c| c.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

fn cell_u32(cells: &[&str], idx: Option<usize>) -> u32 {
    idx.and_then(|i| cells.get(i))
        .and_then(|c| c.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u32)
        .unwrap_or(0)
}
