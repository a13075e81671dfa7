//! Customer record produced by directory lookup

use serde::{Deserialize, Serialize};

/// A customer's account snapshot
///
/// Immutable once fetched: the call session replaces the whole record on a
/// new lookup and never mutates fields in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Customer name as stored in the directory
    pub name: String,
    /// Credit score; 0 means unknown
    pub credit_score: u32,
    /// Monthly payment due, in dollars
    pub monthly_payment: f64,
    /// Outstanding loan amount, in dollars
    pub outstanding_loan: f64,
}

impl CustomerRecord {
    /// Create a record
    pub fn new(
        name: impl Into<String>,
        credit_score: u32,
        monthly_payment: f64,
        outstanding_loan: f64,
    ) -> Self {
        Self {
            name: name.into(),
            credit_score,
            monthly_payment,
            outstanding_loan,
        }
    }

    /// True when the directory had no usable score for this customer
    pub fn credit_score_unknown(&self) -> bool {
        self.credit_score == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let record = CustomerRecord::new("John Doe", 700, 500.0, 10_000.0);
        assert_eq!(record.name, "John Doe");
        assert!(!record.credit_score_unknown());

        let unknown = CustomerRecord::new("Jane Roe", 0, 250.0, 4_000.0);
        assert!(unknown.credit_score_unknown());
    }
}
