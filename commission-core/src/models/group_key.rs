use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the set of records reported together: one developer invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub developer_name: String,
    pub invoice_no: String,
}

impl GroupKey {
    pub fn new(
        developer_name: impl Into<String>,
        invoice_no: impl Into<String>,
    ) -> Self {
        Self {
            developer_name: developer_name.into(),
            invoice_no: invoice_no.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} / {}", self.developer_name, self.invoice_no)
    }
}
