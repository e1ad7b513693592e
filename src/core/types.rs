use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    #[default]
    Expense,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, TxKind::Expense)
    }

    /// Sign prefix used in history lines
    pub fn sign(&self) -> &'static str {
        match self {
            TxKind::Income => "+",
            TxKind::Expense => "-",
        }
    }

    /// Compact flag used by the Mini App snapshot: 1 = expense, 0 = income
    pub fn snapshot_flag(&self) -> u8 {
        match self {
            TxKind::Income => 0,
            TxKind::Expense => 1,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

// rusqlite FromSql: read kind from the `type` text column
impl rusqlite::types::FromSql for TxKind {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        TxKind::from_str(s).map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

// rusqlite ToSql: write kind as text
impl rusqlite::types::ToSql for TxKind {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(TxKind::from_str("income").unwrap(), TxKind::Income);
        assert_eq!(TxKind::from_str(" Expense ").unwrap(), TxKind::Expense);
        assert!(TxKind::from_str("transfer").is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TxKind::Income.to_string(), "income");
        assert_eq!(TxKind::Expense.to_string(), "expense");
    }

    #[test]
    fn test_snapshot_flag() {
        assert_eq!(TxKind::Expense.snapshot_flag(), 1);
        assert_eq!(TxKind::Income.snapshot_flag(), 0);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&TxKind::Income).unwrap();
        assert_eq!(json, "\"income\"");
        let kind: TxKind = serde_json::from_str("\"expense\"").unwrap();
        assert_eq!(kind, TxKind::Expense);
    }
}
