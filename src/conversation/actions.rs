//! Callback data carried by inline buttons
//!
//! Format is `area:verb[:arg...]`, well under Telegram's 64 byte limit.

use std::fmt;
use std::str::FromStr;

use crate::core::types::TxKind;
use crate::finance::period::Month;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    GoalCreate,
    GoalList,
    GoalDeleteMenu,
    GoalDelete(i64),
    CategoryCreate,
    CategoryType(TxKind),
    CategoryStats,
    CategoryDeleteMenu,
    /// Index into the options of the delete picker
    CategoryDelete(usize),
    BudgetSet,
    /// Index into the options of the budget picker
    BudgetCategory(usize),
    BudgetList,
    Report(Month),
    /// Label-only button
    Noop,
    TxCreateCategory,
    TxPickCategory,
    /// Index into the options of the pending transaction
    TxSelect(usize),
    TxCancel,
    CloseKeyboard,
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::GoalCreate => f.write_str("goal:create"),
            CallbackAction::GoalList => f.write_str("goal:list"),
            CallbackAction::GoalDeleteMenu => f.write_str("goal:delete"),
            CallbackAction::GoalDelete(id) => write!(f, "goal:del:{}", id),
            CallbackAction::CategoryCreate => f.write_str("cat:create"),
            CallbackAction::CategoryType(kind) => write!(f, "cat:type:{}", kind),
            CallbackAction::CategoryStats => f.write_str("cat:stats"),
            CallbackAction::CategoryDeleteMenu => f.write_str("cat:delete"),
            CallbackAction::CategoryDelete(i) => write!(f, "cat:del:{}", i),
            CallbackAction::BudgetSet => f.write_str("budget:set"),
            CallbackAction::BudgetCategory(i) => write!(f, "budget:cat:{}", i),
            CallbackAction::BudgetList => f.write_str("budget:list"),
            CallbackAction::Report(month) => write!(f, "report:{}:{}", month.year(), month.month()),
            CallbackAction::Noop => f.write_str("noop"),
            CallbackAction::TxCreateCategory => f.write_str("tx:new"),
            CallbackAction::TxPickCategory => f.write_str("tx:pick"),
            CallbackAction::TxSelect(i) => write!(f, "tx:sel:{}", i),
            CallbackAction::TxCancel => f.write_str("tx:cancel"),
            CallbackAction::CloseKeyboard => f.write_str("kb:close"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = String;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = data.split(':').collect();
        let bad = || format!("unknown callback data: {}", data);
        let index = |raw: &str| raw.parse::<usize>().map_err(|_| bad());

        let action = match parts.as_slice() {
            ["goal", "create"] => CallbackAction::GoalCreate,
            ["goal", "list"] => CallbackAction::GoalList,
            ["goal", "delete"] => CallbackAction::GoalDeleteMenu,
            ["goal", "del", id] => CallbackAction::GoalDelete(id.parse().map_err(|_| bad())?),
            ["cat", "create"] => CallbackAction::CategoryCreate,
            ["cat", "type", kind] => CallbackAction::CategoryType(kind.parse()?),
            ["cat", "stats"] => CallbackAction::CategoryStats,
            ["cat", "delete"] => CallbackAction::CategoryDeleteMenu,
            ["cat", "del", i] => CallbackAction::CategoryDelete(index(i)?),
            ["budget", "set"] => CallbackAction::BudgetSet,
            ["budget", "cat", i] => CallbackAction::BudgetCategory(index(i)?),
            ["budget", "list"] => CallbackAction::BudgetList,
            ["report", year, month] => {
                let year = year.parse().map_err(|_| bad())?;
                let month = month.parse().map_err(|_| bad())?;
                CallbackAction::Report(Month::new(year, month).ok_or_else(bad)?)
            }
            ["noop"] => CallbackAction::Noop,
            ["tx", "new"] => CallbackAction::TxCreateCategory,
            ["tx", "pick"] => CallbackAction::TxPickCategory,
            ["tx", "sel", i] => CallbackAction::TxSelect(index(i)?),
            ["tx", "cancel"] => CallbackAction::TxCancel,
            ["kb", "close"] => CallbackAction::CloseKeyboard,
            _ => return Err(bad()),
        };
        Ok(action)
    }
}
