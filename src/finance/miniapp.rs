//! Actions sent back by the Mini App through `Telegram.WebApp.sendData`

use serde::{Deserialize, Deserializer};

use crate::core::error::{AppError, AppResult};
use crate::core::types::TxKind;
use crate::finance::parser::parse_amount;

/// The app sends numbers either as JSON numbers or as strings typed by the user
pub(crate) fn flexible_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => parse_amount(&text).ok_or_else(|| serde::de::Error::custom(format!("bad amount '{}'", text))),
    }
}

pub(crate) fn flexible_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("bad id '{}'", text))),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MiniAppAction {
    AddTx {
        t: TxKind,
        #[serde(deserialize_with = "flexible_amount")]
        a: f64,
        c: String,
        #[serde(default)]
        d: Option<String>,
    },
    AddGoal {
        n: String,
        #[serde(deserialize_with = "flexible_amount")]
        t: f64,
    },
    AddBudget {
        c: String,
        #[serde(deserialize_with = "flexible_amount")]
        l: f64,
    },
    TopUpGoal {
        #[serde(deserialize_with = "flexible_id")]
        id: i64,
        #[serde(deserialize_with = "flexible_amount")]
        a: f64,
    },
    /// Actions added to the app before the bot learned about them
    #[serde(other)]
    Unknown,
}

pub fn parse_action(data: &str) -> AppResult<MiniAppAction> {
    serde_json::from_str(data).map_err(|e| AppError::Payload(format!("web app data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_tx_with_string_amount() {
        let action = parse_action(r#"{"action":"add_tx","t":"expense","a":"1500,5","c":"Еда","d":"обед"}"#).unwrap();
        assert_eq!(
            action,
            MiniAppAction::AddTx {
                t: TxKind::Expense,
                a: 1500.5,
                c: "Еда".into(),
                d: Some("обед".into()),
            }
        );
    }

    #[test]
    fn test_other_actions() {
        assert_eq!(
            parse_action(r#"{"action":"add_goal","n":"Машина","t":500000}"#).unwrap(),
            MiniAppAction::AddGoal {
                n: "Машина".into(),
                t: 500_000.0
            }
        );
        assert_eq!(
            parse_action(r#"{"action":"add_budget","c":"Кафе","l":3000}"#).unwrap(),
            MiniAppAction::AddBudget {
                c: "Кафе".into(),
                l: 3000.0
            }
        );
        assert_eq!(
            parse_action(r#"{"action":"top_up_goal","id":"7","a":250}"#).unwrap(),
            MiniAppAction::TopUpGoal { id: 7, a: 250.0 }
        );
        assert_eq!(
            parse_action(r#"{"action":"export_csv"}"#).unwrap(),
            MiniAppAction::Unknown
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_action("not json").is_err());
        assert!(parse_action(r#"{"action":"add_tx","t":"expense","a":"abc","c":"Еда"}"#).is_err());
        assert!(parse_action(r#"{"action":"add_tx","t":"gift","a":1,"c":"Еда"}"#).is_err());
    }
}
