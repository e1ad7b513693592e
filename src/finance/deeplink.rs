//! `/start` deep-link payloads
//!
//! The Mini App opens `t.me/<bot>?start=<payload>` where the payload is URL-safe
//! base64 (padding optional) of `action|p1|p2`:
//!
//! | action | p1 | p2 |
//! | --- | --- | --- |
//! | `income` / `expense` | amount | category |
//! | `goal` | name | target |
//! | `budget` | category | limit |
//! | `topup` | goal id | amount |

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::core::error::{AppError, AppResult};
use crate::core::types::TxKind;
use crate::finance::parser::parse_amount;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq)]
pub enum DeepLink {
    Transaction { kind: TxKind, amount: f64, category: String },
    Goal { name: String, target: f64 },
    Budget { category: String, limit: f64 },
    TopUp { goal_id: i64, amount: f64 },
}

fn amount_field(raw: &str) -> AppResult<f64> {
    parse_amount(raw).ok_or_else(|| AppError::Validation(format!("invalid amount: {}", raw)))
}

fn text_field(raw: &str) -> AppResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::Validation("empty name".to_string()));
    }
    Ok(value.to_string())
}

/// Decodes a `/start` payload.
///
/// Fails on bad base64, fewer than three fields, unknown actions or invalid values.
pub fn decode(payload: &str) -> AppResult<DeepLink> {
    let bytes = PAYLOAD_ENGINE.decode(payload.trim())?;
    let raw = String::from_utf8(bytes)?;
    let parts: Vec<&str> = raw.split('|').collect();
    if parts.len() < 3 {
        return Err(AppError::Payload(format!("expected action|p1|p2, got '{}'", raw)));
    }

    match parts[0] {
        "income" | "expense" => Ok(DeepLink::Transaction {
            kind: parts[0].parse().map_err(AppError::Payload)?,
            amount: amount_field(parts[1])?,
            category: text_field(parts[2])?,
        }),
        "goal" => Ok(DeepLink::Goal {
            name: text_field(parts[1])?,
            target: amount_field(parts[2])?,
        }),
        "budget" => Ok(DeepLink::Budget {
            category: text_field(parts[1])?,
            limit: amount_field(parts[2])?,
        }),
        "topup" => Ok(DeepLink::TopUp {
            goal_id: parts[1]
                .trim()
                .parse()
                .map_err(|_| AppError::Validation(format!("invalid goal id: {}", parts[1])))?,
            amount: amount_field(parts[2])?,
        }),
        other => Err(AppError::Payload(format!("unknown action: {}", other))),
    }
}

/// Encodes a raw `action|p1|p2` string into a `/start` payload
pub fn encode(raw: &str) -> String {
    PAYLOAD_ENGINE.encode(raw.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_transaction() {
        let link = decode(&encode("expense|500|Еда")).unwrap();
        assert_eq!(
            link,
            DeepLink::Transaction {
                kind: TxKind::Expense,
                amount: 500.0,
                category: "Еда".to_string()
            }
        );
    }

    #[test]
    fn test_decode_accepts_padded_payload() {
        use base64::engine::general_purpose::URL_SAFE;
        let padded = URL_SAFE.encode("goal|iPhone|100000");
        assert!(padded.ends_with('='));
        assert_eq!(
            decode(&padded).unwrap(),
            DeepLink::Goal {
                name: "iPhone".to_string(),
                target: 100_000.0
            }
        );
    }

    #[test]
    fn test_decode_budget_and_topup() {
        assert_eq!(
            decode(&encode("budget|Кафе|7000")).unwrap(),
            DeepLink::Budget {
                category: "Кафе".to_string(),
                limit: 7000.0
            }
        );
        assert_eq!(
            decode(&encode("topup|12|250.5")).unwrap(),
            DeepLink::TopUp {
                goal_id: 12,
                amount: 250.5
            }
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        assert!(decode(&encode("income|100|Бонус|extra")).is_ok());
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(decode("%%%"), Err(AppError::Payload(_))));
        assert!(decode(&encode("income|100")).is_err());
        assert!(decode(&encode("transfer|100|x")).is_err());
        assert!(decode(&encode("expense|abc|Еда")).is_err());
        assert!(decode(&encode("expense|-5|Еда")).is_err());
        assert!(decode(&encode("topup|x|10")).is_err());
        assert!(decode(&encode("goal| |10")).is_err());
    }
}
