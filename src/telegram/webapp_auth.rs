use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;

use crate::core::config;

type HmacSha256 = Hmac<Sha256>;

/// Разбирает init data (query string) в пары ключ-значение с URL-декодированием
fn parse_init_data(init_data: &str) -> HashMap<String, String> {
    init_data
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let decoded_value = urlencoding::decode(value).ok()?;
            Some((key.to_string(), decoded_value.to_string()))
        })
        .collect()
}

/// data_check_string: все параметры кроме hash, отсортированные по ключу, через `\n`
fn data_check_string<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut check_pairs: Vec<String> = pairs
        .filter(|(key, _)| *key != "hash")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    check_pairs.sort();
    check_pairs.join("\n")
}

/// HMAC_SHA256(data_check_string, HMAC_SHA256("WebAppData", bot_token)) в hex
fn compute_hash(check_string: &str, bot_token: &str) -> Result<String> {
    let mut secret_key_mac = HmacSha256::new_from_slice(b"WebAppData").map_err(|e| anyhow!("HMAC key: {}", e))?;
    secret_key_mac.update(bot_token.as_bytes());
    let secret_key = secret_key_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).map_err(|e| anyhow!("HMAC key: {}", e))?;
    mac.update(check_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Валидация Telegram Web App init data.
///
/// Проверяет подпись, возраст `auth_date` (не старше `max_age_secs` относительно `now_unix`)
/// и возвращает id пользователя из параметра `user`.
pub fn validate_init_data(init_data: &str, bot_token: &str, now_unix: i64, max_age_secs: i64) -> Result<i64> {
    let params = parse_init_data(init_data);

    let received_hash = params.get("hash").ok_or_else(|| anyhow!("Missing hash parameter"))?;
    let check_string = data_check_string(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let calculated_hash = compute_hash(&check_string, bot_token)?;
    if calculated_hash != *received_hash {
        return Err(anyhow!("Invalid hash - data may be tampered"));
    }

    let auth_date: i64 = params
        .get("auth_date")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| anyhow!("Missing auth_date"))?;
    let age_seconds = now_unix - auth_date;
    if age_seconds > max_age_secs {
        return Err(anyhow!("Init data is too old ({} seconds)", age_seconds));
    }

    user_id_from(&params)
}

/// [`validate_init_data`] с текущим временем и лимитом возраста из конфигурации
pub fn validate_telegram_webapp_data(init_data: &str, bot_token: &str) -> Result<i64> {
    validate_init_data(
        init_data,
        bot_token,
        chrono::Utc::now().timestamp(),
        config::api::INIT_DATA_MAX_AGE_SECS,
    )
}

fn user_id_from(params: &HashMap<String, String>) -> Result<i64> {
    let user_json = params.get("user").ok_or_else(|| anyhow!("Missing user parameter"))?;
    let user: serde_json::Value =
        serde_json::from_str(user_json).map_err(|e| anyhow!("Failed to parse user JSON: {}", e))?;
    user.get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| anyhow!("Missing user id in user JSON"))
}

/// Подписывает набор полей так же, как это делает Telegram. Нужна тестам и локальной отладке Mini App.
#[doc(hidden)]
pub fn sign_init_data(fields: &[(&str, &str)], bot_token: &str) -> Result<String> {
    let hash = compute_hash(&data_check_string(fields.iter().copied()), bot_token)?;
    let mut query: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    query.push(format!("hash={}", hash));
    Ok(query.join("&"))
}
