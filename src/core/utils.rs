/// Экранирует специальные символы для MarkdownV2 формата Telegram.
///
/// # Arguments
///
/// * `text` - Исходный текст
///
/// # Returns
///
/// Текст с экранированными специальными символами для MarkdownV2.
///
/// # Example
///
/// ```
/// use fingoal::core::utils::escape_markdown_v2;
///
/// let escaped = escape_markdown_v2("Еда (обед) - 500.");
/// assert_eq!(escaped, "Еда \\(обед\\) \\- 500\\.");
/// ```
pub fn escape_markdown_v2(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        match c {
            '\\' | '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}'
            | '.' | '!' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Short alias used when building MarkdownV2 replies
pub fn esc(text: &str) -> String {
    escape_markdown_v2(text)
}

/// Escapes text placed inside a MarkdownV2 `code` span (only backtick and backslash)
pub fn escape_code(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`")
}

/// Форматирует сумму с разделителем тысяч: `12500` -> `12,500`, `99.5` -> `99.50`.
///
/// Целые суммы выводятся без дробной части, дробные с двумя знаками.
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, frac)
    }
}

/// [`format_amount`] already escaped for MarkdownV2
pub fn money(amount: f64) -> String {
    escape_markdown_v2(&format_amount(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown_v2() {
        assert_eq!(escape_markdown_v2("Hello. World!"), "Hello\\. World\\!");
        assert_eq!(escape_markdown_v2("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_markdown_v2("Кофе"), "Кофе");
    }

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1_234_567.0), "1,234,567");
        assert_eq!(format_amount(-2500.0), "-2,500");
    }

    #[test]
    fn test_format_amount_fraction() {
        assert_eq!(format_amount(99.5), "99.50");
        assert_eq!(format_amount(1500.25), "1,500.25");
        assert_eq!(format_amount(10.001), "10");
    }

    #[test]
    fn test_money_is_escaped() {
        assert_eq!(money(-1500.5), "\\-1,500\\.50");
    }
}
