use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// # Summary
/// 防御式解析可选十进制数，是所有上游数值字段的唯一入口。
///
/// # Logic
/// 1. 去除首尾空白。
/// 2. 最多剥离一个前导负号与一个小数点后，剩余部分必须全部为数字。
/// 3. 通过校验后交给 `Decimal::from_str` 精确解析。
///
/// # Arguments
/// * `raw`: 上游原始字段文本。
///
/// # Returns
/// 合法数值返回 `Some`，空串、`N/A`、科学计数法等一律返回 None（绝不以 0 代替）。
pub fn parse_optional_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let digits = unsigned.replacen('.', "", 1);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// # Summary
/// 从 JSON 值中解析可选十进制数。
///
/// # Logic
/// 上游 K 线数组中的数值既可能是字符串也可能是数字，两者都归一到 `parse_optional_decimal`。
///
/// # Returns
/// 其它 JSON 类型（对象、数组、null、布尔）返回 None。
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_optional_decimal(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => parse_optional_decimal(&n.to_string()),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_accepts_plain_signed_and_fractional() {
        assert_eq!(parse_optional_decimal("10.50"), Some(dec!(10.50)));
        assert_eq!(parse_optional_decimal(" -0.35 "), Some(dec!(-0.35)));
        assert_eq!(parse_optional_decimal("0"), Some(Decimal::ZERO));
        assert_eq!(parse_optional_decimal("123456789"), Some(dec!(123456789)));
    }

    #[test]
    fn test_rejects_malformed_fields() {
        for raw in ["", "   ", "-", ".", "N/A", "1.2.3", "--1", "1e5", "+3", "1,000"] {
            assert_eq!(parse_optional_decimal(raw), None, "input {:?}", raw);
        }
    }

    #[test]
    fn test_json_strings_and_numbers() {
        assert_eq!(decimal_from_json(&json!("9.80")), Some(dec!(9.80)));
        assert_eq!(decimal_from_json(&json!(1000)), Some(dec!(1000)));
        assert_eq!(decimal_from_json(&json!(10.5)), Some(dec!(10.5)));
        assert_eq!(decimal_from_json(&json!(null)), None);
        assert_eq!(decimal_from_json(&json!({"nd": "2024"})), None);
    }
}
