//! 고정 소수점 반올림 헬퍼.
//!
//! 퍼센트 값은 소수점 2자리, 순자산(NAV)은 소수점 4자리로 외부화 시점에
//! 반올림합니다. 중간 계산에는 적용하지 않아 반올림 오차 누적을 피합니다.

/// 소수점 2자리 반올림 (퍼센트 값).
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// 소수점 4자리 반올림 (NAV 값).
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10000.0).round() / 10000.0
}

/// 숫자 텍스트 정리 후 f64 파싱.
///
/// 천 단위 구분자(`,`)와 퍼센트 기호(`%`)를 제거하고 파싱합니다.
/// 추출된 텍스트에서 숫자 필드를 읽기 전에 일괄 적용됩니다.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '%')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.456), 3.46);
        assert_eq!(round2(-3.456), -3.46);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(1.23456), 1.2346);
        assert_eq!(round4(0.1), 0.1);
    }

    #[test]
    fn test_parse_numeric_text() {
        assert_eq!(parse_numeric_text("1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_text("12.34%"), Some(12.34));
        assert_eq!(parse_numeric_text(" -5.5 "), Some(-5.5));
        assert_eq!(parse_numeric_text("--"), None);
        assert_eq!(parse_numeric_text(""), None);
    }
}
