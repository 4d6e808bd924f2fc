//! 거래소 현지 달력 날짜 헬퍼.
//!
//! Eastmoney의 타임스탬프는 중국 시간대(UTC+8) 기준의 "净值日期"를
//! 가리킵니다. 서버 시간대와 무관하게 날짜 라벨이 거래소 현지 날짜와
//! 일치하도록 모든 epoch-ms → 날짜 변환은 Asia/Shanghai를 거칩니다.
//! UTC로 직접 변환하면 -1일 오차가 발생합니다.

use chrono::{LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Shanghai;

/// epoch 밀리초를 거래소 현지(UTC+8) 달력 날짜로 변환합니다.
pub fn ms_to_civil_date(ms: i64) -> Option<NaiveDate> {
    let utc = Utc.timestamp_millis_opt(ms).single()?;
    Some(utc.with_timezone(&Shanghai).date_naive())
}

/// 달력 날짜의 현지(UTC+8) 하루 끝(23:59:59.999)을 epoch 밀리초로 변환합니다.
///
/// 이력 조회에서 `endDate`를 포함 경계로 해석할 때 사용합니다.
pub fn civil_day_end_ms(date: NaiveDate) -> i64 {
    let wall = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("23:59:59.999 is a valid wall clock time");

    match Shanghai.from_local_datetime(&wall) {
        LocalResult::Single(t) => t.timestamp_millis(),
        // Asia/Shanghai는 현대에 DST가 없어 도달하지 않는 분기
        _ => (wall - chrono::Duration::hours(8)).and_utc().timestamp_millis(),
    }
}

/// `YYYY-MM-DD` 형식의 날짜 문자열을 파싱합니다.
pub fn parse_ymd(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// 자유 형식 텍스트에서 날짜를 추출합니다.
///
/// `YYYY-MM-DD`와 `YYYY年M月D日` 두 표기를 지원합니다.
/// F10 기본 정보 테이블의 "成立日期/规模" 같은 혼합 텍스트에서 사용됩니다.
pub fn normalize_date_text(text: &str) -> Option<NaiveDate> {
    let chars: Vec<char> = text.chars().collect();
    for i in 0..chars.len() {
        if let Some(date) = try_date_at(&chars, i) {
            return Some(date);
        }
    }
    None
}

fn try_date_at(chars: &[char], start: usize) -> Option<NaiveDate> {
    let (year, after_year) = read_digits(chars, start, 4, 4)?;
    let sep = *chars.get(after_year)?;
    let (month_sep, day_suffix) = match sep {
        '-' => ('-', None),
        '年' => ('月', Some('日')),
        _ => return None,
    };

    let (month, after_month) = read_digits(chars, after_year + 1, 1, 2)?;
    if *chars.get(after_month)? != month_sep {
        return None;
    }

    let (day, after_day) = read_digits(chars, after_month + 1, 1, 2)?;
    if let Some(suffix) = day_suffix {
        if chars.get(after_day) != Some(&suffix) {
            return None;
        }
    }

    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// `start`부터 최소 `min`, 최대 `max`개의 ASCII 숫자를 읽습니다.
fn read_digits(chars: &[char], start: usize, min: usize, max: usize) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    let mut count = 0;
    let mut idx = start;

    while idx < chars.len() && count < max {
        let ch = chars[idx];
        let Some(digit) = ch.to_digit(10) else { break };
        value = value.checked_mul(10)?.checked_add(digit)?;
        count += 1;
        idx += 1;
    }

    if count < min {
        return None;
    }
    Some((value, idx))
}

/// 연/월이 속한 분기의 분기말 날짜를 반환합니다.
///
/// 3·12월 분기는 31일, 6·9월 분기는 30일로 끝납니다.
pub fn quarter_end_for_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let quarter_month = match month {
        1..=3 => 3,
        4..=6 => 6,
        7..=9 => 9,
        _ => 12,
    };
    let quarter_day = if quarter_month == 6 || quarter_month == 9 {
        30
    } else {
        31
    };
    NaiveDate::from_ymd_opt(year, quarter_month, quarter_day)
}

/// 공시 기준일(분기말)에서 정확히 한 회계 분기 이전의 (연, 월)을 반환합니다.
pub fn previous_quarter(as_of: NaiveDate) -> (i32, u32) {
    use chrono::Datelike;

    let quarter_month = match as_of.month() {
        1..=3 => 3,
        4..=6 => 6,
        7..=9 => 9,
        _ => 12,
    };

    if quarter_month == 3 {
        (as_of.year() - 1, 12)
    } else {
        (as_of.year(), quarter_month - 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_civil_date_crosses_utc_midnight() {
        // 2024-05-30 16:00 UTC == 2024-05-31 00:00 +08:00
        let date = ms_to_civil_date(1_717_084_800_000).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
    }

    #[test]
    fn test_civil_day_end_ms_round_trips() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let end_ms = civil_day_end_ms(date);
        assert_eq!(ms_to_civil_date(end_ms).unwrap(), date);
        assert_eq!(ms_to_civil_date(end_ms + 1).unwrap(), date.succ_opt().unwrap());
    }

    #[test]
    fn test_normalize_date_text() {
        assert_eq!(
            normalize_date_text("2019-05-09"),
            NaiveDate::from_ymd_opt(2019, 5, 9)
        );
        assert_eq!(
            normalize_date_text("成立日期：2019年5月9日 / 3.5亿份"),
            NaiveDate::from_ymd_opt(2019, 5, 9)
        );
        assert_eq!(normalize_date_text("暂无数据"), None);
    }

    #[test]
    fn test_quarter_end_for_month() {
        assert_eq!(
            quarter_end_for_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
        assert_eq!(
            quarter_end_for_month(2024, 8),
            NaiveDate::from_ymd_opt(2024, 9, 30)
        );
        assert_eq!(quarter_end_for_month(2024, 13), None);
    }

    #[test]
    fn test_previous_quarter_wraps_year() {
        let q1 = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(previous_quarter(q1), (2023, 12));

        let q3 = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        assert_eq!(previous_quarter(q3), (2024, 6));
    }
}
