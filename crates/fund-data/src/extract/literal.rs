//! JS 파일 내 `var` 리터럴 추출.
//!
//! pingzhongdata JS 파일은 `var Data_netWorthTrend = [...];` 같은 구문에
//! 데이터를 담습니다. 두 단계로 추출합니다:
//!
//! 1. 앵커 탐색: `var <이름>` 다음의 `=` 뒤 첫 여는 괄호를 찾는다
//! 2. 균형 스캔: 같은 종류의 중첩 괄호 깊이를 세며 대응하는 닫는
//!    괄호까지 진행한다. 큰따옴표 문자열 내부의 괄호 문자는
//!    (백슬래시 이스케이프 포함) 건너뛴다

/// `var <name> = <JSON 리터럴>`에서 리터럴 텍스트를 추출합니다.
///
/// 리터럴은 `[` 또는 `{`로 시작하는 JSON 배열/객체여야 합니다.
pub fn extract_var_json<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let anchor = find_var_anchor(text, name)?;
    let eq = text[anchor..].find('=').map(|i| anchor + i)?;

    let bytes = text.as_bytes();
    let mut start = None;
    for (offset, &b) in bytes[eq..].iter().enumerate() {
        match b {
            b'[' | b'{' => {
                start = Some(eq + offset);
                break;
            }
            b';' => return None,
            _ => {}
        }
    }
    let start = start?;

    let open = bytes[start];
    let close = if open == b'[' { b']' } else { b'}' };
    let end = balanced_span(bytes, start, open, close)?;
    Some(&text[start..=end])
}

/// `var <name> = "<문자열>";`에서 문자열 값을 추출합니다.
pub fn extract_var_string(text: &str, name: &str) -> Option<String> {
    let anchor = find_var_anchor(text, name)?;
    let rest = text[anchor..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    Some(js_string_at(rest, 0).0)
}

/// `var <name>` 선언의 이름 끝 위치를 찾습니다.
///
/// 더 긴 식별자의 접두사와 혼동하지 않도록 이름 바로 뒤가
/// 공백 또는 `=`인 경우만 인정합니다.
fn find_var_anchor(text: &str, name: &str) -> Option<usize> {
    let needle = format!("var {}", name);
    let mut from = 0;

    while let Some(rel) = text[from..].find(&needle) {
        let after = from + rel + needle.len();
        match text[after..].chars().next() {
            Some(ch) if ch == '=' || ch.is_whitespace() => return Some(after),
            None => return None,
            _ => from = after,
        }
    }
    None
}

/// `start`의 여는 괄호부터 대응하는 닫는 괄호의 위치를 반환합니다.
fn balanced_span(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// `start`부터 닫는 큰따옴표 직전까지의 JS 문자열을 디코드합니다.
///
/// `\n` `\r` `\t`만 변환하고 나머지 이스케이프는 문자 그대로 통과시킵니다.
/// 반환값은 (디코드된 문자열, 닫는 따옴표 다음 바이트 위치)입니다.
pub fn js_string_at(text: &str, start: usize) -> (String, usize) {
    let mut out = String::new();
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if escaped {
            match ch {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                other => out.push(other),
            }
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => return (out, start + i + ch.len_utf8()),
            other => out.push(other),
        }
    }
    (out, text.len())
}

/// 아카이브 응답(`var apidata={ content:"..." }`)에서 HTML 본문을 꺼냅니다.
pub fn apidata_content(js_text: &str) -> Option<String> {
    const MARKER: &str = "content:\"";
    let idx = js_text.find(MARKER)?;
    Some(js_string_at(js_text, idx + MARKER.len()).0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_var_json_array() {
        let js = "var Data_netWorthTrend = [{\"x\":1,\"y\":2.5}];/*其他*/var other = 1;";
        assert_eq!(
            extract_var_json(js, "Data_netWorthTrend"),
            Some("[{\"x\":1,\"y\":2.5}]")
        );
    }

    #[test]
    fn test_extract_var_json_nested_three_deep() {
        let js = "var Data_assetAllocation = {\"series\":[{\"data\":[1,[2,3]]}]};";
        assert_eq!(
            extract_var_json(js, "Data_assetAllocation"),
            Some("{\"series\":[{\"data\":[1,[2,3]]}]}")
        );
    }

    #[test]
    fn test_extract_var_json_ignores_brackets_inside_strings() {
        // 문자열 값 안의 닫는 괄호가 스캔을 조기 종료시키면 안 됨
        let js = r#"var Data_grandTotal = [{"name":"a]b\"[","data":[[1,2]]}];"#;
        assert_eq!(
            extract_var_json(js, "Data_grandTotal"),
            Some(r#"[{"name":"a]b\"[","data":[[1,2]]}]"#)
        );
    }

    #[test]
    fn test_extract_var_json_missing_or_malformed() {
        assert_eq!(extract_var_json("var a = 1;", "missing"), None);
        // 세미콜론 전에 괄호가 없으면 리터럴이 아님
        assert_eq!(extract_var_json("var a = 1; var b = [2];", "a"), None);
        // 닫는 괄호가 없으면 실패
        assert_eq!(extract_var_json("var a = [1, 2", "a"), None);
    }

    #[test]
    fn test_extract_var_string() {
        let js = "var fS_name = \"招商中证白酒指数\";var fS_code = \"161725\";";
        assert_eq!(
            extract_var_string(js, "fS_name"),
            Some("招商中证白酒指数".to_string())
        );
        assert_eq!(extract_var_string(js, "fS_code"), Some("161725".to_string()));
    }

    #[test]
    fn test_anchor_rejects_longer_identifier() {
        let js = "var fS_name_extra = \"nope\";var fS_name = \"yes\";";
        assert_eq!(extract_var_string(js, "fS_name"), Some("yes".to_string()));
    }

    #[test]
    fn test_apidata_content() {
        let js = "var apidata={ content:\"<div>截止至：2024-06-30<\\\"表\\\"></div>\",arryear:[2024]};";
        assert_eq!(
            apidata_content(js),
            Some("<div>截止至：2024-06-30<\"表\"></div>".to_string())
        );
        assert_eq!(apidata_content("var apidata={};"), None);
    }

    #[test]
    fn test_js_string_at_decodes_escapes() {
        let (value, next) = js_string_at("a\\tb\\\"c\" tail", 0);
        assert_eq!(value, "a\tb\"c");
        assert_eq!(&"a\\tb\\\"c\" tail"[next..], " tail");
    }
}
