//! HTML 테이블 추출.
//!
//! 두 형태를 다룹니다:
//!
//! - 정의 테이블: F10 기본 정보 페이지의 th(라벨)/td(값) 쌍
//! - 데이터 테이블: 보유 종목 표. 열 위치를 하드코딩하지 않고
//!   헤더 텍스트로 열을 해석합니다

use std::collections::HashMap;

use chrono::NaiveDate;
use scraper::{Html, Selector};
use tracing::debug;

use fund_core::dates::normalize_date_text;
use fund_core::numeric::{parse_numeric_text, round2};
use fund_core::types::TopHoldingItem;

// 보유 종목 표의 업스트림 열 라벨
const COL_STOCK_CODE: &str = "股票代码";
const COL_STOCK_NAME: &str = "股票名称";
const COL_WEIGHT: &str = "占净值比例";
const COL_SHARES: &str = "持股数";
const COL_MARKET_VALUE: &str = "持仓市值";

/// 분기 공시 블록의 경계 앵커
const QUARTER_ANCHOR: &str = "截止至";
/// 보유 종목 표의 클래스 표식
const HOLDINGS_TABLE_CLASS: &str = "tzxq";

/// th(라벨)/td(값) 정의 테이블을 라벨 → 값 맵으로 변환합니다.
///
/// 같은 행에 라벨/값 쌍이 여러 개 올 수 있으므로 문서 순서대로
/// th 뒤의 첫 td를 짝지읍니다. 공백류는 한 칸으로 접습니다.
pub fn definition_table(html: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();

    let Ok(table_selector) = Selector::parse("table.info") else {
        return map;
    };
    let Ok(row_selector) = Selector::parse("tr") else {
        return map;
    };
    let Ok(cell_selector) = Selector::parse("th, td") else {
        return map;
    };

    let document = Html::parse_document(html);
    let Some(table) = document.select(&table_selector).next() else {
        return map;
    };

    for row in table.select(&row_selector) {
        let mut label: Option<String> = None;
        for cell in row.select(&cell_selector) {
            let text = collapse_whitespace(&cell.text().collect::<String>());
            if cell.value().name() == "th" {
                label = Some(text);
            } else if let Some(key) = label.take() {
                if !key.is_empty() {
                    map.insert(key, text);
                }
            }
        }
    }
    map
}

/// 라벨을 정확 일치 → 부분 일치 순으로 찾습니다.
///
/// 업스트림이 "成立日期"를 "成立日期/规模"처럼 합성 라벨로 바꾸는
/// 경우가 있어 부분 일치 폴백이 필요합니다.
pub fn definition_field<'a>(map: &'a HashMap<String, String>, label: &str) -> Option<&'a str> {
    if let Some(value) = map.get(label) {
        return Some(value.as_str());
    }
    map.iter()
        .find(|(key, _)| key.contains(label))
        .map(|(_, value)| value.as_str())
}

/// 분기 공시 블록 하나.
#[derive(Debug, Clone)]
pub struct QuarterHoldingsBlock {
    pub as_of_date: Option<NaiveDate>,
    pub holdings: Vec<TopHoldingItem>,
}

/// 아카이브 응답 본문을 분기별 보유 종목 블록으로 분해합니다.
///
/// "截止至" 앵커로 블록을 나누고, 블록마다 기준일과 보유 종목 표를
/// 추출합니다. 앵커가 없으면 본문 전체에서 표 하나를 찾는 폴백을
/// 시도합니다.
pub fn parse_quarter_holdings(content: &str) -> Vec<QuarterHoldingsBlock> {
    let anchors = find_all(content, QUARTER_ANCHOR);
    let mut blocks = Vec::new();

    for (i, &at) in anchors.iter().enumerate() {
        let end = anchors.get(i + 1).copied().unwrap_or(content.len());
        let block = &content[at..end];

        let Some(table_html) = holdings_table(block) else {
            continue;
        };
        blocks.push(QuarterHoldingsBlock {
            as_of_date: normalize_date_text(block),
            holdings: parse_holdings_table(table_html),
        });
    }

    if blocks.is_empty() {
        if let Some(table_html) = holdings_table(content) {
            blocks.push(QuarterHoldingsBlock {
                as_of_date: normalize_date_text(content),
                holdings: parse_holdings_table(table_html),
            });
        }
    }

    debug!(blocks = blocks.len(), "Parsed quarter holdings blocks");
    blocks
}

/// 헤더 텍스트로 열을 해석해 보유 종목 행을 추출합니다.
///
/// 종목 코드/이름 열을 못 찾으면 빈 목록을 반환합니다. 숫자 셀은
/// 천 단위 구분자와 % 기호를 허용하며 파싱 실패 시 0으로 둡니다.
pub fn parse_holdings_table(table_html: &str) -> Vec<TopHoldingItem> {
    let Ok(header_selector) = Selector::parse("thead th") else {
        return Vec::new();
    };
    let Ok(row_selector) = Selector::parse("tbody tr") else {
        return Vec::new();
    };
    let Ok(cell_selector) = Selector::parse("td") else {
        return Vec::new();
    };

    let fragment = Html::parse_fragment(table_html);
    let headers: Vec<String> = fragment
        .select(&header_selector)
        .map(|th| collapse_whitespace(&th.text().collect::<String>()))
        .collect();

    let column = |label: &str| headers.iter().position(|h| h.contains(label));
    let (Some(code_idx), Some(name_idx)) = (column(COL_STOCK_CODE), column(COL_STOCK_NAME))
    else {
        return Vec::new();
    };
    let weight_idx = column(COL_WEIGHT);
    let shares_idx = column(COL_SHARES);
    let value_idx = column(COL_MARKET_VALUE);

    let mut holdings = Vec::new();
    for row in fragment.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|td| collapse_whitespace(&td.text().collect::<String>()))
            .collect();

        let code = cells.get(code_idx).map(String::as_str).unwrap_or("");
        let name = cells.get(name_idx).map(String::as_str).unwrap_or("");
        if code.is_empty() || name.is_empty() {
            continue;
        }

        let numeric = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .and_then(|text| parse_numeric_text(text))
                .unwrap_or(0.0)
        };

        holdings.push(TopHoldingItem {
            stock_code: code.to_string(),
            stock_name: name.to_string(),
            weight_pct: round2(numeric(weight_idx)),
            shares_wan: round2(numeric(shares_idx)),
            market_value_wan: round2(numeric(value_idx)),
        });
    }
    holdings
}

/// 블록에서 보유 종목 표(`tzxq` 클래스)의 HTML을 잘라냅니다.
fn holdings_table(block: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(rel) = block[from..].find("<table") {
        let start = from + rel;
        let tag_end = block[start..].find('>').map(|i| start + i)?;
        let body_end = block[tag_end..].find("</table>").map(|i| tag_end + i)?;
        let close = body_end + "</table>".len();

        if block[start..tag_end].contains(HOLDINGS_TABLE_CLASS) {
            return Some(&block[start..close]);
        }
        from = close;
    }
    None
}

fn find_all(text: &str, needle: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(rel) = text[from..].find(needle) {
        let at = from + rel;
        positions.push(at);
        from = at + needle.len();
    }
    positions
}

/// 공백류(개행, &nbsp; 포함)를 한 칸으로 접고 앞뒤를 제거합니다.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_HTML: &str = r#"
        <html><body>
        <table class="info w790">
            <tr><th>基金简称</th><td>招商中证白酒</td><th>基金全称</th><td>招商中证白酒指数证券投资基金</td></tr>
            <tr><th>基金类型</th><td>股票指数</td><th>基金管理人</th><td>招商基金</td></tr>
            <tr><th>成立日期/规模</th><td>2015年05月27日 / 10.254亿份</td></tr>
        </table>
        </body></html>
    "#;

    fn holdings_html(rows: &str) -> String {
        format!(
            "<table class=\"w782 comm tzxq\"><thead><tr>\
             <th>序号</th><th>股票代码</th><th>股票名称</th>\
             <th>占净值比例</th><th>持股数（万股）</th><th>持仓市值（万元）</th>\
             </tr></thead><tbody>{}</tbody></table>",
            rows
        )
    }

    #[test]
    fn test_definition_table_pairs_multiple_columns() {
        let map = definition_table(PROFILE_HTML);
        assert_eq!(map.get("基金简称").map(String::as_str), Some("招商中证白酒"));
        assert_eq!(map.get("基金管理人").map(String::as_str), Some("招商基金"));
        assert_eq!(
            definition_field(&map, "成立日期").unwrap(),
            "2015年05月27日 / 10.254亿份"
        );
    }

    #[test]
    fn test_holdings_table_header_driven_columns() {
        // 열 순서가 바뀌어도 헤더 라벨로 해석
        let html = "<table class=\"tzxq\"><thead><tr>\
                    <th>股票名称</th><th>股票代码</th><th>占净值比例</th>\
                    </tr></thead><tbody>\
                    <tr><td>贵州茅台</td><td>600519</td><td>14.52%</td></tr>\
                    </tbody></table>";

        let holdings = parse_holdings_table(html);
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].stock_code, "600519");
        assert_eq!(holdings[0].stock_name, "贵州茅台");
        assert_eq!(holdings[0].weight_pct, 14.52);
        assert_eq!(holdings[0].shares_wan, 0.0);
    }

    #[test]
    fn test_holdings_table_parses_separators_and_skips_blank_rows() {
        let html = holdings_html(
            "<tr><td>1</td><td>600519</td><td>贵州茅台</td><td>14.52%</td>\
             <td>1,234.56</td><td>98,765.43</td></tr>\
             <tr><td>2</td><td></td><td>占位</td><td>1%</td><td>1</td><td>1</td></tr>",
        );

        let holdings = parse_holdings_table(&html);
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].shares_wan, 1234.56);
        assert_eq!(holdings[0].market_value_wan, 98765.43);
    }

    #[test]
    fn test_holdings_table_without_required_headers_is_empty() {
        let html = "<table class=\"tzxq\"><thead><tr><th>其他</th></tr></thead>\
                    <tbody><tr><td>x</td></tr></tbody></table>";
        assert!(parse_holdings_table(html).is_empty());
    }

    #[test]
    fn test_parse_quarter_holdings_splits_blocks() {
        let content = format!(
            "截止至：2024-06-30{}截止至：2024-03-31{}",
            holdings_html("<tr><td>1</td><td>600519</td><td>贵州茅台</td><td>14.52%</td><td>1</td><td>2</td></tr>"),
            holdings_html("<tr><td>1</td><td>000858</td><td>五粮液</td><td>12.01%</td><td>3</td><td>4</td></tr>"),
        );

        let blocks = parse_quarter_holdings(&content);
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0].as_of_date,
            NaiveDate::from_ymd_opt(2024, 6, 30)
        );
        assert_eq!(blocks[0].holdings[0].stock_code, "600519");
        assert_eq!(
            blocks[1].as_of_date,
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
        assert_eq!(blocks[1].holdings[0].stock_name, "五粮液");
    }

    #[test]
    fn test_parse_quarter_holdings_fallback_without_anchor() {
        let content = holdings_html(
            "<tr><td>1</td><td>600519</td><td>贵州茅台</td><td>14.52%</td><td>1</td><td>2</td></tr>",
        );

        let blocks = parse_quarter_holdings(&content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].as_of_date, None);
        assert_eq!(blocks[0].holdings.len(), 1);
    }

    #[test]
    fn test_parse_quarter_holdings_ignores_other_tables() {
        let content = format!(
            "截止至：2024-06-30<table class=\"other\"><tbody><tr><td>x</td></tr></tbody></table>{}",
            holdings_html("<tr><td>1</td><td>600519</td><td>贵州茅台</td><td>14.52%</td><td>1</td><td>2</td></tr>"),
        );

        let blocks = parse_quarter_holdings(&content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].holdings[0].stock_code, "600519");
    }
}
