//! NAV 파생 분석.
//!
//! 수집 레이어([`fund_data`])가 만든 NAV 이력과 분기 공시에서 지표와
//! 시계열을 계산합니다. 모든 파생 값은 입력의 순수 함수이며 요청 간
//! 가변 상태를 갖지 않습니다.
//!
//! - [`metrics`]: 드로다운, 샤프 비율, 변동성, 월별 수익률 버킷
//! - [`holdings`]: 분기 상위 보유 비교 (추가/제외/비중 변동)
//! - [`analysis`]: 지표와 시계열을 묶은 분석 결과 조립

pub mod analysis;
pub mod holdings;
pub mod metrics;

pub use analysis::build_analysis;
pub use holdings::{compare_top_holdings, diff_holdings};
