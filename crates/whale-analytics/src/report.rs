//! 분기 비교 CSV 리포트 작성.
//!
//! 고정 스키마로 출력합니다:
//!
//! ```csv
//! fund_name,filing_date,quarter,stock_symbol,cl,value_($000),shares,change,pct_change,inferred_transaction_type
//! BERKSHIRE HATHAWAY INC,2024-08-14,Q2 2024,AAPL,COM,84582274,915560382,0,0,hold
//! ```
//!
//! 쉼표/따옴표/줄바꿈이 포함된 필드만 따옴표로 감싸고, 내부 따옴표는
//! 두 번 써서 이스케이프합니다.

use std::path::Path;

use crate::position_diff::PositionDelta;
use crate::Result;

/// 리포트 헤더 (컬럼 순서 고정).
pub const REPORT_HEADER: &str = "fund_name,filing_date,quarter,stock_symbol,cl,value_($000),shares,change,pct_change,inferred_transaction_type";

/// 포지션 변화 목록을 CSV 파일로 저장합니다.
///
/// 출력 디렉토리가 없으면 생성합니다. 디렉토리 생성과 파일 쓰기 실패는
/// 오류로 전파됩니다. 목록이 비어 있으면 헤더만 있는 파일을 만듭니다.
pub fn write_report(deltas: &[PositionDelta], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut content = String::with_capacity(REPORT_HEADER.len() + deltas.len() * 64);
    content.push_str(REPORT_HEADER);
    content.push('\n');

    for delta in deltas {
        content.push_str(&csv_field(&delta.fund_name));
        content.push(',');
        content.push_str(&csv_field(&delta.filing_date));
        content.push(',');
        content.push_str(&csv_field(&delta.quarter));
        content.push(',');
        content.push_str(&csv_field(&delta.symbol));
        content.push(',');
        content.push_str(&csv_field(&delta.class));
        content.push(',');
        content.push_str(&delta.value.to_string());
        content.push(',');
        content.push_str(&delta.shares.to_string());
        content.push(',');
        content.push_str(&delta.change.to_string());
        content.push(',');
        content.push_str(&delta.pct_change.to_string());
        content.push(',');
        content.push_str(delta.transaction_type.as_str());
        content.push('\n');
    }

    std::fs::write(path, content)?;

    tracing::info!(path = %path.display(), rows = deltas.len(), "리포트 저장 완료");
    Ok(())
}

/// 필요한 경우에만 필드를 따옴표로 감쌉니다.
///
/// `Fund, LP` -> `"Fund, LP"`, `He said "ok"` -> `"He said ""ok"""`
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
