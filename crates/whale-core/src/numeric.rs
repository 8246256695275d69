//! 스크랩 원문 숫자 문자열의 강제 변환.

/// 숫자 문자열을 `i64`로 강제 변환합니다.
///
/// 천 단위 구분자(쉼표)를 제거하고 앞뒤 공백을 무시합니다.
/// 비어 있거나 해석할 수 없는 값은 0으로 처리하며 절대 실패하지
/// 않습니다. 원문에 무엇이 들어 있든 리포트 생성은 계속되어야 합니다.
///
/// ```
/// use whale_core::numeric::parse_share_count;
///
/// assert_eq!(parse_share_count("1,234"), 1234);
/// assert_eq!(parse_share_count("  987 "), 987);
/// assert_eq!(parse_share_count("n/a"), 0);
/// ```
pub fn parse_share_count(text: &str) -> i64 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}
