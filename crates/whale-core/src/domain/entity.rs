//! 수집 단계가 생산하는 공시 엔티티 레코드.
//!
//! 각 단계의 파서는 아래 레코드를 만들어 [`DisclosureEntity`]로 감싼 뒤
//! 체크포인트 저장소의 단일 병합 지점에 전달합니다. 닫힌 enum이므로
//! 병합 로직은 모든 변형을 빠짐없이 처리해야 합니다.
//!
//! 레코드는 수집 프로세스 내부에서만 흐르고 직렬화되지 않습니다.
//! 디스크에 저장되는 형태는 도메인 트리 쪽 타입입니다.

/// 기관 인덱스 페이지에서 발견된 기관.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerRecord {
    /// 기관 ID
    pub id: String,
    /// 기관 이름
    pub name: String,
    /// 공시 목록 페이지 URL (사이트 상대 경로)
    pub filing_url: String,
}

/// 기관의 공시 목록 페이지에서 발견된 13F-HR 공시.
#[derive(Debug, Clone, PartialEq)]
pub struct FilingRecord {
    /// 소속 기관 ID
    pub manager_id: String,
    /// 공시 외부 ID
    pub filing_id: String,
    /// 분기 라벨
    pub quarter: String,
    /// 공시 상세 페이지 URL (사이트 상대 경로)
    pub filing_url: String,
    /// 제출일 문자열
    pub filing_date: String,
    /// 목록 페이지 부가 컬럼: 보유 종목 수
    pub holdings_count: String,
    /// 목록 페이지 부가 컬럼: 총 평가액
    pub value: String,
    /// 목록 페이지 부가 컬럼: 상위 보유 종목
    pub top_holdings: String,
}

/// 공시의 보유 내역 JSON에서 디코드된 보유 종목.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRecord {
    /// 소속 기관 ID
    pub manager_id: String,
    /// 소속 공시 ID
    pub filing_id: String,
    /// 종목 심볼
    pub symbol: String,
    /// 발행사 이름
    pub issuer: String,
    /// 주식 클래스
    pub class: String,
    /// CUSIP 코드
    pub cusip: String,
    /// 평가액, 천 달러 단위 (원문)
    pub value: String,
    /// 포트폴리오 비중 (원문)
    pub percentage: String,
    /// 보유 주식 수 (원문)
    pub shares: String,
    /// 주식/원금 구분 (SH/PRN)
    pub principal: String,
    /// 옵션 구분 (CALL/PUT, 없으면 빈 문자열)
    pub option: String,
}

/// 체크포인트 병합 지점으로 전달되는 닫힌 엔티티 집합.
#[derive(Debug, Clone, PartialEq)]
pub enum DisclosureEntity {
    /// 1단계: 기관 발견
    Manager(ManagerRecord),
    /// 2단계: 공시 발견
    Filing(FilingRecord),
    /// 3단계: 보유 내역
    Holding(HoldingRecord),
}
