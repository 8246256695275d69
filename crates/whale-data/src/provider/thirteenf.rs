//! 13f.info 공시 데이터 클라이언트.
//!
//! 13f.info가 제공하는 세 종류의 페이지를 수집합니다:
//! - **기관 인덱스** (HTML): `/managers/{prefix}` - 이름 첫 글자별 기관 목록
//! - **공시 목록** (HTML): 기관별 분기 공시 테이블 (13F-HR만 사용)
//! - **보유 내역** (JSON): `/data/13f/{filing_id}` - 위치 기반 컬럼 배열
//!
//! # 주요 기능
//!
//! - 일시적 오류(5xx, 408, 429)에 대한 지수 백오프 재시도
//! - 요청마다 무작위 User-Agent 적용
//! - 파싱 함수는 HTTP와 분리되어 오프라인 테스트 가능
//!
//! # 사용 예
//!
//! ```rust,ignore
//! let client = ThirteenFClient::new("https://13f.info");
//!
//! // 'a'로 시작하는 기관 목록
//! let managers = client.fetch_manager_index("a").await?;
//!
//! // 기관의 13F-HR 공시 목록
//! let filings = client
//!     .fetch_filings(&managers[0].id, &managers[0].filing_url)
//!     .await?;
//! ```

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use whale_core::{FilingRecord, HoldingRecord, ManagerRecord};

use crate::error::{DataError, Result};

/// 기관 인덱스 페이지의 고정 탐색 프리픽스 (a-z + 숫자 묶음 `0`).
pub const DISCOVERY_PREFIXES: [&str; 27] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z", "0",
];

/// 요청마다 돌려쓰는 브라우저 User-Agent 풀.
const USER_AGENTS: [&str; 6] = [
    // Chrome (Windows)
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    // Chrome (Mac)
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36",
    // Firefox (Windows)
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    // Firefox (Mac)
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:89.0) Gecko/20100101 Firefox/89.0",
    // Safari
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    // Edge
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36 Edg/91.0.864.59",
];

/// User-Agent를 무작위로 고릅니다.
fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// 일시적 오류로 간주하여 재시도하는 상태 코드.
fn is_retryable_status(code: u16) -> bool {
    matches!(code, 500 | 502 | 503 | 504 | 408 | 429)
}

/// 13f.info 수집 클라이언트.
pub struct ThirteenFClient {
    client: Client,
    /// 사이트 베이스 URL (끝 슬래시 없음)
    base_url: String,
    /// 재시도 백오프의 기준 딜레이 (기본: 250ms)
    request_delay: Duration,
    /// 일시적 오류에 대한 최대 재시도 횟수 (기본: 3)
    max_retries: u32,
}

impl ThirteenFClient {
    /// 기본 설정으로 클라이언트를 생성합니다.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, Duration::from_millis(250), 3)
    }

    /// 백오프 딜레이와 재시도 횟수를 지정하여 클라이언트를 생성합니다.
    pub fn with_options(
        base_url: impl Into<String>,
        request_delay: Duration,
        max_retries: u32,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        let base_url: String = base_url.into();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_delay,
            max_retries,
        }
    }

    /// 재시도 백오프의 기준 딜레이를 반환합니다.
    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// GET 요청을 보내고 본문을 반환합니다.
    ///
    /// 일시적 오류(5xx, 408, 429)와 전송 오류는 딜레이를 두 배씩 늘리며
    /// `max_retries`회까지 재시도합니다. 재시도 후에도 429라면
    /// [`DataError::RateLimited`]를 반환합니다.
    async fn get_text_with_retry(&self, url: &str) -> Result<String> {
        let mut attempt = 0u32;
        let mut backoff = self.request_delay;

        loop {
            let result = self
                .client
                .get(url)
                .header(header::USER_AGENT, random_user_agent())
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.text().await?);
                }
                Ok(response) => {
                    let code = response.status().as_u16();
                    if attempt < self.max_retries && is_retryable_status(code) {
                        attempt += 1;
                        tracing::warn!(url = url, status = code, attempt = attempt, "재시도 대기");
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(DataError::RateLimited);
                    }
                    return Err(DataError::Status {
                        code,
                        url: url.to_string(),
                    });
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        attempt += 1;
                        tracing::warn!(url = url, error = %e, attempt = attempt, "전송 오류, 재시도 대기");
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    return Err(DataError::Http(e));
                }
            }
        }
    }
}

// ==================== 소스 추상화 ====================

/// 공시 데이터 소스 trait.
///
/// 수집 단계는 이 trait에만 의존합니다. 운영에서는 [`ThirteenFClient`]가,
/// 테스트에서는 인메모리 스크립트 소스가 구현합니다.
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    /// 소스 이름 (로그용).
    fn name(&self) -> &str;

    /// 인덱스 페이지에서 프리픽스로 시작하는 기관 목록을 조회합니다.
    async fn fetch_manager_index(&self, prefix: &str) -> Result<Vec<ManagerRecord>>;

    /// 기관의 13F-HR 공시 목록을 조회합니다.
    ///
    /// `filing_url`은 기관 레코드에 저장된 사이트 상대 경로입니다.
    async fn fetch_filings(&self, manager_id: &str, filing_url: &str)
        -> Result<Vec<FilingRecord>>;

    /// 공시의 보유 내역을 조회합니다.
    async fn fetch_holdings(&self, manager_id: &str, filing_id: &str)
        -> Result<Vec<HoldingRecord>>;
}

#[async_trait]
impl DisclosureSource for ThirteenFClient {
    fn name(&self) -> &str {
        "13f.info"
    }

    async fn fetch_manager_index(&self, prefix: &str) -> Result<Vec<ManagerRecord>> {
        let url = format!("{}/managers/{}", self.base_url, prefix);
        tracing::debug!(url = %url, "기관 인덱스 조회");

        let html = self.get_text_with_retry(&url).await?;
        Ok(parse_manager_index(&html))
    }

    async fn fetch_filings(
        &self,
        manager_id: &str,
        filing_url: &str,
    ) -> Result<Vec<FilingRecord>> {
        let url = format!("{}{}", self.base_url, filing_url);
        tracing::debug!(url = %url, manager_id = manager_id, "공시 목록 조회");

        let html = self.get_text_with_retry(&url).await?;
        Ok(parse_filings_page(&html, manager_id))
    }

    async fn fetch_holdings(
        &self,
        manager_id: &str,
        filing_id: &str,
    ) -> Result<Vec<HoldingRecord>> {
        let url = format!("{}/data/13f/{}", self.base_url, filing_id);
        tracing::debug!(url = %url, filing_id = filing_id, "보유 내역 조회");

        let body = self.get_text_with_retry(&url).await?;
        parse_holdings_payload(&body, manager_id, filing_id)
    }
}

// ==================== 파싱 유틸리티 함수 ====================

/// 기관 인덱스 페이지에서 기관 링크를 추출합니다.
///
/// 테이블 안의 `/manager/` 링크만 대상으로 하며, ID를 추출할 수 없는
/// 링크는 건너뜁니다.
pub fn parse_manager_index(html: &str) -> Vec<ManagerRecord> {
    let document = Html::parse_document(html);

    let link_selector = match Selector::parse("table a[href*='/manager/']") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut records = Vec::new();
    for link in document.select(&link_selector) {
        let href = link.value().attr("href").unwrap_or("");
        let name = link.text().collect::<String>().trim().to_string();

        let id = match manager_id_from_href(href) {
            Some(id) => id,
            None => {
                tracing::debug!(href = href, "기관 링크 형식이 아님, 건너뜀");
                continue;
            }
        };

        records.push(ManagerRecord {
            id,
            name,
            filing_url: href.to_string(),
        });
    }

    records
}

/// 기관의 공시 목록 테이블에서 13F-HR 행만 추출합니다.
///
/// 컬럼이 7개 미만인 행과 13F-HR이 아닌 양식(13F-HR/A, 13F-NT 등)은
/// 건너뜁니다. 행 순서는 페이지 표기 그대로(최신 분기부터) 유지합니다.
pub fn parse_filings_page(html: &str, manager_id: &str) -> Vec<FilingRecord> {
    let document = Html::parse_document(html);

    let row_selector = match Selector::parse("#managerFilings tbody tr") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };
    let cell_selector = match Selector::parse("td") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };
    let link_selector = match Selector::parse("a") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut records = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() < 7 {
            continue;
        }

        let form_type = cell_text(&cells[4]);
        if form_type != "13F-HR" {
            continue;
        }

        // 분기 라벨과 공시 상세 URL은 첫 컬럼의 링크에서 가져온다
        let (quarter, filing_url) = match cells[0].select(&link_selector).next() {
            Some(link) => (
                link.text().collect::<String>().trim().to_string(),
                link.value().attr("href").unwrap_or("").to_string(),
            ),
            None => (String::new(), String::new()),
        };

        records.push(FilingRecord {
            manager_id: manager_id.to_string(),
            filing_id: cell_text(&cells[6]),
            quarter,
            filing_url,
            filing_date: cell_text(&cells[5]),
            holdings_count: cell_text(&cells[1]),
            value: cell_text(&cells[2]),
            top_holdings: cell_text(&cells[3]),
        });
    }

    records
}

/// 보유 내역 엔드포인트의 응답 래퍼.
#[derive(Debug, Deserialize)]
struct HoldingsResponse {
    data: Vec<Value>,
}

/// 보유 내역 JSON에서 보유 종목을 추출합니다.
///
/// 응답은 `data` 키 아래 위치 기반 컬럼 배열입니다:
/// `[symbol, issuer, class, cusip, value, percentage, shares, principal, option]`
///
/// `data` 배열이 없으면 [`DataError::Parse`]를 반환하고, 컬럼이 9개
/// 미만인 행은 경고 후 건너뜁니다.
pub fn parse_holdings_payload(
    body: &str,
    manager_id: &str,
    filing_id: &str,
) -> Result<Vec<HoldingRecord>> {
    let response: HoldingsResponse = serde_json::from_str(body)?;

    let mut records = Vec::new();
    for row in &response.data {
        let columns = match row.as_array() {
            Some(columns) => columns,
            None => {
                tracing::warn!(filing_id = filing_id, "배열이 아닌 보유 행, 건너뜀");
                continue;
            }
        };

        if columns.len() < 9 {
            tracing::warn!(
                filing_id = filing_id,
                columns = columns.len(),
                "컬럼이 부족한 보유 행, 건너뜀"
            );
            continue;
        }

        records.push(HoldingRecord {
            manager_id: manager_id.to_string(),
            filing_id: filing_id.to_string(),
            symbol: cell_string(&columns[0]),
            issuer: cell_string(&columns[1]),
            class: cell_string(&columns[2]),
            cusip: cell_string(&columns[3]),
            value: cell_string(&columns[4]),
            percentage: cell_string(&columns[5]),
            shares: cell_string(&columns[6]),
            principal: cell_string(&columns[7]),
            option: cell_string(&columns[8]),
        });
    }

    Ok(records)
}

/// 기관 링크에서 기관 ID를 추출합니다.
///
/// `/manager/0001067983-berkshire-hathaway-inc` -> `0001067983`
///
/// 경로 조각이 2개 미만이면 기관 링크 형식이 아닌 것으로 봅니다.
fn manager_id_from_href(href: &str) -> Option<String> {
    let path = href.split('?').next().unwrap_or(href);
    let path = path.split('#').next().unwrap_or(path);

    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }

    let last = parts.last()?;
    let id = last.split('-').next().unwrap_or(last);
    if id.is_empty() {
        return None;
    }

    Some(id.to_string())
}

/// 테이블 셀의 텍스트를 추출하고 공백을 정리합니다.
fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// JSON 셀 값을 문자열로 변환합니다.
///
/// 사이트는 같은 컬럼에 문자열과 숫자를 섞어 보냅니다.
/// `"1,234"` -> `"1,234"`, `1234` -> `"1234"`, `null` -> `""`
fn cell_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
