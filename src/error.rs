use thiserror::Error;

/// 라이브러리 전반에서 사용하는 오류.
#[derive(Debug, Error)]
pub enum Error {
    /// 원격 응답의 필드가 기대한 형태가 아니다 (API 변경 신호).
    #[error("스키마 불일치: {expected} 값을 기대했지만 {actual} 값을 받았습니다")]
    SchemaMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("잘못된 인자: {0}")]
    InvalidArgument(String),

    /// HTTP 요청 자체가 실패했거나, 응답에 실패 상태 코드가 담겨 있다.
    #[error("원격 서비스 요청 실패: {0}")]
    RemoteFailure(String),

    #[error("지원하지 않는 태그 형식: {0}")]
    UnsupportedKind(String),

    #[error("태그 처리 실패: {0}")]
    Tag(#[from] lofty::error::LoftyError),

    #[error("ID3 태그 처리 실패: {0}")]
    Id3(#[from] id3::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RemoteFailure(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::RemoteFailure(format!("JSON 디코딩 실패: {}", e))
    }
}
