pub mod cloudmusic;
pub mod qqmusic;
pub mod transport;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Provider, TrackInfo};

pub use transport::{ApiRequest, HttpTransport, Transport};

/// 검색 결과 한 건의 정규화된 접근자.
///
/// 각 접근자는 원본 JSON에 해당 값이 없으면 `None`이나 빈 `Vec`을 반환하고,
/// 값의 형태가 다르면 `Error::SchemaMismatch`를 반환한다.
pub trait SearchResult {
    fn provider(&self) -> Provider;

    fn song_name(&self) -> Result<Option<String>>;
    fn song_id(&self) -> Result<Option<i64>>;
    fn song_mid(&self) -> Result<Option<String>>;

    /// 이름이 있는 아티스트 항목만 읽는다. `artist_ids`, `artist_mids`도 같은 항목에서 나온다.
    fn artists(&self) -> Result<Vec<String>>;
    fn artist_ids(&self) -> Result<Vec<i64>>;
    fn artist_mids(&self) -> Result<Vec<String>>;

    fn album(&self) -> Result<Option<String>>;
    fn album_id(&self) -> Result<Option<i64>>;
    fn album_mid(&self) -> Result<Option<String>>;
    fn cover_url(&self) -> Result<Option<String>>;

    fn aliases(&self) -> Result<Vec<String>>;
    fn translations(&self) -> Result<Vec<String>>;
    fn publish_time(&self) -> Result<Option<DateTime<Utc>>>;

    /// 상세 조회에 쓰이는 키. 소스마다 숫자 ID 또는 mid 문자열이다.
    fn detail_key(&self) -> Result<Option<String>>;
}

/// 상세 조회 결과. 검색 결과의 접근자에 장르와 회사 정보가 더해진다.
pub trait SongDetail: SearchResult {
    fn genre(&self) -> Result<Vec<String>>;
    fn company(&self) -> Result<Vec<String>>;
}

/// 음악 메타데이터 소스 트레이트.
/// 网易云音乐, QQ 音乐 등 검색 소스를 이 트레이트로 추상화한다.
pub trait MusicSource {
    fn provider(&self) -> Provider;

    /// 키워드로 곡을 검색한다. 결과 순서는 원격 응답의 순서를 따른다.
    fn search(
        &self,
        keywords: &[&str],
        page_index: u32,
        page_size: u32,
    ) -> Result<Vec<Box<dyn SearchResult>>>;

    /// 곡마다 한 번씩 상세 조회를 한다. 찾지 못한 키는 결과에서 빠진다.
    fn details(&self, keys: &[&str]) -> Result<Vec<Box<dyn SongDetail>>>;

    /// 커버 이미지를 다운로드한다.
    fn fetch_cover(&self, track: &TrackInfo) -> Result<Vec<u8>>;

    /// 검색 결과의 상세 정보를 가져온다.
    /// 상세 조회 키가 없거나 조회 결과가 없으면 None을 반환한다.
    fn get_detail(&self, result: &dyn SearchResult) -> Result<Option<Box<dyn SongDetail>>> {
        let key = match result.detail_key()? {
            Some(key) => key,
            None => return Ok(None),
        };
        Ok(self.details(&[key.as_str()])?.into_iter().next())
    }
}

/// 검색 키워드를 공백으로 이어 붙인다. 키워드가 비어 있으면 오류.
pub(crate) fn join_keywords(keywords: &[&str]) -> Result<String> {
    let parts: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if parts.is_empty() {
        return Err(Error::InvalidArgument("검색 키워드가 없습니다".to_string()));
    }
    Ok(parts.join(" "))
}

/// 설정을 바탕으로 검색 소스를 연다.
pub fn open(provider: Provider, config: &Config) -> Result<Box<dyn MusicSource>> {
    let transport = HttpTransport::new(&config.http)?;
    Ok(match provider {
        Provider::CloudMusic => Box::new(cloudmusic::CloudMusicClient::new(transport)),
        Provider::QqMusic => match &config.http.qqmusic_user_agent {
            Some(user_agent) => Box::new(qqmusic::QqMusicClient::with_user_agent(
                transport, user_agent,
            )),
            None => Box::new(qqmusic::QqMusicClient::new(transport)),
        },
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::Value;

    use super::{ApiRequest, Transport};
    use crate::error::{Error, Result};

    /// 미리 준비한 응답을 순서대로 돌려주는 테스트용 전송 계층.
    #[derive(Default)]
    pub struct StubTransport {
        pub responses: RefCell<VecDeque<Value>>,
        pub requests: RefCell<Vec<ApiRequest>>,
    }

    impl StubTransport {
        pub fn with(responses: Vec<Value>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for StubTransport {
        fn send_json(&self, request: &ApiRequest) -> Result<Value> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| Error::RemoteFailure("준비된 응답이 없습니다".to_string()))
        }

        fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(b"\x89PNG\r\n\x1a\n".to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_keywords() {
        assert_eq!(join_keywords(&["周杰伦", " 晴天 "]).unwrap(), "周杰伦 晴天");
    }

    #[test]
    fn test_join_keywords_empty() {
        assert!(matches!(join_keywords(&[]), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            join_keywords(&["", "  "]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
