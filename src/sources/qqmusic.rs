use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::core::guard::{self, descend, field, object_list};
use crate::error::{Error, Result};
use crate::models::{Provider, TrackInfo};
use crate::sources::{
    join_keywords, ApiRequest, HttpTransport, MusicSource, SearchResult, SongDetail, Transport,
};

const API_URL: &str = "https://u.y.qq.com/cgi-bin/musicu.fcg";
const COVER_URL_PREFIX: &str = "https://y.gtimg.cn/music/photo_new/T002R800x800M000";

/// 검색 요청에 쓰는 기본 User-Agent. 모바일 브라우저로 보여야 결과가 온다.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 13_3_1 like Mac OS X; zh-CN) AppleWebKit/537.51.1 (KHTML, like Gecko) Mobile/17D50 UCBrowser/12.8.2.1268 Mobile AliApp(TUnionSDK/0.1.20.3)";

/// 회사 목록에서 제외하는 값. 실제 회사 이름이 아니다.
const COMPANY_SENTINEL: &str = "制作家";

/// track 객체(검색 결과 항목 또는 상세 응답의 `track_info`)의 공통 접근자.
struct Track<'a>(Option<&'a Map<String, Value>>);

impl<'a> Track<'a> {
    fn string(&self, key: &str) -> Result<Option<String>> {
        match self.0 {
            Some(track) => field(track, key),
            None => Ok(None),
        }
    }

    fn integer(&self, key: &str) -> Result<Option<i64>> {
        match self.0 {
            Some(track) => field(track, key),
            None => Ok(None),
        }
    }

    fn album(&self) -> Result<Option<&'a Map<String, Value>>> {
        match self.0 {
            Some(track) => descend(track, &["album"]),
            None => Ok(None),
        }
    }

    /// 이름이 있는 singer 항목만. 이름, id, mid 목록이 같은 항목에서 나온다.
    fn singers(&self) -> Result<Vec<&'a Map<String, Value>>> {
        let track = match self.0 {
            Some(track) => track,
            None => return Ok(Vec::new()),
        };
        let mut named = Vec::new();
        for singer in object_list(track, "singer")? {
            if field::<&str>(singer, "name")?.is_some() {
                named.push(singer);
            }
        }
        Ok(named)
    }

    fn singer_strings(&self, key: &str) -> Result<Vec<String>> {
        let mut values = Vec::new();
        for singer in self.singers()? {
            if let Some(value) = field::<String>(singer, key)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn singer_ids(&self) -> Result<Vec<i64>> {
        let mut ids = Vec::new();
        for singer in self.singers()? {
            if let Some(id) = field::<i64>(singer, "id")? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn album_string(&self, key: &str) -> Result<Option<String>> {
        match self.album()? {
            Some(album) => field(album, key),
            None => Ok(None),
        }
    }

    fn album_id(&self) -> Result<Option<i64>> {
        match self.album()? {
            Some(album) => field(album, "id"),
            None => Ok(None),
        }
    }

    /// 앨범 mid가 확인된 경우에만 커버 URL을 만든다.
    fn cover_url(&self) -> Result<Option<String>> {
        Ok(guard::non_empty(self.album_string("mid")?)
            .map(|mid| format!("{}{}.jpg", COVER_URL_PREFIX, mid)))
    }

    fn aliases(&self) -> Result<Vec<String>> {
        Ok(guard::non_empty(self.string("subtitle")?).into_iter().collect())
    }

    /// `time_public`은 `YYYY-MM-DD` 형식이다. 빈 문자열은 발매일 미상.
    fn publish_time(&self) -> Result<Option<DateTime<Utc>>> {
        let text = match guard::non_empty(self.string("time_public")?) {
            Some(text) => text,
            None => return Ok(None),
        };
        let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
            Error::SchemaMismatch {
                expected: "date string (YYYY-MM-DD)",
                actual: "string",
            }
        })?;
        Ok(date.and_hms_opt(0, 0, 0).map(|t| t.and_utc()))
    }
}

/// 두 어댑터가 공유하는 track 접근자 구현. `self.track()`이 있어야 한다.
macro_rules! track_accessors {
    () => {
        fn provider(&self) -> Provider {
            Provider::QqMusic
        }

        fn song_name(&self) -> Result<Option<String>> {
            self.track()?.string("name")
        }

        fn song_id(&self) -> Result<Option<i64>> {
            self.track()?.integer("id")
        }

        fn song_mid(&self) -> Result<Option<String>> {
            Ok(guard::non_empty(self.track()?.string("mid")?))
        }

        fn artists(&self) -> Result<Vec<String>> {
            self.track()?.singer_strings("name")
        }

        fn artist_ids(&self) -> Result<Vec<i64>> {
            self.track()?.singer_ids()
        }

        fn artist_mids(&self) -> Result<Vec<String>> {
            self.track()?.singer_strings("mid")
        }

        fn album(&self) -> Result<Option<String>> {
            self.track()?.album_string("name")
        }

        fn album_id(&self) -> Result<Option<i64>> {
            self.track()?.album_id()
        }

        fn album_mid(&self) -> Result<Option<String>> {
            Ok(guard::non_empty(self.track()?.album_string("mid")?))
        }

        fn cover_url(&self) -> Result<Option<String>> {
            self.track()?.cover_url()
        }

        fn aliases(&self) -> Result<Vec<String>> {
            self.track()?.aliases()
        }

        fn publish_time(&self) -> Result<Option<DateTime<Utc>>> {
            self.track()?.publish_time()
        }

        fn detail_key(&self) -> Result<Option<String>> {
            self.song_mid()
        }
    };
}

/// QQ 音乐 검색 결과 항목 어댑터 (`req_0.data.body.song.list[]`).
#[derive(Debug, Clone)]
pub struct QqMusicSearchResult {
    raw: Map<String, Value>,
}

impl QqMusicSearchResult {
    pub fn new(raw: &Value) -> Result<Self> {
        let raw = guard::required_object(raw)?.clone();
        Ok(Self { raw })
    }

    fn track(&self) -> Result<Track<'_>> {
        Ok(Track(Some(&self.raw)))
    }
}

impl SearchResult for QqMusicSearchResult {
    track_accessors!();

    // 검색 결과에는 번역 제목이 없다.
    fn translations(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// QQ 音乐 곡 상세 어댑터 (`songinfo.data`).
///
/// 곡 정보는 `track_info`, 번역 제목은 `extras`, 장르와 회사는 `info` 블록에 있다.
/// `info`의 각 항목은 `{"content": [{"value": ...}]}` 형태다.
#[derive(Debug, Clone)]
pub struct QqMusicSongDetail {
    raw: Map<String, Value>,
}

impl QqMusicSongDetail {
    pub fn new(raw: &Value) -> Result<Self> {
        let raw = guard::required_object(raw)?.clone();
        Ok(Self { raw })
    }

    fn track(&self) -> Result<Track<'_>> {
        Ok(Track(descend(&self.raw, &["track_info"])?))
    }

    fn info_values(&self, key: &str) -> Result<Vec<String>> {
        let block = match descend(&self.raw, &["info", key])? {
            Some(block) => block,
            None => return Ok(Vec::new()),
        };
        let mut values = Vec::new();
        for item in object_list(block, "content")? {
            if let Some(value) = field::<String>(item, "value")? {
                values.push(value);
            }
        }
        Ok(values)
    }
}

impl SearchResult for QqMusicSongDetail {
    track_accessors!();

    fn translations(&self) -> Result<Vec<String>> {
        let transname = match descend(&self.raw, &["extras"])? {
            Some(extras) => guard::non_empty(field(extras, "transname")?),
            None => None,
        };
        Ok(transname.into_iter().collect())
    }
}

impl SongDetail for QqMusicSongDetail {
    fn genre(&self) -> Result<Vec<String>> {
        self.info_values("genre")
    }

    fn company(&self) -> Result<Vec<String>> {
        Ok(self
            .info_values("company")?
            .into_iter()
            .filter(|c| c != COMPANY_SENTINEL)
            .collect())
    }
}

/// 응답 최상위와 요청 블록의 `code`가 모두 0이어야 성공이다.
fn check_status<'a>(doc: &'a Value, name: &str) -> Result<&'a Map<String, Value>> {
    let doc = guard::required_object(doc)?;
    if let Some(code) = field::<i64>(doc, "code")? {
        if code != 0 {
            return Err(Error::RemoteFailure(format!(
                "QQ 音乐이 오류 상태 코드 {}를 반환했습니다",
                code
            )));
        }
    }
    let block = descend(doc, &[name])?.ok_or_else(|| {
        Error::RemoteFailure(format!("QQ 音乐 응답에 {} 블록이 없습니다", name))
    })?;
    match guard::required::<i64>(block, "code")? {
        0 => Ok(block),
        code => Err(Error::RemoteFailure(format!(
            "QQ 音乐이 오류 상태 코드 {}를 반환했습니다",
            code
        ))),
    }
}

/// 검색 응답에서 곡 목록을 꺼낸다. 목록이 없으면 빈 Vec.
pub fn parse_search_response(doc: &Value) -> Result<Vec<QqMusicSearchResult>> {
    let block = check_status(doc, "req_0")?;
    let song = match descend(block, &["data", "body", "song"])? {
        Some(song) => song,
        None => return Ok(Vec::new()),
    };
    match field::<&Vec<Value>>(song, "list")? {
        Some(list) => list.iter().map(QqMusicSearchResult::new).collect(),
        None => Ok(Vec::new()),
    }
}

/// 상세 응답을 어댑터로 감싼다. `track_info`의 mid가 다르거나 없으면 None.
pub fn parse_detail_response(doc: &Value, mid: &str) -> Result<Option<QqMusicSongDetail>> {
    let block = check_status(doc, "songinfo")?;
    let data = match block.get("data") {
        Some(data) if !data.is_null() => data,
        _ => return Ok(None),
    };
    let detail = QqMusicSongDetail::new(data)?;
    if detail.song_mid()?.as_deref() == Some(mid) {
        Ok(Some(detail))
    } else {
        Ok(None)
    }
}

/// 검색 요청 식별자를 만든다. 웹 클라이언트와 같은 방식이다.
fn search_id(n: u64) -> u64 {
    let mut rng = rand::rng();
    let now = Local::now();
    let seconds = u64::from(now.num_seconds_from_midnight());
    let micros = u64::from(now.timestamp_subsec_micros());

    n * 18_014_398_509_481_984
        + rng.random_range(1..=4_194_304u64) * 4_294_967_296
        + 1000 * (seconds + micros)
}

/// 0-9 숫자를 한 번씩 섞은 10자리 uin.
fn random_uin() -> String {
    let mut digits: Vec<char> = "1234567890".chars().collect();
    digits.shuffle(&mut rand::rng());
    digits.into_iter().collect()
}

/// QQ 音乐 API 클라이언트.
pub struct QqMusicClient<T: Transport = HttpTransport> {
    transport: T,
    user_agent: String,
}

impl<T: Transport> QqMusicClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_user_agent(transport, DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(transport: T, user_agent: &str) -> Self {
        Self {
            transport,
            user_agent: user_agent.to_string(),
        }
    }

    fn search_request(&self, query: &str, page_index: u32, page_size: u32) -> ApiRequest {
        let payload = json!({
            "comm": {
                "g_tk": 997034911,
                "uin": random_uin(),
                "format": "json",
                "inCharset": "utf-8",
                "outCharset": "utf-8",
                "notice": 0,
                "platform": "h5",
                "needNewCode": 1,
                "ct": 23,
                "cv": 0
            },
            "req_0": {
                "method": "DoSearchForQQMusicDesktop",
                "module": "music.search.SearchCgiService",
                "param": {
                    "remoteplace": "txt.mqq.all",
                    "searchid": search_id(3),
                    "query": query,
                    "search_type": 0,
                    "page_num": page_index.saturating_add(1),
                    "num_per_page": page_size
                }
            }
        });

        ApiRequest::post(API_URL)
            .query("_webcgikey", "DoSearchForQQMusicDesktop")
            .query("_", Utc::now().timestamp_millis())
            .header("Accept", "*/*")
            .header(
                "Accept-Language",
                "zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6",
            )
            .header("Referer", "https://y.qq.com/")
            .header("User-Agent", &self.user_agent)
            .body(payload.to_string())
    }

    fn detail_request(mid: &str) -> ApiRequest {
        let data = json!({
            "songinfo": {
                "method": "get_song_detail_yqq",
                "module": "music.pf_song_detail_svr",
                "param": {"song_mid": mid}
            }
        });
        ApiRequest::get(API_URL).query("data", data)
    }
}

impl<T: Transport> MusicSource for QqMusicClient<T> {
    fn provider(&self) -> Provider {
        Provider::QqMusic
    }

    fn search(
        &self,
        keywords: &[&str],
        page_index: u32,
        page_size: u32,
    ) -> Result<Vec<Box<dyn SearchResult>>> {
        let query = join_keywords(keywords)?;
        let doc = self
            .transport
            .send_json(&self.search_request(&query, page_index, page_size))?;

        let items = parse_search_response(&doc)?;
        log::debug!("QQ 音乐 검색 '{}': {}건", query, items.len());
        Ok(items
            .into_iter()
            .map(|item| Box::new(item) as Box<dyn SearchResult>)
            .collect())
    }

    /// QQ 音乐은 한 번에 한 곡만 조회할 수 있어 mid마다 요청을 보낸다.
    fn details(&self, keys: &[&str]) -> Result<Vec<Box<dyn SongDetail>>> {
        let mut results: Vec<Box<dyn SongDetail>> = Vec::new();
        for mid in keys.iter().map(|k| k.trim()) {
            if mid.is_empty() {
                return Err(Error::InvalidArgument("빈 곡 mid입니다".to_string()));
            }
            let doc = self.transport.send_json(&Self::detail_request(mid))?;
            match parse_detail_response(&doc, mid)? {
                Some(detail) => results.push(Box::new(detail)),
                None => log::info!("QQ 音乐에서 곡 mid {}를 찾지 못했습니다", mid),
            }
        }
        Ok(results)
    }

    fn fetch_cover(&self, track: &TrackInfo) -> Result<Vec<u8>> {
        let url = track
            .cover_url
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("커버 URL이 없습니다".to_string()))?;
        self.transport.fetch_bytes(url)
    }
}
