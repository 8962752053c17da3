use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::core::guard::{self, descend, field, object_list, string_list};
use crate::error::{Error, Result};
use crate::models::{Provider, TrackInfo};
use crate::sources::{
    join_keywords, ApiRequest, HttpTransport, MusicSource, SearchResult, SongDetail, Transport,
};

const SEARCH_URL: &str = "https://music.163.com/api/cloudsearch/pc";
const DETAIL_URL: &str = "https://music.163.com/api/v3/song/detail";

/// 网易云音乐 곡 객체 어댑터.
///
/// 검색 응답(`result.songs[]`)과 상세 응답(`songs[]`)의 곡 객체는 같은 형태라서
/// 하나의 타입이 `SearchResult`와 `SongDetail`을 모두 구현한다.
/// 키 이름이 짧다: `ar`(아티스트), `al`(앨범), `alia`(별명), `tns`(번역).
#[derive(Debug, Clone)]
pub struct CloudMusicSong {
    raw: Map<String, Value>,
}

impl CloudMusicSong {
    /// 원본 JSON을 복사해 어댑터를 만든다. 객체가 아니면 `SchemaMismatch`.
    pub fn new(raw: &Value) -> Result<Self> {
        let raw = guard::required_object(raw)?.clone();
        Ok(Self { raw })
    }

    /// 이름이 있는 `ar` 항목만. 이름과 id 목록이 같은 항목에서 나온다.
    fn named_artists(&self) -> Result<Vec<&Map<String, Value>>> {
        let mut named = Vec::new();
        for artist in object_list(&self.raw, "ar")? {
            if field::<&str>(artist, "name")?.is_some() {
                named.push(artist);
            }
        }
        Ok(named)
    }

    fn album_object(&self) -> Result<Option<&Map<String, Value>>> {
        descend(&self.raw, &["al"])
    }
}

impl SearchResult for CloudMusicSong {
    fn provider(&self) -> Provider {
        Provider::CloudMusic
    }

    fn song_name(&self) -> Result<Option<String>> {
        field(&self.raw, "name")
    }

    fn song_id(&self) -> Result<Option<i64>> {
        field(&self.raw, "id")
    }

    fn song_mid(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn artists(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for artist in self.named_artists()? {
            if let Some(name) = field::<String>(artist, "name")? {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn artist_ids(&self) -> Result<Vec<i64>> {
        let mut ids = Vec::new();
        for artist in self.named_artists()? {
            if let Some(id) = field::<i64>(artist, "id")? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn artist_mids(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn album(&self) -> Result<Option<String>> {
        match self.album_object()? {
            Some(al) => field(al, "name"),
            None => Ok(None),
        }
    }

    fn album_id(&self) -> Result<Option<i64>> {
        match self.album_object()? {
            Some(al) => field(al, "id"),
            None => Ok(None),
        }
    }

    fn album_mid(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn cover_url(&self) -> Result<Option<String>> {
        match self.album_object()? {
            Some(al) => Ok(guard::non_empty(field(al, "picUrl")?)),
            None => Ok(None),
        }
    }

    fn aliases(&self) -> Result<Vec<String>> {
        string_list(&self.raw, "alia")
    }

    fn translations(&self) -> Result<Vec<String>> {
        string_list(&self.raw, "tns")
    }

    /// `publishTime`은 밀리초 단위다. 0은 발매일 미상, 음수는 1970년 이전.
    fn publish_time(&self) -> Result<Option<DateTime<Utc>>> {
        match field::<i64>(&self.raw, "publishTime")? {
            None | Some(0) => Ok(None),
            Some(millis) => Ok(DateTime::from_timestamp_millis(millis)),
        }
    }

    fn detail_key(&self) -> Result<Option<String>> {
        Ok(self.song_id()?.map(|id| id.to_string()))
    }
}

impl SongDetail for CloudMusicSong {
    // 곡 상세 API는 장르와 회사 정보를 내려주지 않는다.
    fn genre(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn company(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// 응답 본문의 `code`가 400 이상이면 실패로 본다.
fn check_status(doc: &Map<String, Value>) -> Result<()> {
    match field::<i64>(doc, "code")? {
        Some(code) if code >= 400 => Err(Error::RemoteFailure(format!(
            "网易云音乐이 오류 상태 코드 {}를 반환했습니다",
            code
        ))),
        _ => Ok(()),
    }
}

/// 검색 응답에서 곡 목록을 꺼낸다. 목록이 없으면 빈 Vec.
pub fn parse_search_response(doc: &Value) -> Result<Vec<CloudMusicSong>> {
    let doc = guard::required_object(doc)?;
    check_status(doc)?;

    let result = match descend(doc, &["result"])? {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };
    let songs = match field::<&Vec<Value>>(result, "songs")? {
        Some(songs) => songs,
        None => return Ok(Vec::new()),
    };
    songs.iter().map(CloudMusicSong::new).collect()
}

/// 상세 응답에서 `id`가 일치하는 곡을 찾는다.
pub fn parse_detail_response(doc: &Value, id: i64) -> Result<Option<CloudMusicSong>> {
    let doc = guard::required_object(doc)?;
    check_status(doc)?;

    let songs = field::<&Vec<Value>>(doc, "songs")?.ok_or_else(|| {
        Error::RemoteFailure("곡 상세 응답에 songs 목록이 없습니다".to_string())
    })?;
    for song in songs {
        let song = CloudMusicSong::new(song)?;
        if song.song_id()? == Some(id) {
            return Ok(Some(song));
        }
    }
    Ok(None)
}

/// 网易云音乐 API 클라이언트.
pub struct CloudMusicClient<T: Transport = HttpTransport> {
    transport: T,
}

impl<T: Transport> CloudMusicClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn search_request(query: &str, page_index: u32, page_size: u32) -> ApiRequest {
        ApiRequest::post(SEARCH_URL)
            .form("s", query)
            .form("type", 1)
            .form("limit", page_size)
            .form("offset", u64::from(page_index) * u64::from(page_size))
            .form("total", true)
    }

    fn detail_request(id: i64) -> ApiRequest {
        ApiRequest::post(DETAIL_URL).form("c", json!([{ "id": id }]))
    }
}

impl<T: Transport> MusicSource for CloudMusicClient<T> {
    fn provider(&self) -> Provider {
        Provider::CloudMusic
    }

    fn search(
        &self,
        keywords: &[&str],
        page_index: u32,
        page_size: u32,
    ) -> Result<Vec<Box<dyn SearchResult>>> {
        let query = join_keywords(keywords)?;
        let request = Self::search_request(&query, page_index, page_size);
        let doc = self.transport.send_json(&request)?;

        let songs = parse_search_response(&doc)?;
        log::debug!("网易云音乐 검색 '{}': {}건", query, songs.len());
        Ok(songs
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn SearchResult>)
            .collect())
    }

    fn details(&self, keys: &[&str]) -> Result<Vec<Box<dyn SongDetail>>> {
        let mut results: Vec<Box<dyn SongDetail>> = Vec::new();
        for key in keys {
            let id: i64 = key
                .trim()
                .parse()
                .map_err(|_| Error::InvalidArgument(format!("곡 ID가 숫자가 아닙니다: {}", key)))?;

            let doc = self.transport.send_json(&Self::detail_request(id))?;
            match parse_detail_response(&doc, id)? {
                Some(song) => results.push(Box::new(song)),
                None => log::info!("网易云音乐에서 곡 ID {}를 찾지 못했습니다", id),
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
