use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};

use crate::error::{Error, Result};
use crate::sources::{SearchResult, SongDetail};

/// 여러 값을 한 줄로 보여줄 때 쓰는 구분자.
pub const PROPERTY_SEP: &str = "、";

/// 지원하는 검색 소스.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// 网易云音乐
    CloudMusic,
    /// QQ 音乐
    QqMusic,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::CloudMusic, Provider::QqMusic];

    pub fn name(self) -> &'static str {
        match self {
            Provider::CloudMusic => "cloudmusic",
            Provider::QqMusic => "qqmusic",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Provider::CloudMusic => "网易云音乐",
            Provider::QqMusic => "QQ 音乐",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidArgument(format!("알 수 없는 검색 소스: {}", s)))
    }
}

/// 어댑터에서 한 번에 읽어낸 정규화된 곡 정보.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub provider: Provider,
    pub song_name: Option<String>,
    pub song_id: Option<i64>,
    pub song_mid: Option<String>,
    pub artists: Vec<String>,
    pub artist_ids: Vec<i64>,
    pub artist_mids: Vec<String>,
    pub album: Option<String>,
    pub album_id: Option<i64>,
    pub album_mid: Option<String>,
    pub cover_url: Option<String>,
    pub aliases: Vec<String>,
    pub translations: Vec<String>,
    pub publish_time: Option<DateTime<Utc>>,
    pub genre: Vec<String>,
    pub company: Vec<String>,
}

impl TrackInfo {
    /// 빈 레코드. 모든 필드가 비어 있다.
    #[cfg(test)]
    pub fn empty(provider: Provider) -> Self {
        Self {
            provider,
            song_name: None,
            song_id: None,
            song_mid: None,
            artists: Vec::new(),
            artist_ids: Vec::new(),
            artist_mids: Vec::new(),
            album: None,
            album_id: None,
            album_mid: None,
            cover_url: None,
            aliases: Vec::new(),
            translations: Vec::new(),
            publish_time: None,
            genre: Vec::new(),
            company: Vec::new(),
        }
    }

    /// 검색 결과 어댑터의 모든 접근자를 읽어 스냅샷을 만든다.
    pub fn from_result<R: SearchResult + ?Sized>(result: &R) -> Result<Self> {
        Ok(Self {
            provider: result.provider(),
            song_name: result.song_name()?,
            song_id: result.song_id()?,
            song_mid: result.song_mid()?,
            artists: result.artists()?,
            artist_ids: result.artist_ids()?,
            artist_mids: result.artist_mids()?,
            album: result.album()?,
            album_id: result.album_id()?,
            album_mid: result.album_mid()?,
            cover_url: result.cover_url()?,
            aliases: result.aliases()?,
            translations: result.translations()?,
            publish_time: result.publish_time()?,
            genre: Vec::new(),
            company: Vec::new(),
        })
    }

    /// 상세 어댑터의 스냅샷. 장르와 회사 정보까지 포함한다.
    pub fn from_detail<D: SongDetail + ?Sized>(detail: &D) -> Result<Self> {
        let mut info = Self::from_result(detail)?;
        info.genre = detail.genre()?;
        info.company = detail.company()?;
        Ok(info)
    }

    pub fn year(&self) -> Option<i32> {
        self.publish_time.map(|t| t.year())
    }

    pub fn display_title(&self) -> &str {
        self.song_name.as_deref().unwrap_or("알 수 없음")
    }

    pub fn display_artist(&self) -> String {
        if self.artists.is_empty() {
            "알 수 없음".to_string()
        } else {
            self.artists.join(PROPERTY_SEP)
        }
    }

    pub fn display_album(&self) -> &str {
        self.album.as_deref().unwrap_or("알 수 없음")
    }

    pub fn summary(&self) -> String {
        format!(
            "{} - {} [{}]",
            self.display_artist(),
            self.display_title(),
            self.display_album()
        )
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec!["<".to_string()];

        match &self.song_name {
            Some(name) if !name.is_empty() => lines.push(format!("name: {}", name)),
            _ => lines.push("noname".to_string()),
        }
        let lists = [
            ("trans", &self.translations),
            ("aliases", &self.aliases),
            ("artists", &self.artists),
        ];
        for (label, values) in lists {
            if !values.is_empty() {
                lines.push(format!("{}: {}", label, values.join(PROPERTY_SEP)));
            }
        }
        if let Some(album) = self.album.as_deref().filter(|a| !a.is_empty()) {
            lines.push(format!("album: {}", album));
        }
        if let Some(time) = self.publish_time {
            lines.push(format!("publish time: {}", time.format("%Y-%m-%d %H:%M:%S")));
        }
        for (label, values) in [("genre", &self.genre), ("company", &self.company)] {
            if !values.is_empty() {
                lines.push(format!("{}: {}", label, values.join(PROPERTY_SEP)));
            }
        }

        write!(f, "{}\n>", lines.join("\n    "))
    }
}
