use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use id3::TagLike;
use lofty::ape::{ApeItem, ApeTag};
use lofty::ogg::{OggPictureStorage, VorbisComments};
use lofty::picture::{Picture, PictureInformation, PictureType};
use lofty::tag::ItemValue;

use crate::core::picture::{self, PictureFormat};
use crate::error::{Error, Result};
use crate::models::{TrackInfo, PROPERTY_SEP};

/// 생성할 수 있는 태그 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Ape,
    Flac,
    Id3,
    VorbisComment,
}

impl TagKind {
    pub fn name(self) -> &'static str {
        match self {
            TagKind::Ape => "ape",
            TagKind::Flac => "flac",
            TagKind::Id3 => "id3",
            TagKind::VorbisComment => "vorbis",
        }
    }

    /// 파일 확장자로 태그 종류를 정한다.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "mp3" => Ok(TagKind::Id3),
            "flac" => Ok(TagKind::Flac),
            "ogg" | "oga" | "opus" => Ok(TagKind::VorbisComment),
            "ape" | "wv" | "mpc" => Ok(TagKind::Ape),
            _ => Err(Error::UnsupportedKind(format!(
                "확장자로 태그 형식을 알 수 없습니다: {}",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TagKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ape" | "apev2" => Ok(TagKind::Ape),
            "flac" => Ok(TagKind::Flac),
            "id3" => Ok(TagKind::Id3),
            "vorbis" | "vorbiscomment" | "ogg" => Ok(TagKind::VorbisComment),
            _ => Err(Error::UnsupportedKind(s.to_string())),
        }
    }
}

/// 인코딩 결과. 종류마다 키 이름 규칙과 그림 저장 방식이 다르다.
#[derive(Debug, Clone)]
pub enum TagContainer {
    Ape(ApeTag),
    Flac(VorbisComments),
    Id3(id3::Tag),
    VorbisComment(VorbisComments),
}

/// 필드 하나에 담기는 값.
enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// 한 항목에 여러 값을 넣는 형식(APE, ID3)에서 쓰는 표현.
    fn joined(&self) -> String {
        match self {
            FieldValue::Single(s) => s.clone(),
            FieldValue::Multi(values) => values.join("\0"),
        }
    }
}

enum Id3Key {
    Text(&'static str),
    /// `TXXX` 프레임의 description.
    Extended(&'static str),
}

struct FieldSpec {
    ape: &'static str,
    vorbis: &'static str,
    id3: Id3Key,
    read: fn(&TrackInfo) -> Option<FieldValue>,
}

fn title(record: &TrackInfo) -> Option<FieldValue> {
    record
        .song_name
        .clone()
        .filter(|s| !s.is_empty())
        .map(FieldValue::Single)
}

fn artists(record: &TrackInfo) -> Option<FieldValue> {
    multi(&record.artists)
}

fn album(record: &TrackInfo) -> Option<FieldValue> {
    record
        .album
        .clone()
        .filter(|s| !s.is_empty())
        .map(FieldValue::Single)
}

fn year(record: &TrackInfo) -> Option<FieldValue> {
    record.year().map(|y| FieldValue::Single(y.to_string()))
}

fn genre(record: &TrackInfo) -> Option<FieldValue> {
    multi(&record.genre)
}

fn label(record: &TrackInfo) -> Option<FieldValue> {
    if record.company.is_empty() {
        return None;
    }
    Some(FieldValue::Single(record.company.join(PROPERTY_SEP)))
}

fn multi(values: &[String]) -> Option<FieldValue> {
    let values: Vec<String> = values.iter().filter(|v| !v.is_empty()).cloned().collect();
    if values.is_empty() {
        None
    } else {
        Some(FieldValue::Multi(values))
    }
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        ape: "TITLE",
        vorbis: "title",
        id3: Id3Key::Text("TIT2"),
        read: title,
    },
    FieldSpec {
        ape: "ARTIST",
        vorbis: "artist",
        id3: Id3Key::Text("TPE1"),
        read: artists,
    },
    FieldSpec {
        ape: "ALBUM",
        vorbis: "album",
        id3: Id3Key::Text("TALB"),
        read: album,
    },
    FieldSpec {
        ape: "YEAR",
        vorbis: "date",
        id3: Id3Key::Text("TDRC"),
        read: year,
    },
    FieldSpec {
        ape: "GENRE",
        vorbis: "genre",
        id3: Id3Key::Text("TCON"),
        read: genre,
    },
    FieldSpec {
        ape: "LABEL",
        vorbis: "label",
        id3: Id3Key::Extended("LABEL"),
        read: label,
    },
];

const APE_COVER_KEY: &str = "Cover Art (Front)";
const VORBIS_PICTURE_KEY: &str = "METADATA_BLOCK_PICTURE";

impl TagContainer {
    fn empty(kind: TagKind) -> Self {
        match kind {
            TagKind::Ape => TagContainer::Ape(ApeTag::new()),
            TagKind::Flac => TagContainer::Flac(VorbisComments::new()),
            TagKind::Id3 => TagContainer::Id3(id3::Tag::new()),
            TagKind::VorbisComment => TagContainer::VorbisComment(VorbisComments::new()),
        }
    }

    pub fn kind(&self) -> TagKind {
        match self {
            TagContainer::Ape(_) => TagKind::Ape,
            TagContainer::Flac(_) => TagKind::Flac,
            TagContainer::Id3(_) => TagKind::Id3,
            TagContainer::VorbisComment(_) => TagKind::VorbisComment,
        }
    }

    fn set(&mut self, spec: &FieldSpec, value: FieldValue) -> Result<()> {
        match self {
            TagContainer::Ape(tag) => {
                tag.insert(ApeItem::new(
                    spec.ape.to_string(),
                    ItemValue::Text(value.joined()),
                )?);
            }
            TagContainer::Flac(comments) | TagContainer::VorbisComment(comments) => match value {
                FieldValue::Single(s) => comments.push(spec.vorbis.to_string(), s),
                FieldValue::Multi(values) => {
                    for v in values {
                        comments.push(spec.vorbis.to_string(), v);
                    }
                }
            },
            TagContainer::Id3(tag) => match spec.id3 {
                Id3Key::Text(id) => tag.set_text(id, value.joined()),
                Id3Key::Extended(description) => {
                    tag.add_frame(id3::frame::ExtendedText {
                        description: description.to_string(),
                        value: value.joined(),
                    });
                }
            },
        }
        Ok(())
    }

    fn embed_cover(&mut self, format: PictureFormat, data: &[u8]) -> Result<()> {
        match self {
            TagContainer::Ape(tag) => {
                let mut value = format!("cover.{}\0", format.extension()).into_bytes();
                value.extend_from_slice(data);
                tag.insert(ApeItem::new(
                    APE_COVER_KEY.to_string(),
                    ItemValue::Binary(value),
                )?);
            }
            TagContainer::Flac(comments) => {
                let picture = front_cover(format, data);
                let info = PictureInformation::from_picture(&picture).unwrap_or_default();
                comments.insert_picture(picture, Some(info))?;
            }
            TagContainer::VorbisComment(comments) => {
                let picture = front_cover(format, data);
                let info = PictureInformation::from_picture(&picture).unwrap_or_default();
                let block = picture.as_flac_bytes(info, false);
                comments.push(VORBIS_PICTURE_KEY.to_string(), STANDARD.encode(block));
            }
            TagContainer::Id3(tag) => {
                tag.add_frame(id3::frame::Picture {
                    mime_type: format.mime().to_string(),
                    picture_type: id3::frame::PictureType::CoverFront,
                    description: String::new(),
                    data: data.to_vec(),
                });
            }
        }
        Ok(())
    }
}

fn front_cover(format: PictureFormat, data: &[u8]) -> Picture {
    Picture::new_unchecked(
        PictureType::CoverFront,
        Some(format.lofty_mime()),
        None,
        data.to_vec(),
    )
}

/// 곡 정보를 태그 컨테이너로 인코딩한다.
///
/// 비어 있는 필드는 건너뛴다. 커버 이미지는 형식을 알아볼 수 있을 때만 넣는다.
pub fn encode(record: &TrackInfo, kind: TagKind, cover: Option<&[u8]>) -> Result<TagContainer> {
    let mut container = TagContainer::empty(kind);

    for spec in FIELDS {
        if let Some(value) = (spec.read)(record) {
            container.set(spec, value)?;
        }
    }

    if let Some(data) = cover.filter(|d| !d.is_empty()) {
        match picture::sniff(data) {
            Some(format) => container.embed_cover(format, data)?,
            None => log::debug!("알 수 없는 이미지 형식이라 커버를 넣지 않습니다 ({}바이트)", data.len()),
        }
    }

    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;
    use chrono::{TimeZone, Utc};
    use lofty::tag::TagExt;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    fn titled(name: &str) -> TrackInfo {
        let mut record = TrackInfo::empty(Provider::QqMusic);
        record.song_name = Some(name.to_string());
        record
    }

    fn ape(container: TagContainer) -> ApeTag {
        match container {
            TagContainer::Ape(tag) => tag,
            other => panic!("APE가 아님: {:?}", other.kind()),
        }
    }

    fn comments(container: TagContainer) -> VorbisComments {
        match container {
            TagContainer::Flac(c) | TagContainer::VorbisComment(c) => c,
            other => panic!("Vorbis 계열이 아님: {:?}", other.kind()),
        }
    }

    fn id3_tag(container: TagContainer) -> id3::Tag {
        match container {
            TagContainer::Id3(tag) => tag,
            other => panic!("ID3가 아님: {:?}", other.kind()),
        }
    }

    fn ape_text(tag: &ApeTag, key: &str) -> Option<String> {
        match tag.get(key).map(|item| item.value()) {
            Some(ItemValue::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("APEv2".parse::<TagKind>().unwrap(), TagKind::Ape);
        assert_eq!("flac".parse::<TagKind>().unwrap(), TagKind::Flac);
        assert_eq!(" ID3 ".parse::<TagKind>().unwrap(), TagKind::Id3);
        assert_eq!("ogg".parse::<TagKind>().unwrap(), TagKind::VorbisComment);
        assert!(matches!(
            "wav".parse::<TagKind>(),
            Err(Error::UnsupportedKind(_))
        ));
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(TagKind::from_path(Path::new("a/晴天.MP3")).unwrap(), TagKind::Id3);
        assert_eq!(TagKind::from_path(Path::new("x.opus")).unwrap(), TagKind::VorbisComment);
        assert_eq!(TagKind::from_path(Path::new("x.wv")).unwrap(), TagKind::Ape);
        assert!(TagKind::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_title_only_in_every_kind() {
        let record = titled("晴天");

        let tag = ape(encode(&record, TagKind::Ape, None).unwrap());
        assert_eq!(tag.len(), 1);
        assert_eq!(ape_text(&tag, "TITLE").as_deref(), Some("晴天"));

        for kind in [TagKind::Flac, TagKind::VorbisComment] {
            let c = comments(encode(&record, kind, None).unwrap());
            assert_eq!(c.items().count(), 1);
            assert_eq!(c.get("title"), Some("晴天"));
            assert!(c.pictures().is_empty());
        }

        let tag = id3_tag(encode(&record, TagKind::Id3, None).unwrap());
        assert_eq!(tag.frames().count(), 1);
        assert_eq!(tag.title(), Some("晴天"));
    }

    #[test]
    fn test_empty_record_is_empty_container() {
        let record = TrackInfo::empty(Provider::CloudMusic);
        assert_eq!(ape(encode(&record, TagKind::Ape, None).unwrap()).len(), 0);
        assert_eq!(
            id3_tag(encode(&record, TagKind::Id3, None).unwrap()).frames().count(),
            0
        );
    }

    #[test]
    fn test_artists_per_kind() {
        let mut record = titled("Stay");
        record.artists = vec!["A".to_string(), "B".to_string()];

        let tag = ape(encode(&record, TagKind::Ape, None).unwrap());
        assert_eq!(ape_text(&tag, "ARTIST").as_deref(), Some("A\0B"));

        let c = comments(encode(&record, TagKind::Flac, None).unwrap());
        assert_eq!(c.get_all("artist").collect::<Vec<_>>(), vec!["A", "B"]);

        let tag = id3_tag(encode(&record, TagKind::Id3, None).unwrap());
        let tpe1 = tag.get("TPE1").and_then(|f| f.content().text());
        assert_eq!(tpe1, Some("A\0B"));
    }

    #[test]
    fn test_year_from_publish_time() {
        let mut record = TrackInfo::empty(Provider::CloudMusic);
        record.publish_time = Some(Utc.with_ymd_and_hms(2003, 7, 31, 0, 0, 0).unwrap());

        let tag = ape(encode(&record, TagKind::Ape, None).unwrap());
        assert_eq!(tag.len(), 1);
        assert_eq!(ape_text(&tag, "YEAR").as_deref(), Some("2003"));

        let c = comments(encode(&record, TagKind::VorbisComment, None).unwrap());
        assert_eq!(c.get("date"), Some("2003"));

        let tag = id3_tag(encode(&record, TagKind::Id3, None).unwrap());
        assert_eq!(
            tag.get("TDRC").and_then(|f| f.content().text()),
            Some("2003")
        );
    }

    #[test]
    fn test_label_joins_companies() {
        let mut record = TrackInfo::empty(Provider::QqMusic);
        record.company = vec!["杰威尔音乐".to_string(), "索尼音乐".to_string()];

        let c = comments(encode(&record, TagKind::Flac, None).unwrap());
        assert_eq!(c.get("label"), Some("杰威尔音乐、索尼音乐"));

        let tag = id3_tag(encode(&record, TagKind::Id3, None).unwrap());
        let label = tag
            .extended_texts()
            .find(|t| t.description == "LABEL")
            .map(|t| t.value.clone());
        assert_eq!(label.as_deref(), Some("杰威尔音乐、索尼音乐"));
    }

    #[test]
    fn test_cover_embedded_per_kind() {
        let record = titled("晴天");

        let tag = ape(encode(&record, TagKind::Ape, Some(PNG)).unwrap());
        match tag.get(APE_COVER_KEY).map(|item| item.value()) {
            Some(ItemValue::Binary(data)) => {
                assert!(data.starts_with(b"cover.png\0"));
                assert!(data.ends_with(PNG));
            }
            other => panic!("커버 항목이 없음: {:?}", other),
        }

        let c = comments(encode(&record, TagKind::Flac, Some(PNG)).unwrap());
        assert_eq!(c.pictures().len(), 1);
        assert_eq!(c.pictures()[0].0.pic_type(), PictureType::CoverFront);

        let c = comments(encode(&record, TagKind::VorbisComment, Some(PNG)).unwrap());
        let encoded = c.get(VORBIS_PICTURE_KEY).unwrap();
        assert!(!STANDARD.decode(encoded).unwrap().is_empty());

        let tag = id3_tag(encode(&record, TagKind::Id3, Some(PNG)).unwrap());
        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].mime_type, "image/png");
        assert_eq!(pictures[0].data, PNG);
    }

    #[test]
    fn test_unrecognized_cover_omitted() {
        let record = titled("晴天");
        let garbage: &[u8] = b"GIF89a....";

        assert_eq!(ape(encode(&record, TagKind::Ape, Some(garbage)).unwrap()).len(), 1);
        let c = comments(encode(&record, TagKind::Flac, Some(garbage)).unwrap());
        assert!(c.pictures().is_empty());
        let tag = id3_tag(encode(&record, TagKind::Id3, Some(garbage)).unwrap());
        assert_eq!(tag.pictures().count(), 0);
    }

    #[test]
    fn test_empty_cover_omitted() {
        let tag = id3_tag(encode(&titled("x"), TagKind::Id3, Some(&[][..])).unwrap());
        assert_eq!(tag.pictures().count(), 0);
    }
}
