use std::path::Path;

use id3::Version;
use lofty::config::WriteOptions;
use lofty::tag::TagExt;

use crate::core::encoder::TagContainer;
use crate::error::Result;

/// 태그 컨테이너를 오디오 파일에 기록한다.
/// ID3는 v2.4로 기록하고, 나머지는 lofty가 파일 형식에 맞게 기록한다.
pub fn write_tags(path: &Path, container: &TagContainer) -> Result<()> {
    log::debug!("{} 태그 기록: {}", container.kind(), path.display());

    match container {
        TagContainer::Id3(tag) => tag.write_to_path(path, Version::Id3v24)?,
        TagContainer::Ape(tag) => tag.save_to_path(path, WriteOptions::default())?,
        TagContainer::Flac(comments) | TagContainer::VorbisComment(comments) => {
            comments.save_to_path(path, WriteOptions::default())?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder::{encode, TagKind};
    use crate::models::{Provider, TrackInfo};
    use id3::TagLike;
    use lofty::config::ParseOptions;
    use lofty::file::TaggedFileExt;
    use lofty::probe::Probe;
    use lofty::tag::{Accessor, TagType};
    use tempfile::tempdir;

    /// 128kbps 44.1kHz MPEG-1 Layer III 무음 프레임 세 개.
    fn silent_mp3() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(b"\xff\xfb\x90\x00");
        frame.repeat(3)
    }

    #[test]
    fn test_write_id3() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"\xff\xfb\x90\x00").unwrap();

        let mut record = TrackInfo::empty(Provider::QqMusic);
        record.song_name = Some("晴天".to_string());
        record.artists = vec!["周杰伦".to_string()];
        let container = encode(&record, TagKind::Id3, None).unwrap();

        write_tags(&path, &container).unwrap();

        let tag = id3::Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("晴天"));
        assert_eq!(tag.artist(), Some("周杰伦"));
    }

    #[test]
    fn test_write_ape_through_lofty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, silent_mp3()).unwrap();

        let mut record = TrackInfo::empty(Provider::CloudMusic);
        record.song_name = Some("晴天".to_string());
        record.album = Some("叶惠美".to_string());
        let container = encode(&record, TagKind::Ape, None).unwrap();

        write_tags(&path, &container).unwrap();

        let tagged = Probe::open(&path)
            .unwrap()
            .options(ParseOptions::new().read_properties(false))
            .read()
            .unwrap();
        let tag = tagged.tag(TagType::Ape).expect("APE 태그가 없음");
        assert_eq!(tag.title().as_deref(), Some("晴天"));
        assert_eq!(tag.album().as_deref(), Some("叶惠美"));
    }

    #[test]
    fn test_write_missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.flac");

        let mut record = TrackInfo::empty(Provider::CloudMusic);
        record.song_name = Some("x".to_string());
        let container = encode(&record, TagKind::Flac, None).unwrap();

        assert!(write_tags(&path, &container).is_err());
    }
}
