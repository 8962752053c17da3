/// 커버 이미지 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureFormat {
    Png,
    Jpeg,
    Bmp,
}

/// 매직 바이트 표. 위에서부터 먼저 일치하는 항목을 쓴다.
const SIGNATURES: &[(&[u8], PictureFormat)] = &[
    (b"\x89PNG\r\n\x1a\n", PictureFormat::Png),
    (b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01", PictureFormat::Jpeg),
    (b"\xff\xd8\xff\xee", PictureFormat::Jpeg),
    (b"\xff\xd8\xff\xe1", PictureFormat::Jpeg),
    (b"BM", PictureFormat::Bmp),
];

impl PictureFormat {
    pub fn mime(self) -> &'static str {
        match self {
            PictureFormat::Png => "image/png",
            PictureFormat::Jpeg => "image/jpeg",
            PictureFormat::Bmp => "image/bmp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PictureFormat::Png => "png",
            PictureFormat::Jpeg => "jpg",
            PictureFormat::Bmp => "bmp",
        }
    }

    pub(crate) fn lofty_mime(self) -> lofty::picture::MimeType {
        match self {
            PictureFormat::Png => lofty::picture::MimeType::Png,
            PictureFormat::Jpeg => lofty::picture::MimeType::Jpeg,
            PictureFormat::Bmp => lofty::picture::MimeType::Bmp,
        }
    }
}

/// 이미지 바이너리의 매직 바이트로 형식을 판별한다.
/// 알 수 없는 형식이면 None을 반환한다.
pub fn sniff(data: &[u8]) -> Option<PictureFormat> {
    SIGNATURES
        .iter()
        .find(|(magic, _)| data.starts_with(*magic))
        .map(|&(_, format)| format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png() {
        let data = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
        let format = sniff(data).unwrap();
        assert_eq!(format.mime(), "image/png");
        assert_eq!(format.extension(), "png");
    }

    #[test]
    fn test_jpeg_variants() {
        for data in [
            &b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01\x01"[..],
            &b"\xff\xd8\xff\xee\x00"[..],
            &b"\xff\xd8\xff\xe1\x00\x18Exif"[..],
        ] {
            assert_eq!(sniff(data), Some(PictureFormat::Jpeg));
        }
    }

    #[test]
    fn test_bmp() {
        assert_eq!(sniff(b"BM\x36\x00"), Some(PictureFormat::Bmp));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(sniff(&[0, 0, 0, 0]), None);
        assert_eq!(sniff(&[]), None);
        // JFIF 헤더가 잘린 경우
        assert_eq!(sniff(b"\xff\xd8\xff\xe0\x00"), None);
    }

    #[test]
    fn test_sniff_is_deterministic() {
        let data = b"\xff\xd8\xff\xee\x00\x01";
        assert_eq!(sniff(data), sniff(data));
        assert_eq!(sniff(&[0; 4]), sniff(&[0; 4]));
    }
}
