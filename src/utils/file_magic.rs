/// 允许上传的类型与其扩展名
pub const ALLOWED_ATTACHMENT_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    ALLOWED_ATTACHMENT_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(mime_type))
        .map(|(_, ext)| *ext)
}

/// 由对象路径的扩展名反查类型
pub fn mime_for_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.')?.1;
    ALLOWED_ATTACHMENT_TYPES
        .iter()
        .find(|(_, e)| e.eq_ignore_ascii_case(ext))
        .map(|(mime, _)| *mime)
}

/// 验证文件头部的魔术字节是否与声明的 MIME 类型一致
///
/// # Arguments
/// * `data` - 文件内容的前几个字节
/// * `mime_type` - 客户端声明的类型，如 "image/png"
pub fn validate_magic_bytes(data: &[u8], mime_type: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match mime_type.to_ascii_lowercase().as_str() {
        "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "image/webp" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",
        "application/pdf" => data.starts_with(b"%PDF"),
        // 其余类型一律拒绝
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(validate_magic_bytes(&png_header, "image/png"));
        assert!(validate_magic_bytes(&png_header, "IMAGE/PNG"));
        assert!(!validate_magic_bytes(&png_header, "image/jpeg"));
    }

    #[test]
    fn test_webp_magic() {
        let mut webp = b"RIFF\0\0\0\0WEBPVP8 ".to_vec();
        assert!(validate_magic_bytes(&webp, "image/webp"));
        webp.truncate(10);
        assert!(!validate_magic_bytes(&webp, "image/webp"));
    }

    #[test]
    fn test_pdf_and_unknown() {
        assert!(validate_magic_bytes(b"%PDF-1.7", "application/pdf"));
        assert!(!validate_magic_bytes(b"%PDF-1.7", "text/plain"));
        assert!(!validate_magic_bytes(&[], "application/pdf"));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("application/PDF"), Some("pdf"));
        assert_eq!(extension_for("image/gif"), None);
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("h1/1700000000000-ab12.png"), Some("image/png"));
        assert_eq!(mime_for_path("h1/file.JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_path("h1/noext"), None);
    }
}
