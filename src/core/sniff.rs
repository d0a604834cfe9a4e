//! Content-type detection from the leading bytes of a body.
//!
//! Implements the subset of the WHATWG MIME sniffing algorithm that HTTP
//! servers commonly apply when a handler writes a body without declaring a
//! `Content-Type`. At most the first [`SNIFF_LEN`] bytes are considered and
//! the result is always a valid MIME type, `application/octet-stream` when
//! nothing more specific matches.

/// Number of leading bytes the detection looks at.
pub const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const TEXT_HTML_UTF8: &str = "text/html; charset=utf-8";

enum Signature {
    /// Byte-for-byte prefix match
    Exact(&'static [u8], &'static str),
    /// Prefix match after and-ing each data byte with the mask
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        skip_ws: bool,
        content_type: &'static str,
    },
    /// Case-insensitive tag followed by a space or `>`
    Html(&'static [u8]),
    Mp4,
    Text,
}

const SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"<?xml",
        skip_ws: true,
        content_type: "text/xml; charset=utf-8",
    },
    Signature::Exact(b"%PDF-", "application/pdf"),
    Signature::Exact(b"%!PS-Adobe-", "application/postscript"),
    // byte order marks
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFE\xFF\x00\x00",
        skip_ws: false,
        content_type: "text/plain; charset=utf-16be",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFF\xFE\x00\x00",
        skip_ws: false,
        content_type: "text/plain; charset=utf-16le",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\x00",
        pattern: b"\xEF\xBB\xBF\x00",
        skip_ws: false,
        content_type: TEXT_PLAIN_UTF8,
    },
    // images
    Signature::Exact(b"\x00\x00\x01\x00", "image/x-icon"),
    Signature::Exact(b"\x00\x00\x02\x00", "image/x-icon"),
    Signature::Exact(b"BM", "image/bmp"),
    Signature::Exact(b"GIF87a", "image/gif"),
    Signature::Exact(b"GIF89a", "image/gif"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
        skip_ws: false,
        content_type: "image/webp",
    },
    Signature::Exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    Signature::Exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // audio and video
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"FORM\x00\x00\x00\x00AIFF",
        skip_ws: false,
        content_type: "audio/aiff",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF",
        pattern: b"ID3",
        skip_ws: false,
        content_type: "audio/mpeg",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"OggS\x00",
        skip_ws: false,
        content_type: "application/ogg",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"MThd\x00\x00\x00\x06",
        skip_ws: false,
        content_type: "audio/midi",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00AVI ",
        skip_ws: false,
        content_type: "video/avi",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WAVE",
        skip_ws: false,
        content_type: "audio/wave",
    },
    Signature::Mp4,
    Signature::Exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // fonts
    Signature::Masked {
        mask: b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\xFF\xFF",
        pattern: b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00LP",
        skip_ws: false,
        content_type: "application/vnd.ms-fontobject",
    },
    Signature::Exact(b"\x00\x01\x00\x00", "font/ttf"),
    Signature::Exact(b"OTTO", "font/otf"),
    Signature::Exact(b"ttcf", "font/collection"),
    Signature::Exact(b"wOFF", "font/woff"),
    Signature::Exact(b"wOF2", "font/woff2"),
    // archives
    Signature::Exact(b"\x1F\x8B\x08", "application/x-gzip"),
    Signature::Exact(b"PK\x03\x04", "application/zip"),
    Signature::Exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    Signature::Exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    Signature::Exact(b"\x00\x61\x73\x6D", "application/wasm"),
    Signature::Text,
];

/// Returns the MIME type inferred from the first bytes of `data`.
#[must_use]
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data.iter().position(|b| !is_ws(*b)).unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find_map(|sig| sig.matches(data, first_non_ws))
        .unwrap_or(OCTET_STREAM)
}

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Self::Exact(pattern, content_type) => {
                data.starts_with(pattern).then_some(*content_type)
            }
            Self::Masked {
                mask,
                pattern,
                skip_ws,
                content_type,
            } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                if data.len() < pattern.len() {
                    return None;
                }
                data.iter()
                    .zip(mask.iter().zip(pattern.iter()))
                    .all(|(d, (m, p))| d & m == *p)
                    .then_some(*content_type)
            }
            Self::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                let tag_matches = tag.iter().zip(data).all(|(t, d)| {
                    if t.is_ascii_uppercase() {
                        d & 0xDF == *t
                    } else {
                        d == t
                    }
                });
                // the tag must be terminated, "<BR" must not match "<BRIEF"
                (tag_matches && is_tag_terminator(data[tag.len()])).then_some(TEXT_HTML_UTF8)
            }
            Self::Mp4 => is_mp4(data).then_some("video/mp4"),
            Self::Text => {
                let binary = data[first_non_ws..].iter().any(|b| is_binary(*b));
                (!binary).then_some(TEXT_PLAIN_UTF8)
            }
        }
    }
}

fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    // major brand at 8, minor version at 12, compatible brands after
    (8..box_size)
        .step_by(4)
        .filter(|start| *start != 12)
        .any(|start| data.get(start..start + 3) == Some(b"mp4".as_slice()))
}

const fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

const fn is_tag_terminator(b: u8) -> bool {
    matches!(b, b' ' | b'>')
}

const fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_html_case_insensitively() {
        assert_eq!(detect_content_type(b"<html></html>"), TEXT_HTML_UTF8);
        assert_eq!(detect_content_type(b"  \n<!doctype html>"), TEXT_HTML_UTF8);
        assert_eq!(detect_content_type(b"<Body class=x>"), TEXT_HTML_UTF8);
    }

    #[test]
    fn html_tag_needs_terminator() {
        assert_eq!(detect_content_type(b"<brief>"), TEXT_PLAIN_UTF8);
        assert_eq!(detect_content_type(b"<p"), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn detects_xml_after_whitespace() {
        assert_eq!(
            detect_content_type(b"\n <?xml version=\"1.0\"?>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn detects_binary_signatures() {
        assert_eq!(detect_content_type(b"%PDF-1.7"), "application/pdf");
        assert_eq!(
            detect_content_type(b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00"),
            "image/png"
        );
        assert_eq!(detect_content_type(b"\xFF\xD8\xFF\xE0"), "image/jpeg");
        assert_eq!(detect_content_type(b"GIF89a...."), "image/gif");
        assert_eq!(detect_content_type(b"\x1F\x8B\x08\x00"), "application/x-gzip");
        assert_eq!(detect_content_type(b"RIFF\x10\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(detect_content_type(b"\x00asm\x01\x00\x00\x00"), "application/wasm");
    }

    #[test]
    fn detects_mp4_brand() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0, 0, 0x18]);
        data.extend_from_slice(b"ftypisom\x00\x00\x02\x00isommp41");
        assert_eq!(detect_content_type(&data), "video/mp4");
    }

    #[test]
    fn falls_back_to_text_or_octet_stream() {
        assert_eq!(detect_content_type(b"hello world"), TEXT_PLAIN_UTF8);
        assert_eq!(detect_content_type(b""), TEXT_PLAIN_UTF8);
        assert_eq!(detect_content_type(b"{\"a\":1}"), TEXT_PLAIN_UTF8);
        assert_eq!(detect_content_type(b"\x01\x02\x03"), OCTET_STREAM);
    }

    #[test]
    fn only_considers_leading_window() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x01);
        assert_eq!(detect_content_type(&data), TEXT_PLAIN_UTF8);
    }
}
