use base64::Engine;
use log::trace;

use quickpack_core::AssetLimits;

use crate::hasher::{content_hash, render_template};

/// Asset categories, in declaration order. `svg` appears in both the image
/// and font tables and `ogg` in both audio and video; the first matching
/// category wins, mirroring how ordered loader rules shadow each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Image,
    Font,
    Audio,
    Video,
}

const CATEGORY_TABLE: &[(AssetCategory, &[&str])] = &[
    (AssetCategory::Image, &["png", "jpg", "jpeg", "gif", "svg"]),
    (AssetCategory::Font, &["woff", "woff2", "svg", "eot", "ttf"]),
    (AssetCategory::Audio, &["wav", "mp3", "ogg"]),
    (AssetCategory::Video, &["ogg", "mpeg4", "webm"]),
];

impl AssetCategory {
    /// First category whose extension table contains `ext`, or `None` for
    /// unmatched (including empty) extensions.
    pub fn of(ext: &str) -> Option<AssetCategory> {
        if ext.is_empty() {
            return None;
        }
        CATEGORY_TABLE
            .iter()
            .find(|(_, exts)| exts.contains(&ext))
            .map(|(category, _)| *category)
    }

    /// Emission template for this category's output files.
    pub fn template(self) -> &'static str {
        match self {
            AssetCategory::Image => "images/[name].[hash:8].[ext]",
            AssetCategory::Font => "fonts/[name].[ext]?[hash:8]",
            AssetCategory::Audio => "audios/[name].[ext]?[hash:8]",
            AssetCategory::Video => "videos/[name].[ext]?[hash:8]",
        }
    }

    fn inline_limit(self, limits: &AssetLimits) -> u64 {
        match self {
            AssetCategory::Image => limits.images,
            AssetCategory::Font => limits.fonts,
            AssetCategory::Audio => limits.audios,
            AssetCategory::Video => limits.videos,
        }
    }
}

/// Template applied to assets no category claims; they are emitted, never
/// inlined.
const FALLBACK_TEMPLATE: &str = "static/[name].[hash:8].[ext]";

/// The routing decision for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetDisposition {
    /// Encoded into the referencing bundle as a data URI
    Inline { data_uri: String },
    /// Written to `file` under the output directory and referenced as
    /// `public` (which may carry a cache-busting query suffix)
    Emit { file: String, public: String },
}

/// Decide inline-vs-emit for one asset. Assets strictly below their
/// category threshold are inlined; zero-length and unmatched-extension
/// assets fall through to the default emission rule rather than failing
/// the build.
pub fn classify(name: &str, ext: &str, bytes: &[u8], limits: &AssetLimits) -> AssetDisposition {
    let category = AssetCategory::of(ext);

    if let Some(category) = category
        && !bytes.is_empty()
        && (bytes.len() as u64) < category.inline_limit(limits)
    {
        trace!("Inlining {}.{} ({} bytes) as {:?}", name, ext, bytes.len(), category);
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        return AssetDisposition::Inline {
            data_uri: format!("data:{};base64,{}", mime_for(ext), encoded),
        };
    }

    let template = match category {
        Some(category) => category.template(),
        None => {
            trace!("No category for '{}' extension '{}', using fallback emission", name, ext);
            FALLBACK_TEMPLATE
        }
    };
    let hash = content_hash(bytes);
    let rendered = render_template(template, name, &hash, ext);
    // A `?` marks the cache-busting boundary: the part before it is the
    // file on disk, the whole string is the public reference
    let (file_part, query) = match rendered.split_once('?') {
        Some((file, query)) => (file, Some(query)),
        None => (rendered.as_str(), None),
    };
    // Extensionless fallback names would otherwise end with a dangling dot
    let file = file_part.trim_end_matches('.').to_string();
    let public = match query {
        Some(query) => format!("{}?{}", file, query),
        None => file.clone(),
    };
    AssetDisposition::Emit { file, public }
}

fn mime_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "webm" => "video/webm",
        "mpeg4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> AssetLimits {
        AssetLimits::default()
    }

    #[test]
    fn test_small_image_is_inlined() {
        let bytes = vec![0u8; 5 * 1024]; // 5 KB, below the 10 KB image limit
        let disposition = classify("logo", "png", &bytes, &limits());
        match disposition {
            AssetDisposition::Inline { data_uri } => {
                assert!(data_uri.starts_with("data:image/png;base64,"));
            }
            other => panic!("expected inline, got {:?}", other),
        }
    }

    #[test]
    fn test_large_image_is_emitted_hashed() {
        let bytes = vec![1u8; 20 * 1024];
        let disposition = classify("logo", "png", &bytes, &limits());
        match disposition {
            AssetDisposition::Emit { file, public } => {
                let hash8 = &content_hash(&bytes)[..8];
                assert_eq!(file, format!("images/logo.{}.png", hash8));
                assert_eq!(public, file);
            }
            other => panic!("expected emit, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_boundary_is_emitted() {
        // Exactly at the limit: emitted, not inlined
        let bytes = vec![0u8; 10 * 1024];
        assert!(matches!(
            classify("logo", "png", &bytes, &limits()),
            AssetDisposition::Emit { .. }
        ));
    }

    #[test]
    fn test_font_uses_query_suffix() {
        let bytes = vec![2u8; 9000]; // above the 8192 font limit
        match classify("icons", "woff2", &bytes, &limits()) {
            AssetDisposition::Emit { file, public } => {
                assert_eq!(file, "fonts/icons.woff2");
                let hash8 = &content_hash(&bytes)[..8];
                assert_eq!(public, format!("fonts/icons.woff2?{}", hash8));
            }
            other => panic!("expected emit, got {:?}", other),
        }
    }

    #[test]
    fn test_ogg_routes_to_audio() {
        // `ogg` appears in both the audio and video tables; declaration
        // order sends it to audio
        assert_eq!(AssetCategory::of("ogg"), Some(AssetCategory::Audio));
        let bytes = vec![3u8; 9000];
        match classify("clip", "ogg", &bytes, &limits()) {
            AssetDisposition::Emit { file, .. } => assert!(file.starts_with("audios/")),
            other => panic!("expected emit, got {:?}", other),
        }
    }

    #[test]
    fn test_svg_routes_to_images() {
        assert_eq!(AssetCategory::of("svg"), Some(AssetCategory::Image));
    }

    #[test]
    fn test_unmatched_extension_falls_back() {
        let bytes = b"%PDF-1.4".to_vec();
        match classify("manual", "pdf", &bytes, &limits()) {
            AssetDisposition::Emit { file, .. } => {
                assert!(file.starts_with("static/manual."));
                assert!(file.ends_with(".pdf"));
            }
            other => panic!("expected emit, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_length_asset_is_emitted_not_inlined() {
        let disposition = classify("empty", "png", &[], &limits());
        assert!(matches!(disposition, AssetDisposition::Emit { .. }));
    }

    #[test]
    fn test_determinism() {
        let bytes = vec![7u8; 20 * 1024];
        let a = classify("logo", "png", &bytes, &limits());
        let b = classify("logo", "png", &bytes, &limits());
        assert_eq!(a, b);
    }
}
