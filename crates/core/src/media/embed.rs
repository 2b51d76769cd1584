//! Media validation and embed resolution.
//!
//! Everything here is pure: no storage or network access.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use super::input::{MediaInput, ValidatedMedia, ValidationError};
use crate::model::{Media, MediaKind, MediaMetadata};

/// 5 MiB.
pub const DEFAULT_MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp", "mp4", "webm"];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm"];

fn youtube_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:youtu\.be/|youtube\.com(?:/embed/|/v/|/watch\?v=|/watch\?.+&v=))([A-Za-z0-9_-]{11})",
        )
        .expect("youtube id pattern is valid")
    })
}

/// The 11-character video id of a YouTube URL, if it has one of the known shapes.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    youtube_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
}

/// Validates media descriptors against the upload policy.
#[derive(Debug, Clone, Copy)]
pub struct EmbedResolver {
    max_file_bytes: usize,
}

impl Default for EmbedResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl EmbedResolver {
    pub fn new(max_file_bytes: usize) -> Self {
        Self { max_file_bytes }
    }

    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    pub fn validate(&self, input: MediaInput) -> Result<ValidatedMedia, ValidationError> {
        match input.kind {
            MediaKind::File => self.validate_file(input),
            MediaKind::Youtube => validate_youtube(input),
        }
    }

    fn validate_file(&self, input: MediaInput) -> Result<ValidatedMedia, ValidationError> {
        let upload = input.file.ok_or(ValidationError::MissingFile)?;
        if upload.size() > self.max_file_bytes {
            return Err(ValidationError::FileTooLarge {
                size: upload.size(),
                max: self.max_file_bytes,
            });
        }
        match upload.extension() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => return Err(ValidationError::UnsupportedFileType(upload.file_name)),
        }

        let title = non_empty_title(&input.metadata.title)?;
        let alt_text = match trimmed(input.metadata.alt_text) {
            Some(alt) => alt,
            None => title.clone(),
        };

        Ok(ValidatedMedia::PendingFile {
            upload,
            metadata: MediaMetadata {
                title,
                description: trimmed(input.metadata.description),
                thumbnail: None,
                alt_text: Some(alt_text),
            },
        })
    }
}

fn validate_youtube(input: MediaInput) -> Result<ValidatedMedia, ValidationError> {
    let raw = input.url.unwrap_or_default();
    let raw = raw.trim();
    if Url::parse(raw).is_err() {
        return Err(ValidationError::InvalidUrl(raw.to_string()));
    }
    let video_id = youtube_video_id(raw).ok_or_else(|| ValidationError::InvalidUrl(raw.to_string()))?;
    let title = non_empty_title(&input.metadata.title)?;

    Ok(ValidatedMedia::Ready(Media {
        kind: MediaKind::Youtube,
        url: raw.to_string(),
        metadata: MediaMetadata {
            title,
            description: trimmed(input.metadata.description),
            thumbnail: Some(youtube_thumbnail_url(video_id)),
            alt_text: None,
        },
    }))
}

fn non_empty_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        Err(ValidationError::EmptyTitle)
    } else {
        Ok(title.to_string())
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Translate a media URL into something a frame can load.
///
/// Dispatches on the host only. Identifiers are not validated: a URL without
/// one yields an embed URL with an empty id segment. Input that does not
/// parse as a URL comes back unchanged.
pub fn to_embed_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let host = url.host_str().unwrap_or_default();

    if host.contains("youtube.com") || host.contains("youtu.be") {
        let id = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| last_segment(&url).to_string());
        return format!("https://www.youtube.com/embed/{id}");
    }
    if host.contains("instagram.com") {
        let post_id = segment_after(&url, "p").unwrap_or_default();
        return format!("https://www.instagram.com/p/{post_id}/embed");
    }
    if host.contains("tiktok.com") {
        let video_id = segment_after(&url, "video").unwrap_or_default();
        return format!("https://www.tiktok.com/embed/{video_id}");
    }
    raw.to_string()
}

fn last_segment(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
}

fn segment_after<'a>(url: &'a Url, marker: &str) -> Option<&'a str> {
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == marker)?;
    segments.next()
}

/// How a media entry is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EmbedTarget {
    Frame { src: String },
    Video { src: String },
    Image { src: String, alt: String },
}

pub fn resolve(media: &Media) -> EmbedTarget {
    match media.kind {
        MediaKind::Youtube => EmbedTarget::Frame {
            src: to_embed_url(&media.url),
        },
        MediaKind::File if is_video_url(&media.url) => EmbedTarget::Video {
            src: media.url.clone(),
        },
        MediaKind::File => EmbedTarget::Image {
            src: media.url.clone(),
            alt: media
                .metadata
                .alt_text
                .clone()
                .filter(|alt| !alt.is_empty())
                .unwrap_or_else(|| media.metadata.title.clone()),
        },
    }
}

/// Image shown in carousels: the YouTube thumbnail when known, else the media itself.
pub fn thumbnail_src(media: &Media) -> &str {
    match (&media.kind, &media.metadata.thumbnail) {
        (MediaKind::Youtube, Some(thumbnail)) => thumbnail.as_str(),
        _ => media.url.as_str(),
    }
}

fn is_video_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    crate::storage::extension_of(path)
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}
