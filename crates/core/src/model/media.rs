use serde::{Deserialize, Serialize};

/// Kind tag stored alongside every media entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    File,
    Youtube,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::File => "file",
            MediaKind::Youtube => "youtube",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "file" => Some(MediaKind::File),
            "youtube" => Some(MediaKind::Youtube),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl MediaMetadata {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A resolved media entry. Pending uploads never make it into a collection;
/// by the time a `Media` exists its `url` points at something renderable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub metadata: MediaMetadata,
}

impl Media {
    pub fn is_file(&self) -> bool {
        self.kind == MediaKind::File
    }
}

/// Ordered media of a single sub-item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaCollection(Vec<Media>);

impl MediaCollection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Media> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Media> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Media] {
        &self.0
    }

    pub fn push(&mut self, media: Media) {
        self.0.push(media);
    }

    /// Remove the entry at `index`, keeping the relative order of the rest.
    pub fn remove(&mut self, index: usize) -> Option<Media> {
        if index < self.0.len() {
            Some(self.0.remove(index))
        } else {
            None
        }
    }

    /// URLs of entries backed by an uploaded blob.
    pub fn file_urls(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|m| m.is_file()).map(|m| m.url.as_str())
    }
}

impl From<Vec<Media>> for MediaCollection {
    fn from(items: Vec<Media>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a MediaCollection {
    type Item = &'a Media;
    type IntoIter = std::slice::Iter<'a, Media>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Flat column layout of a media collection as stored in `sub_items`.
///
/// `media_urls` and `media_types` are the source of truth for URL and kind;
/// `media_items` carries the richer metadata and may be missing on rows
/// written before it existed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaColumns {
    pub media_urls: Vec<String>,
    pub media_types: Vec<String>,
    pub media_items: Option<Vec<Media>>,
}

impl From<&MediaCollection> for MediaColumns {
    fn from(collection: &MediaCollection) -> Self {
        Self {
            media_urls: collection.iter().map(|m| m.url.clone()).collect(),
            media_types: collection
                .iter()
                .map(|m| m.kind.as_str().to_string())
                .collect(),
            media_items: Some(collection.as_slice().to_vec()),
        }
    }
}

impl MediaColumns {
    /// Rebuild an aligned collection from possibly inconsistent columns.
    pub fn into_collection(self) -> MediaCollection {
        let items = self
            .media_items
            .map(|items| items.into_iter().map(|m| Some(m.into())).collect())
            .unwrap_or_default();
        reconcile(self.media_urls, self.media_types, items)
    }
}

/// One `media_items` entry as read back from the database.
///
/// Rows written by older clients may omit the url or carry kind tags outside
/// [`MediaKind`], so only the url and the metadata are read, and neither is
/// required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoredMediaItem {
    pub url: Option<String>,
    pub metadata: Option<MediaMetadata>,
}

impl From<Media> for StoredMediaItem {
    fn from(media: Media) -> Self {
        Self {
            url: Some(media.url),
            metadata: Some(media.metadata),
        }
    }
}

/// Decode a raw `media_items` value entry by entry. Entries that do not
/// decode keep their index as `None`; a value that is not an array yields no
/// entries.
pub fn stored_media_items(raw: serde_json::Value) -> Vec<Option<StoredMediaItem>> {
    match raw {
        serde_json::Value::Array(entries) => entries
            .into_iter()
            .map(|entry| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!(error = %err, "unreadable media item, rebuilding from columns");
                    None
                }
            })
            .collect(),
        serde_json::Value::Null => Vec::new(),
        other => {
            tracing::warn!(kind = json_kind(&other), "media_items is not an array, ignoring it");
            Vec::new()
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Per-index reconciliation: the url and type columns decide each entry, and
/// `items[i]` only contributes metadata when its url equals `media_urls[i]`.
pub fn reconcile(
    media_urls: Vec<String>,
    media_types: Vec<String>,
    items: Vec<Option<StoredMediaItem>>,
) -> MediaCollection {
    if media_urls.len() != media_types.len() {
        tracing::warn!(
            urls = media_urls.len(),
            types = media_types.len(),
            "media columns out of alignment, truncating to the shorter one"
        );
    }

    let mut items = items.into_iter();
    let entries = media_urls
        .into_iter()
        .zip(media_types)
        .map(|(url, tag)| {
            let kind = MediaKind::parse(&tag).unwrap_or_else(|| {
                tracing::warn!(%tag, "unknown media type tag, treating as file");
                MediaKind::File
            });
            let metadata = match items.next().flatten() {
                Some(StoredMediaItem {
                    url: Some(item_url),
                    metadata: Some(metadata),
                }) if item_url == url => metadata,
                _ => MediaMetadata::titled(fallback_title(&url)),
            };
            Media {
                kind,
                url,
                metadata,
            }
        })
        .collect();

    MediaCollection(entries)
}

fn fallback_title(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn youtube(id: &str) -> Media {
        Media {
            kind: MediaKind::Youtube,
            url: format!("https://youtu.be/{id}"),
            metadata: MediaMetadata::titled(id),
        }
    }

    fn file(name: &str) -> Media {
        Media {
            kind: MediaKind::File,
            url: format!("https://cdn.test/media/{name}"),
            metadata: MediaMetadata::titled(name),
        }
    }

    #[test]
    fn columns_project_every_entry() {
        let collection = MediaCollection::from(vec![file("a.png"), youtube("dQw4w9WgXcQ")]);
        let columns = MediaColumns::from(&collection);

        assert_eq!(
            columns.media_urls,
            vec!["https://cdn.test/media/a.png", "https://youtu.be/dQw4w9WgXcQ"]
        );
        assert_eq!(columns.media_types, vec!["file", "youtube"]);
        assert_eq!(columns.media_items.as_deref(), Some(collection.as_slice()));
        assert_eq!(columns.into_collection(), collection);
    }

    #[test]
    fn legacy_rows_without_items_are_rebuilt() {
        let columns = MediaColumns {
            media_urls: vec!["https://cdn.test/media/p1/123.jpg".to_string()],
            media_types: vec!["file".to_string()],
            media_items: None,
        };

        let collection = columns.into_collection();
        assert_eq!(collection.len(), 1);
        let entry = collection.get(0).unwrap();
        assert_eq!(entry.kind, MediaKind::File);
        assert_eq!(entry.metadata.title, "123.jpg");
    }

    #[test]
    fn misaligned_columns_truncate_to_shorter() {
        let columns = MediaColumns {
            media_urls: vec!["https://a".into(), "https://b".into()],
            media_types: vec!["youtube".into()],
            media_items: None,
        };

        let collection = columns.into_collection();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(0).unwrap().kind, MediaKind::Youtube);
    }

    #[test]
    fn stale_item_metadata_is_not_attached_to_other_url() {
        let columns = MediaColumns {
            media_urls: vec!["https://cdn.test/media/new.png".into()],
            media_types: vec!["file".into()],
            media_items: Some(vec![file("old.png")]),
        };

        let collection = columns.into_collection();
        assert_eq!(collection.get(0).unwrap().metadata.title, "new.png");
    }

    #[test]
    fn unknown_type_tag_loads_as_file() {
        let columns = MediaColumns {
            media_urls: vec!["https://cdn.test/x".into()],
            media_types: vec!["vimeo".into()],
            media_items: None,
        };
        assert_eq!(
            columns.into_collection().get(0).unwrap().kind,
            MediaKind::File
        );
    }

    #[test]
    fn foreign_type_in_items_does_not_break_loading() {
        let raw = serde_json::json!([
            {"type": "image", "url": "https://cdn.test/media/a.png", "metadata": {"title": "Poster"}},
            {"type": "file", "metadata": {"title": "No url"}},
            {"type": "youtube", "url": "https://youtu.be/dQw4w9WgXcQ", "metadata": {"title": "Talk"}},
        ]);
        let items = stored_media_items(raw);
        assert_eq!(items.len(), 3);

        let collection = reconcile(
            vec![
                "https://cdn.test/media/a.png".into(),
                "https://cdn.test/media/b.jpg".into(),
                "https://youtu.be/dQw4w9WgXcQ".into(),
            ],
            vec!["image".into(), "file".into(), "youtube".into()],
            items,
        );

        assert_eq!(collection.len(), 3);
        let poster = collection.get(0).unwrap();
        assert_eq!(poster.kind, MediaKind::File);
        assert_eq!(poster.metadata.title, "Poster");
        assert_eq!(collection.get(1).unwrap().metadata.title, "b.jpg");
        assert_eq!(collection.get(2).unwrap().metadata.title, "Talk");
    }

    #[test]
    fn undecodable_item_keeps_its_index() {
        let raw = serde_json::json!([
            "not an object",
            {"url": "https://cdn.test/media/b.png", "metadata": {"title": "Second"}},
        ]);
        let items = stored_media_items(raw);
        assert_eq!(items[0], None);

        let collection = reconcile(
            vec!["https://cdn.test/media/a.png".into(), "https://cdn.test/media/b.png".into()],
            vec!["file".into(), "file".into()],
            items,
        );
        assert_eq!(collection.get(0).unwrap().metadata.title, "a.png");
        assert_eq!(collection.get(1).unwrap().metadata.title, "Second");
    }

    #[test]
    fn non_array_items_are_ignored() {
        assert!(stored_media_items(serde_json::json!({"url": "x"})).is_empty());
        assert!(stored_media_items(serde_json::Value::Null).is_empty());
    }

    #[test]
    fn media_serializes_kind_as_type() {
        let value = serde_json::to_value(youtube("dQw4w9WgXcQ")).unwrap();
        assert_eq!(value["type"], "youtube");
        assert_eq!(value["metadata"]["title"], "dQw4w9WgXcQ");
        assert!(value["metadata"].get("altText").is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(bool),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Add),
            (0usize..8).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn projections_stay_aligned(ops in prop::collection::vec(op(), 0..40)) {
            let mut collection = MediaCollection::new();
            for (n, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Add(true) => collection.push(file(&format!("{n}.png"))),
                    Op::Add(false) => collection.push(youtube(&format!("{n:011}"))),
                    Op::Remove(index) => {
                        collection.remove(index);
                    }
                }
                let columns = MediaColumns::from(&collection);
                let items = columns.media_items.as_ref().unwrap();
                prop_assert_eq!(columns.media_urls.len(), columns.media_types.len());
                prop_assert_eq!(items.len(), columns.media_urls.len());
                for (i, item) in items.iter().enumerate() {
                    prop_assert_eq!(item.kind.as_str(), columns.media_types[i].as_str());
                    prop_assert_eq!(&item.url, &columns.media_urls[i]);
                }
            }
        }

        #[test]
        fn push_then_remove_last_restores_content(count in 0usize..6, as_file in any::<bool>()) {
            let mut collection = MediaCollection::from(
                (0..count).map(|i| file(&format!("{i}.jpg"))).collect::<Vec<_>>(),
            );
            let before = collection.clone();
            collection.push(if as_file { file("extra.webp") } else { youtube("dQw4w9WgXcQ") });
            collection.remove(collection.len() - 1);
            prop_assert_eq!(collection, before);
        }
    }
}
