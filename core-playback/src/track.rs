//! Track metadata as it enters a queue.

use bridge_traits::TrackDescriptor;
use serde::{Deserialize, Serialize};

/// A fully resolved, immutable track. Identity is `source_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub source_url: String,
    pub title: String,
    pub byline: String,
    pub cover_url: Option<String>,
}

impl Track {
    /// Build a track with every field given explicitly.
    pub fn new(
        source_url: impl Into<String>,
        title: impl Into<String>,
        byline: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            title: title.into(),
            byline: byline.into(),
            cover_url: None,
        }
    }

    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    /// Resolve a partial descriptor using context defaults.
    ///
    /// Returns `None` when the descriptor has no source URL.
    pub fn resolve(descriptor: &TrackDescriptor, defaults: &TrackDefaults) -> Option<Self> {
        let source_url = descriptor.source_url.trim();
        if source_url.is_empty() {
            return None;
        }

        let title = non_empty(descriptor.title.as_deref())
            .map(str::to_string)
            .or_else(|| title_from_url(source_url))
            .unwrap_or_else(|| defaults.title.clone());

        let byline = non_empty(descriptor.byline.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| defaults.byline.clone());

        let cover_url = non_empty(descriptor.cover_url.as_deref())
            .map(str::to_string)
            .or_else(|| defaults.cover_url.clone());

        Some(Self {
            source_url: source_url.to_string(),
            title,
            byline,
            cover_url,
        })
    }
}

/// Fallback metadata taken from the context a surface is rendered in
/// (the post author, the playlist name, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDefaults {
    pub title: String,
    pub byline: String,
    pub cover_url: Option<String>,
}

impl Default for TrackDefaults {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            byline: String::new(),
            cover_url: None,
        }
    }
}

impl TrackDefaults {
    pub fn with_byline(mut self, byline: impl Into<String>) -> Self {
        self.byline = byline.into();
        self
    }

    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// File stem of the last path segment, with `_`/`-` turned into spaces.
fn title_from_url(url: &str) -> Option<String> {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);

    // Skip scheme and authority; a bare host has no usable file name
    let path = match path.find("://") {
        Some(scheme_end) => {
            let rest = &path[scheme_end + 3..];
            rest.find('/').map_or("", |slash| &rest[slash..])
        }
        None => path,
    };

    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    let stem = match segment.rfind('.') {
        Some(dot) if dot > 0 => &segment[..dot],
        _ => segment,
    };

    let title: String = stem
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let title = title.trim();

    (!title.is_empty()).then(|| title.to_string())
}
