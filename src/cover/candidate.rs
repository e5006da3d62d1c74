use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::CoverSettings;
use crate::tools::ImageProber;

use super::tokens::{FRONT_KEYWORDS, album_overlap, front_keyword_rank, name_tokens, non_front_hits};

/// Where an image sits relative to the track it is considered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Extracted from the track's own embedded artwork.
    Embedded,
    /// The track's own folder (or disc folder), recursively.
    Disc,
    /// The album root of a multi-disc layout, outside any disc folder.
    AlbumRoot,
    /// Another disc folder of the same album.
    OtherDisc,
}

impl Scope {
    /// Lower is closer. Embedded art and the track's own folder tie.
    pub fn rank(self) -> u8 {
        match self {
            Scope::Embedded | Scope::Disc => 0,
            Scope::AlbumRoot => 1,
            Scope::OtherDisc => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scope::Embedded => "embedded",
            Scope::Disc => "disc",
            Scope::AlbumRoot => "album",
            Scope::OtherDisc => "other-disc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
    /// Squarish, not flagged as back/booklet art, and named like a cover.
    Preferred,
    Fallback,
}

impl Bucket {
    pub fn number(self) -> u8 {
        match self {
            Bucket::Preferred => 1,
            Bucket::Fallback => 2,
        }
    }
}

/// An image file found by the collector, before it has been measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSource {
    pub path: PathBuf,
    pub scope: Scope,
}

impl CandidateSource {
    pub fn new(path: impl Into<PathBuf>, scope: Scope) -> Self {
        Self {
            path: path.into(),
            scope,
        }
    }
}

/// One measured and classified cover image.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverCandidate {
    pub path: PathBuf,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub area: u64,
    pub size_bytes: u64,
    pub scope: Scope,
    pub tokens: Vec<String>,
    /// Index into the front keyword list; lower is better.
    pub front_rank: Option<usize>,
    /// Non-front keywords in the name that the album name does not excuse.
    pub blocking: Vec<&'static str>,
    pub album_overlap: f64,
    pub squarish: bool,
    pub bucket: Bucket,
}

impl CoverCandidate {
    /// Classify an image of known dimensions and size.
    pub fn classify(
        source: CandidateSource,
        (width, height): (u32, u32),
        size_bytes: u64,
        album: &[String],
        settings: &CoverSettings,
    ) -> Self {
        let name = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = source
            .path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let tokens = name_tokens(&stem);
        let front_rank = front_keyword_rank(&stem);
        let blocking: Vec<&'static str> = non_front_hits(&tokens)
            .into_iter()
            .filter(|kw| !album.iter().any(|a| a == kw))
            .collect();
        let overlap = album_overlap(&tokens, album);

        let squarish = height > 0 && {
            let ratio = f64::from(width) / f64::from(height);
            ratio >= settings.aspect_min && ratio <= settings.aspect_max
        };

        let named_like_cover = front_rank.is_some() || overlap >= settings.album_match_ratio;
        let bucket = if squarish && blocking.is_empty() && named_like_cover {
            Bucket::Preferred
        } else {
            Bucket::Fallback
        };

        Self {
            path: source.path,
            name,
            width,
            height,
            area: u64::from(width) * u64::from(height),
            size_bytes,
            scope: source.scope,
            tokens,
            front_rank,
            blocking,
            album_overlap: overlap,
            squarish,
            bucket,
        }
    }

    /// Measure an image on disk and classify it. Unreadable images are kept
    /// with zero dimensions so they still show up in the listing.
    pub fn analyze(
        source: CandidateSource,
        album: &[String],
        prober: &dyn ImageProber,
        settings: &CoverSettings,
    ) -> Self {
        let dims = prober.dimensions(&source.path).unwrap_or((0, 0));
        let size = fs::metadata(&source.path).map(|m| m.len()).unwrap_or(0);
        let candidate = Self::classify(source, dims, size, album, settings);
        debug!(
            path = %candidate.path.display(),
            width = candidate.width,
            height = candidate.height,
            scope = candidate.scope.label(),
            bucket = candidate.bucket.number(),
            overlap = candidate.album_overlap,
            "cover candidate"
        );
        candidate
    }

    pub fn front_keyword(&self) -> Option<&'static str> {
        self.front_rank.and_then(|i| FRONT_KEYWORDS.get(i).copied())
    }

    pub fn is_embedded(&self) -> bool {
        self.scope == Scope::Embedded
    }

    /// Short human label: the file name, prefixed by its folder when it does
    /// not come from the track's own folder.
    pub fn label(&self) -> String {
        match self.scope {
            Scope::Embedded => "embedded".to_string(),
            Scope::Disc => self.name.clone(),
            Scope::AlbumRoot | Scope::OtherDisc => match parent_name(&self.path) {
                Some(parent) => format!("{parent}/{}", self.name),
                None => self.name.clone(),
            },
        }
    }

    /// One listing line, without the selection marker.
    pub fn describe(&self) -> String {
        let mut line = format!(
            "{} {}x{} {} b{}",
            self.label(),
            self.width,
            self.height,
            self.scope.label(),
            self.bucket.number()
        );
        if let Some(kw) = self.front_keyword() {
            line.push_str(" kw=");
            line.push_str(kw);
        }
        if self.album_overlap > 0.0 {
            line.push_str(&format!(" album={:.2}", self.album_overlap));
        }
        if !self.blocking.is_empty() {
            line.push_str(" not-front=");
            line.push_str(&self.blocking.join(","));
        }
        line
    }
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
}
