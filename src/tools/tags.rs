use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::FileType;
use lofty::prelude::*;
use lofty::tag::{ItemKey, Tag, TagItem, TagType};

use super::{TagEditor, ToolError, TrackGain};

/// Tag editing through `lofty` for every container it recognises.
pub struct LoftyTagEditor;

fn is_replay_gain(item: &TagItem) -> bool {
    matches!(
        item.key(),
        ItemKey::ReplayGainTrackGain
            | ItemKey::ReplayGainTrackPeak
            | ItemKey::ReplayGainAlbumGain
            | ItemKey::ReplayGainAlbumPeak
    )
}

impl LoftyTagEditor {
    /// Apply `edit` to every tag in the file, saving the ones it reports as changed.
    fn edit_tags(&self, path: &Path, mut edit: impl FnMut(&mut Tag) -> bool) -> Result<(), ToolError> {
        let mut tagged = lofty::read_from_path(path)?;
        let tag_types: Vec<TagType> = tagged.tags().iter().map(|t| t.tag_type()).collect();

        for tag_type in tag_types {
            if let Some(tag) = tagged.tag_mut(tag_type) {
                if edit(tag) {
                    tag.save_to_path(path, WriteOptions::default())?;
                }
            }
        }
        Ok(())
    }
}

impl TagEditor for LoftyTagEditor {
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(FileType::from_ext)
            .is_some()
    }

    fn strip_pictures(&self, path: &Path) -> Result<(), ToolError> {
        self.edit_tags(path, |tag| {
            let had_pictures = !tag.pictures().is_empty();
            while !tag.pictures().is_empty() {
                tag.remove_picture(0);
            }
            had_pictures
        })
    }

    fn strip_replay_gain(&self, path: &Path) -> Result<(), ToolError> {
        self.edit_tags(path, |tag| {
            let before = tag.item_count();
            tag.retain(|item| !is_replay_gain(item));
            tag.item_count() != before
        })
    }

    fn write_track_gain(&self, path: &Path, gain: &TrackGain) -> Result<(), ToolError> {
        let tagged = lofty::read_from_path(path)?;
        let tag_type = tagged.primary_tag_type();
        let mut tag = tagged
            .tag(tag_type)
            .cloned()
            .unwrap_or_else(|| Tag::new(tag_type));

        let written = tag.insert_text(ItemKey::ReplayGainTrackGain, gain.gain_text())
            && tag.insert_text(ItemKey::ReplayGainTrackPeak, gain.peak_text());
        if !written {
            return Err(ToolError::Unsupported(path.to_path_buf()));
        }
        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }
}
