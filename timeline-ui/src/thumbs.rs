//! Thumbnail URL construction.
//!
//! Clip thumbnails are served by the host's media server as
//! `{base}{file_id}/{frame}/?{nonce}` where `frame` is the first frame
//! of the clip's trimmed slice in *source* frames. The nonce defeats
//! aggressive webview caching; `bust` rotates a clip's nonce so a
//! regenerated thumbnail is actually refetched.

use cutline_project::Clip;
use rand::Rng;
use std::collections::HashMap;

/// Thumbnail URL source, configured by `setThumbAddress`.
#[derive(Clone, Debug, Default)]
pub struct ThumbnailSource {
    base_url: String,
    session_nonce: u32,
    busted: HashMap<String, u32>,
}

impl ThumbnailSource {
    pub fn new() -> Self {
        Self {
            base_url: String::new(),
            session_nonce: rand::thread_rng().gen(),
            busted: HashMap::new(),
        }
    }

    pub fn set_base(&mut self, url: impl Into<String>) {
        self.base_url = url.into();
    }

    pub fn has_base(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// First visible source frame of a clip: `floor(source_fps · start) + 1`.
    pub fn thumb_frame(clip: &Clip) -> i64 {
        let source_fps = clip.reader.fps.as_f64().max(0.0);
        (source_fps * clip.start).floor() as i64 + 1
    }

    /// Thumbnail URL for a clip, or `None` before `setThumbAddress`.
    pub fn url_for(&self, clip: &Clip) -> Option<String> {
        if self.base_url.is_empty() || clip.file_id.is_empty() {
            return None;
        }
        let nonce = self
            .busted
            .get(&clip.id)
            .copied()
            .unwrap_or(self.session_nonce);
        Some(format!(
            "{}{}/{}/?{}",
            self.base_url,
            clip.file_id,
            Self::thumb_frame(clip),
            nonce
        ))
    }

    /// Force a reload of one clip's thumbnail via a fresh nonce.
    pub fn bust(&mut self, clip_id: &str) {
        self.busted
            .insert(clip_id.to_string(), rand::thread_rng().gen());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_common::Rational;

    fn make_clip() -> Clip {
        let mut clip = Clip {
            id: "c1".into(),
            file_id: "F42".into(),
            start: 1.5,
            end: 4.0,
            ..Clip::default()
        };
        clip.reader.fps = Rational::FPS_24;
        clip
    }

    #[test]
    fn frame_is_floor_of_source_start() {
        let clip = make_clip();
        assert_eq!(ThumbnailSource::thumb_frame(&clip), 37); // floor(24*1.5)+1
    }

    #[test]
    fn url_includes_base_file_frame_and_nonce() {
        let mut thumbs = ThumbnailSource::new();
        assert!(thumbs.url_for(&make_clip()).is_none(), "no base url yet");

        thumbs.set_base("http://127.0.0.1:8081/thumbnails/");
        let url = thumbs.url_for(&make_clip()).unwrap();
        assert!(url.starts_with("http://127.0.0.1:8081/thumbnails/F42/37/?"));
    }

    #[test]
    fn bust_rotates_the_nonce() {
        let mut thumbs = ThumbnailSource::new();
        thumbs.set_base("http://localhost/");
        let clip = make_clip();
        let before = thumbs.url_for(&clip).unwrap();
        thumbs.bust(&clip.id);
        let after = thumbs.url_for(&clip).unwrap();
        assert_ne!(before, after);
        // Stable until busted again.
        assert_eq!(after, thumbs.url_for(&clip).unwrap());
    }
}
