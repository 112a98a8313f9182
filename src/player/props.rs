//! Player props - The declarative player surface and its diff.

use bitflags::bitflags;

use crate::config::EngineOptions;
use crate::events::PlayerCallbacks;
use crate::types::{AudioSource, MediaSource, Peaks};

// =============================================================================
// Props
// =============================================================================

/// Declarative player state, applied as a whole on every update.
///
/// # Example
///
/// ```ignore
/// let props = PlayerProps {
///     audio_file: Some("take-3.wav".into()),
///     playing: true,
///     volume: Some(0.8),
///     callbacks: PlayerCallbacks::default()
///         .on_pos_change(|change| println!("at {:.2}s", change.seconds)),
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct PlayerProps {
    /// Drives play/pause.
    pub playing: bool,
    /// Target position in seconds.
    pub pos: f64,
    pub audio_file: Option<AudioSource>,
    /// Media element source. Forces the media-element backend at mount.
    pub media_elt: Option<MediaSource>,
    pub audio_peaks: Option<Peaks>,
    pub volume: Option<f64>,
    pub zoom: Option<f64>,
    /// Redraw on surface resize (default: true).
    pub responsive: bool,
    pub options: EngineOptions,
    pub callbacks: PlayerCallbacks,
}

impl Default for PlayerProps {
    fn default() -> Self {
        Self {
            playing: false,
            pos: 0.0,
            audio_file: None,
            media_elt: None,
            audio_peaks: None,
            volume: None,
            zoom: None,
            responsive: true,
            options: EngineOptions::default(),
            callbacks: PlayerCallbacks::default(),
        }
    }
}

// =============================================================================
// Diff
// =============================================================================

bitflags! {
    /// Fields that differ between two prop snapshots.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PropChanges: u16 {
        const SOURCE        = 1 << 0;
        const MEDIA_ELEMENT = 1 << 1;
        const PEAKS         = 1 << 2;
        const POSITION      = 1 << 3;
        const PLAYING       = 1 << 4;
        const VOLUME        = 1 << 5;
        const ZOOM          = 1 << 6;
        const AUDIO_RATE    = 1 << 7;
        const RESPONSIVE    = 1 << 8;
    }
}

/// Compare two snapshots field by field. Callbacks are never diffed.
pub fn diff_props(prev: &PlayerProps, next: &PlayerProps) -> PropChanges {
    let mut changes = PropChanges::empty();

    changes.set(PropChanges::SOURCE, prev.audio_file != next.audio_file);
    changes.set(PropChanges::MEDIA_ELEMENT, prev.media_elt != next.media_elt);
    changes.set(PropChanges::PEAKS, prev.audio_peaks != next.audio_peaks);
    changes.set(PropChanges::POSITION, prev.pos != next.pos);
    changes.set(PropChanges::PLAYING, prev.playing != next.playing);
    changes.set(PropChanges::VOLUME, prev.volume != next.volume);
    changes.set(PropChanges::ZOOM, prev.zoom != next.zoom);
    changes.set(PropChanges::AUDIO_RATE, prev.options.audio_rate != next.options.audio_rate);
    changes.set(PropChanges::RESPONSIVE, prev.responsive != next.responsive);

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Blob;

    #[test]
    fn test_identical_props_have_no_changes() {
        let props = PlayerProps {
            audio_file: Some("x.mp3".into()),
            volume: Some(0.5),
            ..Default::default()
        };
        assert!(diff_props(&props, &props.clone()).is_empty());
    }

    #[test]
    fn test_each_field_maps_to_its_flag() {
        let prev = PlayerProps::default();
        let next = PlayerProps {
            audio_file: Some("y.mp3".into()),
            pos: 30.0,
            zoom: Some(2.0),
            responsive: false,
            options: EngineOptions {
                audio_rate: Some(1.5),
                ..Default::default()
            },
            ..Default::default()
        };

        let changes = diff_props(&prev, &next);
        assert_eq!(
            changes,
            PropChanges::SOURCE
                | PropChanges::POSITION
                | PropChanges::ZOOM
                | PropChanges::RESPONSIVE
                | PropChanges::AUDIO_RATE
        );
    }

    #[test]
    fn test_other_options_are_not_diffed() {
        let prev = PlayerProps::default();
        let next = PlayerProps {
            options: EngineOptions {
                height: Some(200),
                wave_color: Some("violet".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(diff_props(&prev, &next).is_empty());
    }

    #[test]
    fn test_blob_source_change_is_by_reference() {
        let blob = Blob::new(vec![1u8, 2, 3], None);
        let prev = PlayerProps {
            audio_file: Some(blob.clone().into()),
            ..Default::default()
        };
        let same = PlayerProps {
            audio_file: Some(blob.into()),
            ..Default::default()
        };
        let copy = PlayerProps {
            audio_file: Some(Blob::new(vec![1u8, 2, 3], None).into()),
            ..Default::default()
        };

        assert!(!diff_props(&prev, &same).contains(PropChanges::SOURCE));
        assert!(diff_props(&prev, &copy).contains(PropChanges::SOURCE));
    }
}
