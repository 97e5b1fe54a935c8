use crate::config::ClipEntry;
use crate::events::{EventBus, TourEvent};
use anyhow::{bail, Result};
use smallvec::SmallVec;
use uuid::Uuid;

/// Number of alternate clip slots shown alongside the playing one.
pub const ALTERNATE_SLOTS: usize = 4;

/// The next `n` clip indices strictly after `current`, wrapping around,
/// never including `current`. Shorter than `n` when the list is small.
pub fn rotation(current: usize, len: usize, n: usize) -> SmallVec<[usize; ALTERNATE_SLOTS]> {
    let mut out = SmallVec::new();
    if len == 0 {
        return out;
    }
    let mut offset = 1;
    while out.len() < n && offset < len {
        out.push((current + offset) % len);
        offset += 1;
    }
    out
}

/// One run of the video player. A fresh id means a fresh playback (start
/// from the beginning), never a resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    pub id: Uuid,
    pub clip: usize,
}

/// Which clip (if any) is active for a zone, plus the rotation of
/// alternatives offered next to it. `None` selection means the 3D view.
pub struct ClipCarousel {
    zone: String,
    clips: Vec<ClipEntry>,
    selection: Option<usize>,
    session: Option<PlaybackSession>,
}

impl ClipCarousel {
    pub fn new(zone: impl Into<String>, clips: Vec<ClipEntry>) -> Self {
        Self { zone: zone.into(), clips, selection: None, session: None }
    }

    pub fn clips(&self) -> &[ClipEntry] {
        &self.clips
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn current_clip(&self) -> Option<&ClipEntry> {
        self.selection.and_then(|index| self.clips.get(index))
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Indices for the alternate-clip buttons. Empty while nothing plays.
    pub fn alternatives(&self) -> SmallVec<[usize; ALTERNATE_SLOTS]> {
        match self.selection {
            Some(current) => rotation(current, self.clips.len(), ALTERNATE_SLOTS),
            None => SmallVec::new(),
        }
    }

    /// Activates a clip. Every select starts a fresh playback session, also
    /// when the same index is picked again after a close.
    pub fn select(&mut self, index: usize, events: &mut EventBus) -> Result<&PlaybackSession> {
        if index >= self.clips.len() {
            bail!("Clip index {index} out of range for zone '{}' ({} clips)", self.zone, self.clips.len());
        }
        let session = PlaybackSession { id: Uuid::new_v4(), clip: index };
        events.push(TourEvent::ClipSelected {
            zone: self.zone.clone(),
            index,
            session: session.id.to_string(),
        });
        self.selection = Some(index);
        Ok(self.session.insert(session))
    }

    pub fn close(&mut self, events: &mut EventBus) {
        if self.selection.take().is_some() {
            self.session = None;
            events.push(TourEvent::ClipClosed { zone: self.zone.clone() });
        }
    }

    /// A clip that finishes unattended behaves like a close.
    pub fn advance_on_end(&mut self, events: &mut EventBus) {
        self.close(events);
    }
}
