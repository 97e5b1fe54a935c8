use crate::config::{TourConfig, TourConfigOverrides};
use crate::events::EventBus;
use crate::loader::LoadState;
use crate::time::AnimationClock;
use crate::zone::ZoneScreen;
use anyhow::{anyhow, Result};
use std::thread;
use std::time::Duration;

const DEFAULT_MAX_FRAMES: u32 = 600;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Headless smoke run: enter one zone, tick the orchestration loop until its
/// scene settles (or the frame budget runs out), then tear it down. Useful
/// for probing a manifest's assets without a window.
pub fn run(config: TourConfig, overrides: TourConfigOverrides) -> Result<()> {
    let zone_name = overrides.zone.as_deref().unwrap_or("zone1");
    let zone_config = config
        .zone(zone_name)
        .ok_or_else(|| anyhow!("Zone '{zone_name}' not present in the manifest"))?
        .clone();
    let max_frames = overrides.max_frames.unwrap_or(DEFAULT_MAX_FRAMES);

    let mut events = EventBus::default();
    let mut clock = AnimationClock::new();
    let mut screen = ZoneScreen::new(zone_config);
    screen.enter(&mut events);

    let mut settled = None;
    for _ in 0..max_frames {
        clock.tick();
        let frame = screen.on_frame(clock.elapsed_seconds(), &mut events);
        events.drain();
        match frame.load_state {
            Some(state @ (LoadState::Ready | LoadState::Failed(_))) => {
                settled = Some(state);
                break;
            }
            _ => thread::sleep(FRAME_INTERVAL),
        }
    }

    screen.leave(&mut events);
    events.drain();

    match settled {
        Some(LoadState::Ready) => {
            eprintln!("[tour] zone '{zone_name}' scene loaded and released cleanly");
            Ok(())
        }
        Some(LoadState::Failed(message)) => {
            // Reported, not fatal: the boundary already degraded to fallback.
            eprintln!("[tour] zone '{zone_name}' degraded to fallback: {message}");
            Ok(())
        }
        _ => Err(anyhow!("Zone '{zone_name}' scene did not settle within {max_frames} frames")),
    }
}
