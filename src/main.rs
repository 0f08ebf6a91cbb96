//! Scratch Reveal entry point
//!
//! The browser build is driven from `platform::web` (wasm start hook). The
//! native binary runs a headless reveal: it scripts a stroke over a card and
//! logs the timeline.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Scratch Reveal (native) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                scratch_reveal::Settings::from_json(&json).map_err(|e| e.to_string())
            }) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::error!("Failed to load settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => scratch_reveal::Settings::default(),
    };

    demo::run(&settings);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec2;
    use scratch_reveal::consts::FRAME_MS;
    use scratch_reveal::{
        CardGeometry, Environment, InputSource, MountProps, PointerInput,
        PrizeResult, RevealCard, ScratchPhase, Settings,
    };

    /// Zig-zag stroke across the card, one move every `step` pixels
    fn zigzag(geometry: CardGeometry, row_spacing: f32, step: f32) -> Vec<Vec2> {
        let mut points = Vec::new();
        let mut y = row_spacing / 2.0;
        let mut left_to_right = true;
        while y < geometry.height as f32 {
            let mut xs: Vec<f32> = (0..=(geometry.width as f32 / step) as u32)
                .map(|i| i as f32 * step)
                .collect();
            if !left_to_right {
                xs.reverse();
            }
            points.extend(xs.into_iter().map(|x| Vec2::new(x, y)));
            y += row_spacing;
            left_to_right = !left_to_right;
        }
        points
    }

    pub fn run(settings: &Settings) {
        let geometry = CardGeometry::new(300, 200);
        let revealed = Rc::new(Cell::new(None::<f64>));
        let clock = Rc::new(Cell::new(0.0f64));

        let observer = {
            let revealed = revealed.clone();
            let clock = clock.clone();
            move || revealed.set(Some(clock.get()))
        };
        let mut card = RevealCard::mount(
            MountProps {
                prize_result: Some(PrizeResult::won("Limited Edition Hoodie", 3)),
                geometry,
            },
            Environment {
                device_pixel_ratio: 2.0,
                viewport_width: 390.0,
                raster_supported: true,
                seed: 0x5C_4A_7C,
            },
            settings,
            Box::new(observer),
        );

        log::info!(
            "Card content: {:?}, brush radius {} raster px",
            card.content(),
            card.surface().brush_radius()
        );

        // One stroke move per frame until the fade takes over
        let mut stroke = zigzag(geometry, 30.0, 12.0).into_iter();
        card.handle_input(PointerInput::down(InputSource::Touch, 0.0, 0.0));
        let mut now = 0.0;
        let mut last_phase = card.progress().phase;
        let mut fade_started_at = None;

        while revealed.get().is_none() && now < 10_000.0 {
            now += FRAME_MS;
            clock.set(now);

            if let Some(p) = stroke.next() {
                card.handle_input(PointerInput::moved(InputSource::Touch, p.x, p.y));
            }
            card.frame(now);

            let progress = card.progress();
            if progress.phase != last_phase {
                log::info!(
                    "[{:>7.1} ms] {:?} -> {:?} (erased {:.1}%)",
                    now,
                    last_phase,
                    progress.phase,
                    progress.erased_fraction * 100.0
                );
                if progress.phase == ScratchPhase::Fading {
                    fade_started_at = Some(now);
                }
                last_phase = progress.phase;
            }
        }
        card.handle_input(PointerInput::up(InputSource::Touch));

        match revealed.get() {
            Some(at) => {
                log::info!("[{:>7.1} ms] onRevealed fired", at);
                if let Some(start) = fade_started_at {
                    log::info!("Fade start to notification: {:.1} ms", at - start);
                }
                log::info!(
                    "Confetti: {} burst(s), {} particles still live",
                    card.confetti().burst_count(),
                    card.confetti().particles().len()
                );
            }
            None => log::warn!("Card never revealed"),
        }

        card.unmount();
    }
}
