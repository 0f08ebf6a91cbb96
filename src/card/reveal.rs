//! Reveal orchestrator
//!
//! Composes the prize presentation with a [`ScratchSurface`] and runs the
//! one-time completion sequence:
//!
//! 1. mark completed
//! 2. celebrate (winning results only, failures logged). Without a host
//!    effect the card's own [`ConfettiBurst`] is used.
//! 3. notify the host after a fixed delay, same delay for every outcome

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::prize::{PrizeContent, PrizeResult, celebration_intensity};
use crate::celebration::ConfettiBurst;
use crate::clock::Timers;
use crate::error::EffectError;
use crate::settings::{Environment, Settings};
use crate::surface::{
    AutoReveal, CardGeometry, PointerInput, Rgba, ScratchEvent, ScratchPhase, ScratchSurface,
    SurfaceRect,
};

/// Receives the single "revealed" notification
pub trait RevealObserver {
    fn on_revealed(&mut self);
}

impl<F: FnMut()> RevealObserver for F {
    fn on_revealed(&mut self) {
        self()
    }
}

/// Celebratory effect run when a winning card is revealed
pub trait CelebrationEffect {
    fn burst(&mut self, intensity: f32) -> Result<(), EffectError>;
}

/// Lets the host keep a handle to an effect (e.g. to render its particles)
impl<T: CelebrationEffect> CelebrationEffect for Rc<RefCell<T>> {
    fn burst(&mut self, intensity: f32) -> Result<(), EffectError> {
        self.borrow_mut().burst(intensity)
    }
}

/// Records bursts instead of running them, for hosts whose effect may call
/// back into the card. Drain with [`QueuedCelebration::take`] once the card
/// is no longer borrowed.
#[derive(Debug, Clone, Default)]
pub struct QueuedCelebration {
    pending: Rc<RefCell<Vec<f32>>>,
}

impl QueuedCelebration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intensities queued since the last call
    pub fn take(&self) -> Vec<f32> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

impl CelebrationEffect for QueuedCelebration {
    fn burst(&mut self, intensity: f32) -> Result<(), EffectError> {
        self.pending.borrow_mut().push(intensity);
        Ok(())
    }
}

/// Orchestrator-owned reveal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealState {
    pub has_completed: bool,
}

/// Mount-time input from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountProps {
    pub prize_result: Option<PrizeResult>,
    pub geometry: CardGeometry,
}

/// Snapshot for host UIs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub erased_fraction: f32,
    pub phase: ScratchPhase,
    pub overlay_opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardTimer {
    Notify,
}

/// One scratch card instance
pub struct RevealCard {
    prize: Option<PrizeResult>,
    content: PrizeContent,
    geometry: CardGeometry,
    environment: Environment,
    settings: Settings,
    surface: ScratchSurface,
    reveal: RevealState,
    timers: Timers<CardTimer>,
    observer: Box<dyn RevealObserver>,
    /// Host effect; the built-in confetti runs when this is None
    celebration: Option<Box<dyn CelebrationEffect>>,
    confetti: ConfettiBurst,
    last_frame_ms: Option<f64>,
    notified: bool,
    mounted: bool,
}

impl RevealCard {
    /// Lay out the prize content, then mount a fresh surface over it
    pub fn mount(
        props: MountProps,
        environment: Environment,
        settings: &Settings,
        observer: Box<dyn RevealObserver>,
    ) -> Self {
        let MountProps {
            prize_result,
            geometry,
        } = props;
        let content = PrizeContent::for_result(prize_result.as_ref());
        let surface = Self::new_surface(geometry, &environment, settings);
        log::info!(
            "Card mounted {}x{} ({})",
            geometry.width,
            geometry.height,
            if content.is_winning() { "winning" } else { "no prize" }
        );

        Self {
            prize: prize_result,
            content,
            geometry,
            environment,
            settings: settings.clone(),
            surface,
            reveal: RevealState::default(),
            timers: Timers::new(),
            observer,
            celebration: None,
            confetti: Self::new_confetti(geometry, &environment, settings),
            last_frame_ms: None,
            notified: false,
            mounted: true,
        }
    }

    fn new_surface(geometry: CardGeometry, environment: &Environment, settings: &Settings) -> ScratchSurface {
        ScratchSurface::new(
            geometry,
            Rgba::from_hex(settings.overlay_color),
            environment,
            settings,
        )
    }

    /// Burst anchored at the card center, in logical pixels
    fn new_confetti(geometry: CardGeometry, environment: &Environment, settings: &Settings) -> ConfettiBurst {
        ConfettiBurst::new(
            Vec2::new(geometry.width as f32 / 2.0, geometry.height as f32 / 2.0),
            environment.seed,
            settings.max_confetti,
        )
    }

    /// Attach the effect run on winning reveals, replacing the built-in confetti
    pub fn with_celebration(mut self, effect: Box<dyn CelebrationEffect>) -> Self {
        self.celebration = Some(effect);
        self
    }

    pub fn prize(&self) -> Option<&PrizeResult> {
        self.prize.as_ref()
    }

    pub fn content(&self) -> &PrizeContent {
        &self.content
    }

    pub fn geometry(&self) -> CardGeometry {
        self.geometry
    }

    pub fn reveal_state(&self) -> RevealState {
        self.reveal
    }

    pub fn surface(&self) -> &ScratchSurface {
        &self.surface
    }

    /// Built-in confetti (idle when a host effect is attached)
    pub fn confetti(&self) -> &ConfettiBurst {
        &self.confetti
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn progress(&self) -> Progress {
        let state = self.surface.state();
        Progress {
            erased_fraction: state.erased_fraction,
            phase: state.phase,
            overlay_opacity: state.fade_alpha,
        }
    }

    /// Update where the surface sits on screen
    pub fn set_surface_rect(&mut self, rect: SurfaceRect) {
        self.surface.set_surface_rect(rect);
    }

    pub fn handle_input(&mut self, input: PointerInput) {
        if self.mounted {
            self.surface.handle_input(input);
        }
    }

    /// Whether the skip/reveal control should be shown
    pub fn skip_visible(&self) -> bool {
        self.mounted && !self.reveal.has_completed
    }

    /// Skip control pressed. Returns true if this started the fade.
    pub fn skip(&mut self) -> bool {
        if !self.skip_visible() {
            return false;
        }
        self.surface.trigger()
    }

    /// Advance one animation frame at host time `now_ms`
    pub fn frame(&mut self, now_ms: f64) {
        if !self.mounted {
            return;
        }

        let dt = self.last_frame_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_frame_ms = Some(now_ms);
        if self.confetti.is_active() {
            self.confetti.update((dt / 1000.0) as f32);
        }

        self.surface.frame(now_ms);
        for event in self.surface.take_events() {
            match event {
                ScratchEvent::Revealed => self.complete(now_ms),
                ScratchEvent::FadeStarted(trigger) => log::debug!("Fade started by {:?}", trigger),
                ScratchEvent::Cleared => log::debug!("Overlay cleared"),
            }
        }

        for timer in self.timers.drain_due(now_ms) {
            match timer {
                CardTimer::Notify => self.notify(),
            }
        }
    }

    fn complete(&mut self, now_ms: f64) {
        if self.reveal.has_completed {
            log::debug!("Duplicate completion ignored");
            return;
        }
        self.reveal.has_completed = true;

        if let PrizeContent::Winning { tier, .. } = self.content {
            self.celebrate(tier);
        }

        self.timers
            .schedule(now_ms + self.settings.notify_delay_ms, CardTimer::Notify);
    }

    fn celebrate(&mut self, tier: u8) {
        let intensity = celebration_intensity(tier);
        let effect: &mut dyn CelebrationEffect = match self.celebration.as_mut() {
            Some(effect) => &mut **effect,
            None => &mut self.confetti,
        };
        match effect.burst(intensity) {
            Ok(()) => log::info!("Celebration burst (tier {}, intensity {:.2})", tier, intensity),
            Err(e) => log::warn!("Celebration failed, continuing reveal: {}", e),
        }
    }

    fn notify(&mut self) {
        if self.notified {
            return;
        }
        self.notified = true;
        log::info!("Notifying host: card revealed");
        self.observer.on_revealed();
    }

    /// Swap in a new prize: fresh content, fresh surface, fresh reveal state.
    /// Pending work for the previous prize is dropped.
    pub fn replace_prize(&mut self, prize: Option<PrizeResult>) {
        self.surface.unmount();
        self.timers.cancel_all();

        self.content = PrizeContent::for_result(prize.as_ref());
        self.prize = prize;
        self.surface = Self::new_surface(self.geometry, &self.environment, &self.settings);
        self.confetti = Self::new_confetti(self.geometry, &self.environment, &self.settings);
        self.reveal = RevealState::default();
        self.notified = false;
        self.mounted = true;
        log::info!(
            "Card remounted ({})",
            if self.content.is_winning() { "winning" } else { "no prize" }
        );
    }

    /// Stop all pending frames and timers
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.surface.unmount();
        self.timers.cancel_all();
        log::debug!("Card unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recorder {
        intensities: Vec<f32>,
        fail: bool,
    }

    impl CelebrationEffect for Recorder {
        fn burst(&mut self, intensity: f32) -> Result<(), EffectError> {
            self.intensities.push(intensity);
            if self.fail {
                Err(EffectError::Host("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        card: RevealCard,
        revealed: Rc<Cell<u32>>,
        effect: Rc<RefCell<Recorder>>,
        now: f64,
    }

    impl Harness {
        fn new(prize: Option<PrizeResult>) -> Self {
            Self::with_effect(prize, Recorder::default())
        }

        fn with_effect(prize: Option<PrizeResult>, recorder: Recorder) -> Self {
            let revealed = Rc::new(Cell::new(0));
            let effect = Rc::new(RefCell::new(recorder));
            let counter = revealed.clone();
            let card = RevealCard::mount(
                MountProps {
                    prize_result: prize,
                    geometry: CardGeometry::new(120, 80),
                },
                Environment::default(),
                &Settings::default(),
                Box::new(move || counter.set(counter.get() + 1)),
            )
            .with_celebration(Box::new(effect.clone()));
            Self {
                card,
                revealed,
                effect,
                now: 0.0,
            }
        }

        fn run(&mut self, frames: u32) {
            for _ in 0..frames {
                self.now += 16.0;
                self.card.frame(self.now);
            }
        }

        fn run_until_revealed(&mut self, max_frames: u32) -> Option<f64> {
            for _ in 0..max_frames {
                self.run(1);
                if self.revealed.get() > 0 {
                    return Some(self.now);
                }
            }
            None
        }
    }

    #[test]
    fn test_no_prize_skips_celebration_but_notifies() {
        let mut h = Harness::new(Some(PrizeResult::none()));
        assert!(h.card.skip());
        assert!(h.run_until_revealed(200).is_some());
        h.run(200);

        assert_eq!(h.revealed.get(), 1);
        assert!(h.effect.borrow().intensities.is_empty());
        assert!(h.card.reveal_state().has_completed);
    }

    #[test]
    fn test_tier_scales_intensity() {
        let mut low = Harness::new(Some(PrizeResult::won("Sticker", 1)));
        let mut high = Harness::new(Some(PrizeResult::won("Console", 3)));
        for h in [&mut low, &mut high] {
            h.card.skip();
            h.run(200);
            assert_eq!(h.revealed.get(), 1);
        }

        let low_i = low.effect.borrow().intensities.clone();
        let high_i = high.effect.borrow().intensities.clone();
        assert_eq!(low_i.len(), 1);
        assert_eq!(high_i.len(), 1);
        assert!(high_i[0] > low_i[0]);
    }

    #[test]
    fn test_notification_waits_for_delay() {
        let mut h = Harness::new(Some(PrizeResult::won("Mug", 2)));
        h.card.skip();

        // Run until the surface reports completion
        while !h.card.reveal_state().has_completed {
            h.run(1);
            assert!(h.now < 5_000.0);
        }
        let completed_at = h.now;
        assert_eq!(h.effect.borrow().intensities.len(), 1);
        assert_eq!(h.revealed.get(), 0);
        assert!(!h.card.skip_visible());

        let revealed_at = h.run_until_revealed(100).unwrap();
        let delay = revealed_at - completed_at;
        assert!(delay >= 500.0 && delay < 500.0 + 16.0);
    }

    #[test]
    fn test_celebration_failure_does_not_block_notify() {
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let mut h = Harness::with_effect(Some(PrizeResult::won("Hat", 4)), recorder);
        h.card.skip();
        h.run(200);
        assert_eq!(h.effect.borrow().intensities.len(), 1);
        assert_eq!(h.revealed.get(), 1);
    }

    #[test]
    fn test_skip_hidden_after_completion() {
        let mut h = Harness::new(None);
        assert!(h.card.skip_visible());
        h.card.skip();
        assert!(h.card.skip_visible());
        assert!(!h.card.skip());

        h.run(200);
        assert!(!h.card.skip_visible());
        assert!(!h.card.skip());
        assert_eq!(h.revealed.get(), 1);
    }

    #[test]
    fn test_replace_prize_starts_fresh() {
        let mut h = Harness::new(None);
        h.card.skip();
        h.run(200);
        assert!(h.card.reveal_state().has_completed);
        assert_eq!(h.card.progress().phase, ScratchPhase::Cleared);

        h.card.replace_prize(Some(PrizeResult::won("Bike", 3)));
        assert!(!h.card.reveal_state().has_completed);
        assert!(h.card.content().is_winning());
        assert_eq!(h.card.progress().phase, ScratchPhase::Intact);
        assert_eq!(h.card.progress().erased_fraction, 0.0);
        assert!(h.card.skip_visible());

        h.card.skip();
        h.run(200);
        assert_eq!(h.revealed.get(), 2);
        assert_eq!(h.effect.borrow().intensities.len(), 1);
    }

    #[test]
    fn test_replace_prize_drops_pending_notification() {
        let mut h = Harness::new(None);
        h.card.skip();
        while !h.card.reveal_state().has_completed {
            h.run(1);
        }
        h.card.replace_prize(None);
        h.run(200);
        assert_eq!(h.revealed.get(), 0);
    }

    fn mount_without_effect(prize: Option<PrizeResult>, settings: &Settings) -> (RevealCard, Rc<Cell<u32>>) {
        let revealed = Rc::new(Cell::new(0));
        let counter = revealed.clone();
        let card = RevealCard::mount(
            MountProps {
                prize_result: prize,
                geometry: CardGeometry::new(120, 80),
            },
            Environment::default(),
            settings,
            Box::new(move || counter.set(counter.get() + 1)),
        );
        (card, revealed)
    }

    fn run_card(card: &mut RevealCard, from: f64, frames: u32) -> f64 {
        let mut now = from;
        for _ in 0..frames {
            now += 16.0;
            card.frame(now);
        }
        now
    }

    #[test]
    fn test_winning_card_defaults_to_confetti() {
        let (mut card, revealed) = mount_without_effect(Some(PrizeResult::won("Scarf", 3)), &Settings::default());
        card.skip();
        let mut now = 0.0;
        while !card.reveal_state().has_completed {
            now = run_card(&mut card, now, 1);
            assert!(now < 5_000.0);
        }
        assert_eq!(card.confetti().burst_count(), 1);
        assert!(card.confetti().is_active());

        // Particles animate on card frames and burn out before long
        let start = card.confetti().particles()[0].pos;
        run_card(&mut card, now, 1);
        assert_ne!(card.confetti().particles()[0].pos, start);
        run_card(&mut card, now + 16.0, 200);
        assert!(!card.confetti().is_active());
        assert_eq!(revealed.get(), 1);
    }

    #[test]
    fn test_no_prize_leaves_confetti_idle() {
        let (mut card, revealed) = mount_without_effect(None, &Settings::default());
        card.skip();
        run_card(&mut card, 0.0, 200);
        assert_eq!(card.confetti().burst_count(), 0);
        assert_eq!(revealed.get(), 1);
    }

    #[test]
    fn test_disabled_confetti_still_notifies() {
        let settings = Settings {
            max_confetti: 0,
            ..Default::default()
        };
        let (mut card, revealed) = mount_without_effect(Some(PrizeResult::won("Pin", 1)), &settings);
        card.skip();
        run_card(&mut card, 0.0, 200);
        assert!(!card.confetti().is_active());
        assert_eq!(revealed.get(), 1);
    }

    #[test]
    fn test_queued_celebration_runs_after_card_released() {
        let queue = QueuedCelebration::new();
        let (card, revealed) = mount_without_effect(Some(PrizeResult::won("Kite", 2)), &Settings::default());
        let card = Rc::new(RefCell::new(card.with_celebration(Box::new(queue.clone()))));
        card.borrow_mut().skip();

        let mut seen = Vec::new();
        let mut now = 0.0;
        for _ in 0..200 {
            now += 16.0;
            card.borrow_mut().frame(now);
            // Host callback reading the card, as a JS effect might
            for intensity in queue.take() {
                let progress = card.borrow().progress();
                seen.push((intensity, progress.phase, card.borrow().skip_visible()));
            }
        }

        assert_eq!(seen, vec![(celebration_intensity(2), ScratchPhase::Cleared, false)]);
        assert_eq!(card.borrow().confetti().burst_count(), 0);
        assert_eq!(revealed.get(), 1);
    }

    #[test]
    fn test_unmount_cancels_everything() {
        let mut h = Harness::new(Some(PrizeResult::won("Watch", 5)));
        h.card.skip();
        h.run(3);
        h.card.unmount();
        h.run(300);

        assert_eq!(h.revealed.get(), 0);
        assert!(h.effect.borrow().intensities.is_empty());
        assert!(!h.card.skip_visible());
        assert!(!h.card.skip());
    }
}
