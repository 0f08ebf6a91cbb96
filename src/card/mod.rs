//! Reveal card
//!
//! Prize presentation plus the orchestration around a scratch surface.

pub mod prize;
pub mod reveal;

pub use prize::{
    Decoration, DisplayMetadata, NO_PRIZE_ICON, NO_PRIZE_MESSAGE, PrizeContent, PrizeResult,
    celebration_intensity,
};
pub use reveal::{
    CelebrationEffect, MountProps, Progress, QueuedCelebration, RevealCard, RevealObserver,
    RevealState,
};
