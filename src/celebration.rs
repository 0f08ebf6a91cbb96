//! Confetti burst
//!
//! Built-in [`CelebrationEffect`]. Particles are spawned from a seeded RNG so
//! a given seed and intensity always produce the same burst.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::card::CelebrationEffect;
use crate::consts::CONFETTI_PER_INTENSITY;
use crate::error::EffectError;
use crate::surface::Rgba;

/// Downward acceleration (pixels/s²)
const GRAVITY: f32 = 520.0;
/// Per-tick velocity retention
const DRAG: f32 = 0.985;
/// Life lost per second (particles live a bit over a second)
const FADE_RATE: f32 = 0.8;

const PALETTE: [u32; 6] = [0xF43F5E, 0xF59E0B, 0x10B981, 0x3B82F6, 0xA855F7, 0xFDE047];

/// A confetti piece
#[derive(Debug, Clone)]
pub struct ConfettiParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Rgba,
    /// 1 at spawn, removed at 0
    pub life: f32,
    pub size: f32,
    /// Rotation (radians) and spin rate (radians/s)
    pub angle: f32,
    pub spin: f32,
}

/// Particle burst anchored at a point on the card
#[derive(Debug, Clone)]
pub struct ConfettiBurst {
    origin: Vec2,
    rng: Pcg32,
    max_particles: usize,
    particles: Vec<ConfettiParticle>,
    bursts: u32,
}

impl ConfettiBurst {
    pub fn new(origin: Vec2, seed: u64, max_particles: usize) -> Self {
        Self {
            origin,
            rng: Pcg32::seed_from_u64(seed),
            max_particles,
            particles: Vec::new(),
            bursts: 0,
        }
    }

    /// Particles spawned for an intensity, before the live cap applies
    pub fn particle_count_for(intensity: f32) -> usize {
        (CONFETTI_PER_INTENSITY * intensity).round().max(0.0) as usize
    }

    pub fn particles(&self) -> &[ConfettiParticle] {
        &self.particles
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
    }

    pub fn burst_count(&self) -> u32 {
        self.bursts
    }

    /// Advance particles by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        for p in self.particles.iter_mut() {
            p.vel.y += GRAVITY * dt;
            p.vel *= DRAG;
            p.pos += p.vel * dt;
            p.angle += p.spin * dt;
            p.life -= FADE_RATE * dt;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    fn spawn(&mut self, intensity: f32) -> ConfettiParticle {
        // Upward cone, wider and faster for bigger prizes
        let spread = (0.6 + 0.2 * intensity).min(1.3);
        let angle = -std::f32::consts::FRAC_PI_2 + self.rng.random_range(-spread..=spread);
        let speed = self.rng.random_range(250.0..450.0) * (0.8 + 0.2 * intensity.min(3.0));
        let color = PALETTE[self.rng.random_range(0..PALETTE.len())];

        ConfettiParticle {
            pos: self.origin,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            color: Rgba::from_hex(color),
            life: 1.0,
            size: self.rng.random_range(3.0..7.0),
            angle: self.rng.random_range(0.0..std::f32::consts::TAU),
            spin: self.rng.random_range(-10.0..10.0),
        }
    }
}

impl CelebrationEffect for ConfettiBurst {
    fn burst(&mut self, intensity: f32) -> Result<(), EffectError> {
        if !intensity.is_finite() || intensity <= 0.0 {
            return Err(EffectError::InvalidIntensity(intensity));
        }
        if self.max_particles == 0 {
            return Err(EffectError::Disabled);
        }

        let room = self.max_particles.saturating_sub(self.particles.len());
        let count = Self::particle_count_for(intensity).min(room);
        for _ in 0..count {
            let particle = self.spawn(intensity);
            self.particles.push(particle);
        }
        self.bursts += 1;
        log::debug!("Confetti burst: {} particles", count);
        Ok(())
    }
}
