//! Prize records and the content laid out beneath the overlay

use serde::{Deserialize, Serialize};

use crate::surface::Rgba;

/// Display metadata for a won prize
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayMetadata {
    pub title: String,
    /// Rarity classification, higher is rarer
    pub tier: u8,
    pub category: String,
    /// Image or icon reference (URL, asset key)
    pub image: Option<String>,
}

/// Result supplied by the host before the card is shown. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeResult {
    pub present: bool,
    #[serde(default, alias = "displayMetadata")]
    pub display: DisplayMetadata,
}

impl PrizeResult {
    /// A losing result
    pub fn none() -> Self {
        Self {
            present: false,
            display: DisplayMetadata::default(),
        }
    }

    /// A winning result
    pub fn won(title: impl Into<String>, tier: u8) -> Self {
        Self {
            present: true,
            display: DisplayMetadata {
                title: title.into(),
                tier,
                ..Default::default()
            },
        }
    }

    /// Parse a host record; JSON `null` means no result at all
    pub fn from_json(json: &str) -> Result<Option<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Decoration applied to a winning presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decoration {
    Standard,
    Rare,
    Epic,
    Legendary,
}

impl Decoration {
    pub fn for_tier(tier: u8) -> Self {
        match tier {
            0 | 1 => Decoration::Standard,
            2 => Decoration::Rare,
            3 => Decoration::Epic,
            _ => Decoration::Legendary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decoration::Standard => "standard",
            Decoration::Rare => "rare",
            Decoration::Epic => "epic",
            Decoration::Legendary => "legendary",
        }
    }

    /// Accent color for frames and glow
    pub fn accent(&self) -> Rgba {
        match self {
            Decoration::Standard => Rgba::from_hex(0x9AA5B1),
            Decoration::Rare => Rgba::from_hex(0x3B82F6),
            Decoration::Epic => Rgba::from_hex(0xA855F7),
            Decoration::Legendary => Rgba::from_hex(0xF59E0B),
        }
    }
}

pub const NO_PRIZE_MESSAGE: &str = "No prize this time";
pub const NO_PRIZE_ICON: &str = "ticket-empty";

/// What sits under the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrizeContent {
    NoPrize {
        message: &'static str,
        icon: &'static str,
    },
    Winning {
        title: String,
        category: String,
        tier: u8,
        decoration: Decoration,
        image: Option<String>,
    },
}

impl PrizeContent {
    /// Choose content for a (possibly absent) result
    pub fn for_result(prize: Option<&PrizeResult>) -> Self {
        match prize {
            Some(prize) if prize.present => {
                let display = &prize.display;
                PrizeContent::Winning {
                    title: display.title.clone(),
                    category: display.category.clone(),
                    tier: display.tier,
                    decoration: Decoration::for_tier(display.tier),
                    image: display.image.clone(),
                }
            }
            _ => PrizeContent::NoPrize {
                message: NO_PRIZE_MESSAGE,
                icon: NO_PRIZE_ICON,
            },
        }
    }

    pub fn is_winning(&self) -> bool {
        matches!(self, PrizeContent::Winning { .. })
    }

    pub fn tier(&self) -> Option<u8> {
        match self {
            PrizeContent::Winning { tier, .. } => Some(*tier),
            PrizeContent::NoPrize { .. } => None,
        }
    }
}

/// Celebration intensity for a tier, strictly increasing up to tier 8
pub fn celebration_intensity(tier: u8) -> f32 {
    0.25 + 0.25 * tier.min(8) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_losing_render_no_prize() {
        assert!(!PrizeContent::for_result(None).is_winning());
        assert!(!PrizeContent::for_result(Some(&PrizeResult::none())).is_winning());

        // Metadata on a losing result is ignored
        let mut losing = PrizeResult::won("Ghost", 4);
        losing.present = false;
        assert_eq!(
            PrizeContent::for_result(Some(&losing)),
            PrizeContent::NoPrize {
                message: NO_PRIZE_MESSAGE,
                icon: NO_PRIZE_ICON
            }
        );
    }

    #[test]
    fn test_winning_content() {
        let prize = PrizeResult::won("Golden Ticket", 3);
        match PrizeContent::for_result(Some(&prize)) {
            PrizeContent::Winning {
                title, decoration, ..
            } => {
                assert_eq!(title, "Golden Ticket");
                assert_eq!(decoration, Decoration::Epic);
            }
            other => panic!("expected winning content, got {:?}", other),
        }
    }

    #[test]
    fn test_intensity_increases_with_tier() {
        for tier in 0..8 {
            assert!(celebration_intensity(tier + 1) > celebration_intensity(tier));
        }
        assert!(celebration_intensity(3) > celebration_intensity(1));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(PrizeResult::from_json("null").unwrap(), None);

        let prize = PrizeResult::from_json(
            r#"{"present": true, "displayMetadata": {"title": "Hoodie", "tier": 2, "category": "merch", "image": "hoodie.png"}}"#,
        )
        .unwrap()
        .unwrap();
        assert!(prize.present);
        assert_eq!(prize.display.tier, 2);
        assert_eq!(prize.display.image.as_deref(), Some("hoodie.png"));

        let prize = PrizeResult::from_json(r#"{"present": false}"#).unwrap().unwrap();
        assert!(!prize.present);
    }
}
