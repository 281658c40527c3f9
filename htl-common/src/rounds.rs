//! The static round catalog
//!
//! Rounds are fixed deployment data compiled into the binary; they are never
//! read from or written to the database. Everything downstream treats the
//! catalog length as a parameter; nothing outside this file assumes three
//! rounds.

use once_cell::sync::Lazy;
use serde::Serialize;

/// One candidate photo within a round
#[derive(Debug, Clone, Serialize)]
pub struct RoundPhoto {
    /// Stable item id within the round ("a".."d")
    pub id: &'static str,
    /// Public storage URL of the image
    pub src: &'static str,
}

/// One comparison challenge: four candidate photos and a fixed AI prediction
#[derive(Debug, Clone, Serialize)]
pub struct Round {
    /// Stable round id ("round-1"…)
    pub id: &'static str,
    /// 1-based ordinal for display
    pub number: u32,
    pub title: &'static str,
    /// Item id the AI predicted the crowd would favor
    pub ai_pick: &'static str,
    /// Label of the model that produced the prediction
    pub ai_model: &'static str,
    /// The model's stated rationale, quoted verbatim on the reveal card
    pub ai_reasoning: &'static str,
    /// Exactly four candidate photos
    pub photos: [RoundPhoto; 4],
}

impl Round {
    /// Item ids declared for this round, in catalog order
    pub fn item_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.photos.iter().map(|p| p.id)
    }

    /// Whether `item_id` is one of this round's candidates
    pub fn has_item(&self, item_id: &str) -> bool {
        self.photos.iter().any(|p| p.id == item_id)
    }
}

/// The deployed round catalog, in play order
pub static ROUNDS: Lazy<Vec<Round>> = Lazy::new(|| {
    vec![
        Round {
            id: "round-1",
            number: 1,
            title: "Best Vacation Beach Scene",
            ai_pick: "a",
            ai_model: "GPT 5.2",
            ai_reasoning: "This photo has immediate, calming beach appeal with bright turquoise water, a sailboat, soft sand, and dramatic white clouds. The colors pop strongly and the composition is clean and easy to process at a glance. It delivers relaxation and wanderlust without requiring context.",
            photos: [
                RoundPhoto { id: "a", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-1/a.jpg" },
                RoundPhoto { id: "b", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-1/b.jpg" },
                RoundPhoto { id: "c", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-1/c.jpg" },
                RoundPhoto { id: "d", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-1/d.jpg" },
            ],
        },
        Round {
            id: "round-2",
            number: 2,
            title: "Best Primate Animal Portrait",
            ai_pick: "a",
            ai_model: "GPT 5.2",
            ai_reasoning: "The baby gorilla chewing on a stick with a large adult behind it instantly triggers a protective, heartwarming response that consistently performs well with broad audiences. The eye contact and expressive face create immediate connection, and the lush green surroundings add vibrant contrast. It feels intimate, heartwarming, and highly shareable.",
            photos: [
                RoundPhoto { id: "a", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-2/a.jpg" },
                RoundPhoto { id: "b", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-2/b.jpg" },
                RoundPhoto { id: "c", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-2/c.jpg" },
                RoundPhoto { id: "d", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-2/d.jpg" },
            ],
        },
        Round {
            id: "round-3",
            number: 3,
            title: "Best Seasonal Nature Scene",
            ai_pick: "c",
            ai_model: "GPT 5.2",
            ai_reasoning: "The autumn park scene with the geese has the strongest stopping power. Vibrant orange and yellow foliage, a clear subject in the foreground with wings spread, and a calm reflective pond create instant warmth and seasonal nostalgia. The composition feels lively yet serene, both eye-catching and emotionally comforting.",
            photos: [
                RoundPhoto { id: "a", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-3/a.jpg" },
                RoundPhoto { id: "b", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-3/b.jpg" },
                RoundPhoto { id: "c", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-3/c.jpg" },
                RoundPhoto { id: "d", src: "https://wiqrvcnylhmiccjuovjm.supabase.co/storage/v1/object/public/photos/round-3/d.jpg" },
            ],
        },
    ]
});

/// Look up a round by id
pub fn round_by_id(round_id: &str) -> Option<&'static Round> {
    ROUNDS.iter().find(|r| r.id == round_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_well_formed() {
        assert!(!ROUNDS.is_empty());
        for (idx, round) in ROUNDS.iter().enumerate() {
            assert_eq!(round.number as usize, idx + 1, "rounds are in play order");
            assert_eq!(round.photos.len(), 4);
            assert!(
                round.has_item(round.ai_pick),
                "AI pick must name one of the round's own items"
            );
            // Item ids unique within the round
            let mut ids: Vec<_> = round.item_ids().collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 4, "duplicate item id in {}", round.id);
        }
    }

    #[test]
    fn round_lookup() {
        assert!(round_by_id("round-1").is_some());
        assert!(round_by_id("round-999").is_none());
    }
}
