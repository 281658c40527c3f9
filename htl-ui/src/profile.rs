//! End-of-session taste typing
//!
//! Classifies the visitor's agreement pattern with the crowd and the AI
//! into one of seven narrative profiles. The rules form a strict ordered
//! decision list (first match wins) and the order is load-bearing: the
//! AI-alignment types (MachineEye, DigitalEye) are tested before the
//! crowd-alignment types, so they are unreachable whenever crowd_matches
//! reaches 2, no matter how well the visitor tracked the AI. A session of
//! three crowd matches and three AI matches types as PerfectRead. That
//! asymmetry is part of the deployed behavior and is preserved as-is.
//!
//! Classification is total: any stat combination outside the expected
//! range, including ones impossible in a three-round game, falls through to
//! Outlier rather than failing.

use crate::consensus::{crowd_favorite, leaders, TallyBoard};
use htl_common::rounds::Round;
use serde::Serialize;
use std::collections::HashMap;

/// Aggregate agreement counts across the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Rounds where the visitor's pick was the sole crowd favorite
    pub crowd_matches: u32,
    /// Rounds where the visitor's pick equaled the AI's pick
    pub ai_matches: u32,
    /// Rounds where the AI's pick was among the leaders (tie-inclusive)
    pub ai_accuracy: u32,
}

/// Compute session stats from the visitor's selections and the live board
pub fn session_stats(
    rounds: &[Round],
    selections: &HashMap<String, String>,
    board: &TallyBoard,
) -> SessionStats {
    let mut stats = SessionStats::default();
    for round in rounds {
        let tally = board.tally(round.id);
        let pick = selections.get(round.id).map(String::as_str);

        if let (Some(pick), Some(favorite)) = (pick, crowd_favorite(&tally)) {
            if pick == favorite {
                stats.crowd_matches += 1;
            }
        }
        if pick == Some(round.ai_pick) {
            stats.ai_matches += 1;
        }
        if leaders(&tally).contains(&round.ai_pick) {
            stats.ai_accuracy += 1;
        }
    }
    stats
}

/// The seven taste types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TasteType {
    MachineEye,
    DigitalEye,
    HumanElement,
    PerfectRead,
    MainstreamEye,
    AgainstGrain,
    Outlier,
}

/// Classify the session's agreement pattern
///
/// Strict ordered decision list; do not reorder.
pub fn classify(crowd_matches: u32, ai_matches: u32) -> TasteType {
    if ai_matches == 3 && crowd_matches <= 1 {
        return TasteType::MachineEye;
    }
    if ai_matches == 2 && crowd_matches <= 1 {
        return TasteType::DigitalEye;
    }
    if crowd_matches >= 2 && ai_matches == 0 {
        return TasteType::HumanElement;
    }
    if crowd_matches == 3 {
        return TasteType::PerfectRead;
    }
    if crowd_matches == 2 {
        return TasteType::MainstreamEye;
    }
    if crowd_matches == 1 {
        return TasteType::AgainstGrain;
    }
    TasteType::Outlier
}

/// A resolved narrative profile
#[derive(Debug, Clone, Serialize)]
pub struct TasteProfile {
    pub type_name: &'static str,
    pub headline: &'static str,
    pub description: &'static str,
    pub detail: &'static str,
}

/// Resolve a taste type to its narrative
///
/// One pure lookup; the three AI-relationship types branch their
/// description on the crowd-match count.
pub fn profile_for(taste: TasteType, crowd_matches: u32) -> TasteProfile {
    match taste {
        TasteType::PerfectRead => TasteProfile {
            type_name: "The Perfect Read",
            headline: "Three for three.",
            description: "You didn't hesitate, did you? Every round, you looked at four photos and your eye went to the exact same one that most people chose. That's not luck over three rounds. That's something about how you're wired.",
            detail: "Here's what's interesting. You weren't following anyone. You couldn't see what other people picked. You arrived at the same place completely independently, three times in a row. Whatever most people respond to in an image (balance, warmth, a clear subject) you respond to it too, instinctively. You don't just have good taste. You have default taste. The question is whether that's a compliment or not. It is.",
        },
        TasteType::MainstreamEye => TasteProfile {
            type_name: "The Mainstream Eye",
            headline: "You see what most people see. Almost.",
            description: "Two out of three rounds, your pick was the crowd favorite. You're tuned into whatever it is that draws most people to an image. Light, composition, emotional clarity. But one round, you broke from it. You looked at the same four photos everyone else saw and your eye landed somewhere different.",
            detail: "That one break is the most interesting thing about your result. It means your taste isn't on autopilot. You share the majority instinct most of the time, but there's a specific register (maybe a mood, a texture, a kind of image) where you diverge. You're not predictable. You're mostly predictable. And that \"mostly\" is where your actual taste lives.",
        },
        TasteType::AgainstGrain => TasteProfile {
            type_name: "Against the Grain",
            headline: "The crowd goes left. You go right.",
            description: "Only once across three rounds did you pick the same photo as the majority. The rest of the time, your eye landed on something most people scrolled past. The image that got 10% or 15% of the vote while something else dominated.",
            detail: "This doesn't mean you have bad taste. It might mean you have more specific taste. You're probably responding to something most people don't consciously notice. An unusual crop, a quieter mood, a detail in the corner that rewards a longer look. Popularity measures the average. You're not the average. Whether that's an edge or an inconvenience depends on whether you're curating a gallery or choosing a restaurant.",
        },
        TasteType::Outlier => TasteProfile {
            type_name: "The Outlier",
            headline: "Nobody picked what you picked.",
            description: "Three rounds. Three chances to agree with the crowd. You matched zero times. When the majority went one direction, you were somewhere else entirely. Not once, but consistently.",
            detail: "There are two ways to read this. One: you're genuinely seeing something in these images that most people miss. You're drawn to subtlety, strangeness, the photo that doesn't try to be liked. Two: you might just be wired differently. Not better or worse, just differently. Most aesthetic research assumes people converge. You're evidence that they don't always. You're the reason this experiment is interesting.",
        },
        TasteType::MachineEye => TasteProfile {
            type_name: "The Machine Eye",
            headline: "You see what the algorithm sees.",
            description: if crowd_matches == 0 {
                "Every round, you and AI picked the same photo. Same image, same instinct, independently. You from whatever you feel when you look at a photo, AI from whatever patterns it's learned from millions of images. The crowd? They went somewhere else every single time. Neither of you matched the majority once."
            } else {
                "Every round, you and AI picked the same photo. Same image, same instinct, independently. You matched the crowd once, but it was AI you were consistently aligned with. Three for three with the machine."
            },
            detail: "You're not aligned with the majority. You're aligned with the model. That probably means you're drawn to the same things AI optimizes for: technical clarity, strong composition, high contrast, obvious focal points. These are the \"objectively good\" qualities of an image. The crowd often picks something warmer, messier, more human. You pick what's correct. Whether that makes you more perceptive or less emotional is the question this result doesn't answer.",
        },
        TasteType::DigitalEye => TasteProfile {
            type_name: "The Digital Eye",
            headline: "You and the algorithm are on the same wavelength.",
            description: if crowd_matches == 0 {
                "Two out of three rounds, you picked the same photo as AI. Not because you saw its answers. You couldn't. You just looked at four photos and your eye went to the same place the algorithm's did. The crowd? They went somewhere else. You and AI are seeing something most people aren't."
            } else {
                "Two out of three rounds, you and AI chose the same photo independently. You matched the crowd once, but your real alignment was with the machine. That's not a coincidence over two rounds. That's a pattern."
            },
            detail: "You're not quite The Machine Eye (that requires a perfect three-for-three with AI), but you're close. Two out of three means your visual instincts overlap significantly with what the model was trained to detect: strong composition, clarity, technical precision. The one round where you broke from AI might be the most interesting. That's where your human judgment overrode the algorithmic one. What did you see that the model didn't? Or what did you feel that it can't?",
        },
        TasteType::HumanElement => TasteProfile {
            type_name: "The Human Element",
            headline: "You see something AI can't.",
            description: if crowd_matches == 3 {
                "Three for three. You picked the crowd favorite every round. You're clearly tuned into whatever makes an image resonate with people. But AI never agreed with you. Not once. The machine looked at the same photos and picked something completely different every round."
            } else {
                "Two out of three rounds, you picked the crowd favorite. You're tuned into what resonates with people. But here's the interesting part: AI never agreed with you. Not once. Whatever you and the crowd are responding to, the algorithm can't see it."
            },
            detail: "This is a fascinating result. You and the crowd are responding to the same thing, but it's invisible to the algorithm. It might be warmth. It might be narrative, the sense that something is happening in the photo, not just being displayed. It might be nostalgia, or comfort, or a feeling you can't name. Whatever it is, it's human. It's shared. And it's the thing that makes aesthetic preference more than just pattern recognition. You're proof that taste isn't computable. At least not yet.",
        },
    }
}

/// One-line scorecard of the AI's round-by-round prediction record
pub fn ai_scorecard(ai_accuracy: u32) -> &'static str {
    match ai_accuracy {
        3 => "AI predicted the crowd favorite every round. It could see exactly what humans find beautiful.",
        2 => "AI predicted the crowd favorite 2 out of 3 times. It could mostly read the room.",
        1 => "AI predicted the crowd favorite once. It mostly couldn't see what humans see.",
        _ => "AI didn't predict the crowd favorite a single time. Whatever drew people to the winning photo, the algorithm couldn't detect it.",
    }
}

/// Shareable one-line summary of the session
pub fn share_text(profile: &TasteProfile, stats: &SessionStats, round_count: usize) -> String {
    format!(
        "I got \"{}\" on Human Taste Lab. {}/{} crowd matches. AI got {}/{}. What's your taste type? humantastelab.com",
        profile.type_name, stats.crowd_matches, round_count, stats.ai_accuracy, round_count
    )
}
