//! Per-round report cards and result-page story lines
//!
//! Everything here is a pure function of (visitor pick, AI pick, consensus,
//! display order). Card copy is selected through an explicit classification
//! enum and one rendering match, so the case coverage is exhaustive and each
//! branch is individually testable. Photos are referred to by their display
//! letters, which depend on the visitor's shuffled order, not the catalog
//! order.

use crate::consensus::ConsensusResult;
use crate::shuffle::display_letter;
use htl_common::rounds::Round;
use serde::Serialize;

/// How a round played out, relative to visitor, crowd, and AI
///
/// The first five cover a round with a single crowd favorite; the rest
/// cover a split (tied leaders) round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardKind {
    /// Visitor, crowd, and AI all landed on the same photo
    Convergence,
    /// Visitor matched the crowd; AI predicted a different photo
    CrowdWithoutAi,
    /// Visitor matched the AI; the crowd went elsewhere
    AiWithoutCrowd,
    /// Visitor matched neither, but AI predicted the actual favorite
    AiCalledIt,
    /// Visitor matched neither and AI was wrong too
    NobodyAgreed,
    /// Split round; visitor and AI share a tied leader
    TieSharedPick,
    /// Split round; visitor and AI picked different tied leaders
    TieSplitLeaders,
    /// Split round; visitor on a tied leader, AI not
    TieAiMissedSplit,
    /// Split round; AI on a tied leader, visitor not
    TieAiCaughtSplit,
    /// Split round; neither on a tied leader
    TieBothMissed,
}

/// The reveal card shown after a round
#[derive(Debug, Clone, Serialize)]
pub struct ReportCard {
    pub kind: CardKind,
    /// Personal reaction to the visitor's pick
    pub personal_line: String,
    /// How the AI's prediction relates to the visitor's pick
    pub ai_line: String,
    /// Factual verdict: favorite (or tied set), share, AI right or wrong
    pub verdict_line: String,
    /// Closing remark
    pub closing_line: String,
    /// Whether the AI's prediction held up (tie-inclusive on split rounds)
    pub ai_correct: bool,
    pub tied: bool,
}

/// Format display letters per English conjunction rules
///
/// "Photo A" / "Photos A and B" / "Photos A, B, and C"
pub fn format_photo_list(letters: &[char]) -> String {
    match letters {
        [] => String::new(),
        [only] => format!("Photo {}", only),
        [first, second] => format!("Photos {} and {}", first, second),
        [head @ .., last] => {
            let head: Vec<String> = head.iter().map(|c| c.to_string()).collect();
            format!("Photos {}, and {}", head.join(", "), last)
        }
    }
}

/// Classify a round with a single crowd favorite (or none at all)
fn classify_plain(matched_crowd: bool, matched_ai: bool, ai_correct: bool) -> CardKind {
    match (matched_crowd, matched_ai) {
        (true, true) => CardKind::Convergence,
        (true, false) => CardKind::CrowdWithoutAi,
        (false, true) => CardKind::AiWithoutCrowd,
        (false, false) if ai_correct => CardKind::AiCalledIt,
        (false, false) => CardKind::NobodyAgreed,
    }
}

/// Classify a split round
fn classify_tie(user_among: bool, ai_among: bool, matched_ai: bool) -> CardKind {
    match (user_among, ai_among) {
        (true, true) if matched_ai => CardKind::TieSharedPick,
        (true, true) => CardKind::TieSplitLeaders,
        (true, false) => CardKind::TieAiMissedSplit,
        (false, true) => CardKind::TieAiCaughtSplit,
        (false, false) => CardKind::TieBothMissed,
    }
}

/// Build the reveal card for a round
///
/// Total over any consensus state: with no votes at all the verdict names no
/// favorite and shares of 0%, rather than failing.
pub fn report_card(
    round: &Round,
    visitor_pick: &str,
    consensus: &ConsensusResult,
    order: &[&str],
) -> ReportCard {
    let ai_pick = round.ai_pick;
    let ai_letter = display_letter(order, ai_pick);
    let user_pct = consensus.percentages.get(visitor_pick).copied().unwrap_or(0);

    if !consensus.tied {
        let crowd_fav = consensus.crowd_favorite.as_deref();
        let matched_crowd = crowd_fav == Some(visitor_pick);
        let matched_ai = visitor_pick == ai_pick;
        let ai_correct = crowd_fav == Some(ai_pick);
        let kind = classify_plain(matched_crowd, matched_ai, ai_correct);

        let crowd_letter = crowd_fav.map(|id| display_letter(order, id)).unwrap_or('?');
        let crowd_pct = crowd_fav
            .and_then(|id| consensus.percentages.get(id).copied())
            .unwrap_or(0);

        let personal_line = if matched_crowd {
            "You picked the crowd favorite.".to_string()
        } else {
            format!("You went a different direction. Only {}% agreed with you.", user_pct)
        };

        let ai_line = match kind {
            CardKind::Convergence => "So did AI. All three converged this round.".to_string(),
            CardKind::CrowdWithoutAi => format!(
                "AI picked something different. It predicted Photo {} would be the most popular.",
                ai_letter
            ),
            CardKind::AiWithoutCrowd => {
                "Interestingly, AI picked the same photo you did. But the crowd went elsewhere."
                    .to_string()
            }
            CardKind::AiCalledIt => format!(
                "AI predicted Photo {} would be the most popular.",
                crowd_letter
            ),
            _ => format!(
                "AI predicted Photo {}. The crowd picked something else entirely.",
                ai_letter
            ),
        };

        let verdict_line = format!(
            "The crowd picked Photo {} with {}% of the vote. AI got it {}.",
            crowd_letter,
            crowd_pct,
            if ai_correct { "right" } else { "wrong" }
        );

        let closing_line = if ai_correct {
            "This round, AI could predict what humans find beautiful.".to_string()
        } else {
            "This round, it couldn't.".to_string()
        };

        return ReportCard {
            kind,
            personal_line,
            ai_line,
            verdict_line,
            closing_line,
            ai_correct,
            tied: false,
        };
    }

    // Split round: several tied leaders, no single favorite
    let user_among = consensus.leaders.iter().any(|id| id == visitor_pick);
    let ai_among = consensus.leaders.iter().any(|id| id == ai_pick);
    let matched_ai = visitor_pick == ai_pick;
    let kind = classify_tie(user_among, ai_among, matched_ai);

    let mut leader_letters: Vec<char> = consensus
        .leaders
        .iter()
        .map(|id| display_letter(order, id))
        .collect();
    leader_letters.sort_unstable();
    let tied_list = format_photo_list(&leader_letters);
    let tied_pct = consensus
        .leaders
        .first()
        .and_then(|id| consensus.percentages.get(id).copied())
        .unwrap_or(0);

    let personal_line = if user_among {
        "The crowd was split this round, but your pick was one of the tied leaders.".to_string()
    } else {
        format!("The crowd was split this round. Only {}% agreed with you.", user_pct)
    };

    let ai_line = match kind {
        CardKind::TieSharedPick => {
            "AI picked the same photo you did. You both landed on one of the top choices."
                .to_string()
        }
        CardKind::TieSplitLeaders => {
            "AI also picked a tied leader, but a different one.".to_string()
        }
        CardKind::TieAiMissedSplit => format!(
            "AI predicted Photo {}, which wasn't among the leaders.",
            ai_letter
        ),
        CardKind::TieAiCaughtSplit => {
            format!("AI predicted Photo {}, one of the tied leaders.", ai_letter)
        }
        _ => format!(
            "AI predicted Photo {}. It wasn't among the leaders either.",
            ai_letter
        ),
    };

    let verdict_line = format!(
        "{} tied at {}% each. AI {}.",
        tied_list,
        tied_pct,
        if ai_among { "picked a tied leader" } else { "got it wrong" }
    );

    let closing_line = if ai_among {
        "This round, the crowd was split, but AI was in the mix.".to_string()
    } else {
        "This round, the crowd was split and AI missed entirely.".to_string()
    };

    ReportCard {
        kind,
        personal_line,
        ai_line,
        verdict_line,
        closing_line,
        ai_correct: ai_among,
        tied: true,
    }
}

/// One-sentence round summary for the results page
pub fn round_story(
    round: &Round,
    visitor_pick: &str,
    consensus: &ConsensusResult,
    order: &[&str],
) -> String {
    let user_letter = display_letter(order, visitor_pick);
    let ai_letter = display_letter(order, round.ai_pick);

    if consensus.tied {
        let mut leader_letters: Vec<char> = consensus
            .leaders
            .iter()
            .map(|id| display_letter(order, id))
            .collect();
        leader_letters.sort_unstable();
        let tied_list = format_photo_list(&leader_letters);
        let tied_pct = consensus
            .leaders
            .first()
            .and_then(|id| consensus.percentages.get(id).copied())
            .unwrap_or(0);
        let user_among = consensus.leaders.iter().any(|id| id == visitor_pick);
        let ai_among = consensus.leaders.iter().any(|id| id == round.ai_pick);

        return match (user_among, ai_among) {
            (true, true) => format!(
                "{} tied at {}%. You and AI both picked tied leaders.",
                tied_list, tied_pct
            ),
            (true, false) => format!(
                "{} tied at {}%. Your pick was a tied leader. AI picked Photo {} instead.",
                tied_list, tied_pct, ai_letter
            ),
            (false, true) => format!(
                "{} tied at {}%. You picked Photo {}. AI picked a tied leader.",
                tied_list, tied_pct, user_letter
            ),
            (false, false) => format!(
                "{} tied at {}%. You picked Photo {}. AI picked Photo {}. Nobody picked a leader.",
                tied_list, tied_pct, user_letter, ai_letter
            ),
        };
    }

    let crowd_fav = consensus.crowd_favorite.as_deref();
    let crowd_letter = crowd_fav.map(|id| display_letter(order, id)).unwrap_or('?');
    let crowd_pct = crowd_fav
        .and_then(|id| consensus.percentages.get(id).copied())
        .unwrap_or(0);
    let matched_crowd = crowd_fav == Some(visitor_pick);
    let matched_ai = visitor_pick == round.ai_pick;
    let ai_correct = crowd_fav == Some(round.ai_pick);

    match (matched_crowd, matched_ai, ai_correct) {
        (true, _, true) => format!(
            "You picked Photo {}, the crowd favorite. AI called it too.",
            user_letter
        ),
        (true, _, false) => format!(
            "You picked Photo {}, the crowd favorite. AI picked Photo {} instead.",
            user_letter, ai_letter
        ),
        (false, true, _) => format!(
            "You picked Photo {}, same as AI. The crowd went with Photo {} ({}%).",
            user_letter, crowd_letter, crowd_pct
        ),
        (false, false, true) => format!(
            "You picked Photo {}. The crowd went with Photo {} ({}%). AI saw it coming.",
            user_letter, crowd_letter, crowd_pct
        ),
        (false, false, false) => format!(
            "You picked Photo {}. The crowd went with Photo {} ({}%). AI picked Photo {}. Nobody agreed.",
            user_letter, crowd_letter, crowd_pct, ai_letter
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{ConsensusResult, Tally};
    use htl_common::rounds::round_by_id;

    /// Catalog order as display order: letters line up with item ids
    const CATALOG_ORDER: [&str; 4] = ["a", "b", "c", "d"];

    fn consensus_of(pairs: &[(&str, u64)]) -> ConsensusResult {
        let tally: Tally = pairs.iter().map(|(id, n)| (id.to_string(), *n)).collect();
        ConsensusResult::from_tally(&tally)
    }

    #[test]
    fn format_list_conjunctions() {
        assert_eq!(format_photo_list(&['A']), "Photo A");
        assert_eq!(format_photo_list(&['A', 'B']), "Photos A and B");
        assert_eq!(format_photo_list(&['A', 'B', 'C']), "Photos A, B, and C");
        assert_eq!(
            format_photo_list(&['A', 'B', 'C', 'D']),
            "Photos A, B, C, and D"
        );
    }

    #[test]
    fn convergence_round() {
        // round-1's AI pick is "a"; visitor and crowd agree
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 6), ("b", 2), ("c", 1), ("d", 1)]);
        let card = report_card(round, "a", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::Convergence);
        assert!(card.ai_correct);
        assert!(!card.tied);
        assert_eq!(card.personal_line, "You picked the crowd favorite.");
        assert_eq!(card.ai_line, "So did AI. All three converged this round.");
        assert_eq!(
            card.verdict_line,
            "The crowd picked Photo A with 60% of the vote. AI got it right."
        );
    }

    #[test]
    fn minority_pick_with_ai_correct() {
        // Visitor picked "b"; AI pick "a" is the crowd favorite
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 7), ("b", 1), ("c", 1), ("d", 1)]);
        let card = report_card(round, "b", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::AiCalledIt);
        assert!(card.ai_correct, "verdict must state AI got it right");
        assert_eq!(
            card.personal_line,
            "You went a different direction. Only 10% agreed with you."
        );
        assert!(card.verdict_line.ends_with("AI got it right."));
    }

    #[test]
    fn visitor_and_ai_against_the_crowd() {
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 2), ("b", 0), ("c", 7), ("d", 1)]);
        let card = report_card(round, "a", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::AiWithoutCrowd);
        assert!(!card.ai_correct);
        assert_eq!(
            card.ai_line,
            "Interestingly, AI picked the same photo you did. But the crowd went elsewhere."
        );
        assert_eq!(card.closing_line, "This round, it couldn't.");
    }

    #[test]
    fn crowd_match_without_ai() {
        // round-3's AI pick is "c"; visitor and crowd favor "b"
        let round = round_by_id("round-3").unwrap();
        let consensus = consensus_of(&[("a", 1), ("b", 5), ("c", 2), ("d", 0)]);
        let card = report_card(round, "b", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::CrowdWithoutAi);
        assert_eq!(
            card.ai_line,
            "AI picked something different. It predicted Photo C would be the most popular."
        );
    }

    #[test]
    fn nobody_agreed() {
        // Crowd favors "d"; visitor picked "b"; round-1 AI pick "a"
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 1), ("b", 1), ("c", 0), ("d", 6)]);
        let card = report_card(round, "b", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::NobodyAgreed);
        assert!(!card.ai_correct);
        assert_eq!(
            card.ai_line,
            "AI predicted Photo A. The crowd picked something else entirely."
        );
    }

    #[test]
    fn tie_shared_pick() {
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 4), ("b", 4), ("c", 0), ("d", 0)]);
        assert!(consensus.tied);
        let card = report_card(round, "a", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::TieSharedPick);
        assert!(card.ai_correct, "tie-inclusive: AI on a leader counts");
        assert_eq!(
            card.verdict_line,
            "Photos A and B tied at 50% each. AI picked a tied leader."
        );
    }

    #[test]
    fn tie_ai_missed_split() {
        // Leaders b and c; visitor on b; round-1 AI pick "a" not among them
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 1), ("b", 3), ("c", 3), ("d", 0)]);
        let card = report_card(round, "b", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::TieAiMissedSplit);
        assert!(!card.ai_correct);
        assert_eq!(
            card.personal_line,
            "The crowd was split this round, but your pick was one of the tied leaders."
        );
        assert_eq!(
            card.closing_line,
            "This round, the crowd was split and AI missed entirely."
        );
    }

    #[test]
    fn tie_both_missed() {
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 0), ("b", 2), ("c", 2), ("d", 1)]);
        let card = report_card(round, "d", &consensus, &CATALOG_ORDER);

        assert_eq!(card.kind, CardKind::TieBothMissed);
        assert_eq!(
            card.ai_line,
            "AI predicted Photo A. It wasn't among the leaders either."
        );
    }

    #[test]
    fn three_way_tie_list_formatting() {
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 2), ("b", 2), ("c", 2), ("d", 0)]);
        let card = report_card(round, "d", &consensus, &CATALOG_ORDER);
        assert!(card.verdict_line.starts_with("Photos A, B, and C tied at 33% each."));
    }

    #[test]
    fn no_votes_is_total() {
        let round = round_by_id("round-1").unwrap();
        let consensus = consensus_of(&[("a", 0), ("b", 0), ("c", 0), ("d", 0)]);
        let card = report_card(round, "a", &consensus, &CATALOG_ORDER);
        // No favorite to name; never panics
        assert!(!card.tied);
        assert!(!card.ai_correct);
        assert!(card.verdict_line.contains("0%"));
    }

    #[test]
    fn letters_follow_display_order_not_catalog_order() {
        let round = round_by_id("round-1").unwrap();
        // Visitor saw d first, so "d" is their Photo A
        let order = ["d", "c", "b", "a"];
        let consensus = consensus_of(&[("a", 0), ("b", 1), ("c", 0), ("d", 5)]);
        let card = report_card(round, "b", &consensus, &order);
        assert!(
            card.verdict_line.starts_with("The crowd picked Photo A"),
            "crowd favorite d sits at display position A: {}",
            card.verdict_line
        );
    }

    #[test]
    fn story_lines() {
        let round = round_by_id("round-1").unwrap();

        let plain = consensus_of(&[("a", 6), ("b", 1), ("c", 1), ("d", 0)]);
        assert_eq!(
            round_story(round, "a", &plain, &CATALOG_ORDER),
            "You picked Photo A, the crowd favorite. AI called it too."
        );
        assert_eq!(
            round_story(round, "b", &plain, &CATALOG_ORDER),
            "You picked Photo B. The crowd went with Photo A (75%). AI saw it coming."
        );

        let tied = consensus_of(&[("a", 3), ("b", 3), ("c", 1), ("d", 0)]);
        assert_eq!(
            round_story(round, "c", &tied, &CATALOG_ORDER),
            "Photos A and B tied at 43%. You picked Photo C. AI picked a tied leader."
        );
    }
}
