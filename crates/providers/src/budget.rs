//! Token budget estimation and history truncation.
//!
//! Token counts are a cheap approximation (4 characters per unit), not a real
//! tokenizer. The estimator's job is keeping prompts under a provider's
//! ceiling, not accounting accuracy.

use shared::chat::ConversationTurn;

/// Allowance reserved for the system prompt.
pub const SYSTEM_PROMPT_RESERVE: usize = 600;
/// Allowance reserved for the current user prompt.
pub const PROMPT_RESERVE: usize = 500;

/// ceil(chars / 4).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

fn turn_tokens(turn: &ConversationTurn) -> usize {
    let code = turn.code.as_deref().map(estimate_tokens).unwrap_or(0);
    estimate_tokens(&turn.text) + code
}

/// Copy of `history` that fits within `ceiling`, reserves included.
///
/// Walks newest-first, greedily including whole turns until the history
/// budget (ceiling minus reserves) would be exceeded. If not even the newest
/// turn fits but budget remains, that single turn is character-truncated and
/// tagged. Relative order of included turns is preserved; the input is never
/// mutated. A ceiling at or under the reserves yields an empty history.
pub fn truncate(history: &[ConversationTurn], ceiling: usize) -> Vec<ConversationTurn> {
    let budget = ceiling.saturating_sub(SYSTEM_PROMPT_RESERVE + PROMPT_RESERVE);
    if budget == 0 {
        return Vec::new();
    }

    let mut included: Vec<ConversationTurn> = Vec::new();
    let mut used = 0usize;
    for turn in history.iter().rev() {
        let cost = turn_tokens(turn);
        if used + cost > budget {
            break;
        }
        used += cost;
        included.push(turn.clone());
    }

    if included.is_empty() {
        if let Some(newest) = history.last() {
            let mut cut = newest.clone();
            // Drop attached code first; it is the bulk of an oversized turn.
            cut.code = None;
            let max_chars = budget * 4;
            if cut.text.chars().count() > max_chars {
                cut.text = cut.text.chars().take(max_chars).collect();
            }
            cut.truncated = true;
            return vec![cut];
        }
        return Vec::new();
    }

    included.reverse();
    included
}

/// Budget used for the same-provider retry after a quota rejection: half the
/// ceiling, so a prompt-too-long condition cannot recur.
pub fn aggressive_ceiling(ceiling: usize) -> usize {
    ceiling / 2
}
