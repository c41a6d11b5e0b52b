//! Fuzzy entity resolution for spoken-style device names.
//!
//! Users say "the bedroom lamps"; the hub knows `light.bedroom_left` with a
//! friendly name of "Bedroom Left Lamp". Resolution folds both sides into a
//! normalized form and then matches by substring or keyword overlap.

use hearth_hub::EntityState;

/// Stop-words dropped from keyword matching.
const STOP_WORDS: [&str; 3] = ["and", "or", "the"];

/// Fold text into its comparable form: underscores become spaces,
/// punctuation is dropped, case and runs of whitespace collapse, and one
/// trailing plural `s` comes off. Idempotent, so already-normalized text
/// passes through unchanged.
pub fn normalize_text(input: &str) -> String {
    let lowered = input.replace('_', " ").to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars: Vec<char> = collapsed.chars().collect();
    // Plural fold. Skipped when the preceding char is another `s` or a
    // space, which keeps normalization idempotent ("glass" stays "glass").
    let plural = matches!(
        chars.as_slice(),
        [.., prev, 's'] if prev.is_alphanumeric() && *prev != 's'
    );
    if chars.len() > 3 && plural {
        chars.pop();
    }
    chars.into_iter().collect()
}

/// Select the candidates a name filter refers to.
///
/// No filter (or a filter that normalizes to nothing) selects everything.
/// Filters of one or two words select every match; three or more words are
/// treated as naming one specific device, so only the best match survives.
pub fn resolve<'a>(filter: Option<&str>, candidates: &'a [EntityState]) -> Vec<&'a EntityState> {
    let filter_norm = match filter.map(normalize_text) {
        Some(f) if !f.is_empty() => f,
        _ => return candidates.iter().collect(),
    };

    let matched: Vec<&EntityState> = candidates
        .iter()
        .filter(|c| matches_filter(&filter_norm, c))
        .collect();

    if filter_norm.split_whitespace().count() >= 3 && matched.len() > 1 {
        return narrow_to_best(&filter_norm, &matched);
    }
    matched
}

/// One candidate against the normalized filter. Substring containment in
/// either direction wins, as does containment in the entity id; failing
/// that, every keyword (two or more) must appear in the name.
fn matches_filter(filter_norm: &str, candidate: &EntityState) -> bool {
    let name_norm = normalize_text(candidate.display_name());
    let id_norm = normalize_text(&candidate.entity_id);

    if name_norm.contains(filter_norm)
        || filter_norm.contains(&name_norm)
        || id_norm.contains(filter_norm)
    {
        return true;
    }

    let keywords = keyword_tokens(filter_norm);
    keywords.len() >= 2 && keywords.iter().all(|k| name_norm.contains(k))
}

/// Filter tokens that carry meaning: stop-words and pure-numeric tokens
/// are dropped.
fn keyword_tokens(filter_norm: &str) -> Vec<&str> {
    filter_norm
        .split_whitespace()
        .filter(|t| !STOP_WORDS.contains(t))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Pick the single candidate with the most filter tokens in its name.
/// Equal scores fall back to the lexically smallest entity id, so the
/// outcome never depends on listing order.
fn narrow_to_best<'a>(filter_norm: &str, matched: &[&'a EntityState]) -> Vec<&'a EntityState> {
    let tokens: Vec<&str> = filter_norm.split_whitespace().collect();

    let mut best: Option<(&EntityState, usize)> = None;
    for candidate in matched {
        let name_norm = normalize_text(candidate.display_name());
        let score = tokens.iter().filter(|t| name_norm.contains(**t)).count();
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                score > current_score
                    || (score == current_score && candidate.entity_id < current.entity_id)
            }
        };
        if better {
            best = Some((candidate, score));
        }
    }
    best.map(|(c, _)| c).into_iter().collect()
}
