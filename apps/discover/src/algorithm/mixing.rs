use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::pet::{PetCategory, PetKeywordProfile};

/// Weights for the term-mixing score. All sources are summed per distinct term,
/// then terms that already produced saved goods are multiplied by `repeat_penalty`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixingWeights {
    /// Per occurrence in the search history.
    pub history: f64,
    /// Extra weight scaled by history position; the newest entry gets the full bonus.
    pub history_recency: f64,
    /// Per profile keyword.
    pub keyword: f64,
    /// Per occurrence among saved-goods search terms.
    pub saved_goods: f64,
    pub repeat_penalty: f64,
}

impl Default for MixingWeights {
    fn default() -> Self {
        Self {
            history: 1.0,
            history_recency: 0.5,
            keyword: 1.2,
            saved_goods: 0.3,
            repeat_penalty: 0.5,
        }
    }
}

struct Candidate {
    term: String,
    score: f64,
}

/// Blends search history, profile keywords and saved-goods terms into at most
/// `count` distinct recommended search terms.
///
/// The result is in priority order: index 0 is the term that should be searched
/// first. Ties keep first-appearance order (history, then keywords, then saved goods).
pub fn mix_search_terms(
    history: &[String],
    profile: &PetKeywordProfile,
    recent_goods_terms: &[String],
    count: usize,
    weights: &MixingWeights,
) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut bump = |raw: &str, amount: f64| {
        let term = normalize_term(raw);
        if term.is_empty() {
            return;
        }
        let key = term.to_lowercase();
        match index.get(&key) {
            Some(&i) => candidates[i].score += amount,
            None => {
                index.insert(key, candidates.len());
                candidates.push(Candidate {
                    term,
                    score: amount,
                });
            }
        }
    };

    let history_len = history.len() as f64;
    for (i, word) in history.iter().enumerate() {
        let recency = (i + 1) as f64 / history_len;
        bump(word, weights.history + weights.history_recency * recency);
    }
    for keyword in &profile.keywords {
        bump(keyword, weights.keyword);
    }
    for word in recent_goods_terms {
        bump(word, weights.saved_goods);
    }

    let already_shown: Vec<String> = recent_goods_terms
        .iter()
        .map(|t| normalize_term(t).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    for candidate in &mut candidates {
        if already_shown.contains(&candidate.term.to_lowercase()) {
            candidate.score *= weights.repeat_penalty;
        }
    }

    // stable sort keeps first-appearance order among equal scores
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates
        .into_iter()
        .take(count)
        .map(|c| c.term)
        .collect()
}

/// Tags each term with the pet's search label, preserving order.
/// Terms that already mention the label are left alone.
pub fn combine_with_category(pet: PetCategory, terms: &[String]) -> Vec<String> {
    let label = pet.search_label();
    terms
        .iter()
        .map(|term| {
            let term = normalize_term(term);
            if term.is_empty() || term.contains(label) {
                term
            } else {
                format!("{label} {term}")
            }
        })
        .collect()
}

/// Inverse of `combine_with_category` for one term: drops a leading pet label.
pub fn strip_category(pet: PetCategory, term: &str) -> String {
    let term = normalize_term(term);
    match term.strip_prefix(pet.search_label()) {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim().to_string(),
        _ => term,
    }
}

fn normalize_term(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
