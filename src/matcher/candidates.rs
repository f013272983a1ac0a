// matcher/candidates.rs

use std::collections::{BTreeMap, BTreeSet};
use log::trace;

use crate::index::IndexEntry;
use crate::parser::{MentionTokenizer, TextTokenizer, Token};
use super::types::{CandidateMention, MatchOrigin};

/// Original-case lookup set: every token that passes the numeric filter
pub fn case_sensitive_query(tokenizer: &MentionTokenizer, tokens: &[Token]) -> BTreeSet<String> {
    tokenizer
        .index_tokens(tokens)
        .into_iter()
        .map(|t| t.surface.clone())
        .collect()
}

/// Lower-cased lookup set for the first-token level
pub fn case_insensitive_query(tokenizer: &MentionTokenizer, tokens: &[Token]) -> BTreeSet<String> {
    tokenizer
        .index_tokens(tokens)
        .into_iter()
        .map(|t| t.lowered.clone())
        .collect()
}

/// Width-one candidates at every position whose original token is a hit.
pub fn exact_candidates(tokens: &[Token], hits: &BTreeMap<String, Vec<IndexEntry>>) -> Vec<CandidateMention> {
    let mut candidates = Vec::new();
    for (token, entries) in hits {
        for entry in entries {
            for position in tokens.iter().filter(|t| &t.surface == token).map(|t| t.position) {
                candidates.push(CandidateMention {
                    surface_span: token.clone(),
                    start_index: position,
                    token_count: 1,
                    entity_id: entry.entity_id.clone(),
                    source_database: entry.source_database.clone(),
                    origin: MatchOrigin::CaseSensitiveExact,
                });
            }
        }
    }
    candidates
}

/// Candidates rebuilt from first-token hits.
///
/// The embedded full name is split and lower-cased; every query position
/// holding the hit token starts a window that must equal the name token by
/// token. Matching windows are emitted with their original-case text.
pub fn reconstructed_candidates(tokens: &[Token], hits: &BTreeMap<String, Vec<IndexEntry>>) -> Vec<CandidateMention> {
    let mut candidates = Vec::new();
    for (lower_token, entries) in hits {
        for entry in entries {
            let Some(name) = entry.embedded_name.as_deref() else {
                continue;
            };
            let name_tokens: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
            if name_tokens.is_empty() {
                continue;
            }

            for start in tokens.iter().filter(|t| &t.lowered == lower_token).map(|t| t.position) {
                let end = start + name_tokens.len();
                if end > tokens.len() {
                    continue;
                }
                let window = &tokens[start..end];
                if !window.iter().zip(&name_tokens).all(|(t, n)| &t.lowered == n) {
                    continue;
                }

                let surface_span = window
                    .iter()
                    .map(|t| t.surface.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                trace!("Reconstructed {:?} from {:?}", surface_span, name);
                candidates.push(CandidateMention {
                    surface_span,
                    start_index: start,
                    token_count: name_tokens.len(),
                    entity_id: entry.entity_id.clone(),
                    source_database: entry.source_database.clone(),
                    origin: MatchOrigin::CaseInsensitiveReconstructed,
                });
            }
        }
    }
    candidates
}
