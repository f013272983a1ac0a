// matcher/reconcile.rs

use std::collections::{BTreeMap, BTreeSet};
use log::trace;

use super::types::{CandidateMention, MentionLink, MentionResult};

/// Group candidates by surface text. The first link seen for a span wins;
/// callers pass case-sensitive candidates before reconstructed ones.
pub fn collapse<I>(candidates: I) -> BTreeMap<String, MentionLink>
where
    I: IntoIterator<Item = CandidateMention>,
{
    let mut spans = BTreeMap::new();
    for candidate in candidates {
        let link = candidate.link();
        spans.entry(candidate.surface_span).or_insert(link);
    }
    spans
}

/// Keys that stand alone as a token of some multi-token key.
pub fn covered_spans(spans: &BTreeMap<String, MentionLink>) -> BTreeSet<String> {
    let mut covered = BTreeSet::new();
    for span in spans.keys().filter(|s| s.contains(char::is_whitespace)) {
        for part in span.split_whitespace() {
            if spans.contains_key(part) {
                trace!("{:?} is covered by {:?}", part, span);
                covered.insert(part.to_string());
            }
        }
    }
    covered
}

/// Drop covered single-token spans in one pass and freeze the result
pub fn suppress_covered(spans: BTreeMap<String, MentionLink>) -> MentionResult {
    let covered = covered_spans(&spans);
    spans
        .into_iter()
        .filter(|(span, _)| !covered.contains(span))
        .collect::<BTreeMap<_, _>>()
        .into()
}

/// Collapse, then suppress
pub fn assemble<I>(candidates: I) -> MentionResult
where
    I: IntoIterator<Item = CandidateMention>,
{
    suppress_covered(collapse(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::types::MatchOrigin;

    fn candidate(span: &str, entity: &str, source: &str) -> CandidateMention {
        CandidateMention {
            surface_span: span.to_string(),
            start_index: 0,
            token_count: span.split_whitespace().count(),
            entity_id: entity.into(),
            source_database: source.into(),
            origin: MatchOrigin::CaseSensitiveExact,
        }
    }

    #[test]
    fn first_seen_link_wins() {
        let spans = collapse(vec![
            candidate("Coxiella", "e1", "UniProt"),
            candidate("Coxiella", "e9", "MeSH"),
        ]);
        assert_eq!(spans["Coxiella"], MentionLink::new("e1", "UniProt"));
    }

    #[test]
    fn covered_tokens_are_removed_in_one_pass() {
        let result = assemble(vec![
            candidate("New", "n", "wiki"),
            candidate("York", "y", "wiki"),
            candidate("New York", "ny", "wiki"),
            candidate("New York City", "nyc", "wiki"),
            candidate("Boston", "b", "wiki"),
        ]);
        let spans: Vec<&str> = result.spans().collect();
        // Multi-token spans are never removed, even when nested
        assert_eq!(spans, vec!["Boston", "New York", "New York City"]);
    }
}
