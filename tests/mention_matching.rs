mod common;

use std::sync::Arc;
use tempfile::TempDir;
use translatron::{
    config::subsystems::MatcherConfig,
    parser::{MentionTokenizer, TextTokenizer},
    MentionLink, MentionMatcher,
};

fn matcher(dir: &TempDir) -> MentionMatcher<translatron::storage::LMDBStorage> {
    MentionMatcher::new(common::build_index(dir), MentionTokenizer::new_with_defaults(), &MatcherConfig::default())
}

#[tokio::test]
async fn finds_case_sensitive_and_reconstructed_mentions() {
    let dir = TempDir::new().unwrap();
    let matcher = matcher(&dir);

    let result = matcher
        .find_mentions("Infection with Coxiella burnetii changes the Biological Process model")
        .await
        .unwrap();

    assert_eq!(result.get("Coxiella"), Some(&MentionLink::new("entity1", "UniProt")));
    assert_eq!(result.get("Biological Process"), Some(&MentionLink::new("entity2", "GO")));
    assert!(!result.contains_span("Process"));
    assert!(!result.contains_span("Biological"));
}

#[tokio::test]
async fn short_numbers_are_ignored_even_when_indexed() {
    let dir = TempDir::new().unwrap();
    let result = matcher(&dir).find_mentions("12345").await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn spans_are_joins_of_query_tokens() {
    let dir = TempDir::new().unwrap();
    let matcher = matcher(&dir);
    let text = "flights   to New\tYork and York, then new york again";

    let result = matcher.find_mentions(text).await.unwrap();
    let tokens: Vec<String> = matcher.tokenizer().tokenize(text).into_iter().map(|t| t.surface).collect();

    for span in result.spans() {
        let width = span.split(' ').count();
        let is_join = tokens.windows(width).any(|w| w.join(" ") == span);
        assert!(is_join, "{:?} is not a token join", span);
    }
    assert!(result.contains_span("New York"));
    assert!(result.contains_span("new york"));
    // "York" is a token of an accepted multi-token span
    assert!(!result.contains_span("York"));
}

#[tokio::test]
async fn concurrent_queries_share_one_matcher() {
    let dir = TempDir::new().unwrap();
    let matcher = Arc::new(matcher(&dir));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let matcher = Arc::clone(&matcher);
            tokio::spawn(async move {
                let text = if i % 2 == 0 { "Coxiella infection" } else { "biological process" };
                matcher.find_mentions(text).await
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let result = task.await.unwrap().unwrap();
        let expected = if i % 2 == 0 { "Coxiella" } else { "biological process" };
        assert!(result.contains_span(expected));
        assert_eq!(result.len(), 1);
    }
}
