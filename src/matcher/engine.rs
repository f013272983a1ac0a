// matcher/engine.rs

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use log::{debug, info};

use crate::config::subsystems::MatcherConfig;
use crate::error::{Error, Result};
use crate::index::{EntityLookup, IndexEntry};
use crate::parser::{MentionTokenizer, TextTokenizer, Token};
use crate::storage::IndexLevel;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};
use super::candidates::{case_insensitive_query, case_sensitive_query, exact_candidates, reconstructed_candidates};
use super::reconcile::assemble;
use super::types::MentionResult;

type Hits = BTreeMap<String, Vec<IndexEntry>>;

#[derive(Debug, Clone, Copy)]
enum LookupKind {
    CaseSensitive,
    FirstToken,
}

impl LookupKind {
    fn label(&self) -> &'static str {
        match self {
            LookupKind::CaseSensitive => "case-sensitive alias lookup",
            LookupKind::FirstToken => "first-token lookup",
        }
    }

    fn run<L: EntityLookup + ?Sized>(&self, index: &L, query: &BTreeSet<String>) -> Result<Hits> {
        match self {
            LookupKind::CaseSensitive => index.lookup_exact_case_sensitive(query, IndexLevel::Aliases),
            LookupKind::FirstToken => index.lookup_exact_first_token(query, IndexLevel::CiAliases),
        }
    }
}

/// Finds entity mentions in free text.
///
/// The matcher keeps no per-query state; one instance serves any number of
/// concurrent queries against the same index.
pub struct MentionMatcher<L: ?Sized> {
    index: Arc<L>,
    tokenizer: MentionTokenizer,
    retry: RetryPolicy,
}

impl<L> MentionMatcher<L>
where
    L: EntityLookup + ?Sized + 'static,
{
    pub fn new(index: Arc<L>, tokenizer: MentionTokenizer, config: &MatcherConfig) -> Self {
        Self {
            index,
            tokenizer,
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn tokenizer(&self) -> &MentionTokenizer {
        &self.tokenizer
    }

    /// Resolve every mention in `text`.
    ///
    /// Both lookups run concurrently. If either fails or times out after
    /// all retries the whole call fails with `Error::IndexUnavailable`.
    pub async fn find_mentions(&self, text: &str) -> Result<MentionResult> {
        let start_time = Instant::now();
        let tokens = self.tokenizer.tokenize(text);
        let cs_query = case_sensitive_query(&self.tokenizer, &tokens);
        let ci_query = case_insensitive_query(&self.tokenizer, &tokens);

        if cs_query.is_empty() && ci_query.is_empty() {
            debug!("No lookup tokens in query of {} tokens", tokens.len());
            return Ok(MentionResult::new());
        }

        let (cs_hits, ci_hits) = tokio::try_join!(
            self.lookup(LookupKind::CaseSensitive, cs_query),
            self.lookup(LookupKind::FirstToken, ci_query),
        )?;

        let result = resolve_mentions(&tokens, &cs_hits, &ci_hits);
        info!(
            "NER found {} mentions in {} tokens (took {:?})",
            result.len(),
            tokens.len(),
            start_time.elapsed()
        );
        Ok(result)
    }

    async fn lookup(&self, kind: LookupKind, query: BTreeSet<String>) -> Result<Hits> {
        if query.is_empty() {
            return Ok(BTreeMap::new());
        }
        let query = Arc::new(query);

        retry_with_backoff(&self.retry, kind.label(), || {
            let index = Arc::clone(&self.index);
            let query = Arc::clone(&query);
            async move {
                tokio::task::spawn_blocking(move || kind.run(&*index, &query)).await?
            }
        })
        .await
        .map_err(|e| match e {
            Error::IndexUnavailable(_) => e,
            other => Error::index_unavailable(format!("{} failed: {}", kind.label(), other)),
        })
    }
}

/// Turn the two lookup results into the final mention set.
///
/// Case-sensitive candidates are generated first, so on a shared span
/// they take precedence over reconstructed ones.
pub fn resolve_mentions(tokens: &[Token], case_sensitive: &Hits, first_token: &Hits) -> MentionResult {
    let exact = exact_candidates(tokens, case_sensitive);
    let rebuilt = reconstructed_candidates(tokens, first_token);
    debug!("{} exact and {} reconstructed candidates", exact.len(), rebuilt.len());
    assemble(exact.into_iter().chain(rebuilt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::matcher::MentionLink;
    use crate::storage::{MemoryStorage, RecordTable, StorageBackend, StorageStats};

    fn matcher<S: StorageBackend + 'static>(storage: S) -> MentionMatcher<S> {
        let config = MatcherConfig {
            lookup_timeout_ms: 200,
            lookup_retry_attempts: 2,
            retry_base_delay_ms: 1,
        };
        MentionMatcher::new(Arc::new(storage), MentionTokenizer::new_with_defaults(), &config)
    }

    fn alias(storage: &MemoryStorage, token: &str, location: &str, source: &str) {
        storage
            .store_postings_batch(IndexLevel::Aliases, &[(token.to_string(), IndexEntry::encode_alias(location, source))])
            .unwrap();
    }

    fn first_token(storage: &MemoryStorage, name: &str, location: &str, source: &str) {
        let token = name.to_lowercase().split_whitespace().next().unwrap().to_string();
        storage
            .store_postings_batch(IndexLevel::CiAliases, &[(token, IndexEntry::encode_first_token(location, source, name))])
            .unwrap();
    }

    #[tokio::test]
    async fn scenario_a_case_sensitive_alias() {
        let storage = MemoryStorage::new();
        alias(&storage, "Coxiella", "uniprot:entity1", "UniProt");

        let result = matcher(storage).find_mentions("Infection with Coxiella burnetii").await.unwrap();
        assert_eq!(result.get("Coxiella"), Some(&MentionLink::new("entity1", "UniProt")));
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn scenario_b_and_c_reconstruction_covers_single_tokens() {
        let storage = MemoryStorage::new();
        first_token(&storage, "Biological process", "go:entity2", "GO");
        alias(&storage, "Process", "wiki:Process", "Wikipedia");

        let result = matcher(storage).find_mentions("the Biological Process model").await.unwrap();
        assert_eq!(result.get("Biological Process"), Some(&MentionLink::new("entity2", "GO")));
        assert!(!result.contains_span("Biological"));
        assert!(!result.contains_span("Process"));
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn scenario_d_short_numbers_never_looked_up() {
        let storage = MemoryStorage::new();
        alias(&storage, "12345", "misc:n1", "Misc");
        let matcher = matcher(storage);

        let result = matcher.find_mentions("12345").await.unwrap();
        assert!(result.is_empty());
        assert_eq!(matcher.index.metrics().get_stats().read_operations, 0);
    }

    #[tokio::test]
    async fn short_number_inside_a_reconstructed_name() {
        let storage = MemoryStorage::new();
        first_token(&storage, "Interleukin 6", "uniprot:P05231", "UniProt");
        let matcher = matcher(storage);

        let tokens = matcher.tokenizer().tokenize("serum Interleukin 6 levels");
        let cs_query = case_sensitive_query(matcher.tokenizer(), &tokens);
        let ci_query = case_insensitive_query(matcher.tokenizer(), &tokens);
        assert!(!cs_query.contains("6"));
        assert!(!ci_query.contains("6"));
        assert!(ci_query.contains("interleukin"));

        let result = matcher.find_mentions("serum Interleukin 6 levels").await.unwrap();
        assert_eq!(result.get("Interleukin 6"), Some(&MentionLink::new("P05231", "UniProt")));
        assert!(!result.contains_span("6"));
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn scenario_e_empty_index_gives_empty_result() {
        let result = matcher(MemoryStorage::new()).find_mentions("nothing to see here").await.unwrap();
        assert!(result.is_empty());

        let blank = matcher(MemoryStorage::new()).find_mentions("   ").await.unwrap();
        assert!(blank.is_empty());
    }

    #[tokio::test]
    async fn stored_name_round_trips() {
        let storage = MemoryStorage::new();
        first_token(&storage, "Tumor necrosis factor", "uniprot:P01375", "UniProt");

        let result = matcher(storage).find_mentions("Tumor necrosis factor").await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("Tumor necrosis factor"), Some(&MentionLink::new("P01375", "UniProt")));
    }

    #[tokio::test]
    async fn case_sensitive_hit_wins_a_shared_span() {
        let storage = MemoryStorage::new();
        alias(&storage, "TNF", "uniprot:P01375", "UniProt");
        first_token(&storage, "TNF", "mesh:D014409", "MeSH");

        let result = matcher(storage).find_mentions("TNF levels").await.unwrap();
        assert_eq!(result.get("TNF"), Some(&MentionLink::new("P01375", "UniProt")));
    }

    struct UnreachableIndex {
        calls: AtomicUsize,
    }

    impl StorageBackend for UnreachableIndex {
        fn store_postings_batch(&self, _: IndexLevel, _: &[(String, Vec<u8>)]) -> Result<()> {
            Ok(())
        }

        fn get_postings_batch(&self, _: IndexLevel, _: &BTreeSet<String>) -> Result<BTreeMap<String, Vec<Vec<u8>>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::storage("connection refused"))
        }

        fn get_postings_by_prefix(&self, _: IndexLevel, _: &str) -> Result<Vec<Vec<u8>>> {
            Ok(Vec::new())
        }

        fn store_records_batch(&self, _: RecordTable, _: &[(String, Vec<u8>)]) -> Result<()> {
            Ok(())
        }

        fn get_records_batch(&self, _: RecordTable, _: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
            Ok(Vec::new())
        }

        fn token_frequencies(&self, _: IndexLevel) -> Result<Vec<(String, u64)>> {
            Ok(Vec::new())
        }

        fn get_stats(&self) -> Result<StorageStats> {
            Ok(StorageStats::default())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn unreachable_index_fails_the_whole_query() {
        let matcher = matcher(UnreachableIndex { calls: AtomicUsize::new(0) });
        let result = matcher.find_mentions("Coxiella burnetii").await;
        assert!(matches!(result, Err(Error::IndexUnavailable(_))));
        // Two attempts for at least the lookup that failed first
        assert!(matcher.index.calls.load(Ordering::SeqCst) >= 2);
    }
}
