use std::collections::HashMap;
use parking_lot::RwLock;
use crate::core::error::Result;
use crate::index::store::PostingStore;

/// Per-field collection statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStatistics {
    pub collection_length: u64,  // Total tokens in the field
    pub doc_count: u64,          // Documents having the field
    pub avg_field_length: f64,
}

/// Collection statistics computed once per field and reused across every
/// query in a run, plus a memo of collection term frequencies.
///
/// Entries are written once per key and read thereafter; the locks only
/// make the cache safe to share between threads.
#[derive(Debug, Default)]
pub struct CollectionStats {
    fields: RwLock<HashMap<String, FieldStatistics>>,
    ctf_memo: RwLock<HashMap<(String, String), u64>>,  // (field, term) -> ctf
}

impl CollectionStats {
    pub fn new() -> Self {
        CollectionStats::default()
    }

    pub fn field(&self, store: &dyn PostingStore, field: &str) -> Result<FieldStatistics> {
        if let Some(stats) = self.fields.read().get(field) {
            return Ok(*stats);
        }

        let collection_length = store.collection_length(field)?;
        let doc_count = store.doc_count(field)?;
        let avg_field_length = if doc_count > 0 {
            collection_length as f64 / doc_count as f64
        } else {
            0.0
        };
        let stats = FieldStatistics {
            collection_length,
            doc_count,
            avg_field_length,
        };

        self.fields.write().insert(field.to_string(), stats);
        Ok(stats)
    }

    pub fn avg_field_length(&self, store: &dyn PostingStore, field: &str) -> Result<f64> {
        Ok(self.field(store, field)?.avg_field_length)
    }

    pub fn collection_length(&self, store: &dyn PostingStore, field: &str) -> Result<u64> {
        Ok(self.field(store, field)?.collection_length)
    }

    /// Collection term frequency, looked up in the store at most once per (term, field).
    pub fn ctf(&self, store: &dyn PostingStore, term: &str, field: &str) -> Result<u64> {
        let key = (field.to_string(), term.to_string());
        if let Some(ctf) = self.ctf_memo.read().get(&key) {
            return Ok(*ctf);
        }

        let ctf = store.total_term_freq(term, field)?;
        self.ctf_memo.write().insert(key, ctf);
        Ok(ctf)
    }

    /// Seed the memo from a value already at hand (e.g. an evaluated inverted list).
    pub fn remember_ctf(&self, term: &str, field: &str, ctf: u64) {
        self.ctf_memo.write()
            .entry((field.to_string(), term.to_string()))
            .or_insert(ctf);
    }

    pub fn cached_fields(&self) -> usize {
        self.fields.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use crate::core::types::DocId;
    use crate::index::posting::InvertedList;
    use crate::index::store::TermVector;

    /// Store stub that counts statistics lookups.
    #[derive(Default)]
    struct CountingStore {
        length_calls: Cell<usize>,
        ctf_calls: Cell<usize>,
    }

    impl PostingStore for CountingStore {
        fn postings(&self, _term: &str, field: &str) -> Result<InvertedList> {
            Ok(InvertedList::new(field))
        }
        fn doc_length(&self, _field: &str, _doc_id: DocId) -> Result<u64> {
            Ok(10)
        }
        fn collection_length(&self, _field: &str) -> Result<u64> {
            self.length_calls.set(self.length_calls.get() + 1);
            Ok(300)
        }
        fn doc_count(&self, _field: &str) -> Result<u64> {
            Ok(4)
        }
        fn num_docs(&self) -> u64 {
            5
        }
        fn total_term_freq(&self, _term: &str, _field: &str) -> Result<u64> {
            self.ctf_calls.set(self.ctf_calls.get() + 1);
            Ok(7)
        }
        fn term_vector(&self, _doc_id: DocId, _field: &str) -> Result<Option<TermVector>> {
            Ok(None)
        }
        fn stored_field(&self, _doc_id: DocId, _name: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn external_id(&self, doc_id: DocId) -> Result<String> {
            Ok(doc_id.to_string())
        }
        fn internal_id(&self, external_id: &str) -> Result<DocId> {
            Ok(DocId(external_id.parse().unwrap_or(0)))
        }
    }

    #[test]
    fn test_field_stats_computed_once() {
        let store = CountingStore::default();
        let stats = CollectionStats::new();
        for _ in 0..3 {
            let f = stats.field(&store, "body").unwrap();
            assert_eq!(f.avg_field_length, 75.0);
        }
        assert_eq!(store.length_calls.get(), 1);
        stats.field(&store, "title").unwrap();
        assert_eq!(stats.cached_fields(), 2);
    }

    #[test]
    fn test_ctf_memoized() {
        let store = CountingStore::default();
        let stats = CollectionStats::new();
        assert_eq!(stats.ctf(&store, "air", "body").unwrap(), 7);
        assert_eq!(stats.ctf(&store, "air", "body").unwrap(), 7);
        assert_eq!(store.ctf_calls.get(), 1);

        stats.remember_ctf("smog", "body", 3);
        assert_eq!(stats.ctf(&store, "smog", "body").unwrap(), 3);
        assert_eq!(store.ctf_calls.get(), 1);
    }
}
