use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::posting::InvertedList;

/// One stem of a document's field, with the collection statistics of that stem.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVectorEntry {
    pub stem: String,
    pub tf: u32,   // Occurrences in this document's field
    pub df: u64,   // Documents containing the stem in this field
    pub ctf: u64,  // Occurrences across the collection
}

/// Random access view of a single document field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermVector {
    pub entries: Vec<TermVectorEntry>,
}

impl TermVector {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, stem: &str) -> Option<&TermVectorEntry> {
        self.entries.iter().find(|e| e.stem == stem)
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.stem.as_str())
    }
}

/// Access to the underlying inverted index and document store.
///
/// Implementations return `ErrorKind::NotFound` for unknown documents;
/// an unknown term is an empty list, not an error.
pub trait PostingStore {
    /// Postings for `term` in `field`, sorted by doc id.
    fn postings(&self, term: &str, field: &str) -> Result<InvertedList>;

    /// Number of tokens in `field` of `doc_id` (0 if the field is absent).
    fn doc_length(&self, field: &str, doc_id: DocId) -> Result<u64>;

    /// Total number of tokens in `field` across the collection.
    fn collection_length(&self, field: &str) -> Result<u64>;

    /// Number of documents having a non-empty `field`.
    fn doc_count(&self, field: &str) -> Result<u64>;

    /// Number of documents in the collection.
    fn num_docs(&self) -> u64;

    /// Collection term frequency of `term` in `field`.
    fn total_term_freq(&self, term: &str, field: &str) -> Result<u64>;

    /// Term vector of `field` for `doc_id`, `None` if the document lacks the field.
    fn term_vector(&self, doc_id: DocId, field: &str) -> Result<Option<TermVector>>;

    /// Stored (non-indexed) attribute such as `rawUrl` or the spam `score`.
    fn stored_field(&self, doc_id: DocId, name: &str) -> Result<Option<String>>;

    fn external_id(&self, doc_id: DocId) -> Result<String>;

    fn internal_id(&self, external_id: &str) -> Result<DocId>;
}
