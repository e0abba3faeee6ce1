use std::collections::{BTreeMap, HashMap};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::posting::{InvertedList, Posting};
use crate::index::store::{PostingStore, TermVector, TermVectorEntry};

/// A document to be indexed: analyzed fields plus stored attributes.
#[derive(Debug, Clone, Default)]
pub struct IndexDocument {
    pub external_id: String,
    pub fields: Vec<(String, String)>,
    pub stored: Vec<(String, String)>,
}

impl IndexDocument {
    pub fn new(external_id: impl Into<String>) -> Self {
        IndexDocument {
            external_id: external_id.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.push((name.into(), text.into()));
        self
    }

    pub fn stored(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.stored.push((name.into(), value.into()));
        self
    }
}

#[derive(Default)]
struct FieldIndex {
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: HashMap<DocId, u64>,
    total_length: u64,
}

struct StoredDocument {
    external_id: String,
    stored: HashMap<String, String>,
    field_terms: HashMap<String, BTreeMap<String, u32>>,  // field -> stem -> tf
}

/// In-memory posting store with positional postings per (term, field).
pub struct MemoryIndex {
    analyzer: Analyzer,
    fields: HashMap<String, FieldIndex>,
    documents: Vec<StoredDocument>,  // indexed by internal doc id
    external_ids: HashMap<String, DocId>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex::with_analyzer(Analyzer::english())
    }

    pub fn with_analyzer(analyzer: Analyzer) -> Self {
        MemoryIndex {
            analyzer,
            fields: HashMap::new(),
            documents: Vec::new(),
            external_ids: HashMap::new(),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn add_document(&mut self, doc: IndexDocument) -> Result<DocId> {
        if self.external_ids.contains_key(&doc.external_id) {
            return Err(Error::invalid_argument(format!(
                "duplicate external id '{}'", doc.external_id
            )));
        }

        let doc_id = DocId(self.documents.len() as u64);
        let mut field_terms = HashMap::new();

        // A field given more than once is indexed as one continuous text
        let mut field_texts: Vec<(&str, String)> = Vec::with_capacity(doc.fields.len());
        for (name, text) in &doc.fields {
            match field_texts.iter_mut().find(|(n, _)| *n == name.as_str()) {
                Some((_, joined)) => {
                    joined.push(' ');
                    joined.push_str(text);
                }
                None => field_texts.push((name.as_str(), text.clone())),
            }
        }

        for (field_name, text) in field_texts {
            let tokens = self.analyzer.analyze(&text);
            if tokens.is_empty() {
                continue;
            }

            // Group tokens by term; positions arrive in increasing order
            let mut term_positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
            for token in &tokens {
                term_positions.entry(token.text.clone())
                    .or_default()
                    .push(token.position);
            }

            let field = self.fields.entry(field_name.to_string()).or_default();
            let mut tfs = BTreeMap::new();
            for (term, positions) in term_positions {
                tfs.insert(term.clone(), positions.len() as u32);
                field.postings.entry(term)
                    .or_default()
                    .push(Posting::new(doc_id, positions));
            }
            field.doc_lengths.insert(doc_id, tokens.len() as u64);
            field.total_length += tokens.len() as u64;
            field_terms.insert(field_name.to_string(), tfs);
        }

        self.external_ids.insert(doc.external_id.clone(), doc_id);
        self.documents.push(StoredDocument {
            external_id: doc.external_id,
            stored: doc.stored.into_iter().collect(),
            field_terms,
        });

        Ok(doc_id)
    }

    fn document(&self, doc_id: DocId) -> Result<&StoredDocument> {
        self.documents.get(doc_id.value() as usize)
            .ok_or_else(|| Error::not_found(format!("document {} not found", doc_id)))
    }

    fn term_stats(&self, term: &str, field: &str) -> (u64, u64) {
        self.fields.get(field)
            .and_then(|f| f.postings.get(term))
            .map(|postings| {
                let ctf = postings.iter().map(|p| p.term_freq as u64).sum();
                (postings.len() as u64, ctf)
            })
            .unwrap_or((0, 0))
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        MemoryIndex::new()
    }
}

impl PostingStore for MemoryIndex {
    fn postings(&self, term: &str, field: &str) -> Result<InvertedList> {
        let mut list = InvertedList::new(field);
        if let Some(postings) = self.fields.get(field).and_then(|f| f.postings.get(term)) {
            for posting in postings {
                list.append_posting(posting.doc_id, posting.positions.clone());
            }
        }
        Ok(list)
    }

    fn doc_length(&self, field: &str, doc_id: DocId) -> Result<u64> {
        self.document(doc_id)?;
        Ok(self.fields.get(field)
            .and_then(|f| f.doc_lengths.get(&doc_id).copied())
            .unwrap_or(0))
    }

    fn collection_length(&self, field: &str) -> Result<u64> {
        Ok(self.fields.get(field).map_or(0, |f| f.total_length))
    }

    fn doc_count(&self, field: &str) -> Result<u64> {
        Ok(self.fields.get(field).map_or(0, |f| f.doc_lengths.len() as u64))
    }

    fn num_docs(&self) -> u64 {
        self.documents.len() as u64
    }

    fn total_term_freq(&self, term: &str, field: &str) -> Result<u64> {
        Ok(self.term_stats(term, field).1)
    }

    fn term_vector(&self, doc_id: DocId, field: &str) -> Result<Option<TermVector>> {
        let doc = self.document(doc_id)?;
        let Some(tfs) = doc.field_terms.get(field) else {
            return Ok(None);
        };

        let entries = tfs.iter()
            .map(|(stem, &tf)| {
                let (df, ctf) = self.term_stats(stem, field);
                TermVectorEntry {
                    stem: stem.clone(),
                    tf,
                    df,
                    ctf,
                }
            })
            .collect();

        Ok(Some(TermVector { entries }))
    }

    fn stored_field(&self, doc_id: DocId, name: &str) -> Result<Option<String>> {
        Ok(self.document(doc_id)?.stored.get(name).cloned())
    }

    fn external_id(&self, doc_id: DocId) -> Result<String> {
        Ok(self.document(doc_id)?.external_id.clone())
    }

    fn internal_id(&self, external_id: &str) -> Result<DocId> {
        self.external_ids.get(external_id)
            .copied()
            .ok_or_else(|| Error::new(
                ErrorKind::NotFound,
                format!("external id '{}' not found", external_id),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document(IndexDocument::new("d0")
            .field("body", "air pollution in the city air")
            .field("title", "City air")
            .stored("rawUrl", "http://example.org/a/b")).unwrap();
        index.add_document(IndexDocument::new("d1")
            .field("body", "water pollution")).unwrap();
        index
    }

    #[test]
    fn test_postings_sorted_with_positions() {
        let index = fixture();
        let list = index.postings("pollut", "body").unwrap();
        assert_eq!(list.field, "body");
        assert_eq!(list.doc_freq(), 2);
        assert_eq!(list.postings[0].doc_id, DocId(0));
        assert_eq!(list.postings[0].positions, vec![1]);
        assert_eq!(list.postings[1].positions, vec![1]);

        let air = index.postings("air", "body").unwrap();
        assert_eq!(air.postings[0].positions, vec![0, 5]);
        assert_eq!(air.ctf, 2);
    }

    #[test]
    fn test_field_statistics() {
        let index = fixture();
        assert_eq!(index.num_docs(), 2);
        assert_eq!(index.doc_count("title").unwrap(), 1);
        assert_eq!(index.doc_length("body", DocId(0)).unwrap(), 4);
        assert_eq!(index.doc_length("title", DocId(1)).unwrap(), 0);
        assert_eq!(index.collection_length("body").unwrap(), 6);
        assert_eq!(index.collection_length("inlink").unwrap(), 0);
    }

    #[test]
    fn test_term_vector_and_ids() {
        let index = fixture();
        let tv = index.term_vector(DocId(0), "body").unwrap().unwrap();
        let air = tv.get("air").unwrap();
        assert_eq!((air.tf, air.df, air.ctf), (2, 1, 2));
        assert!(index.term_vector(DocId(1), "title").unwrap().is_none());

        assert_eq!(index.internal_id("d1").unwrap(), DocId(1));
        assert_eq!(index.external_id(DocId(0)).unwrap(), "d0");
        assert!(index.internal_id("missing").unwrap_err().is_lookup_miss());
        assert!(index.term_vector(DocId(9), "body").unwrap_err().is_lookup_miss());
    }

    #[test]
    fn test_repeated_field_is_one_text() {
        let mut index = fixture();
        let doc_id = index.add_document(IndexDocument::new("d2")
            .field("inlink", "river cleanup")
            .field("inlink", "river pollution")).unwrap();

        let river = index.postings("river", "inlink").unwrap();
        assert_eq!(river.len(), 1);
        assert_eq!(river.postings[0].doc_id, doc_id);
        assert_eq!(river.postings[0].positions, vec![0, 2]);
        assert_eq!(index.doc_length("inlink", doc_id).unwrap(), 4);
        assert_eq!(index.collection_length("inlink").unwrap(), 4);
    }

    #[test]
    fn test_duplicate_external_id_rejected() {
        let mut index = fixture();
        assert!(index.add_document(IndexDocument::new("d0")).is_err());
    }
}
