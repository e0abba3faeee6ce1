use crate::core::types::DocId;

#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,       // Occurrences of the term in this field of the document
    pub positions: Vec<u32>,  // Strictly increasing token positions
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<u32>) -> Self {
        Posting {
            doc_id,
            term_freq: positions.len() as u32,
            positions,
        }
    }
}

/// Inverted list for one term (or proximity operator) in one field.
/// Note: postings are strictly increasing by doc_id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvertedList {
    pub field: String,
    pub postings: Vec<Posting>,
    pub ctf: u64,  // Collection term frequency
}

impl InvertedList {
    pub fn new(field: impl Into<String>) -> Self {
        InvertedList {
            field: field.into(),
            postings: Vec::new(),
            ctf: 0,
        }
    }

    /// Append a posting for a doc_id larger than any already present.
    pub fn append_posting(&mut self, doc_id: DocId, positions: Vec<u32>) {
        debug_assert!(self.postings.last().map_or(true, |p| p.doc_id < doc_id));
        self.ctf += positions.len() as u64;
        self.postings.push(Posting::new(doc_id, positions));
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u64 {
        self.postings.len() as u64
    }

    pub fn doc_id(&self, i: usize) -> DocId {
        self.postings[i].doc_id
    }
}
