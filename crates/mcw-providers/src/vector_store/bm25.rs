//! BM25 keyword ranking over tokenized search text.

use std::collections::HashMap;

use mcw_domain::constants::{BM25_B, BM25_K1};

/// Score every document against the query terms.
///
/// Returns one score per document, aligned with the input order. Documents
/// sharing no terms with the query score 0.
#[must_use]
pub fn score_documents(query_terms: &[String], documents: &[Vec<String>]) -> Vec<f32> {
    let doc_count = documents.len();
    if doc_count == 0 || query_terms.is_empty() {
        return vec![0.0; doc_count];
    }

    let avg_len: f32 =
        documents.iter().map(Vec::len).sum::<usize>() as f32 / doc_count as f32;
    let avg_len = avg_len.max(1.0);

    // Document frequency per query term.
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for term in query_terms {
        let df = documents
            .iter()
            .filter(|doc| doc.iter().any(|t| t == term))
            .count();
        doc_freq.insert(term.as_str(), df);
    }

    documents
        .iter()
        .map(|doc| {
            let len_norm = 1.0 - BM25_B + BM25_B * doc.len() as f32 / avg_len;
            query_terms
                .iter()
                .map(|term| {
                    let df = doc_freq.get(term.as_str()).copied().unwrap_or(0);
                    if df == 0 {
                        return 0.0;
                    }
                    let tf = doc.iter().filter(|t| *t == term).count() as f32;
                    if tf == 0.0 {
                        return 0.0;
                    }
                    let idf = (1.0
                        + (doc_count as f32 - df as f32 + 0.5) / (df as f32 + 0.5))
                        .ln();
                    idf * tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * len_norm)
                })
                .sum()
        })
        .collect()
}
