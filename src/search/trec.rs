use std::io::Write;
use crate::core::error::Result;
use crate::search::results::ScoredDocument;

/// Write one query's ranking in TREC run format:
/// `qid Q0 external_id rank score run_id`, tab separated, ranks from 1.
/// An empty ranking produces a single `dummy` row so every query appears.
pub fn write_ranking<W: Write>(
    out: &mut W,
    query_id: &str,
    ranking: &[ScoredDocument],
    run_id: &str,
) -> Result<()> {
    if ranking.is_empty() {
        writeln!(out, "{}\tQ0\tdummy\t1\t0\t{}", query_id, run_id)?;
        return Ok(());
    }

    for (rank, doc) in ranking.iter().enumerate() {
        writeln!(out, "{}\tQ0\t{}\t{}\t{}\t{}", query_id, doc.external_id, rank + 1, doc.score, run_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;

    #[test]
    fn test_ranking_lines() {
        let ranking = vec![
            ScoredDocument::new(DocId(4), "clueweb-4", 2.5),
            ScoredDocument::new(DocId(1), "clueweb-1", 1.0),
        ];
        let mut out = Vec::new();
        write_ranking(&mut out, "10", &ranking, "run-1").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "10\tQ0\tclueweb-4\t1\t2.5\trun-1\n10\tQ0\tclueweb-1\t2\t1\trun-1\n"
        );
    }

    #[test]
    fn test_empty_ranking_writes_dummy_row() {
        let mut out = Vec::new();
        write_ranking(&mut out, "7", &[], "run-1").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "7\tQ0\tdummy\t1\t0\trun-1\n");
    }
}
