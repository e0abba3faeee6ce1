//! Operators that combine inverted lists into a new inverted list:
//! `#SYN`, `#NEAR/k` and `#WINDOW/k`.

use std::collections::BTreeMap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::posting::InvertedList;

fn common_field(lists: &[InvertedList], operator: &str) -> Result<String> {
    let field = lists.first().map(|l| l.field.clone()).unwrap_or_default();
    if let Some(other) = lists.iter().find(|l| l.field != field) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("{} arguments must share a field, got '{}' and '{}'", operator, field, other.field),
        ));
    }
    Ok(field)
}

/// Documents present in every list, as posting indices per list.
/// The shortest list drives the walk.
fn common_documents(lists: &[InvertedList]) -> Vec<(DocId, Vec<usize>)> {
    let Some(driver) = (0..lists.len()).min_by_key(|&i| lists[i].len()) else {
        return Vec::new();
    };

    let mut cursors = vec![0usize; lists.len()];
    let mut matches = Vec::new();

    'docs: for (d, posting) in lists[driver].postings.iter().enumerate() {
        let doc_id = posting.doc_id;
        cursors[driver] = d;

        for (i, list) in lists.iter().enumerate() {
            if i == driver {
                continue;
            }
            while cursors[i] < list.len() && list.doc_id(cursors[i]) < doc_id {
                cursors[i] += 1;
            }
            if cursors[i] >= list.len() {
                break 'docs;
            }
            if list.doc_id(cursors[i]) != doc_id {
                continue 'docs;
            }
        }

        matches.push((doc_id, cursors.clone()));
    }

    matches
}

/// Positions of the last argument that end an ordered chain whose
/// consecutive gaps are in `(0, distance]`. Chaining follows argument order;
/// a chain end may extend any number of later positions.
pub fn near_positions(positions: &[&[u32]], distance: u32) -> Vec<u32> {
    let Some((first, rest)) = positions.split_first() else {
        return Vec::new();
    };

    let mut chain_ends: Vec<u32> = first.to_vec();
    for next in rest {
        let mut matched = Vec::new();
        let mut m = 0;
        for &p in next.iter() {
            // Skip chain ends too far behind p; they are too far for every later p too
            while m < chain_ends.len() && chain_ends[m].saturating_add(distance) < p {
                m += 1;
            }
            if m < chain_ends.len() && chain_ends[m] < p {
                matched.push(p);
            }
        }
        if matched.is_empty() {
            return matched;
        }
        chain_ends = matched;
    }
    chain_ends
}

/// Positions (the span's maximum) of non-overlapping windows holding one
/// occurrence of every argument with `max - min < width`.
pub fn window_positions(positions: &[&[u32]], width: u32) -> Vec<u32> {
    if positions.is_empty() || positions.iter().any(|p| p.is_empty()) {
        return Vec::new();
    }

    let mut pointers = vec![0usize; positions.len()];
    let mut matched = Vec::new();

    loop {
        let (mut min_i, mut max_i) = (0, 0);
        for i in 1..positions.len() {
            if positions[i][pointers[i]] < positions[min_i][pointers[min_i]] {
                min_i = i;
            }
            if positions[i][pointers[i]] > positions[max_i][pointers[max_i]] {
                max_i = i;
            }
        }

        let min = positions[min_i][pointers[min_i]];
        let max = positions[max_i][pointers[max_i]];
        if max - min < width {
            matched.push(max);
            for pointer in pointers.iter_mut() {
                *pointer += 1;
            }
            if pointers.iter().zip(positions).any(|(&p, list)| p >= list.len()) {
                break;
            }
        } else {
            pointers[min_i] += 1;
            if pointers[min_i] >= positions[min_i].len() {
                break;
            }
        }
    }

    matched
}

fn positional_match<F>(lists: Vec<InvertedList>, operator: &str, matcher: F) -> Result<InvertedList>
where
    F: Fn(&[&[u32]]) -> Vec<u32>,
{
    let field = common_field(&lists, operator)?;
    let mut result = InvertedList::new(field);

    for (doc_id, cursors) in common_documents(&lists) {
        let positions: Vec<&[u32]> = lists.iter()
            .zip(&cursors)
            .map(|(list, &c)| list.postings[c].positions.as_slice())
            .collect();
        let matched = matcher(&positions);
        if !matched.is_empty() {
            result.append_posting(doc_id, matched);
        }
    }

    Ok(result)
}

/// `#NEAR/distance`: ordered proximity. A single argument passes through.
pub fn near(mut lists: Vec<InvertedList>, distance: u32) -> Result<InvertedList> {
    if lists.len() == 1 {
        return Ok(lists.remove(0));
    }
    positional_match(lists, "#NEAR", |positions| near_positions(positions, distance))
}

/// `#WINDOW/width`: unordered proximity. A single argument passes through.
pub fn window(mut lists: Vec<InvertedList>, width: u32) -> Result<InvertedList> {
    if lists.len() == 1 {
        return Ok(lists.remove(0));
    }
    positional_match(lists, "#WINDOW", |positions| window_positions(positions, width))
}

/// `#SYN`: union of the argument lists, positions merged per document.
pub fn syn(lists: Vec<InvertedList>) -> Result<InvertedList> {
    let field = common_field(&lists, "#SYN")?;
    let mut merged: BTreeMap<DocId, Vec<u32>> = BTreeMap::new();
    for list in lists {
        for posting in list.postings {
            merged.entry(posting.doc_id).or_default().extend(posting.positions);
        }
    }

    let mut result = InvertedList::new(field);
    for (doc_id, mut positions) in merged {
        positions.sort_unstable();
        positions.dedup();
        result.append_posting(doc_id, positions);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(field: &str, postings: &[(u64, &[u32])]) -> InvertedList {
        let mut list = InvertedList::new(field);
        for (doc, positions) in postings {
            list.append_posting(DocId(*doc), positions.to_vec());
        }
        list
    }

    #[test]
    fn test_near_ordered_gap() {
        assert_eq!(near_positions(&[&[1, 5], &[2, 9]], 1), vec![2]);
        assert_eq!(near_positions(&[&[1, 5], &[2, 9]], 4), vec![2, 9]);
        // b before a never matches
        assert!(near_positions(&[&[5], &[3]], 10).is_empty());
        // Equal positions are not a match
        assert!(near_positions(&[&[3], &[3]], 1).is_empty());
    }

    #[test]
    fn test_near_chains_three_terms() {
        // a b c at 1 2 3, and a stray c at 10
        assert_eq!(near_positions(&[&[1], &[2], &[3, 10]], 1), vec![3]);
        assert!(near_positions(&[&[1], &[4], &[5]], 2).is_empty());
    }

    #[test]
    fn test_near_chain_end_extends_several_positions() {
        // 1 -> 3 -> 5 is valid even though 1 -> 2 is the closer pair
        assert_eq!(near_positions(&[&[1], &[2, 3], &[5]], 2), vec![5]);
        assert_eq!(near_positions(&[&[1], &[2, 3]], 2), vec![2, 3]);
    }

    #[test]
    fn test_window_span() {
        assert_eq!(window_positions(&[&[1], &[3]], 3), vec![3]);
        assert!(window_positions(&[&[1], &[3]], 2).is_empty());
        // Order does not matter
        assert_eq!(window_positions(&[&[3], &[1]], 3), vec![3]);
        // Matches do not share positions
        assert_eq!(window_positions(&[&[1, 2], &[2, 3]], 2), vec![2, 3]);
    }

    #[test]
    fn test_near_over_lists() {
        let a = list("body", &[(0, &[1, 5]), (2, &[4]), (3, &[0])]);
        let b = list("body", &[(0, &[2, 9]), (3, &[7])]);
        let result = near(vec![a, b], 1).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.postings[0].doc_id, DocId(0));
        assert_eq!(result.postings[0].positions, vec![2]);
        assert_eq!(result.ctf, 1);
    }

    #[test]
    fn test_window_over_lists() {
        let a = list("title", &[(1, &[4]), (2, &[0])]);
        let b = list("title", &[(1, &[2]), (2, &[9])]);
        let result = window(vec![a, b], 3).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.postings[0].positions, vec![4]);
    }

    #[test]
    fn test_single_argument_passes_through() {
        let a = list("body", &[(0, &[1]), (4, &[2, 3])]);
        assert_eq!(near(vec![a.clone()], 3).unwrap(), a);
        assert_eq!(window(vec![a.clone()], 3).unwrap(), a);
    }

    #[test]
    fn test_field_mismatch_rejected() {
        let a = list("body", &[(0, &[1])]);
        let b = list("title", &[(0, &[2])]);
        let err = near(vec![a.clone(), b.clone()], 1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(syn(vec![a, b]).is_err());
    }

    #[test]
    fn test_syn_union() {
        let a = list("body", &[(0, &[1]), (3, &[4])]);
        let b = list("body", &[(0, &[0, 1]), (2, &[5])]);
        let result = syn(vec![a, b]).unwrap();
        let docs: Vec<u64> = result.postings.iter().map(|p| p.doc_id.value()).collect();
        assert_eq!(docs, vec![0, 2, 3]);
        assert_eq!(result.postings[0].positions, vec![0, 1]);
        assert_eq!(result.ctf, 4);
    }
}
