use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ranqx::query::proximity::{near_positions, window_positions};

fn random_positions(rng: &mut StdRng, max_len: usize, max_pos: u32) -> Vec<u32> {
    let len = rng.gen_range(1..=max_len);
    let mut positions: Vec<u32> = (0..len).map(|_| rng.gen_range(0..max_pos)).collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

fn any_ordered_pair(a: &[u32], b: &[u32], distance: u32) -> bool {
    a.iter().any(|&x| b.iter().any(|&y| y > x && y - x <= distance))
}

/// True when some ordered chain across `lists` ends at `end` of the last list
fn chain_ends_at(lists: &[Vec<u32>], end: u32, distance: u32) -> bool {
    let Some((last, earlier)) = lists.split_last() else {
        return false;
    };
    if !last.contains(&end) {
        return false;
    }
    if earlier.is_empty() {
        return true;
    }
    earlier[earlier.len() - 1].iter()
        .filter(|&&q| q < end && end - q <= distance)
        .any(|&q| chain_ends_at(earlier, q, distance))
}

fn any_window(lists: &[Vec<u32>], width: u32) -> bool {
    // Every window is anchored at the minimum of one of its members
    lists.iter().flatten().any(|&start| {
        lists.iter().all(|l| l.iter().any(|&p| p >= start && p - start < width))
    })
}

#[test]
fn near_matches_exactly_when_an_ordered_pair_exists() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let a = random_positions(&mut rng, 6, 40);
        let b = random_positions(&mut rng, 6, 40);
        let distance = rng.gen_range(1..6);

        let matched = near_positions(&[a.as_slice(), b.as_slice()], distance);
        assert_eq!(!matched.is_empty(), any_ordered_pair(&a, &b, distance), "a={:?} b={:?} k={}", a, b, distance);

        // Each match is a position of the last argument with a predecessor in range
        for p in &matched {
            assert!(b.contains(p));
            assert!(a.iter().any(|&x| x < *p && p - x <= distance));
        }
        assert!(matched.len() <= b.len());
        assert!(matched.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn near_reports_every_chain_end_for_longer_queries() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..500 {
        let args = rng.gen_range(3..=4);
        let lists: Vec<Vec<u32>> = (0..args).map(|_| random_positions(&mut rng, 6, 30)).collect();
        let distance = rng.gen_range(1..5);

        let slices: Vec<&[u32]> = lists.iter().map(|l| l.as_slice()).collect();
        let matched = near_positions(&slices, distance);

        let last = &lists[lists.len() - 1];
        let expected: Vec<u32> = last.iter()
            .copied()
            .filter(|&p| chain_ends_at(&lists, p, distance))
            .collect();
        assert_eq!(matched, expected, "lists={:?} k={}", lists, distance);
    }
}

#[test]
fn near_chain_may_skip_the_closest_middle_position() {
    let a: &[u32] = &[1];
    let b: &[u32] = &[2, 3];
    let c: &[u32] = &[5];
    assert_eq!(near_positions(&[a, b, c], 2), vec![5]);
}

#[test]
fn window_matches_exactly_when_a_window_exists() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let args = rng.gen_range(2..=3);
        let lists: Vec<Vec<u32>> = (0..args).map(|_| random_positions(&mut rng, 5, 30)).collect();
        let width = rng.gen_range(1..8);

        let slices: Vec<&[u32]> = lists.iter().map(|l| l.as_slice()).collect();
        let matched = window_positions(&slices, width);
        assert_eq!(!matched.is_empty(), any_window(&lists, width), "lists={:?} w={}", lists, width);

        let shortest = lists.iter().map(|l| l.len()).min().unwrap_or(0);
        assert!(matched.len() <= shortest);
        assert!(matched.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn window_is_order_insensitive() {
    let a: &[u32] = &[3, 17];
    let b: &[u32] = &[1, 15];
    assert_eq!(window_positions(&[a, b], 3), vec![3, 17]);
    assert_eq!(window_positions(&[b, a], 3), vec![3, 17]);
    // NEAR is ordered: b never follows a within 3
    assert!(near_positions(&[a, b], 3).is_empty());
    assert_eq!(near_positions(&[b, a], 3), vec![3, 17]);
}
