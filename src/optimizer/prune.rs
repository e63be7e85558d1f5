//! Generic dominance pruning.

/// Keeps every item that no other item supersedes.
///
/// `supersedes(left, right)` answers whether `left` makes `right` redundant:
/// `Some(true)` only when that is certain, `Some(false)` when it is not, and
/// `None` for a tie. Among tied items the one with the higher index survives.
pub fn prune_by_supersedes<T, F>(items: Vec<T>, mut supersedes: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Option<bool>,
{
    let mut keep = vec![true; items.len()];
    for (i, right) in items.iter().enumerate() {
        for (j, left) in items.iter().enumerate() {
            if i == j {
                continue;
            }
            let pruned = match supersedes(left, right) {
                Some(result) => result,
                None => i < j,
            };
            if pruned {
                keep[i] = false;
                break;
            }
        }
    }
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, kept)| kept.then_some(item))
        .collect()
}

/// Percentage of `pre` that survived as `post`, for reduction logs.
pub fn percent_kept(pre: usize, post: usize) -> f64 {
    if pre == 0 {
        100.0
    } else {
        post as f64 * 100.0 / pre as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greater(a: &u32, b: &u32) -> Option<bool> {
        match a.cmp(b) {
            std::cmp::Ordering::Greater => Some(true),
            std::cmp::Ordering::Less => Some(false),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[test]
    fn keeps_only_undominated_items() {
        assert_eq!(prune_by_supersedes(vec![3, 1, 4, 1, 5], greater), vec![5]);
    }

    #[test]
    fn last_of_a_tie_group_survives() {
        let items = vec![(7, 'a'), (7, 'b'), (7, 'c')];
        let kept = prune_by_supersedes(items, |l, r| greater(&l.0, &r.0));
        assert_eq!(kept, vec![(7, 'c')]);
    }

    #[test]
    fn incomparable_items_all_survive() {
        let kept = prune_by_supersedes(vec![1, 2, 3], |_, _| Some(false));
        assert_eq!(kept, vec![1, 2, 3]);
    }

    #[test]
    fn empty_input() {
        assert!(prune_by_supersedes(Vec::<u32>::new(), greater).is_empty());
        assert_eq!(percent_kept(0, 0), 100.0);
        assert_eq!(percent_kept(4, 1), 25.0);
    }
}
