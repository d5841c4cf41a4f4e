use std::fmt::Debug;

use rand::{seq::SliceRandom, thread_rng};

pub fn shuffle_vec<T>(mut vec: Vec<T>) -> Vec<T> {
    vec.shuffle(&mut thread_rng());
    vec
}

/// Remove an element from a vector.
pub fn try_remove_item<T: Debug + PartialEq>(vec: &mut Vec<T>, e: &T) -> bool {
    vec.iter()
        .position(|current| current == e)
        .map(|e| vec.remove(e))
        .is_some()
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_try_remove_item() {
        let mut a = vec![1, 2, 3];
        assert!(super::try_remove_item(&mut a, &1));
        assert_eq!(&a, &[2, 3]);
        assert!(!super::try_remove_item(&mut a, &666));
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut shuffled = super::shuffle_vec(vec![3, 1, 2]);
        shuffled.sort_unstable();
        assert_eq!(&shuffled, &[1, 2, 3]);
    }
}
