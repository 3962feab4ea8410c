//! The parallel map must assemble results positionally no matter how the
//! pool interleaves the work.

use proptest::prelude::*;

use kanna::RecipeScheduler;

proptest! {
    #[test]
    fn map_async_preserves_input_order(input in proptest::collection::vec(any::<u64>(), 0..200)) {
        let scheduler = RecipeScheduler::new();
        let output = scheduler.map_async(&input, |n| n.wrapping_mul(31).wrapping_add(7));

        let expected: Vec<u64> = input
            .iter()
            .map(|n| n.wrapping_mul(31).wrapping_add(7))
            .collect();
        prop_assert_eq!(output, expected);
    }
}
