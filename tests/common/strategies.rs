use proptest::prelude::*;

/// Short texts, including empty ones and non-ASCII
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z ]{0,24}",
        1 => "[àéôü가나다 ]{1,8}",
        1 => Just(String::new()),
    ]
}

/// Ordered input texts
pub fn texts_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(text_strategy(), 0..60)
}

/// Per-item costs, including some larger than any budget below
pub fn costs_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(prop_oneof![8 => 0usize..40, 1 => 100usize..200], 0..80)
}

pub fn budget_strategy() -> impl Strategy<Value = usize> {
    1usize..80
}

pub fn worker_count_strategy() -> impl Strategy<Value = usize> {
    1usize..7
}
