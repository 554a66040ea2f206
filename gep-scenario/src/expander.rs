//! Sparse-to-dense expansion of `(index, value)` sequences.

/// Expand ordered `(index, value)` pairs into a dense vector.
///
/// Indices are 0-based and must not decrease. Every index missing from the
/// input is filled with `default`. When `max_index` is given the result is
/// padded with `default` through that index, so its length does not depend
/// on whether the trailing entries were present.
///
/// ```rust
/// use gep_scenario::expander::expand;
///
/// let dense = expand(vec![(1, 3), (3, 4)], 0, Some(5));
/// assert_eq!(dense, vec![0, 3, 0, 4, 0, 0]);
/// ```
pub fn expand<I, T>(pairs: I, default: T, max_index: Option<usize>) -> Vec<T>
where
    I: IntoIterator<Item = (usize, T)>,
    T: Clone,
{
    let mut out = Vec::new();
    // index the next emitted element will occupy
    let mut next = 0usize;
    for (index, value) in pairs {
        if index > next {
            out.extend(std::iter::repeat(default.clone()).take(index - next));
        }
        out.push(value);
        next = index + 1;
    }
    if let Some(max) = max_index {
        if max + 1 > next {
            out.extend(std::iter::repeat(default).take(max + 1 - next));
        }
    }
    out
}

/// Expand and join with commas, the wire form of `featureTypes`.
pub fn expand_joined<I>(pairs: I, max_index: Option<usize>) -> String
where
    I: IntoIterator<Item = (usize, String)>,
{
    expand(pairs, String::new(), max_index).join(",")
}
