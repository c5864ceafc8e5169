/// Case-insensitive substring match in both directions
///
/// "anxiety" matches "Social Anxiety" and vice versa. This is deliberately
/// loose and ranking results depend on it.
#[inline]
pub fn fuzzy_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// True when any candidate fuzzily matches `needle`
#[inline]
pub fn fuzzy_contains<'a, I>(haystack: I, needle: &str) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    haystack.into_iter().any(|candidate| fuzzy_match(candidate, needle))
}

/// Wanted items that fuzzily match at least one offered item, in wanted order
pub fn fuzzy_overlap<'a, W, O>(wanted: W, offered: O) -> Vec<String>
where
    W: IntoIterator<Item = &'a String>,
    O: IntoIterator<Item = &'a String> + Clone,
{
    wanted
        .into_iter()
        .filter(|item| fuzzy_contains(offered.clone(), item))
        .cloned()
        .collect()
}

/// Fraction of `wanted` that fuzzily matches `offered` (0 when nothing is wanted)
pub fn overlap_ratio<'a, W, O>(wanted: W, offered: O) -> f64
where
    W: IntoIterator<Item = &'a String>,
    W::IntoIter: ExactSizeIterator,
    O: IntoIterator<Item = &'a String> + Clone,
{
    let wanted = wanted.into_iter();
    let total = wanted.len();
    if total == 0 {
        return 0.0;
    }
    fuzzy_overlap(wanted, offered).len() as f64 / total as f64
}
