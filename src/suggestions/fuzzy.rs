//! Query-to-city-name similarity on a 0-100 scale

/// Similarity of a query to a city name, both already lowercased.
///
/// Takes the best of Jaro-Winkler on the full name, Jaro-Winkler on each
/// word of the name and normalized Levenshtein on the full name, so a
/// typed prefix ("lon") and a later word ("york") both score high.
#[must_use]
pub fn score(query: &str, name: &str) -> f64 {
    if query.is_empty() || name.is_empty() {
        return 0.0;
    }

    let whole =
        strsim::jaro_winkler(query, name).max(strsim::normalized_levenshtein(query, name));
    let best_word = name
        .split_whitespace()
        .map(|word| strsim::jaro_winkler(query, word))
        .fold(0.0, f64::max);

    100.0 * whole.max(best_word)
}
