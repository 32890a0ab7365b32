use diacare_artifacts::DrugCatalog;
use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32String};
use std::fmt;

/// Fuzzy "did you mean" lookup over catalog names using nucleo-matcher.
#[derive(Clone)]
pub struct FuzzyNames {
    names: Vec<String>,
    haystacks: Vec<Utf32String>,
}

impl FuzzyNames {
    pub fn new(catalog: &DrugCatalog) -> Self {
        let names: Vec<String> = catalog.names().map(str::to_string).collect();
        let haystacks = names
            .iter()
            .map(|name| Utf32String::from(name.as_str()))
            .collect();
        Self { names, haystacks }
    }

    /// Returns (catalog index, score) sorted by score descending, ties by catalog order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, u32)> {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }
        let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
        let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);

        let mut scored: Vec<(usize, u32)> = self
            .haystacks
            .iter()
            .enumerate()
            .filter_map(|(idx, haystack)| {
                pattern
                    .score(haystack.slice(..), &mut matcher)
                    .map(|score| (idx, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(limit);
        scored
    }

    /// Best-matching catalog names for `query`.
    pub fn closest(&self, query: &str, limit: usize) -> Vec<String> {
        self.search(query, limit)
            .into_iter()
            .map(|(idx, _)| self.names[idx].clone())
            .collect()
    }
}

impl fmt::Debug for FuzzyNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyNames")
            .field("names", &self.names.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diacare_artifacts::DrugRecord;

    fn fuzzy(names: &[&str]) -> FuzzyNames {
        let catalog =
            DrugCatalog::new(names.iter().map(|n| DrugRecord::new(*n, "", "", "")).collect())
                .unwrap();
        FuzzyNames::new(&catalog)
    }

    #[test]
    fn tolerates_a_dropped_letter() {
        let names = fuzzy(&["Ibuprofen", "Paracetamol", "Metformin"]);
        let closest = names.closest("paracetmol", 3);
        assert_eq!(closest.first().map(String::as_str), Some("Paracetamol"));
    }

    #[test]
    fn respects_limit() {
        let names = fuzzy(&["Metformin", "Metformin XR", "Metoprolol", "Methyldopa"]);
        assert!(names.closest("met", 2).len() <= 2);
        assert!(!names.closest("met", 2).is_empty());
    }

    #[test]
    fn blank_query_has_no_hints() {
        let names = fuzzy(&["Aspirin"]);
        assert!(names.closest("  ", 3).is_empty());
        assert!(names.closest("zzzz", 3).is_empty());
    }
}
