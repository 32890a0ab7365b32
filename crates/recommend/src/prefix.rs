use diacare_artifacts::DrugCatalog;

/// Case-insensitive name-prefix lookup over the catalog.
///
/// Matches come back in catalog order and are not capped.
#[derive(Debug, Clone)]
pub struct PrefixSearch {
    names: Vec<String>,
    lowered: Vec<String>,
}

impl PrefixSearch {
    pub fn new(catalog: &DrugCatalog) -> Self {
        let names: Vec<String> = catalog.names().map(str::to_string).collect();
        let lowered = names.iter().map(|name| name.to_lowercase()).collect();
        Self { names, lowered }
    }

    /// An empty query matches every name.
    pub fn suggest(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        self.lowered
            .iter()
            .zip(&self.names)
            .filter(|(lowered, _)| lowered.starts_with(&query))
            .map(|(_, name)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diacare_artifacts::DrugRecord;
    use pretty_assertions::assert_eq;

    fn search(names: &[&str]) -> PrefixSearch {
        let catalog =
            DrugCatalog::new(names.iter().map(|n| DrugRecord::new(*n, "", "", "")).collect())
                .unwrap();
        PrefixSearch::new(&catalog)
    }

    #[test]
    fn matches_case_insensitively_in_catalog_order() {
        let search = search(&["Metformin", "metoprolol", "Insulin", "METHYLDOPA"]);
        assert_eq!(
            search.suggest("MeT"),
            vec!["Metformin", "metoprolol", "METHYLDOPA"]
        );
        assert_eq!(search.suggest("ins"), vec!["Insulin"]);
    }

    #[test]
    fn empty_query_returns_every_name() {
        let search = search(&["B", "A", "C"]);
        assert_eq!(search.suggest(""), vec!["B", "A", "C"]);
    }

    #[test]
    fn no_match_is_empty_not_an_error() {
        let search = search(&["Aspirin"]);
        assert!(search.suggest("zz").is_empty());
        assert!(search.suggest("aspirin 100").is_empty());
    }
}
