use crate::error::{Result, StockError};
use serde::Serialize;

/// One screening page and the labels it is shown under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyDescriptor {
    pub id: String,
    #[serde(rename = "url")]
    pub source_url: String,
    pub display_name: String,
    pub short_label: String,
}

impl StrategyDescriptor {
    pub fn new(id: &str, source_url: &str, display_name: &str, short_label: &str) -> Self {
        Self {
            id: id.to_string(),
            source_url: source_url.to_string(),
            display_name: display_name.to_string(),
            short_label: short_label.to_string(),
        }
    }
}

const SCREENER_STRATEGIES: [(&str, &str, &str, &str); 7] = [
    (
        "Strategy1",
        "https://www.screener.in/screens/2902497/strategy1/",
        "Strategy 1",
        "S1",
    ),
    (
        "Strategy2",
        "https://www.screener.in/screens/2902503/strategy2/",
        "Strategy 2",
        "S2",
    ),
    (
        "Strategy3",
        "https://www.screener.in/screens/2902506/strategy3/",
        "Strategy 3",
        "S3",
    ),
    (
        "Strategy4",
        "https://www.screener.in/screens/2902508/strategy4/",
        "Strategy 4",
        "S4",
    ),
    (
        "Strategy5",
        "https://www.screener.in/screens/2902511/strategy5/",
        "Strategy 5",
        "S5",
    ),
    (
        "Strategy6a",
        "https://www.screener.in/screens/2902519/strategy6a/",
        "Strategy 6a",
        "S6a",
    ),
    (
        "Strategy6b",
        "https://www.screener.in/screens/2902525/strategy6b/",
        "Strategy 6b",
        "S6b",
    ),
];

/// Ordered set of strategies. Iteration order is significant: it decides
/// which strategy a stock's price is taken from.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<StrategyDescriptor>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::from_descriptors(
            SCREENER_STRATEGIES
                .iter()
                .map(|(id, url, display, short)| StrategyDescriptor::new(id, url, display, short))
                .collect(),
        )
    }

    pub fn from_descriptors(strategies: Vec<StrategyDescriptor>) -> Self {
        Self { strategies }
    }

    pub fn get(&self, id: &str) -> Option<&StrategyDescriptor> {
        self.strategies.iter().find(|s| s.id == id)
    }

    pub fn lookup(&self, id: &str) -> Result<&StrategyDescriptor> {
        self.get(id)
            .ok_or_else(|| StockError::UnknownStrategy(id.to_string()))
    }

    /// Short label for `id`, or the id itself when it is not registered.
    pub fn short_label(&self, id: &str) -> String {
        self.get(id)
            .map(|s| s.short_label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyDescriptor> {
        self.strategies.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_keeps_declaration_order() {
        let registry = StrategyRegistry::new();
        assert_eq!(
            registry.ids(),
            vec![
                "Strategy1",
                "Strategy2",
                "Strategy3",
                "Strategy4",
                "Strategy5",
                "Strategy6a",
                "Strategy6b"
            ]
        );
    }

    #[test]
    fn short_label_falls_back_to_id() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.short_label("Strategy6a"), "S6a");
        assert_eq!(registry.short_label("Nope"), "Nope");
    }

    #[test]
    fn lookup_by_id() {
        let registry = StrategyRegistry::new();
        let strategy = registry.get("Strategy3").unwrap();
        assert_eq!(strategy.display_name, "Strategy 3");
        assert!(strategy.source_url.ends_with("/strategy3/"));
        assert!(registry.get("strategy3").is_none());
        assert!(matches!(
            registry.lookup("strategy3"),
            Err(StockError::UnknownStrategy(id)) if id == "strategy3"
        ));
    }
}
