//! Scenario documents: a schema, the access patterns to analyze over it, and
//! the analyzer configuration, loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Schema, SchemaDef};
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::query::{AccessPattern, Advice, PlanAdvisor};

/// A self-contained analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Schema the patterns navigate.
    pub schema: SchemaDef,
    /// Access patterns to analyze.
    #[serde(default)]
    pub patterns: Vec<AccessPattern>,
    /// Analyzer settings; omitted fields take their defaults.
    #[serde(default)]
    pub config: AnalyzerConfig,
}

impl Scenario {
    /// Decode a scenario from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and decode a scenario file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let scenario = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            entities = scenario.schema.entities.len(),
            patterns = scenario.patterns.len(),
            "Loaded scenario"
        );
        Ok(scenario)
    }

    /// Validate the schema document and freeze it.
    pub fn build_schema(&self) -> Result<Schema> {
        self.schema.build()
    }

    /// Advise on every pattern. A schema error fails the whole scenario;
    /// pattern errors are reported per pattern.
    pub fn advise(&self) -> Result<Vec<Result<Advice>>> {
        let schema = self.build_schema()?;
        let advisor = PlanAdvisor::new(&schema, self.config.clone());
        Ok(advisor.advise_all(&self.patterns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::query::LoadStrategy;
    use std::io::Write;

    const MENU_SCENARIO: &str = r#"{
        "schema": {
            "entities": [
                {
                    "name": "Navigation",
                    "primary_key": "NavigationId",
                    "columns": [
                        { "name": "NavigationId", "byte_width": 4 },
                        { "name": "MenuIconId", "byte_width": 4 },
                        { "name": "Name", "byte_width": 200 }
                    ]
                },
                {
                    "name": "MenuIcon",
                    "primary_key": "MenuIconId",
                    "columns": [
                        { "name": "MenuIconId", "byte_width": 4 },
                        { "name": "FontAwesomeGlyph", "byte_width": 200 }
                    ]
                }
            ],
            "relations": [
                {
                    "name": "MenuIcon",
                    "parent": "Navigation",
                    "child": "MenuIcon",
                    "foreign_key": "MenuIconId",
                    "cardinality": "one_to_one"
                }
            ]
        },
        "patterns": [
            {
                "root_entity": "Navigation",
                "root_row_count": 4,
                "steps": [
                    {
                        "relation": "MenuIcon",
                        "strategy": "lazy",
                        "projection": ["FontAwesomeGlyph"],
                        "keys": { "observed": [1, 2, 3, 3] }
                    }
                ]
            },
            {
                "root_entity": "Navigation",
                "root_row_count": 4,
                "steps": [{ "relation": "Icon", "strategy": "lazy" }]
            }
        ],
        "config": { "dedupe_repeated_lazy_keys": true }
    }"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_json(MENU_SCENARIO).unwrap();

        assert_eq!(scenario.schema.entities.len(), 2);
        assert_eq!(scenario.patterns.len(), 2);
        assert!(scenario.config.dedupe_repeated_lazy_keys);
        assert_eq!(scenario.config.max_navigation_depth, 8);
    }

    #[test]
    fn test_advise_reports_per_pattern() {
        let scenario = Scenario::from_json(MENU_SCENARIO).unwrap();
        let results = scenario.advise().unwrap();

        let advice = results[0].as_ref().unwrap();
        assert_eq!(advice.recommended, LoadStrategy::EagerProjected);
        assert_eq!(advice.get(LoadStrategy::Lazy).unwrap().query_count(), 4);

        assert_eq!(
            results[1].as_ref().unwrap_err(),
            &Error::relation_not_found("Icon")
        );
    }

    #[test]
    fn test_schema_errors_fail_the_scenario() {
        let mut scenario = Scenario::from_json(MENU_SCENARIO).unwrap();
        scenario.schema.relations[0].foreign_key = "IconId".into();

        assert!(matches!(
            scenario.advise(),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MENU_SCENARIO.as_bytes()).unwrap();

        let scenario = Scenario::from_path(file.path()).unwrap();
        assert_eq!(scenario.patterns[0].root_row_count, 4);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Scenario::from_json("{ not json"),
            Err(Error::Scenario(_))
        ));
        assert!(matches!(
            Scenario::from_path("/nonexistent/scenario.json"),
            Err(Error::Scenario(_))
        ));
    }
}
