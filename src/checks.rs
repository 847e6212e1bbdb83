//! Structural Checks - Layout and Style Rules Over Serialized Documents
//!
//! Rules read the JSON form of a document, so they apply equally to freshly
//! generated documents and to `.egrf` files from any writer. Rules produce
//! structured violations; the checker collects them and callers decide what a
//! violation means for them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::document::EgrfDocument;
use crate::layout::BoundingBox;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub item: Option<String>,
}

impl Violation {
    fn error(rule: &str, item: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message,
            item: Some(item.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }
}

/// A structural rule over a whole serialized document
pub trait DocumentRule {
    fn name(&self) -> &'static str;
    fn check(&self, document: &Value) -> Vec<Violation>;
}

fn records<'a>(document: &'a Value, section: &str) -> impl Iterator<Item = &'a Value> {
    document[section].as_array().into_iter().flatten()
}

fn bounds_of(visual: &Value) -> Option<BoundingBox> {
    serde_json::from_value(visual.get("bounds")?.clone()).ok()
}

/// (item id, owning context id, bounds) for every placed non-root item.
fn placed_items(document: &Value) -> Vec<(String, String, BoundingBox)> {
    let mut items = Vec::new();
    for (section, owner_key) in [
        ("entities", "context"),
        ("predicates", "context"),
        ("contexts", "parent"),
    ] {
        for record in records(document, section) {
            let (Some(id), Some(owner)) = (record["id"].as_str(), record[owner_key].as_str())
            else {
                continue;
            };
            if let Some(bounds) = bounds_of(&document["visual"][section][id]) {
                items.push((id.to_string(), owner.to_string(), bounds));
            }
        }
    }
    items
}

pub struct ContainmentRule {
    pub margin: f64,
}

impl DocumentRule for ContainmentRule {
    fn name(&self) -> &'static str { "containment" }

    fn check(&self, document: &Value) -> Vec<Violation> {
        let contexts = &document["visual"]["contexts"];
        placed_items(document)
            .into_iter()
            .filter_map(|(id, owner, bounds)| {
                let Some(owner_box) = bounds_of(&contexts[owner.as_str()]) else {
                    return Some(Violation::error(
                        self.name(),
                        &id,
                        format!("Owning context {} has no bounds", owner),
                    ));
                };
                if owner_box.contains(&bounds, self.margin) {
                    None
                } else {
                    Some(Violation::error(
                        self.name(),
                        &id,
                        format!("Bounds escape context {} (margin {})", owner, self.margin),
                    ))
                }
            })
            .collect()
    }
}

pub struct SiblingOverlapRule;

impl DocumentRule for SiblingOverlapRule {
    fn name(&self) -> &'static str { "sibling_overlap" }

    fn check(&self, document: &Value) -> Vec<Violation> {
        let mut by_owner: BTreeMap<String, Vec<(String, BoundingBox)>> = BTreeMap::new();
        for (id, owner, bounds) in placed_items(document) {
            by_owner.entry(owner).or_default().push((id, bounds));
        }

        let mut violations = vec![];
        for siblings in by_owner.values() {
            for (i, (a_id, a)) in siblings.iter().enumerate() {
                for (b_id, b) in &siblings[i + 1..] {
                    if a.intersects(b) {
                        violations.push(Violation::error(
                            self.name(),
                            a_id,
                            format!("Overlaps sibling {}", b_id),
                        ));
                    }
                }
            }
        }
        violations
    }
}

/// Every predicate styled "none" must carry the whole text-only bundle.
pub struct TextOnlyBundleRule;

impl DocumentRule for TextOnlyBundleRule {
    fn name(&self) -> &'static str { "text_only_bundle" }

    fn check(&self, document: &Value) -> Vec<Violation> {
        let Some(predicates) = document["visual"]["predicates"].as_object() else {
            return vec![];
        };

        predicates
            .iter()
            .filter(|(_, v)| v["style"] == "none")
            .filter_map(|(id, v)| {
                let zero = |field: &Value| field.as_f64() == Some(0.0);
                let mut broken = vec![];
                if !zero(&v["size"]["width"]) || !zero(&v["size"]["height"]) {
                    broken.push("size");
                }
                if !zero(&v["fill"]["opacity"]) {
                    broken.push("fill.opacity");
                }
                if !zero(&v["stroke"]["width"]) {
                    broken.push("stroke.width");
                }
                for field in ["border", "center_dot", "artifacts"] {
                    if v[field] != "none" {
                        broken.push(field);
                    }
                }
                if v["text_only"] != true {
                    broken.push("text_only");
                }

                if broken.is_empty() {
                    return None;
                }
                Some(Violation::error(
                    self.name(),
                    id,
                    format!("Text-only predicate has stray fields: {}", broken.join(", ")),
                ))
            })
            .collect()
    }
}

/// Depth grows by one per nesting level and `negated` follows depth parity.
pub struct PolarityRule;

impl DocumentRule for PolarityRule {
    fn name(&self) -> &'static str { "polarity" }

    fn check(&self, document: &Value) -> Vec<Violation> {
        let depths: BTreeMap<&str, u64> = records(document, "contexts")
            .filter_map(|c| Some((c["id"].as_str()?, c["depth"].as_u64()?)))
            .collect();

        let mut violations = vec![];
        for context in records(document, "contexts") {
            let id = context["id"].as_str().unwrap_or("context");
            let depth = context["depth"].as_u64();
            let negated = context["negated"].as_bool();
            let (Some(depth), Some(negated)) = (depth, negated) else {
                violations.push(Violation::error(
                    self.name(),
                    id,
                    "Context lacks depth or negated".to_string(),
                ));
                continue;
            };

            let expected_depth = context["parent"]
                .as_str()
                .map_or(Some(0), |parent| depths.get(parent).map(|d| d + 1));
            if expected_depth != Some(depth) {
                violations.push(Violation::error(
                    self.name(),
                    id,
                    format!("Depth {} does not follow its parent", depth),
                ));
            }
            if negated != (depth % 2 == 1) {
                violations.push(Violation::error(
                    self.name(),
                    id,
                    format!("Depth {} does not match negated = {}", depth, negated),
                ));
            }
        }
        violations
    }
}

/// Runs every structural rule over a document
pub struct DocumentChecker {
    rules: Vec<Box<dyn DocumentRule>>,
}

impl DocumentChecker {
    pub fn new(margin: f64) -> Self {
        Self {
            rules: vec![
                Box::new(ContainmentRule { margin }),
                Box::new(SiblingOverlapRule),
                Box::new(TextOnlyBundleRule),
                Box::new(PolarityRule),
            ],
        }
    }

    pub fn check(&self, document: &Value) -> CheckReport {
        let violations: Vec<_> = self.rules.iter().flat_map(|r| r.check(document)).collect();
        CheckReport {
            passed: violations.iter().all(|v| v.severity != ViolationSeverity::Error),
            violations,
        }
    }

    pub fn check_document(
        &self,
        document: &EgrfDocument,
    ) -> Result<CheckReport, serde_json::Error> {
        Ok(self.check(&document.to_value()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneratorConfig, PredicateStyle};
    use crate::generator::EgrfGenerator;
    use crate::graph::{EntityKind, GraphModel};
    use serde_json::json;

    fn crowded_graph() -> GraphModel {
        let graph = GraphModel::new();
        let root = graph.root();
        let (graph, x) = graph.add_entity("x", EntityKind::Variable);
        let (graph, cut) = graph.add_cut(root).unwrap();
        let (graph, inner) = graph.add_cut(cut).unwrap();
        let (graph, _) = graph.add_predicate_in(cut, "Philosopher", &[x]).unwrap();
        let (graph, _) = graph.add_predicate_in(inner, "Greek", &[x]).unwrap();
        let (graph, _) = graph.add_predicate_in(inner, "Wise", &[x]).unwrap();
        let (graph, _) = graph.add_cut(inner).unwrap();
        graph
    }

    fn crowded_value() -> Value {
        EgrfGenerator::default()
            .generate(&crowded_graph())
            .unwrap()
            .to_value()
            .unwrap()
    }

    fn predicate_id(document: &Value, name: &str) -> String {
        records(document, "predicates")
            .find(|p| p["name"] == name)
            .and_then(|p| p["id"].as_str())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_generated_documents_pass_all_rules() {
        for style in [PredicateStyle::None, PredicateStyle::Boxed] {
            let config = GeneratorConfig { predicate_style: style, ..Default::default() };
            let margin = config.layout.margin;
            let doc = EgrfGenerator::new(config).generate(&crowded_graph()).unwrap();
            let report = DocumentChecker::new(margin).check_document(&doc).unwrap();
            assert!(report.passed, "{:?}", report.violations);
            assert!(report.violations.is_empty());
        }
    }

    #[test]
    fn test_containment_rule_flags_oversized_margin() {
        let violations = ContainmentRule { margin: 500.0 }.check(&crowded_value());
        assert!(!violations.is_empty());
        assert!(violations.iter().all(|v| v.rule == "containment"));
    }

    #[test]
    fn test_containment_rule_flags_missing_owner() {
        let mut doc = crowded_value();
        let greek = predicate_id(&doc, "Greek");
        let record = doc["predicates"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|p| p["id"] == greek.as_str())
            .unwrap();
        record["context"] = json!("context_404");

        let violations = ContainmentRule { margin: 20.0 }.check(&doc);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].item.as_deref(), Some(greek.as_str()));
        assert!(violations[0].message.contains("context_404"));
    }

    #[test]
    fn test_overlapping_siblings_are_flagged() {
        let mut doc = crowded_value();
        let greek = predicate_id(&doc, "Greek");
        let wise = predicate_id(&doc, "Wise");
        let bounds = doc["visual"]["predicates"][&greek]["bounds"].clone();
        doc["visual"]["predicates"][&wise]["bounds"] = bounds;

        let violations = SiblingOverlapRule.check(&doc);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "sibling_overlap");
        assert!(violations[0].message.contains(&wise) || violations[0].message.contains(&greek));
    }

    #[test]
    fn test_partial_text_only_bundle_is_flagged() {
        let mut doc = crowded_value();
        let wise = predicate_id(&doc, "Wise");
        doc["visual"]["predicates"][&wise]["border"] = json!("solid");
        doc["visual"]["predicates"][&wise]["stroke"]["width"] = json!(1.0);

        let violations = TextOnlyBundleRule.check(&doc);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].item.as_deref(), Some(wise.as_str()));
        assert!(violations[0].message.contains("border"));
        assert!(violations[0].message.contains("stroke.width"));
    }

    #[test]
    fn test_polarity_rule_flags_wrong_flag_and_depth() {
        let mut doc = crowded_value();
        doc["contexts"][1]["negated"] = json!(false);
        doc["contexts"][2]["depth"] = json!(5);

        let report = DocumentChecker::new(20.0).check(&doc);
        assert!(!report.passed);
        let polarity: Vec<_> = report
            .violations
            .iter()
            .filter(|v| v.rule == "polarity")
            .filter_map(|v| v.item.clone())
            .collect();
        // context_3 breaks both checks and context_7 no longer follows its parent
        assert_eq!(polarity, vec!["context_2", "context_3", "context_3", "context_7"]);
    }
}
