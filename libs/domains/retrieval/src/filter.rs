//! Search filter compilation.
//!
//! Callers send a flat object of filter keys, each holding a scalar or a list.
//! Every recognised key that carries a truthy value becomes one match-any
//! condition on a payload field, and all conditions are ANDed together.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A single acceptable filter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FilterValue {
    Keyword(String),
    Integer(i64),
}

impl FilterValue {
    fn is_truthy(&self) -> bool {
        match self {
            FilterValue::Keyword(s) => !s.is_empty(),
            FilterValue::Integer(i) => *i != 0,
        }
    }
}

/// The set of values supplied for one filter key.
///
/// Accepts either a scalar (`"doc"`) or a list (`["doc", "memory"]`). A scalar
/// is kept as a one-element set; falsy scalars and empty lists become an
/// empty set, which contributes no condition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FilterValues(pub Vec<FilterValue>);

impl FilterValues {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FilterValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(FilterValue),
            Many(Vec<FilterValue>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) if value.is_truthy() => FilterValues(vec![value]),
            OneOrMany::One(_) => FilterValues::default(),
            OneOrMany::Many(values) => FilterValues(values),
        })
    }
}

impl<V: Into<FilterValue>> FromIterator<V> for FilterValues {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        FilterValues(iter.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Keyword(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Keyword(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

/// Recognised search filters. Unknown keys are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SearchFilters {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FilterValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<FilterValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<FilterValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<FilterValues>,
    /// Legacy alias for `type`. Supplying both ANDs two conditions on the
    /// same field, so only values present in both lists can match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_in: Option<FilterValues>,
}

/// Payload field targeted by each filter key
pub const TYPE_FIELD: &str = "type";
pub const METRIC_FIELD: &str = "meta.metric_id";
pub const TAGS_FIELD: &str = "tags";
pub const TABLE_FIELD: &str = "meta.table";

/// Match-any value set of a single condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchAny {
    Keywords(Vec<String>),
    Integers(Vec<i64>),
}

impl MatchAny {
    fn from_values(values: &FilterValues) -> Self {
        let integers: Option<Vec<i64>> = values
            .0
            .iter()
            .map(|v| match v {
                FilterValue::Integer(i) => Some(*i),
                FilterValue::Keyword(_) => None,
            })
            .collect();

        match integers {
            Some(integers) => MatchAny::Integers(integers),
            None => MatchAny::Keywords(
                values
                    .0
                    .iter()
                    .map(|v| match v {
                        FilterValue::Keyword(s) => s.clone(),
                        FilterValue::Integer(i) => i.to_string(),
                    })
                    .collect(),
            ),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (MatchAny::Keywords(set), Value::String(s)) => set.iter().any(|k| k == s),
            (MatchAny::Integers(set), Value::Number(n)) => {
                n.as_i64().is_some_and(|i| set.contains(&i))
            }
            _ => false,
        }
    }
}

/// One `field matches any of` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    pub key: String,
    pub any: MatchAny,
}

/// Conjunction of field conditions understood by the index backend
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Predicate {
    pub must: Vec<FieldCondition>,
}

impl Predicate {
    /// Evaluate the predicate against a stored payload, following the
    /// backend's rules: dotted keys walk nested objects, and an array field
    /// matches when any element is in the value set.
    pub fn matches(&self, payload: &Value) -> bool {
        self.must.iter().all(|condition| {
            let Some(field) = lookup(payload, &condition.key) else {
                return false;
            };
            match field {
                Value::Array(items) => items.iter().any(|item| condition.any.accepts(item)),
                other => condition.any.accepts(other),
            }
        })
    }
}

fn lookup<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(payload, |node, segment| node.get(segment))
}

/// Compile caller filters into a backend predicate.
///
/// Returns `None` when no key contributes a condition, meaning "match
/// everything" rather than an empty conjunction.
pub fn compile(filters: &SearchFilters) -> Option<Predicate> {
    let fields = [
        (&filters.kind, TYPE_FIELD),
        (&filters.metric, METRIC_FIELD),
        (&filters.tag, TAGS_FIELD),
        (&filters.table, TABLE_FIELD),
        (&filters.type_in, TYPE_FIELD),
    ];

    let must: Vec<FieldCondition> = fields
        .into_iter()
        .filter_map(|(values, key)| {
            let values = values.as_ref().filter(|v| !v.is_empty())?;
            Some(FieldCondition {
                key: key.to_string(),
                any: MatchAny::from_values(values),
            })
        })
        .collect();

    if must.is_empty() {
        None
    } else {
        Some(Predicate { must })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters(value: Value) -> SearchFilters {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_no_filters_compiles_to_none() {
        assert_eq!(compile(&SearchFilters::default()), None);
    }

    #[test]
    fn test_scalar_becomes_single_element_set() {
        let predicate = compile(&filters(json!({"type": "doc"}))).unwrap();
        assert_eq!(
            predicate.must,
            vec![FieldCondition {
                key: "type".to_string(),
                any: MatchAny::Keywords(vec!["doc".to_string()]),
            }]
        );
    }

    #[test]
    fn test_list_becomes_match_any() {
        let predicate = compile(&filters(json!({"type": ["doc", "memory"]}))).unwrap();
        assert_eq!(
            predicate.must[0].any,
            MatchAny::Keywords(vec!["doc".to_string(), "memory".to_string()])
        );
    }

    #[test]
    fn test_all_keys_map_to_payload_fields_in_order() {
        let predicate = compile(&filters(json!({
            "type": "doc",
            "metric": "m1",
            "tag": ["finance"],
            "table": "orders",
        })))
        .unwrap();
        let keys: Vec<&str> = predicate.must.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["type", "meta.metric_id", "tags", "meta.table"]);
    }

    #[test]
    fn test_type_and_type_in_both_contribute() {
        let predicate =
            compile(&filters(json!({"type": "doc", "type_in": ["memory"]}))).unwrap();
        assert_eq!(predicate.must.len(), 2);
        assert!(predicate.must.iter().all(|c| c.key == "type"));
        assert!(!predicate.matches(&json!({"type": "doc"})));
        assert!(!predicate.matches(&json!({"type": "memory"})));
    }

    #[test]
    fn test_falsy_values_contribute_nothing() {
        let compiled = compile(&filters(json!({
            "type": "",
            "metric": null,
            "tag": [],
            "table": 0,
        })));
        assert_eq!(compiled, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let compiled = compile(&filters(json!({"colour": "red", "type": "doc"}))).unwrap();
        assert_eq!(compiled.must.len(), 1);
    }

    #[test]
    fn test_integer_values_match_integers() {
        let predicate = compile(&filters(json!({"metric": [7, 9]}))).unwrap();
        assert_eq!(predicate.must[0].any, MatchAny::Integers(vec![7, 9]));
        assert!(predicate.matches(&json!({"meta": {"metric_id": 9}})));
        assert!(!predicate.matches(&json!({"meta": {"metric_id": 8}})));
    }

    #[test]
    fn test_mixed_values_fall_back_to_keywords() {
        let predicate = compile(&filters(json!({"metric": ["m1", 3]}))).unwrap();
        assert_eq!(
            predicate.must[0].any,
            MatchAny::Keywords(vec!["m1".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn test_matches_nested_fields_and_arrays() {
        let predicate = compile(&filters(json!({"tag": "finance", "table": "orders"}))).unwrap();
        let hit = json!({"tags": ["ops", "finance"], "meta": {"table": "orders"}});
        let miss = json!({"tags": ["ops"], "meta": {"table": "orders"}});
        let missing_field = json!({"tags": ["finance"]});
        assert!(predicate.matches(&hit));
        assert!(!predicate.matches(&miss));
        assert!(!predicate.matches(&missing_field));
    }
}
