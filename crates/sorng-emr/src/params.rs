//! Request parameter trees and their flattening into EMR query parameters.
//!
//! Callers describe a request as a nested [`ParamMap`] with snake_case field
//! names. [`marshal`] turns it into the flat, dotted wire form the Query
//! protocol expects:
//!
//! ```text
//! job_flow_ids: ["j-1", "j-2"]        JobFlowIds.member.1 = j-1
//!                                     JobFlowIds.member.2 = j-2
//! instances: { instance_count: "2" }  Instances.InstanceCount = 2
//! steps: [{ name: "s" }]              Steps.member.1.Name = s
//! ```

use std::collections::BTreeMap;

use crate::error::{EmrError, EmrResult};

/// A request parameter tree keyed by snake_case field names.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Flat wire parameters keyed by dotted PascalCase names.
pub type FlatParams = BTreeMap<String, String>;

/// One node of a request parameter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<ParamValue>),
    Map(ParamMap),
}

impl ParamValue {
    /// Build a map node from `(key, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list node.
    pub fn list<V, I>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<&String> for ParamValue {
    fn from(s: &String) -> Self {
        Self::Scalar(s.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Scalar(b.to_string())
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        Self::Scalar(n.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Scalar(n.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(ParamValue::Scalar).collect())
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        Self::list(items)
    }
}

impl From<ParamMap> for ParamValue {
    fn from(map: ParamMap) -> Self {
        Self::Map(map)
    }
}

/// Convert a snake_case field name into its PascalCase wire name.
///
/// A `/` followed by a character becomes `::` plus that character
/// upper-cased; then the first character and every character following an
/// underscore are upper-cased and those underscores dropped.
pub fn camelize(word: &str) -> String {
    let mut namespaced = String::with_capacity(word.len());
    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        if c == '/' {
            namespaced.push_str("::");
            if let Some(next) = chars.next() {
                namespaced.extend(next.to_uppercase());
            }
        } else {
            namespaced.push(c);
        }
    }

    let chars: Vec<char> = namespaced.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    if let Some(first) = chars.first() {
        out.extend(first.to_uppercase());
        i = 1;
    }
    while i < chars.len() {
        if chars[i] == '_' && i + 1 < chars.len() {
            out.extend(chars[i + 1].to_uppercase());
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Flatten a parameter tree into wire parameters.
///
/// Fails on a list nested directly inside a list, and on two tree paths
/// that collide once cased (e.g. `foo_bar` next to `fooBar`).
pub fn marshal(params: &ParamMap) -> EmrResult<FlatParams> {
    let mut result = FlatParams::new();
    for (key, value) in params {
        let name = camelize(key);
        match value {
            ParamValue::Scalar(s) => insert_unique(&mut result, name, s.clone())?,
            ParamValue::List(items) => {
                let prefix = format!("{}.member", name);
                for (index, item) in items.iter().enumerate() {
                    let item_prefix = format!("{}.{}", prefix, index + 1);
                    match item {
                        ParamValue::Scalar(s) => {
                            insert_unique(&mut result, item_prefix, s.clone())?
                        }
                        ParamValue::Map(nested) => {
                            for (nested_key, nested_value) in marshal(nested)? {
                                insert_unique(
                                    &mut result,
                                    format!("{}.{}", item_prefix, nested_key),
                                    nested_value,
                                )?;
                            }
                        }
                        ParamValue::List(_) => {
                            return Err(EmrError::invalid_parameter(format!(
                                "'{}' element {} is a list; list elements must be strings or maps",
                                key,
                                index + 1
                            )));
                        }
                    }
                }
            }
            ParamValue::Map(nested) => {
                for (nested_key, nested_value) in marshal(nested)? {
                    insert_unique(
                        &mut result,
                        format!("{}.{}", name, nested_key),
                        nested_value,
                    )?;
                }
            }
        }
    }
    Ok(result)
}

fn insert_unique(result: &mut FlatParams, key: String, value: String) -> EmrResult<()> {
    if result.contains_key(&key) {
        return Err(EmrError::invalid_parameter(format!(
            "Parameter '{}' is produced by more than one field",
            key
        )));
    }
    result.insert(key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(entries: Vec<(&str, ParamValue)>) -> ParamMap {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn camelize_matches_wire_names() {
        assert_eq!(camelize("job_flow_ids"), "JobFlowIds");
        assert_eq!(camelize("instance_count"), "InstanceCount");
        assert_eq!(camelize("hadoop_jar_step"), "HadoopJarStep");
        assert_eq!(camelize("ec2_key_name"), "Ec2KeyName");
        assert_eq!(camelize("name"), "Name");
        assert_eq!(camelize("action_on_failure"), "ActionOnFailure");
        assert_eq!(camelize("keep_job_flow_alive_when_no_steps"), "KeepJobFlowAliveWhenNoSteps");
    }

    #[test]
    fn camelize_edge_cases() {
        assert_eq!(camelize(""), "");
        assert_eq!(camelize("a"), "A");
        assert_eq!(camelize("a__b"), "A_b");
        assert_eq!(camelize("trailing_"), "Trailing_");
        assert_eq!(camelize("_leading"), "_leading");
        assert_eq!(camelize("AlreadyCased"), "AlreadyCased");
    }

    #[test]
    fn camelize_namespaced_path() {
        assert_eq!(camelize("active_model/errors"), "ActiveModel::Errors");
    }

    #[test]
    fn scalars_are_cased() {
        let params = tree(vec![
            ("operation", "DescribeJobFlows".into()),
            ("log_uri", "s3://bucket/logs".into()),
        ]);
        let flat = marshal(&params).unwrap();
        assert_eq!(flat["Operation"], "DescribeJobFlows");
        assert_eq!(flat["LogUri"], "s3://bucket/logs");
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn string_lists_use_member_indices() {
        let params = tree(vec![("job_flow_ids", vec!["j-1", "j-2", "j-3"].into())]);
        let flat = marshal(&params).unwrap();
        assert_eq!(flat["JobFlowIds.member.1"], "j-1");
        assert_eq!(flat["JobFlowIds.member.2"], "j-2");
        assert_eq!(flat["JobFlowIds.member.3"], "j-3");
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn empty_list_emits_nothing() {
        let params = tree(vec![("job_flow_ids", ParamValue::List(vec![]))]);
        assert!(marshal(&params).unwrap().is_empty());
    }

    #[test]
    fn nested_maps_are_dotted() {
        let params = tree(vec![(
            "instances",
            ParamValue::map([
                ("instance_count", ParamValue::from("4")),
                ("master_instance_type", "m1.small".into()),
                ("placement", ParamValue::map([("availability_zone", "us-east-1a")])),
            ]),
        )]);
        let flat = marshal(&params).unwrap();
        assert_eq!(flat["Instances.InstanceCount"], "4");
        assert_eq!(flat["Instances.MasterInstanceType"], "m1.small");
        assert_eq!(flat["Instances.Placement.AvailabilityZone"], "us-east-1a");
    }

    #[test]
    fn lists_of_maps_recurse_with_lists_inside() {
        let step = ParamValue::map([
            ("name", ParamValue::from("Setup Hive")),
            ("action_on_failure", "TERMINATE_JOB_FLOW".into()),
            (
                "hadoop_jar_step",
                ParamValue::map([
                    ("jar", ParamValue::from("s3://elasticmapreduce/libs/script-runner/script-runner.jar")),
                    ("args", vec!["--install-hive", "--hive-versions", "latest"].into()),
                ]),
            ),
        ]);
        let params = tree(vec![
            ("job_flow_id", "j-1".into()),
            ("steps", ParamValue::List(vec![step])),
        ]);
        let flat = marshal(&params).unwrap();
        assert_eq!(flat["JobFlowId"], "j-1");
        assert_eq!(flat["Steps.member.1.Name"], "Setup Hive");
        assert_eq!(flat["Steps.member.1.ActionOnFailure"], "TERMINATE_JOB_FLOW");
        assert_eq!(
            flat["Steps.member.1.HadoopJarStep.Jar"],
            "s3://elasticmapreduce/libs/script-runner/script-runner.jar"
        );
        assert_eq!(flat["Steps.member.1.HadoopJarStep.Args.member.1"], "--install-hive");
        assert_eq!(flat["Steps.member.1.HadoopJarStep.Args.member.3"], "latest");
    }

    #[test]
    fn list_inside_list_is_rejected() {
        let params = tree(vec![(
            "steps",
            ParamValue::List(vec![ParamValue::List(vec!["x".into()])]),
        )]);
        let err = marshal(&params).unwrap_err();
        assert_eq!(err.kind, crate::error::EmrErrorKind::InvalidParameter);
    }

    #[test]
    fn casing_collision_is_rejected() {
        let params = tree(vec![("foo_bar", "1".into()), ("fooBar", "2".into())]);
        let err = marshal(&params).unwrap_err();
        assert!(err.message.contains("FooBar"));
    }

    #[test]
    fn flattened_keys_decode_back_to_the_same_shape() {
        let params = tree(vec![
            ("name", "flow".into()),
            ("tags", vec!["a", "b"].into()),
            (
                "instances",
                ParamValue::map([
                    ("instance_groups", ParamValue::List(vec![
                        ParamValue::map([("market", "ON_DEMAND")]),
                        ParamValue::map([("market", "SPOT")]),
                    ])),
                ]),
            ),
        ]);
        let flat = marshal(&params).unwrap();

        // Naive decode: split on '.', treat "member" as a list marker.
        let mut shapes: Vec<String> = flat
            .keys()
            .map(|k| {
                let parts: Vec<&str> = k.split('.').collect();
                let mut shape = Vec::new();
                let mut i = 0;
                while i < parts.len() {
                    if parts[i] == "member" {
                        shape.push(format!("[{}]", parts[i + 1]));
                        i += 2;
                    } else {
                        shape.push(parts[i].to_string());
                        i += 1;
                    }
                }
                shape.join("/")
            })
            .collect();
        shapes.sort();
        assert_eq!(
            shapes,
            vec![
                "Instances/InstanceGroups/[1]/Market",
                "Instances/InstanceGroups/[2]/Market",
                "Name",
                "Tags/[1]",
                "Tags/[2]",
            ]
        );
    }
}
