//! Rewrite rule table
//!
//! Rules have the form `<dotted-path>-><replacement>`. A non-empty
//! replacement substitutes the field's type with that literal text; an
//! empty one unrolls the field into its parent. Every strict prefix of a
//! rule's path is registered as a pass-through marker so the rewriter keeps
//! descending towards the rule instead of stopping at an ancestor.

use crate::error::{RestructError, Result};
use std::collections::BTreeMap;
use std::fmt;

pub const RULE_SEPARATOR: &str = "->";

/// Dotted route to a nested field, starting at the subject type.
///
/// Embedded fields contribute no segment. The root path is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path. Leading, trailing and repeated dots are ignored,
    /// so `A.B`, `.A.B` and `.A..B.` all name the same field.
    pub fn parse(dotted: &str) -> Self {
        dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .fold(Self::root(), |path, segment| path.child(segment))
    }

    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Ancestor of a rule target: keep descending.
    PassThrough,
    /// Expand the field in place, flattening record fields into the parent.
    Unroll,
    /// Emit the literal text and stop descending.
    Replace(String),
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::PassThrough => f.write_str("pass-through"),
            RuleAction::Unroll => f.write_str("unroll"),
            RuleAction::Replace(text) => write!(f, "replace with `{}`", text),
        }
    }
}

/// Prefix-closed mapping from field paths to rule actions.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    actions: BTreeMap<FieldPath, RuleAction>,
}

impl RuleTable {
    /// Build a table from rules applied in input order.
    pub fn parse<I, S>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for rule in rules {
            table.insert_rule(rule.as_ref())?;
        }
        tracing::debug!(entries = table.len(), "rule table built");
        Ok(table)
    }

    /// Register one rule. A rule overwrites whatever was registered for its
    /// exact path; its ancestors only become pass-through markers if they
    /// carry no action yet.
    pub fn insert_rule(&mut self, rule: &str) -> Result<()> {
        let (dotted, replacement) = rule
            .split_once(RULE_SEPARATOR)
            .ok_or_else(|| RestructError::MalformedRule(rule.to_string()))?;

        let target = FieldPath::parse(dotted);
        let mut prefix = FieldPath::root();
        let segments: Vec<&str> = target.segments().collect();
        if let Some((_, ancestors)) = segments.split_last() {
            for segment in ancestors {
                prefix = prefix.child(segment);
                self.actions
                    .entry(prefix.clone())
                    .or_insert(RuleAction::PassThrough);
            }
        }

        let action = if replacement.is_empty() {
            RuleAction::Unroll
        } else {
            RuleAction::Replace(replacement.to_string())
        };
        self.actions.insert(target, action);
        Ok(())
    }

    pub fn get(&self, path: &FieldPath) -> Option<&RuleAction> {
        self.actions.get(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &RuleAction)> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action<'a>(table: &'a RuleTable, path: &str) -> Option<&'a RuleAction> {
        table.get(&FieldPath::parse(path))
    }

    #[test]
    fn test_field_path_parse_and_child() {
        assert_eq!(FieldPath::parse(".A.B"), FieldPath::root().child("A").child("B"));
        assert_eq!(FieldPath::parse("A.B"), FieldPath::parse(".A..B."));
        assert!(FieldPath::parse("").is_root());
        assert_eq!(FieldPath::parse("A.B").as_str(), ".A.B");
        assert_eq!(FieldPath::root().to_string(), ".");
    }

    #[test]
    fn test_prefixes_registered_as_pass_through() {
        let table = RuleTable::parse([".Linux.Resources.Memory->MemoryLimits"]).unwrap();

        assert_eq!(action(&table, ".Linux"), Some(&RuleAction::PassThrough));
        assert_eq!(
            action(&table, ".Linux.Resources"),
            Some(&RuleAction::PassThrough)
        );
        assert_eq!(
            action(&table, ".Linux.Resources.Memory"),
            Some(&RuleAction::Replace("MemoryLimits".to_string()))
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_replacement_is_unroll() {
        let table = RuleTable::parse([".Process->"]).unwrap();
        assert_eq!(action(&table, ".Process"), Some(&RuleAction::Unroll));
    }

    #[test]
    fn test_replacement_split_at_first_separator() {
        let table = RuleTable::parse([".F->func()->int"]).unwrap();
        assert_eq!(
            action(&table, ".F"),
            Some(&RuleAction::Replace("func()->int".to_string()))
        );
    }

    #[test]
    fn test_later_rule_on_same_path_wins() {
        let table = RuleTable::parse([".A.B->X", ".A.B->Y"]).unwrap();
        assert_eq!(
            action(&table, ".A.B"),
            Some(&RuleAction::Replace("Y".to_string()))
        );
    }

    #[test]
    fn test_explicit_rule_not_downgraded_by_later_descendant() {
        let table = RuleTable::parse([".A->", ".A.B->X"]).unwrap();
        assert_eq!(action(&table, ".A"), Some(&RuleAction::Unroll));

        let table = RuleTable::parse([".A.B->X", ".A->"]).unwrap();
        assert_eq!(action(&table, ".A"), Some(&RuleAction::Unroll));
    }

    #[test]
    fn test_disjoint_rule_order_is_irrelevant() {
        let forward = RuleTable::parse([".A.X->int", ".B.Y->", ".C->string"]).unwrap();
        let backward = RuleTable::parse([".C->string", ".B.Y->", ".A.X->int"]).unwrap();

        let forward: Vec<_> = forward.iter().collect();
        let backward: Vec<_> = backward.iter().collect();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_missing_separator_is_rejected() {
        let err = RuleTable::parse([".A->X", ".B=Y"]).unwrap_err();
        assert!(matches!(err, RestructError::MalformedRule(rule) if rule == ".B=Y"));
    }

    #[test]
    fn test_empty_path_targets_root() {
        let table = RuleTable::parse(["->Other"]).unwrap();
        assert_eq!(
            table.get(&FieldPath::root()),
            Some(&RuleAction::Replace("Other".to_string()))
        );
    }
}
