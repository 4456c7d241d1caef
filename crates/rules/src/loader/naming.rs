//! Naming-rule line grammar: `KEYWORD,KEY="value"[,KEY="value"]...`.

use namedev_core::UnnamedRulePolicy;

use crate::record::{Bus, KernelName, MatchRule, Name, RuleKind, RuleRecord};
use crate::tokenizer::{self, Field};

use super::error::LineError;

/// Parse one naming-rule line into a record.
pub(super) fn parse_rule_line(
    line: &str,
    policy: UnnamedRulePolicy,
) -> Result<RuleRecord, LineError> {
    let (keyword, rest) = tokenizer::split_keyword(line);
    match RuleKind::from_keyword(keyword) {
        Some(RuleKind::Label) => parse_bus_rule(rest, policy, |bus| MatchRule::Label { bus }),
        Some(RuleKind::Number) => parse_bus_rule(rest, policy, |bus| MatchRule::Number { bus }),
        Some(RuleKind::Topology) => parse_bus_rule(rest, policy, |bus| MatchRule::Topology { bus }),
        Some(RuleKind::Replace) => parse_replace(rest),
        Some(RuleKind::KernelName) | None => Err(LineError::UnknownKeyword(keyword.to_string())),
    }
}

/// `LABEL` / `NUMBER` / `TOPOLOGY`: `BUS="..."`, then `NAME="..."` unless
/// unnamed rules are collapsed onto the empty key.
fn parse_bus_rule(
    rest: &str,
    policy: UnnamedRulePolicy,
    rule: impl FnOnce(Bus) -> MatchRule,
) -> Result<RuleRecord, LineError> {
    let bus_field = require(rest, "BUS")?;
    let bus = Bus::new("bus", bus_field.value)?;
    let name = match policy {
        UnnamedRulePolicy::RequireName => require_name(bus_field.rest)?,
        UnnamedRulePolicy::Collapse => Name::default(),
    };
    Ok(RuleRecord::from_match(name, rule(bus)))
}

/// `REPLACE`: `KERNEL="..."` followed by `NAME="..."`.
fn parse_replace(rest: &str) -> Result<RuleRecord, LineError> {
    let kernel = require(rest, "KERNEL")?;
    let kernel_name = KernelName::new("kernel_name", kernel.value)?;
    let name = require_name(kernel.rest)?;
    Ok(RuleRecord::from_match(name, MatchRule::Replace { kernel_name }))
}

/// `NAME="..."` with a non-empty value. An empty name would share the key
/// of every other unnamed record.
fn require_name(rest: &str) -> Result<Name, LineError> {
    let field = require(rest, "NAME")?;
    if field.value.is_empty() {
        return Err(LineError::MissingField("NAME"));
    }
    Ok(Name::new("name", field.value)?)
}

/// Like [`tokenizer::extract_value`], but an exhausted line reports the
/// missing key instead of a mismatch.
fn require<'a>(rest: &'a str, key: &'static str) -> Result<Field<'a>, LineError> {
    if rest.trim().is_empty() {
        return Err(LineError::MissingField(key));
    }
    Ok(tokenizer::extract_value(rest, key)?)
}
