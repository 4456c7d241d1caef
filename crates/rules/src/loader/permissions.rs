//! Permissions line grammar: `name:owner:group:mode`.

use crate::record::{Group, Name, Owner, PermissionOverlay, RuleRecord};

use super::error::LineError;

/// Parse one permissions line. Missing trailing fields come out blank (mode 0)
/// and therefore never overwrite stored values when merged.
pub(super) fn parse_permission_line(line: &str) -> Result<RuleRecord, LineError> {
    let mut parts = line.splitn(4, ':');
    let name = Name::new("name", parts.next().unwrap_or(""))?;
    let owner = Owner::new("owner", parts.next().unwrap_or(""))?;
    let group = Group::new("group", parts.next().unwrap_or(""))?;
    let mode = parts.next().map(parse_octal_mode).unwrap_or(0);

    Ok(RuleRecord::from_permissions(
        name,
        PermissionOverlay { owner, group, mode },
    ))
}

/// Permissive base-8 parse: leading whitespace and an optional `+` are
/// skipped, digits are read up to the first non-octal character. No digits,
/// or a leading `-`, yields 0. Overflow saturates.
pub fn parse_octal_mode(s: &str) -> u32 {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    s.chars()
        .map_while(|c| c.to_digit(8))
        .fold(0u32, |acc, d| acc.saturating_mul(8).saturating_add(d))
}
