//! Rule records: the unit of storage and merge in the registry.
//!
//! A [`RuleRecord`] keeps every field flat so that merging two records with
//! different kinds never drops data. Typed views ([`Matcher`],
//! [`PermissionOverlay`]) are derived from the stored fields on demand.

use std::fmt;

use serde::{Serialize, Serializer};

pub const NAME_SIZE: usize = 100;
pub const KERNEL_NAME_SIZE: usize = 100;
pub const BUS_SIZE: usize = 50;
pub const ID_SIZE: usize = 50;
pub const PLACE_SIZE: usize = 50;
pub const OWNER_SIZE: usize = 30;
pub const GROUP_SIZE: usize = 30;
pub const SYSFS_FILE_SIZE: usize = 50;
pub const SYSFS_VALUE_SIZE: usize = 100;

/// A value did not fit in its bounded field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} is {len} bytes, limit is {max}")]
pub struct CapacityError {
    pub field: &'static str,
    pub max: usize,
    pub len: usize,
}

/// Owned string holding at most `N` bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BoundedString<const N: usize>(String);

impl<const N: usize> BoundedString<N> {
    /// Validate `value` against the bound. `field` names the field in the error.
    pub fn new(field: &'static str, value: &str) -> Result<Self, CapacityError> {
        if value.len() > N {
            return Err(CapacityError {
                field,
                max: N,
                len: value.len(),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the incoming value unless it is blank.
    fn overlay(&mut self, incoming: &Self) {
        if !incoming.is_empty() {
            self.0.clone_from(&incoming.0);
        }
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type Name = BoundedString<NAME_SIZE>;
pub type KernelName = BoundedString<KERNEL_NAME_SIZE>;
pub type Bus = BoundedString<BUS_SIZE>;
pub type Id = BoundedString<ID_SIZE>;
pub type Place = BoundedString<PLACE_SIZE>;
pub type Owner = BoundedString<OWNER_SIZE>;
pub type Group = BoundedString<GROUP_SIZE>;
pub type SysfsFile = BoundedString<SYSFS_FILE_SIZE>;
pub type SysfsValue = BoundedString<SYSFS_VALUE_SIZE>;

/// Rule kind stored on a record. `KernelName` is the default for records
/// that never carried a match rule (e.g. permission-only entries).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    #[default]
    KernelName,
    Label,
    Number,
    Topology,
    Replace,
}

impl RuleKind {
    /// Map a naming-file keyword (case-insensitive) to its kind.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        [
            ("LABEL", RuleKind::Label),
            ("NUMBER", RuleKind::Number),
            ("TOPOLOGY", RuleKind::Topology),
            ("REPLACE", RuleKind::Replace),
        ]
        .into_iter()
        .find(|(kw, _)| kw.eq_ignore_ascii_case(keyword))
        .map(|(_, kind)| kind)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::KernelName => write!(f, "KernelName"),
            RuleKind::Label => write!(f, "Label"),
            RuleKind::Number => write!(f, "Number"),
            RuleKind::Topology => write!(f, "Topology"),
            RuleKind::Replace => write!(f, "Replace"),
        }
    }
}

/// Match criteria parsed from one naming-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    Label { bus: Bus },
    Number { bus: Bus },
    Topology { bus: Bus },
    Replace { kernel_name: KernelName },
}

/// Borrowed, kind-specific view of a stored record's match fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher<'a> {
    KernelName,
    Label { bus: &'a str },
    Number { bus: &'a str },
    Topology { bus: &'a str },
    Replace { kernel_name: &'a str },
}

/// Owner, group and mode applied to a device node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionOverlay {
    pub owner: Owner,
    pub group: Group,
    pub mode: u32,
}

impl PermissionOverlay {
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty() && self.group.is_empty() && self.mode == 0
    }
}

impl fmt::Display for PermissionOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{:04o}", self.owner, self.group, self.mode)
    }
}

/// One registry entry, keyed by `name`.
///
/// `sysfs_file`, `sysfs_value`, `id` and `place` are not written by the
/// loaders; they belong to the matching engine and survive every merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleRecord {
    name: Name,
    kind: RuleKind,
    bus: Bus,
    sysfs_file: SysfsFile,
    sysfs_value: SysfsValue,
    id: Id,
    place: Place,
    kernel_name: KernelName,
    #[serde(serialize_with = "serialize_mode")]
    mode: u32,
    owner: Owner,
    group: Group,
}

fn serialize_mode<S: Serializer>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:04o}", mode))
}

impl RuleRecord {
    /// A record carrying only its key.
    pub fn named(name: Name) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn from_match(name: Name, rule: MatchRule) -> Self {
        let mut record = Self::named(name);
        match rule {
            MatchRule::Label { bus } => {
                record.kind = RuleKind::Label;
                record.bus = bus;
            }
            MatchRule::Number { bus } => {
                record.kind = RuleKind::Number;
                record.bus = bus;
            }
            MatchRule::Topology { bus } => {
                record.kind = RuleKind::Topology;
                record.bus = bus;
            }
            MatchRule::Replace { kernel_name } => {
                record.kind = RuleKind::Replace;
                record.kernel_name = kernel_name;
            }
        }
        record
    }

    /// A permission-only record; `kind` stays at its default.
    pub fn from_permissions(name: Name, overlay: PermissionOverlay) -> Self {
        Self {
            name,
            owner: overlay.owner,
            group: overlay.group,
            mode: overlay.mode,
            ..Self::default()
        }
    }

    pub fn with_sysfs(mut self, file: SysfsFile, value: SysfsValue) -> Self {
        self.sysfs_file = file;
        self.sysfs_value = value;
        self
    }

    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }

    pub fn with_place(mut self, place: Place) -> Self {
        self.place = place;
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn bus(&self) -> &str {
        self.bus.as_str()
    }

    pub fn kernel_name(&self) -> &str {
        self.kernel_name.as_str()
    }

    pub fn sysfs_file(&self) -> &str {
        self.sysfs_file.as_str()
    }

    pub fn sysfs_value(&self) -> &str {
        self.sysfs_value.as_str()
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn place(&self) -> &str {
        self.place.as_str()
    }

    pub fn owner(&self) -> &str {
        self.owner.as_str()
    }

    pub fn group(&self) -> &str {
        self.group.as_str()
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn matcher(&self) -> Matcher<'_> {
        match self.kind {
            RuleKind::KernelName => Matcher::KernelName,
            RuleKind::Label => Matcher::Label { bus: self.bus() },
            RuleKind::Number => Matcher::Number { bus: self.bus() },
            RuleKind::Topology => Matcher::Topology { bus: self.bus() },
            RuleKind::Replace => Matcher::Replace {
                kernel_name: self.kernel_name(),
            },
        }
    }

    /// Permission fields, or `None` when none were ever set.
    pub fn permissions(&self) -> Option<PermissionOverlay> {
        let overlay = PermissionOverlay {
            owner: self.owner.clone(),
            group: self.group.clone(),
            mode: self.mode,
        };
        (!overlay.is_empty()).then_some(overlay)
    }

    /// Overlay every set field of `incoming` onto `self`. Blank strings, a
    /// zero mode and the default kind never overwrite stored values.
    pub(crate) fn overlay(&mut self, incoming: &RuleRecord) {
        if incoming.kind != RuleKind::KernelName {
            self.kind = incoming.kind;
        }
        if incoming.mode != 0 {
            self.mode = incoming.mode;
        }
        self.bus.overlay(&incoming.bus);
        self.sysfs_file.overlay(&incoming.sysfs_file);
        self.sysfs_value.overlay(&incoming.sysfs_value);
        self.id.overlay(&incoming.id);
        self.place.overlay(&incoming.place);
        self.kernel_name.overlay(&incoming.kernel_name);
        self.owner.overlay(&incoming.owner);
        self.group.overlay(&incoming.group);
    }
}

impl fmt::Display for RuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} kind={}", self.name.as_str(), self.kind)?;
        match self.matcher() {
            Matcher::KernelName => {}
            Matcher::Label { bus } | Matcher::Number { bus } | Matcher::Topology { bus } => {
                write!(f, " bus={}", bus)?
            }
            Matcher::Replace { kernel_name } => write!(f, " kernel={}", kernel_name)?,
        }
        if let Some(perms) = self.permissions() {
            write!(f, " perms={}", perms)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new("name", s).unwrap()
    }

    #[test]
    fn bounded_string_rejects_oversized_values() {
        let err = Owner::new("owner", &"x".repeat(31)).unwrap_err();
        assert_eq!(
            err,
            CapacityError {
                field: "owner",
                max: 30,
                len: 31
            }
        );
        assert!(Owner::new("owner", &"x".repeat(30)).is_ok());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(RuleKind::from_keyword("label"), Some(RuleKind::Label));
        assert_eq!(RuleKind::from_keyword("Topology"), Some(RuleKind::Topology));
        assert_eq!(RuleKind::from_keyword("REPLACE"), Some(RuleKind::Replace));
        assert_eq!(RuleKind::from_keyword("KERNEL"), None);
        assert_eq!(RuleKind::from_keyword("LABEL "), None);
    }

    #[test]
    fn permission_only_record_defaults_to_kernel_name() {
        let record = RuleRecord::from_permissions(
            name("ttyS0"),
            PermissionOverlay {
                owner: Owner::new("owner", "root").unwrap(),
                group: Group::new("group", "dialout").unwrap(),
                mode: 0o660,
            },
        );
        assert_eq!(record.kind(), RuleKind::KernelName);
        assert_eq!(record.matcher(), Matcher::KernelName);
        assert_eq!(record.permissions().unwrap().to_string(), "root:dialout:0660");
    }

    #[test]
    fn overlay_switches_kind_but_keeps_old_match_fields() {
        let mut stored = RuleRecord::from_match(
            name("cam"),
            MatchRule::Label {
                bus: Bus::new("bus", "usb").unwrap(),
            },
        );
        let incoming = RuleRecord::from_match(
            name("cam"),
            MatchRule::Replace {
                kernel_name: KernelName::new("kernel_name", "video0").unwrap(),
            },
        );
        stored.overlay(&incoming);

        assert_eq!(stored.kind(), RuleKind::Replace);
        assert_eq!(stored.kernel_name(), "video0");
        assert_eq!(stored.bus(), "usb");
    }

    #[test]
    fn matcher_without_permissions_reports_none() {
        let record = RuleRecord::from_match(
            name("disk"),
            MatchRule::Number {
                bus: Bus::new("bus", "scsi").unwrap(),
            },
        );
        assert_eq!(record.matcher(), Matcher::Number { bus: "scsi" });
        assert!(record.permissions().is_none());
        assert_eq!(record.to_string(), "\"disk\" kind=Number bus=scsi");
    }

    #[test]
    fn mode_serializes_as_octal() {
        let record = RuleRecord::from_permissions(
            name("null"),
            PermissionOverlay {
                mode: 0o666,
                ..PermissionOverlay::default()
            },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["mode"], "0666");
        assert_eq!(json["kind"], "KernelName");
    }
}
