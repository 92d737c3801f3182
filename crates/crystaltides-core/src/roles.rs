//! Role registry.
//!
//! Roles are case-insensitive identifiers. Each known role has a numeric
//! priority (0-100) used for ordering and for promotion checks, and belongs
//! to a tier used for route gating:
//!
//! | Role | Priority | Tier |
//! |------|----------|------|
//! | `neroferno`, `killuwu` | 100 | admin |
//! | `killu` | 95 | admin |
//! | `developer` | 90 | admin |
//! | `admin` | 80 | admin |
//! | `staff`, `moderator`, `mod` | 60 | moderator |
//! | `helper` | 40 | moderator |
//! | `fundador` | 20 | member |
//! | `donador` | 10 | member |
//! | `user` | 0 | member |
//!
//! Unknown or absent roles resolve to priority 0 and the member tier.
//! [`ADMIN_ROLES`] is the admin tier; [`STAFF_ROLES`] is the admin tier plus
//! the moderator tier.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The highest priority; holders may modify peers of equal rank.
pub const MAX_PRIORITY: u8 = 100;

pub const DEFAULT_ROLE: &str = "user";

pub const ADMIN_ROLES: &[&str] = &["neroferno", "killuwu", "killu", "developer", "admin"];

pub const STAFF_ROLES: &[&str] = &[
    "neroferno",
    "killuwu",
    "killu",
    "developer",
    "admin",
    "staff",
    "moderator",
    "mod",
    "helper",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleTier {
    Admin,
    Moderator,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleInfo {
    pub name: &'static str,
    pub priority: u8,
    pub tier: RoleTier,
}

const ROLE_TABLE: &[RoleInfo] = &[
    RoleInfo { name: "neroferno", priority: 100, tier: RoleTier::Admin },
    RoleInfo { name: "killuwu", priority: 100, tier: RoleTier::Admin },
    RoleInfo { name: "killu", priority: 95, tier: RoleTier::Admin },
    RoleInfo { name: "developer", priority: 90, tier: RoleTier::Admin },
    RoleInfo { name: "admin", priority: 80, tier: RoleTier::Admin },
    RoleInfo { name: "staff", priority: 60, tier: RoleTier::Moderator },
    RoleInfo { name: "moderator", priority: 60, tier: RoleTier::Moderator },
    RoleInfo { name: "mod", priority: 60, tier: RoleTier::Moderator },
    RoleInfo { name: "helper", priority: 40, tier: RoleTier::Moderator },
    RoleInfo { name: "fundador", priority: 20, tier: RoleTier::Member },
    RoleInfo { name: "donador", priority: 10, tier: RoleTier::Member },
    RoleInfo { name: "user", priority: 0, tier: RoleTier::Member },
];

static REGISTRY: LazyLock<HashMap<&'static str, RoleInfo>> =
    LazyLock::new(|| ROLE_TABLE.iter().map(|info| (info.name, *info)).collect());

/// Lower-cases and trims a role identifier.
pub fn normalize_role(role: &str) -> String {
    role.trim().to_lowercase()
}

/// Looks up a role's registry entry, ignoring case.
pub fn lookup(role: &str) -> Option<RoleInfo> {
    REGISTRY.get(normalize_role(role).as_str()).copied()
}

/// Priority of a role. Unknown or absent roles resolve to 0.
pub fn role_priority(role: Option<&str>) -> u8 {
    role.and_then(lookup).map_or(0, |info| info.priority)
}

pub fn role_tier(role: &str) -> RoleTier {
    lookup(role).map_or(RoleTier::Member, |info| info.tier)
}

/// All registered roles, highest priority first.
pub fn known_roles() -> &'static [RoleInfo] {
    ROLE_TABLE
}

/// A named allow-list used to gate routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSet {
    Admin,
    Staff,
}

impl RoleSet {
    pub fn members(&self) -> &'static [&'static str] {
        match self {
            RoleSet::Admin => ADMIN_ROLES,
            RoleSet::Staff => STAFF_ROLES,
        }
    }

    /// Whether `role` (any case) belongs to this set.
    pub fn contains(&self, role: &str) -> bool {
        let role = normalize_role(role);
        self.members().contains(&role.as_str())
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoleSet::Admin => "admin",
            RoleSet::Staff => "staff",
        }
    }
}

pub fn is_admin(role: &str) -> bool {
    RoleSet::Admin.contains(role)
}

pub fn is_staff(role: &str) -> bool {
    RoleSet::Staff.contains(role)
}
