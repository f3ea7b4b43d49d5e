use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Organization role, totally ordered: `Viewer < Editor < Admin < Owner`.
///
/// Stored lowercase in the database, serialized uppercase in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "lowercase")]
pub enum OrganizationRole {
    Viewer,
    Editor,
    Admin,
    Owner,
}

impl OrganizationRole {
    pub const ALL: [OrganizationRole; 4] = [
        OrganizationRole::Viewer,
        OrganizationRole::Editor,
        OrganizationRole::Admin,
        OrganizationRole::Owner,
    ];

    /// Numeric rank used by permission checks.
    pub fn rank(self) -> u8 {
        match self {
            OrganizationRole::Viewer => 0,
            OrganizationRole::Editor => 1,
            OrganizationRole::Admin => 2,
            OrganizationRole::Owner => 3,
        }
    }

    /// True when this role is at least `required`.
    pub fn satisfies(self, required: OrganizationRole) -> bool {
        self.rank() >= required.rank()
    }
}
