pub mod email;
pub mod ids;
pub mod organization_role;
pub mod timestamp;
pub mod validation_helpers;

pub use email::Email;
pub use ids::{ActivityId, OrganizationId, SessionId, UserId, WorkspaceId};
pub use organization_role::OrganizationRole;
