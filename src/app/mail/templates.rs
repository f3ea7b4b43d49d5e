//! Plain-text bodies for transactional email.

use super::EmailMessage;
use crate::app::{db::organizations::Organization, domain::{Email, OrganizationRole}, APP_NAME};

/// Sent to the creator after a new organization is set up.
pub fn organization_created(to: Email, organization: &Organization, app_url: &str) -> EmailMessage {
    EmailMessage::new(
        to,
        format!("Your organization {} is ready", organization.name),
        format!(
            "Your {APP_NAME} organization \"{}\" has been created.\n\n\
             You are its owner. Manage it at {app_url}/orgs/{}\n",
            organization.name, organization.slug
        ),
    )
}

/// Sent to a user who was added to an organization by an admin.
pub fn member_added(
    to: Email,
    organization: &Organization,
    role: OrganizationRole,
    added_by: &str,
    app_url: &str,
) -> EmailMessage {
    EmailMessage::new(
        to,
        format!("You have been added to {}", organization.name),
        format!(
            "{added_by} added you to \"{}\" on {APP_NAME} as {}.\n\n\
             Open it at {app_url}/orgs/{}\n",
            organization.name,
            role.to_string().to_uppercase(),
            organization.slug
        ),
    )
}
