use sqlx::{FromRow, SqliteExecutor};

use crate::app::domain::{timestamp, OrganizationId, OrganizationRole, UserId};

/// Database row for organizations table.
#[derive(Debug, Clone, FromRow)]
pub struct Organization {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: i64,
}

impl Organization {
    pub fn parsed_id(&self) -> Result<OrganizationId, ulid::DecodeError> {
        OrganizationId::from_string(&self.id)
    }
}

/// Data structure for inserting a new organization.
pub struct NewOrganization {
    pub id: OrganizationId,
    pub slug: String,
    pub name: String,
}

/// Organization joined with the caller's membership role.
#[derive(Debug, FromRow)]
pub struct Membership {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: i64,
    pub role: String,
}

/// Member row joined with user details.
#[derive(Debug, FromRow)]
pub struct MemberWithEmail {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: i64,
}

/// Find an organization by ID.
pub async fn find_by_id<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<Option<Organization>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Organization>(
        "SELECT id, slug, name, created_at FROM organizations WHERE id = ?",
    )
    .bind(organization_id.as_str())
    .fetch_optional(executor)
    .await
}

/// Find an organization by its unique slug.
pub async fn find_by_slug<'e, E>(executor: E, slug: &str) -> Result<Option<Organization>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Organization>(
        "SELECT id, slug, name, created_at FROM organizations WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(executor)
    .await
}

/// Insert a new organization.
pub async fn insert<'e, E>(executor: E, organization: &NewOrganization) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("INSERT INTO organizations (id, slug, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(organization.id.as_str())
        .bind(&organization.slug)
        .bind(&organization.name)
        .bind(timestamp::now_unix())
        .execute(executor)
        .await?;
    Ok(())
}

/// Add a user to an organization with a specific role.
pub async fn add_member<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    user_id: &UserId,
    role: OrganizationRole,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO organization_members (organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(organization_id.as_str())
    .bind(user_id.as_str())
    .bind(role.to_string())
    .bind(timestamp::now_unix())
    .execute(executor)
    .await?;
    Ok(())
}

/// Find a member's role in an organization. Returns None if not a member.
pub async fn find_member_role<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    user_id: &UserId,
) -> Result<Option<OrganizationRole>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<String> = sqlx::query_scalar(
        "SELECT role FROM organization_members WHERE organization_id = ? AND user_id = ?",
    )
    .bind(organization_id.as_str())
    .bind(user_id.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(row.and_then(|r| r.parse::<OrganizationRole>().ok()))
}

/// Change a member's role. Returns true if a membership row was updated.
pub async fn update_member_role<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    user_id: &UserId,
    role: OrganizationRole,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE organization_members SET role = ? WHERE organization_id = ? AND user_id = ?",
    )
    .bind(role.to_string())
    .bind(organization_id.as_str())
    .bind(user_id.as_str())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Count members holding exactly `role`.
pub async fn count_members_with_role<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    role: OrganizationRole,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar(
        "SELECT count(*) FROM organization_members WHERE organization_id = ? AND role = ?",
    )
    .bind(organization_id.as_str())
    .bind(role.to_string())
    .fetch_one(executor)
    .await
}

/// List members of an organization with their email, oldest membership first.
pub async fn list_members_with_email<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<Vec<MemberWithEmail>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, MemberWithEmail>(
        r#"
        SELECT m.user_id, u.email, u.display_name, m.role, m.created_at
        FROM organization_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.organization_id = ?
        ORDER BY m.created_at, m.rowid
        "#,
    )
    .bind(organization_id.as_str())
    .fetch_all(executor)
    .await
}

/// A single member with user details.
pub async fn find_member_with_email<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    user_id: &UserId,
) -> Result<Option<MemberWithEmail>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, MemberWithEmail>(
        r#"
        SELECT m.user_id, u.email, u.display_name, m.role, m.created_at
        FROM organization_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.organization_id = ? AND m.user_id = ?
        "#,
    )
    .bind(organization_id.as_str())
    .bind(user_id.as_str())
    .fetch_optional(executor)
    .await
}

/// Organizations a user belongs to, with the user's role in each.
pub async fn list_for_user<'e, E>(executor: E, user_id: &UserId) -> Result<Vec<Membership>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Membership>(
        r#"
        SELECT o.id, o.slug, o.name, o.created_at, m.role
        FROM organization_members m
        JOIN organizations o ON o.id = m.organization_id
        WHERE m.user_id = ?
        ORDER BY o.name
        "#,
    )
    .bind(user_id.as_str())
    .fetch_all(executor)
    .await
}
