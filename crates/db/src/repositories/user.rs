//! User repository for database operations.

use outlay_core::workflow::{
    CompanyDirectory, DirectoryEntry, ManagerHierarchy, UserProfile, UserRole, WorkflowError,
};
use outlay_shared::types::{CompanyId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::mapping::{db_err, profile_from_model};
use crate::entities::users;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Company to join; `None` while onboarding.
    pub company_id: Option<CompanyId>,
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Role inside the company.
    pub role: UserRole,
    /// Direct manager, who must belong to the same company.
    pub manager_id: Option<UserId>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, WorkflowError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Loads the workflow view of a user.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub async fn find_profile(&self, user_id: UserId) -> Result<UserProfile, WorkflowError> {
        let model = find_user(&self.db, user_id).await?;
        Ok(profile_from_model(&model))
    }

    /// Creates a new user.
    ///
    /// A new user has no reports yet, so any manager from the same company
    /// is acyclic.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` when the manager is not in the user's company,
    /// or an error if the insert fails.
    pub async fn create_user(&self, input: CreateUserInput) -> Result<users::Model, WorkflowError> {
        if let Some(manager_id) = input.manager_id {
            let manager = find_user(&self.db, manager_id).await?;
            if input.company_id.is_none()
                || manager.company_id != input.company_id.map(CompanyId::into_inner)
            {
                return Err(WorkflowError::UserNotFound(manager_id));
            }
        }

        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(UserId::new().into_inner()),
            company_id: Set(input.company_id.map(CompanyId::into_inner)),
            email: Set(input.email.trim().to_lowercase()),
            full_name: Set(input.full_name),
            role: Set(input.role.into()),
            manager_id: Set(input.manager_id.map(UserId::into_inner)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = user.insert(&self.db).await.map_err(db_err)?;
        info!(user_id = %model.id, role = %input.role, "User created");
        Ok(model)
    }

    /// Sets or clears a user's manager.
    ///
    /// The company's users are locked for the duration so two concurrent
    /// assignments cannot close a loop between them.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` when either user is missing or the manager is in
    ///   another company
    /// - `ManagerCycle` when the user would become its own ancestor
    pub async fn assign_manager(
        &self,
        user_id: UserId,
        manager_id: Option<UserId>,
    ) -> Result<UserProfile, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let user = find_user(&txn, user_id).await?;
        let company_id = user
            .company_id
            .ok_or(WorkflowError::EmployeeWithoutCompany(user_id))?;

        let members = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(db_err)?;

        if let Some(manager_id) = manager_id
            && !members.iter().any(|m| m.id == manager_id.into_inner())
        {
            return Err(WorkflowError::UserNotFound(manager_id));
        }

        let hierarchy = ManagerHierarchy::from_pairs(members.iter().map(|m| {
            (
                UserId::from_uuid(m.id),
                m.manager_id.map(UserId::from_uuid),
            )
        }));
        hierarchy.validate_assignment(user_id, manager_id)?;

        let mut active: users::ActiveModel = user.into();
        active.manager_id = Set(manager_id.map(UserId::into_inner));
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            user_id = %user_id,
            manager_id = ?manager_id.map(UserId::into_inner),
            "Manager assigned"
        );
        Ok(profile_from_model(&updated))
    }

    /// Members of a company in role-resolution order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn company_directory(
        &self,
        company_id: CompanyId,
    ) -> Result<CompanyDirectory, WorkflowError> {
        load_directory(&self.db, company_id).await
    }

    /// Number of users reporting directly to `manager_id`.
    ///
    /// Only managers have a team; any other role counts as zero even when
    /// someone reports to them.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for an unknown user, or an error if the
    /// database query fails.
    pub async fn team_size(&self, manager_id: UserId) -> Result<u64, WorkflowError> {
        let manager = find_user(&self.db, manager_id).await?;
        if profile_from_model(&manager).role != UserRole::Manager {
            return Ok(0);
        }

        users::Entity::find()
            .filter(users::Column::ManagerId.eq(manager_id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}

pub(crate) async fn find_user<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<users::Model, WorkflowError> {
    users::Entity::find_by_id(user_id.into_inner())
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::UserNotFound(user_id))
}

/// Newest members first; "first user with a role" is the most recently
/// added one.
pub(crate) async fn load_directory<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
) -> Result<CompanyDirectory, WorkflowError> {
    let members = users::Entity::find()
        .filter(users::Column::CompanyId.eq(company_id.into_inner()))
        .order_by_desc(users::Column::CreatedAt)
        .order_by_desc(users::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(CompanyDirectory::new(
        members
            .into_iter()
            .map(|m| DirectoryEntry {
                user_id: UserId::from_uuid(m.id),
                role: m.role.into(),
            })
            .collect(),
    ))
}
