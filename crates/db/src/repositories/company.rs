//! Company repository for database operations.

use outlay_core::workflow::{Company, WorkflowError};
use outlay_shared::types::{CompanyId, Currency, UserId};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;

use super::mapping::{company_from_model, db_err};
use crate::entities::{companies, users};

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company keeping its books in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_company(
        &self,
        name: &str,
        currency: Currency,
    ) -> Result<Company, WorkflowError> {
        let now = chrono::Utc::now().into();
        let company = companies::ActiveModel {
            id: Set(CompanyId::new().into_inner()),
            name: Set(name.trim().to_string()),
            currency: Set(currency.as_str().to_string()),
            admin_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = company.insert(&self.db).await.map_err(db_err)?;
        info!(company_id = %model.id, currency = %currency, "Company created");
        company_from_model(model)
    }

    /// Finds a company by ID.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if it does not exist.
    pub async fn find(&self, company_id: CompanyId) -> Result<Company, WorkflowError> {
        let model = companies::Entity::find_by_id(company_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CompanyNotFound(company_id))?;
        company_from_model(model)
    }

    /// Designates `user_id` as the company's administrator.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` unless the user belongs to the company.
    pub async fn set_admin(
        &self,
        company_id: CompanyId,
        user_id: UserId,
    ) -> Result<Company, WorkflowError> {
        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .filter(|u| u.company_id == Some(company_id.into_inner()))
            .ok_or(WorkflowError::UserNotFound(user_id))?;

        let company = companies::Entity::find_by_id(company_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CompanyNotFound(company_id))?;

        let mut active: companies::ActiveModel = company.into();
        active.admin_id = Set(Some(user.id));
        active.updated_at = Set(chrono::Utc::now().into());

        let model = active.update(&self.db).await.map_err(db_err)?;
        company_from_model(model)
    }
}
