//! Account directory: user management and sign-in

use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::AccountId;

use crate::account::{Account, Actor, NewAccount, ProfileUpdate, Role};
use crate::error::LedgerError;
use crate::ports::AccountStore;

#[derive(Clone)]
pub struct AccountDirectory {
    accounts: Arc<dyn AccountStore>,
}

impl AccountDirectory {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    #[instrument(skip(self, actor, input), fields(admin = %actor.account_id))]
    pub async fn create_account(&self, actor: &Actor, input: NewAccount) -> Result<Account, LedgerError> {
        actor.require_admin()?;
        let account = input.into_account()?;
        let created = self.accounts.insert_account(account).await?;
        info!(account_id = %created.id, role = %created.role, "Account created");
        Ok(created)
    }

    /// Creates the first administrator when the store is empty
    ///
    /// Returns `None` if any account already exists.
    pub async fn bootstrap_admin(&self, name: &str, pin: &str) -> Result<Option<Account>, LedgerError> {
        if self.accounts.count_accounts().await? > 0 {
            return Ok(None);
        }
        let account = NewAccount {
            name: name.to_string(),
            pin: pin.to_string(),
            role: Role::Admin,
            salary: None,
        }
        .into_account()?;
        let created = self.accounts.insert_account(account).await?;
        info!(account_id = %created.id, "Bootstrapped administrator");
        Ok(Some(created))
    }

    #[instrument(skip(self, actor, update), fields(admin = %actor.account_id))]
    pub async fn update_profile(
        &self,
        actor: &Actor,
        id: AccountId,
        update: ProfileUpdate,
    ) -> Result<Account, LedgerError> {
        actor.require_admin()?;
        let update = update.validated()?;
        if update.is_empty() {
            return Ok(self.accounts.get_account(id).await?);
        }
        Ok(self.accounts.update_profile(id, update).await?)
    }

    /// Ledger and expense rows keep the now dangling owner id
    #[instrument(skip(self, actor), fields(admin = %actor.account_id))]
    pub async fn delete_account(&self, actor: &Actor, id: AccountId) -> Result<(), LedgerError> {
        actor.require_admin()?;
        if actor.account_id == id {
            return Err(LedgerError::validation("administrators cannot delete their own account"));
        }
        self.accounts.delete_account(id).await?;
        info!("Account deleted");
        Ok(())
    }

    pub async fn list_accounts(&self, actor: &Actor) -> Result<Vec<Account>, LedgerError> {
        actor.require_admin()?;
        Ok(self.accounts.list_accounts().await?)
    }

    /// Fetches one account; users may only see themselves
    pub async fn get_account(&self, actor: &Actor, id: AccountId) -> Result<Account, LedgerError> {
        if actor.account_id != id {
            actor.require_admin()?;
        }
        Ok(self.accounts.get_account(id).await?)
    }

    /// Name + PIN sign-in; never says which half was wrong
    pub async fn authenticate(&self, name: &str, pin: &str) -> Result<Account, LedgerError> {
        match self.accounts.find_by_name(name.trim()).await? {
            Some(account) if account.verify_pin(pin) => Ok(account),
            _ => {
                warn!("Failed sign-in attempt");
                Err(LedgerError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryAccountStore;

    async fn directory_with_admin() -> (AccountDirectory, Account) {
        let directory = AccountDirectory::new(Arc::new(MemoryAccountStore::new()));
        let admin = directory.bootstrap_admin("root", "0000").await.unwrap().unwrap();
        (directory, admin)
    }

    fn user(name: &str) -> NewAccount {
        NewAccount {
            name: name.to_string(),
            pin: "1111".to_string(),
            role: Role::User,
            salary: None,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_only_once() {
        let (directory, _) = directory_with_admin().await;
        assert!(directory.bootstrap_admin("other", "0000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (directory, admin) = directory_with_admin().await;
        let found = directory.authenticate("root", "0000").await.unwrap();
        assert_eq!(found.id, admin.id);

        assert!(matches!(
            directory.authenticate("root", "9999").await,
            Err(LedgerError::InvalidCredentials)
        ));
        assert!(matches!(
            directory.authenticate("nobody", "0000").await,
            Err(LedgerError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_only_admins_manage_accounts() {
        let (directory, admin) = directory_with_admin().await;
        let created = directory.create_account(&admin.actor(), user("Devi")).await.unwrap();

        let err = directory
            .create_account(&created.actor(), user("Esha"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));

        let err = directory.list_accounts(&created.actor()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_validation() {
        let (directory, admin) = directory_with_admin().await;
        directory.create_account(&admin.actor(), user("Farah")).await.unwrap();
        let err = directory
            .create_account(&admin.actor(), user(" Farah "))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let (directory, admin) = directory_with_admin().await;
        let created = directory.create_account(&admin.actor(), user("Gopal")).await.unwrap();

        directory.delete_account(&admin.actor(), created.id).await.unwrap();
        assert!(directory
            .get_account(&admin.actor(), created.id)
            .await
            .unwrap_err()
            .is_not_found());

        assert!(directory.delete_account(&admin.actor(), admin.id).await.is_err());
    }
}
