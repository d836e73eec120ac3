//! User administration service
//!
//! The `/users` surface: paginated listing with search terms, admin
//! creation of pre-confirmed accounts, and deletion. Backed by the same
//! `user_accounts` table the auth flows use.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::AccountRepository;
use crate::models::{PageRequest, Paginated, UserAccount};

pub struct UserService {
    accounts: Arc<dyn AccountRepository>,
}

impl UserService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn list(
        &self,
        page: &PageRequest,
        search_login: Option<&str>,
        search_email: Option<&str>,
    ) -> Result<Paginated<UserAccount>> {
        self.accounts.list(page, search_login, search_email).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.accounts.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAccountRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (Arc<dyn AccountRepository>, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let accounts = SqlxAccountRepository::boxed(pool);
        (accounts.clone(), UserService::new(accounts))
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (repo, service) = setup().await;
        for login in ["alice", "bob", "carol"] {
            let account = UserAccount::new(
                login.into(),
                format!("{}@x.com", login),
                "hash".into(),
                None,
            );
            repo.create(&account).await.unwrap();
        }

        let listed = service
            .list(&PageRequest::new(1, 2), None, None)
            .await
            .unwrap();
        assert_eq!(listed.total_count, 3);
        assert_eq!(listed.pages_count, 2);
        assert_eq!(listed.items.len(), 2);

        let bob = repo.get_by_login("bob").await.unwrap().unwrap();
        assert!(service.delete(&bob.id).await.unwrap());
        assert!(!service.delete(&bob.id).await.unwrap());
    }
}
