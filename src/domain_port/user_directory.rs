use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct UserCredentialsRecord {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl UserCredentialsRecord {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch credentials by email (for login).
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialsRecord>, DirectoryError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>, DirectoryError>;

    async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<UserId, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("email already registered")]
    EmailTaken,
    #[error("directory error: {0}")]
    Backend(String),
}
