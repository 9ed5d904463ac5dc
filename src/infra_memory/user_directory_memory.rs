use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// User directory held in memory, keyed by lower-cased email.
pub struct MemoryUserDirectory {
    by_email: DashMap<String, UserCredentialsRecord>,
    by_id: DashMap<UserId, String>,
    next_id: AtomicU64,
}

impl Default for MemoryUserDirectory {
    fn default() -> Self {
        Self {
            by_email: DashMap::new(),
            by_id: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<UserId, DirectoryError> {
        let email = normalize(email);
        let candidate = UserId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stored = self
            .by_email
            .entry(email.clone())
            .or_insert_with(|| UserCredentialsRecord {
                user_id: candidate,
                email: email.clone(),
                name: name.to_string(),
                password_hash: password_hash.to_string(),
            })
            .user_id;
        if stored != candidate {
            return Err(DirectoryError::EmailTaken);
        }
        self.by_id.insert(candidate, email);
        Ok(candidate)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait::async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialsRecord>, DirectoryError> {
        Ok(self
            .by_email
            .get(&normalize(email))
            .map(|rec| rec.value().clone()))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>, DirectoryError> {
        let Some(email) = self.by_id.get(&user_id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.by_email.get(&email).map(|rec| rec.profile()))
    }

    async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<UserId, DirectoryError> {
        self.insert(email, name, password_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let directory = MemoryUserDirectory::new();
        let id = directory
            .insert("Ada@Example.com", "Ada", "$argon2id$stub")
            .unwrap();

        let rec = directory
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rec.user_id, id);
        assert_eq!(rec.password_hash, "$argon2id$stub");

        let profile = directory.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.name, "Ada");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let directory = MemoryUserDirectory::new();
        directory.insert("a@b.c", "A", "h").unwrap();

        assert!(matches!(
            directory.insert("A@B.C", "Other", "h2"),
            Err(DirectoryError::EmailTaken)
        ));
        assert!(directory.find_by_id(UserId(99)).await.unwrap().is_none());
    }
}
