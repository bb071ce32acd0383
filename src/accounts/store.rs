//! JSON-file backed account store
//!
//! All accounts are held in memory behind an async mutex. Registration runs
//! the uniqueness check, the append and the file rewrite under one guard, so
//! two concurrent registrations can never both claim the same email.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::types::{normalize_email, NewAccount, UserAccount};

/// Error type for account operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User already exists: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Account file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Account file IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Shared handle to the account list
#[derive(Clone)]
pub struct AccountStore {
    inner: Arc<AccountStoreInner>,
}

struct AccountStoreInner {
    path: PathBuf,
    bcrypt_cost: u32,
    accounts: Mutex<Vec<UserAccount>>,
}

impl AccountStore {
    /// Load accounts from `path`. A missing file means no accounts yet.
    pub async fn load<P: AsRef<Path>>(path: P, bcrypt_cost: u32) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let accounts = match tokio::fs::read(&path).await {
            Ok(data) => {
                let mut accounts: Vec<UserAccount> = serde_json::from_slice(&data)?;
                for account in &mut accounts {
                    account.email = normalize_email(&account.email);
                }
                accounts
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), count = accounts.len(), "Accounts loaded");

        Ok(Self {
            inner: Arc::new(AccountStoreInner {
                path,
                bcrypt_cost,
                accounts: Mutex::new(accounts),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub async fn len(&self) -> usize {
        self.inner.accounts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Create an account and persist the full list.
    ///
    /// Fails with `Conflict` when the email is taken. If the file cannot be
    /// written the account is not kept.
    pub async fn register(&self, new: NewAccount) -> Result<UserAccount, StoreError> {
        let email = normalize_email(&new.email);
        let password_hash = self.hash_password(new.password).await?;

        let mut accounts = self.inner.accounts.lock().await;

        if accounts.iter().any(|a| a.email == email) {
            return Err(StoreError::Conflict(email));
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        accounts.push(account.clone());

        if let Err(e) = persist(&self.inner.path, &accounts).await {
            accounts.pop();
            return Err(e);
        }

        tracing::info!(user_id = %account.id, email = %account.email, "User registered");
        Ok(account)
    }

    /// Look up `email` and check `password` against its hash
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserAccount, StoreError> {
        let account = self
            .find_by_email(email)
            .await
            .ok_or(StoreError::InvalidCredentials)?;

        let hash = account.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %account.id, "Stored password hash is unusable: {}", e);
                false
            });

        if matches {
            Ok(account)
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Option<UserAccount> {
        let email = normalize_email(email);
        let accounts = self.inner.accounts.lock().await;
        accounts.iter().find(|a| a.email == email).cloned()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<UserAccount> {
        let accounts = self.inner.accounts.lock().await;
        accounts.iter().find(|a| a.id == id).cloned()
    }

    async fn hash_password(&self, password: String) -> Result<String, StoreError> {
        let cost = self.inner.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .map_err(StoreError::from)
    }
}

/// Rewrite the whole account file (temp file + rename)
async fn persist(path: &Path, accounts: &[UserAccount]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let data = serde_json::to_vec_pretty(accounts)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, data).await?;
    tokio::fs::rename(&tmp_path, path).await?;

    tracing::debug!(path = %path.display(), count = accounts.len(), "Accounts persisted");
    Ok(())
}
