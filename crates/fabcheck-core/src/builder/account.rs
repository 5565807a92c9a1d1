use async_trait::async_trait;
use fabcheck_api::models::UserAccountRequest;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use super::{Destroy, Liveness};
use crate::error::CoreError;
use crate::fabric::Fabric;

/// Controller user account. The password is only exposed when the request
/// body is serialized.
#[derive(Debug, Clone)]
pub struct UserAccount {
    user_name: String,
    groups: Vec<String>,
    password: Option<SecretString>,
}

impl UserAccount {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            groups: Vec::new(),
            password: None,
        }
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    fn request(&self) -> Result<UserAccountRequest, CoreError> {
        let password = self
            .password
            .as_ref()
            .ok_or_else(|| CoreError::validation("user_account.password", "required"))?;
        if self.groups.is_empty() {
            return Err(CoreError::validation("user_account.groups", "at least one group required"));
        }
        Ok(UserAccountRequest {
            user_name: self.user_name.clone(),
            groups: self.groups.clone(),
            password: password.expose_secret().to_owned(),
        })
    }

    pub async fn build(self, fabric: &Fabric) -> Result<UserAccountHandle, CoreError> {
        let request = self.request()?;
        fabric.client().create_user(&request).await?;
        info!(user = %self.user_name, groups = ?self.groups, "user account built");
        Ok(UserAccountHandle {
            user_name: self.user_name,
            live: Liveness::default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UserAccountHandle {
    user_name: String,
    live: Liveness,
}

impl UserAccountHandle {
    pub fn user_name(&self) -> &str {
        &self.user_name
    }
}

#[async_trait]
impl Destroy for UserAccountHandle {
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with("user account", &self.user_name, || async {
                Ok(fabric.client().delete_user(&self.user_name).await?)
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("user account {}", self.user_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn password_required() {
        let err = UserAccount::new("test").groups(["admingroup"]).request().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation { field, .. } if field == "user_account.password"
        ));
    }

    #[test]
    fn debug_hides_password() {
        let account = UserAccount::new("test")
            .groups(["admingroup"])
            .password(SecretString::from("hunter22"));
        assert!(!format!("{account:?}").contains("hunter22"));
        assert_eq!(account.request().unwrap().password, "hunter22");
    }
}
