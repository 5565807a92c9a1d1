// User account endpoints

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::{GroupMembers, UserAccountRequest, UserList, UserRecord};

impl FabricClient {
    /// `GET useraccount/v1/info`
    pub async fn list_users(&self) -> Result<UserList, Error> {
        self.get("useraccount/v1/info").await
    }

    /// `GET useraccount/v1/info/group/{group}`
    pub async fn users_in_group(&self, group: &str) -> Result<GroupMembers, Error> {
        self.get(&format!("useraccount/v1/info/group/{group}"))
            .await
    }

    /// `GET useraccount/v1/info/{user}`
    pub async fn user(&self, user: &str) -> Result<UserRecord, Error> {
        self.get(&format!("useraccount/v1/info/{user}")).await
    }

    /// `POST useraccount/v1/info`
    pub async fn create_user(&self, req: &UserAccountRequest) -> Result<(), Error> {
        debug!(user = %req.user_name, groups = ?req.groups, "creating user account");
        self.post("useraccount/v1/info", req).await
    }

    /// `DELETE useraccount/v1/info/{user}`
    pub async fn delete_user(&self, user: &str) -> Result<(), Error> {
        debug!(user, "deleting user account");
        self.delete(&format!("useraccount/v1/info/{user}")).await
    }
}
