use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Bearer token plus the user it was issued for.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}
