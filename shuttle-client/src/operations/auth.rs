use serde::{Deserialize, Serialize};
use shuttle_core::User;

use super::NoVars;

#[derive(Clone, Debug, Serialize)]
pub struct LoginVars {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub access_token: String,
    pub user: User,
}

operation!(
    Login,
    Mutation,
    "login",
    LoginVars => LoginPayload,
    concat!(
        "mutation Login($username: String!, $password: String!) { ",
        "login(username: $username, password: $password) { accessToken user { ",
        user_fields!(),
        " } } }"
    )
);

operation!(
    Logout,
    Mutation,
    "logout",
    NoVars => bool,
    "mutation Logout { logout }"
);
