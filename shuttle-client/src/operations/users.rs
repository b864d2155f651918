use serde::Serialize;
use shuttle_core::{Role, User, UserId};

use super::{CreateVars, IdVars, NoVars, UpdateVars};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserInput {
    pub name: String,
    pub username: String,
    pub contact: Option<String>,
    /// Only sent when a new password was entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorsVars {
    pub id: UserId,
    pub sponsor_ids: Vec<UserId>,
}

operation!(
    FetchUsers,
    Query,
    "fetchUsers",
    NoVars => Vec<User>,
    concat!("query FetchUsers { fetchUsers { ", user_fields!(), " } }")
);

operation!(
    FetchUser,
    Query,
    "fetchUser",
    IdVars => Option<User>,
    concat!("query FetchUser($id: ID!) { fetchUser(id: $id) { ", user_fields!(), " } }")
);

operation!(
    CreateUser,
    Mutation,
    "createUser",
    CreateVars<UserInput> => User,
    concat!(
        "mutation CreateUser($input: UserInput!) { createUser(input: $input) { ",
        user_fields!(),
        " } }"
    )
);

operation!(
    UpdateUser,
    Mutation,
    "updateUser",
    UpdateVars<UserInput> => User,
    concat!(
        "mutation UpdateUser($id: ID!, $input: UserInput!) { updateUser(id: $id, input: $input) { ",
        user_fields!(),
        " } }"
    )
);

operation!(
    UpdateUserSponsors,
    Mutation,
    "updateUserSponsors",
    SponsorsVars => User,
    concat!(
        "mutation UpdateUserSponsors($id: ID!, $sponsorIds: [ID!]!) { ",
        "updateUserSponsors(id: $id, sponsorIds: $sponsorIds) { ",
        user_fields!(),
        " } }"
    )
);
