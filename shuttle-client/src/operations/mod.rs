//! Typed catalogue of every GraphQL operation the console issues.

use serde::Serialize;

macro_rules! user_fields {
    () => {
        "id name username contact role active sponsors { id name }"
    };
}

macro_rules! court_fields {
    () => {
        "id name price active"
    };
}

macro_rules! shuttle_fields {
    () => {
        "id name price active"
    };
}

macro_rules! session_fields {
    () => {
        concat!(
            "id start end court { ",
            court_fields!(),
            " } shuttle { ",
            shuttle_fields!(),
            " } availablePlayers { id name } games { id start end }"
        )
    };
}

macro_rules! game_fields {
    () => {
        concat!(
            "id sessionId start end status winner active ",
            "A1 { id name } A2 { id name } B1 { id name } B2 { id name } court { ",
            court_fields!(),
            " } shuttlesUsed { quantity shuttle { ",
            shuttle_fields!(),
            " } }"
        )
    };
}

macro_rules! bet_fields {
    () => {
        "id betType betAmount paid active gameId bettorForA { id name } bettorForB { id name }"
    };
}

macro_rules! operation {
    ($ty:ident, $kind:ident, $root:literal, $vars:ty => $output:ty, $document:expr) => {
        pub struct $ty;

        impl crate::Operation for $ty {
            const NAME: &'static str = stringify!($ty);
            const ROOT_FIELD: &'static str = $root;
            const KIND: crate::OperationKind = crate::OperationKind::$kind;
            const DOCUMENT: &'static str = $document;
            type Variables = $vars;
            type Output = $output;
        }
    };
}

pub mod auth;
pub mod bets;
pub mod courts;
pub mod games;
pub mod sessions;
pub mod shuttles;
pub mod summaries;
pub mod users;

#[derive(Clone, Debug, Default, Serialize)]
pub struct NoVars {}

#[derive(Clone, Debug, Serialize)]
pub struct IdVars {
    pub id: String,
}

impl IdVars {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateVars<I> {
    pub input: I,
}

#[derive(Clone, Debug, Serialize)]
pub struct UpdateVars<I> {
    pub id: String,
    pub input: I,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdVars {
    pub session_id: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameIdVars {
    pub game_id: String,
}

#[cfg(test)]
mod tests {
    use crate::{Operation, OperationKind};

    use super::*;

    #[test]
    fn test_documents_name_their_operation() {
        fn check<O: Operation>() {
            let expected_kind = match O::KIND {
                OperationKind::Query => "query ",
                OperationKind::Mutation => "mutation ",
                OperationKind::Subscription => "subscription ",
            };
            assert!(O::DOCUMENT.starts_with(expected_kind), "{}", O::NAME);
            assert!(O::DOCUMENT.contains(O::NAME), "{}", O::NAME);
            assert!(O::DOCUMENT.contains(O::ROOT_FIELD), "{}", O::NAME);
            let opened = O::DOCUMENT.matches('{').count();
            let closed = O::DOCUMENT.matches('}').count();
            assert_eq!(opened, closed, "unbalanced braces in {}", O::NAME);
        }

        check::<auth::Login>();
        check::<auth::Logout>();
        check::<users::FetchUsers>();
        check::<users::UpdateUserSponsors>();
        check::<courts::CreateCourt>();
        check::<shuttles::UpdateShuttle>();
        check::<sessions::StartSession>();
        check::<sessions::AddPlayersToSession>();
        check::<games::FetchGamesBySession>();
        check::<games::UpdateGame>();
        check::<bets::FetchBetsByGame>();
        check::<bets::CreateBet>();
        check::<summaries::FetchSessionSummary>();
        check::<summaries::FetchSessionBetsSummary>();
    }

    #[test]
    fn test_variables_wire_shape() {
        let vars = serde_json::to_value(SessionIdVars {
            session_id: "s1".to_string(),
        })
        .unwrap();
        assert_eq!(vars, serde_json::json!({ "sessionId": "s1" }));
        assert_eq!(serde_json::to_value(NoVars {}).unwrap(), serde_json::json!({}));
    }
}
