use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::ListUsersQuery;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersParams {
    offset: Option<i64>,
    limit: Option<i64>,
}

impl TryFrom<ListUsersParams> for ListUsersQuery {
    type Error = ApiError;

    fn try_from(params: ListUsersParams) -> Result<Self, Self::Error> {
        let offset = params.offset.unwrap_or(0);
        let limit = params.limit.unwrap_or(ListUsersQuery::DEFAULT_LIMIT);

        if offset < 0 {
            return Err(ApiError::BadRequest(
                "offset must not be negative".to_string(),
            ));
        }
        if limit <= 0 {
            return Err(ApiError::BadRequest("limit must be positive".to_string()));
        }

        Ok(ListUsersQuery::new(offset, limit))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListUsersResponseData {
    pub users: Vec<UserData>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> Result<ApiSuccess<ListUsersResponseData>, ApiError> {
    let query = ListUsersQuery::try_from(params)?;

    let page = state.user_service.list_users(query).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ListUsersResponseData {
            users: page.users.iter().map(UserData::from).collect(),
            total: page.total,
            offset: query.offset,
            limit: query.limit,
        },
    ))
}
