// POST /api/search handler

use std::sync::Arc;

use serde_json::Value;

use crate::error::ApiError;
use crate::models::SearchRequest;
use crate::state::AppState;

/// The query must be a non-blank string
pub fn search_query(request: &SearchRequest) -> Result<&str, ApiError> {
    match &request.query {
        Value::String(query) if !query.trim().is_empty() => Ok(query.trim()),
        _ => Err(ApiError::BadRequest(
            "Query parameter is required".to_string(),
        )),
    }
}

pub async fn search_handler(
    state: Arc<AppState>,
    request: SearchRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    let query = search_query(&request)?;
    let results = state.search.search(query).await;
    Ok(warp::reply::json(&results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(query: Value) -> SearchRequest {
        SearchRequest { query }
    }

    #[test]
    fn test_search_query_validation() {
        assert_eq!(search_query(&request(json!(" dp on trees "))).unwrap(), "dp on trees");
        assert!(search_query(&request(json!(""))).is_err());
        assert!(search_query(&request(json!(42))).is_err());
        assert!(search_query(&request(Value::Null)).is_err());
    }
}
