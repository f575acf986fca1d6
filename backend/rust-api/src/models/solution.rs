use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SolveRequest {
    #[validate(length(min = 1, max = 4000, message = "Query must be between 1 and 4000 characters"))]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolveResponse {
    pub original_query: String,
    pub solution: String,
}
