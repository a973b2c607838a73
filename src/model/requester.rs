use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Teacher profile as seen by the leave workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RequesterProfile {
    #[schema(example = 1000)]
    pub id: u64,
    #[schema(example = "Amal Ben Salah")]
    pub display_name: String,
    #[schema(example = "Informatique", nullable = true)]
    pub department: Option<String>,
}
