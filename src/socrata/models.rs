// ABOUTME: Request and response shapes for the Socrata SODA API
// ABOUTME: SoQL query parameters and the upsert/replace result summary

use serde::{Deserialize, Serialize};

/// Summary Socrata returns for an upsert or replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertResult {
    #[serde(rename = "Rows Created", default)]
    pub rows_created: u64,
    #[serde(rename = "Rows Updated", default)]
    pub rows_updated: u64,
    #[serde(rename = "Rows Deleted", default)]
    pub rows_deleted: u64,
    #[serde(rename = "Errors", default)]
    pub errors: u64,
}

impl std::fmt::Display for UpsertResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted, {} errors",
            self.rows_created, self.rows_updated, self.rows_deleted, self.errors
        )
    }
}

/// The subset of SoQL the jobs need: column selection, filtering, ordering
/// and a limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoqlQuery {
    pub select: Option<String>,
    pub where_: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u32>,
}

impl SoqlQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn where_(mut self, clause: &str) -> Self {
        self.where_ = Some(clause.to_string());
        self
    }

    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query string pairs in the `$param` form the SODA API expects.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref select) = self.select {
            params.push(("$select", select.clone()));
        }
        if let Some(ref clause) = self.where_ {
            params.push(("$where", clause.clone()));
        }
        if let Some(ref order) = self.order {
            params.push(("$order", order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("$limit", limit.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_result_deserialization() {
        let body = r#"{"Errors":0,"Rows Deleted":0,"Rows Updated":87,"Rows Created":13}"#;
        let result: UpsertResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.rows_created, 13);
        assert_eq!(result.rows_updated, 87);
        assert_eq!(result.to_string(), "13 created, 87 updated, 0 deleted, 0 errors");
    }

    #[test]
    fn test_upsert_result_tolerates_missing_fields() {
        let result: UpsertResult = serde_json::from_str("{}").unwrap();
        assert_eq!(result, UpsertResult::default());
    }

    #[test]
    fn test_query_params() {
        let query = SoqlQuery::new()
            .select("updated_datetime")
            .where_("updated_datetime IS NOT NULL")
            .order("updated_datetime DESC")
            .limit(1);
        assert_eq!(
            query.to_params(),
            vec![
                ("$select", "updated_datetime".to_string()),
                ("$where", "updated_datetime IS NOT NULL".to_string()),
                ("$order", "updated_datetime DESC".to_string()),
                ("$limit", "1".to_string()),
            ]
        );
        assert!(SoqlQuery::new().to_params().is_empty());
    }
}
