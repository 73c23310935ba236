//! Typed response payloads
//!
//! Only the payloads the SDK itself interprets get structs; open-ended
//! admin metadata stays `serde_json::Value`.

use serde::{Deserialize, Serialize};

/// Outcome of committing a transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommitResult {
    /// Number of triples added in the transaction
    pub added: u64,
    /// Number of triples removed in the transaction
    pub removed: u64,
}

/// One security permission attached to a user or role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Action type, e.g. `read` or `write`
    pub action: String,
    /// Resource type, e.g. `db` or `user`
    pub resource_type: String,
    /// Target resources, e.g. a database name or `*`
    pub resource: Vec<String>,
}

impl Permission {
    pub fn new(action: &str, resource_type: &str, resource: &str) -> Permission {
        Permission {
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource: vec![resource.to_string()],
        }
    }
}

/// Server-side details of a stored query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQueryDetails {
    /// Name of the stored query
    pub name: String,
    /// The query text
    pub query: String,
    /// User who created the query
    #[serde(default)]
    pub creator: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Database the query is bound to (`*` when shared across all)
    #[serde(default)]
    pub database: Option<String>,
    /// Whether other users may run the query
    #[serde(default)]
    pub shared: bool,
    /// Whether reasoning is enabled for the query
    #[serde(default)]
    pub reasoning: bool,
}

/// One namespace prefix binding stored in a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceBinding {
    /// The prefix, e.g. `rdf`
    pub prefix: String,
    /// The namespace IRI the prefix expands to
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_result_deserializes() {
        let result: CommitResult = serde_json::from_str(r#"{"added":10,"removed":2}"#).unwrap();
        assert_eq!(result.added, 10);
        assert_eq!(result.removed, 2);
    }

    #[test]
    fn stored_query_tolerates_missing_optionals() {
        let details: StoredQueryDetails =
            serde_json::from_str(r#"{"name":"q","query":"select * {?s ?p ?o}"}"#).unwrap();
        assert_eq!(details.name, "q");
        assert!(!details.shared);
        assert_eq!(details.database, None);
    }
}
