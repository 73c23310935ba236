//! Typed views over SPARQL query results
//!
//! [`SelectResult`] wraps a SPARQL results JSON payload (the W3C
//! `head`/`results` shape) into a validated, read-only sequence of
//! [`BindingSet`]s. Terms are converted eagerly at construction; the raw
//! JSON stays reachable per variable and for the whole payload.

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{AsterError, AsterResult};

/// An RDF term bound to a query variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RdfTerm {
    /// A URI reference
    Uri { value: String },
    /// A literal with optional datatype and language tag
    Literal {
        value: String,
        datatype: Option<String>,
        lang: Option<String>,
    },
    /// A blank node; the id is only meaningful within one result set
    BNode { id: String },
}

impl RdfTerm {
    /// Convert a raw results-JSON term object into a typed term.
    ///
    /// Any `type` other than `uri`, `literal` or `bnode` is a conversion
    /// error, as is a missing `type` or `value`.
    pub fn from_json(raw: &Value) -> AsterResult<RdfTerm> {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| AsterError::InvalidResults(format!("term without a type: {raw}")))?;
        let value = raw
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| AsterError::InvalidResults(format!("term without a value: {raw}")))?;

        match kind {
            "uri" => Ok(RdfTerm::Uri {
                value: value.to_string(),
            }),
            "literal" => Ok(RdfTerm::Literal {
                value: value.to_string(),
                datatype: raw
                    .get("datatype")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                lang: raw.get("lang").and_then(Value::as_str).map(str::to_string),
            }),
            "bnode" => Ok(RdfTerm::BNode {
                id: value.to_string(),
            }),
            other => Err(AsterError::InvalidResults(format!(
                "unsupported RDF term type: {other}"
            ))),
        }
    }

    /// The lexical value: URI text, literal value, or blank node id.
    pub fn value(&self) -> &str {
        match self {
            RdfTerm::Uri { value } => value,
            RdfTerm::Literal { value, .. } => value,
            RdfTerm::BNode { id } => id,
        }
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, RdfTerm::Uri { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, RdfTerm::Literal { .. })
    }

    pub fn is_bnode(&self) -> bool {
        matches!(self, RdfTerm::BNode { .. })
    }
}

impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfTerm::Uri { value } => write!(f, "{value}"),
            RdfTerm::Literal {
                value,
                datatype,
                lang,
            } => {
                write!(f, "{value}")?;
                if let Some(lang) = lang {
                    write!(f, "@{lang}")?;
                } else if let Some(dt) = datatype {
                    write!(f, "^^{dt}")?;
                }
                Ok(())
            }
            RdfTerm::BNode { id } => write!(f, "_:{id}"),
        }
    }
}

/// One solution of a SELECT query: an ordered map from bound variable
/// names to typed terms.
///
/// Only variables actually bound in this solution appear as keys; the
/// server omits unbound optionals. Indexing by a name with no binding
/// panics; use [`BindingSet::get`] for a checked lookup and
/// [`BindingSet::get_raw`] for the untouched JSON term.
#[derive(Debug, Clone)]
pub struct BindingSet {
    raw: Value,
    terms: IndexMap<String, RdfTerm>,
}

impl BindingSet {
    fn from_json(raw: &Value) -> AsterResult<BindingSet> {
        let object = raw.as_object().ok_or_else(|| {
            AsterError::InvalidResults(format!("binding set is not an object: {raw}"))
        })?;
        let mut terms = IndexMap::with_capacity(object.len());
        for (var, term) in object {
            terms.insert(var.clone(), RdfTerm::from_json(term)?);
        }
        Ok(BindingSet {
            raw: raw.clone(),
            terms,
        })
    }

    /// The converted term bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&RdfTerm> {
        self.terms.get(name)
    }

    /// The raw JSON term object bound to `name`, exactly as returned by
    /// the server.
    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    /// A deep copy of the raw JSON for this solution.
    pub fn raw(&self) -> Value {
        self.raw.clone()
    }

    /// Names of the variables bound in this solution, in server order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.terms.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over (variable, term) pairs in server order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RdfTerm)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Index<&str> for BindingSet {
    type Output = RdfTerm;

    fn index(&self, name: &str) -> &RdfTerm {
        match self.terms.get(name) {
            Some(term) => term,
            None => panic!("no binding for variable `{name}`"),
        }
    }
}

impl fmt::Display for BindingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (var, term) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "?{var} = {term}")?;
            first = false;
        }
        Ok(())
    }
}

/// Validated, read-only view over a SELECT query's results JSON.
///
/// The payload must contain `head` and `results`, and `results.bindings`
/// must be an array; anything else fails construction. Rows keep the
/// server-returned order.
///
/// # Example
/// ```
/// # use asterdb_sdk::SelectResult;
/// let payload = serde_json::json!({
///     "head": {"vars": ["s"]},
///     "results": {"bindings": [
///         {"s": {"type": "uri", "value": "urn:a"}}
///     ]}
/// });
/// let result = SelectResult::new(payload).unwrap();
/// assert_eq!(result.len(), 1);
/// assert_eq!(result[0]["s"].value(), "urn:a");
/// ```
#[derive(Debug, Clone)]
pub struct SelectResult {
    raw: Value,
    vars: Vec<String>,
    bindings: Vec<BindingSet>,
}

impl SelectResult {
    /// Validate and wrap a results JSON payload.
    pub fn new(raw: Value) -> AsterResult<SelectResult> {
        if !raw.is_object() {
            return Err(AsterError::InvalidResults(
                "results payload must be an object".into(),
            ));
        }
        if raw.get("head").is_none() || raw.get("results").is_none() {
            return Err(AsterError::InvalidResults(
                "results payload must contain `head` and `results`".into(),
            ));
        }
        let rows = raw
            .get("results")
            .and_then(|r| r.get("bindings"))
            .ok_or_else(|| {
                AsterError::InvalidResults("`results` must contain a `bindings` key".into())
            })?
            .as_array()
            .ok_or_else(|| {
                AsterError::InvalidResults("`results.bindings` must be an array".into())
            })?;

        let bindings = rows
            .iter()
            .map(BindingSet::from_json)
            .collect::<AsterResult<Vec<_>>>()?;
        let vars = match raw.get("head").and_then(|h| h.get("vars")) {
            Some(Value::Array(vars)) => vars
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        AsterError::InvalidResults(format!("non-string variable name: {v}"))
                    })
                })
                .collect::<AsterResult<Vec<_>>>()?,
            // ASK-style heads carry no vars
            _ => Vec::new(),
        };

        Ok(SelectResult {
            raw,
            vars,
            bindings,
        })
    }

    /// The variables projected by the query, in declaration order.
    ///
    /// May include variables never bound in any solution.
    pub fn variable_names(&self) -> &[String] {
        &self.vars
    }

    /// A deep copy of the untouched results JSON.
    pub fn raw(&self) -> Value {
        self.raw.clone()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The solution at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&BindingSet> {
        self.bindings.get(index)
    }

    /// Iterate over solutions in server-returned order. Iteration is
    /// restartable; it never re-reads the network.
    pub fn iter(&self) -> std::slice::Iter<'_, BindingSet> {
        self.bindings.iter()
    }

    /// All solutions as a slice.
    pub fn bindings(&self) -> &[BindingSet] {
        &self.bindings
    }
}

impl Index<usize> for SelectResult {
    type Output = BindingSet;

    fn index(&self, index: usize) -> &BindingSet {
        &self.bindings[index]
    }
}

impl<'a> IntoIterator for &'a SelectResult {
    type Item = &'a BindingSet;
    type IntoIter = std::slice::Iter<'a, BindingSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

impl fmt::Display for SelectResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_PREVIEW: usize = 3;
        writeln!(f, "SelectResult with {} results", self.len())?;
        write!(f, "Variables: {}", self.vars.join(", "))?;
        for binding in self.bindings.iter().take(MAX_PREVIEW) {
            write!(f, "\n{binding}")?;
        }
        if self.len() > MAX_PREVIEW {
            write!(f, "\n...and {} more rows.", self.len() - MAX_PREVIEW)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "head": {"vars": ["s", "p", "o"]},
            "results": {"bindings": [
                {
                    "s": {"type": "uri", "value": "urn:a"},
                    "p": {"type": "uri", "value": "urn:b"},
                    "o": {"type": "literal", "value": "hello", "lang": "en"}
                },
                {
                    "s": {"type": "bnode", "value": "b0"},
                    "o": {"type": "literal", "value": "42",
                          "datatype": "http://www.w3.org/2001/XMLSchema#integer"}
                }
            ]}
        })
    }

    #[test]
    fn wraps_well_formed_payload() {
        let result = SelectResult::new(sample()).unwrap();
        assert_eq!(result.len(), 2);
        assert!(!result.is_empty());
        assert_eq!(result.variable_names(), &["s", "p", "o"]);
    }

    #[test]
    fn converts_terms_eagerly_and_exactly() {
        let result = SelectResult::new(sample()).unwrap();
        assert_eq!(
            result[0]["s"],
            RdfTerm::Uri {
                value: "urn:a".into()
            }
        );
        assert_eq!(
            result[0]["o"],
            RdfTerm::Literal {
                value: "hello".into(),
                datatype: None,
                lang: Some("en".into())
            }
        );
        assert_eq!(result[1]["s"], RdfTerm::BNode { id: "b0".into() });
        assert_eq!(
            result[1]["o"],
            RdfTerm::Literal {
                value: "42".into(),
                datatype: Some("http://www.w3.org/2001/XMLSchema#integer".into()),
                lang: None
            }
        );
    }

    #[test]
    fn raw_access_round_trips_the_term() {
        let result = SelectResult::new(sample()).unwrap();
        assert_eq!(
            result[0].get_raw("s").unwrap(),
            &json!({"type": "uri", "value": "urn:a"})
        );
        // unbound optional in the second row
        assert_eq!(result[1].get_raw("p"), None);
        assert_eq!(result[1].get("p"), None);
    }

    #[test]
    fn raw_returns_a_detached_copy() {
        let result = SelectResult::new(sample()).unwrap();
        let mut copy = result.raw();
        copy["results"]["bindings"][0]["s"]["value"] = json!("urn:tampered");
        // the view is unaffected
        assert_eq!(result[0]["s"].value(), "urn:a");
        assert_eq!(result.raw(), sample());
    }

    #[test]
    fn preserves_row_order() {
        let result = SelectResult::new(sample()).unwrap();
        let subjects: Vec<_> = result.iter().map(|b| b["s"].value().to_string()).collect();
        assert_eq!(subjects, ["urn:a", "b0"]);
        // re-iteration yields the same rows
        assert_eq!(result.iter().count(), 2);
        assert_eq!(result.iter().count(), 2);
    }

    #[test]
    #[should_panic(expected = "no binding for variable `missing`")]
    fn indexing_an_unbound_variable_panics() {
        let result = SelectResult::new(sample()).unwrap();
        let _ = &result[0]["missing"];
    }

    #[test]
    fn missing_results_key_is_rejected() {
        let err = SelectResult::new(json!({"head": {"vars": []}})).unwrap_err();
        assert!(matches!(err, AsterError::InvalidResults(_)));
    }

    #[test]
    fn missing_head_key_is_rejected() {
        let err = SelectResult::new(json!({"results": {"bindings": []}})).unwrap_err();
        assert!(matches!(err, AsterError::InvalidResults(_)));
    }

    #[test]
    fn non_array_bindings_is_rejected() {
        let err =
            SelectResult::new(json!({"head": {}, "results": {"bindings": "nope"}})).unwrap_err();
        assert!(matches!(err, AsterError::InvalidResults(_)));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(SelectResult::new(json!([1, 2, 3])).is_err());
        assert!(SelectResult::new(json!("string")).is_err());
    }

    #[test]
    fn unknown_term_type_is_rejected() {
        let payload = json!({
            "head": {"vars": ["x"]},
            "results": {"bindings": [
                {"x": {"type": "triple", "value": "oops"}}
            ]}
        });
        let err = SelectResult::new(payload).unwrap_err();
        assert!(err.to_string().contains("unsupported RDF term type"));
    }

    #[test]
    fn empty_bindings_is_empty() {
        let result =
            SelectResult::new(json!({"head": {"vars": ["x"]}, "results": {"bindings": []}}))
                .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert!(result.get(0).is_none());
    }

    #[test]
    fn display_previews_rows() {
        let result = SelectResult::new(sample()).unwrap();
        let text = result.to_string();
        assert!(text.starts_with("SelectResult with 2 results"));
        assert!(text.contains("Variables: s, p, o"));
        assert!(text.contains("?s = urn:a"));
    }
}
