use asterdb_sdk::{AsterError, RdfTerm, SelectResult};
use serde_json::json;

#[test]
fn single_uri_binding_scenario() {
    let payload = json!({
        "head": {"vars": ["s"]},
        "results": {"bindings": [
            {"s": {"type": "uri", "value": "urn:a"}}
        ]}
    });
    let result = SelectResult::new(payload.clone()).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.variable_names(), &["s"]);
    assert_eq!(
        result[0]["s"],
        RdfTerm::Uri {
            value: "urn:a".into()
        }
    );
    assert_eq!(
        result[0].get_raw("s").unwrap(),
        &json!({"type": "uri", "value": "urn:a"})
    );
    assert_eq!(result.raw(), payload);
}

#[test]
fn row_count_and_order_mirror_the_payload() {
    let payload = json!({
        "head": {"vars": ["n"]},
        "results": {"bindings": [
            {"n": {"type": "literal", "value": "one"}},
            {"n": {"type": "literal", "value": "two"}},
            {"n": {"type": "literal", "value": "three"}}
        ]}
    });
    let expected_rows = payload["results"]["bindings"].as_array().unwrap().len();
    let result = SelectResult::new(payload).unwrap();

    assert_eq!(result.len(), expected_rows);
    let values: Vec<_> = result.iter().map(|b| b["n"].value().to_string()).collect();
    assert_eq!(values, ["one", "two", "three"]);

    // indexed access agrees with iteration order
    for (index, binding) in result.iter().enumerate() {
        assert_eq!(result[index]["n"], binding["n"]);
    }
}

#[test]
fn projected_variables_may_exceed_bound_ones() {
    // `o` is projected but never bound in any row
    let payload = json!({
        "head": {"vars": ["s", "o"]},
        "results": {"bindings": [
            {"s": {"type": "bnode", "value": "b0"}}
        ]}
    });
    let result = SelectResult::new(payload).unwrap();
    assert_eq!(result.variable_names(), &["s", "o"]);
    assert_eq!(result[0].variable_names(), ["s"]);
    assert!(result[0].get("o").is_none());
    assert!(result[0].get_raw("o").is_none());
}

#[test]
fn structural_validation_failures() {
    let missing_results = json!({"head": {"vars": []}});
    assert!(matches!(
        SelectResult::new(missing_results),
        Err(AsterError::InvalidResults(_))
    ));

    let bindings_not_array = json!({"head": {}, "results": {"bindings": {"not": "array"}}});
    assert!(matches!(
        SelectResult::new(bindings_not_array),
        Err(AsterError::InvalidResults(_))
    ));

    let missing_bindings = json!({"head": {}, "results": {}});
    assert!(matches!(
        SelectResult::new(missing_bindings),
        Err(AsterError::InvalidResults(_))
    ));
}

#[test]
fn term_conversion_failure_is_eager() {
    let payload = json!({
        "head": {"vars": ["x"]},
        "results": {"bindings": [
            {"x": {"type": "unknown-kind", "value": "v"}}
        ]}
    });
    // the bad term fails construction, not first access
    assert!(matches!(
        SelectResult::new(payload),
        Err(AsterError::InvalidResults(_))
    ));
}

#[test]
fn literal_terms_keep_datatype_and_language() {
    let payload = json!({
        "head": {"vars": ["plain", "typed", "tagged"]},
        "results": {"bindings": [{
            "plain": {"type": "literal", "value": "hello"},
            "typed": {
                "type": "literal",
                "value": "3",
                "datatype": "http://www.w3.org/2001/XMLSchema#integer"
            },
            "tagged": {"type": "literal", "value": "bonjour", "lang": "fr"}
        }]}
    });
    let result = SelectResult::new(payload).unwrap();
    let row = &result[0];

    match &row["plain"] {
        RdfTerm::Literal {
            value,
            datatype,
            lang,
        } => {
            assert_eq!(value, "hello");
            assert!(datatype.is_none());
            assert!(lang.is_none());
        }
        other => panic!("expected a literal, got {other:?}"),
    }
    assert_eq!(
        row["typed"],
        RdfTerm::Literal {
            value: "3".into(),
            datatype: Some("http://www.w3.org/2001/XMLSchema#integer".into()),
            lang: None
        }
    );
    assert_eq!(row["tagged"].to_string(), "bonjour@fr");
    assert!(row["plain"].is_literal());
    assert!(!row["plain"].is_uri());
}

#[test]
fn mutating_a_raw_copy_leaves_the_view_intact() {
    let payload = json!({
        "head": {"vars": ["s"]},
        "results": {"bindings": [
            {"s": {"type": "uri", "value": "urn:original"}}
        ]}
    });
    let result = SelectResult::new(payload.clone()).unwrap();

    let mut whole = result.raw();
    whole["results"]["bindings"][0]["s"]["value"] = json!("urn:changed");
    let mut row = result[0].raw();
    row["s"] = json!({"type": "uri", "value": "urn:other"});

    assert_eq!(result[0]["s"].value(), "urn:original");
    assert_eq!(result.raw(), payload);
}
