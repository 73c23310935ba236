//! Database connections, transactions, and queries
//!
//! A [`Connection`] is the entry point for data operations on one
//! database: SPARQL queries, transactional mutation, export, reasoning
//! checks, plus the document store ([`Docs`]), integrity constraint
//! validation ([`Icv`]) and GraphQL ([`GraphQl`]) sub-clients.
//!
//! A connection holds at most one active transaction. The handle is not
//! synchronized; sharing one connection across threads for transactional
//! work needs external locking.

use std::io::Write;

use bytes::Bytes;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Body, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_ENCODING, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{ClientOptions, HttpClient};
use crate::content::Content;
use crate::content_types::{BOOLEAN, SPARQL_JSON, TURTLE};
use crate::error::{AsterError, AsterResult};
use crate::models::CommitResult;

/// Optional parameters accepted by the query endpoints.
///
/// Unset fields are omitted from the request. `bindings` values must be
/// RDF terms in SPARQL syntax, e.g. `<urn:a>` or `"literal"`.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Base URI for parsing the query
    pub base_uri: Option<String>,
    /// Maximum number of results to return
    pub limit: Option<u64>,
    /// Offset into the result set
    pub offset: Option<u64>,
    /// Query timeout in milliseconds; zero or less means no timeout
    pub timeout_ms: Option<u64>,
    /// Enable reasoning for the query
    pub reasoning: Option<bool>,
    /// Values bound to query variables
    pub bindings: Vec<(String, String)>,
    /// URIs used as the default graph (`FROM`)
    pub default_graph_uri: Vec<String>,
    /// URIs used as named graphs (`FROM NAMED`)
    pub named_graph_uri: Vec<String>,
    /// URIs used as the default graph for updates (`USING`)
    pub using_graph_uri: Vec<String>,
    /// URIs used as named graphs for updates (`USING NAMED`)
    pub using_named_graph_uri: Vec<String>,
    /// Graph URI removed from by the update
    pub remove_graph_uri: Option<String>,
    /// Graph URI inserted into by the update
    pub insert_graph_uri: Option<String>,
}

impl QueryOptions {
    pub fn with_limit(mut self, limit: u64) -> QueryOptions {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> QueryOptions {
        self.offset = Some(offset);
        self
    }

    pub fn with_reasoning(mut self, reasoning: bool) -> QueryOptions {
        self.reasoning = Some(reasoning);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> QueryOptions {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Bind a query variable to a term, e.g. `bind("o", "<urn:a>")`.
    pub fn bind(mut self, variable: impl Into<String>, term: impl Into<String>) -> QueryOptions {
        self.bindings.push((variable.into(), term.into()));
        self
    }

    fn to_form(&self, query: &str) -> Vec<(String, String)> {
        let mut form = vec![("query".to_string(), query.to_string())];
        if let Some(base_uri) = &self.base_uri {
            form.push(("baseURI".into(), base_uri.clone()));
        }
        if let Some(limit) = self.limit {
            form.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            form.push(("offset".into(), offset.to_string()));
        }
        if let Some(timeout) = self.timeout_ms {
            form.push(("timeout".into(), timeout.to_string()));
        }
        if let Some(reasoning) = self.reasoning {
            form.push(("reasoning".into(), reasoning.to_string()));
        }
        for (variable, term) in &self.bindings {
            form.push((format!("${variable}"), term.clone()));
        }
        let multi = [
            ("default-graph-uri", &self.default_graph_uri),
            ("named-graph-uri", &self.named_graph_uri),
            ("using-graph-uri", &self.using_graph_uri),
            ("using-named-graph-uri", &self.using_named_graph_uri),
        ];
        for (key, values) in multi {
            for value in values {
                form.push((key.to_string(), value.clone()));
            }
        }
        if let Some(uri) = &self.remove_graph_uri {
            form.push(("remove-graph-uri".into(), uri.clone()));
        }
        if let Some(uri) = &self.insert_graph_uri {
            form.push(("insert-graph-uri".into(), uri.clone()));
        }
        form
    }
}

fn parse_bool(text: &str) -> AsterResult<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(AsterError::InvalidResults(format!(
            "expected a boolean response, got `{other}`"
        ))),
    }
}

/// A connection to one database.
///
/// # Example
/// ```no_run
/// # use asterdb_sdk::{ClientOptions, Connection, QueryOptions, SelectResult};
/// # fn run() -> asterdb_sdk::AsterResult<()> {
/// let options = ClientOptions::new("http://localhost:5830")
///     .with_credentials("admin", "admin");
/// let conn = Connection::new("movies", &options)?;
/// let raw = conn.select("select * { ?s ?p ?o } limit 10", &QueryOptions::default())?;
/// let results = SelectResult::new(raw)?;
/// for binding in &results {
///     println!("{binding}");
/// }
/// # Ok(()) }
/// ```
pub struct Connection {
    client: HttpClient,
    transaction: Option<String>,
}

impl Connection {
    /// Open a connection to `database`. No request is made until the first
    /// operation.
    pub fn new(database: &str, options: &ClientOptions) -> AsterResult<Connection> {
        Ok(Connection {
            client: HttpClient::new(Some(database), options)?,
            transaction: None,
        })
    }

    /// The active transaction id, if any.
    pub fn transaction(&self) -> Option<&str> {
        self.transaction.as_deref()
    }

    fn assert_in_transaction(&self) -> AsterResult<&str> {
        self.transaction
            .as_deref()
            .ok_or_else(|| AsterError::Transaction("not in a transaction".into()))
    }

    fn assert_not_in_transaction(&self) -> AsterResult<()> {
        match self.transaction {
            Some(_) => Err(AsterError::Transaction("already in a transaction".into())),
            None => Ok(()),
        }
    }

    fn begin_inner(&mut self, reasoning: Option<bool>) -> AsterResult<String> {
        self.assert_not_in_transaction()?;
        let mut builder = self.client.post("/transaction/begin");
        if let Some(reasoning) = reasoning {
            builder = builder.query(&[("reasoning", reasoning)]);
        }
        let tx = self.client.send(builder)?.text()?;
        debug!("began transaction {tx}");
        self.transaction = Some(tx.clone());
        Ok(tx)
    }

    /// Begin a transaction and return its id.
    ///
    /// Fails with [`AsterError::Transaction`] before any network call if a
    /// transaction is already active.
    pub fn begin(&mut self) -> AsterResult<String> {
        self.begin_inner(None)
    }

    /// Begin a transaction with reasoning enabled or disabled for all
    /// queries inside it.
    pub fn begin_with_reasoning(&mut self, reasoning: bool) -> AsterResult<String> {
        self.begin_inner(Some(reasoning))
    }

    /// Commit the active transaction and clear the handle.
    ///
    /// Fails locally if no transaction is active. On a server failure the
    /// handle stays set, so the caller may still roll back.
    pub fn commit(&mut self) -> AsterResult<CommitResult> {
        let tx = self.assert_in_transaction()?.to_string();
        let response = self
            .client
            .send(self.client.post(&format!("/transaction/commit/{tx}")))?;
        debug!("committed transaction {tx}");
        self.transaction = None;
        Ok(response.json()?)
    }

    /// Roll back the active transaction and clear the handle.
    ///
    /// Fails locally if no transaction is active.
    pub fn rollback(&mut self) -> AsterResult<()> {
        let tx = self.assert_in_transaction()?.to_string();
        self.client
            .send(self.client.post(&format!("/transaction/rollback/{tx}")))?;
        debug!("rolled back transaction {tx}");
        self.transaction = None;
        Ok(())
    }

    fn upload(
        &self,
        builder: RequestBuilder,
        content: &Content,
        graph_uri: Option<&str>,
    ) -> AsterResult<()> {
        let reader = content.open()?;
        let mut builder = builder
            .query(&[("graph-uri", graph_uri)])
            .header(
                CONTENT_TYPE,
                content.content_type().unwrap_or("application/octet-stream"),
            );
        if let Some(encoding) = content.content_encoding() {
            builder = builder.header(CONTENT_ENCODING, encoding);
        }
        self.client.send(builder.body(Body::new(reader)))?;
        Ok(())
    }

    /// Add data to the database. Requires an active transaction.
    pub fn add(&self, content: &Content, graph_uri: Option<&str>) -> AsterResult<()> {
        let tx = self.assert_in_transaction()?;
        self.upload(self.client.post(&format!("/{tx}/add")), content, graph_uri)
    }

    /// Add a file that already resides on the server's file system.
    /// Requires an active transaction.
    pub fn add_server_side(&self, filename: &str, graph_uri: Option<&str>) -> AsterResult<()> {
        let tx = self.assert_in_transaction()?;
        let builder = self
            .client
            .post(&format!("/{tx}/add"))
            .query(&[("graph-uri", graph_uri)])
            .json(&json!({ "filename": filename }));
        self.client.send(builder)?;
        Ok(())
    }

    /// Remove data from the database. Requires an active transaction.
    pub fn remove(&self, content: &Content, graph_uri: Option<&str>) -> AsterResult<()> {
        let tx = self.assert_in_transaction()?;
        self.upload(
            self.client.post(&format!("/{tx}/remove")),
            content,
            graph_uri,
        )
    }

    /// Remove all data from the database, or from one named graph.
    /// Requires an active transaction.
    pub fn clear(&self, graph_uri: Option<&str>) -> AsterResult<()> {
        let tx = self.assert_in_transaction()?;
        let builder = self
            .client
            .post(&format!("/{tx}/clear"))
            .query(&[("graph-uri", graph_uri)]);
        self.client.send(builder)?;
        Ok(())
    }

    /// Number of triples in the database. An exact count can be slower on
    /// large databases than the default estimate.
    pub fn size(&self, exact: bool) -> AsterResult<u64> {
        let response = self
            .client
            .send(self.client.get("/size").query(&[("exact", exact)]))?;
        let text = response.text()?;
        text.trim()
            .parse()
            .map_err(|_| AsterError::InvalidResults(format!("unexpected size response: {text}")))
    }

    /// Export the database (or one named graph) in the given RDF
    /// serialization.
    pub fn export(&self, content_type: &str, graph_uri: Option<&str>) -> AsterResult<Bytes> {
        let builder = self
            .client
            .get("/export")
            .header(ACCEPT, content_type)
            .query(&[("graph-uri", graph_uri)]);
        Ok(self.client.send(builder)?.bytes()?)
    }

    /// Stream an export into `writer` instead of buffering it; returns the
    /// number of bytes written.
    pub fn export_to<W: Write + ?Sized>(
        &self,
        content_type: &str,
        graph_uri: Option<&str>,
        writer: &mut W,
    ) -> AsterResult<u64> {
        let builder = self
            .client
            .get("/export")
            .header(ACCEPT, content_type)
            .query(&[("graph-uri", graph_uri)]);
        let mut response = self.client.send(builder)?;
        Ok(response.copy_to(writer)?)
    }

    /// Explain how the server evaluates a SPARQL query.
    pub fn explain(&self, query: &str, base_uri: Option<&str>) -> AsterResult<String> {
        let mut form = vec![("query", query)];
        if let Some(base_uri) = base_uri {
            form.push(("baseURI", base_uri));
        }
        let response = self.client.send(self.client.post("/explain").form(&form))?;
        Ok(response.text()?)
    }

    fn run_query(
        &self,
        method: &str,
        accept: Option<&str>,
        query: &str,
        options: &QueryOptions,
    ) -> AsterResult<reqwest::blocking::Response> {
        let path = match &self.transaction {
            Some(tx) => format!("/{tx}/{method}"),
            None => format!("/{method}"),
        };
        let mut builder = self.client.post(&path).form(&options.to_form(query));
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        self.client.send(builder)
    }

    /// Execute a SELECT query and return the raw results JSON.
    ///
    /// Wrap the value in [`SelectResult`](crate::SelectResult) for typed
    /// access to the bindings.
    pub fn select(&self, query: &str, options: &QueryOptions) -> AsterResult<Value> {
        Ok(self
            .run_query("query", Some(SPARQL_JSON), query, options)?
            .json()?)
    }

    /// Execute a SELECT query requesting an alternative results format
    /// (e.g. CSV) and return the raw bytes.
    pub fn select_as(
        &self,
        query: &str,
        content_type: &str,
        options: &QueryOptions,
    ) -> AsterResult<Bytes> {
        Ok(self
            .run_query("query", Some(content_type), query, options)?
            .bytes()?)
    }

    /// Execute a CONSTRUCT/DESCRIBE query, returning Turtle.
    pub fn graph(&self, query: &str, options: &QueryOptions) -> AsterResult<Bytes> {
        self.graph_as(query, TURTLE, options)
    }

    /// Execute a CONSTRUCT/DESCRIBE query in the given RDF serialization.
    pub fn graph_as(
        &self,
        query: &str,
        content_type: &str,
        options: &QueryOptions,
    ) -> AsterResult<Bytes> {
        Ok(self
            .run_query("query", Some(content_type), query, options)?
            .bytes()?)
    }

    /// Execute a path query and return the raw results JSON.
    pub fn paths(&self, query: &str, options: &QueryOptions) -> AsterResult<Value> {
        Ok(self
            .run_query("query", Some(SPARQL_JSON), query, options)?
            .json()?)
    }

    /// Execute an ASK query.
    pub fn ask(&self, query: &str, options: &QueryOptions) -> AsterResult<bool> {
        let response = self.run_query("query", Some(BOOLEAN), query, options)?;
        parse_bool(&response.text()?)
    }

    /// Execute a SPARQL update. Runs inside the active transaction when one
    /// is open.
    pub fn update(&self, query: &str, options: &QueryOptions) -> AsterResult<()> {
        self.run_query("update", None, query, options)?;
        Ok(())
    }

    /// Whether the database (or one named graph) is consistent with
    /// respect to its schema.
    pub fn is_consistent(&self, graph_uri: Option<&str>) -> AsterResult<bool> {
        let builder = self
            .client
            .get("/reasoning/consistency")
            .query(&[("graph-uri", graph_uri)]);
        parse_bool(&self.client.send(builder)?.text()?)
    }

    /// Explain the given inference results; returns the server's proofs.
    pub fn explain_inference(&self, content: &Content) -> AsterResult<Value> {
        let path = match &self.transaction {
            Some(tx) => format!("/reasoning/{tx}/explain"),
            None => "/reasoning/explain".to_string(),
        };
        let reader = content.open()?;
        let mut builder = self.client.post(&path).header(
            CONTENT_TYPE,
            content.content_type().unwrap_or("application/octet-stream"),
        );
        if let Some(encoding) = content.content_encoding() {
            builder = builder.header(CONTENT_ENCODING, encoding);
        }
        let response = self.client.send(builder.body(Body::new(reader)))?;
        let mut payload: Value = response.json()?;
        Ok(payload
            .get_mut("proofs")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Explain why the database (or one named graph) is inconsistent.
    pub fn explain_inconsistency(&self, graph_uri: Option<&str>) -> AsterResult<Value> {
        let path = match &self.transaction {
            Some(tx) => format!("/reasoning/{tx}/explain/inconsistency"),
            None => "/reasoning/explain/inconsistency".to_string(),
        };
        let builder = self.client.get(&path).query(&[("graph-uri", graph_uri)]);
        let mut payload: Value = self.client.send(builder)?.json()?;
        Ok(payload
            .get_mut("proofs")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// The document storage sub-client.
    pub fn docs(&self) -> Docs<'_> {
        Docs { conn: self }
    }

    /// The integrity constraint validation sub-client.
    pub fn icv(&self) -> Icv<'_> {
        Icv { conn: self }
    }

    /// The GraphQL sub-client.
    pub fn graphql(&self) -> GraphQl<'_> {
        GraphQl { conn: self }
    }
}

/// Document storage on one database.
pub struct Docs<'a> {
    conn: &'a Connection,
}

impl Docs<'_> {
    /// Number of documents in the store.
    pub fn size(&self) -> AsterResult<u64> {
        let text = self
            .conn
            .client
            .send(self.conn.client.get("/docs/size"))?
            .text()?;
        text.trim()
            .parse()
            .map_err(|_| AsterError::InvalidResults(format!("unexpected size response: {text}")))
    }

    /// Add (or replace) a named document.
    pub fn add(&self, name: &str, content: &Content) -> AsterResult<()> {
        let reader = content.open()?;
        let part = Part::reader(reader).file_name(name.to_string());
        let form = Form::new().part("upload", part);
        self.conn
            .client
            .send(self.conn.client.post("/docs").multipart(form))?;
        Ok(())
    }

    /// Fetch a document's contents.
    pub fn get(&self, name: &str) -> AsterResult<Bytes> {
        let path = format!("/docs/{}", crate::client::escape_path(name));
        Ok(self.conn.client.send(self.conn.client.get(&path))?.bytes()?)
    }

    /// Stream a document into `writer`; returns the number of bytes
    /// written.
    pub fn get_to<W: Write + ?Sized>(&self, name: &str, writer: &mut W) -> AsterResult<u64> {
        let path = format!("/docs/{}", crate::client::escape_path(name));
        let mut response = self.conn.client.send(self.conn.client.get(&path))?;
        Ok(response.copy_to(writer)?)
    }

    /// Delete a document.
    pub fn delete(&self, name: &str) -> AsterResult<()> {
        let path = format!("/docs/{}", crate::client::escape_path(name));
        self.conn.client.send(self.conn.client.delete(&path))?;
        Ok(())
    }

    /// Remove all documents from the store.
    pub fn clear(&self) -> AsterResult<()> {
        self.conn.client.send(self.conn.client.delete("/docs"))?;
        Ok(())
    }
}

/// Parameters for a constraint validation report.
#[derive(Debug, Clone, Default)]
pub struct IcvReportOptions {
    /// Constraint shapes to validate
    pub shapes: Option<String>,
    /// Shape graphs to validate
    pub shape_graphs: Option<String>,
    /// Focus nodes to validate
    pub nodes: Option<String>,
    /// Maximum number of violations to report
    pub count_limit: Option<u64>,
    /// Named graph to validate
    pub graph_uri: Option<String>,
    /// Enable reasoning during validation
    pub reasoning: Option<bool>,
}

impl IcvReportOptions {
    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("prettify".to_string(), "true".to_string())];
        if let Some(shapes) = &self.shapes {
            params.push(("shapes".into(), shapes.clone()));
        }
        if let Some(graphs) = &self.shape_graphs {
            params.push(("shape.graphs".into(), graphs.clone()));
        }
        if let Some(nodes) = &self.nodes {
            params.push(("nodes".into(), nodes.clone()));
        }
        if let Some(limit) = self.count_limit {
            params.push(("countLimit".into(), limit.to_string()));
        }
        if let Some(graph_uri) = &self.graph_uri {
            params.push(("graph-uri".into(), graph_uri.clone()));
        }
        if let Some(reasoning) = self.reasoning {
            params.push(("reasoning".into(), reasoning.to_string()));
        }
        params
    }
}

/// Integrity constraint validation on one database.
pub struct Icv<'a> {
    conn: &'a Connection,
}

impl Icv<'_> {
    /// List the database's integrity constraints.
    pub fn list(&self) -> AsterResult<String> {
        Ok(self.conn.client.send(self.conn.client.get("/icv"))?.text()?)
    }

    /// Whether the data is valid with respect to the given constraints.
    pub fn is_valid(&self, constraints: &Content, graph_uri: Option<&str>) -> AsterResult<bool> {
        let path = match &self.conn.transaction {
            Some(tx) => format!("/icv/{tx}/validate"),
            None => "/icv/validate".to_string(),
        };
        let reader = constraints.open()?;
        let mut builder = self
            .conn
            .client
            .post(&path)
            .query(&[("graph-uri", graph_uri)])
            .header(
                CONTENT_TYPE,
                constraints
                    .content_type()
                    .unwrap_or("application/octet-stream"),
            );
        if let Some(encoding) = constraints.content_encoding() {
            builder = builder.header(CONTENT_ENCODING, encoding);
        }
        let response = self.conn.client.send(builder.body(Body::new(reader)))?;
        parse_bool(&response.text()?)
    }

    /// Explain violations of the given constraints. The server replies
    /// with one multipart payload per violation; the decoded parts are
    /// returned in order.
    pub fn explain_violations(
        &self,
        constraints: &Content,
        graph_uri: Option<&str>,
    ) -> AsterResult<Vec<Bytes>> {
        let path = match &self.conn.transaction {
            Some(tx) => format!("/icv/{tx}/violations"),
            None => "/icv/violations".to_string(),
        };
        let reader = constraints.open()?;
        let mut builder = self
            .conn
            .client
            .post(&path)
            .query(&[("graph-uri", graph_uri)])
            .header(
                CONTENT_TYPE,
                constraints
                    .content_type()
                    .unwrap_or("application/octet-stream"),
            );
        if let Some(encoding) = constraints.content_encoding() {
            builder = builder.header(CONTENT_ENCODING, encoding);
        }
        let response = self.conn.client.send(builder.body(Body::new(reader)))?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes()?;
        crate::client::multipart_parts(&content_type, &body)
    }

    /// Produce a SHACL validation report.
    pub fn report(&self, options: &IcvReportOptions) -> AsterResult<String> {
        let builder = self
            .conn
            .client
            .post("/icv/report")
            .query(&options.to_params());
        Ok(self.conn.client.send(builder)?.text()?)
    }
}

/// GraphQL queries and schema management on one database.
pub struct GraphQl<'a> {
    conn: &'a Connection,
}

impl GraphQl<'_> {
    /// Execute a GraphQL query; returns the `data` member of the response.
    ///
    /// The GraphQL endpoint reports evaluation errors inside a 2xx
    /// response; those become [`AsterError::Server`] with the error
    /// payload as the message.
    pub fn query(&self, query: &str, variables: Option<Value>) -> AsterResult<Value> {
        let payload = json!({
            "query": query,
            "variables": variables.unwrap_or_else(|| json!({})),
        });
        let response = self
            .conn
            .client
            .send(self.conn.client.post("/graphql").json(&payload))?;
        let status = response.status().as_u16();
        let mut body: Value = response.json()?;
        match body.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => Err(AsterError::Server(crate::Fault {
                message: body.to_string(),
                status,
                code: None,
            })),
        }
    }

    /// All GraphQL schemas registered for the database.
    pub fn schemas(&self) -> AsterResult<Value> {
        let mut body: Value = self
            .conn
            .client
            .send(self.conn.client.get("/graphql/schemas"))?
            .json()?;
        Ok(body
            .get_mut("schemas")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Fetch one schema's text.
    pub fn schema(&self, name: &str) -> AsterResult<String> {
        let path = format!("/graphql/schemas/{}", crate::client::escape_path(name));
        Ok(self.conn.client.send(self.conn.client.get(&path))?.text()?)
    }

    /// Register a schema under `name`.
    pub fn add_schema(&self, name: &str, content: &Content) -> AsterResult<()> {
        let path = format!("/graphql/schemas/{}", crate::client::escape_path(name));
        let reader = content.open()?;
        self.conn
            .client
            .send(self.conn.client.put(&path).body(Body::new(reader)))?;
        Ok(())
    }

    /// Remove one schema.
    pub fn remove_schema(&self, name: &str) -> AsterResult<()> {
        let path = format!("/graphql/schemas/{}", crate::client::escape_path(name));
        self.conn.client.send(self.conn.client.delete(&path))?;
        Ok(())
    }

    /// Remove all schemas.
    pub fn clear_schemas(&self) -> AsterResult<()> {
        self.conn
            .client
            .send(self.conn.client.delete("/graphql/schemas"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unroutable() -> ClientOptions {
        // RFC 5737 TEST-NET address: never reachable, so any accidental
        // network call fails loudly instead of hitting a real server
        ClientOptions::new("http://192.0.2.1:5830")
    }

    #[test]
    fn commit_without_transaction_fails_locally() {
        let mut conn = Connection::new("db", &unroutable()).unwrap();
        match conn.commit() {
            Err(AsterError::Transaction(msg)) => assert_eq!(msg, "not in a transaction"),
            other => panic!("expected a transaction error, got {other:?}"),
        }
    }

    #[test]
    fn rollback_without_transaction_fails_locally() {
        let mut conn = Connection::new("db", &unroutable()).unwrap();
        assert!(matches!(
            conn.rollback(),
            Err(AsterError::Transaction(_))
        ));
    }

    #[test]
    fn begin_twice_fails_locally() {
        let mut conn = Connection::new("db", &unroutable()).unwrap();
        conn.transaction = Some("tx-1".to_string());
        match conn.begin() {
            Err(AsterError::Transaction(msg)) => assert_eq!(msg, "already in a transaction"),
            other => panic!("expected a transaction error, got {other:?}"),
        }
        // the original transaction is untouched
        assert_eq!(conn.transaction(), Some("tx-1"));
    }

    #[test]
    fn mutations_without_transaction_fail_locally() {
        let conn = Connection::new("db", &unroutable()).unwrap();
        let content = Content::raw(":a :b :c .", TURTLE);
        assert!(matches!(
            conn.add(&content, None),
            Err(AsterError::Transaction(_))
        ));
        assert!(matches!(
            conn.remove(&content, None),
            Err(AsterError::Transaction(_))
        ));
        assert!(matches!(conn.clear(None), Err(AsterError::Transaction(_))));
        assert!(matches!(
            conn.add_server_side("data.ttl", None),
            Err(AsterError::Transaction(_))
        ));
    }

    #[test]
    fn query_form_includes_set_options() {
        let options = QueryOptions::default()
            .with_limit(10)
            .with_offset(5)
            .with_reasoning(true)
            .bind("o", "<urn:a>");
        let form = options.to_form("select * {?s ?p ?o}");
        assert!(form.contains(&("query".into(), "select * {?s ?p ?o}".into())));
        assert!(form.contains(&("limit".into(), "10".into())));
        assert!(form.contains(&("offset".into(), "5".into())));
        assert!(form.contains(&("reasoning".into(), "true".into())));
        assert!(form.contains(&("$o".into(), "<urn:a>".into())));
        // unset options stay out of the form
        assert!(!form.iter().any(|(k, _)| k == "timeout" || k == "baseURI"));
    }

    #[test]
    fn query_form_repeats_graph_uris() {
        let options = QueryOptions {
            default_graph_uri: vec!["urn:g1".into(), "urn:g2".into()],
            ..QueryOptions::default()
        };
        let form = options.to_form("select * {?s ?p ?o}");
        let graphs: Vec<_> = form
            .iter()
            .filter(|(k, _)| k == "default-graph-uri")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(graphs, ["urn:g1", "urn:g2"]);
    }

    #[test]
    fn parses_boolean_responses() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("TRUE\n").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(matches!(
            parse_bool("maybe"),
            Err(AsterError::InvalidResults(_))
        ));
    }

    #[test]
    fn icv_report_params_always_prettify() {
        let params = IcvReportOptions::default().to_params();
        assert_eq!(params, vec![("prettify".to_string(), "true".to_string())]);

        let params = IcvReportOptions {
            count_limit: Some(3),
            reasoning: Some(false),
            ..IcvReportOptions::default()
        }
        .to_params();
        assert!(params.contains(&("countLimit".into(), "3".into())));
        assert!(params.contains(&("reasoning".into(), "false".into())));
    }
}
