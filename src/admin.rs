//! Server administration
//!
//! [`Admin`] is the entry point for admin operations: server lifecycle and
//! metrics, databases, stored queries, users, roles, virtual graphs, and
//! data sources. Each resource gets a thin handle that keeps only its name
//! and the shared transport; every method is one HTTP call, and
//! constructing a handle verifies the resource exists server-side.

use bytes::Bytes;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_ENCODING};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::client::{escape_path, ClientOptions, HttpClient};
use crate::content::{Content, ImportData, Mappings};
use crate::error::{AsterError, AsterResult};
use crate::models::{NamespaceBinding, Permission, StoredQueryDetails};

/// Mapping syntax tag sent when mappings carry no recognizable syntax.
const NATIVE_MAPPING_SYNTAX: &str = "ASTER";

/// Default context URI for materialized virtual graphs.
const DEFAULT_CONTEXT: &str = "tag:aster:api:context:default";

fn string_list(payload: &Value, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn merge_object(target: &mut Map<String, Value>, extra: Option<&Value>) {
    if let Some(Value::Object(extra)) = extra {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Admin session against one server.
///
/// # Example
/// ```no_run
/// # use asterdb_sdk::{Admin, ClientOptions};
/// # fn run() -> asterdb_sdk::AsterResult<()> {
/// let admin = Admin::new(&ClientOptions::default())?;
/// for db in admin.databases()? {
///     println!("{}", db.name());
/// }
/// # Ok(()) }
/// ```
pub struct Admin {
    client: HttpClient,
}

impl Admin {
    /// Open an admin session. Round-trips `/admin/alive` so a bad endpoint
    /// or bad credentials fail here rather than on first use.
    pub fn new(options: &ClientOptions) -> AsterResult<Admin> {
        let admin = Admin {
            client: HttpClient::new(None, options)?,
        };
        admin.alive()?;
        Ok(admin)
    }

    /// Whether the server process is running.
    pub fn alive(&self) -> AsterResult<bool> {
        let response = self.client.send(self.client.get("/admin/alive"))?;
        Ok(response.status().as_u16() == 200)
    }

    /// Whether the server is accepting traffic.
    pub fn healthcheck(&self) -> AsterResult<bool> {
        let response = self.client.send(self.client.get("/admin/healthcheck"))?;
        Ok(response.status().as_u16() == 200)
    }

    /// Shut the server down.
    pub fn shutdown(&self) -> AsterResult<()> {
        self.client.send(self.client.post("/admin/shutdown"))?;
        Ok(())
    }

    /// Server metrics in Prometheus text format.
    pub fn prometheus_metrics(&self) -> AsterResult<String> {
        let response = self
            .client
            .send(self.client.get("/admin/status/prometheus"))?;
        Ok(response.text()?)
    }

    /// Server metrics from the registry, as JSON.
    pub fn server_metrics(&self) -> AsterResult<Value> {
        Ok(self.client.send(self.client.get("/admin/status"))?.json()?)
    }

    /// Values of all set server-level properties.
    pub fn server_properties(&self) -> AsterResult<Value> {
        Ok(self
            .client
            .send(self.client.get("/admin/properties"))?
            .json()?)
    }

    /// Whether the session's credentials are valid.
    pub fn validate(&self) -> AsterResult<bool> {
        let response = self.client.send(self.client.get("/admin/users/valid"))?;
        Ok(response.status().as_u16() == 200)
    }

    /// A handle to an existing database.
    pub fn database(&self, name: &str) -> AsterResult<Database> {
        Database::attach(name, &self.client)
    }

    /// Handles to all databases on the server.
    pub fn databases(&self) -> AsterResult<Vec<Database>> {
        let payload: Value = self
            .client
            .send(self.client.get("/admin/databases"))?
            .json()?;
        string_list(&payload, "databases")
            .iter()
            .map(|name| Database::attach(name, &self.client))
            .collect()
    }

    /// Create a database, optionally bulk-loading datasets into it.
    ///
    /// Each dataset is a [`Content`] plus an optional named graph to load
    /// it into. With `copy_to_server` the files are shipped to the
    /// server's file system (replicated across a cluster) before loading.
    pub fn new_database(
        &self,
        name: &str,
        options: Option<&Value>,
        datasets: &[(Content, Option<String>)],
        copy_to_server: bool,
    ) -> AsterResult<Database> {
        let mut form = Form::new();
        let mut file_metas = Vec::new();
        for (content, context) in datasets {
            let fname = content.name().unwrap_or("data").to_string();
            let mut meta = json!({ "filename": &fname });
            if let Some(context) = context {
                meta["context"] = json!(context);
            }
            file_metas.push(meta);

            let mut part = Part::reader(content.open()?).file_name(fname.clone());
            if let Some(content_type) = content.content_type() {
                part = part.mime_str(content_type)?;
            }
            if let Some(encoding) = content.content_encoding() {
                let mut headers = HeaderMap::new();
                headers.insert(
                    CONTENT_ENCODING,
                    HeaderValue::from_str(encoding)
                        .map_err(|_| AsterError::InvalidHeader(encoding.to_string()))?,
                );
                part = part.headers(headers);
            }
            form = form.part(fname, part);
        }

        let root = json!({
            "dbname": name,
            "options": options.cloned().unwrap_or_else(|| json!({})),
            "files": file_metas,
            "copyToServer": copy_to_server,
        });
        form = form.part(
            "root",
            Part::text(root.to_string()).mime_str("application/json")?,
        );

        info!("creating database {name}");
        self.client
            .send(self.client.post("/admin/databases").multipart(form))?;
        Database::attach(name, &self.client)
    }

    /// Restore a database from a backup on the server's file system.
    pub fn restore(&self, from_path: &str, name: Option<&str>, force: bool) -> AsterResult<()> {
        let builder = self
            .client
            .put("/admin/restore")
            .query(&[("from", from_path)])
            .query(&[("force", force)])
            .query(&[("name", name)]);
        self.client.send(builder)?;
        Ok(())
    }

    /// Back up every database on the server.
    pub fn backup_all(&self, location: Option<&str>) -> AsterResult<()> {
        let builder = self
            .client
            .put("/admin/databases/backup_all")
            .query(&[("to", location)]);
        self.client.send(builder)?;
        Ok(())
    }

    /// All queries currently running on the server.
    pub fn queries(&self) -> AsterResult<Value> {
        Ok(self.client.send(self.client.get("/admin/queries"))?.json()?)
    }

    /// Details of one running query.
    pub fn query(&self, id: &str) -> AsterResult<Value> {
        let path = format!("/admin/queries/{}", escape_path(id));
        Ok(self.client.send(self.client.get(&path))?.json()?)
    }

    /// Kill a running query.
    pub fn kill_query(&self, id: &str) -> AsterResult<()> {
        let path = format!("/admin/queries/{}", escape_path(id));
        self.client.send(self.client.delete(&path))?;
        Ok(())
    }

    /// A handle to an existing stored query.
    pub fn stored_query(&self, name: &str) -> AsterResult<StoredQuery> {
        StoredQuery::attach(name, &self.client)
    }

    /// Handles to all stored queries.
    pub fn stored_queries(&self) -> AsterResult<Vec<StoredQuery>> {
        let payload: Value = self
            .client
            .send(
                self.client
                    .get("/admin/queries/stored")
                    .header(ACCEPT, "application/json"),
            )?
            .json()?;
        let queries = payload
            .get("queries")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        queries
            .iter()
            .map(|details| {
                let details: StoredQueryDetails = serde_json::from_value(details.clone())?;
                Ok(StoredQuery {
                    path: format!("/admin/queries/stored/{}", escape_path(&details.name)),
                    client: self.client.clone(),
                    details,
                })
            })
            .collect()
    }

    /// Store a query under `name`. Extra options (e.g. `shared`,
    /// `database`) are merged into the request payload.
    pub fn new_stored_query(
        &self,
        name: &str,
        query: &str,
        options: Option<&Value>,
    ) -> AsterResult<StoredQuery> {
        let mut meta = Map::new();
        meta.insert("name".into(), json!(name));
        meta.insert("query".into(), json!(query));
        meta.insert("creator".into(), json!(self.client.username()));
        merge_object(&mut meta, options);

        self.client.send(
            self.client
                .post("/admin/queries/stored")
                .json(&Value::Object(meta)),
        )?;
        StoredQuery::attach(name, &self.client)
    }

    /// Remove every stored query on the server.
    pub fn clear_stored_queries(&self) -> AsterResult<()> {
        self.client
            .send(self.client.delete("/admin/queries/stored"))?;
        Ok(())
    }

    /// A handle to an existing user.
    pub fn user(&self, name: &str) -> AsterResult<User> {
        User::attach(name, &self.client)
    }

    /// Handles to all users.
    pub fn users(&self) -> AsterResult<Vec<User>> {
        let payload: Value = self.client.send(self.client.get("/admin/users"))?.json()?;
        string_list(&payload, "users")
            .iter()
            .map(|name| User::attach(name, &self.client))
            .collect()
    }

    /// Create a user. Only a superuser can create another superuser.
    pub fn new_user(&self, username: &str, password: &str, superuser: bool) -> AsterResult<User> {
        // the server expects the password as an array of characters
        let password: Vec<String> = password.chars().map(String::from).collect();
        let meta = json!({
            "username": username,
            "password": password,
            "superuser": superuser,
        });
        self.client
            .send(self.client.post("/admin/users").json(&meta))?;
        User::attach(username, &self.client)
    }

    /// A handle to an existing role.
    pub fn role(&self, name: &str) -> AsterResult<Role> {
        Role::attach(name, &self.client)
    }

    /// Handles to all roles.
    pub fn roles(&self) -> AsterResult<Vec<Role>> {
        let payload: Value = self.client.send(self.client.get("/admin/roles"))?.json()?;
        string_list(&payload, "roles")
            .iter()
            .map(|name| Role::attach(name, &self.client))
            .collect()
    }

    /// Create a role.
    pub fn new_role(&self, name: &str) -> AsterResult<Role> {
        self.client.send(
            self.client
                .post("/admin/roles")
                .json(&json!({ "rolename": name })),
        )?;
        Role::attach(name, &self.client)
    }

    /// A handle to an existing virtual graph.
    pub fn virtual_graph(&self, name: &str) -> AsterResult<VirtualGraph> {
        VirtualGraph::attach(name, &self.client)
    }

    /// Handles to all virtual graphs.
    pub fn virtual_graphs(&self) -> AsterResult<Vec<VirtualGraph>> {
        let payload: Value = self
            .client
            .send(self.client.get("/admin/virtual_graphs"))?
            .json()?;
        string_list(&payload, "virtual_graphs")
            .iter()
            .map(|name| {
                let name = name.trim_start_matches("virtual://");
                VirtualGraph::attach(name, &self.client)
            })
            .collect()
    }

    /// Create a virtual graph over a data source.
    ///
    /// Without `mappings` the server autogenerates them. Without `db` the
    /// virtual graph is associated with all databases.
    pub fn new_virtual_graph(
        &self,
        name: &str,
        mappings: Option<&Mappings>,
        options: Option<&Value>,
        datasource: Option<&str>,
        db: Option<&str>,
    ) -> AsterResult<VirtualGraph> {
        let mut meta = Map::new();
        meta.insert("name".into(), json!(name));

        let mut options = match options {
            Some(Value::Object(options)) => options.clone(),
            _ => Map::new(),
        };
        match mappings {
            Some(mappings) => {
                let syntax = mappings.syntax().unwrap_or(NATIVE_MAPPING_SYNTAX);
                options.insert("mappings.syntax".into(), json!(syntax));
                meta.insert("mappings".into(), json!(mappings.read()?));
            }
            None => {
                meta.insert("mappings".into(), json!(""));
            }
        }
        if !options.is_empty() {
            meta.insert("options".into(), Value::Object(options));
        }
        if let Some(datasource) = datasource {
            meta.insert("data_source".into(), json!(datasource));
        }
        if let Some(db) = db {
            meta.insert("db".into(), json!(db));
        }

        info!("creating virtual graph {name}");
        self.client.send(
            self.client
                .post("/admin/virtual_graphs")
                .json(&Value::Object(meta)),
        )?;
        VirtualGraph::attach(name, &self.client)
    }

    /// Materialize a virtual graph directly into a database.
    ///
    /// Either `data_source` or `options` must be given.
    pub fn materialize_virtual_graph(
        &self,
        db: &str,
        mappings: Option<&Mappings>,
        data_source: Option<&str>,
        options: Option<&Value>,
        named_graph: Option<&str>,
        remove_all: bool,
    ) -> AsterResult<()> {
        if data_source.is_none() && options.is_none() {
            return Err(AsterError::InvalidArgument(
                "either `data_source` or `options` must be provided".into(),
            ));
        }

        let mut options = match options {
            Some(Value::Object(options)) => options.clone(),
            _ => Map::new(),
        };
        let mappings_text = match mappings {
            Some(mappings) => {
                let syntax = mappings.syntax().unwrap_or(NATIVE_MAPPING_SYNTAX);
                options.insert("mappings.syntax".into(), json!(syntax));
                mappings.read()?
            }
            None => String::new(),
        };

        let mut meta = json!({
            "db": db,
            "mappings": mappings_text,
            "named_graph": named_graph.unwrap_or(DEFAULT_CONTEXT),
            "remove_all": remove_all,
            "options": options,
        });
        if let Some(data_source) = data_source {
            meta["data_source"] = json!(data_source);
        }

        self.client.send(
            self.client
                .post("/admin/virtual_graphs/import_db")
                .json(&meta),
        )?;
        Ok(())
    }

    /// Import a CSV/TSV/JSON file into a database through mappings.
    pub fn import_file(
        &self,
        db: &str,
        mappings: &Mappings,
        input: &ImportData,
        options: Option<&Value>,
        named_graph: Option<&str>,
    ) -> AsterResult<bool> {
        let mut options = match options {
            Some(Value::Object(options)) => options.clone(),
            _ => Map::new(),
        };
        if let Some(syntax) = mappings.syntax() {
            options.insert("mappings.syntax".into(), json!(syntax));
        }
        if let Some(separator) = input.separator() {
            options.insert("csv.separator".into(), json!(separator));
        }
        // the import endpoint expects options as a properties-file string
        let options_text = options
            .iter()
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{k}={s}"),
                None => format!("{k}={v}"),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut form = Form::new()
            .text("database", db.to_string())
            .text("mappings", mappings.read()?)
            .text("options", options_text)
            .text("input_file_type", input.format().input_type());
        if let Some(named_graph) = named_graph {
            form = form.text("named_graph", named_graph.to_string());
        }

        let mut part = Part::bytes(input.read_bytes()?.to_vec())
            .file_name(input.name().to_string())
            .mime_str(input.format().content_type())?;
        if let Some(encoding) = input.content_encoding() {
            let mut headers = HeaderMap::new();
            headers.insert(
                CONTENT_ENCODING,
                HeaderValue::from_str(encoding)
                    .map_err(|_| AsterError::InvalidHeader(encoding.to_string()))?,
            );
            part = part.headers(headers);
        }
        form = form.part("input_file", part);

        let response = self.client.send(
            self.client
                .post("/admin/virtual_graphs/import")
                .multipart(form),
        )?;
        Ok(response.status().is_success())
    }

    /// A handle to an existing data source.
    pub fn datasource(&self, name: &str) -> AsterResult<DataSource> {
        DataSource::attach(name, &self.client)
    }

    /// Handles to all data sources.
    pub fn datasources(&self) -> AsterResult<Vec<DataSource>> {
        let payload: Value = self
            .client
            .send(self.client.get("/admin/data_sources"))?
            .json()?;
        string_list(&payload, "data_sources")
            .iter()
            .map(|name| DataSource::attach(name, &self.client))
            .collect()
    }

    /// Details of every data source.
    pub fn datasources_info(&self) -> AsterResult<Value> {
        let mut payload: Value = self
            .client
            .send(self.client.get("/admin/data_sources/list"))?
            .json()?;
        Ok(payload
            .get_mut("data_sources")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Create a data source.
    pub fn new_datasource(&self, name: &str, options: &Value) -> AsterResult<DataSource> {
        let meta = json!({ "name": name, "options": options });
        self.client
            .send(self.client.post("/admin/data_sources").json(&meta))?;
        DataSource::attach(name, &self.client)
    }
}

/// Handle to one database.
pub struct Database {
    name: String,
    path: String,
    client: HttpClient,
}

impl Database {
    fn attach(name: &str, client: &HttpClient) -> AsterResult<Database> {
        let db = Database {
            name: name.to_string(),
            path: format!("/admin/databases/{}", escape_path(name)),
            client: client.clone(),
        };
        // existence check; a missing database surfaces as NotFound here
        db.client.send(db.client.get(&format!("{}/options", db.path)))?;
        Ok(db)
    }

    /// The database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values of specific metadata options.
    pub fn get_options(&self, options: &[&str]) -> AsterResult<Value> {
        let meta: Map<String, Value> = options
            .iter()
            .map(|option| (option.to_string(), Value::Null))
            .collect();
        let builder = self
            .client
            .put(&format!("{}/options", self.path))
            .json(&Value::Object(meta));
        Ok(self.client.send(builder)?.json()?)
    }

    /// Values of every metadata option.
    pub fn get_all_options(&self) -> AsterResult<Value> {
        Ok(self
            .client
            .send(self.client.get(&format!("{}/options", self.path)))?
            .json()?)
    }

    /// Set database options. Some options require the database to be
    /// offline.
    pub fn set_options(&self, options: &Value) -> AsterResult<()> {
        self.client
            .send(self.client.post(&format!("{}/options", self.path)).json(options))?;
        Ok(())
    }

    /// Optimize the database.
    pub fn optimize(&self) -> AsterResult<()> {
        self.client
            .send(self.client.put(&format!("{}/optimize", self.path)))?;
        Ok(())
    }

    /// Verify the database.
    pub fn verify(&self) -> AsterResult<()> {
        self.client
            .send(self.client.post(&format!("{}/verify", self.path)))?;
        Ok(())
    }

    /// Attempt to recover a corrupted database. The database must be
    /// offline.
    pub fn repair(&self) -> AsterResult<bool> {
        let response = self
            .client
            .send(self.client.post(&format!("{}/repair", self.path)))?;
        Ok(response.status().is_success())
    }

    /// Back the database up on the server, optionally to a specific path.
    pub fn backup(&self, to: Option<&str>) -> AsterResult<()> {
        let builder = self
            .client
            .put(&format!("{}/backup", self.path))
            .query(&[("to", to)]);
        self.client.send(builder)?;
        Ok(())
    }

    /// Bring the database online.
    pub fn online(&self) -> AsterResult<()> {
        self.client
            .send(self.client.put(&format!("{}/online", self.path)))?;
        Ok(())
    }

    /// Take the database offline.
    pub fn offline(&self) -> AsterResult<()> {
        self.client
            .send(self.client.put(&format!("{}/offline", self.path)))?;
        Ok(())
    }

    /// Drop the database, consuming the handle.
    pub fn drop(self) -> AsterResult<()> {
        info!("dropping database {}", self.name);
        self.client.send(self.client.delete(&self.path))?;
        Ok(())
    }

    /// Namespace prefixes stored in the database.
    pub fn namespaces(&self) -> AsterResult<Vec<NamespaceBinding>> {
        let path = format!("/{}/namespaces", escape_path(&self.name));
        let mut payload: Value = self.client.send(self.client.get(&path))?.json()?;
        let namespaces = payload
            .get_mut("namespaces")
            .map(Value::take)
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(namespaces)?)
    }

    /// Import prefix declarations from an RDF file; only the declarations
    /// are processed. Returns all namespaces after the import.
    pub fn import_namespaces(&self, content: &Content) -> AsterResult<Value> {
        let path = format!("/{}/namespaces", escape_path(&self.name));
        let reader = content.open()?;
        let mut builder = self.client.post(&path).header(
            reqwest::header::CONTENT_TYPE,
            content.content_type().unwrap_or("application/octet-stream"),
        );
        if let Some(encoding) = content.content_encoding() {
            builder = builder.header(CONTENT_ENCODING, encoding);
        }
        let response = self
            .client
            .send(builder.body(reqwest::blocking::Body::new(reader)))?;
        Ok(response.json()?)
    }

    /// Add one namespace prefix. Fails if the prefix is already bound.
    pub fn add_namespace(&self, prefix: &str, iri: &str) -> AsterResult<()> {
        if self.namespaces()?.iter().any(|ns| ns.prefix == prefix) {
            return Err(AsterError::InvalidArgument(format!(
                "namespace already exists for prefix `{prefix}`"
            )));
        }
        let mut namespaces = string_list(
            &self.get_options(&["database.namespaces"])?,
            "database.namespaces",
        );
        namespaces.push(format!("{prefix}={iri}"));
        self.set_options(&json!({ "database.namespaces": namespaces }))
    }

    /// Remove one namespace prefix. Fails if the prefix is not bound.
    pub fn remove_namespace(&self, prefix: &str) -> AsterResult<()> {
        let existing = self
            .namespaces()?
            .into_iter()
            .find(|ns| ns.prefix == prefix)
            .ok_or_else(|| {
                AsterError::InvalidArgument(format!("no namespace for prefix `{prefix}`"))
            })?;
        let mut namespaces = string_list(
            &self.get_options(&["database.namespaces"])?,
            "database.namespaces",
        );
        namespaces.retain(|entry| entry != &format!("{}={}", existing.prefix, existing.name));
        self.set_options(&json!({ "database.namespaces": namespaces }))
    }
}

/// Handle to one stored query.
pub struct StoredQuery {
    path: String,
    client: HttpClient,
    details: StoredQueryDetails,
}

impl StoredQuery {
    fn attach(name: &str, client: &HttpClient) -> AsterResult<StoredQuery> {
        let path = format!("/admin/queries/stored/{}", escape_path(name));
        let mut query = StoredQuery {
            path,
            client: client.clone(),
            details: StoredQueryDetails {
                name: name.to_string(),
                query: String::new(),
                creator: None,
                description: None,
                database: None,
                shared: false,
                reasoning: false,
            },
        };
        query.refresh()?;
        Ok(query)
    }

    fn refresh(&mut self) -> AsterResult<()> {
        let payload: Value = self
            .client
            .send(
                self.client
                    .get(&self.path)
                    .header(ACCEPT, "application/json"),
            )?
            .json()?;
        let first = payload
            .get("queries")
            .and_then(Value::as_array)
            .and_then(|queries| queries.first())
            .ok_or_else(|| {
                AsterError::InvalidResults("stored query listing without entries".into())
            })?;
        self.details = serde_json::from_value(first.clone())?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn query(&self) -> &str {
        &self.details.query
    }

    pub fn creator(&self) -> Option<&str> {
        self.details.creator.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.details.description.as_deref()
    }

    pub fn database(&self) -> Option<&str> {
        self.details.database.as_deref()
    }

    pub fn shared(&self) -> bool {
        self.details.shared
    }

    pub fn reasoning(&self) -> bool {
        self.details.reasoning
    }

    /// Update fields of the stored query, e.g.
    /// `{"description": "all triples"}`.
    pub fn update(&mut self, changes: &Value) -> AsterResult<()> {
        let mut meta = Map::new();
        meta.insert("name".into(), json!(&self.details.name));
        meta.insert("query".into(), json!(&self.details.query));
        meta.insert("creator".into(), json!(&self.details.creator));
        merge_object(&mut meta, Some(changes));

        self.client.send(
            self.client
                .put("/admin/queries/stored")
                .json(&Value::Object(meta)),
        )?;
        self.refresh()
    }

    /// Delete the stored query, consuming the handle.
    pub fn delete(self) -> AsterResult<()> {
        self.client.send(self.client.delete(&self.path))?;
        Ok(())
    }
}

/// Handle to one user.
pub struct User {
    name: String,
    path: String,
    client: HttpClient,
}

impl User {
    fn attach(name: &str, client: &HttpClient) -> AsterResult<User> {
        let user = User {
            name: name.to_string(),
            path: format!("/admin/users/{}", escape_path(name)),
            client: client.clone(),
        };
        user.client.send(user.client.get(&user.path))?;
        Ok(user)
    }

    /// The username.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a new password for the user.
    pub fn set_password(&self, password: &str) -> AsterResult<()> {
        let builder = self
            .client
            .put(&format!("{}/pwd", self.path))
            .json(&json!({ "password": password }));
        self.client.send(builder)?;
        Ok(())
    }

    /// Whether the user is enabled.
    pub fn is_enabled(&self) -> AsterResult<bool> {
        let payload: Value = self
            .client
            .send(self.client.get(&format!("{}/enabled", self.path)))?
            .json()?;
        Ok(payload
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Enable or disable the user.
    pub fn set_enabled(&self, enabled: bool) -> AsterResult<()> {
        let builder = self
            .client
            .put(&format!("{}/enabled", self.path))
            .json(&json!({ "enabled": enabled }));
        self.client.send(builder)?;
        Ok(())
    }

    /// Whether the user is a superuser.
    pub fn is_superuser(&self) -> AsterResult<bool> {
        let payload: Value = self
            .client
            .send(self.client.get(&format!("{}/superuser", self.path)))?
            .json()?;
        Ok(payload
            .get("superuser")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// The user's roles.
    pub fn roles(&self) -> AsterResult<Vec<Role>> {
        let payload: Value = self
            .client
            .send(self.client.get(&format!("{}/roles", self.path)))?
            .json()?;
        string_list(&payload, "roles")
            .iter()
            .map(|name| Role::attach(name, &self.client))
            .collect()
    }

    /// Grant an existing role to the user.
    pub fn add_role(&self, role: &str) -> AsterResult<()> {
        let builder = self
            .client
            .post(&format!("{}/roles", self.path))
            .json(&json!({ "rolename": role }));
        self.client.send(builder)?;
        Ok(())
    }

    /// Replace the user's roles.
    pub fn set_roles(&self, roles: &[&str]) -> AsterResult<()> {
        let builder = self
            .client
            .put(&format!("{}/roles", self.path))
            .json(&json!({ "roles": roles }));
        self.client.send(builder)?;
        Ok(())
    }

    /// Revoke one role from the user.
    pub fn remove_role(&self, role: &str) -> AsterResult<()> {
        let path = format!("{}/roles/{}", self.path, escape_path(role));
        self.client.send(self.client.delete(&path))?;
        Ok(())
    }

    /// Permissions granted directly to the user.
    pub fn permissions(&self) -> AsterResult<Vec<Permission>> {
        let path = format!("/admin/permissions/user/{}", escape_path(&self.name));
        let mut payload: Value = self.client.send(self.client.get(&path))?.json()?;
        let permissions = payload
            .get_mut("permissions")
            .map(Value::take)
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(permissions)?)
    }

    /// Grant a permission to the user.
    pub fn add_permission(&self, permission: &Permission) -> AsterResult<()> {
        let path = format!("/admin/permissions/user/{}", escape_path(&self.name));
        self.client.send(self.client.put(&path).json(permission))?;
        Ok(())
    }

    /// Revoke a permission from the user.
    pub fn remove_permission(&self, permission: &Permission) -> AsterResult<()> {
        let path = format!("/admin/permissions/user/{}/delete", escape_path(&self.name));
        self.client.send(self.client.post(&path).json(permission))?;
        Ok(())
    }

    /// Permissions effective for the user, including role grants.
    pub fn effective_permissions(&self) -> AsterResult<Vec<Permission>> {
        let path = format!(
            "/admin/permissions/effective/user/{}",
            escape_path(&self.name)
        );
        let mut payload: Value = self.client.send(self.client.get(&path))?.json()?;
        let permissions = payload
            .get_mut("permissions")
            .map(Value::take)
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(permissions)?)
    }

    /// Delete the user, consuming the handle.
    pub fn delete(self) -> AsterResult<()> {
        self.client.send(self.client.delete(&self.path))?;
        Ok(())
    }
}

/// Handle to one role.
pub struct Role {
    name: String,
    path: String,
    client: HttpClient,
}

impl Role {
    fn attach(name: &str, client: &HttpClient) -> AsterResult<Role> {
        let role = Role {
            name: name.to_string(),
            path: format!("/admin/roles/{}", escape_path(name)),
            client: client.clone(),
        };
        role.client
            .send(role.client.get(&format!("{}/users", role.path)))?;
        Ok(role)
    }

    /// The role name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Users holding this role.
    pub fn users(&self) -> AsterResult<Vec<User>> {
        let payload: Value = self
            .client
            .send(self.client.get(&format!("{}/users", self.path)))?
            .json()?;
        string_list(&payload, "users")
            .iter()
            .map(|name| User::attach(name, &self.client))
            .collect()
    }

    /// Permissions granted to the role.
    pub fn permissions(&self) -> AsterResult<Vec<Permission>> {
        let path = format!("/admin/permissions/role/{}", escape_path(&self.name));
        let mut payload: Value = self.client.send(self.client.get(&path))?.json()?;
        let permissions = payload
            .get_mut("permissions")
            .map(Value::take)
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(permissions)?)
    }

    /// Grant a permission to the role.
    pub fn add_permission(&self, permission: &Permission) -> AsterResult<()> {
        let path = format!("/admin/permissions/role/{}", escape_path(&self.name));
        self.client.send(self.client.put(&path).json(permission))?;
        Ok(())
    }

    /// Revoke a permission from the role.
    pub fn remove_permission(&self, permission: &Permission) -> AsterResult<()> {
        let path = format!("/admin/permissions/role/{}/delete", escape_path(&self.name));
        self.client.send(self.client.post(&path).json(permission))?;
        Ok(())
    }

    /// Delete the role, consuming the handle. `force` deletes it even if
    /// it is still assigned.
    pub fn delete(self, force: bool) -> AsterResult<()> {
        let builder = self.client.delete(&self.path).query(&[("force", force)]);
        self.client.send(builder)?;
        Ok(())
    }
}

/// Handle to one virtual graph.
pub struct VirtualGraph {
    name: String,
    path: String,
    client: HttpClient,
}

impl VirtualGraph {
    fn attach(name: &str, client: &HttpClient) -> AsterResult<VirtualGraph> {
        let vg = VirtualGraph {
            name: name.to_string(),
            path: format!("/admin/virtual_graphs/{}", escape_path(name)),
            client: client.clone(),
        };
        vg.client.send(vg.client.get(&format!("{}/info", vg.path)))?;
        Ok(vg)
    }

    /// The virtual graph name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the virtual graph's definition. Fields left `None` keep
    /// their current server-side value.
    pub fn update(
        &mut self,
        name: &str,
        mappings: Option<&Mappings>,
        options: Option<&Value>,
        datasource: Option<&str>,
        db: Option<&str>,
    ) -> AsterResult<()> {
        let mappings_text = match mappings {
            Some(mappings) => mappings.read()?,
            None => String::new(),
        };
        let datasource = match datasource {
            Some(datasource) => datasource.to_string(),
            None => self.datasource_name()?,
        };
        let db = match db {
            Some(db) => db.to_string(),
            None => self.database()?,
        };

        let meta = json!({
            "name": name,
            "mappings": mappings_text,
            "options": options.cloned().unwrap_or_else(|| json!({})),
            "data_source": datasource,
            "db": db,
        });
        self.client.send(self.client.put(&self.path).json(&meta))?;
        self.name = name.to_string();
        self.path = format!("/admin/virtual_graphs/{}", escape_path(name));
        Ok(())
    }

    /// The virtual graph's options.
    pub fn options(&self) -> AsterResult<Value> {
        let mut payload: Value = self
            .client
            .send(self.client.get(&format!("{}/options", self.path)))?
            .json()?;
        Ok(payload
            .get_mut("options")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// The virtual graph's info block.
    pub fn info(&self) -> AsterResult<Value> {
        let mut payload: Value = self
            .client
            .send(self.client.get(&format!("{}/info", self.path)))?
            .json()?;
        Ok(payload
            .get_mut("info")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Name of the data source backing this virtual graph.
    pub fn datasource_name(&self) -> AsterResult<String> {
        let info = self.info()?;
        let datasource = info
            .get("data_source")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(datasource.trim_start_matches("data-source://").to_string())
    }

    /// Name of the database this virtual graph is associated with.
    pub fn database(&self) -> AsterResult<String> {
        let response = self
            .client
            .send(self.client.get(&format!("{}/database", self.path)))?;
        Ok(response.text()?)
    }

    /// The mappings in the requested syntax.
    pub fn mappings_string(&self, syntax: &str) -> AsterResult<Bytes> {
        let path = format!("{}/mappingsString/{}", self.path, escape_path(syntax));
        Ok(self.client.send(self.client.get(&path))?.bytes()?)
    }

    /// Whether the virtual graph is available.
    pub fn available(&self) -> AsterResult<bool> {
        let payload: Value = self
            .client
            .send(self.client.get(&format!("{}/available", self.path)))?
            .json()?;
        Ok(payload.as_bool().unwrap_or(false))
    }

    /// Delete the virtual graph, consuming the handle.
    pub fn delete(self) -> AsterResult<()> {
        self.client.send(self.client.delete(&self.path))?;
        Ok(())
    }
}

/// Handle to one data source.
pub struct DataSource {
    name: String,
    path: String,
    client: HttpClient,
}

impl DataSource {
    fn attach(name: &str, client: &HttpClient) -> AsterResult<DataSource> {
        let ds = DataSource {
            name: name.to_string(),
            path: format!("/admin/data_sources/{}", escape_path(name)),
            client: client.clone(),
        };
        ds.client.send(ds.client.get(&format!("{}/info", ds.path)))?;
        Ok(ds)
    }

    /// The data source name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the data source is available.
    pub fn available(&self) -> AsterResult<bool> {
        let payload: Value = self
            .client
            .send(self.client.get(&format!("{}/available", self.path)))?
            .json()?;
        Ok(payload.as_bool().unwrap_or(false))
    }

    /// Update the data source options. A data source in use is only
    /// updated when `force` is set.
    pub fn update(&self, options: &Value, force: bool) -> AsterResult<()> {
        let meta = json!({ "options": options, "force": force });
        self.client.send(self.client.put(&self.path).json(&meta))?;
        Ok(())
    }

    /// Bring the data source online.
    pub fn online(&self) -> AsterResult<()> {
        self.client
            .send(self.client.post(&format!("{}/online", self.path)))?;
        Ok(())
    }

    /// The data source's info block.
    pub fn info(&self) -> AsterResult<Value> {
        let mut payload: Value = self
            .client
            .send(self.client.get(&format!("{}/info", self.path)))?
            .json()?;
        Ok(payload
            .get_mut("info")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// The data source's options.
    pub fn options(&self) -> AsterResult<Value> {
        let mut payload: Value = self
            .client
            .send(self.client.get(&format!("{}/options", self.path)))?
            .json()?;
        Ok(payload
            .get_mut("options")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Refresh table row-count estimates, optionally for one table
    /// (`{"name": "schema.table"}`).
    pub fn refresh_counts(&self, meta: Option<&Value>) -> AsterResult<()> {
        let meta = meta.cloned().unwrap_or_else(|| json!({}));
        self.client.send(
            self.client
                .post(&format!("{}/refresh_counts", self.path))
                .json(&meta),
        )?;
        Ok(())
    }

    /// Clear saved metadata and reload dependent virtual graphs,
    /// optionally for one table.
    pub fn refresh_metadata(&self, meta: Option<&Value>) -> AsterResult<()> {
        let meta = meta.cloned().unwrap_or_else(|| json!({}));
        self.client.send(
            self.client
                .post(&format!("{}/refresh_metadata", self.path))
                .json(&meta),
        )?;
        Ok(())
    }

    /// Make a private data source available to other virtual graphs and
    /// decouple its life cycle from the originating one.
    pub fn share(&self) -> AsterResult<()> {
        self.client
            .send(self.client.post(&format!("{}/share", self.path)))?;
        Ok(())
    }

    /// Delete the data source, consuming the handle.
    pub fn delete(self) -> AsterResult<()> {
        self.client.send(self.client.delete(&self.path))?;
        Ok(())
    }
}
