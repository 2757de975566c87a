use anyhow::{anyhow, Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Row, Transaction};

use crate::model::{
    Conflict, ConflictType, Endpoint, EndpointSpec, EndpointStatus, Header, HttpMethod, Id,
    Parameter, ParamType, Project, Severity, Side, StatusCodeDef,
};
use crate::store::traits::{EndpointStore, ProjectStore};

/// Schema DDL applied at startup. Ownership is expressed as foreign keys with
/// ON DELETE CASCADE: endpoints -> specs -> {parameters, headers, status
/// codes}; endpoints -> conflicts.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        is_public BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS endpoints (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        path TEXT NOT NULL,
        method TEXT NOT NULL,
        name TEXT,
        description TEXT,
        status TEXT NOT NULL,
        version BIGINT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS endpoint_specs (
        id TEXT PRIMARY KEY,
        endpoint_id TEXT NOT NULL REFERENCES endpoints(id) ON DELETE CASCADE,
        spec_type TEXT NOT NULL,
        request_body JSONB,
        response_body JSONB,
        content_type TEXT,
        authentication TEXT,
        rate_limit TEXT,
        notes TEXT,
        UNIQUE (endpoint_id, spec_type)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS spec_parameters (
        id TEXT PRIMARY KEY,
        spec_id TEXT NOT NULL REFERENCES endpoint_specs(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        param_type TEXT NOT NULL,
        required BOOLEAN NOT NULL DEFAULT FALSE,
        description TEXT,
        default_value TEXT,
        validation JSONB
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS spec_headers (
        id TEXT PRIMARY KEY,
        spec_id TEXT NOT NULL REFERENCES endpoint_specs(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        value TEXT,
        required BOOLEAN NOT NULL DEFAULT FALSE,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS spec_status_codes (
        id TEXT PRIMARY KEY,
        spec_id TEXT NOT NULL REFERENCES endpoint_specs(id) ON DELETE CASCADE,
        code INTEGER NOT NULL,
        description TEXT,
        response_body JSONB
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS conflicts (
        id TEXT PRIMARY KEY,
        endpoint_id TEXT NOT NULL REFERENCES endpoints(id) ON DELETE CASCADE,
        conflict_type TEXT NOT NULL,
        field TEXT NOT NULL,
        frontend_value TEXT,
        backend_value TEXT,
        severity TEXT NOT NULL,
        resolved BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_endpoints_project ON endpoints(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_specs_endpoint ON endpoint_specs(endpoint_id)",
    "CREATE INDEX IF NOT EXISTS idx_conflicts_endpoint ON conflicts(endpoint_id)",
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Apply the schema DDL. Idempotent.
    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run schema migration")?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_spec(&self, row: &sqlx::postgres::PgRow) -> Result<EndpointSpec> {
        let spec_id: Id = row.get("id");

        let parameter_rows = sqlx::query(
            "SELECT id, name, param_type, required, description, default_value, validation
             FROM spec_parameters WHERE spec_id = $1 ORDER BY name",
        )
        .bind(&spec_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch spec parameters")?;

        let parameters = parameter_rows
            .into_iter()
            .map(|r| {
                let param_type: String = r.get("param_type");
                Ok(Parameter {
                    id: r.get("id"),
                    name: r.get("name"),
                    param_type: ParamType::parse(&param_type)
                        .ok_or_else(|| anyhow!("unknown parameter type '{}'", param_type))?,
                    required: r.get("required"),
                    description: r.get("description"),
                    default_value: r.get("default_value"),
                    validation: r.get("validation"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let header_rows = sqlx::query(
            "SELECT id, name, value, required, description
             FROM spec_headers WHERE spec_id = $1 ORDER BY name",
        )
        .bind(&spec_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch spec headers")?;

        let headers = header_rows
            .into_iter()
            .map(|r| Header {
                id: r.get("id"),
                name: r.get("name"),
                value: r.get("value"),
                required: r.get("required"),
                description: r.get("description"),
            })
            .collect();

        let code_rows = sqlx::query(
            "SELECT id, code, description, response_body
             FROM spec_status_codes WHERE spec_id = $1 ORDER BY code",
        )
        .bind(&spec_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch spec status codes")?;

        let status_codes = code_rows
            .into_iter()
            .map(|r| {
                let code: i32 = r.get("code");
                StatusCodeDef {
                    id: r.get("id"),
                    code: code as u16,
                    description: r.get("description"),
                    response_body: r.get("response_body"),
                }
            })
            .collect();

        Ok(EndpointSpec {
            id: spec_id,
            request_body: row.get("request_body"),
            response_body: row.get("response_body"),
            parameters,
            headers,
            status_codes,
            content_type: row.get("content_type"),
            authentication: row.get("authentication"),
            rate_limit: row.get("rate_limit"),
            notes: row.get("notes"),
        })
    }

    async fn assemble_endpoint(&self, row: sqlx::postgres::PgRow) -> Result<Endpoint> {
        let id: Id = row.get("id");

        let method: String = row.get("method");
        let status: String = row.get("status");

        let spec_rows = sqlx::query(
            "SELECT id, spec_type, request_body, response_body, content_type, authentication, rate_limit, notes
             FROM endpoint_specs WHERE endpoint_id = $1",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch endpoint specs")?;

        let mut frontend_spec = None;
        let mut backend_spec = None;
        for spec_row in &spec_rows {
            let spec_type: String = spec_row.get("spec_type");
            let spec = self.load_spec(spec_row).await?;
            match Side::parse(&spec_type) {
                Some(Side::Frontend) => frontend_spec = Some(spec),
                Some(Side::Backend) => backend_spec = Some(spec),
                None => return Err(anyhow!("unknown spec side '{}'", spec_type)),
            }
        }

        let conflict_rows = sqlx::query(
            "SELECT id, conflict_type, field, frontend_value, backend_value, severity, resolved
             FROM conflicts WHERE endpoint_id = $1 ORDER BY field",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch conflicts")?;

        let conflicts = conflict_rows
            .into_iter()
            .map(|r| {
                let conflict_type: String = r.get("conflict_type");
                let severity: String = r.get("severity");
                Ok(Conflict {
                    id: r.get("id"),
                    conflict_type: ConflictType::parse(&conflict_type)
                        .ok_or_else(|| anyhow!("unknown conflict type '{}'", conflict_type))?,
                    field: r.get("field"),
                    frontend_value: r.get("frontend_value"),
                    backend_value: r.get("backend_value"),
                    severity: Severity::parse(&severity)
                        .ok_or_else(|| anyhow!("unknown severity '{}'", severity))?,
                    resolved: r.get("resolved"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Endpoint {
            id,
            project_id: row.get("project_id"),
            path: row.get("path"),
            method: HttpMethod::parse(&method)
                .ok_or_else(|| anyhow!("unknown HTTP method '{}'", method))?,
            name: row.get("name"),
            description: row.get("description"),
            status: EndpointStatus::parse(&status)
                .ok_or_else(|| anyhow!("unknown endpoint status '{}'", status))?,
            frontend_spec,
            backend_spec,
            conflicts,
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

async fn insert_spec_tx(
    tx: &mut Transaction<'_, Postgres>,
    endpoint_id: &Id,
    side: Side,
    spec: &EndpointSpec,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO endpoint_specs (id, endpoint_id, spec_type, request_body, response_body, content_type, authentication, rate_limit, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(&spec.id)
    .bind(endpoint_id)
    .bind(side.as_str())
    .bind(&spec.request_body)
    .bind(&spec.response_body)
    .bind(&spec.content_type)
    .bind(&spec.authentication)
    .bind(&spec.rate_limit)
    .bind(&spec.notes)
    .execute(&mut **tx)
    .await
    .context("Failed to insert spec")?;

    for param in &spec.parameters {
        sqlx::query(
            "INSERT INTO spec_parameters (id, spec_id, name, param_type, required, description, default_value, validation)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&param.id)
        .bind(&spec.id)
        .bind(&param.name)
        .bind(param.param_type.as_str())
        .bind(param.required)
        .bind(&param.description)
        .bind(&param.default_value)
        .bind(&param.validation)
        .execute(&mut **tx)
        .await
        .context("Failed to insert parameter")?;
    }

    for header in &spec.headers {
        sqlx::query(
            "INSERT INTO spec_headers (id, spec_id, name, value, required, description)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&header.id)
        .bind(&spec.id)
        .bind(&header.name)
        .bind(&header.value)
        .bind(header.required)
        .bind(&header.description)
        .execute(&mut **tx)
        .await
        .context("Failed to insert header")?;
    }

    for status_code in &spec.status_codes {
        sqlx::query(
            "INSERT INTO spec_status_codes (id, spec_id, code, description, response_body)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&status_code.id)
        .bind(&spec.id)
        .bind(status_code.code as i32)
        .bind(&status_code.description)
        .bind(&status_code.response_body)
        .execute(&mut **tx)
        .await
        .context("Failed to insert status code")?;
    }

    Ok(())
}

async fn insert_children_tx(tx: &mut Transaction<'_, Postgres>, endpoint: &Endpoint) -> Result<()> {
    if let Some(spec) = &endpoint.frontend_spec {
        insert_spec_tx(tx, &endpoint.id, Side::Frontend, spec).await?;
    }
    if let Some(spec) = &endpoint.backend_spec {
        insert_spec_tx(tx, &endpoint.id, Side::Backend, spec).await?;
    }

    for conflict in &endpoint.conflicts {
        sqlx::query(
            "INSERT INTO conflicts (id, endpoint_id, conflict_type, field, frontend_value, backend_value, severity, resolved)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&conflict.id)
        .bind(&endpoint.id)
        .bind(conflict.conflict_type.as_str())
        .bind(&conflict.field)
        .bind(&conflict.frontend_value)
        .bind(&conflict.backend_value)
        .bind(conflict.severity.as_str())
        .bind(conflict.resolved)
        .execute(&mut **tx)
        .await
        .context("Failed to insert conflict")?;
    }

    Ok(())
}

#[async_trait::async_trait]
impl ProjectStore for PostgresStore {
    async fn get_project(&self, id: &Id) -> Result<Option<Project>> {
        let row = sqlx::query(
            "SELECT id, name, description, is_public, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch project")?;

        Ok(row.map(|row| Project {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            is_public: row.get("is_public"),
            created_at: row.get("created_at"),
        }))
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let row = sqlx::query(
            "SELECT id, name, description, is_public, created_at FROM projects WHERE name = $1 LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find project by name")?;

        Ok(row.map(|row| Project {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            is_public: row.get("is_public"),
            created_at: row.get("created_at"),
        }))
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query(
            "SELECT id, name, description, is_public, created_at FROM projects ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list projects")?;

        Ok(rows
            .into_iter()
            .map(|row| Project {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                is_public: row.get("is_public"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn upsert_project(&self, project: Project) -> Result<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, description, is_public, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 is_public = EXCLUDED.is_public",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.is_public)
        .bind(&project.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert project")?;

        Ok(())
    }

    async fn delete_project(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl EndpointStore for PostgresStore {
    async fn get_endpoint(&self, id: &Id) -> Result<Option<Endpoint>> {
        let row = sqlx::query(
            "SELECT id, project_id, path, method, name, description, status, version, created_at, updated_at
             FROM endpoints WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch endpoint")?;

        match row {
            Some(row) => Ok(Some(self.assemble_endpoint(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_endpoints(&self, project_id: Option<&Id>) -> Result<Vec<Endpoint>> {
        let rows = match project_id {
            Some(pid) => sqlx::query(
                "SELECT id, project_id, path, method, name, description, status, version, created_at, updated_at
                 FROM endpoints WHERE project_id = $1 ORDER BY created_at, id",
            )
            .bind(pid)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list endpoints for project")?,
            None => sqlx::query(
                "SELECT id, project_id, path, method, name, description, status, version, created_at, updated_at
                 FROM endpoints ORDER BY created_at, id",
            )
            .fetch_all(&self.pool)
            .await
            .context("Failed to list endpoints")?,
        };

        let mut endpoints = Vec::with_capacity(rows.len());
        for row in rows {
            endpoints.push(self.assemble_endpoint(row).await?);
        }
        Ok(endpoints)
    }

    async fn insert_endpoint(&self, endpoint: &Endpoint) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            "INSERT INTO endpoints (id, project_id, path, method, name, description, status, version, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&endpoint.id)
        .bind(&endpoint.project_id)
        .bind(&endpoint.path)
        .bind(endpoint.method.as_str())
        .bind(&endpoint.name)
        .bind(&endpoint.description)
        .bind(endpoint.status.as_str())
        .bind(endpoint.version)
        .bind(&endpoint.created_at)
        .bind(&endpoint.updated_at)
        .execute(&mut *tx)
        .await
        .context("Failed to insert endpoint")?;

        insert_children_tx(&mut tx, endpoint).await?;
        tx.commit().await.context("Failed to commit endpoint insert")?;
        Ok(())
    }

    async fn save_endpoint(&self, endpoint: &Endpoint) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // Compare-and-swap on the version the caller read; rewriting specs
        // and conflicts in the same transaction keeps the derived status
        // consistent with the persisted specs.
        let result = sqlx::query(
            "UPDATE endpoints
             SET path = $2, method = $3, name = $4, description = $5, status = $6,
                 version = version + 1, updated_at = $7
             WHERE id = $1 AND version = $8",
        )
        .bind(&endpoint.id)
        .bind(&endpoint.path)
        .bind(endpoint.method.as_str())
        .bind(&endpoint.name)
        .bind(&endpoint.description)
        .bind(endpoint.status.as_str())
        .bind(&endpoint.updated_at)
        .bind(endpoint.version)
        .execute(&mut *tx)
        .await
        .context("Failed to update endpoint")?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Ok(false);
        }

        sqlx::query("DELETE FROM endpoint_specs WHERE endpoint_id = $1")
            .bind(&endpoint.id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear specs")?;
        sqlx::query("DELETE FROM conflicts WHERE endpoint_id = $1")
            .bind(&endpoint.id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear conflicts")?;

        insert_children_tx(&mut tx, endpoint).await?;
        tx.commit().await.context("Failed to commit endpoint save")?;
        Ok(true)
    }

    async fn delete_endpoint(&self, id: &Id) -> Result<bool> {
        // FK cascades remove specs, parameters, headers, status codes, and
        // conflicts with the endpoint row.
        let result = sqlx::query("DELETE FROM endpoints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete endpoint")?;

        Ok(result.rows_affected() > 0)
    }
}
