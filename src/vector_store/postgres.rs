//! pgvector-backed store on a single tokio-postgres connection.
//!
//! The connection driver runs on a runtime owned by the store and every call
//! blocks on it, so callers see a plain synchronous API. Dropping the store
//! shuts the runtime down and closes the connection.

use pgvector::Vector;
use tokio::runtime::Runtime;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, info, warn};

use crate::error::{ensure_dimensions, RagError, Result};
use crate::metric::SearchMode;
use crate::vector_store::{check_dimensions, SearchResult, StoredDocument, TableName, VectorStore};

/// Connection parameters for the Postgres instance holding the vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Schema holding the vector table.
    pub schema: String,
    /// Vector table name.
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5433,
            database: "vectordb".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            schema: "public".to_string(),
            table: "documents".to_string(),
        }
    }
}

impl StoreConfig {
    fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

/// Vector store backed by a pgvector table.
pub struct PgVectorStore {
    runtime: Runtime,
    client: Client,
    table: TableName,
    dimensions: usize,
}

impl PgVectorStore {
    /// Opens the connection and prepares the table, keeping existing rows.
    ///
    /// Fails with [`RagError::DimensionMismatch`] when the table already
    /// exists with a different vector width; use [`PgVectorStore::connect_fresh`]
    /// to rebuild it.
    pub fn connect(config: &StoreConfig, dimensions: usize) -> Result<Self> {
        let store = Self::open(config, dimensions)?;
        store.ensure_extension()?;
        match store.existing_width()? {
            Some(width) => ensure_dimensions(width, dimensions)?,
            None => store.create_table()?,
        }
        info!(
            table = %store.table.qualified(),
            dimensions,
            "connected to vector store"
        );
        Ok(store)
    }

    /// Opens the connection and drops any existing table before re-creating it.
    pub fn connect_fresh(config: &StoreConfig, dimensions: usize) -> Result<Self> {
        let mut store = Self::open(config, dimensions)?;
        store.ensure_extension()?;
        store.reset(dimensions)?;
        Ok(store)
    }

    /// Table this store reads and writes.
    pub fn table(&self) -> &TableName {
        &self.table
    }

    fn open(config: &StoreConfig, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::invalid("vector dimensions must be positive"));
        }
        let table = TableName::new(config.schema.clone(), config.table.clone())?;
        let runtime = Runtime::new().map_err(RagError::io("failed to start tokio runtime"))?;
        let pg_config = config.pg_config();
        let target = format!("{}:{}/{}", config.host, config.port, config.database);
        let client = runtime.block_on(async {
            let (client, connection) = pg_config
                .connect(NoTls)
                .await
                .map_err(RagError::store(format!("failed to connect to Postgres at {target}")))?;
            tokio::spawn(async move {
                if let Err(err) = connection.await {
                    warn!("postgres connection error: {err}");
                }
            });
            Ok::<_, RagError>(client)
        })?;
        Ok(Self {
            runtime,
            client,
            table,
            dimensions,
        })
    }

    fn execute(&self, sql: &str, context: &str) -> Result<u64> {
        debug!(sql, "executing statement");
        self.runtime
            .block_on(self.client.execute(sql, &[]))
            .map_err(RagError::store(context))
    }

    fn ensure_extension(&self) -> Result<()> {
        self.execute(
            "CREATE EXTENSION IF NOT EXISTS vector",
            "failed to ensure pgvector extension",
        )?;
        Ok(())
    }

    fn create_table(&self) -> Result<()> {
        self.execute(
            &create_table_sql(&self.table, self.dimensions),
            "failed to create vector table",
        )?;
        Ok(())
    }

    /// Width of the `embedding` column, or `None` when the table is missing.
    fn existing_width(&self) -> Result<Option<usize>> {
        let row = self
            .runtime
            .block_on(self.client.query_opt(WIDTH_SQL, &[&self.table.qualified()]))
            .map_err(RagError::store("failed to inspect vector table"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let typmod: i32 = row
            .try_get(0)
            .map_err(RagError::store("failed to read vector width"))?;
        usize::try_from(typmod)
            .map(Some)
            .map_err(|_| RagError::Protocol(format!("embedding column has no fixed width ({typmod})")))
    }
}

impl VectorStore for PgVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn insert(&mut self, text: &str, embedding: &[f32]) -> Result<i64> {
        check_dimensions(self.dimensions, embedding)?;
        let sql = insert_sql(&self.table);
        let vector = Vector::from(embedding.to_vec());
        let row = self
            .runtime
            .block_on(self.client.query_one(&sql, &[&text, &vector]))
            .map_err(RagError::store("failed to insert document"))?;
        row.try_get("id")
            .map_err(RagError::store("failed to read inserted id"))
    }

    fn insert_many(&mut self, rows: &[(&str, &[f32])]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        for (_, embedding) in rows {
            check_dimensions(self.dimensions, embedding)?;
        }
        let sql = insert_sql(&self.table);
        let Self {
            runtime, client, ..
        } = self;
        runtime.block_on(async {
            let transaction = client
                .transaction()
                .await
                .map_err(RagError::store("failed to open insert transaction"))?;
            let statement = transaction
                .prepare(&sql)
                .await
                .map_err(RagError::store("failed to prepare insert"))?;
            for (idx, (text, embedding)) in rows.iter().enumerate() {
                let vector = Vector::from(embedding.to_vec());
                transaction
                    .execute(&statement, &[text, &vector])
                    .await
                    .map_err(RagError::store(format!("failed to insert chunk {idx}")))?;
            }
            transaction
                .commit()
                .await
                .map_err(RagError::store("failed to commit inserts"))
        })?;
        debug!(rows = rows.len(), "inserted batch");
        Ok(rows.len())
    }

    fn search(
        &self,
        embedding: &[f32],
        mode: SearchMode,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        check_dimensions(self.dimensions, embedding)?;
        let limit = i64::try_from(top_k)
            .map_err(|_| RagError::invalid(format!("top_k {top_k} exceeds i64 range")))?;
        let sql = search_sql(&self.table, mode);
        let vector = Vector::from(embedding.to_vec());
        let rows = self
            .runtime
            .block_on(self.client.query(&sql, &[&vector, &limit]))
            .map_err(RagError::store("similarity search failed"))?;
        rows.iter().map(result_from_row).collect()
    }

    fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table.qualified());
        let row = self
            .runtime
            .block_on(self.client.query_one(&sql, &[]))
            .map_err(RagError::store("failed to count documents"))?;
        let count: i64 = row
            .try_get(0)
            .map_err(RagError::store("failed to read document count"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn reset(&mut self, dimensions: usize) -> Result<()> {
        if dimensions == 0 {
            return Err(RagError::invalid("vector dimensions must be positive"));
        }
        self.execute(
            &format!("DROP TABLE IF EXISTS {}", self.table.qualified()),
            "failed to drop vector table",
        )?;
        self.dimensions = dimensions;
        self.create_table()?;
        info!(table = %self.table.qualified(), dimensions, "vector store reset");
        Ok(())
    }
}

const WIDTH_SQL: &str = "SELECT a.atttypmod \
    FROM pg_attribute a \
    WHERE a.attrelid = to_regclass($1::text)::oid \
      AND a.attname = 'embedding' \
      AND NOT a.attisdropped";

fn create_table_sql(table: &TableName, dims: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            text TEXT NOT NULL,
            embedding VECTOR({dims}) NOT NULL
        )",
        table.qualified()
    )
}

fn insert_sql(table: &TableName) -> String {
    format!(
        "INSERT INTO {} (text, embedding) VALUES ($1, $2) RETURNING id",
        table.qualified()
    )
}

fn search_sql(table: &TableName, mode: SearchMode) -> String {
    format!(
        "SELECT id, text, embedding, {score} AS score \
        FROM {table} \
        ORDER BY embedding {op} $1 ASC \
        LIMIT $2",
        score = mode.score_sql("embedding", "$1"),
        table = table.qualified(),
        op = mode.operator(),
    )
}

fn result_from_row(row: &Row) -> Result<SearchResult> {
    let id: i64 = row.try_get("id").map_err(RagError::store("failed to read id"))?;
    let text: String = row
        .try_get("text")
        .map_err(RagError::store("failed to read text"))?;
    let embedding: Vector = row
        .try_get("embedding")
        .map_err(RagError::store("failed to read embedding"))?;
    let score: f64 = row
        .try_get("score")
        .map_err(RagError::store("failed to read score"))?;
    Ok(SearchResult {
        document: StoredDocument {
            id,
            text,
            embedding: embedding.to_vec(),
        },
        score,
    })
}
