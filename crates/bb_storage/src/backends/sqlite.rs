use async_trait::async_trait;
use bb_core::{Article, ArticleDraft, ArticleStorage, Error, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::{accept_draft, StorageBackend, StorageConfig};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL CHECK (length(title) > 0),
        content TEXT NOT NULL CHECK (length(content) > 0),
        date TEXT,
        category TEXT NOT NULL CHECK (category IN ('theory', 'practice', 'case_study')),
        level TEXT NOT NULL CHECK (level IN ('basic', 'intermediate', 'expert')),
        chapter TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_articles_chapter_level ON articles (chapter, level)",
    // Add future migrations here
];

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database directory should be writable"
    }

    async fn new(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(&config.db_path()).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(15));

        // One connection keeps writes strictly sequential.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn insert(&self, draft: &ArticleDraft) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO articles (url, title, content, date, category, level, chapter)
            VALUES (?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&draft.url)
        .bind(draft.bounded_title())
        .bind(&draft.content)
        .bind(draft.date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(draft.category.as_str())
        .bind(draft.level.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }
}

fn db_error(context: &str, e: sqlx::Error) -> Error {
    Error::Database(format!("{}: {}", context, e))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let get_str = |column: &str| -> Result<String> {
        row.try_get::<String, _>(column)
            .map_err(|e| db_error(&format!("Failed to read column {}", column), e))
    };

    let date = row
        .try_get::<Option<String>, _>("date")
        .map_err(|e| db_error("Failed to read column date", e))?
        .and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok());

    Ok(Article {
        url: get_str("url")?,
        title: get_str("title")?,
        content: get_str("content")?,
        date,
        category: get_str("category")?.parse()?,
        level: get_str("level")?.parse()?,
        chapter: row
            .try_get::<Option<String>, _>("chapter")
            .map_err(|e| db_error("Failed to read column chapter", e))?,
    })
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM articles WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to look up article", e))?;
        Ok(row.is_some())
    }

    async fn save(&self, draft: &ArticleDraft) -> bool {
        if !accept_draft(draft) {
            return false;
        }
        match self.insert(draft).await {
            Ok(()) => true,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::warn!("⚠️ Article already stored, skipping: {}", draft.url);
                false
            }
            Err(e) => {
                tracing::error!("❌ Failed to store article {}: {}", draft.url, e);
                false
            }
        }
    }

    async fn all(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read articles", e))?;
        rows.iter().map(row_to_article).collect()
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count articles", e))?;
        Ok(count as usize)
    }

    async fn set_chapter(&self, url: &str, chapter: Option<&str>) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET chapter = ? WHERE url = ?")
            .bind(chapter)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update chapter", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn for_chapter(&self, chapter: &str) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles WHERE chapter = ? ORDER BY id")
            .bind(chapter)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read chapter articles", e))?;
        rows.iter().map(row_to_article).collect()
    }
}
