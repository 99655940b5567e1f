//! SQLite-backed transcript store

use crate::db::models::{assemble_transcript, CourseRow, TermRow};
use crate::db::store::TranscriptStore;
use crate::models::{Course, CourseId, TermId, Transcript};
use crate::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

/// [`TranscriptStore`] over the `terms` and `courses` tables
#[derive(Debug, Clone)]
pub struct SqliteTranscriptStore {
    pool: SqlitePool,
}

impl SqliteTranscriptStore {
    /// Wrap a pool whose schema was created by [`crate::db::init_database`]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn term_row(row: &SqliteRow) -> Result<TermRow> {
    Ok(TermRow { id: row.try_get("id")?, name: row.try_get("name")? })
}

fn course_row(row: &SqliteRow) -> Result<CourseRow> {
    Ok(CourseRow {
        id: row.try_get("id")?,
        term_id: row.try_get("term_id")?,
        course_code: row.try_get("course_code")?,
        course_name: row.try_get("course_name")?,
        attempted: row.try_get("attempted")?,
        earned: row.try_get("earned")?,
        points: row.try_get("points")?,
        grade: row.try_get("grade")?,
    })
}

async fn insert_term_tx(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<TermId> {
    let result = sqlx::query("INSERT INTO terms (name) VALUES (?)")
        .bind(name)
        .execute(&mut **tx)
        .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_course_tx(
    tx: &mut Transaction<'_, Sqlite>,
    course: &Course,
    term_id: TermId,
) -> Result<CourseId> {
    let row = CourseRow::from_course(course, term_id);
    let result = sqlx::query(
        r#"
        INSERT INTO courses (term_id, course_code, course_name, attempted, earned, points, grade)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.term_id)
    .bind(&row.course_code)
    .bind(&row.course_name)
    .bind(row.attempted)
    .bind(row.earned)
    .bind(row.points)
    .bind(&row.grade)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

#[async_trait]
impl TranscriptStore for SqliteTranscriptStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn insert_term(&self, name: &str) -> Result<TermId> {
        let mut tx = self.pool.begin().await?;
        let id = insert_term_tx(&mut tx, name).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn insert_course(&self, course: &Course, term_id: TermId) -> Result<CourseId> {
        let mut tx = self.pool.begin().await?;
        let id = insert_course_tx(&mut tx, course, term_id).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE courses
            SET course_code = ?, course_name = ?, attempted = ?, earned = ?, points = ?, grade = ?
            WHERE id = ?
            "#,
        )
        .bind(&course.course_code)
        .bind(&course.course_name)
        .bind(i64::from(course.attempted))
        .bind(i64::from(course.earned))
        .bind(course.points)
        .bind(&course.grade)
        .bind(course.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_term(&self, term_id: TermId, name: &str) -> Result<()> {
        sqlx::query("UPDATE terms SET name = ? WHERE id = ?")
            .bind(name)
            .bind(term_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_course(&self, course_id: CourseId) -> Result<()> {
        sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(course_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_term(&self, term_id: TermId) -> Result<()> {
        sqlx::query("DELETE FROM terms WHERE id = ?")
            .bind(term_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        // Courses go with their terms
        sqlx::query("DELETE FROM terms").execute(&self.pool).await?;
        Ok(())
    }

    async fn load_transcript(&self) -> Result<Transcript> {
        // Both reads share one snapshot so a concurrent write_transcript is
        // seen entirely or not at all
        let mut tx = self.pool.begin().await?;

        let terms = sqlx::query("SELECT id, name FROM terms ORDER BY id")
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(term_row)
            .collect::<Result<Vec<_>>>()?;

        let courses = sqlx::query(
            r#"
            SELECT id, term_id, course_code, course_name, attempted, earned, points, grade
            FROM courses
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(course_row)
        .collect::<Result<Vec<_>>>()?;

        tx.commit().await?;

        Ok(assemble_transcript(&terms, &courses))
    }

    async fn write_transcript(&self, transcript: &Transcript) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM terms").execute(&mut *tx).await?;

        for term in &transcript.terms {
            let term_id = insert_term_tx(&mut tx, &term.name).await?;
            for course in &term.courses {
                insert_course_tx(&mut tx, course, term_id).await?;
            }
        }

        tx.commit().await?;

        debug!(
            terms = transcript.terms.len(),
            courses = transcript.course_count(),
            "Wrote transcript"
        );
        Ok(())
    }
}
