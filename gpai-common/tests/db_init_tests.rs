//! Tests for database initialization and the SQLite transcript store

use gpai_common::db::{init_database, SqliteTranscriptStore, TranscriptStore};
use gpai_common::models::{Course, Term, Transcript};
use gpai_common::parser;

const FIXTURE: &str = "\
Beginning of Undergraduate Record
2021 Fall Term
CSC 101   Introduction to Programming     3.000   3.000   A-    9.000
MATH 225  Calculus II                     4.000   4.000   B+   12.000
2022 Spring Term
CSC 216   Software Development            3.000   3.000   A     9.000
ENG 102   Composition and Rhetoric        3.000   3.000   B     9.000
";

async fn open_store(dir: &tempfile::TempDir) -> SqliteTranscriptStore {
    let pool = init_database(&dir.path().join("nested").join("gpai.db")).await.unwrap();
    SqliteTranscriptStore::new(pool)
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("gpai.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("gpai.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool2.unwrap())
        .await
        .unwrap();
    assert_eq!(versions, 1);
}

#[tokio::test]
async fn test_empty_database_loads_empty_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    assert_eq!(store.load_transcript().await.unwrap(), Transcript::default());
}

#[tokio::test]
async fn test_write_transcript_round_trips_parsed_text() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let parsed = parser::parse(FIXTURE);

    store.write_transcript(&parsed).await.unwrap();
    let loaded = store.load_transcript().await.unwrap();

    assert!(loaded.same_content(&parsed));
    assert!(loaded.terms.iter().all(|t| t.id > 0));
    assert!(loaded.courses().all(|c| c.id > 0));
    assert_eq!(loaded.total_credits(), 13);
}

#[tokio::test]
async fn test_write_transcript_replaces_everything() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    store.write_transcript(&parser::parse(FIXTURE)).await.unwrap();

    let replacement = Transcript::new(vec![Term::new(
        "2023 Fall Term",
        vec![Course::new("ST 311", "Statistics", 3, "B")],
    )]);
    store.write_transcript(&replacement).await.unwrap();

    let loaded = store.load_transcript().await.unwrap();
    assert!(loaded.same_content(&replacement));

    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(orphaned, 1);
}

#[tokio::test]
async fn test_course_crud() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let term_id = store.insert_term("2021 Fall Term").await.unwrap();
    let course_id = store
        .insert_course(&Course::new("CSC 101", "Intro", 3, "B"), term_id)
        .await
        .unwrap();

    let mut course = store.load_transcript().await.unwrap().terms[0].courses[0].clone();
    assert_eq!(course.id, course_id);
    course = course.with_grade("A");
    store.update_course(&course).await.unwrap();
    store.update_term(term_id, "2021 Fall Semester Term").await.unwrap();

    let loaded = store.load_transcript().await.unwrap();
    assert_eq!(loaded.terms[0].name, "2021 Fall Semester Term");
    assert_eq!(loaded.terms[0].courses[0], course);

    store.delete_course(course_id).await.unwrap();
    let loaded = store.load_transcript().await.unwrap();
    assert_eq!(loaded.terms.len(), 1);
    assert!(loaded.terms[0].courses.is_empty());
}

#[tokio::test]
async fn test_delete_term_cascades_to_courses() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    store.write_transcript(&parser::parse(FIXTURE)).await.unwrap();
    let first = store.load_transcript().await.unwrap().terms[0].id;

    store.delete_term(first).await.unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 2);
    assert_eq!(store.load_transcript().await.unwrap().terms.len(), 1);
}

#[tokio::test]
async fn test_insert_course_requires_existing_term() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let result = store.insert_course(&Course::new("CSC 101", "Intro", 3, "A"), 999).await;
    assert!(matches!(result, Err(gpai_common::Error::Database(_))));
}

#[tokio::test]
async fn test_truncate() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    store.write_transcript(&parser::parse(FIXTURE)).await.unwrap();
    store.truncate().await.unwrap();
    assert!(store.load_transcript().await.unwrap().is_empty());
}

fn numbered_transcript(terms: usize, grade: &str) -> Transcript {
    Transcript::new(
        (0..terms)
            .map(|i| {
                Term::new(
                    format!("{} Fall Term", 2000 + i),
                    vec![
                        Course::new(format!("CSC {}", 100 + i), "Programming", 3, grade),
                        Course::new(format!("MATH {}", 100 + i), "Calculus", 4, grade),
                    ],
                )
            })
            .collect(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_load_never_sees_partial_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(open_store(&dir).await);
    let first = numbered_transcript(40, "A");
    let second = numbered_transcript(25, "B");
    store.write_transcript(&first).await.unwrap();

    let writer = {
        let store = store.clone();
        let (first, second) = (first.clone(), second.clone());
        tokio::spawn(async move {
            for i in 0..150 {
                let next = if i % 2 == 0 { &second } else { &first };
                store.write_transcript(next).await.unwrap();
            }
        })
    };

    let mut reads = 0;
    loop {
        let finished = writer.is_finished();
        let loaded = store.load_transcript().await.unwrap();
        assert!(
            loaded.same_content(&first) || loaded.same_content(&second),
            "read mixed state: terms={} courses={}",
            loaded.terms.len(),
            loaded.course_count()
        );
        reads += 1;
        if finished {
            break;
        }
    }
    writer.await.unwrap();
    assert!(reads > 0);
}
