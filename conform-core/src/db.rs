use std::time::Duration;

use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, ReviewError};
use crate::repository::{ProjectRepository, ResultRepository, UserRepository};
use crate::seed;
use crate::types::{
    ConformanceResult, ConformanceRun, ItemComment, MaterialIndexVersion, Project, Reviewer, User,
};

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all database connections.
/// It sets `busy_timeout` via the `Connection` method (not a PRAGMA string) to
/// ensure the setting takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    // WAL pragmas are connection-level and re-applied on every open.
    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    // Checkpoint any leftover WAL from a previous run.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

/// Text code of a unit enum as serde writes it, e.g. `"on-hold"`.
fn code<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(ReviewError::validation(format!("expected a text code, got {other}"))),
    }
}

fn from_code<T: DeserializeOwned>(code: String) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(code))?)
}

type UserRow = (String, String, String, String, String, String, String);
type ProjectRow = (String, String, String, String, String, String, i64);
type RunRow = (String, String, u32, String, String, String, i64);
type MaterialRow = (String, String, String, bool, String, i64, u32);

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, role, status, assigned_projects";
const RUN_COLUMNS: &str =
    "id, project_id, version, status, material_index_version, created_by, created_at";

fn user_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?, r.get(6)?))
}

fn run_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?, r.get(6)?))
}

fn user_from_row(row: UserRow) -> Result<User> {
    let (id, email, first_name, last_name, role, status, projects) = row;
    Ok(User {
        id,
        email,
        first_name,
        last_name,
        role: from_code(role)?,
        status: from_code(status)?,
        assigned_projects: serde_json::from_str(&projects)?,
    })
}

fn project_from_row(row: ProjectRow) -> Result<Project> {
    let (id, name, job_id, location, status, created_by, created_at) = row;
    Ok(Project { id, name, job_id, location, status: from_code(status)?, created_by, created_at })
}

fn run_from_row(row: RunRow) -> Result<ConformanceRun> {
    let (id, project_id, version, status, material_index_version, created_by, created_at) = row;
    Ok(ConformanceRun {
        id,
        project_id,
        version,
        status: from_code(status)?,
        material_index_version,
        created_by,
        created_at,
    })
}

/// Repository over a WAL-mode SQLite file.
///
/// Every write runs inside a `BEGIN IMMEDIATE` transaction. Structured fields
/// of results and comments are stored as JSON text and (de)serialized outside
/// the connection thread.
#[derive(Clone)]
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens the database at `path` through [`open_db`].
    pub async fn open(path: &str) -> Result<Self> {
        let conn = open_db(path).await?;
        info!(path, "database opened");
        Ok(Self { conn })
    }

    /// Loads the demonstration dataset when the database has no users yet.
    ///
    /// Returns `true` when seed rows were written.
    pub async fn seed_if_empty(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .call(|db| db.query_row("SELECT COUNT(*) FROM users", [], |r| r.get::<_, i64>(0)))
            .await?;
        if count > 0 {
            return Ok(false);
        }

        let mut users = Vec::new();
        for u in seed::demo_users() {
            let projects = serde_json::to_string(&u.assigned_projects)?;
            users.push((u.id, u.email, u.first_name, u.last_name, code(&u.role)?, code(&u.status)?, projects));
        }
        let mut projects = Vec::new();
        for p in seed::demo_projects() {
            let status = code(&p.status)?;
            projects.push((p.id, p.name, p.job_id, p.location, status, p.created_by, p.created_at));
        }
        let mut runs = Vec::new();
        for r in seed::demo_runs() {
            let status = code(&r.status)?;
            runs.push((r.id, r.project_id, r.version, status, r.material_index_version, r.created_by, r.created_at));
        }
        let indexes = seed::demo_material_indexes();
        let mut results = Vec::new();
        for (position, result) in seed::demo_results().into_iter().enumerate() {
            let status = code(&result.overall_status)?;
            results.push((result.id.clone(), position as i64, status, serde_json::to_string(&result)?));
        }
        let now = crate::now_secs();

        self.conn
            .call(move |db| {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                for u in &users {
                    tx.execute(
                        "INSERT INTO users (id, email, first_name, last_name, role, status, assigned_projects)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        rusqlite::params![u.0, u.1, u.2, u.3, u.4, u.5, u.6],
                    )?;
                }
                for p in &projects {
                    tx.execute(
                        "INSERT INTO projects (id, name, job_id, location, status, created_by, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        rusqlite::params![p.0, p.1, p.2, p.3, p.4, p.5, p.6],
                    )?;
                }
                for r in &runs {
                    tx.execute(
                        "INSERT INTO runs (id, project_id, version, status, material_index_version, created_by, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        rusqlite::params![r.0, r.1, r.2, r.3, r.4, r.5, r.6],
                    )?;
                }
                for m in &indexes {
                    tx.execute(
                        "INSERT INTO material_index_versions
                             (id, version_number, name, is_active, uploaded_by, uploaded_at, item_count)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        rusqlite::params![
                            m.id, m.version_number, m.name, m.is_active, m.uploaded_by, m.uploaded_at, m.item_count
                        ],
                    )?;
                }
                for (id, position, status, body) in &results {
                    tx.execute(
                        "INSERT INTO results (id, run_id, position, overall_status, body, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        rusqlite::params![id, seed::DEMO_RUN_ID, position, status, body, now],
                    )?;
                }
                tx.commit()?;
                Ok::<_, rusqlite::Error>(())
            })
            .await?;

        info!("seeded demonstration data");
        Ok(true)
    }
}

impl ResultRepository for SqliteRepository {
    async fn load_run(&self, run_id: &str) -> Result<(ConformanceRun, Vec<ConformanceResult>)> {
        let run_id = run_id.to_owned();
        let lookup = run_id.clone();
        let (run, bodies) = self
            .conn
            .call(move |db| {
                let run = db
                    .query_row(
                        &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
                        rusqlite::params![&lookup],
                        run_row,
                    )
                    .optional()?;
                let mut stmt =
                    db.prepare("SELECT body FROM results WHERE run_id = ?1 ORDER BY position")?;
                let bodies = stmt
                    .query_map(rusqlite::params![&lookup], |r| r.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, rusqlite::Error>((run, bodies))
            })
            .await?;

        let run = run_from_row(run.ok_or_else(|| ReviewError::not_found("run", run_id.as_str()))?)?;
        let results = bodies
            .iter()
            .map(|body| serde_json::from_str(body))
            .collect::<Result<Vec<ConformanceResult>, _>>()?;
        debug!(run_id = %run.id, results = results.len(), "run loaded");
        Ok((run, results))
    }

    async fn save_result(&self, run_id: &str, result: &ConformanceResult) -> Result<()> {
        let run_id = run_id.to_owned();
        let id = result.id.clone();
        let status = code(&result.overall_status)?;
        let body = serde_json::to_string(result)?;
        let now = crate::now_secs();

        let updated = self
            .conn
            .call(move |db| {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                let updated = tx.execute(
                    "UPDATE results SET overall_status = ?1, body = ?2, updated_at = ?3
                     WHERE run_id = ?4 AND id = ?5",
                    rusqlite::params![&status, &body, now, &run_id, &id],
                )?;
                tx.commit()?;
                Ok::<_, rusqlite::Error>(updated)
            })
            .await?;

        if updated == 0 {
            return Err(ReviewError::not_found("result", result.id.as_str()));
        }
        Ok(())
    }

    async fn load_comments(&self, run_id: &str) -> Result<Vec<(String, ItemComment)>> {
        let run_id = run_id.to_owned();
        let rows = self
            .conn
            .call(move |db| {
                let mut stmt = db.prepare(
                    "SELECT item_id, body FROM comments WHERE run_id = ?1 ORDER BY seq",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![&run_id], |r| {
                        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;

        rows.into_iter()
            .map(|(item_id, body)| -> Result<(String, ItemComment)> {
                Ok((item_id, serde_json::from_str(&body)?))
            })
            .collect()
    }

    async fn append_comment(&self, run_id: &str, item_id: &str, comment: &ItemComment) -> Result<()> {
        let run_id = run_id.to_owned();
        let item_id = item_id.to_owned();
        let id = comment.id.clone();
        let parent_id = comment.parent_id.clone();
        let body = serde_json::to_string(comment)?;

        self.conn
            .call(move |db| {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                tx.execute(
                    "INSERT INTO comments (id, run_id, item_id, parent_id, body)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![&id, &run_id, &item_id, &parent_id, &body],
                )?;
                tx.commit()?;
                Ok::<_, rusqlite::Error>(())
            })
            .await?;
        Ok(())
    }

    async fn load_reviewers(&self, run_id: &str) -> Result<Vec<Reviewer>> {
        let run_id = run_id.to_owned();
        let reviewers = self
            .conn
            .call(move |db| {
                let mut stmt = db.prepare(
                    "SELECT user_id, name, assigned_at FROM reviewers
                     WHERE run_id = ?1 ORDER BY position",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![&run_id], |r| {
                        Ok(Reviewer { id: r.get(0)?, name: r.get(1)?, assigned_at: r.get(2)? })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;
        Ok(reviewers)
    }

    async fn save_reviewers(&self, run_id: &str, reviewers: &[Reviewer]) -> Result<()> {
        let run_id = run_id.to_owned();
        let reviewers = reviewers.to_vec();

        self.conn
            .call(move |db| {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                tx.execute("DELETE FROM reviewers WHERE run_id = ?1", rusqlite::params![&run_id])?;
                for (position, r) in reviewers.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO reviewers (run_id, user_id, name, assigned_at, position)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        rusqlite::params![&run_id, &r.id, &r.name, r.assigned_at, position as i64],
                    )?;
                }
                tx.commit()?;
                Ok::<_, rusqlite::Error>(())
            })
            .await?;
        Ok(())
    }
}

impl UserRepository for SqliteRepository {
    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = self
            .conn
            .call(|db| {
                let mut stmt = db.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
                let rows = stmt.query_map([], user_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;
        rows.into_iter().map(user_from_row).collect()
    }

    async fn find_user(&self, id: &str) -> Result<User> {
        let lookup = id.to_owned();
        let row = self
            .conn
            .call(move |db| {
                db.query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    rusqlite::params![&lookup],
                    user_row,
                )
                .optional()
            })
            .await?;
        user_from_row(row.ok_or_else(|| ReviewError::not_found("user", id))?)
    }
}

impl ProjectRepository for SqliteRepository {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = self
            .conn
            .call(|db| {
                let mut stmt = db.prepare(
                    "SELECT id, name, job_id, location, status, created_by, created_at
                     FROM projects ORDER BY id",
                )?;
                let rows = stmt
                    .query_map([], |r| {
                        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?, r.get(6)?))
                    })?
                    .collect::<rusqlite::Result<Vec<ProjectRow>>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;
        rows.into_iter().map(project_from_row).collect()
    }

    async fn find_run(&self, id: &str) -> Result<ConformanceRun> {
        let lookup = id.to_owned();
        let row = self
            .conn
            .call(move |db| {
                db.query_row(
                    &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
                    rusqlite::params![&lookup],
                    run_row,
                )
                .optional()
            })
            .await?;
        run_from_row(row.ok_or_else(|| ReviewError::not_found("run", id))?)
    }

    async fn runs_for_project(&self, project_id: &str) -> Result<Vec<ConformanceRun>> {
        let lookup = project_id.to_owned();
        let (exists, rows) = self
            .conn
            .call(move |db| {
                let exists = db
                    .query_row("SELECT 1 FROM projects WHERE id = ?1", rusqlite::params![&lookup], |_| Ok(()))
                    .optional()?
                    .is_some();
                let mut stmt = db.prepare(&format!(
                    "SELECT {RUN_COLUMNS} FROM runs WHERE project_id = ?1 ORDER BY version"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![&lookup], run_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, rusqlite::Error>((exists, rows))
            })
            .await?;
        if !exists {
            return Err(ReviewError::not_found("project", project_id));
        }
        rows.into_iter().map(run_from_row).collect()
    }

    async fn material_index_versions(&self) -> Result<Vec<MaterialIndexVersion>> {
        let rows = self
            .conn
            .call(|db| {
                let mut stmt = db.prepare(
                    "SELECT id, version_number, name, is_active, uploaded_by, uploaded_at, item_count
                     FROM material_index_versions ORDER BY uploaded_at DESC",
                )?;
                let rows = stmt
                    .query_map([], |r| {
                        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?, r.get(6)?))
                    })?
                    .collect::<rusqlite::Result<Vec<MaterialRow>>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, version_number, name, is_active, uploaded_by, uploaded_at, item_count)| {
                MaterialIndexVersion { id, version_number, name, is_active, uploaded_by, uploaded_at, item_count }
            })
            .collect())
    }
}
