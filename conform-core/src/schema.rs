/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the full v1 schema.
///
/// - `users`, `projects`, `material_index_versions`: reference data.
/// - `runs`: one row per conformance run.
/// - `results`: one row per analysed item. Evidence, discrepancy, assignment
///   and history are stored as JSON text; `position` keeps report order.
/// - `comments`: per-item threads, ordered by `seq`.
/// - `reviewers`: run-level reviewer assignments.
///
/// All tables use `STRICT` mode for type enforcement.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id                TEXT    PRIMARY KEY,
        email             TEXT    NOT NULL UNIQUE,
        first_name        TEXT    NOT NULL,
        last_name         TEXT    NOT NULL,
        role              TEXT    NOT NULL CHECK(role IN ('admin', 'user')),
        status            TEXT    NOT NULL CHECK(status IN ('active', 'pending', 'inactive')),
        assigned_projects TEXT    NOT NULL DEFAULT '[]'
    ) STRICT;

    CREATE TABLE IF NOT EXISTS projects (
        id          TEXT    PRIMARY KEY,
        name        TEXT    NOT NULL,
        job_id      TEXT    NOT NULL,
        location    TEXT    NOT NULL,
        status      TEXT    NOT NULL
                            CHECK(status IN ('planning', 'active', 'on-hold', 'completed')),
        created_by  TEXT    NOT NULL,
        created_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS material_index_versions (
        id              TEXT    PRIMARY KEY,
        version_number  TEXT    NOT NULL,
        name            TEXT    NOT NULL,
        is_active       INTEGER NOT NULL DEFAULT 0,
        uploaded_by     TEXT    NOT NULL,
        uploaded_at     INTEGER NOT NULL,
        item_count      INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS runs (
        id                      TEXT    PRIMARY KEY,
        project_id              TEXT    NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        version                 INTEGER NOT NULL,
        status                  TEXT    NOT NULL
                                        CHECK(status IN
                                              ('uploading','processing','ready-for-review','completed')),
        material_index_version  TEXT    NOT NULL,
        created_by              TEXT    NOT NULL,
        created_at              INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS results (
        id              TEXT    NOT NULL,
        run_id          TEXT    NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
        position        INTEGER NOT NULL,
        overall_status  TEXT    NOT NULL
                                CHECK(overall_status IN
                                      ('pre-approved','review-required','action-mandatory')),
        body            TEXT    NOT NULL,
        updated_at      INTEGER NOT NULL,
        PRIMARY KEY (run_id, id)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS comments (
        seq         INTEGER PRIMARY KEY AUTOINCREMENT,
        id          TEXT    NOT NULL UNIQUE,
        run_id      TEXT    NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
        item_id     TEXT    NOT NULL,
        parent_id   TEXT    REFERENCES comments(id) ON DELETE CASCADE,
        body        TEXT    NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS reviewers (
        run_id       TEXT    NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
        user_id      TEXT    NOT NULL,
        name         TEXT    NOT NULL,
        assigned_at  INTEGER NOT NULL,
        position     INTEGER NOT NULL,
        PRIMARY KEY (run_id, user_id)
    ) STRICT;

    CREATE INDEX IF NOT EXISTS comments_by_item ON comments(run_id, item_id);
";

/// Runs forward-only schema migration to migrate the DB to the latest version.
///
/// Idempotent: safe to call on every startup. Creates `schema_version` if
/// missing, reads the current version (`0` when empty), and applies
/// `SCHEMA_V1_SQL` inside a `BEGIN IMMEDIATE` transaction when below 1.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
