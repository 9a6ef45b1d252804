use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{project, Participant, Project};

/// Outcome of a single insert attempt.
#[derive(Debug)]
pub enum InsertError {
    /// Another project already holds the generated id.
    IdCollision,
    Database(sqlx::Error),
}

impl From<sqlx::Error> for InsertError {
    fn from(err: sqlx::Error) -> Self {
        InsertError::Database(err)
    }
}

/// One raw insert attempt with a caller-supplied id.
///
/// Split from [`create`] so the collision retry policy can be exercised
/// against a store that collides on demand. `PgPool` is the production
/// implementation.
#[async_trait]
pub trait ProjectInsert: Send + Sync {
    async fn insert(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Project, InsertError>;
}

#[async_trait]
impl ProjectInsert for PgPool {
    /// Inserts the project row and the owner's membership row in one
    /// transaction; a failed attempt leaves no partial row behind.
    async fn insert(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Project, InsertError> {
        let mut tx = self.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (id, name, description, owner_id)
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                InsertError::IdCollision
            }
            _ => InsertError::Database(e),
        })?;

        sqlx::query("INSERT INTO project_participants (project_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(project)
    }
}

/// Create a project under a freshly generated random id.
///
/// Random ids can collide with an existing row; on a collision the id is
/// regenerated and the insert retried exactly once, two attempts total,
/// never a loop. `Ok(None)` means both attempts collided and nothing was
/// created.
pub async fn create<S: ProjectInsert + ?Sized>(
    store: &S,
    name: &str,
    description: Option<&str>,
    owner_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    for _ in 0..2 {
        let id = project::generate_id();
        match store.insert(&id, name, description, owner_id).await {
            Ok(created) => return Ok(Some(created)),
            Err(InsertError::IdCollision) => continue,
            Err(InsertError::Database(e)) => return Err(e),
        }
    }

    Ok(None)
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_owned(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_participating(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT p.* FROM projects p
         JOIN project_participants pp ON pp.project_id = p.id
         WHERE pp.user_id = $1
         ORDER BY p.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Everything the user can access: owned plus participating.
pub async fn list_accessible(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE owner_id = $1
         UNION
         SELECT p.* FROM projects p
         JOIN project_participants pp ON pp.project_id = p.id
         WHERE pp.user_id = $1
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn participants(pool: &PgPool, project_id: &str) -> Result<Vec<Participant>, sqlx::Error> {
    sqlx::query_as::<_, Participant>(
        "SELECT u.id, u.username FROM users u
         JOIN project_participants pp ON pp.user_id = u.id
         WHERE pp.project_id = $1
         ORDER BY pp.added_at",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Idempotent: adding an existing participant is a no-op.
pub async fn add_participant(
    pool: &PgPool,
    project_id: &str,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO project_participants (project_id, user_id)
         VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(project_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}
