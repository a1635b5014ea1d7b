use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{connection, parse_set, parse_text, to_count, to_texts, SharedTransaction};
use crate::domain::project::{Project, ProjectRole};
use crate::domain::repositories::{ProjectRepository, RepositoryError, RepositoryResult};
use crate::domain::tech_profile::{TechProfile, Technology};
use crate::infrastructure::reconcile::diff;

const SELECT_PROJECT: &str = r#"
    SELECT id, name, team_id, status, description, logo, url, created_at
    FROM projects
"#;

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    team_id: Uuid,
    status: String,
    description: String,
    logo: Option<String>,
    url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    project_id: Uuid,
    user_id: Uuid,
    roles: Vec<String>,
}

#[derive(sqlx::FromRow)]
struct TechnologyRow {
    project_id: Uuid,
    technology: String,
}

type ParticipantMap = BTreeMap<Uuid, BTreeSet<ProjectRole>>;

/// PostgreSQL implementation of ProjectRepository
///
/// Child rows live in `project_participants` and `project_technologies`.
pub struct PostgresProjectRepository {
    tx: SharedTransaction,
}

impl PostgresProjectRepository {
    pub(super) fn new(tx: SharedTransaction) -> Self {
        Self { tx }
    }
}

async fn load_participants(
    conn: &mut PgConnection,
    project_ids: &[Uuid],
) -> RepositoryResult<BTreeMap<Uuid, ParticipantMap>> {
    let rows = sqlx::query_as::<_, ParticipantRow>(
        "SELECT project_id, user_id, roles FROM project_participants WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: BTreeMap<Uuid, ParticipantMap> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.project_id)
            .or_default()
            .insert(row.user_id, parse_set(row.roles)?);
    }
    Ok(grouped)
}

async fn load_technologies(
    conn: &mut PgConnection,
    project_ids: &[Uuid],
) -> RepositoryResult<BTreeMap<Uuid, BTreeSet<Technology>>> {
    let rows = sqlx::query_as::<_, TechnologyRow>(
        "SELECT project_id, technology FROM project_technologies WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: BTreeMap<Uuid, BTreeSet<Technology>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.project_id)
            .or_default()
            .insert(parse_text(&row.technology)?);
    }
    Ok(grouped)
}

async fn assemble(conn: &mut PgConnection, rows: Vec<ProjectRow>) -> RepositoryResult<Vec<Project>> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut participants = load_participants(&mut *conn, &ids).await?;
    let mut technologies = load_technologies(conn, &ids).await?;

    rows.into_iter()
        .map(|row| {
            Ok(Project::from_persistence(
                row.id,
                row.name,
                row.team_id,
                parse_text(&row.status)?,
                TechProfile::from_persistence(
                    row.description,
                    technologies.remove(&row.id).unwrap_or_default(),
                ),
                row.logo,
                row.url,
                participants.remove(&row.id).unwrap_or_default(),
                row.created_at,
            ))
        })
        .collect()
}

/// Reconciles participant and technology rows against the aggregate
async fn sync_children(conn: &mut PgConnection, project: &Project) -> RepositoryResult<()> {
    let id = project.id();

    let stored = load_participants(&mut *conn, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    let changes = diff(&stored, &project.roster().role_map());
    for (user_id, roles) in changes.inserted {
        sqlx::query(
            "INSERT INTO project_participants (project_id, user_id, roles) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(user_id)
        .bind(to_texts(&roles))
        .execute(&mut *conn)
        .await?;
    }
    for (user_id, roles) in changes.updated {
        sqlx::query(
            "UPDATE project_participants SET roles = $3 WHERE project_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(to_texts(&roles))
        .execute(&mut *conn)
        .await?;
    }
    if !changes.deleted.is_empty() {
        sqlx::query("DELETE FROM project_participants WHERE project_id = $1 AND user_id = ANY($2)")
            .bind(id)
            .bind(changes.deleted)
            .execute(&mut *conn)
            .await?;
    }

    let as_map = |set: BTreeSet<Technology>| -> BTreeMap<Technology, ()> {
        set.into_iter().map(|t| (t, ())).collect()
    };
    let stored = load_technologies(&mut *conn, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    let changes = diff(&as_map(stored), &as_map(project.technologies().clone()));
    if !changes.inserted.is_empty() {
        let added: Vec<String> = changes.inserted.iter().map(|(t, ())| t.to_string()).collect();
        sqlx::query(
            "INSERT INTO project_technologies (project_id, technology) SELECT $1, UNNEST($2::text[])",
        )
        .bind(id)
        .bind(added)
        .execute(&mut *conn)
        .await?;
    }
    if !changes.deleted.is_empty() {
        let removed: Vec<String> = changes.deleted.iter().map(ToString::to_string).collect();
        sqlx::query(
            "DELETE FROM project_technologies WHERE project_id = $1 AND technology = ANY($2)",
        )
        .bind(id)
        .bind(removed)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, ProjectRow>(&format!("{SELECT_PROJECT} WHERE id = $1"))
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(assemble(conn, rows).await?.pop())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Project>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, ProjectRow>(&format!("{SELECT_PROJECT} ORDER BY created_at"))
            .fetch_all(&mut *conn)
            .await?;

        assemble(conn, rows).await
    }

    async fn add(&self, project: &Project) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, team_id, status, description, logo, url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(project.id())
        .bind(project.name())
        .bind(project.team_id())
        .bind(project.status().as_str())
        .bind(project.description())
        .bind(project.logo())
        .bind(project.url())
        .bind(project.created_at())
        .execute(&mut *conn)
        .await?;

        sync_children(conn, project).await
    }

    async fn update(&self, project: &Project) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                name = $2,
                status = $3,
                description = $4,
                logo = $5,
                url = $6
            WHERE id = $1
            "#,
        )
        .bind(project.id())
        .bind(project.name())
        .bind(project.status().as_str())
        .bind(project.description())
        .bind(project.logo())
        .bind(project.url())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "project",
                id: project.id(),
            });
        }
        sync_children(conn, project).await
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(connection(&mut slot)?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }

    async fn get_by_name(&self, name: &str) -> RepositoryResult<Option<Project>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, ProjectRow>(&format!("{SELECT_PROJECT} WHERE name = $1"))
            .bind(name)
            .fetch_all(&mut *conn)
            .await?;

        Ok(assemble(conn, rows).await?.pop())
    }

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        let mut slot = self.tx.lock().await;
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM projects WHERE name = $1)")
                .bind(name)
                .fetch_one(connection(&mut slot)?)
                .await?;

        Ok(exists)
    }

    async fn get_by_team(&self, team_id: Uuid) -> RepositoryResult<Vec<Project>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "{SELECT_PROJECT} WHERE team_id = $1 ORDER BY created_at"
        ))
        .bind(team_id)
        .fetch_all(&mut *conn)
        .await?;

        assemble(conn, rows).await
    }

    async fn count_projects_for_member(&self, user_id: Uuid) -> RepositoryResult<usize> {
        let mut slot = self.tx.lock().await;
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_participants WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(connection(&mut slot)?)
        .await?;

        to_count(count)
    }

    async fn is_manager_of_any_project(&self, user_id: Uuid) -> RepositoryResult<bool> {
        let mut slot = self.tx.lock().await;
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM project_participants WHERE user_id = $1 AND $2 = ANY(roles))",
        )
        .bind(user_id)
        .bind(ProjectRole::Manager.as_str())
        .fetch_one(connection(&mut slot)?)
        .await?;

        Ok(exists)
    }
}
