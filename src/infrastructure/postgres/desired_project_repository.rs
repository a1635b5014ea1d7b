use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{connection, parse_text, to_count, SharedTransaction};
use crate::domain::desired_project::DesiredProject;
use crate::domain::repositories::{DesiredProjectRepository, RepositoryError, RepositoryResult};
use crate::domain::tech_profile::{TechProfile, Technology};
use crate::infrastructure::reconcile::diff;

const SELECT_DESIRED: &str = r#"
    SELECT id, owner_id, amount_of_people, description, created_at
    FROM desired_projects
"#;

#[derive(sqlx::FromRow)]
struct DesiredProjectRow {
    id: Uuid,
    owner_id: Uuid,
    amount_of_people: Option<i32>,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct TechnologyRow {
    desired_project_id: Uuid,
    technology: String,
}

pub struct PostgresDesiredProjectRepository {
    tx: SharedTransaction,
}

impl PostgresDesiredProjectRepository {
    pub(super) fn new(tx: SharedTransaction) -> Self {
        Self { tx }
    }
}

fn amount_to_db(amount: Option<u32>) -> RepositoryResult<Option<i32>> {
    amount
        .map(|value| {
            i32::try_from(value)
                .map_err(|_| RepositoryError::Conflict(format!("amount {value} is out of range")))
        })
        .transpose()
}

async fn load_technologies(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> RepositoryResult<BTreeMap<Uuid, BTreeSet<Technology>>> {
    let rows = sqlx::query_as::<_, TechnologyRow>(
        r#"
        SELECT desired_project_id, technology
        FROM desired_project_technologies
        WHERE desired_project_id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: BTreeMap<Uuid, BTreeSet<Technology>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.desired_project_id)
            .or_default()
            .insert(parse_text(&row.technology)?);
    }
    Ok(grouped)
}

async fn assemble(
    conn: &mut PgConnection,
    rows: Vec<DesiredProjectRow>,
) -> RepositoryResult<Vec<DesiredProject>> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut technologies = load_technologies(conn, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let amount = row
                .amount_of_people
                .map(u32::try_from)
                .transpose()
                .map_err(|_| RepositoryError::Corrupt("negative amount_of_people".to_string()))?;
            Ok(DesiredProject::from_persistence(
                row.id,
                row.owner_id,
                amount,
                TechProfile::from_persistence(
                    row.description,
                    technologies.remove(&row.id).unwrap_or_default(),
                ),
                row.created_at,
            ))
        })
        .collect()
}

async fn sync_technologies(conn: &mut PgConnection, desired: &DesiredProject) -> RepositoryResult<()> {
    let id = desired.id();
    let as_map = |set: BTreeSet<Technology>| -> BTreeMap<Technology, ()> {
        set.into_iter().map(|t| (t, ())).collect()
    };
    let stored = load_technologies(&mut *conn, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    let changes = diff(&as_map(stored), &as_map(desired.technologies().clone()));

    for (technology, ()) in changes.inserted {
        sqlx::query(
            "INSERT INTO desired_project_technologies (desired_project_id, technology) VALUES ($1, $2)",
        )
        .bind(id)
        .bind(technology.as_str())
        .execute(&mut *conn)
        .await?;
    }
    for technology in changes.deleted {
        sqlx::query(
            "DELETE FROM desired_project_technologies WHERE desired_project_id = $1 AND technology = $2",
        )
        .bind(id)
        .bind(technology.as_str())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl DesiredProjectRepository for PostgresDesiredProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<DesiredProject>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, DesiredProjectRow>(&format!("{SELECT_DESIRED} WHERE id = $1"))
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(assemble(conn, rows).await?.pop())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<DesiredProject>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows =
            sqlx::query_as::<_, DesiredProjectRow>(&format!("{SELECT_DESIRED} ORDER BY created_at"))
                .fetch_all(&mut *conn)
                .await?;

        assemble(conn, rows).await
    }

    async fn add(&self, desired: &DesiredProject) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        sqlx::query(
            r#"
            INSERT INTO desired_projects (id, owner_id, amount_of_people, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(desired.id())
        .bind(desired.owner_id())
        .bind(amount_to_db(desired.amount_of_people())?)
        .bind(desired.description())
        .bind(desired.created_at())
        .execute(&mut *conn)
        .await?;

        sync_technologies(conn, desired).await
    }

    async fn update(&self, desired: &DesiredProject) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let result = sqlx::query(
            "UPDATE desired_projects SET amount_of_people = $2, description = $3 WHERE id = $1",
        )
        .bind(desired.id())
        .bind(amount_to_db(desired.amount_of_people())?)
        .bind(desired.description())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "desired project",
                id: desired.id(),
            });
        }
        sync_technologies(conn, desired).await
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let result = sqlx::query("DELETE FROM desired_projects WHERE id = $1")
            .bind(id)
            .execute(connection(&mut slot)?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "desired project",
                id,
            });
        }
        Ok(())
    }

    async fn get_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<DesiredProject>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, DesiredProjectRow>(&format!(
            "{SELECT_DESIRED} WHERE owner_id = $1 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

        assemble(conn, rows).await
    }

    async fn count_for_owner(&self, owner_id: Uuid) -> RepositoryResult<usize> {
        let mut slot = self.tx.lock().await;
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM desired_projects WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_one(connection(&mut slot)?)
        .await?;

        to_count(count)
    }
}
