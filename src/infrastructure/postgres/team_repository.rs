use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{connection, parse_set, to_count, to_texts, SharedTransaction};
use crate::domain::repositories::{RepositoryError, RepositoryResult, TeamRepository};
use crate::domain::team::{Team, TeamRole};
use crate::infrastructure::reconcile::diff;

#[derive(sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    logo: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    team_id: Uuid,
    user_id: Uuid,
    roles: Vec<String>,
}

type MemberMap = BTreeMap<Uuid, BTreeSet<TeamRole>>;

/// PostgreSQL implementation of TeamRepository
///
/// Teams live in `teams`; membership lives in `team_members`, one row per
/// member with the role set as a text array.
pub struct PostgresTeamRepository {
    tx: SharedTransaction,
}

impl PostgresTeamRepository {
    pub(super) fn new(tx: SharedTransaction) -> Self {
        Self { tx }
    }
}

/// Loads the member rows of every team in `team_ids`, grouped by team
async fn load_members(
    conn: &mut PgConnection,
    team_ids: &[Uuid],
) -> RepositoryResult<BTreeMap<Uuid, MemberMap>> {
    let rows = sqlx::query_as::<_, MemberRow>(
        "SELECT team_id, user_id, roles FROM team_members WHERE team_id = ANY($1)",
    )
    .bind(team_ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: BTreeMap<Uuid, MemberMap> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.team_id)
            .or_default()
            .insert(row.user_id, parse_set(row.roles)?);
    }
    Ok(grouped)
}

/// Assembles teams from their rows and grouped member rows
async fn assemble(conn: &mut PgConnection, rows: Vec<TeamRow>) -> RepositoryResult<Vec<Team>> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut members = load_members(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            Team::from_persistence(
                row.id,
                row.name,
                row.description,
                row.logo,
                members.remove(&row.id).unwrap_or_default(),
                row.created_at,
            )
        })
        .collect())
}

/// Reconciles `team_members` for one team against the aggregate's roster
async fn sync_members(conn: &mut PgConnection, team: &Team) -> RepositoryResult<()> {
    let stored = load_members(&mut *conn, &[team.id()])
        .await?
        .remove(&team.id())
        .unwrap_or_default();
    let changes = diff(&stored, &team.roster().role_map());

    for (user_id, roles) in changes.inserted {
        sqlx::query("INSERT INTO team_members (team_id, user_id, roles) VALUES ($1, $2, $3)")
            .bind(team.id())
            .bind(user_id)
            .bind(to_texts(&roles))
            .execute(&mut *conn)
            .await?;
    }
    for (user_id, roles) in changes.updated {
        sqlx::query("UPDATE team_members SET roles = $3 WHERE team_id = $1 AND user_id = $2")
            .bind(team.id())
            .bind(user_id)
            .bind(to_texts(&roles))
            .execute(&mut *conn)
            .await?;
    }
    if !changes.deleted.is_empty() {
        sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = ANY($2)")
            .bind(team.id())
            .bind(changes.deleted)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Team>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, TeamRow>(
            "SELECT id, name, description, logo, created_at FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(assemble(conn, rows).await?.pop())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Team>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, TeamRow>(
            "SELECT id, name, description, logo, created_at FROM teams ORDER BY created_at",
        )
        .fetch_all(&mut *conn)
        .await?;

        assemble(conn, rows).await
    }

    async fn add(&self, team: &Team) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        sqlx::query(
            r#"
            INSERT INTO teams (id, name, description, logo, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(team.id())
        .bind(team.name())
        .bind(team.description())
        .bind(team.logo())
        .bind(team.created_at())
        .execute(&mut *conn)
        .await?;

        sync_members(conn, team).await
    }

    async fn update(&self, team: &Team) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let result = sqlx::query(
            "UPDATE teams SET name = $2, description = $3, logo = $4 WHERE id = $1",
        )
        .bind(team.id())
        .bind(team.name())
        .bind(team.description())
        .bind(team.logo())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "team",
                id: team.id(),
            });
        }
        sync_members(conn, team).await
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        // Members and projects cascade
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(connection(&mut slot)?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "team", id });
        }
        Ok(())
    }

    async fn get_by_name(&self, name: &str) -> RepositoryResult<Option<Team>> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;
        let rows = sqlx::query_as::<_, TeamRow>(
            "SELECT id, name, description, logo, created_at FROM teams WHERE name = $1",
        )
        .bind(name)
        .fetch_all(&mut *conn)
        .await?;

        Ok(assemble(conn, rows).await?.pop())
    }

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        let mut slot = self.tx.lock().await;
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM teams WHERE name = $1)")
                .bind(name)
                .fetch_one(connection(&mut slot)?)
                .await?;

        Ok(exists)
    }

    async fn is_owner_of_any_team(&self, user_id: Uuid) -> RepositoryResult<bool> {
        let mut slot = self.tx.lock().await;
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM team_members WHERE user_id = $1 AND $2 = ANY(roles))",
        )
        .bind(user_id)
        .bind(TeamRole::Owner.as_str())
        .fetch_one(connection(&mut slot)?)
        .await?;

        Ok(exists)
    }

    async fn count_teams_for_member(&self, user_id: Uuid) -> RepositoryResult<usize> {
        let mut slot = self.tx.lock().await;
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM team_members WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(connection(&mut slot)?)
                .await?;

        to_count(count)
    }
}
