// Row-shaped in-memory tables mirroring the SQL schema
// Aggregates are assembled from rows on read and reconciled back on write.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::desired_project::DesiredProject;
use crate::domain::project::{Project, ProjectRole, ProjectStatus};
use crate::domain::repositories::{RepositoryError, RepositoryResult};
use crate::domain::team::{Team, TeamRole};
use crate::domain::tech_profile::{TechProfile, Technology};
use crate::domain::user::User;
use crate::infrastructure::reconcile::diff;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct TeamRow {
    name: String,
    description: Option<String>,
    logo: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ProjectRow {
    name: String,
    team_id: Uuid,
    status: ProjectStatus,
    description: String,
    logo: Option<String>,
    url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct DesiredProjectRow {
    owner_id: Uuid,
    amount_of_people: Option<u32>,
    description: String,
    created_at: DateTime<Utc>,
}

/// Every table of the store
///
/// Child tables are keyed by (parent id, child id) so a parent's rows are
/// contiguous.
#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    users: BTreeMap<Uuid, User>,
    teams: BTreeMap<Uuid, TeamRow>,
    team_members: BTreeMap<(Uuid, Uuid), BTreeSet<TeamRole>>,
    projects: BTreeMap<Uuid, ProjectRow>,
    project_participants: BTreeMap<(Uuid, Uuid), BTreeSet<ProjectRole>>,
    project_technologies: BTreeSet<(Uuid, Technology)>,
    desired_projects: BTreeMap<Uuid, DesiredProjectRow>,
    desired_project_technologies: BTreeSet<(Uuid, Technology)>,
}

fn children<V: Clone>(rows: &BTreeMap<(Uuid, Uuid), V>, parent: Uuid) -> BTreeMap<Uuid, V> {
    rows.range((parent, Uuid::nil())..)
        .take_while(|((owner, _), _)| *owner == parent)
        .map(|((_, child), value)| (*child, value.clone()))
        .collect()
}

fn technologies_of(rows: &BTreeSet<(Uuid, Technology)>, parent: Uuid) -> BTreeSet<Technology> {
    rows.iter()
        .filter(|(owner, _)| *owner == parent)
        .map(|(_, technology)| *technology)
        .collect()
}

/// Reconciles the child rows of `parent` against `current`
fn sync_children<V: PartialEq + Clone>(
    rows: &mut BTreeMap<(Uuid, Uuid), V>,
    parent: Uuid,
    current: &BTreeMap<Uuid, V>,
) {
    let changes = diff(&children(rows, parent), current);
    for (child, value) in changes.inserted.into_iter().chain(changes.updated) {
        rows.insert((parent, child), value);
    }
    for child in changes.deleted {
        rows.remove(&(parent, child));
    }
}

fn sync_technologies(
    rows: &mut BTreeSet<(Uuid, Technology)>,
    parent: Uuid,
    current: &BTreeSet<Technology>,
) {
    let as_map = |set: &BTreeSet<Technology>| -> BTreeMap<Technology, ()> {
        set.iter().map(|t| (*t, ())).collect()
    };
    let changes = diff(&as_map(&technologies_of(rows, parent)), &as_map(current));
    for (technology, ()) in changes.inserted {
        rows.insert((parent, technology));
    }
    for technology in changes.deleted {
        rows.remove(&(parent, technology));
    }
}

fn not_found(entity: &'static str, id: Uuid) -> RepositoryError {
    RepositoryError::NotFound { entity, id }
}

/// Applies the row changes between `base` and `work` onto `target`
fn replay_rows<K, V>(target: &mut BTreeMap<K, V>, base: &BTreeMap<K, V>, work: &BTreeMap<K, V>)
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    let changes = diff(base, work);
    for (key, value) in changes.inserted.into_iter().chain(changes.updated) {
        target.insert(key, value);
    }
    for key in changes.deleted {
        target.remove(&key);
    }
}

fn replay_set<T: Ord + Clone>(target: &mut BTreeSet<T>, base: &BTreeSet<T>, work: &BTreeSet<T>) {
    for added in work.difference(base) {
        target.insert(added.clone());
    }
    for removed in base.difference(work) {
        target.remove(removed);
    }
}

fn dangling(what: &str, id: Uuid) -> RepositoryError {
    RepositoryError::Conflict(format!("{what} {id} does not exist"))
}

impl Tables {
    fn ensure_users_exist<'a>(&self, ids: impl IntoIterator<Item = &'a Uuid>) -> RepositoryResult<()> {
        for id in ids {
            if !self.users.contains_key(id) {
                return Err(dangling("user", *id));
            }
        }
        Ok(())
    }

    /// Replays what a scope changed since it forked `base` into `work`
    ///
    /// Rows the scope never touched keep their committed values, so scopes
    /// writing different rows never overwrite each other.
    pub(super) fn replay(&mut self, base: &Tables, work: &Tables) {
        replay_rows(&mut self.users, &base.users, &work.users);
        replay_rows(&mut self.teams, &base.teams, &work.teams);
        replay_rows(&mut self.team_members, &base.team_members, &work.team_members);
        replay_rows(&mut self.projects, &base.projects, &work.projects);
        replay_rows(
            &mut self.project_participants,
            &base.project_participants,
            &work.project_participants,
        );
        replay_set(
            &mut self.project_technologies,
            &base.project_technologies,
            &work.project_technologies,
        );
        replay_rows(&mut self.desired_projects, &base.desired_projects, &work.desired_projects);
        replay_set(
            &mut self.desired_project_technologies,
            &base.desired_project_technologies,
            &work.desired_project_technologies,
        );
    }

    /// Unique and foreign-key constraints over the whole store
    ///
    /// Scopes check these as they write, but two scopes replayed onto the
    /// same state can still collide.
    pub(super) fn check_constraints(&self) -> RepositoryResult<()> {
        let mut emails = BTreeSet::new();
        let mut usernames = BTreeSet::new();
        for user in self.users.values() {
            if !emails.insert(user.email().as_str()) {
                return Err(RepositoryError::Conflict("email already in use".to_string()));
            }
            if !usernames.insert(user.username()) {
                return Err(RepositoryError::Conflict("username already in use".to_string()));
            }
        }

        let mut team_names = BTreeSet::new();
        for row in self.teams.values() {
            if !team_names.insert(row.name.as_str()) {
                return Err(RepositoryError::Conflict(format!(
                    "team name {} already in use",
                    row.name
                )));
            }
        }
        for (team_id, member) in self.team_members.keys() {
            if !self.teams.contains_key(team_id) {
                return Err(dangling("team", *team_id));
            }
            self.ensure_users_exist([member])?;
        }

        let mut project_names = BTreeSet::new();
        for row in self.projects.values() {
            if !project_names.insert(row.name.as_str()) {
                return Err(RepositoryError::Conflict(format!(
                    "project name {} already in use",
                    row.name
                )));
            }
            if !self.teams.contains_key(&row.team_id) {
                return Err(dangling("team", row.team_id));
            }
        }
        for (project_id, participant) in self.project_participants.keys() {
            if !self.projects.contains_key(project_id) {
                return Err(dangling("project", *project_id));
            }
            self.ensure_users_exist([participant])?;
        }
        if let Some((project_id, _)) = self
            .project_technologies
            .iter()
            .find(|(project_id, _)| !self.projects.contains_key(project_id))
        {
            return Err(dangling("project", *project_id));
        }

        for row in self.desired_projects.values() {
            self.ensure_users_exist([&row.owner_id])?;
        }
        if let Some((desired_id, _)) = self
            .desired_project_technologies
            .iter()
            .find(|(desired_id, _)| !self.desired_projects.contains_key(desired_id))
        {
            return Err(dangling("desired project", *desired_id));
        }
        Ok(())
    }

    // ===== Users =====

    pub(super) fn user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).cloned()
    }

    pub(super) fn all_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by_key(|user| user.created_at());
        users
    }

    pub(super) fn find_user(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.values().find(|user| predicate(user)).cloned()
    }

    pub(super) fn put_user(&mut self, user: &User, is_new: bool) -> RepositoryResult<()> {
        if is_new == self.users.contains_key(&user.id()) {
            return Err(if is_new {
                RepositoryError::Conflict(format!("user {} already exists", user.id()))
            } else {
                not_found("user", user.id())
            });
        }
        let clash = self.users.values().find(|other| {
            other.id() != user.id()
                && (other.email() == user.email() || other.username() == user.username())
        });
        if let Some(other) = clash {
            let field = if other.email() == user.email() {
                "email"
            } else {
                "username"
            };
            return Err(RepositoryError::Conflict(format!("{field} already in use")));
        }
        self.users.insert(user.id(), user.clone());
        Ok(())
    }

    pub(super) fn delete_user(&mut self, id: Uuid) -> RepositoryResult<()> {
        self.users.remove(&id).ok_or_else(|| not_found("user", id))?;
        self.team_members.retain(|(_, member), _| *member != id);
        self.project_participants.retain(|(_, participant), _| *participant != id);
        let owned: Vec<Uuid> = self
            .desired_projects
            .iter()
            .filter(|(_, row)| row.owner_id == id)
            .map(|(desired_id, _)| *desired_id)
            .collect();
        for desired_id in owned {
            self.delete_desired_project(desired_id)?;
        }
        Ok(())
    }

    // ===== Teams =====

    pub(super) fn team(&self, id: Uuid) -> Option<Team> {
        let row = self.teams.get(&id)?;
        Some(Team::from_persistence(
            id,
            row.name.clone(),
            row.description.clone(),
            row.logo.clone(),
            children(&self.team_members, id),
            row.created_at,
        ))
    }

    pub(super) fn all_teams(&self) -> Vec<Team> {
        let mut teams: Vec<Team> = self.teams.keys().filter_map(|id| self.team(*id)).collect();
        teams.sort_by_key(|team| team.created_at());
        teams
    }

    pub(super) fn team_id_by_name(&self, name: &str) -> Option<Uuid> {
        self.teams
            .iter()
            .find(|(_, row)| row.name == name)
            .map(|(id, _)| *id)
    }

    pub(super) fn put_team(&mut self, team: &Team, is_new: bool) -> RepositoryResult<()> {
        if is_new == self.teams.contains_key(&team.id()) {
            return Err(if is_new {
                RepositoryError::Conflict(format!("team {} already exists", team.id()))
            } else {
                not_found("team", team.id())
            });
        }
        if matches!(self.team_id_by_name(team.name()), Some(other) if other != team.id()) {
            return Err(RepositoryError::Conflict(format!(
                "team name {} already in use",
                team.name()
            )));
        }
        let members = team.roster().role_map();
        self.ensure_users_exist(members.keys())?;

        self.teams.insert(
            team.id(),
            TeamRow {
                name: team.name().to_string(),
                description: team.description().map(str::to_string),
                logo: team.logo().map(str::to_string),
                created_at: team.created_at(),
            },
        );
        sync_children(&mut self.team_members, team.id(), &members);
        Ok(())
    }

    pub(super) fn delete_team(&mut self, id: Uuid) -> RepositoryResult<()> {
        self.teams.remove(&id).ok_or_else(|| not_found("team", id))?;
        self.team_members.retain(|(team_id, _), _| *team_id != id);
        let owned: Vec<Uuid> = self
            .projects
            .iter()
            .filter(|(_, row)| row.team_id == id)
            .map(|(project_id, _)| *project_id)
            .collect();
        for project_id in owned {
            self.delete_project(project_id)?;
        }
        Ok(())
    }

    pub(super) fn team_memberships(&self, user_id: Uuid) -> impl Iterator<Item = &BTreeSet<TeamRole>> {
        self.team_members
            .iter()
            .filter(move |((_, member), _)| *member == user_id)
            .map(|(_, roles)| roles)
    }

    // ===== Projects =====

    pub(super) fn project(&self, id: Uuid) -> Option<Project> {
        let row = self.projects.get(&id)?;
        Some(Project::from_persistence(
            id,
            row.name.clone(),
            row.team_id,
            row.status,
            TechProfile::from_persistence(
                row.description.clone(),
                technologies_of(&self.project_technologies, id),
            ),
            row.logo.clone(),
            row.url.clone(),
            children(&self.project_participants, id),
            row.created_at,
        ))
    }

    pub(super) fn all_projects(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .projects
            .keys()
            .filter_map(|id| self.project(*id))
            .collect();
        projects.sort_by_key(|project| project.created_at());
        projects
    }

    pub(super) fn projects_of_team(&self, team_id: Uuid) -> Vec<Project> {
        self.all_projects()
            .into_iter()
            .filter(|project| project.team_id() == team_id)
            .collect()
    }

    pub(super) fn project_id_by_name(&self, name: &str) -> Option<Uuid> {
        self.projects
            .iter()
            .find(|(_, row)| row.name == name)
            .map(|(id, _)| *id)
    }

    pub(super) fn put_project(&mut self, project: &Project, is_new: bool) -> RepositoryResult<()> {
        if is_new == self.projects.contains_key(&project.id()) {
            return Err(if is_new {
                RepositoryError::Conflict(format!("project {} already exists", project.id()))
            } else {
                not_found("project", project.id())
            });
        }
        if !self.teams.contains_key(&project.team_id()) {
            return Err(RepositoryError::Conflict(format!(
                "team {} does not exist",
                project.team_id()
            )));
        }
        if matches!(self.project_id_by_name(project.name()), Some(other) if other != project.id()) {
            return Err(RepositoryError::Conflict(format!(
                "project name {} already in use",
                project.name()
            )));
        }
        let participants = project.roster().role_map();
        self.ensure_users_exist(participants.keys())?;

        self.projects.insert(
            project.id(),
            ProjectRow {
                name: project.name().to_string(),
                team_id: project.team_id(),
                status: project.status(),
                description: project.description().to_string(),
                logo: project.logo().map(str::to_string),
                url: project.url().map(str::to_string),
                created_at: project.created_at(),
            },
        );
        sync_children(&mut self.project_participants, project.id(), &participants);
        sync_technologies(
            &mut self.project_technologies,
            project.id(),
            project.technologies(),
        );
        Ok(())
    }

    pub(super) fn delete_project(&mut self, id: Uuid) -> RepositoryResult<()> {
        self.projects.remove(&id).ok_or_else(|| not_found("project", id))?;
        self.project_participants.retain(|(project_id, _), _| *project_id != id);
        self.project_technologies.retain(|(project_id, _)| *project_id != id);
        Ok(())
    }

    pub(super) fn participations(
        &self,
        user_id: Uuid,
    ) -> impl Iterator<Item = &BTreeSet<ProjectRole>> {
        self.project_participants
            .iter()
            .filter(move |((_, participant), _)| *participant == user_id)
            .map(|(_, roles)| roles)
    }

    // ===== Desired projects =====

    pub(super) fn desired_project(&self, id: Uuid) -> Option<DesiredProject> {
        let row = self.desired_projects.get(&id)?;
        Some(DesiredProject::from_persistence(
            id,
            row.owner_id,
            row.amount_of_people,
            TechProfile::from_persistence(
                row.description.clone(),
                technologies_of(&self.desired_project_technologies, id),
            ),
            row.created_at,
        ))
    }

    pub(super) fn desired_projects_where(
        &self,
        predicate: impl Fn(Uuid) -> bool,
    ) -> Vec<DesiredProject> {
        let mut found: Vec<DesiredProject> = self
            .desired_projects
            .iter()
            .filter(|(_, row)| predicate(row.owner_id))
            .filter_map(|(id, _)| self.desired_project(*id))
            .collect();
        found.sort_by_key(|desired| desired.created_at());
        found
    }

    pub(super) fn put_desired_project(
        &mut self,
        desired: &DesiredProject,
        is_new: bool,
    ) -> RepositoryResult<()> {
        if is_new == self.desired_projects.contains_key(&desired.id()) {
            return Err(if is_new {
                RepositoryError::Conflict(format!(
                    "desired project {} already exists",
                    desired.id()
                ))
            } else {
                not_found("desired project", desired.id())
            });
        }
        self.ensure_users_exist([desired.owner_id()].iter())?;

        self.desired_projects.insert(
            desired.id(),
            DesiredProjectRow {
                owner_id: desired.owner_id(),
                amount_of_people: desired.amount_of_people(),
                description: desired.description().to_string(),
                created_at: desired.created_at(),
            },
        );
        sync_technologies(
            &mut self.desired_project_technologies,
            desired.id(),
            desired.technologies(),
        );
        Ok(())
    }

    pub(super) fn delete_desired_project(&mut self, id: Uuid) -> RepositoryResult<()> {
        self.desired_projects
            .remove(&id)
            .ok_or_else(|| not_found("desired project", id))?;
        self.desired_project_technologies
            .retain(|(desired_id, _)| *desired_id != id);
        Ok(())
    }
}
