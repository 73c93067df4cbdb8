use crate::error::{AppError, AppResult};
use crate::models::{NewSection, Section, SectionChanges};
use crate::repository::Repositories;
use crate::services::access::{require_member, require_writer};
use crate::services::projects::required_name;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionInput {
    pub name: String,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionInput {
    pub name: Option<String>,
    pub position: Option<i32>,
}

pub struct SectionService {
    repos: Repositories,
}

impl SectionService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    fn find(&self, section_id: i32) -> AppResult<Section> {
        self.repos
            .sections
            .find_section(section_id)?
            .ok_or_else(|| AppError::not_found("Section"))
    }

    pub fn create(
        &self,
        user_id: i32,
        project_id: i32,
        input: CreateSectionInput,
    ) -> AppResult<Section> {
        require_writer(&self.repos, project_id, user_id)?;
        let name = required_name(&input.name, "Section name")?;
        let position = match input.position {
            Some(position) => position,
            None => self
                .repos
                .sections
                .list_sections(project_id)?
                .last()
                .map_or(0, |s| s.position + 1),
        };
        Ok(self.repos.sections.insert_section(NewSection {
            project_id,
            name,
            position,
        })?)
    }

    pub fn list(&self, user_id: i32, project_id: i32) -> AppResult<Vec<Section>> {
        require_member(&self.repos, project_id, user_id)?;
        Ok(self.repos.sections.list_sections(project_id)?)
    }

    pub fn update(
        &self,
        user_id: i32,
        section_id: i32,
        input: UpdateSectionInput,
    ) -> AppResult<Section> {
        let section = self.find(section_id)?;
        require_writer(&self.repos, section.project_id, user_id)?;
        let changes = SectionChanges {
            name: input
                .name
                .as_deref()
                .map(|n| required_name(n, "Section name"))
                .transpose()?,
            position: input.position,
        };
        Ok(self.repos.sections.update_section(section_id, changes)?)
    }

    pub fn delete(&self, user_id: i32, section_id: i32) -> AppResult<()> {
        let section = self.find(section_id)?;
        require_writer(&self.repos, section.project_id, user_id)?;
        Ok(self.repos.sections.delete_section(section_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::projects::CreateProjectInput;
    use crate::services::tasks::CreateTaskInput;
    use crate::state::AppState;
    use crate::models::NewUser;

    fn setup() -> (AppState, i32, i32) {
        let (state, _) = AppState::in_memory(AppConfig::default());
        let user = state
            .repos
            .users
            .insert_user(NewUser {
                email: "s@example.com".to_string(),
                name: "S".to_string(),
                password_hash: "x".to_string(),
            })
            .unwrap();
        let project = state
            .projects
            .create(
                user.id,
                CreateProjectInput {
                    name: "Board".to_string(),
                    description: None,
                    color: None,
                },
            )
            .unwrap();
        (state, user.id, project.id)
    }

    fn section(state: &AppState, user_id: i32, project_id: i32, name: &str) -> Section {
        state
            .sections
            .create(
                user_id,
                project_id,
                CreateSectionInput {
                    name: name.to_string(),
                    position: None,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_sections_are_appended_in_order() {
        let (state, user_id, project_id) = setup();
        let todo = section(&state, user_id, project_id, "To do");
        let doing = section(&state, user_id, project_id, "Doing");

        assert_eq!(todo.position, 0);
        assert_eq!(doing.position, 1);
        let names: Vec<_> = state
            .sections
            .list(user_id, project_id)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["To do", "Doing"]);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let (state, user_id, project_id) = setup();
        let result = state.sections.create(
            user_id,
            project_id,
            CreateSectionInput {
                name: "   ".to_string(),
                position: None,
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_update_renames_and_moves() {
        let (state, user_id, project_id) = setup();
        let s = section(&state, user_id, project_id, "Backlog");

        let updated = state
            .sections
            .update(
                user_id,
                s.id,
                UpdateSectionInput {
                    name: Some("Icebox".to_string()),
                    position: Some(7),
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Icebox");
        assert_eq!(updated.position, 7);
    }

    #[test]
    fn test_delete_keeps_tasks_without_section() {
        let (state, user_id, project_id) = setup();
        let s = section(&state, user_id, project_id, "Backlog");
        let task = state
            .tasks
            .create(
                user_id,
                project_id,
                CreateTaskInput {
                    title: "Orphan".to_string(),
                    section_id: Some(s.id),
                    ..Default::default()
                },
            )
            .unwrap();

        state.sections.delete(user_id, s.id).unwrap();

        let kept = state.tasks.get(user_id, task.id).unwrap();
        assert_eq!(kept.section_id, None);
        assert!(matches!(
            state.sections.delete(user_id, s.id),
            Err(AppError::NotFound(_))
        ));
    }
}
