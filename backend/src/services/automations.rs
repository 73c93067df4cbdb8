use crate::error::{AppError, AppResult};
use crate::models::{
    ActionConfig, ActionType, Automation, AutomationChanges, AutomationLog, NewAutomation,
    TriggerConditions, TriggerType, page_window,
};
use crate::repository::Repositories;
use crate::services::access::{require_manager, require_member};
use crate::services::{nullable, projects::required_name};
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutomationInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_conditions: Option<JsonValue>,
    pub action_type: ActionType,
    pub action_parameters: JsonValue,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// `None` creates a global automation.
    #[serde(default)]
    pub project_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAutomationInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub trigger_type: Option<TriggerType>,
    #[serde(default, deserialize_with = "nullable")]
    pub trigger_conditions: Option<Option<JsonValue>>,
    pub action_type: Option<ActionType>,
    pub action_parameters: Option<JsonValue>,
    pub is_active: Option<bool>,
}

fn validate_conditions(conditions: Option<&JsonValue>) -> AppResult<()> {
    TriggerConditions::from_column(conditions)
        .map(|_| ())
        .map_err(|e| AppError::validation(format!("Invalid trigger conditions: {}", e)))
}

fn validate_action(action_type: ActionType, params: &JsonValue) -> AppResult<()> {
    ActionConfig::parse(action_type, params)
        .map(|_| ())
        .map_err(|e| {
            AppError::validation(format!("Invalid parameters for {}: {}", action_type, e))
        })
}

pub struct AutomationService {
    repos: Repositories,
}

impl AutomationService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Project automations are readable by members; global ones by their creator.
    fn readable(&self, user_id: i32, automation_id: i32) -> AppResult<Automation> {
        let automation = self
            .repos
            .automations
            .find_automation(automation_id)?
            .ok_or_else(|| AppError::not_found("Automation"))?;
        match automation.project_id {
            Some(project_id) => {
                require_member(&self.repos, project_id, user_id)?;
            }
            None if automation.created_by != user_id => return Err(AppError::forbidden()),
            None => {}
        }
        Ok(automation)
    }

    fn writable(&self, user_id: i32, automation_id: i32) -> AppResult<Automation> {
        let automation = self.readable(user_id, automation_id)?;
        if let Some(project_id) = automation.project_id {
            require_manager(&self.repos, project_id, user_id)?;
        }
        Ok(automation)
    }

    pub fn create(&self, user_id: i32, input: CreateAutomationInput) -> AppResult<Automation> {
        if let Some(project_id) = input.project_id {
            require_manager(&self.repos, project_id, user_id)?;
        }
        let name = required_name(&input.name, "Automation name")?;
        validate_conditions(input.trigger_conditions.as_ref())?;
        validate_action(input.action_type, &input.action_parameters)?;

        let automation = self.repos.automations.insert_automation(NewAutomation {
            name,
            description: input.description,
            trigger_type: input.trigger_type,
            trigger_conditions: input.trigger_conditions.filter(|c| !c.is_null()),
            action_type: input.action_type,
            action_parameters: input.action_parameters,
            is_active: input.is_active.unwrap_or(true),
            project_id: input.project_id,
            created_by: user_id,
        })?;
        log::info!(
            "Automation {} ({} -> {}) created by user {}",
            automation.id,
            automation.trigger_type,
            automation.action_type,
            user_id
        );
        Ok(automation)
    }

    pub fn get(&self, user_id: i32, automation_id: i32) -> AppResult<Automation> {
        self.readable(user_id, automation_id)
    }

    /// Automations of a project, or the caller's global automations.
    pub fn list(&self, user_id: i32, project_id: Option<i32>) -> AppResult<Vec<Automation>> {
        match project_id {
            Some(project_id) => {
                require_member(&self.repos, project_id, user_id)?;
                Ok(self.repos.automations.list_automations(Some(project_id))?)
            }
            None => Ok(self
                .repos
                .automations
                .list_automations(None)?
                .into_iter()
                .filter(|a| a.created_by == user_id)
                .collect()),
        }
    }

    pub fn update(
        &self,
        user_id: i32,
        automation_id: i32,
        input: UpdateAutomationInput,
    ) -> AppResult<Automation> {
        let current = self.writable(user_id, automation_id)?;

        if let Some(conditions) = &input.trigger_conditions {
            validate_conditions(conditions.as_ref())?;
        }
        if input.action_type.is_some() || input.action_parameters.is_some() {
            validate_action(
                input.action_type.unwrap_or(current.action_type),
                input
                    .action_parameters
                    .as_ref()
                    .unwrap_or(&current.action_parameters),
            )?;
        }

        let changes = AutomationChanges {
            name: input
                .name
                .as_deref()
                .map(|n| required_name(n, "Automation name"))
                .transpose()?,
            description: input.description,
            trigger_type: input.trigger_type,
            trigger_conditions: input
                .trigger_conditions
                .map(|c| c.filter(|c| !c.is_null())),
            action_type: input.action_type,
            action_parameters: input.action_parameters,
            is_active: input.is_active,
        };
        Ok(self
            .repos
            .automations
            .update_automation(automation_id, changes)?)
    }

    pub fn toggle(&self, user_id: i32, automation_id: i32) -> AppResult<Automation> {
        let current = self.writable(user_id, automation_id)?;
        Ok(self.repos.automations.update_automation(
            automation_id,
            AutomationChanges {
                is_active: Some(!current.is_active),
                ..Default::default()
            },
        )?)
    }

    pub fn delete(&self, user_id: i32, automation_id: i32) -> AppResult<()> {
        self.writable(user_id, automation_id)?;
        Ok(self.repos.automations.delete_automation(automation_id)?)
    }

    pub fn logs(
        &self,
        user_id: i32,
        automation_id: i32,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<Vec<AutomationLog>> {
        self.readable(user_id, automation_id)?;
        let (offset, limit) = page_window(offset, limit);
        Ok(self
            .repos
            .automations
            .list_automation_logs(automation_id, offset, limit)?)
    }
}
