use crate::error::AppResult;
use crate::models::{Priority, Task, TaskStatus};
use crate::repository::Repositories;
use crate::services::access::require_member;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const COMPLETED_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub project_id: i32,
    pub total_tasks: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_priority: BTreeMap<&'static str, usize>,
    pub overdue: usize,
    pub completed_last_7_days: usize,
    /// Share of tasks in DONE, `0.0` for an empty project.
    pub completion_rate: f64,
    pub generated_at: NaiveDateTime,
}

impl ProjectMetrics {
    pub fn compute(project_id: i32, tasks: &[Task], now: NaiveDateTime) -> Self {
        let mut by_status: BTreeMap<_, _> =
            TaskStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut by_priority: BTreeMap<_, _> =
            Priority::ALL.iter().map(|p| (p.as_str(), 0)).collect();
        let recent = now - Duration::days(COMPLETED_WINDOW_DAYS);

        let mut overdue = 0;
        let mut completed_recently = 0;
        for task in tasks {
            *by_status.entry(task.status.as_str()).or_default() += 1;
            *by_priority.entry(task.priority.as_str()).or_default() += 1;

            if task.status != TaskStatus::Done && task.due_date.is_some_and(|due| due < now) {
                overdue += 1;
            }
            if task.completed_at.is_some_and(|at| at >= recent) {
                completed_recently += 1;
            }
        }

        let done = by_status
            .get(TaskStatus::Done.as_str())
            .copied()
            .unwrap_or_default();
        let completion_rate = if tasks.is_empty() {
            0.0
        } else {
            done as f64 / tasks.len() as f64
        };

        Self {
            project_id,
            total_tasks: tasks.len(),
            by_status,
            by_priority,
            overdue,
            completed_last_7_days: completed_recently,
            completion_rate,
            generated_at: now,
        }
    }
}

pub struct DashboardService {
    repos: Repositories,
}

impl DashboardService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub fn metrics(&self, user_id: i32, project_id: i32) -> AppResult<ProjectMetrics> {
        require_member(&self.repos, project_id, user_id)?;
        let tasks = self.repos.tasks.list_tasks(project_id, None)?;
        Ok(ProjectMetrics::compute(
            project_id,
            &tasks,
            Utc::now().naive_utc(),
        ))
    }
}
