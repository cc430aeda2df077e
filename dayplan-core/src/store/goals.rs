//! Goals, the selected goal, and its tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use super::events::Applied;
use super::lifecycle::{RequestStatus, Seq, Sequencer, notice_for};
use crate::api::{Backend, Operation};
use crate::config::ClientConfig;
use crate::error::{DayplanError, DayplanResult};
use crate::model::{Goal, GoalId, Task};
use crate::wire;

const UNKNOWN_GOAL: &str = "Unknown Goal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalResource {
    Goals,
    Tasks,
}

#[derive(Debug, Clone)]
pub enum GoalAction {
    GoalsFetched {
        seq: Seq,
        goals: Vec<Goal>,
    },
    Selected(Goal),
    TasksFetched {
        seq: Seq,
        goal_id: GoalId,
        tasks: Vec<Task>,
    },
    Failed {
        seq: Seq,
        resource: GoalResource,
        message: String,
        at: Instant,
    },
    ClearError,
    ExpireError {
        now: Instant,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, Default)]
pub struct GoalState {
    goals: Vec<Goal>,
    selected: Option<Goal>,
    tasks: Vec<Task>,
    status: RequestStatus,
    sequencer: Sequencer<GoalResource>,
}

impl GoalState {
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn selected(&self) -> Option<&Goal> {
        self.selected.as_ref()
    }

    /// Tasks of the selected goal, or of the last goal fetched directly.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn loading(&self) -> bool {
        self.status.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    /// Sidebar heading for the task list, if a goal is selected.
    pub fn tasks_heading(&self) -> Option<String> {
        self.selected.as_ref().map(|goal| {
            let name = goal.name.trim();
            let name = if name.is_empty() { UNKNOWN_GOAL } else { name };
            format!("Tasks for {name}")
        })
    }

    pub fn begin(&mut self) -> Seq {
        self.status.begin();
        self.sequencer.issue()
    }

    pub fn reduce(&mut self, action: GoalAction) -> Applied {
        match action {
            GoalAction::GoalsFetched { seq, goals } => {
                self.status.finish();
                if !self.sequencer.accept(GoalResource::Goals, seq) {
                    return Applied::Stale;
                }
                self.goals = goals;
                Applied::Applied
            }
            GoalAction::Selected(goal) => {
                // Tasks are scoped to one goal; switching drops the old ones.
                if self.selected.as_ref().map(|g| &g.id) != Some(&goal.id) {
                    self.tasks.clear();
                }
                self.selected = Some(goal);
                Applied::Applied
            }
            GoalAction::TasksFetched {
                seq,
                goal_id,
                tasks,
            } => {
                self.status.finish();
                // Only a switch to another goal makes the response obsolete.
                if matches!(&self.selected, Some(goal) if goal.id != goal_id) {
                    return Applied::Stale;
                }
                if !self.sequencer.accept(GoalResource::Tasks, seq) {
                    return Applied::Stale;
                }
                self.tasks = tasks;
                Applied::Applied
            }
            GoalAction::Failed {
                seq,
                resource,
                message,
                at,
            } => {
                self.status.finish();
                if !self.sequencer.accept(resource, seq) {
                    return Applied::Stale;
                }
                self.status.raise(message, at);
                Applied::Applied
            }
            GoalAction::ClearError => {
                self.status.clear_error();
                Applied::Applied
            }
            GoalAction::ExpireError { now, timeout } => {
                if self.status.expire_error(now, timeout) {
                    Applied::Applied
                } else {
                    Applied::Unchanged
                }
            }
        }
    }
}

pub struct GoalStore<B> {
    backend: Arc<B>,
    error_timeout: Duration,
    state: Mutex<GoalState>,
}

impl<B: Backend> GoalStore<B> {
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Self {
        GoalStore {
            backend,
            error_timeout: config.error_timeout,
            state: Mutex::new(GoalState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, GoalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> GoalState {
        self.state().clone()
    }

    pub fn dispatch(&self, action: GoalAction) -> Applied {
        self.state().reduce(action)
    }

    pub fn clear_error(&self) {
        self.dispatch(GoalAction::ClearError);
    }

    pub fn expire_error(&self, now: Instant) -> bool {
        self.dispatch(GoalAction::ExpireError {
            now,
            timeout: self.error_timeout,
        }) == Applied::Applied
    }

    fn fail(&self, op: Operation, seq: Seq, resource: GoalResource, err: &DayplanError) {
        error!(op = op.name(), seq = seq.get(), error = %err, "goal request failed");
        self.dispatch(GoalAction::Failed {
            seq,
            resource,
            message: notice_for(op, err),
            at: Instant::now(),
        });
    }

    /// Replace the goal list.
    pub async fn fetch_goals(&self) -> DayplanResult<Vec<Goal>> {
        let seq = self.state().begin();
        debug!(seq = seq.get(), "fetching goals");

        let result = self
            .backend
            .list_goals()
            .await
            .and_then(|body| wire::decode_list(body, "goal", wire::decode_goal));

        match result {
            Ok(goals) => {
                let applied = self.dispatch(GoalAction::GoalsFetched {
                    seq,
                    goals: goals.clone(),
                });
                debug!(seq = seq.get(), ?applied, count = goals.len(), "goals fetched");
                Ok(goals)
            }
            Err(e) => {
                self.fail(Operation::FetchGoals, seq, GoalResource::Goals, &e);
                Err(e)
            }
        }
    }

    /// Make `goal` the selected goal and load its tasks.
    pub async fn select_goal(&self, goal: Goal) -> DayplanResult<Vec<Task>> {
        let goal_id = goal.id.clone();
        self.dispatch(GoalAction::Selected(goal));
        self.fetch_tasks(&goal_id).await
    }

    /// Replace the task list with the tasks of `goal_id`.
    pub async fn fetch_tasks(&self, goal_id: &GoalId) -> DayplanResult<Vec<Task>> {
        let seq = self.state().begin();
        debug!(seq = seq.get(), %goal_id, "fetching tasks");

        let result = self
            .backend
            .list_tasks(goal_id)
            .await
            .and_then(|body| wire::decode_list(body, "task", wire::decode_task));

        match result {
            Ok(tasks) => {
                let applied = self.dispatch(GoalAction::TasksFetched {
                    seq,
                    goal_id: goal_id.clone(),
                    tasks: tasks.clone(),
                });
                if applied == Applied::Stale {
                    debug!(seq = seq.get(), %goal_id, "discarded tasks for superseded goal");
                }
                Ok(tasks)
            }
            Err(e) => {
                self.fail(Operation::FetchTasks, seq, GoalResource::Tasks, &e);
                Err(e)
            }
        }
    }
}
