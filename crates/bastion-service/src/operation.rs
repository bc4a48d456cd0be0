//! Per-operation metadata: a stable name and the role required to run it.

use bastion_core::Role;
use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
  // accounts
  QueryAllAccounts,
  AccountLogin,
  CheckToken,
  AccountRegistry,
  ModifyPassword,
  AccountDestroy,
  AccountLevelMutate,
  // tasks
  QueryAllTasks,
  QueryTaskById,
  QueryExecutorTasks,
  CreateTask,
  UpdateTaskInfo,
  ToggleTaskStatus,
  MutateTaskLevel,
  AssignTask,
  FreezeTask,
  DeleteTask,
  // catalog
  CreateSubstance,
  CreateExecutor,
}

impl Operation {
  /// The minimum role the caller must hold.
  pub fn required_role(self) -> Role {
    use Operation::*;
    match self {
      AccountLogin | CheckToken | AccountRegistry | AccountDestroy
      | QueryAllTasks | QueryTaskById | QueryExecutorTasks => Role::UnLogin,

      ModifyPassword | CreateTask | UpdateTaskInfo | ToggleTaskStatus
      | MutateTaskLevel | AssignTask | CreateSubstance | CreateExecutor => {
        Role::Common
      }

      QueryAllAccounts | AccountLevelMutate | FreezeTask | DeleteTask => {
        Role::Admin
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn names_are_snake_case() {
    assert_eq!(Operation::AccountLogin.to_string(), "account_login");
    assert_eq!(Operation::QueryTaskById.to_string(), "query_task_by_id");
  }

  #[test]
  fn destructive_task_operations_need_admin() {
    assert_eq!(Operation::FreezeTask.required_role(), Role::Admin);
    assert_eq!(Operation::DeleteTask.required_role(), Role::Admin);
    assert_eq!(Operation::ToggleTaskStatus.required_role(), Role::Common);
  }

  #[test]
  fn anonymous_entry_points_stay_open() {
    let open: Vec<_> = Operation::iter()
      .filter(|op| op.required_role() == Role::UnLogin)
      .collect();
    assert!(open.contains(&Operation::AccountLogin));
    assert!(open.contains(&Operation::AccountRegistry));
    assert!(open.contains(&Operation::CheckToken));
    assert!(!open.contains(&Operation::QueryAllAccounts));
  }
}
