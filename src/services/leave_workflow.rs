// src/services/leave_workflow.rs
//
// Máquina de estados do pedido de afastamento e regras de visibilidade por papel.

use uuid::Uuid;

use crate::models::{auth::Role, leave::LeaveStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveAction {
    Approve,
    Reject,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: LeaveStatus,
    pub action: LeaveAction,
}

impl TransitionError {
    pub fn message(&self) -> &'static str {
        match self.action {
            LeaveAction::Approve => "Only pending requests can be approved.",
            LeaveAction::Reject => "Only pending requests can be rejected.",
            LeaveAction::Cancel => "Only pending or approved requests can be cancelled.",
        }
    }
}

/// pending -> approved | rejected | cancelled; approved -> cancelled. Nada sai de rejected/cancelled.
pub fn transition(from: LeaveStatus, action: LeaveAction) -> Result<LeaveStatus, TransitionError> {
    use LeaveStatus::*;

    match (from, action) {
        (Pending, LeaveAction::Approve) => Ok(Approved),
        (Pending, LeaveAction::Reject) => Ok(Rejected),
        (Pending | Approved, LeaveAction::Cancel) => Ok(Cancelled),
        _ => Err(TransitionError { from, action }),
    }
}

/// Quais pedidos o usuário enxerga (e pode cancelar).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveScope {
    /// super_admin / hr_admin: toda a empresa
    All,
    /// manager: funcionários dos departamentos que gerencia
    Team { manager_user_id: Uuid },
    /// employee: apenas o próprio cadastro
    Own { employee_id: Uuid },
    /// employee sem cadastro vinculado
    Nothing,
}

impl LeaveScope {
    pub fn for_user(role: Role, user_id: Uuid, linked_employee: Option<Uuid>) -> Self {
        match role {
            Role::SuperAdmin | Role::HrAdmin => LeaveScope::All,
            Role::Manager => LeaveScope::Team { manager_user_id: user_id },
            Role::Employee => match linked_employee {
                Some(employee_id) => LeaveScope::Own { employee_id },
                None => LeaveScope::Nothing,
            },
        }
    }

    /// `department_manager` é o gerente do departamento do funcionário dono do pedido.
    pub fn contains(&self, employee_id: Uuid, department_manager: Option<Uuid>) -> bool {
        match *self {
            LeaveScope::All => true,
            LeaveScope::Team { manager_user_id } => department_manager == Some(manager_user_id),
            LeaveScope::Own { employee_id: own } => own == employee_id,
            LeaveScope::Nothing => false,
        }
    }

    /// Parâmetros SQL (gerente, funcionário) para o filtro de listagem.
    pub fn sql_filters(&self) -> (Option<Uuid>, Option<Uuid>) {
        match *self {
            LeaveScope::Team { manager_user_id } => (Some(manager_user_id), None),
            LeaveScope::Own { employee_id } => (None, Some(employee_id)),
            LeaveScope::All | LeaveScope::Nothing => (None, None),
        }
    }
}

/// Aprovar/rejeitar: administradores ou o gerente do departamento do funcionário.
pub fn can_decide(role: Role, user_id: Uuid, department_manager: Option<Uuid>) -> bool {
    role.is_admin() || (role == Role::Manager && department_manager == Some(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use LeaveStatus::*;

    const ALL_STATES: [LeaveStatus; 4] = [Pending, Approved, Rejected, Cancelled];

    #[test]
    fn pending_moves_to_every_terminal_state() {
        assert_eq!(transition(Pending, LeaveAction::Approve), Ok(Approved));
        assert_eq!(transition(Pending, LeaveAction::Reject), Ok(Rejected));
        assert_eq!(transition(Pending, LeaveAction::Cancel), Ok(Cancelled));
    }

    #[test]
    fn approve_and_reject_require_pending() {
        for from in ALL_STATES.into_iter().filter(|s| *s != Pending) {
            let err = transition(from, LeaveAction::Approve).unwrap_err();
            assert_eq!(err.message(), "Only pending requests can be approved.");
            assert!(transition(from, LeaveAction::Reject).is_err());
        }
    }

    #[test]
    fn cancel_only_from_pending_or_approved() {
        assert_eq!(transition(Approved, LeaveAction::Cancel), Ok(Cancelled));
        assert!(transition(Rejected, LeaveAction::Cancel).is_err());
        assert!(transition(Cancelled, LeaveAction::Cancel).is_err());
    }

    #[test]
    fn scope_follows_role() {
        let user = Uuid::new_v4();
        let emp = Uuid::new_v4();
        assert_eq!(LeaveScope::for_user(Role::SuperAdmin, user, None), LeaveScope::All);
        assert_eq!(LeaveScope::for_user(Role::HrAdmin, user, Some(emp)), LeaveScope::All);
        assert_eq!(
            LeaveScope::for_user(Role::Manager, user, Some(emp)),
            LeaveScope::Team { manager_user_id: user }
        );
        assert_eq!(
            LeaveScope::for_user(Role::Employee, user, Some(emp)),
            LeaveScope::Own { employee_id: emp }
        );
        assert_eq!(LeaveScope::for_user(Role::Employee, user, None), LeaveScope::Nothing);
    }

    #[test]
    fn scope_membership() {
        let manager = Uuid::new_v4();
        let other_manager = Uuid::new_v4();
        let emp = Uuid::new_v4();

        assert!(LeaveScope::All.contains(emp, None));

        let team = LeaveScope::Team { manager_user_id: manager };
        assert!(team.contains(emp, Some(manager)));
        assert!(!team.contains(emp, Some(other_manager)));
        assert!(!team.contains(emp, None));

        let own = LeaveScope::Own { employee_id: emp };
        assert!(own.contains(emp, Some(manager)));
        assert!(!own.contains(Uuid::new_v4(), None));

        assert!(!LeaveScope::Nothing.contains(emp, Some(manager)));
    }

    #[test]
    fn only_admins_or_the_department_manager_decide() {
        let manager = Uuid::new_v4();
        assert!(can_decide(Role::SuperAdmin, Uuid::new_v4(), None));
        assert!(can_decide(Role::HrAdmin, Uuid::new_v4(), Some(manager)));
        assert!(can_decide(Role::Manager, manager, Some(manager)));
        assert!(!can_decide(Role::Manager, Uuid::new_v4(), Some(manager)));
        assert!(!can_decide(Role::Employee, manager, Some(manager)));
    }
}
