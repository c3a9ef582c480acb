// src/services/shift_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        dates::parse_clock,
        db_utils::{ensure_optional_in_company, OwnedTable},
        error::AppError,
    },
    db::{shift_repo::ShiftFields, ShiftRepository},
    models::shift::{AssignShiftPayload, Shift, ShiftListItem, ShiftPayload},
};

const DEFAULT_GRACE_MINUTES: i32 = 15;

/// Converte o payload em campos persistíveis. Turnos que cruzam a meia-noite são recusados.
pub fn shift_fields(payload: &ShiftPayload) -> Result<ShiftFields, AppError> {
    let invalid = || AppError::BadRequest("Invalid time format. Use HH:MM.".into());
    let start_time = parse_clock(payload.start_time.trim()).ok_or_else(invalid)?;
    let end_time = parse_clock(payload.end_time.trim()).ok_or_else(invalid)?;

    if end_time <= start_time {
        return Err(AppError::BadRequest("End time must be after start time.".into()));
    }

    Ok(ShiftFields {
        name: payload.name.trim().to_string(),
        start_time,
        end_time,
        grace_period_minutes: payload.grace_period_minutes.unwrap_or(DEFAULT_GRACE_MINUTES),
        is_default: payload.is_default.unwrap_or(false),
    })
}

#[derive(Clone)]
pub struct ShiftService {
    shift_repo: ShiftRepository,
    pool: PgPool,
}

impl ShiftService {
    pub fn new(shift_repo: ShiftRepository, pool: PgPool) -> Self {
        Self { shift_repo, pool }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<ShiftListItem>, AppError> {
        self.shift_repo.list(company_id).await
    }

    /// Um único turno padrão por empresa: marcar um novo desmarca os demais na mesma transação.
    pub async fn create(&self, company_id: Uuid, payload: &ShiftPayload) -> Result<Shift, AppError> {
        let fields = shift_fields(payload)?;
        let mut tx = self.pool.begin().await?;

        if fields.is_default {
            self.shift_repo.clear_default(&mut *tx, company_id).await?;
        }
        let shift = self.shift_repo.create(&mut *tx, company_id, &fields).await?;

        tx.commit().await?;
        Ok(shift)
    }

    pub async fn update(&self, company_id: Uuid, id: Uuid, payload: &ShiftPayload) -> Result<Shift, AppError> {
        let fields = shift_fields(payload)?;
        let mut tx = self.pool.begin().await?;

        if fields.is_default {
            self.shift_repo.clear_default(&mut *tx, company_id).await?;
        }
        let shift = self
            .shift_repo
            .update(&mut *tx, company_id, id, &fields)
            .await?
            .ok_or(AppError::NotFound("Shift"))?;

        tx.commit().await?;
        Ok(shift)
    }

    /// Funcionários do turno ficam sem turno antes da exclusão.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.shift_repo
            .find(&mut *tx, company_id, id)
            .await?
            .ok_or(AppError::NotFound("Shift"))?;

        let unassigned = self.shift_repo.unassign_employees(&mut *tx, company_id, id).await?;
        self.shift_repo.delete(&mut *tx, company_id, id).await?;

        tx.commit().await?;
        tracing::info!("🗑️ Turno {} removido ({} funcionários sem turno)", id, unassigned);
        Ok(())
    }

    /// `shift_id = None` remove o turno dos funcionários.
    pub async fn assign(&self, company_id: Uuid, payload: &AssignShiftPayload) -> Result<u64, AppError> {
        ensure_optional_in_company(&self.pool, OwnedTable::Shift, payload.shift_id, company_id).await?;
        self.shift_repo
            .assign(company_id, &payload.employee_ids, payload.shift_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn payload(start: &str, end: &str) -> ShiftPayload {
        ShiftPayload {
            name: " Comercial ".into(),
            start_time: start.into(),
            end_time: end.into(),
            grace_period_minutes: None,
            is_default: None,
        }
    }

    #[test]
    fn fields_apply_defaults() {
        let fields = shift_fields(&payload("09:00", "18:00")).unwrap();
        assert_eq!(fields.name, "Comercial");
        assert_eq!(fields.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(fields.end_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(fields.grace_period_minutes, 15);
        assert!(!fields.is_default);
    }

    #[test]
    fn accepts_seconds() {
        assert!(shift_fields(&payload("08:30:00", "17:30:00")).is_ok());
    }

    #[test]
    fn rejects_bad_clock() {
        assert!(matches!(shift_fields(&payload("9h", "18:00")), Err(AppError::BadRequest(_))));
        assert!(matches!(shift_fields(&payload("25:00", "18:00")), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rejects_overnight_and_empty_shifts() {
        assert!(matches!(shift_fields(&payload("22:00", "06:00")), Err(AppError::BadRequest(_))));
        assert!(matches!(shift_fields(&payload("09:00", "09:00")), Err(AppError::BadRequest(_))));
    }
}
