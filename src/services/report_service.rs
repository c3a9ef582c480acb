// src/services/report_service.rs
//
// Agregações dos relatórios + links públicos de compartilhamento.
// As mesmas funções atendem o painel autenticado e o token público:
// o `company_id` é sempre recebido explicitamente.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::{
        dates::{current_year, day_bounds, default_report_range, inclusive_days},
        error::AppError,
    },
    db::{
        attendance_repo::percentage,
        report_repo::{DailyRow, DepartmentRow, LateRow, MonthLeaveRow, MonthRow, ReportWindow},
        ReportRepository,
    },
    middleware::tenancy::TenantContext,
    models::report::{
        AttendanceOverview, CreateSharePayload, CreateShareResponse, DailyTrendPoint, DateRange, DepartmentAnalytics,
        DepartmentStat, EmployeeDetailReport, EmployeeHeader, FilterOptions, LateEmployee, LeaveAnalytics,
        MonthlyAttendance, OverviewSummary, PieSlice, PublicReportResponse, PunctualityReport, ReportData,
        ReportFilters, ReportKind, ReportShare,
    },
};

// =============================================================================
//  CÁLCULOS (puros)
// =============================================================================

/// Datas ausentes caem no padrão (últimos 30 dias até hoje).
pub fn resolve_range(filters: &ReportFilters, today: NaiveDate) -> Result<DateRange, AppError> {
    let (default_from, default_to) = default_report_range(today);
    let from = filters.date_from.unwrap_or(default_from);
    let to = filters.date_to.unwrap_or(default_to);
    if from > to {
        return Err(AppError::BadRequest("dateFrom must be on or before dateTo.".into()));
    }
    day_bounds(from, to)?;
    Ok(DateRange { from, to })
}

fn round_f64(value: f64) -> i64 {
    value.round() as i64
}

/// Presença média considera apenas dias com algum registro.
pub fn build_overview(days: Vec<DailyRow>, total_employees: i64, on_leave: i64) -> AttendanceOverview {
    let total_check_ins: i64 = days.iter().map(|d| d.check_ins).sum();
    let days_with_data = days.len().max(1) as f64;
    let avg_daily_present = round_f64(total_check_ins as f64 / days_with_data);
    let avg_daily_absent = (total_employees - avg_daily_present).max(0);

    let daily_trend = days
        .into_iter()
        .map(|d| DailyTrendPoint {
            date: d.day,
            check_ins: d.check_ins,
            unique_employees: d.unique_employees,
            absent: (total_employees - d.unique_employees).max(0),
        })
        .collect();

    AttendanceOverview {
        daily_trend,
        summary: OverviewSummary {
            total_check_ins,
            avg_daily_present,
            avg_daily_absent,
            on_leave,
            total_employees,
        },
        present_absent_pie: vec![
            PieSlice { name: "Present".into(), value: avg_daily_present },
            PieSlice { name: "Absent".into(), value: avg_daily_absent },
            PieSlice { name: "On Leave".into(), value: on_leave },
        ],
    }
}

/// Denominador: funcionários ativos × dias do período (sem excluir fins de semana).
pub fn build_department_analytics(rows: Vec<DepartmentRow>, range_days: i64) -> DepartmentAnalytics {
    let departments: Vec<DepartmentStat> = rows
        .into_iter()
        .map(|row| {
            let max_possible = row.employee_count * range_days;
            DepartmentStat {
                name: row.name,
                employee_count: row.employee_count,
                attendance_rate: percentage(row.present_days, max_possible),
                avg_late_minutes: if row.employee_count == 0 { 0 } else { round_f64(row.avg_late_minutes) },
                leave_rate: percentage(row.leave_days, max_possible),
            }
        })
        .collect();

    let overall_attendance_rate = if departments.is_empty() {
        0
    } else {
        let sum: i64 = departments.iter().map(|d| d.attendance_rate).sum();
        round_f64(sum as f64 / departments.len() as f64)
    };

    DepartmentAnalytics { departments, overall_attendance_rate }
}

pub fn build_late_employees(rows: Vec<LateRow>) -> Vec<LateEmployee> {
    rows.into_iter()
        .map(|r| LateEmployee {
            name: r.name,
            late_count: r.late_count,
            avg_late_minutes: round_f64(r.avg_late_minutes),
        })
        .collect()
}

/// Meses com presença, enriquecidos com os dias de afastamento do mesmo mês.
pub fn build_monthly_summary(months: Vec<MonthRow>, leave_months: Vec<MonthLeaveRow>) -> Vec<MonthlyAttendance> {
    let leave_by_month: HashMap<String, i64> =
        leave_months.into_iter().map(|l| (l.month, l.days_on_leave)).collect();

    months
        .into_iter()
        .map(|m| MonthlyAttendance {
            days_on_leave: leave_by_month.get(&m.month).copied().unwrap_or(0),
            month: m.month,
            days_present: m.days_present,
            days_late: m.days_late,
        })
        .collect()
}

#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
}

impl ReportService {
    pub fn new(report_repo: ReportRepository) -> Self {
        Self { report_repo }
    }

    fn window(company_id: Uuid, range: DateRange, filters: &ReportFilters) -> ReportWindow {
        ReportWindow {
            company_id,
            from: range.from,
            to: range.to,
            department_id: filters.department_id,
            location_id: filters.location_id,
        }
    }

    // =============================================================================
    //  OS CINCO RELATÓRIOS
    // =============================================================================

    pub async fn attendance_overview(
        &self,
        company_id: Uuid,
        range: DateRange,
        filters: &ReportFilters,
    ) -> Result<AttendanceOverview, AppError> {
        let w = Self::window(company_id, range, filters);
        let days = self.report_repo.daily_check_ins(&w).await?;
        let total_employees = self.report_repo.active_employee_count(&w).await?;
        let on_leave = self.report_repo.approved_leaves_overlapping(&w).await?;
        Ok(build_overview(days, total_employees, on_leave))
    }

    pub async fn department_analytics(
        &self,
        company_id: Uuid,
        range: DateRange,
        filters: &ReportFilters,
    ) -> Result<DepartmentAnalytics, AppError> {
        let w = Self::window(company_id, range, filters);
        let rows = self.report_repo.department_rows(&w).await?;
        Ok(build_department_analytics(rows, inclusive_days(range.from, range.to)))
    }

    pub async fn leave_analytics(
        &self,
        company_id: Uuid,
        range: DateRange,
        filters: &ReportFilters,
    ) -> Result<LeaveAnalytics, AppError> {
        let w = Self::window(company_id, range, filters);
        Ok(LeaveAnalytics {
            by_type: self.report_repo.leaves_by_type(&w).await?,
            monthly_trend: self.report_repo.leaves_by_month(&w).await?,
            summary: self.report_repo.leave_summary(&w).await?,
        })
    }

    pub async fn punctuality(
        &self,
        company_id: Uuid,
        range: DateRange,
        filters: &ReportFilters,
    ) -> Result<PunctualityReport, AppError> {
        let w = Self::window(company_id, range, filters);
        Ok(PunctualityReport {
            top_late_employees: build_late_employees(self.report_repo.top_late(&w).await?),
            weekly_trend: self.report_repo.weekly_punctuality(&w).await?,
            summary: self.report_repo.punctuality_summary(&w).await?,
        })
    }

    pub async fn employee_detail(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        range: DateRange,
    ) -> Result<EmployeeDetailReport, AppError> {
        let header = self
            .report_repo
            .employee_header(company_id, employee_id)
            .await?
            .ok_or(AppError::NotFound("Employee"))?;

        let w = Self::window(company_id, range, &ReportFilters::default());
        let months = self.report_repo.employee_months(&w, employee_id).await?;
        let leave_months = self.report_repo.employee_leave_months(&w, employee_id).await?;

        Ok(EmployeeDetailReport {
            employee: EmployeeHeader {
                name: header.name,
                code: header.code,
                department: header.department.unwrap_or_else(|| "N/A".to_string()),
            },
            monthly_summary: build_monthly_summary(months, leave_months),
            leave_balance: self
                .report_repo
                .employee_balances(company_id, employee_id, current_year(Utc::now()))
                .await?,
            recent_logs: self.report_repo.employee_recent_logs(&w, employee_id).await?,
        })
    }

    /// Despacho por tipo. `employee_detail` sem funcionário não tem dados.
    pub async fn build(
        &self,
        kind: ReportKind,
        company_id: Uuid,
        range: DateRange,
        filters: &ReportFilters,
    ) -> Result<Option<ReportData>, AppError> {
        let data = match kind {
            ReportKind::AttendanceOverview => {
                ReportData::AttendanceOverview(self.attendance_overview(company_id, range, filters).await?)
            }
            ReportKind::DepartmentAnalytics => {
                ReportData::DepartmentAnalytics(self.department_analytics(company_id, range, filters).await?)
            }
            ReportKind::LeaveAnalytics => {
                ReportData::LeaveAnalytics(self.leave_analytics(company_id, range, filters).await?)
            }
            ReportKind::PunctualityOvertime => {
                ReportData::PunctualityOvertime(self.punctuality(company_id, range, filters).await?)
            }
            ReportKind::EmployeeDetail => match filters.employee_id {
                Some(employee_id) => {
                    ReportData::EmployeeDetail(self.employee_detail(company_id, employee_id, range).await?)
                }
                None => return Ok(None),
            },
        };
        Ok(Some(data))
    }

    pub async fn filter_options(&self, company_id: Uuid) -> Result<FilterOptions, AppError> {
        Ok(FilterOptions {
            departments: self.report_repo.filter_departments(company_id).await?,
            locations: self.report_repo.filter_locations(company_id).await?,
            employees: self.report_repo.filter_employees(company_id).await?,
        })
    }

    // =============================================================================
    //  LINKS PÚBLICOS
    // =============================================================================

    pub async fn create_share(
        &self,
        ctx: &TenantContext,
        payload: &CreateSharePayload,
    ) -> Result<CreateShareResponse, AppError> {
        // Filtros congelados precisam resolver hoje; o link público não deve nascer quebrado.
        if let Some(filters) = &payload.filters {
            resolve_range(filters, Utc::now().date_naive())?;
        }

        let filters = payload
            .filters
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        let token = Uuid::new_v4().to_string();
        let title = payload.title.as_deref().map(str::trim).filter(|t| !t.is_empty());

        let share = self
            .report_repo
            .create_share(
                ctx.company_id,
                ctx.user_id,
                &token,
                payload.report_type,
                filters,
                title,
                payload.expires_at,
            )
            .await?;

        tracing::info!("🔗 Link público criado para {:?} ({})", share.report_type, share.id);
        Ok(CreateShareResponse { success: true, token: share.token })
    }

    pub async fn list_shares(&self, company_id: Uuid) -> Result<Vec<ReportShare>, AppError> {
        self.report_repo.list_active_shares(company_id).await
    }

    pub async fn delete_share(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.report_repo.deactivate_share(company_id, id).await? == 0 {
            return Err(AppError::NotFound("Report share"));
        }
        Ok(())
    }

    /// Resolve o token: inexistente/inativo -> 404, expirado -> 410.
    pub async fn public_report(&self, token: &str, now: DateTime<Utc>) -> Result<PublicReportResponse, AppError> {
        let share = self
            .report_repo
            .find_active_by_token(token)
            .await?
            .ok_or(AppError::NotFound("Report"))?;

        if share.is_expired(now) {
            return Err(AppError::ShareExpired);
        }

        let filters = share.frozen_filters();
        let range = resolve_range(&filters, now.date_naive())?;
        let data = self.build(share.report_type, share.company_id, range, &filters).await?;

        Ok(PublicReportResponse {
            report_type: share.report_type,
            title: share.title,
            date_range: range,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn day(n: u32, check_ins: i64, unique: i64) -> DailyRow {
        DailyRow { day: d(2026, 3, n), check_ins, unique_employees: unique }
    }

    #[test]
    fn range_defaults_and_validation() {
        let today = d(2026, 3, 31);
        let range = resolve_range(&ReportFilters::default(), today).unwrap();
        assert_eq!(range, DateRange { from: d(2026, 3, 1), to: today });

        let filters = ReportFilters { date_from: Some(d(2026, 2, 1)), ..Default::default() };
        assert_eq!(resolve_range(&filters, today).unwrap().from, d(2026, 2, 1));

        let inverted = ReportFilters {
            date_from: Some(d(2026, 3, 10)),
            date_to: Some(d(2026, 3, 1)),
            ..Default::default()
        };
        assert!(resolve_range(&inverted, today).is_err());
    }

    #[test]
    fn date_to_without_successor_is_a_bad_request() {
        let filters: ReportFilters = serde_json::from_str(r#"{"dateTo":"+262142-12-31"}"#).unwrap();
        let err = resolve_range(&filters, d(2026, 3, 31)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.public_message(), "Date is out of range.");
    }

    #[test]
    fn overview_averages_over_days_with_data() {
        let overview = build_overview(vec![day(2, 8, 8), day(3, 11, 9)], 12, 2);
        assert_eq!(overview.summary.total_check_ins, 19);
        // 19 / 2 = 9.5 -> 10
        assert_eq!(overview.summary.avg_daily_present, 10);
        assert_eq!(overview.summary.avg_daily_absent, 2);
        assert_eq!(overview.daily_trend[0].absent, 4);
        assert_eq!(overview.daily_trend[1].absent, 3);

        let names: Vec<_> = overview.present_absent_pie.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Present", "Absent", "On Leave"]);
        assert_eq!(overview.present_absent_pie[2].value, 2);
    }

    #[test]
    fn overview_without_data_and_absent_never_negative() {
        let empty = build_overview(vec![], 5, 0);
        assert_eq!(empty.summary.avg_daily_present, 0);
        assert_eq!(empty.summary.avg_daily_absent, 5);

        let crowded = build_overview(vec![day(2, 30, 7)], 4, 0);
        assert_eq!(crowded.summary.avg_daily_absent, 0);
        assert_eq!(crowded.daily_trend[0].absent, 0);
    }

    #[test]
    fn department_rates_use_employee_days() {
        let rows = vec![
            DepartmentRow {
                name: "Ops".into(),
                employee_count: 4,
                present_days: 30,
                avg_late_minutes: 12.6,
                leave_days: 4,
            },
            DepartmentRow {
                name: "Empty".into(),
                employee_count: 0,
                present_days: 0,
                avg_late_minutes: 0.0,
                leave_days: 0,
            },
        ];
        let analytics = build_department_analytics(rows, 10);
        let ops = &analytics.departments[0];
        assert_eq!(ops.attendance_rate, 75);
        assert_eq!(ops.leave_rate, 10);
        assert_eq!(ops.avg_late_minutes, 13);

        let empty = &analytics.departments[1];
        assert_eq!((empty.attendance_rate, empty.leave_rate, empty.avg_late_minutes), (0, 0, 0));

        // média simples entre departamentos: (75 + 0) / 2 = 37.5 -> 38
        assert_eq!(analytics.overall_attendance_rate, 38);
        assert_eq!(build_department_analytics(vec![], 10).overall_attendance_rate, 0);
    }

    #[test]
    fn monthly_summary_joins_leave_days() {
        let months = vec![
            MonthRow { month: "2026-01".into(), days_present: 20, days_late: 3 },
            MonthRow { month: "2026-02".into(), days_present: 18, days_late: 0 },
        ];
        let leaves = vec![MonthLeaveRow { month: "2026-02".into(), days_on_leave: 2 }];
        let summary = build_monthly_summary(months, leaves);
        assert_eq!(summary[0].days_on_leave, 0);
        assert_eq!(summary[1].days_on_leave, 2);
        assert_eq!(summary[1].days_present, 18);
    }

    #[test]
    fn late_average_is_rounded() {
        let rows = vec![LateRow { name: "Ana Lima".into(), late_count: 3, avg_late_minutes: 17.5 }];
        assert_eq!(build_late_employees(rows)[0].avg_late_minutes, 18);
    }
}
