// src/handlers/embed.rs
//
// Página HTML mínima para incorporar um relatório público (iframe).
// Só tabelas de resumo; gráficos ficam a cargo do front-end.

use std::fmt::Write;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    common::error::AppError,
    config::AppState,
    models::report::{PublicReportResponse, ReportData},
};

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="robots" content="noindex">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 1.5rem; color: #111; }}
h1 {{ font-size: 1.25rem; margin-bottom: .25rem; }}
h2 {{ font-size: 1rem; margin-top: 1.5rem; }}
p.range {{ color: #666; margin-top: 0; }}
table {{ border-collapse: collapse; min-width: 320px; }}
th, td {{ border-bottom: 1px solid #e5e5e5; padding: .4rem .75rem; text-align: left; }}
.center {{ min-height: 400px; display: flex; flex-direction: column; align-items: center; justify-content: center; text-align: center; }}
</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape_html(title),
        body = body
    )
}

/// Tabela simples; células já escapadas.
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut html = String::from("<table><thead><tr>");
    for h in headers {
        let _ = write!(html, "<th>{}</th>", escape_html(h));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", cell);
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn pairs(rows: Vec<(&str, String)>) -> String {
    table(
        &["Metric", "Value"],
        rows.into_iter().map(|(k, v)| vec![escape_html(k), escape_html(&v)]).collect(),
    )
}

pub fn render_report(report: &PublicReportResponse) -> String {
    let title = report
        .title
        .clone()
        .unwrap_or_else(|| report.report_type.label().to_string());

    let mut body = format!(
        "<h1>{}</h1><p class=\"range\">{} to {}</p>",
        escape_html(&title),
        report.date_range.from,
        report.date_range.to
    );

    match &report.data {
        None => body.push_str("<p>No data available for this report.</p>"),
        Some(ReportData::AttendanceOverview(o)) => {
            body.push_str(&pairs(vec![
                ("Total check-ins", o.summary.total_check_ins.to_string()),
                ("Average daily present", o.summary.avg_daily_present.to_string()),
                ("Average daily absent", o.summary.avg_daily_absent.to_string()),
                ("On leave", o.summary.on_leave.to_string()),
                ("Total employees", o.summary.total_employees.to_string()),
            ]));
            body.push_str("<h2>Daily trend</h2>");
            body.push_str(&table(
                &["Date", "Check-ins", "Present", "Absent"],
                o.daily_trend
                    .iter()
                    .map(|d| {
                        vec![
                            d.date.to_string(),
                            d.check_ins.to_string(),
                            d.unique_employees.to_string(),
                            d.absent.to_string(),
                        ]
                    })
                    .collect(),
            ));
        }
        Some(ReportData::DepartmentAnalytics(a)) => {
            body.push_str(&pairs(vec![(
                "Overall attendance rate",
                format!("{}%", a.overall_attendance_rate),
            )]));
            body.push_str("<h2>Departments</h2>");
            body.push_str(&table(
                &["Department", "Employees", "Attendance", "Avg late (min)", "Leave"],
                a.departments
                    .iter()
                    .map(|d| {
                        vec![
                            escape_html(&d.name),
                            d.employee_count.to_string(),
                            format!("{}%", d.attendance_rate),
                            d.avg_late_minutes.to_string(),
                            format!("{}%", d.leave_rate),
                        ]
                    })
                    .collect(),
            ));
        }
        Some(ReportData::LeaveAnalytics(l)) => {
            body.push_str(&pairs(vec![
                ("Applied", l.summary.total_applied.to_string()),
                ("Approved", l.summary.total_approved.to_string()),
                ("Rejected", l.summary.total_rejected.to_string()),
                ("Pending", l.summary.total_pending.to_string()),
            ]));
            body.push_str("<h2>By type</h2>");
            body.push_str(&table(
                &["Type", "Requests", "Days"],
                l.by_type
                    .iter()
                    .map(|t| vec![escape_html(&t.name), t.count.to_string(), t.total_days.to_string()])
                    .collect(),
            ));
        }
        Some(ReportData::PunctualityOvertime(p)) => {
            body.push_str(&pairs(vec![
                ("Late arrivals", p.summary.total_late_arrivals.to_string()),
                ("Early departures", p.summary.total_early_departures.to_string()),
                ("Overtime hours", p.summary.total_overtime_hours.to_string()),
            ]));
            body.push_str("<h2>Most late employees</h2>");
            body.push_str(&table(
                &["Employee", "Late count", "Avg late (min)"],
                p.top_late_employees
                    .iter()
                    .map(|e| vec![escape_html(&e.name), e.late_count.to_string(), e.avg_late_minutes.to_string()])
                    .collect(),
            ));
        }
        Some(ReportData::EmployeeDetail(e)) => {
            body.push_str(&pairs(vec![
                ("Employee", e.employee.name.clone()),
                ("Code", e.employee.code.clone()),
                ("Department", e.employee.department.clone()),
            ]));
            body.push_str("<h2>Monthly summary</h2>");
            body.push_str(&table(
                &["Month", "Days present", "Days late", "Days on leave"],
                e.monthly_summary
                    .iter()
                    .map(|m| {
                        vec![
                            escape_html(&m.month),
                            m.days_present.to_string(),
                            m.days_late.to_string(),
                            m.days_on_leave.to_string(),
                        ]
                    })
                    .collect(),
            ));
            body.push_str("<h2>Leave balance</h2>");
            body.push_str(&table(
                &["Type", "Total", "Used", "Remaining"],
                e.leave_balance
                    .iter()
                    .map(|b| {
                        vec![
                            escape_html(&b.leave_type),
                            b.total.to_string(),
                            b.used.to_string(),
                            b.remaining.to_string(),
                        ]
                    })
                    .collect(),
            ));
        }
    }

    page(&title, &body)
}

fn message_page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        "<div class=\"center\"><h1>{}</h1><p>{}</p></div>",
        escape_html(title),
        escape_html(message)
    );
    (status, Html(page(title, &body))).into_response()
}

// GET /embed/{token}
#[utoipa::path(
    get,
    path = "/embed/{token}",
    tag = "Public Reports",
    params(("token" = String, Path, description = "Token do link público")),
    responses(
        (status = 200, description = "Widget HTML", body = String, content_type = "text/html"),
        (status = 404, description = "Token inexistente ou desativado"),
        (status = 410, description = "Link expirado")
    )
)]
pub async fn embed_report(State(app_state): State<AppState>, Path(token): Path<String>) -> Response {
    match app_state.report_service.public_report(&token, Utc::now()).await {
        Ok(report) => (
            [(header::CACHE_CONTROL, "public, max-age=300")],
            Html(render_report(&report)),
        )
            .into_response(),
        Err(AppError::ShareExpired) => message_page(
            StatusCode::GONE,
            "Report Expired",
            "This shared report has expired. Please contact the report owner for a new link.",
        ),
        Err(AppError::NotFound(_)) => message_page(
            StatusCode::NOT_FOUND,
            "Report Not Found",
            "This report link does not exist or has been revoked.",
        ),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{
        DateRange, DepartmentAnalytics, DepartmentStat, ReportKind,
    };
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange {
            from: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>\"R&D\"</b>"), "&lt;b&gt;&quot;R&amp;D&quot;&lt;/b&gt;");
    }

    #[test]
    fn title_falls_back_to_report_label() {
        let report = PublicReportResponse {
            report_type: ReportKind::EmployeeDetail,
            title: None,
            date_range: range(),
            data: None,
        };
        let html = render_report(&report);
        assert!(html.contains("<h1>Employee Detail</h1>"));
        assert!(html.contains("No data available"));
        assert!(html.contains("2026-03-01 to 2026-03-31"));
    }

    #[test]
    fn department_names_are_escaped() {
        let report = PublicReportResponse {
            report_type: ReportKind::DepartmentAnalytics,
            title: Some("Q1 <draft>".into()),
            date_range: range(),
            data: Some(ReportData::DepartmentAnalytics(DepartmentAnalytics {
                departments: vec![DepartmentStat {
                    name: "<script>".into(),
                    employee_count: 3,
                    attendance_rate: 80,
                    avg_late_minutes: 4,
                    leave_rate: 5,
                }],
                overall_attendance_rate: 80,
            })),
        };
        let html = render_report(&report);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Q1 &lt;draft&gt;"));
        assert!(html.contains("80%"));
    }
}
