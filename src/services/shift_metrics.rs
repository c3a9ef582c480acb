// src/services/shift_metrics.rs
//
// Cálculo de atraso / saída antecipada / hora extra a partir do turno.
// Turnos que atravessam a meia-noite não são suportados: assume-se início <= fim no mesmo dia.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::{
    attendance::{AttendanceMetrics, AttendanceType},
    shift::Shift,
};

/// Janela do turno em minutos desde a meia-noite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start_minutes: i32,
    pub end_minutes: i32,
    pub grace_minutes: i32,
}

impl ShiftWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, grace_minutes: i32) -> Self {
        Self {
            start_minutes: minutes_since_midnight(start),
            end_minutes: minutes_since_midnight(end),
            grace_minutes,
        }
    }

    pub fn grace_end(&self) -> i32 {
        self.start_minutes + self.grace_minutes
    }
}

impl From<&Shift> for ShiftWindow {
    fn from(shift: &Shift) -> Self {
        ShiftWindow::new(shift.start_time, shift.end_time, shift.grace_period_minutes)
    }
}

/// Segundos são descartados: 09:20:59 conta como 09:20.
pub fn minutes_since_midnight(t: NaiveTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}

/// Horário de parede do instante capturado no fuso da unidade.
/// Fuso desconhecido cai para UTC.
pub fn local_wall_clock(captured_at: DateTime<Utc>, timezone: &str) -> NaiveTime {
    match timezone.parse::<Tz>() {
        Ok(tz) => captured_at.with_timezone(&tz).time(),
        Err(_) => {
            tracing::warn!("⚠️ Fuso horário desconhecido '{}', usando UTC.", timezone);
            captured_at.time()
        }
    }
}

/// Sem turno atribuído: tudo falso/nulo (não existe turno padrão implícito).
pub fn compute_metrics(
    shift: Option<&ShiftWindow>,
    captured: NaiveTime,
    kind: AttendanceType,
) -> AttendanceMetrics {
    let mut metrics = AttendanceMetrics::default();
    let Some(shift) = shift else {
        return metrics;
    };

    let captured = minutes_since_midnight(captured);

    match kind {
        AttendanceType::CheckIn => {
            // A tolerância só decide a flag; o atraso conta desde o início do turno.
            if captured > shift.grace_end() {
                metrics.is_late = true;
                metrics.late_minutes = Some(captured - shift.start_minutes);
            }
        }
        AttendanceType::CheckOut => {
            if captured < shift.end_minutes {
                metrics.is_early_departure = true;
                metrics.early_departure_minutes = Some(shift.end_minutes - captured);
            } else if captured > shift.end_minutes {
                metrics.overtime_minutes = Some(captured - shift.end_minutes);
            }
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn office() -> ShiftWindow {
        ShiftWindow::new(hm(9, 0), hm(18, 0), 15)
    }

    #[test]
    fn check_in_after_grace_is_late_from_shift_start() {
        let m = compute_metrics(Some(&office()), hm(9, 20), AttendanceType::CheckIn);
        assert!(m.is_late);
        assert_eq!(m.late_minutes, Some(20));
    }

    #[test]
    fn check_in_within_grace_is_on_time() {
        let m = compute_metrics(Some(&office()), hm(9, 10), AttendanceType::CheckIn);
        assert!(!m.is_late);
        assert_eq!(m.late_minutes, None);
    }

    #[test]
    fn grace_boundary_is_not_late() {
        let on_edge = compute_metrics(Some(&office()), hm(9, 15), AttendanceType::CheckIn);
        assert!(!on_edge.is_late);

        let past_edge = compute_metrics(Some(&office()), hm(9, 16), AttendanceType::CheckIn);
        assert!(past_edge.is_late);
        assert_eq!(past_edge.late_minutes, Some(16));
    }

    #[test]
    fn late_flag_matches_grace_rule_for_every_minute() {
        let shift = ShiftWindow::new(hm(8, 30), hm(17, 0), 10);
        for minute in 0..(24 * 60) {
            let t = hm(minute / 60, minute % 60);
            let m = compute_metrics(Some(&shift), t, AttendanceType::CheckIn);
            let expected_late = minute as i32 > shift.grace_end();
            assert_eq!(m.is_late, expected_late, "minuto {}", minute);
            if expected_late {
                assert_eq!(m.late_minutes, Some(minute as i32 - shift.start_minutes));
            } else {
                assert_eq!(m.late_minutes, None);
            }
        }
    }

    #[test]
    fn check_out_is_early_or_overtime_never_both() {
        let shift = office();
        for minute in 0..(24 * 60) {
            let t = hm(minute / 60, minute % 60);
            let m = compute_metrics(Some(&shift), t, AttendanceType::CheckOut);
            let overtime = m.overtime_minutes.is_some_and(|v| v > 0);
            assert!(!(m.is_early_departure && overtime), "minuto {}", minute);
            assert!(!m.is_late);
        }
    }

    #[test]
    fn check_out_cases() {
        let early = compute_metrics(Some(&office()), hm(17, 30), AttendanceType::CheckOut);
        assert!(early.is_early_departure);
        assert_eq!(early.early_departure_minutes, Some(30));
        assert_eq!(early.overtime_minutes, None);

        let overtime = compute_metrics(Some(&office()), hm(19, 45), AttendanceType::CheckOut);
        assert!(!overtime.is_early_departure);
        assert_eq!(overtime.overtime_minutes, Some(105));

        let exact = compute_metrics(Some(&office()), hm(18, 0), AttendanceType::CheckOut);
        assert_eq!(exact, AttendanceMetrics::default());
    }

    #[test]
    fn no_shift_means_no_metrics() {
        for kind in [AttendanceType::CheckIn, AttendanceType::CheckOut] {
            assert_eq!(compute_metrics(None, hm(23, 59), kind), AttendanceMetrics::default());
        }
    }

    #[test]
    fn seconds_are_truncated() {
        let t = NaiveTime::from_hms_opt(9, 15, 59).unwrap();
        let m = compute_metrics(Some(&office()), t, AttendanceType::CheckIn);
        assert!(!m.is_late);
    }

    #[test]
    fn wall_clock_follows_location_timezone() {
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 12, 20, 0).unwrap();
        assert_eq!(local_wall_clock(at, "America/Sao_Paulo"), hm(9, 20));
        assert_eq!(local_wall_clock(at, "UTC"), hm(12, 20));
        assert_eq!(local_wall_clock(at, "Mars/Olympus"), hm(12, 20));
    }
}
