// ============================================================================
// DASHBOARD VIEWMODEL - derived views over the appointments collection
// ============================================================================

use crate::models::Appointment;
use crate::state::appointments_store::AppointmentsStore;
use crate::utils::clock::Clock;
use crate::utils::constants::RECENT_ACTIVITY_LIMIT;
use chrono::{DateTime, Utc};
use std::rc::Rc;

const HEALTH_TIPS: [&str; 10] = [
    "Drink at least eight glasses of water a day.",
    "Aim for seven to nine hours of sleep every night.",
    "Take a short walk after meals to help digestion.",
    "Wash your hands before eating and after being outside.",
    "Fill half your plate with vegetables and fruit.",
    "Stand up and stretch for a few minutes every hour.",
    "Wear sunscreen when you spend time outdoors.",
    "Keep a list of your medications and bring it to appointments.",
    "Schedule a routine check-up at least once a year.",
    "Take a few slow, deep breaths when you feel stressed.",
];

/// Appointments with a parseable date, paired with it.
fn dated(appointments: &[Appointment]) -> Vec<(DateTime<Utc>, &Appointment)> {
    appointments
        .iter()
        .filter_map(|a| a.starts_at().map(|at| (at, a)))
        .collect()
}

/// Earliest appointment at or after `now`.
pub fn next_appointment(appointments: &[Appointment], now: DateTime<Utc>) -> Option<Appointment> {
    dated(appointments)
        .into_iter()
        .filter(|(at, _)| *at >= now)
        .min_by_key(|(at, _)| *at)
        .map(|(_, a)| a.clone())
}

/// The `n` appointments with the latest dates, newest first.
pub fn recent_activity(appointments: &[Appointment], n: usize) -> Vec<Appointment> {
    let mut entries = dated(appointments);
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries.into_iter().take(n).map(|(_, a)| a.clone()).collect()
}

/// Future appointments, soonest first.
pub fn upcoming(appointments: &[Appointment], now: DateTime<Utc>) -> Vec<Appointment> {
    let mut entries: Vec<_> = dated(appointments)
        .into_iter()
        .filter(|(at, _)| *at >= now)
        .collect();
    entries.sort_by_key(|(at, _)| *at);
    entries.into_iter().map(|(_, a)| a.clone()).collect()
}

pub fn health_tip(seed: u64) -> &'static str {
    HEALTH_TIPS[(seed % HEALTH_TIPS.len() as u64) as usize]
}

pub struct DashboardViewModel {
    appointments: Rc<AppointmentsStore>,
    clock: Rc<dyn Clock>,
}

impl DashboardViewModel {
    pub fn new(appointments: Rc<AppointmentsStore>, clock: Rc<dyn Clock>) -> Self {
        Self { appointments, clock }
    }

    pub fn next_appointment(&self) -> Option<Appointment> {
        next_appointment(&self.appointments.appointments(), self.clock.now())
    }

    pub fn recent_activity(&self) -> Vec<Appointment> {
        recent_activity(&self.appointments.appointments(), RECENT_ACTIVITY_LIMIT)
    }

    pub fn upcoming(&self) -> Vec<Appointment> {
        upcoming(&self.appointments.appointments(), self.clock.now())
    }

    /// Tip of the day, stable for a whole UTC day.
    pub fn tip_of_the_day(&self) -> &'static str {
        let days = self.clock.now().timestamp().div_euclid(86_400);
        health_tip(days as u64)
    }
}
