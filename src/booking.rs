//! Appointment booking wizard: doctor → date/time → details → commit.
//!
//! The draft lives for as long as the `book-appointment` view is active. It is
//! reset on entering the view, on leaving it, and after a commit. Forward
//! moves are gated by per-step guards; a rejected move leaves the draft
//! untouched and reports `BookingError::GuardNotSatisfied`.
//!
//! Nothing is persisted: `commit` hands a confirmation to the notifier and
//! returns control to the patient dashboard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::DoctorCatalog;
use crate::clock::Clock;
use crate::models::{Doctor, View};
use crate::navigation::{Navigator, ViewLifecycle};
use crate::notify::{Notice, Notifier};

pub const CONSULTATION_TYPE: &str = "Video Consultation";

/// Date format of the confirmation message, e.g. "Mon Dec 16 2024".
const CONFIRMATION_DATE_FORMAT: &str = "%a %b %d %Y";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    SelectingDoctor,
    SelectingSchedule,
    EnteringDetails,
}

impl BookingStep {
    pub const COUNT: u8 = 3;

    /// 1-based position, as shown in "Step 2 of 3".
    pub fn number(self) -> u8 {
        match self {
            Self::SelectingDoctor => 1,
            Self::SelectingSchedule => 2,
            Self::EnteringDetails => 3,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::SelectingDoctor => Some(Self::SelectingSchedule),
            Self::SelectingSchedule => Some(Self::EnteringDetails),
            Self::EnteringDetails => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            Self::SelectingDoctor => None,
            Self::SelectingSchedule => Some(Self::SelectingDoctor),
            Self::EnteringDetails => Some(Self::SelectingSchedule),
        }
    }
}

/// The in-progress, not yet committed appointment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub step: BookingStep,
    pub doctor: Option<Doctor>,
    pub date: Option<NaiveDate>,
    /// Slot label; empty until chosen.
    pub time: String,
    pub symptoms: String,
    pub emergency_contact: String,
    pub insurance_provider: String,
}

impl BookingDraft {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            step: BookingStep::SelectingDoctor,
            doctor: None,
            date: Some(today),
            time: String::new(),
            symptoms: String::new(),
            emergency_contact: String::new(),
            insurance_provider: String::new(),
        }
    }

    pub fn has_time(&self) -> bool {
        !self.time.trim().is_empty()
    }

    fn schedule_complete(&self) -> bool {
        self.date.is_some() && self.has_time()
    }

    /// Guard for leaving the current step forwards.
    fn advance_guard(&self) -> Result<BookingStep, Guard> {
        match self.step {
            BookingStep::SelectingDoctor if self.doctor.is_none() => Err(Guard::DoctorSelected),
            BookingStep::SelectingSchedule if !self.schedule_complete() => {
                Err(Guard::ScheduleSelected)
            }
            step => step.next().ok_or(Guard::BeforeFinalStep),
        }
    }

    fn commit_guard(&self) -> Result<(&Doctor, NaiveDate), Guard> {
        if self.step != BookingStep::EnteringDetails {
            return Err(Guard::AtFinalStep);
        }
        let doctor = self.doctor.as_ref().ok_or(Guard::DoctorSelected)?;
        match self.date {
            Some(date) if self.has_time() => Ok((doctor, date)),
            _ => Err(Guard::ScheduleSelected),
        }
    }
}

/// Precondition that must hold before a wizard transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// A doctor has been chosen.
    DoctorSelected,
    /// Both a date and a time slot have been chosen.
    ScheduleSelected,
    /// `advance` is not available on the last step; use `commit`.
    BeforeFinalStep,
    /// `commit` is only available on the last step.
    AtFinalStep,
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::DoctorSelected => "no doctor selected",
            Self::ScheduleSelected => "date and time not both selected",
            Self::BeforeFinalStep => "already on the final step",
            Self::AtFinalStep => "not on the final step",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Guard not satisfied: {0}")]
    GuardNotSatisfied(Guard),
}

impl From<Guard> for BookingError {
    fn from(guard: Guard) -> Self {
        Self::GuardNotSatisfied(guard)
    }
}

/// Record produced by a successful commit, for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub id: Uuid,
    pub doctor_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub time: String,
    pub price: u32,
    pub consultation_type: String,
}

impl BookingConfirmation {
    pub fn notice(&self) -> Notice {
        Notice::new(
            "Appointment Booked!",
            format!(
                "Your appointment with {} is confirmed for {} at {}.",
                self.doctor_name,
                self.date.format(CONFIRMATION_DATE_FORMAT),
                self.time
            ),
        )
    }
}

/// Appointment summary shown on the details step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSummary {
    pub doctor_name: String,
    pub specialty: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub consultation_type: String,
    pub total_cost: u32,
}

/// Outcome of a backwards move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    /// Moved to the given step.
    Step(BookingStep),
    /// Left the wizard for the landing page.
    Exited,
}

// ═══════════════════════════════════════════════════════════
// BookingController
// ═══════════════════════════════════════════════════════════

pub struct BookingController {
    navigator: Arc<Navigator>,
    catalog: Arc<dyn DoctorCatalog>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    draft: Mutex<BookingDraft>,
}

impl BookingController {
    pub fn new(
        navigator: Arc<Navigator>,
        catalog: Arc<dyn DoctorCatalog>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let draft = BookingDraft::fresh(clock.today());
        Self {
            navigator,
            catalog,
            clock,
            notifier,
            draft: Mutex::new(draft),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BookingDraft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Reads ───────────────────────────────────────────────

    pub fn draft(&self) -> BookingDraft {
        self.lock().clone()
    }

    pub fn step(&self) -> BookingStep {
        self.lock().step
    }

    pub fn doctors(&self) -> Vec<Doctor> {
        self.catalog.list_doctors()
    }

    pub fn time_slots(&self) -> Vec<String> {
        self.catalog.time_slots()
    }

    /// Past dates cannot be booked.
    pub fn is_date_selectable(&self, date: NaiveDate) -> bool {
        date >= self.clock.today()
    }

    /// Whether `advance` would currently succeed. Renderers use this to
    /// disable the forward control.
    pub fn can_advance(&self) -> bool {
        self.lock().advance_guard().is_ok()
    }

    pub fn summary(&self) -> Option<BookingSummary> {
        let draft = self.lock();
        let doctor = draft.doctor.as_ref()?;
        Some(BookingSummary {
            doctor_name: doctor.name.clone(),
            specialty: doctor.specialty.clone(),
            date: draft.date,
            time: draft.time.clone(),
            consultation_type: CONSULTATION_TYPE.to_string(),
            total_cost: doctor.price,
        })
    }

    // ── Field edits (legal in every step) ───────────────────

    pub fn select_doctor(&self, doctor: Doctor) {
        tracing::debug!(doctor = %doctor.name, "Doctor selected");
        self.lock().doctor = Some(doctor);
    }

    /// `None` clears the date.
    pub fn select_date(&self, date: Option<NaiveDate>) {
        self.lock().date = date;
    }

    /// An empty label clears the slot.
    pub fn select_time(&self, time: impl Into<String>) {
        self.lock().time = time.into();
    }

    pub fn set_symptoms(&self, symptoms: impl Into<String>) {
        self.lock().symptoms = symptoms.into();
    }

    pub fn set_emergency_contact(&self, contact: impl Into<String>) {
        self.lock().emergency_contact = contact.into();
    }

    pub fn set_insurance_provider(&self, provider: impl Into<String>) {
        self.lock().insurance_provider = provider.into();
    }

    // ── Transitions ─────────────────────────────────────────

    pub fn advance(&self) -> Result<BookingStep, BookingError> {
        let mut draft = self.lock();
        match draft.advance_guard() {
            Ok(next) => {
                draft.step = next;
                tracing::debug!(step = next.number(), "Booking advanced");
                Ok(next)
            }
            Err(guard) => {
                tracing::debug!(step = draft.step.number(), %guard, "Booking advance rejected");
                Err(guard.into())
            }
        }
    }

    /// Step back, or leave the wizard for `home` from the first step.
    pub fn retreat(&self) -> Retreat {
        let previous = {
            let mut draft = self.lock();
            let previous = draft.step.previous();
            if let Some(step) = previous {
                draft.step = step;
            }
            previous
        };

        match previous {
            Some(step) => Retreat::Step(step),
            None => {
                self.navigator.navigate(View::Home);
                Retreat::Exited
            }
        }
    }

    /// Confirm the appointment from the details step.
    ///
    /// On success the draft is reset, the confirmation is delivered to the
    /// notifier and the patient dashboard becomes active.
    pub fn commit(&self) -> Result<BookingConfirmation, BookingError> {
        let confirmation = {
            let mut draft = self.lock();
            let (doctor, date) = match draft.commit_guard() {
                Ok(found) => found,
                Err(guard) => {
                    tracing::debug!(step = draft.step.number(), %guard, "Booking commit rejected");
                    return Err(guard.into());
                }
            };
            let confirmation = BookingConfirmation {
                id: Uuid::new_v4(),
                doctor_name: doctor.name.clone(),
                specialty: doctor.specialty.clone(),
                date,
                time: draft.time.clone(),
                price: doctor.price,
                consultation_type: CONSULTATION_TYPE.to_string(),
            };
            *draft = BookingDraft::fresh(self.clock.today());
            confirmation
        };

        tracing::info!(
            id = %confirmation.id,
            doctor = %confirmation.doctor_name,
            date = %confirmation.date,
            time = %confirmation.time,
            "Appointment booked"
        );
        self.notifier.deliver(&confirmation.notice());
        self.navigator.navigate(View::PatientDashboard);
        Ok(confirmation)
    }

    /// Discard the draft.
    pub fn reset(&self) {
        *self.lock() = BookingDraft::fresh(self.clock.today());
    }
}

impl ViewLifecycle for BookingController {
    fn on_enter(&self) {
        self.reset();
    }

    fn on_exit(&self) {
        self.reset();
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
