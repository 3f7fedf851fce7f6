pub mod booking; // Appointment booking wizard
pub mod call; // Video-consultation session lifecycle
pub mod catalog;
pub mod clock;
pub mod config;
pub mod core_state; // Composition root
pub mod dashboard;
pub mod models;
pub mod navigation; // Active view + lifecycle hooks
pub mod notify;
pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{CallConfig, ConfigError};
use crate::core_state::{CoreState, Dependencies};
use crate::models::View;
use crate::scheduler::TokioScheduler;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Install logging and run the scripted walkthrough on a tokio runtime.
pub fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let call_config = CallConfig::from_env()?.with_opening_exchange(
        "Hello Tilak! How are you feeling today?",
        "Hi Doctor, I've been having some headaches lately.",
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let scheduler = Arc::new(TokioScheduler::new(runtime.handle().clone()));
    let state = CoreState::new(Dependencies::new(scheduler).with_call_config(call_config));

    runtime.block_on(walkthrough(&state));
    drop(state);

    tracing::info!("{} finished", config::APP_NAME);
    Ok(())
}

/// Book an appointment, then hold a short consultation.
async fn walkthrough(state: &CoreState) {
    state.navigate(View::PatientDashboard);
    let overview = state.patient_overview();
    tracing::info!(
        upcoming = overview.upcoming.len(),
        confirmed = overview.confirmed_count,
        "Patient dashboard"
    );

    state.navigate(View::BookAppointment);
    let booking = state.booking();
    let Some(doctor) = booking.doctors().into_iter().find(|d| d.available) else {
        tracing::warn!("No doctor available, skipping booking");
        return;
    };
    booking.select_doctor(doctor);
    if let Err(e) = booking.advance() {
        tracing::warn!(error = %e, "Could not leave doctor step");
        return;
    }
    if let Some(slot) = booking.time_slots().into_iter().next() {
        booking.select_time(slot);
    }
    if let Err(e) = booking.advance() {
        tracing::warn!(error = %e, "Could not leave schedule step");
        return;
    }
    booking.set_symptoms("Recurring headaches in the afternoon");
    match booking.commit() {
        Ok(confirmation) => tracing::info!(id = %confirmation.id, "Booking confirmed"),
        Err(e) => tracing::warn!(error = %e, "Booking rejected"),
    }

    state.navigate(View::VideoCall);
    let unit = state.call().config().time_unit;
    let delay = state.call().config().connect_delay();
    tokio::time::sleep(delay + unit * 3 + unit / 2).await;

    state.call().receive_message("Are they worse in the afternoon?");
    state.call().send_message("Better, thanks. The headaches are less frequent.");
    if let Some(snapshot) = state.call().snapshot() {
        match serde_json::to_string(&snapshot) {
            Ok(json) => tracing::debug!(snapshot = %json, "Call state"),
            Err(e) => tracing::warn!(error = %e, "Could not serialize call state"),
        }
    }

    if let Some(summary) = state.call().end_call() {
        tracing::info!(duration = %summary.duration_label, "Consultation finished");
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
}
