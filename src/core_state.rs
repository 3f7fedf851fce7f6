//! Composition root: one navigator shared by the view-scoped controllers.
//!
//! `CoreState` wires every injected capability into the booking and call
//! controllers and attaches their lifecycle hooks to the navigator. Renderers
//! hold a `CoreState` and talk to the controllers through it.

use std::sync::Arc;

use crate::booking::BookingController;
use crate::call::CallController;
use crate::catalog::{DoctorCatalog, StaticCatalog};
use crate::clock::{Clock, SystemClock};
use crate::config::CallConfig;
use crate::dashboard::{self, DashboardSource, DoctorOverview, PatientOverview, StaticDashboard};
use crate::models::View;
use crate::navigation::Navigator;
use crate::notify::{Notifier, TracingNotifier};
use crate::scheduler::Scheduler;

/// Capabilities injected into the controllers.
pub struct Dependencies {
    pub scheduler: Arc<dyn Scheduler>,
    pub catalog: Arc<dyn DoctorCatalog>,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
    pub dashboard: Arc<dyn DashboardSource>,
    pub call_config: CallConfig,
}

impl Dependencies {
    /// Static catalog and dashboards, system clock, notices to the log.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            catalog: Arc::new(StaticCatalog::default()),
            clock: Arc::new(SystemClock),
            notifier: Arc::new(TracingNotifier),
            dashboard: Arc::new(StaticDashboard),
            call_config: CallConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn DoctorCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_call_config(mut self, config: CallConfig) -> Self {
        self.call_config = config;
        self
    }
}

pub struct CoreState {
    navigator: Arc<Navigator>,
    booking: Arc<BookingController>,
    call: Arc<CallController>,
    dashboard: Arc<dyn DashboardSource>,
}

impl CoreState {
    pub fn new(deps: Dependencies) -> Self {
        let navigator = Arc::new(Navigator::new());

        let booking = Arc::new(BookingController::new(
            Arc::clone(&navigator),
            deps.catalog,
            Arc::clone(&deps.clock),
            Arc::clone(&deps.notifier),
        ));
        let call = Arc::new(CallController::new(
            Arc::clone(&navigator),
            deps.scheduler,
            deps.clock,
            deps.notifier,
            deps.call_config,
        ));

        navigator.attach(View::BookAppointment, &booking);
        navigator.attach(View::VideoCall, &call);

        Self {
            navigator,
            booking,
            call,
            dashboard: deps.dashboard,
        }
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    pub fn current_view(&self) -> View {
        self.navigator.current_view()
    }

    pub fn navigate(&self, target: View) {
        self.navigator.navigate(target);
    }

    pub fn booking(&self) -> &BookingController {
        &self.booking
    }

    pub fn call(&self) -> &CallController {
        &self.call
    }

    pub fn patient_overview(&self) -> PatientOverview {
        dashboard::patient_overview(self.dashboard.as_ref())
    }

    pub fn doctor_overview(&self) -> DoctorOverview {
        dashboard::doctor_overview(self.dashboard.as_ref())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
