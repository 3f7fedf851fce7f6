//! Read-only data behind the patient and doctor dashboards.

use serde::{Deserialize, Serialize};

use crate::models::{AppointmentStatus, TaskPriority};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingAppointment {
    pub id: u32,
    pub doctor: String,
    pub specialty: String,
    pub date_label: String,
    pub time: String,
    pub consultation_type: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentVisit {
    pub id: u32,
    pub doctor: String,
    pub date_label: String,
    pub diagnosis: String,
    pub prescription: String,
}

/// One slot on the doctor's schedule for today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledConsultation {
    pub id: u32,
    pub patient: String,
    pub time: String,
    pub consultation_type: String,
    pub condition: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTask {
    pub id: u32,
    pub task: String,
    pub priority: TaskPriority,
    pub age_label: String,
}

pub trait DashboardSource: Send + Sync {
    fn upcoming_appointments(&self) -> Vec<UpcomingAppointment>;
    fn recent_visits(&self) -> Vec<RecentVisit>;
    fn today_consultations(&self) -> Vec<ScheduledConsultation>;
    fn pending_tasks(&self) -> Vec<PendingTask>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientOverview {
    pub upcoming: Vec<UpcomingAppointment>,
    pub recent_visits: Vec<RecentVisit>,
    pub confirmed_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorOverview {
    pub consultations: Vec<ScheduledConsultation>,
    /// Most urgent first; listing order kept within a priority.
    pub tasks: Vec<PendingTask>,
    pub waiting_count: usize,
    pub high_priority_count: usize,
}

pub fn patient_overview(source: &dyn DashboardSource) -> PatientOverview {
    let upcoming = source.upcoming_appointments();
    let count = |status: AppointmentStatus| upcoming.iter().filter(|a| a.status == status).count();
    PatientOverview {
        confirmed_count: count(AppointmentStatus::Confirmed),
        pending_count: count(AppointmentStatus::Pending),
        recent_visits: source.recent_visits(),
        upcoming,
    }
}

pub fn doctor_overview(source: &dyn DashboardSource) -> DoctorOverview {
    let consultations = source.today_consultations();
    let mut tasks = source.pending_tasks();
    tasks.sort_by_key(|t| t.priority.rank());

    DoctorOverview {
        waiting_count: consultations
            .iter()
            .filter(|c| c.status == AppointmentStatus::Waiting)
            .count(),
        high_priority_count: tasks
            .iter()
            .filter(|t| t.priority == TaskPriority::High)
            .count(),
        consultations,
        tasks,
    }
}

/// Fixed records used by the prototype screens.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDashboard;

impl DashboardSource for StaticDashboard {
    fn upcoming_appointments(&self) -> Vec<UpcomingAppointment> {
        let row = |id, doctor: &str, specialty: &str, date: &str, time: &str, status| {
            UpcomingAppointment {
                id,
                doctor: doctor.into(),
                specialty: specialty.into(),
                date_label: date.into(),
                time: time.into(),
                consultation_type: "Video Call".into(),
                status,
            }
        };
        vec![
            row(
                1,
                "Dr. Sarah Johnson",
                "General Medicine",
                "Today",
                "2:30 PM",
                AppointmentStatus::Confirmed,
            ),
            row(
                2,
                "Dr. Michael Chen",
                "Cardiologist",
                "Tomorrow",
                "10:00 AM",
                AppointmentStatus::Pending,
            ),
        ]
    }

    fn recent_visits(&self) -> Vec<RecentVisit> {
        vec![
            RecentVisit {
                id: 1,
                doctor: "Dr. Emily Davis".into(),
                date_label: "Dec 5, 2024".into(),
                diagnosis: "Annual Checkup".into(),
                prescription: "Multivitamins".into(),
            },
            RecentVisit {
                id: 2,
                doctor: "Dr. James Wilson".into(),
                date_label: "Nov 28, 2024".into(),
                diagnosis: "Cold & Flu".into(),
                prescription: "Rest and fluids".into(),
            },
        ]
    }

    fn today_consultations(&self) -> Vec<ScheduledConsultation> {
        let row = |id, patient: &str, time: &str, condition: &str, status| ScheduledConsultation {
            id,
            patient: patient.into(),
            time: time.into(),
            consultation_type: "Video Call".into(),
            condition: condition.into(),
            status,
        };
        vec![
            row(1, "Tilak Mahajan", "2:30 PM", "Follow-up checkup", AppointmentStatus::Confirmed),
            row(2, "Sarah Wilson", "3:15 PM", "Cold symptoms", AppointmentStatus::Waiting),
            row(
                3,
                "Michael Johnson",
                "4:00 PM",
                "Prescription refill",
                AppointmentStatus::Upcoming,
            ),
        ]
    }

    fn pending_tasks(&self) -> Vec<PendingTask> {
        let row = |id, task: &str, priority, age: &str| PendingTask {
            id,
            task: task.into(),
            priority,
            age_label: age.into(),
        };
        vec![
            row(1, "Review lab results for Emma Chen", TaskPriority::High, "2 hours ago"),
            row(
                2,
                "Approve prescription refill for David Miller",
                TaskPriority::Medium,
                "4 hours ago",
            ),
            row(3, "Follow up with Lisa Garcia", TaskPriority::Low, "1 day ago"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reordered;

    impl DashboardSource for Reordered {
        fn upcoming_appointments(&self) -> Vec<UpcomingAppointment> {
            Vec::new()
        }
        fn recent_visits(&self) -> Vec<RecentVisit> {
            Vec::new()
        }
        fn today_consultations(&self) -> Vec<ScheduledConsultation> {
            Vec::new()
        }
        fn pending_tasks(&self) -> Vec<PendingTask> {
            let mut tasks = StaticDashboard.pending_tasks();
            tasks.reverse();
            tasks.push(PendingTask {
                id: 4,
                task: "Sign discharge letter".into(),
                priority: TaskPriority::High,
                age_label: "5 hours ago".into(),
            });
            tasks
        }
    }

    #[test]
    fn patient_overview_counts_statuses() {
        let overview = patient_overview(&StaticDashboard);
        assert_eq!(overview.upcoming.len(), 2);
        assert_eq!(overview.confirmed_count, 1);
        assert_eq!(overview.pending_count, 1);
        assert_eq!(overview.recent_visits[0].diagnosis, "Annual Checkup");
    }

    #[test]
    fn doctor_overview_counts_waiting_and_urgent() {
        let overview = doctor_overview(&StaticDashboard);
        assert_eq!(overview.consultations.len(), 3);
        assert_eq!(overview.waiting_count, 1);
        assert_eq!(overview.high_priority_count, 1);
    }

    #[test]
    fn tasks_sorted_by_priority_stably() {
        let overview = doctor_overview(&Reordered);
        let ids: Vec<_> = overview.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 4, 2, 3]);
    }

    #[test]
    fn empty_source_yields_zero_counts() {
        let overview = patient_overview(&Reordered);
        assert!(overview.upcoming.is_empty());
        assert_eq!(overview.confirmed_count, 0);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(&StaticDashboard.today_consultations()[1]).unwrap();
        assert_eq!(json["status"], "waiting");
    }
}
