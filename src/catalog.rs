//! Doctor catalog. The static catalog stands in for a directory service.

use crate::models::{Doctor, DoctorId};

/// Half-hour consultation slots offered on any day.
pub const TIME_SLOTS: [&str; 12] = [
    "9:00 AM", "9:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "2:00 PM", "2:30 PM", "3:00 PM", "3:30 PM", "4:00 PM", "4:30 PM",
];

/// Read access to an ordered collection of doctors.
pub trait DoctorCatalog: Send + Sync {
    fn list_doctors(&self) -> Vec<Doctor>;

    fn find(&self, id: DoctorId) -> Option<Doctor> {
        self.list_doctors().into_iter().find(|d| d.id == id)
    }

    fn time_slots(&self) -> Vec<String> {
        TIME_SLOTS.iter().map(|s| s.to_string()).collect()
    }
}

/// In-memory catalog.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    doctors: Vec<Doctor>,
}

impl StaticCatalog {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self { doctors }
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(vec![
            Doctor {
                id: DoctorId(1),
                name: "Dr. Sarah Johnson".into(),
                specialty: "General Medicine".into(),
                rating: 4.9,
                review_count: 156,
                experience_years: 8,
                available: true,
                next_available: "Today 2:30 PM".into(),
                price: 50,
            },
            Doctor {
                id: DoctorId(2),
                name: "Dr. Michael Chen".into(),
                specialty: "Cardiologist".into(),
                rating: 4.8,
                review_count: 203,
                experience_years: 12,
                available: true,
                next_available: "Tomorrow 10:00 AM".into(),
                price: 120,
            },
            Doctor {
                id: DoctorId(3),
                name: "Dr. Emily Davis".into(),
                specialty: "Dermatologist".into(),
                rating: 4.9,
                review_count: 98,
                experience_years: 6,
                available: false,
                next_available: "Dec 18, 2:00 PM".into(),
                price: 100,
            },
        ])
    }
}

impl DoctorCatalog for StaticCatalog {
    fn list_doctors(&self) -> Vec<Doctor> {
        self.doctors.clone()
    }
}
