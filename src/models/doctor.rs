use serde::{Deserialize, Serialize};

/// Catalog key for a doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(pub u32);

impl std::fmt::Display for DoctorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialty: String,
    /// 0.0 – 5.0
    pub rating: f32,
    pub review_count: u32,
    pub experience_years: u32,
    pub available: bool,
    pub next_available: String,
    /// Consultation price in whole dollars.
    pub price: u32,
}

impl Doctor {
    pub fn price_label(&self) -> String {
        format!("${}", self.price)
    }

    pub fn experience_label(&self) -> String {
        format!("{} years", self.experience_years)
    }

    /// "Available" or "Busy", as shown on the selection card.
    pub fn availability_label(&self) -> &'static str {
        if self.available {
            "Available"
        } else {
            "Busy"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(available: bool) -> Doctor {
        Doctor {
            id: DoctorId(7),
            name: "Dr. Test".into(),
            specialty: "General Medicine".into(),
            rating: 4.5,
            review_count: 10,
            experience_years: 3,
            available,
            next_available: "Today 2:30 PM".into(),
            price: 75,
        }
    }

    #[test]
    fn labels_render_card_fields() {
        let d = doctor(true);
        assert_eq!(d.price_label(), "$75");
        assert_eq!(d.experience_label(), "3 years");
        assert_eq!(d.availability_label(), "Available");
        assert_eq!(doctor(false).availability_label(), "Busy");
    }

    #[test]
    fn id_serializes_as_number() {
        let json = serde_json::to_value(doctor(true)).unwrap();
        assert_eq!(json["id"], 7);
    }
}
