use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unrecognised tag for one of the string-backed enums below.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value:?}")]
pub struct ParseTagError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident {
        $($(#[$vmeta:meta])* $variant:ident => $s:literal),+ $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseTagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseTagError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// One of the five top-level screens.
    #[derive(Default)]
    View {
        #[default]
        Home => "home",
        PatientDashboard => "patient-dashboard",
        DoctorDashboard => "doctor-dashboard",
        BookAppointment => "book-appointment",
        VideoCall => "video-call",
    }
);

str_enum!(
    /// Connection status of a consultation session.
    CallStatus {
        Connecting => "connecting",
        Connected => "connected",
        Disconnected => "disconnected",
    }
);

str_enum!(AppointmentStatus {
    Confirmed => "confirmed",
    Pending => "pending",
    Waiting => "waiting",
    Upcoming => "upcoming",
});

str_enum!(TaskPriority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

impl View {
    /// Navigation-bar label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::PatientDashboard => "Patient Portal",
            Self::DoctorDashboard => "Doctor Portal",
            Self::BookAppointment => "Book Appointment",
            Self::VideoCall => "Video Call",
        }
    }
}

impl TaskPriority {
    /// Sort key, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn view_round_trip() {
        for (variant, s) in [
            (View::Home, "home"),
            (View::PatientDashboard, "patient-dashboard"),
            (View::DoctorDashboard, "doctor-dashboard"),
            (View::BookAppointment, "book-appointment"),
            (View::VideoCall, "video-call"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(View::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn view_lists_all_five_tags() {
        assert_eq!(View::ALL.len(), 5);
        assert_eq!(View::default(), View::Home);
    }

    #[test]
    fn view_serializes_as_tag() {
        let json = serde_json::to_string(&View::PatientDashboard).unwrap();
        assert_eq!(json, "\"patient-dashboard\"");
        let back: View = serde_json::from_str("\"video-call\"").unwrap();
        assert_eq!(back, View::VideoCall);
    }

    #[test]
    fn unknown_view_rejected() {
        let err = View::from_str("settings").unwrap_err();
        assert_eq!(err.field, "View");
        assert_eq!(err.value, "settings");
    }

    #[test]
    fn call_status_display_matches_tag() {
        assert_eq!(CallStatus::Connecting.to_string(), "connecting");
        assert_eq!(
            CallStatus::from_str("disconnected").unwrap(),
            CallStatus::Disconnected
        );
    }

    #[test]
    fn priority_rank_orders_high_first() {
        let mut priorities = vec![TaskPriority::Low, TaskPriority::High, TaskPriority::Medium];
        priorities.sort_by_key(TaskPriority::rank);
        assert_eq!(
            priorities,
            vec![TaskPriority::High, TaskPriority::Medium, TaskPriority::Low]
        );
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<_> = View::ALL.iter().map(View::label).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), View::ALL.len());
    }
}
