use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// One of the two weekly services.
///
/// The `culte` table mirrors these two rows but is never mutated; the set is
/// closed and writes reject any other id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Service {
    First,
    Second,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::First, Service::Second];

    pub fn id(self) -> i64 {
        match self {
            Service::First => 1,
            Service::Second => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Service::First => "1er culte",
            Service::Second => "2ème culte",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Service::First),
            2 => Some(Service::Second),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Service {
    type Error = ValidationError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Service::from_id(id).ok_or(ValidationError::UnknownService(id))
    }
}

impl From<Service> for i64 {
    fn from(service: Service) -> Self {
        service.id()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display label for a stored service id.
///
/// Ids outside the enumeration can only come from rows written by other
/// tools; they render as `"Culte {id}"` instead of failing the listing.
pub fn service_label(id: i64) -> String {
    match Service::from_id(id) {
        Some(service) => service.label().to_string(),
        None => format!("Culte {}", id),
    }
}
