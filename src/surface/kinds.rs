use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareKind {
    Auth,
    Cors,
    Logging,
    RateLimit,
    Validation,
    ErrorHandler,
    Other,
}

impl MiddlewareKind {
    pub fn name(&self) -> &'static str {
        match self {
            MiddlewareKind::Auth => "Authentication",
            MiddlewareKind::Cors => "CORS",
            MiddlewareKind::Logging => "Logging",
            MiddlewareKind::RateLimit => "Rate limiting",
            MiddlewareKind::Validation => "Validation",
            MiddlewareKind::ErrorHandler => "Error handling",
            MiddlewareKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Redux,
    Zustand,
    Context,
    Pinia,
    Vuex,
    Other,
}

impl StoreKind {
    pub fn name(&self) -> &'static str {
        match self {
            StoreKind::Redux => "Redux",
            StoreKind::Zustand => "Zustand",
            StoreKind::Context => "React Context",
            StoreKind::Pinia => "Pinia",
            StoreKind::Vuex => "Vuex",
            StoreKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationKind {
    Payment,
    Auth,
    Email,
    Storage,
    Analytics,
    Messaging,
    Other,
}

impl IntegrationKind {
    pub fn name(&self) -> &'static str {
        match self {
            IntegrationKind::Payment => "Payment",
            IntegrationKind::Auth => "Authentication",
            IntegrationKind::Email => "Email",
            IntegrationKind::Storage => "Storage",
            IntegrationKind::Analytics => "Analytics",
            IntegrationKind::Messaging => "Messaging",
            IntegrationKind::Other => "Other",
        }
    }
}

macro_rules! display_by_name {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        )*
    };
}

display_by_name!(MiddlewareKind, StoreKind, IntegrationKind);
