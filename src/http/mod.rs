mod client;
mod health;
mod request;

pub use client::{Empty, RequestClient};
pub use health::{ConnectionStatus, HealthState, HealthStatus};
pub use request::{HttpMethod, QueryValue, RequestConfig};
