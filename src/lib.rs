pub mod challenge_client;
pub mod configuration;
pub mod domain;
pub mod rate_limit;
pub mod routes;
pub mod startup;
pub mod subscriber_client;
pub mod telemetry;
