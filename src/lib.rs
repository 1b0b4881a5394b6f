pub mod backend;
pub mod configuration;
pub mod contacts_client;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
