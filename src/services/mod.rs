pub mod appointment_ledger;
pub mod credential_store;
pub mod patch;
pub mod patient_directory;
pub mod profile_settings;

pub use appointment_ledger::AppointmentLedger;
pub use credential_store::CredentialStore;
pub use patient_directory::PatientDirectory;
pub use profile_settings::ProfileSettings;
