// connexion BD + création du schéma

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::config::AppConfig;
use crate::models::{appointments, doctors, patients};

/// Ouvre le pool de connexions (borné par DB_MAX_CONNECTIONS / DB_MIN_CONNECTIONS)
pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(config.db_connect_timeout)
        .acquire_timeout(config.db_connect_timeout)
        .sqlx_logging(false);

    Database::connect(options).await
}

/// Crée les tables et index s'ils n'existent pas (dérivés des entités SeaORM)
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, doctors::Entity).await?;
    create_table(db, &schema, patients::Entity).await?;
    create_table(db, &schema, appointments::Entity).await?;

    // Unicité par médecin : (doctor_id, email) et (doctor_id, phone)
    let indexes = [
        Index::create()
            .if_not_exists()
            .name("idx_patients_doctor_email")
            .table(patients::Entity)
            .col(patients::Column::DoctorId)
            .col(patients::Column::Email)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_patients_doctor_phone")
            .table(patients::Entity)
            .col(patients::Column::DoctorId)
            .col(patients::Column::Phone)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_appointments_doctor_date")
            .table(appointments::Entity)
            .col(appointments::Column::DoctorId)
            .col(appointments::Column::AppointmentDate)
            .to_owned(),
    ];
    for index in indexes {
        db.execute(backend.build(&index)).await?;
    }

    info!("Database schema is up to date");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}
