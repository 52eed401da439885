// ============================================================================
// MODÈLE : APPOINTMENTS
// ============================================================================
//
// Colonnes de la table appointments:
//   - id (INTEGER, PRIMARY KEY)
//   - doctor_id (INTEGER, NOT NULL, FK vers doctors)
//   - patient_id (INTEGER, NOT NULL, FK vers patients)
//   - cabinet_id (INTEGER, NOT NULL)
//   - appointment_date (DATE, NOT NULL)
//   - appointment_time (VARCHAR, NULL) - "HH:MM"
//   - status (VARCHAR, NOT NULL) - voir AppointmentStatus
//   - visit_type (VARCHAR, NOT NULL)
//   - notes (TEXT, NULL)
//   - created_at (TIMESTAMP)
//
// Points d'attention:
//   - Les anciennes lignes n'ont pas de appointment_time : l'heure était
//     préfixée dans notes sous la forme "[Time: HH:MM] ..." (voir
//     utils::time_tag). Les nouvelles écritures utilisent la colonne dédiée.
//
// ============================================================================

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub doctor_id: i32,
    pub patient_id: i32,
    pub cabinet_id: i32,
    pub appointment_date: Date,
    pub appointment_time: Option<String>,
    pub status: String,
    pub visit_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::doctors::Entity",
        from = "Column::DoctorId",
        to = "super::doctors::Column::Id"
    )]
    Doctor,

    #[sea_orm(
        belongs_to = "super::patients::Entity",
        from = "Column::PatientId",
        to = "super::patients::Column::Id"
    )]
    Patient,
}

impl Related<super::doctors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Doctor.def()
    }
}

impl Related<super::patients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(Utc::now());
        }
        Ok(self)
    }
}

/// Statuts possibles d'un rendez-vous (valeurs stockées en base)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppointmentStatus {
    #[default]
    Nouveau,
    Confirme,
    NeRepondPas,
    Reprogramme,
    Absent,
    Suivi,
    Termine,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 7] = [
        AppointmentStatus::Nouveau,
        AppointmentStatus::Confirme,
        AppointmentStatus::NeRepondPas,
        AppointmentStatus::Reprogramme,
        AppointmentStatus::Absent,
        AppointmentStatus::Suivi,
        AppointmentStatus::Termine,
    ];

    /// Rendez-vous encore à venir (compteur next_visit)
    pub const UPCOMING: [AppointmentStatus; 3] = [
        AppointmentStatus::Nouveau,
        AppointmentStatus::Confirme,
        AppointmentStatus::Reprogramme,
    ];

    /// Visite effectuée (compteurs completed / last_visit)
    pub const COMPLETED: AppointmentStatus = AppointmentStatus::Termine;

    /// Rendez-vous manqué (compteur cancelled)
    pub const CANCELLED: AppointmentStatus = AppointmentStatus::Absent;

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Nouveau => "nouveau",
            AppointmentStatus::Confirme => "confirme",
            AppointmentStatus::NeRepondPas => "ne_repond_pas",
            AppointmentStatus::Reprogramme => "reprogramme",
            AppointmentStatus::Absent => "absent",
            AppointmentStatus::Suivi => "suivi",
            AppointmentStatus::Termine => "termine",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid status '{}'. Must be one of: nouveau, confirme, ne_repond_pas, reprogramme, absent, suivi, termine",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_names() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AppointmentStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("completed".parse::<AppointmentStatus>().is_err());
        assert!("".parse::<AppointmentStatus>().is_err());
    }
}
