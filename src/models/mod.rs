// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque entité correspond à une table SQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - doctors : Médecins (comptes, authentification, profil)
//   - patients : Patients, rattachés à un médecin
//   - appointments : Rendez-vous (médecin + patient)
//   - dto : Requêtes et réponses de l'API (enveloppe JSON)
//
// Points d'attention:
//   - Toutes les requêtes passent par SeaORM (pas de SQL brut)
//   - Chaque patient et rendez-vous appartient à un seul médecin :
//     toutes les lectures/écritures filtrent sur doctor_id
//
// ============================================================================

pub mod health;
pub mod doctors;
pub mod patients;
pub mod appointments;
pub mod dto;
