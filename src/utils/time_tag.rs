// Heure des rendez-vous
//
// L'ancien service n'avait pas de colonne pour l'heure : elle était préfixée
// dans notes sous la forme "[Time: 14:30] texte libre". Les nouvelles lignes
// utilisent la colonne appointment_time ; ce module garde la lecture des
// anciennes lignes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;

pub const DEFAULT_TIME: &str = "00:00";

static LEGACY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Time: (\d{1,2}:\d{2})\]").expect("valid time tag regex"));

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

/// Extrait l'heure d'un ancien tag "[Time: HH:MM]" dans notes
pub fn extract_legacy_time(notes: &str) -> Option<&str> {
    LEGACY_TAG_RE
        .captures(notes)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Heure affichée : colonne dédiée, sinon ancien tag, sinon "00:00"
pub fn resolve_time(appointment_time: Option<&str>, notes: Option<&str>) -> String {
    appointment_time
        .filter(|t| !t.is_empty())
        .or_else(|| notes.and_then(extract_legacy_time))
        .unwrap_or(DEFAULT_TIME)
        .to_string()
}

/// Valide une heure "H:MM" ou "HH:MM" (00:00 - 23:59)
pub fn ensure_time(value: &str) -> Result<(), ApiError> {
    if TIME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::validation("appointment_time must be formatted as HH:MM"))
    }
}
