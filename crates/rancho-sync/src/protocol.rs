//! Wire types of the `catering.php` endpoint.
//!
//! The reference pull (`GET`) answers with a `datos` object whose arrays
//! deserialize straight into [`rancho_store::ReferenceUpdate`] -- the JSON
//! keys are the table column names.  The outbound sync (`POST`) carries one
//! [`CheckinUpload`] per pending record; the endpoint expects identifiers
//! string-encoded even where they are numeric locally.

use serde::{Deserialize, Serialize};

use rancho_store::{CheckinRecord, ReferenceUpdate};

/// Body of a successful reference pull.
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    pub datos: ReferenceUpdate,
}

/// One element of the outbound sync's JSON array.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinUpload {
    /// Client-generated id; the server deduplicates on it.
    pub id: String,
    /// Service date, `YYYY-MM-DD`.
    pub fecha: String,
    /// Service time, `HH:MM:SS`.
    pub hora: String,
    /// Credential id, string-encoded.
    pub identif: String,
    /// Service id, string-encoded.
    pub idtipo: String,
    /// Always empty; the server resolves the company from the credential.
    pub idempresa: String,
    pub comentario: String,
    /// Operation date; mirrors `fecha`.
    pub foperacion: String,
    /// Operation time; mirrors `hora`.
    pub hoperacion: String,
    /// Acting operator, string-encoded.
    pub idoperador: String,
}

impl CheckinUpload {
    pub fn from_record(record: &CheckinRecord, operator_id: i64) -> Self {
        let fecha = record.fingreso.format("%Y-%m-%d").to_string();
        let hora = record.hingreso.format("%H:%M:%S").to_string();

        Self {
            id: record.id.clone(),
            fecha: fecha.clone(),
            hora: hora.clone(),
            identif: record.idcred.to_string(),
            idtipo: record.idservicio.to_string(),
            idempresa: String::new(),
            comentario: String::new(),
            foperacion: fecha,
            hoperacion: hora,
            idoperador: operator_id.to_string(),
        }
    }
}
