//! Domain model structs persisted in the local SQLite database.
//!
//! Field names match the column names of the corresponding tables, which in
//! turn match the JSON keys of the remote service's reference payload, so the
//! reference rows deserialize straight into these structs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// A contracting company.  Unique per (id, idproyecto).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub id: i64,
    /// Legal name (razon social).
    pub rs: String,
    /// Company tax id.
    pub cuit: String,
    pub idproyecto: i64,
}

/// A person on the personnel roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: i64,
    /// Personal tax id, the identifier used for manual lookups.
    pub cuil: String,
    pub apellido: String,
    pub nombre: String,
}

/// The enablement record linking a person to a company by badge code.
///
/// Only rows with `estado = "HABILITADO"` are valid for check-in lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub id: i64,
    pub personas_id: i64,
    pub idempresa: i64,
    pub idproyecto_vinculo: i64,
    /// Badge / QR card code scanned at the service line.
    pub carnet: String,
    pub estado: String,
}

/// A scheduled meal service.  Ids 1-4 are breakfast, lunch, snack, dinner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MealService {
    pub id: i64,
    pub cod: String,
    pub nombre: String,
    pub hinicio: NaiveTime,
    pub hfin: NaiveTime,
}

/// A local user account, used only for offline login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalUser {
    pub id: i64,
    pub usuario: String,
    /// MD5 hex digest of the password, as provisioned by the server.
    pub password: String,
    pub apellido: String,
    pub nombre: String,
    pub acceso: String,
}

// ---------------------------------------------------------------------------
// Check-ins
// ---------------------------------------------------------------------------

/// One attendance event: a credential at a meal service on a calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckinRecord {
    /// Client-generated unique id, carried through to the server payload.
    pub id: String,
    pub idcred: i64,
    pub idservicio: i64,
    pub fingreso: NaiveDate,
    pub hingreso: NaiveTime,
    /// false = pending upload, true = confirmed by the remote authority.
    /// Transitions false -> true, never back.
    pub sincronizado: bool,
}

/// A check-in row as delivered by the reference pull.
///
/// Remote rows may arrive without an id; the loader assigns a fresh UUID
/// before insertion.  They are stored as already synchronized, never
/// re-uploaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteCheckin {
    #[serde(default)]
    pub id: Option<String>,
    pub idcred: i64,
    pub idservicio: i64,
    pub fingreso: NaiveDate,
    pub hingreso: NaiveTime,
}

/// The grouped reference payload of one incremental pull, keyed exactly like
/// the remote `datos` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceUpdate {
    #[serde(default)]
    pub empresas: Vec<Company>,
    #[serde(default)]
    pub personas: Vec<Person>,
    #[serde(default)]
    pub servicios: Vec<MealService>,
    #[serde(default)]
    pub credenciales: Vec<Credential>,
    #[serde(default)]
    pub checkin: Vec<RemoteCheckin>,
    #[serde(default)]
    pub users: Vec<LocalUser>,
}

impl ReferenceUpdate {
    /// Total number of rows across all entity groups.
    pub fn row_count(&self) -> usize {
        self.empresas.len()
            + self.personas.len()
            + self.servicios.len()
            + self.credenciales.len()
            + self.checkin.len()
            + self.users.len()
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// A person found through an enabled credential, by badge scan or cuil search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonMatch {
    pub personal_id: i64,
    pub nombre: String,
    pub apellido: String,
    pub cuil: String,
    pub credencial_id: i64,
}

/// One row of the live roster for a service and day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterEntry {
    pub personal_id: i64,
    pub nombre: String,
    pub apellido: String,
    pub credencial_id: i64,
    pub hingreso: NaiveTime,
}

/// One row of the check-in report view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckinReportRow {
    pub cuil: String,
    pub nombre: String,
    pub apellido: String,
    pub idservicio: i64,
    pub fingreso: NaiveDate,
    pub hingreso: NaiveTime,
}
