//! Reference data ingestion.
//!
//! The remote authority owns companies, personnel, credentials, service
//! definitions and local user accounts; the device only mirrors them.  One
//! incremental pull delivers every row that changed since the watermark, and
//! [`Database::apply_reference_update`] lands the whole batch plus the new
//! watermark in a single transaction.
//!
//! The server redelivers rows at-least-once (a failed pull does not advance
//! the watermark), so every insert is an idempotent upsert keyed by the
//! natural id.

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::meta;
use crate::models::{
    Company, Credential, LocalUser, MealService, Person, ReferenceUpdate, RemoteCheckin,
};

/// Rows inserted per batch, to bound memory and statement count.
const BATCH_SIZE: usize = 1000;

impl Database {
    /// Apply one incremental reference pull.
    ///
    /// All entity groups and the watermark commit together; any failure rolls
    /// the whole pull back and leaves the watermark untouched, so the next
    /// pull re-requests the same window.
    pub fn apply_reference_update(&mut self, update: &ReferenceUpdate, watermark: &str) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        // Parents before children: personnel and services are referenced by
        // credentials and check-ins.
        upsert_companies(&tx, &update.empresas)?;
        upsert_people(&tx, &update.personas)?;
        upsert_services(&tx, &update.servicios)?;
        upsert_credentials(&tx, &update.credenciales)?;
        insert_remote_checkins(&tx, &update.checkin)?;
        upsert_users(&tx, &update.users)?;

        meta::set_watermark(&tx, watermark)?;

        tx.commit()?;

        tracing::info!(
            rows = update.row_count(),
            watermark,
            "reference update applied"
        );
        Ok(())
    }
}

pub(crate) fn upsert_companies(conn: &Connection, rows: &[Company]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO empresa (id, rs, cuit, idproyecto)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id, idproyecto) DO UPDATE SET
             rs = excluded.rs,
             cuit = excluded.cuit",
    )?;
    for batch in rows.chunks(BATCH_SIZE) {
        for row in batch {
            stmt.execute(params![row.id, row.rs, row.cuit, row.idproyecto])?;
        }
        tracing::debug!(table = "empresa", rows = batch.len(), "batch upserted");
    }
    Ok(())
}

pub(crate) fn upsert_people(conn: &Connection, rows: &[Person]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO la_personal (id, cuil, apellido, nombre)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             cuil = excluded.cuil,
             apellido = excluded.apellido,
             nombre = excluded.nombre",
    )?;
    for batch in rows.chunks(BATCH_SIZE) {
        for row in batch {
            stmt.execute(params![row.id, row.cuil, row.apellido, row.nombre])?;
        }
        tracing::debug!(table = "la_personal", rows = batch.len(), "batch upserted");
    }
    Ok(())
}

pub(crate) fn upsert_services(conn: &Connection, rows: &[MealService]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO catering_servicio (id, cod, nombre, hinicio, hfin)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
             cod = excluded.cod,
             nombre = excluded.nombre,
             hinicio = excluded.hinicio,
             hfin = excluded.hfin",
    )?;
    for batch in rows.chunks(BATCH_SIZE) {
        for row in batch {
            stmt.execute(params![
                row.id,
                row.cod,
                row.nombre,
                row.hinicio.format("%H:%M:%S").to_string(),
                row.hfin.format("%H:%M:%S").to_string(),
            ])?;
        }
        tracing::debug!(table = "catering_servicio", rows = batch.len(), "batch upserted");
    }
    Ok(())
}

pub(crate) fn upsert_credentials(conn: &Connection, rows: &[Credential]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO credencial_personal (id, personas_id, idempresa, idproyecto_vinculo, carnet, estado)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             personas_id = excluded.personas_id,
             idempresa = excluded.idempresa,
             idproyecto_vinculo = excluded.idproyecto_vinculo,
             carnet = excluded.carnet,
             estado = excluded.estado",
    )?;
    for batch in rows.chunks(BATCH_SIZE) {
        for row in batch {
            stmt.execute(params![
                row.id,
                row.personas_id,
                row.idempresa,
                row.idproyecto_vinculo,
                row.carnet,
                row.estado,
            ])?;
        }
        tracing::debug!(table = "credencial_personal", rows = batch.len(), "batch upserted");
    }
    Ok(())
}

/// Insert check-in rows delivered by the pull.
///
/// These are historical records the server already knows about: they land
/// with `sincronizado = 1` so the outbound sync never re-uploads them.  Rows
/// arriving without an id get a fresh UUID.  Redelivered rows (same id, or
/// same credential/service/day) are ignored.
pub(crate) fn insert_remote_checkins(conn: &Connection, rows: &[RemoteCheckin]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO catering_checkin_local (id, idcred, idservicio, fingreso, hingreso, sincronizado)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)
         ON CONFLICT DO NOTHING",
    )?;
    for batch in rows.chunks(BATCH_SIZE) {
        for row in batch {
            let id = match &row.id {
                Some(id) => id.clone(),
                None => Uuid::new_v4().to_string(),
            };
            stmt.execute(params![
                id,
                row.idcred,
                row.idservicio,
                row.fingreso.format("%Y-%m-%d").to_string(),
                row.hingreso.format("%H:%M:%S").to_string(),
            ])?;
        }
        tracing::debug!(table = "catering_checkin_local", rows = batch.len(), "batch inserted");
    }
    Ok(())
}

pub(crate) fn upsert_users(conn: &Connection, rows: &[LocalUser]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO usuarios (id, usuario, password, apellido, nombre, acceso)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             usuario = excluded.usuario,
             password = excluded.password,
             apellido = excluded.apellido,
             nombre = excluded.nombre,
             acceso = excluded.acceso",
    )?;
    for batch in rows.chunks(BATCH_SIZE) {
        for row in batch {
            stmt.execute(params![
                row.id,
                row.usuario,
                row.password,
                row.apellido,
                row.nombre,
                row.acceso,
            ])?;
        }
        tracing::debug!(table = "usuarios", rows = batch.len(), "batch upserted");
    }
    Ok(())
}
