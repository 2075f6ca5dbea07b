//! Check-in recording and lookup.
//!
//! A check-in is one attendance event of a person at one meal service on one
//! calendar day.  The business rule is uniqueness per (credential, service,
//! day): the scan path treats a repeat as an idempotent no-op, the manual
//! path surfaces it as [`StoreError::AlreadyRegistered`].  Records are
//! created pending (`sincronizado = 0`) and flipped by the outbound sync.
//!
//! Each public operation computes "today" from the device clock; the `_on`
//! variants take an explicit date and time and exist for deterministic tests
//! and for the clock-owning caller.

use chrono::{Local, NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{CheckinRecord, PersonMatch, RosterEntry};

/// Upper bound for roster and search result sets, sized for the UI.
const RESULT_LIMIT: u32 = 20;

impl Database {
    /// Look up an enabled credential by its scanned card code and, on a hit,
    /// record the check-in for `service_id` today.
    ///
    /// A repeat scan of the same card for the same service and day returns
    /// the person again without inserting.  Returns `None` when no enabled
    /// credential carries the code.
    pub fn check_in_by_card(&mut self, code: &str, service_id: i64) -> Result<Option<PersonMatch>> {
        let now = Local::now();
        self.check_in_by_card_on(code, service_id, now.date_naive(), now.time())
    }

    pub fn check_in_by_card_on(
        &mut self,
        code: &str,
        service_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<PersonMatch>> {
        let person = self
            .conn()
            .query_row(
                "SELECT p.id, p.nombre, p.apellido, p.cuil, c.id
                 FROM la_personal p
                 JOIN credencial_personal c ON p.id = c.personas_id
                 WHERE c.estado = 'HABILITADO' AND c.carnet = ?1",
                params![code],
                row_to_person_match,
            )
            .optional()?;

        let Some(person) = person else {
            tracing::debug!(code, "no enabled credential for scanned code");
            return Ok(None);
        };

        match self.insert_checkin(person.credencial_id, service_id, date, time) {
            Ok(()) => Ok(Some(person)),
            // Idempotent re-scan: the person already went through today.
            Err(StoreError::AlreadyRegistered) => {
                tracing::debug!(
                    credencial_id = person.credencial_id,
                    service_id,
                    "repeat scan, check-in already recorded"
                );
                Ok(Some(person))
            }
            Err(e) => Err(e),
        }
    }

    /// Substring search on the personal tax id among enabled credentials.
    /// Read-only; capped at [`RESULT_LIMIT`] rows.
    pub fn search_by_cuil(&self, fragment: &str) -> Result<Vec<PersonMatch>> {
        let mut stmt = self.conn().prepare(
            "SELECT p.id, p.nombre, p.apellido, p.cuil, c.id
             FROM la_personal p
             JOIN credencial_personal c ON p.id = c.personas_id
             WHERE c.estado = 'HABILITADO' AND p.cuil LIKE ?1
             ORDER BY p.apellido, p.nombre
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(
            params![format!("%{fragment}%"), RESULT_LIMIT],
            row_to_person_match,
        )?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Record a check-in for a manually selected person.
    ///
    /// Unlike the scan path, a duplicate for the same (credential, service,
    /// day) is an error the caller shows to the operator.
    pub fn record_manual_checkin(&mut self, credencial_id: i64, service_id: i64) -> Result<()> {
        let now = Local::now();
        self.record_manual_checkin_on(credencial_id, service_id, now.date_naive(), now.time())
    }

    pub fn record_manual_checkin_on(
        &mut self,
        credencial_id: i64,
        service_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<()> {
        let estado: Option<String> = self
            .conn()
            .query_row(
                "SELECT estado FROM credencial_personal WHERE id = ?1",
                params![credencial_id],
                |row| row.get(0),
            )
            .optional()?;

        match estado.as_deref() {
            Some("HABILITADO") => self.insert_checkin(credencial_id, service_id, date, time),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Delete today's check-in for (credential, service).
    ///
    /// The date is always the current day: historical records cannot be
    /// removed through this path.  Returns whether a row was deleted.
    pub fn remove_checkin(&mut self, credencial_id: i64, service_id: i64) -> Result<bool> {
        self.remove_checkin_on(credencial_id, service_id, Local::now().date_naive())
    }

    pub fn remove_checkin_on(
        &mut self,
        credencial_id: i64,
        service_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM catering_checkin_local
             WHERE idcred = ?1 AND idservicio = ?2 AND fingreso = ?3",
            params![credencial_id, service_id, date.format("%Y-%m-%d").to_string()],
        )?;

        if affected > 0 {
            tracing::info!(credencial_id, service_id, %date, "check-in removed");
        }
        Ok(affected > 0)
    }

    /// The live roster: today's most recent check-ins for a service,
    /// newest first, capped at [`RESULT_LIMIT`].
    pub fn todays_checkins(&self, service_id: i64) -> Result<Vec<RosterEntry>> {
        self.checkins_for_day(service_id, Local::now().date_naive())
    }

    pub fn checkins_for_day(&self, service_id: i64, date: NaiveDate) -> Result<Vec<RosterEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT p.id, p.nombre, p.apellido, cp.id, ccl.hingreso
             FROM catering_checkin_local ccl
             JOIN credencial_personal cp ON ccl.idcred = cp.id
             JOIN la_personal p ON cp.personas_id = p.id
             WHERE ccl.idservicio = ?1 AND ccl.fingreso = ?2
             ORDER BY ccl.hingreso DESC
             LIMIT ?3",
        )?;

        let rows = stmt.query_map(
            params![
                service_id,
                date.format("%Y-%m-%d").to_string(),
                RESULT_LIMIT
            ],
            row_to_roster_entry,
        )?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// All records still waiting to be uploaded, oldest first.
    pub fn pending_checkins(&self) -> Result<Vec<CheckinRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, idcred, idservicio, fingreso, hingreso, sincronizado
             FROM catering_checkin_local
             WHERE sincronizado = 0
             ORDER BY fingreso, hingreso",
        )?;

        let rows = stmt.query_map([], row_to_checkin)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Flip exactly the given records to synchronized, in one transaction.
    ///
    /// Called by the outbound sync after the server confirmed the batch.
    /// Records not named here (e.g. created while the upload was in flight)
    /// are left pending.  Returns the number of rows updated.
    pub fn mark_synchronized(&mut self, ids: &[String]) -> Result<usize> {
        let tx = self.conn_mut().transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE catering_checkin_local SET sincronizado = 1 WHERE id = ?1",
            )?;
            for id in ids {
                updated += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;

        tracing::info!(updated, "check-ins marked synchronized");
        Ok(updated)
    }

    /// Insert a pending check-in, enforcing uniqueness per (credential,
    /// service, day) inside one transaction.
    fn insert_checkin(
        &mut self,
        credencial_id: i64,
        service_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<()> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let tx = self.conn_mut().transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM catering_checkin_local
                 WHERE idcred = ?1 AND idservicio = ?2 AND fingreso = ?3",
                params![credencial_id, service_id, date_str],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Err(StoreError::AlreadyRegistered);
        }

        tx.execute(
            "INSERT INTO catering_checkin_local
                 (id, idcred, idservicio, fingreso, hingreso, sincronizado)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                Uuid::new_v4().to_string(),
                credencial_id,
                service_id,
                date_str,
                time.format("%H:%M:%S").to_string(),
            ],
        )?;
        tx.commit()?;

        tracing::info!(credencial_id, service_id, %date, "check-in recorded");
        Ok(())
    }
}

fn row_to_person_match(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersonMatch> {
    Ok(PersonMatch {
        personal_id: row.get(0)?,
        nombre: row.get(1)?,
        apellido: row.get(2)?,
        cuil: row.get(3)?,
        credencial_id: row.get(4)?,
    })
}

fn row_to_roster_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RosterEntry> {
    let hingreso: String = row.get(4)?;

    Ok(RosterEntry {
        personal_id: row.get(0)?,
        nombre: row.get(1)?,
        apellido: row.get(2)?,
        credencial_id: row.get(3)?,
        hingreso: parse_time(&hingreso, 4)?,
    })
}

fn row_to_checkin(row: &rusqlite::Row<'_>) -> rusqlite::Result<CheckinRecord> {
    let fingreso: String = row.get(3)?;
    let hingreso: String = row.get(4)?;

    Ok(CheckinRecord {
        id: row.get(0)?,
        idcred: row.get(1)?,
        idservicio: row.get(2)?,
        fingreso: parse_date(&fingreso, 3)?,
        hingreso: parse_time(&hingreso, 4)?,
        sincronizado: row.get(5)?,
    })
}

pub(crate) fn parse_date(s: &str, col: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_time(s: &str, col: usize) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}
