//! Check-in report queries for the records screen.
//!
//! Read-only joins over person, credential and check-in rows, optionally
//! filtered by date, service, and a free-text fragment matched against the
//! cuil or the person's name in either order (whitespace ignored).

use chrono::NaiveDate;
use rusqlite::{params_from_iter, types::Value};

use crate::checkins::{parse_date, parse_time};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::CheckinReportRow;

impl Database {
    /// Check-ins matching the given filters, most recent first.
    pub fn filtered_checkins(
        &self,
        date: Option<NaiveDate>,
        service_id: Option<i64>,
        text: Option<&str>,
    ) -> Result<Vec<CheckinReportRow>> {
        let mut sql = String::from(
            "SELECT p.cuil, p.nombre, p.apellido, ccl.idservicio, ccl.fingreso, ccl.hingreso
             FROM catering_checkin_local ccl
             JOIN credencial_personal c ON c.id = ccl.idcred
             JOIN la_personal p ON p.id = c.personas_id",
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(date) = date {
            clauses.push("ccl.fingreso = ?");
            args.push(Value::Text(date.format("%Y-%m-%d").to_string()));
        }
        if let Some(service_id) = service_id {
            clauses.push("ccl.idservicio = ?");
            args.push(Value::Integer(service_id));
        }
        if let Some(text) = text {
            clauses.push(
                "(REPLACE(p.cuil, ' ', '') LIKE ?
                  OR REPLACE(p.nombre || ' ' || p.apellido, ' ', '') LIKE ?
                  OR REPLACE(p.apellido || ' ' || p.nombre, ' ', '') LIKE ?)",
            );
            let needle: String = text.split_whitespace().collect();
            let pattern = format!("%{needle}%");
            args.push(Value::Text(pattern.clone()));
            args.push(Value::Text(pattern.clone()));
            args.push(Value::Text(pattern));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ccl.fingreso DESC, ccl.hingreso DESC");

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), row_to_report_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Every recorded check-in, most recent first.
    pub fn all_checkins(&self) -> Result<Vec<CheckinReportRow>> {
        self.filtered_checkins(None, None, None)
    }
}

fn row_to_report_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CheckinReportRow> {
    let fingreso: String = row.get(4)?;
    let hingreso: String = row.get(5)?;

    Ok(CheckinReportRow {
        cuil: row.get(0)?,
        nombre: row.get(1)?,
        apellido: row.get(2)?,
        idservicio: row.get(3)?,
        fingreso: parse_date(&fingreso, 4)?,
        hingreso: parse_time(&hingreso, 5)?,
    })
}
