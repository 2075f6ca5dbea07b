//! Offline login against the mirrored `usuarios` table.
//!
//! When the device has no connectivity the operator signs in against the
//! locally mirrored account rows.  The server provisions passwords as MD5 hex
//! digests, so verification hashes the supplied password the same way.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::LocalUser;

impl Database {
    pub fn local_user_by_username(&self, username: &str) -> Result<LocalUser> {
        self.conn()
            .query_row(
                "SELECT id, usuario, password, apellido, nombre, acceso
                 FROM usuarios WHERE usuario = ?1",
                params![username],
                row_to_local_user,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
    }

    /// Verify an offline login attempt.
    ///
    /// Returns the account on success, [`StoreError::NotFound`] for an
    /// unknown username and [`StoreError::InvalidCredentials`] for a wrong
    /// password.
    pub fn verify_local_login(&self, username: &str, password: &str) -> Result<LocalUser> {
        let user = self.local_user_by_username(username)?;

        let digest = format!("{:x}", md5::compute(password.as_bytes()));
        if digest == user.password {
            Ok(user)
        } else {
            tracing::warn!(username, "offline login rejected");
            Err(StoreError::InvalidCredentials)
        }
    }
}

fn row_to_local_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<LocalUser> {
    Ok(LocalUser {
        id: row.get(0)?,
        usuario: row.get(1)?,
        password: row.get(2)?,
        apellido: row.get(3)?,
        nombre: row.get(4)?,
        acceso: row.get(5)?,
    })
}
