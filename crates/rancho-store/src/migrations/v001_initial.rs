//! v001 -- Initial schema creation.
//!
//! Creates the six catering tables plus the `sync_meta` key-value table.
//! Table and column names keep the upstream service's Spanish spelling
//! because the reference pull inserts JSON objects whose keys are exactly
//! these column names.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Companies (reference data)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS empresa (
    id         INTEGER NOT NULL,
    rs         TEXT NOT NULL,                -- razon social (legal name)
    cuit       TEXT NOT NULL,                -- company tax id
    idproyecto INTEGER NOT NULL,

    PRIMARY KEY (id, idproyecto)
);

-- ----------------------------------------------------------------
-- Personnel (reference data)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS la_personal (
    id       INTEGER PRIMARY KEY NOT NULL,
    cuil     TEXT NOT NULL,                  -- personal tax id
    apellido TEXT NOT NULL,
    nombre   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_la_personal_cuil ON la_personal(cuil);

-- ----------------------------------------------------------------
-- Credentials (reference data; only estado = 'HABILITADO' rows are
-- valid for lookups)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS credencial_personal (
    id                 INTEGER PRIMARY KEY NOT NULL,
    personas_id        INTEGER NOT NULL,
    idempresa          INTEGER NOT NULL,
    idproyecto_vinculo INTEGER NOT NULL,
    carnet             TEXT NOT NULL,        -- badge / QR card code
    estado             TEXT NOT NULL,

    FOREIGN KEY (personas_id) REFERENCES la_personal(id)
);

CREATE INDEX IF NOT EXISTS idx_credencial_carnet ON credencial_personal(carnet);

-- ----------------------------------------------------------------
-- Meal services (reference data; ids 1-4 are breakfast, lunch,
-- snack and dinner)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS catering_servicio (
    id      INTEGER PRIMARY KEY NOT NULL,
    cod     TEXT NOT NULL,
    nombre  TEXT NOT NULL,
    hinicio TIME NOT NULL,
    hfin    TIME NOT NULL
);

-- ----------------------------------------------------------------
-- Check-ins (locally authored; uploaded by the outbound sync)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS catering_checkin_local (
    id           TEXT PRIMARY KEY NOT NULL,  -- client-generated UUID v4
    idcred       INTEGER NOT NULL,
    idservicio   INTEGER NOT NULL,
    fingreso     DATE NOT NULL,              -- YYYY-MM-DD
    hingreso     TIME NOT NULL,              -- HH:MM:SS
    sincronizado BOOLEAN NOT NULL DEFAULT 0,

    FOREIGN KEY (idcred)     REFERENCES credencial_personal(id),
    FOREIGN KEY (idservicio) REFERENCES catering_servicio(id)
);

-- One check-in per credential, service and day.
CREATE UNIQUE INDEX IF NOT EXISTS idx_checkin_unique
    ON catering_checkin_local(idcred, idservicio, fingreso);

CREATE INDEX IF NOT EXISTS idx_checkin_pending
    ON catering_checkin_local(sincronizado);

-- ----------------------------------------------------------------
-- Local users (offline login fallback; reference data)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS usuarios (
    id       INTEGER PRIMARY KEY NOT NULL,
    usuario  TEXT NOT NULL,
    password TEXT NOT NULL,                  -- MD5 hex, as provisioned by the server
    apellido TEXT NOT NULL,
    nombre   TEXT NOT NULL,
    acceso   TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Sync metadata (single-row key-value store; holds the
-- last-successful-pull watermark)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sync_meta (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
