//! Shared helpers for unit tests.

use tempfile::TempDir;

use crate::database::Database;
use crate::models::{Credential, MealService, Person};
use crate::reference;

/// Open a fresh database in a temp directory.  The directory must stay alive
/// for the duration of the test.
pub fn open_test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("test.db")).unwrap();
    (db, dir)
}

pub fn person(id: i64, cuil: &str, apellido: &str, nombre: &str) -> Person {
    Person {
        id,
        cuil: cuil.to_string(),
        apellido: apellido.to_string(),
        nombre: nombre.to_string(),
    }
}

pub fn credential(id: i64, personas_id: i64, carnet: &str, estado: &str) -> Credential {
    Credential {
        id,
        personas_id,
        idempresa: 1,
        idproyecto_vinculo: 1,
        carnet: carnet.to_string(),
        estado: estado.to_string(),
    }
}

pub fn service(id: i64, cod: &str, nombre: &str) -> MealService {
    MealService {
        id,
        cod: cod.to_string(),
        nombre: nombre.to_string(),
        hinicio: "08:00:00".parse().unwrap(),
        hfin: "10:00:00".parse().unwrap(),
    }
}

/// Seed one person with an enabled credential plus the four meal services.
pub fn seed_reference(db: &mut Database) {
    let tx = db.conn_mut().transaction().unwrap();
    reference::upsert_people(&tx, &[person(1, "20-11111111-1", "Perez", "Juan")]).unwrap();
    reference::upsert_credentials(&tx, &[credential(10, 1, "CARD-001", "HABILITADO")]).unwrap();
    reference::upsert_services(
        &tx,
        &[
            service(1, "DES", "Desayuno"),
            service(2, "ALM", "Almuerzo"),
            service(3, "MER", "Merienda"),
            service(4, "CEN", "Cena"),
        ],
    )
    .unwrap();
    tx.commit().unwrap();
}
