//! Preset repository.

use rusqlite::{params, Row};

use crate::search::Preset;

use super::{Database, DatabaseError};

fn from_row(row: &Row<'_>) -> Result<(Preset, String), rusqlite::Error> {
    let terms_json: String = row.get("terms")?;
    Ok((
        Preset {
            id: row.get("id")?,
            owner: row.get("owner")?,
            name: row.get("name")?,
            terms: Vec::new(),
            age_min: row.get("age_min")?,
            age_max: row.get("age_max")?,
            experience_min: row.get("experience_min")?,
            experience_max: row.get("experience_max")?,
        },
        terms_json,
    ))
}

fn finish(parts: (Preset, String)) -> Result<Preset, DatabaseError> {
    let (mut preset, terms_json) = parts;
    preset.terms = serde_json::from_str(&terms_json)?;
    Ok(preset)
}

/// Inserts a preset and returns its assigned id. The (owner, name) pair is
/// unique; saving a duplicate name fails.
pub fn insert(db: &Database, preset: &Preset) -> Result<i64, DatabaseError> {
    let terms_json = serde_json::to_string(&preset.terms)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO presets (owner, name, terms, age_min, age_max,
             experience_min, experience_max, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                preset.owner,
                preset.name,
                terms_json,
                preset.age_min,
                preset.age_max,
                preset.experience_min,
                preset.experience_max,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a preset by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Preset>, DatabaseError> {
    let parts = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM presets WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], from_row)?;
        match rows.next() {
            Some(Ok(parts)) => Ok(Some(parts)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })?;
    parts.map(finish).transpose()
}

/// Lists an owner's presets ordered by name.
pub fn list_by_owner(db: &Database, owner: &str) -> Result<Vec<Preset>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM presets WHERE owner = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![owner], from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    })?;
    rows.into_iter().map(finish).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(owner: &str, name: &str) -> Preset {
        Preset {
            id: 0,
            owner: owner.to_string(),
            name: name.to_string(),
            terms: vec!["gerente".to_string(), "compras".to_string()],
            age_min: Some(25),
            age_max: Some(35),
            experience_min: None,
            experience_max: None,
        }
    }

    #[test]
    fn test_insert_and_find_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = insert(&db, &preset("alice", "compras")).unwrap();
        assert!(id > 0);

        let loaded = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.owner, "alice");
        assert_eq!(loaded.terms, vec!["gerente", "compras"]);
        assert_eq!(loaded.age_min, Some(25));
        assert_eq!(loaded.experience_min, None);
    }

    #[test]
    fn test_find_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(find_by_id(&db, 42).unwrap().is_none());
    }

    #[test]
    fn test_list_by_owner_sorted_by_name() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &preset("alice", "vendas")).unwrap();
        insert(&db, &preset("alice", "compras")).unwrap();
        insert(&db, &preset("bob", "outros")).unwrap();

        let presets = list_by_owner(&db, "alice").unwrap();
        let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["compras", "vendas"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &preset("alice", "compras")).unwrap();
        assert!(insert(&db, &preset("alice", "compras")).is_err());
    }
}
