use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::models::{NewValuation, Valuation};

const VALUATION_COLUMNS: &str =
    "id, property_id, valuation_date, value_cents, source, notes, created_at";

fn row_to_valuation(row: &Row) -> rusqlite::Result<Valuation> {
    Ok(Valuation {
        id: row.get(0)?,
        property_id: row.get(1)?,
        valuation_date: row.get(2)?,
        value_cents: row.get(3)?,
        source: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Valuations, most recent first.
pub fn list_valuations(
    conn: &Connection,
    property_id: Option<i64>,
) -> rusqlite::Result<Vec<Valuation>> {
    let mut sql = format!("SELECT {} FROM valuations WHERE 1=1", VALUATION_COLUMNS);
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(property_id) = property_id {
        sql.push_str(" AND property_id = ?");
        params_vec.push(Box::new(property_id));
    }
    sql.push_str(" ORDER BY valuation_date DESC, id DESC");

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let valuations = stmt
        .query_map(params_refs.as_slice(), row_to_valuation)?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = valuations.len(), ?property_id, "Listed valuations");
    Ok(valuations)
}

pub fn get_valuation(conn: &Connection, id: i64) -> rusqlite::Result<Option<Valuation>> {
    conn.query_row(
        &format!("SELECT {} FROM valuations WHERE id = ?", VALUATION_COLUMNS),
        [id],
        row_to_valuation,
    )
    .optional()
}

pub fn latest_valuation(
    conn: &Connection,
    property_id: i64,
) -> rusqlite::Result<Option<Valuation>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM valuations WHERE property_id = ?
             ORDER BY valuation_date DESC, id DESC LIMIT 1",
            VALUATION_COLUMNS
        ),
        [property_id],
        row_to_valuation,
    )
    .optional()
}

/// Latest value per property, keyed by property id.
pub fn latest_values_by_property(conn: &Connection) -> rusqlite::Result<HashMap<i64, i64>> {
    let mut stmt = conn.prepare(
        "SELECT v.property_id, v.value_cents
         FROM valuations v
         WHERE v.id = (
             SELECT v2.id FROM valuations v2
             WHERE v2.property_id = v.property_id
             ORDER BY v2.valuation_date DESC, v2.id DESC
             LIMIT 1
         )",
    )?;

    let values = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<HashMap<_, _>, _>>()?;

    Ok(values)
}

pub fn create_valuation(conn: &Connection, valuation: &NewValuation) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO valuations (property_id, valuation_date, value_cents, source, notes)
         VALUES (?, ?, ?, ?, ?)",
        params![
            valuation.property_id,
            valuation.valuation_date,
            valuation.value_cents,
            valuation.source,
            valuation.notes,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(valuation_id = id, property_id = valuation.property_id, "Recorded valuation");
    Ok(id)
}

pub fn update_valuation(
    conn: &Connection,
    id: i64,
    valuation: &NewValuation,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE valuations
         SET property_id = ?, valuation_date = ?, value_cents = ?, source = ?, notes = ?
         WHERE id = ?",
        params![
            valuation.property_id,
            valuation.valuation_date,
            valuation.value_cents,
            valuation.source,
            valuation.notes,
            id,
        ],
    )?;
    if rows > 0 {
        info!(valuation_id = id, "Updated valuation");
    }
    Ok(rows > 0)
}

pub fn delete_valuation(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM valuations WHERE id = ?", [id])?;
    if rows > 0 {
        info!(valuation_id = id, "Deleted valuation");
    }
    Ok(rows > 0)
}
