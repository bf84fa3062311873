use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::models::{NewProperty, Property, PropertyOption, PropertyType};

const PROPERTY_COLUMNS: &str = "id, name, address, property_type, purchase_price_cents,
     purchase_date, notes, created_at, updated_at";

fn row_to_property(row: &Row) -> rusqlite::Result<Property> {
    let property_type: String = row.get(3)?;
    Ok(Property {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        property_type: PropertyType::parse(&property_type).unwrap_or_else(|| {
            warn!(value = %property_type, "Unknown property type, using Residential");
            PropertyType::Residential
        }),
        purchase_price_cents: row.get(4)?,
        purchase_date: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn list_properties(conn: &Connection) -> rusqlite::Result<Vec<Property>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM properties ORDER BY name COLLATE NOCASE",
        PROPERTY_COLUMNS
    ))?;

    let properties = stmt
        .query_map([], row_to_property)?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = properties.len(), "Listed properties");
    Ok(properties)
}

pub fn list_property_options(conn: &Connection) -> rusqlite::Result<Vec<PropertyOption>> {
    let mut stmt = conn.prepare("SELECT id, name FROM properties ORDER BY name COLLATE NOCASE")?;

    let options = stmt
        .query_map([], |row| {
            Ok(PropertyOption {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(options)
}

pub fn get_property(conn: &Connection, id: i64) -> rusqlite::Result<Option<Property>> {
    conn.query_row(
        &format!("SELECT {} FROM properties WHERE id = ?", PROPERTY_COLUMNS),
        [id],
        row_to_property,
    )
    .optional()
}

pub fn create_property(conn: &Connection, property: &NewProperty) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO properties
             (name, address, property_type, purchase_price_cents, purchase_date, notes)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            property.name,
            property.address,
            property.property_type.as_str(),
            property.purchase_price_cents,
            property.purchase_date,
            property.notes,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(property_id = id, name = %property.name, "Created property");
    Ok(id)
}

pub fn update_property(
    conn: &Connection,
    id: i64,
    property: &NewProperty,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE properties
         SET name = ?, address = ?, property_type = ?, purchase_price_cents = ?,
             purchase_date = ?, notes = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![
            property.name,
            property.address,
            property.property_type.as_str(),
            property.purchase_price_cents,
            property.purchase_date,
            property.notes,
            id,
        ],
    )?;
    if rows > 0 {
        info!(property_id = id, name = %property.name, "Updated property");
    }
    Ok(rows > 0)
}

/// Removes the property and, through cascading foreign keys, everything
/// recorded against it.
pub fn delete_property(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM properties WHERE id = ?", [id])?;
    if rows > 0 {
        info!(property_id = id, "Deleted property");
    }
    Ok(rows > 0)
}
