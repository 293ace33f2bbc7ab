//! Database schema and game-data persistence

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::constants::{ExtractorSpec, GameConstants, GeneratorSpec, MachineSpec, PurityTable};
use crate::models::{ExtractorKind, GeneratorKind, MachineKind, Purity, ResourceClass};

const PURITY_MULTIPLIERS: &str = "purity_multipliers";
const RESOURCE_WELL_RATES: &str = "resource_well_rates";

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Scalar game data: version, overclock exponent, pressurizer power, snap threshold
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS extractors (
            kind TEXT PRIMARY KEY,
            base_rate REAL NOT NULL,
            base_power REAL NOT NULL,
            resource_class TEXT NOT NULL,
            purity_applies INTEGER NOT NULL
        );

        -- Multiplier on an extractor's base rate, per purity
        CREATE TABLE IF NOT EXISTS purity_multipliers (
            purity TEXT PRIMARY KEY,
            value REAL NOT NULL
        );

        -- Absolute rate of one resource-well node, per purity
        CREATE TABLE IF NOT EXISTS resource_well_rates (
            purity TEXT PRIMARY KEY,
            value REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS machines (
            kind TEXT PRIMARY KEY,
            base_power REAL NOT NULL,
            max_somersloop INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS generators (
            kind TEXT PRIMARY KEY,
            base_power REAL NOT NULL,
            fuel_per_min REAL
        );

        CREATE TABLE IF NOT EXISTS sticky_values (
            position INTEGER PRIMARY KEY,
            value REAL NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Clear all stored game data
pub fn clear_game_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM sticky_values;
        DELETE FROM generators;
        DELETE FROM machines;
        DELETE FROM resource_well_rates;
        DELETE FROM purity_multipliers;
        DELETE FROM extractors;
        DELETE FROM meta;
        "#,
    )?;
    Ok(())
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        (key, value),
    )?;
    Ok(())
}

fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

fn get_meta_f64(conn: &Connection, key: &str) -> Result<Option<f64>> {
    match get_meta(conn, key)? {
        Some(value) => {
            let parsed = value
                .parse::<f64>()
                .with_context(|| format!("Invalid number for '{}': {}", key, value))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// `table_name` is one of the purity tables created by `init_schema`
fn save_purity_table(conn: &Connection, table_name: &str, table: &PurityTable) -> Result<()> {
    let sql = format!("INSERT OR REPLACE INTO {} (purity, value) VALUES (?1, ?2)", table_name);
    for purity in Purity::ALL {
        conn.execute(&sql, (purity.as_str(), table.get(*purity)))?;
    }
    Ok(())
}

fn load_purity_table(conn: &Connection, table_name: &str, table: &mut PurityTable) -> Result<()> {
    let mut stmt = conn.prepare(&format!("SELECT purity, value FROM {}", table_name))?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    for row in rows {
        let (purity, value) = row?;
        table.set(purity.parse::<Purity>()?, value);
    }
    Ok(())
}

/// Insert or replace an extractor
pub fn upsert_extractor(conn: &Connection, spec: &ExtractorSpec) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO extractors (kind, base_rate, base_power, resource_class, purity_applies)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            spec.kind.as_str(),
            spec.base_rate,
            spec.base_power,
            spec.resource_class.as_str(),
            spec.purity_applies,
        ),
    )?;
    Ok(())
}

/// Insert or replace a machine
pub fn upsert_machine(conn: &Connection, spec: &MachineSpec) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO machines (kind, base_power, max_somersloop) VALUES (?1, ?2, ?3)",
        (spec.kind.as_str(), spec.base_power, spec.max_somersloop),
    )?;
    Ok(())
}

/// Insert or replace a generator
pub fn upsert_generator(conn: &Connection, spec: &GeneratorSpec) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO generators (kind, base_power, fuel_per_min) VALUES (?1, ?2, ?3)",
        (spec.kind.as_str(), spec.base_power, spec.fuel_per_min),
    )?;
    Ok(())
}

/// Replace the stored game data with `constants`
pub fn save_constants(conn: &Connection, constants: &GameConstants) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    clear_game_data(&tx)?;

    set_meta(&tx, "version", &constants.version)?;
    set_meta(&tx, "overclock_exponent", &constants.overclock_exponent.to_string())?;
    set_meta(&tx, "pressurizer_base_power", &constants.pressurizer_base_power.to_string())?;
    set_meta(&tx, "snap_threshold", &constants.snap.threshold.to_string())?;

    save_purity_table(&tx, PURITY_MULTIPLIERS, &constants.purity_multipliers)?;
    save_purity_table(&tx, RESOURCE_WELL_RATES, &constants.resource_well_rates)?;

    for spec in &constants.extractors {
        upsert_extractor(&tx, spec)?;
    }
    for spec in &constants.machines {
        upsert_machine(&tx, spec)?;
    }
    for spec in &constants.generators {
        upsert_generator(&tx, spec)?;
    }
    for (position, value) in constants.snap.sticky_values.iter().enumerate() {
        tx.execute(
            "INSERT INTO sticky_values (position, value) VALUES (?1, ?2)",
            (position as i64, value),
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Load stored game data, or `None` if the database was never seeded
pub fn load_constants(conn: &Connection) -> Result<Option<GameConstants>> {
    let Some(version) = get_meta(conn, "version")? else {
        return Ok(None);
    };

    // Scalars and purity rows missing from an older database keep their defaults
    let mut constants = GameConstants {
        version,
        extractors: list_extractors(conn)?,
        machines: list_machines(conn)?,
        generators: list_generators(conn)?,
        ..GameConstants::default()
    };

    if let Some(exponent) = get_meta_f64(conn, "overclock_exponent")? {
        constants.overclock_exponent = exponent;
    }
    if let Some(power) = get_meta_f64(conn, "pressurizer_base_power")? {
        constants.pressurizer_base_power = power;
    }
    if let Some(threshold) = get_meta_f64(conn, "snap_threshold")? {
        constants.snap.threshold = threshold;
    }

    load_purity_table(conn, PURITY_MULTIPLIERS, &mut constants.purity_multipliers)?;
    load_purity_table(conn, RESOURCE_WELL_RATES, &mut constants.resource_well_rates)?;

    let sticky = list_sticky_values(conn)?;
    if !sticky.is_empty() {
        constants.snap.sticky_values = sticky;
    }

    Ok(Some(constants))
}

/// List all extractors in the database
pub fn list_extractors(conn: &Connection) -> Result<Vec<ExtractorSpec>> {
    let mut stmt = conn.prepare(
        "SELECT kind, base_rate, base_power, resource_class, purity_applies FROM extractors ORDER BY kind",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, bool>(4)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (kind, base_rate, base_power, resource_class, purity_applies) = row?;
        results.push(ExtractorSpec {
            kind: kind.parse::<ExtractorKind>()?,
            base_rate,
            base_power,
            resource_class: resource_class.parse::<ResourceClass>()?,
            purity_applies,
        });
    }
    Ok(results)
}

/// List all machines in the database
pub fn list_machines(conn: &Connection) -> Result<Vec<MachineSpec>> {
    let mut stmt =
        conn.prepare("SELECT kind, base_power, max_somersloop FROM machines ORDER BY kind")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, u32>(2)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (kind, base_power, max_somersloop) = row?;
        results.push(MachineSpec {
            kind: kind.parse::<MachineKind>()?,
            base_power,
            max_somersloop,
        });
    }
    Ok(results)
}

/// List all generators in the database
pub fn list_generators(conn: &Connection) -> Result<Vec<GeneratorSpec>> {
    let mut stmt =
        conn.prepare("SELECT kind, base_power, fuel_per_min FROM generators ORDER BY kind")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, Option<f64>>(2)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (kind, base_power, fuel_per_min) = row?;
        results.push(GeneratorSpec {
            kind: kind.parse::<GeneratorKind>()?,
            base_power,
            fuel_per_min,
        });
    }
    Ok(results)
}

fn list_sticky_values(conn: &Connection) -> Result<Vec<f64>> {
    let mut stmt = conn.prepare("SELECT value FROM sticky_values ORDER BY position")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
