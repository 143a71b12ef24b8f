use std::fmt;
use std::fmt::Formatter;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use crate::models::{DateCount, GenerationRecord, MeteoRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
pub struct StoreError(pub String);
impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "StoreError: {}", self.0)
    }
}
impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self { StoreError(e.to_string()) }
}
impl From<chrono::ParseError> for StoreError {
    fn from(e: chrono::ParseError) -> Self { StoreError(e.to_string()) }
}

/// SQLite tabular store holding the `meteo` and `pse` series.
///
/// Timestamps are the primary key of each table, so importing an already
/// seen range upserts instead of duplicating rows.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens the database at the given path and ensures the schema exists.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS meteo (
                time TEXT PRIMARY KEY,
                temperature_2m REAL,
                cloud_cover REAL,
                wind_speed_10m REAL,
                wind_gusts_10m REAL,
                relative_humidity_2m REAL,
                shortwave_radiation REAL,
                direct_radiation REAL,
                diffuse_radiation REAL,
                global_tilted_irradiance REAL,
                direct_normal_irradiance REAL,
                terrestrial_radiation REAL,
                business_date TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS pse (
                plan_dtime TEXT PRIMARY KEY,
                fcst_pv_tot_gen REAL NOT NULL,
                business_date TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Upserts a batch of weather rows. Returns the number of rows written.
    pub fn upsert_meteo(&mut self, rows: &[MeteoRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO meteo (
                    time, temperature_2m, cloud_cover, wind_speed_10m, wind_gusts_10m,
                    relative_humidity_2m, shortwave_radiation, direct_radiation,
                    diffuse_radiation, global_tilted_irradiance, direct_normal_irradiance,
                    terrestrial_radiation, business_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;

            for row in rows {
                stmt.execute(params![
                    row.time.format(TIMESTAMP_FORMAT).to_string(),
                    row.temperature_2m,
                    row.cloud_cover,
                    row.wind_speed_10m,
                    row.wind_gusts_10m,
                    row.relative_humidity_2m,
                    row.shortwave_radiation,
                    row.direct_radiation,
                    row.diffuse_radiation,
                    row.global_tilted_irradiance,
                    row.direct_normal_irradiance,
                    row.terrestrial_radiation,
                    row.business_date().format(DATE_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    /// Upserts a batch of generation rows. Returns the number of rows written.
    pub fn upsert_generation(&mut self, rows: &[GenerationRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO pse (plan_dtime, fcst_pv_tot_gen, business_date)
                 VALUES (?1, ?2, ?3)",
            )?;

            for row in rows {
                stmt.execute(params![
                    row.plan_dtime.format(TIMESTAMP_FORMAT).to_string(),
                    row.fcst_pv_tot_gen,
                    row.business_date().format(DATE_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    /// Returns the full weather series ordered by timestamp.
    pub fn load_meteo(&self) -> Result<Vec<MeteoRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT time, temperature_2m, cloud_cover, wind_speed_10m, wind_gusts_10m,
                    relative_humidity_2m, shortwave_radiation, direct_radiation,
                    diffuse_radiation, global_tilted_irradiance, direct_normal_irradiance,
                    terrestrial_radiation
             FROM meteo ORDER BY time ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                    row.get::<_, Option<f64>>(8)?,
                    row.get::<_, Option<f64>>(9)?,
                    row.get::<_, Option<f64>>(10)?,
                    row.get::<_, Option<f64>>(11)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(rows.len());
        for (time, t2m, cc, ws, wg, rh, swr, dr, dfr, gti, dni, tr) in rows {
            result.push(MeteoRecord {
                time: parse_timestamp(&time)?,
                temperature_2m: t2m,
                cloud_cover: cc,
                wind_speed_10m: ws,
                wind_gusts_10m: wg,
                relative_humidity_2m: rh,
                shortwave_radiation: swr,
                direct_radiation: dr,
                diffuse_radiation: dfr,
                global_tilted_irradiance: gti,
                direct_normal_irradiance: dni,
                terrestrial_radiation: tr,
            });
        }

        Ok(result)
    }

    /// Returns the full generation series ordered by timestamp.
    pub fn load_generation(&self) -> Result<Vec<GenerationRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT plan_dtime, fcst_pv_tot_gen FROM pse ORDER BY plan_dtime ASC")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(rows.len());
        for (plan_dtime, value) in rows {
            result.push(GenerationRecord {
                plan_dtime: parse_timestamp(&plan_dtime)?,
                fcst_pv_tot_gen: value,
            });
        }

        Ok(result)
    }

    pub fn meteo_dates(&self) -> Result<Vec<DateCount>, StoreError> {
        self.dates_of("meteo")
    }

    pub fn generation_dates(&self) -> Result<Vec<DateCount>, StoreError> {
        self.dates_of("pse")
    }

    fn dates_of(&self, table: &str) -> Result<Vec<DateCount>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT business_date, COUNT(*) AS cnt FROM {} GROUP BY business_date ORDER BY business_date ASC",
            table
        ))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(rows.len());
        for (date, cnt) in rows {
            result.push(DateCount {
                business_date: NaiveDate::parse_from_str(&date, DATE_FORMAT)?,
                cnt,
            });
        }

        Ok(result)
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, StoreError> {
    Ok(NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)?)
}
