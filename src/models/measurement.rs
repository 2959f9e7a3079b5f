use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// The data columns a sounding file may carry, named exactly as they appear in
/// the header row and in the `measurements` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasurementField {
    Time,
    Pscl,
    T,
    Rh,
    V,
    U,
    Height,
    P,
    Td,
    Mr,
    Dd,
    Ff,
    Az,
    Range,
    Lon,
    Lat,
    SpuKey,
    UsrKey,
    RadarH,
}

impl MeasurementField {
    /// Every data column, in table order.
    pub const ALL: [MeasurementField; 19] = [
        MeasurementField::Time,
        MeasurementField::Pscl,
        MeasurementField::T,
        MeasurementField::Rh,
        MeasurementField::V,
        MeasurementField::U,
        MeasurementField::Height,
        MeasurementField::P,
        MeasurementField::Td,
        MeasurementField::Mr,
        MeasurementField::Dd,
        MeasurementField::Ff,
        MeasurementField::Az,
        MeasurementField::Range,
        MeasurementField::Lon,
        MeasurementField::Lat,
        MeasurementField::SpuKey,
        MeasurementField::UsrKey,
        MeasurementField::RadarH,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            MeasurementField::Time => "time",
            MeasurementField::Pscl => "Pscl",
            MeasurementField::T => "T",
            MeasurementField::Rh => "RH",
            MeasurementField::V => "v",
            MeasurementField::U => "u",
            MeasurementField::Height => "Height",
            MeasurementField::P => "P",
            MeasurementField::Td => "TD",
            MeasurementField::Mr => "MR",
            MeasurementField::Dd => "DD",
            MeasurementField::Ff => "FF",
            MeasurementField::Az => "AZ",
            MeasurementField::Range => "Range",
            MeasurementField::Lon => "Lon",
            MeasurementField::Lat => "Lat",
            MeasurementField::SpuKey => "SpuKey",
            MeasurementField::UsrKey => "UsrKey",
            MeasurementField::RadarH => "RadarH",
        }
    }

    /// Case-sensitive lookup of a header token.
    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.column_name() == name)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, MeasurementField::SpuKey | MeasurementField::UsrKey)
    }
}

impl std::fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// One data row of a sounding. Columns the file did not carry stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub time: Option<f64>,
    #[serde(rename = "Pscl")]
    pub pscl: Option<f64>,
    #[serde(rename = "T")]
    pub t: Option<f64>,
    #[serde(rename = "RH")]
    pub rh: Option<f64>,
    pub v: Option<f64>,
    pub u: Option<f64>,
    #[serde(rename = "Height")]
    pub height: Option<f64>,
    #[serde(rename = "P")]
    pub p: Option<f64>,
    #[serde(rename = "TD")]
    pub td: Option<f64>,
    #[serde(rename = "MR")]
    pub mr: Option<f64>,
    #[serde(rename = "DD")]
    pub dd: Option<f64>,
    #[serde(rename = "FF")]
    pub ff: Option<f64>,
    #[serde(rename = "AZ")]
    pub az: Option<f64>,
    #[serde(rename = "Range")]
    pub range: Option<f64>,
    #[serde(rename = "Lon")]
    pub lon: Option<f64>,
    #[serde(rename = "Lat")]
    pub lat: Option<f64>,
    #[serde(rename = "SpuKey")]
    pub spu_key: Option<i64>,
    #[serde(rename = "UsrKey")]
    pub usr_key: Option<i64>,
    #[serde(rename = "RadarH")]
    pub radar_h: Option<f64>,
}

impl Measurement {
    fn real_slot(&mut self, field: MeasurementField) -> Option<&mut Option<f64>> {
        let slot = match field {
            MeasurementField::Time => &mut self.time,
            MeasurementField::Pscl => &mut self.pscl,
            MeasurementField::T => &mut self.t,
            MeasurementField::Rh => &mut self.rh,
            MeasurementField::V => &mut self.v,
            MeasurementField::U => &mut self.u,
            MeasurementField::Height => &mut self.height,
            MeasurementField::P => &mut self.p,
            MeasurementField::Td => &mut self.td,
            MeasurementField::Mr => &mut self.mr,
            MeasurementField::Dd => &mut self.dd,
            MeasurementField::Ff => &mut self.ff,
            MeasurementField::Az => &mut self.az,
            MeasurementField::Range => &mut self.range,
            MeasurementField::Lon => &mut self.lon,
            MeasurementField::Lat => &mut self.lat,
            MeasurementField::RadarH => &mut self.radar_h,
            MeasurementField::SpuKey | MeasurementField::UsrKey => return None,
        };
        Some(slot)
    }

    /// Store a real-valued column. Integer columns are ignored here; use
    /// [`Measurement::set_integer`] for those.
    pub fn set_real(&mut self, field: MeasurementField, value: Option<f64>) {
        if let Some(slot) = self.real_slot(field) {
            *slot = value;
        }
    }

    pub fn set_integer(&mut self, field: MeasurementField, value: Option<i64>) {
        match field {
            MeasurementField::SpuKey => self.spu_key = value,
            MeasurementField::UsrKey => self.usr_key = value,
            _ => self.set_real(field, value.map(|v| v as f64)),
        }
    }

    /// Read any column as a float, integer columns included.
    pub fn get(&self, field: MeasurementField) -> Option<f64> {
        match field {
            MeasurementField::Time => self.time,
            MeasurementField::Pscl => self.pscl,
            MeasurementField::T => self.t,
            MeasurementField::Rh => self.rh,
            MeasurementField::V => self.v,
            MeasurementField::U => self.u,
            MeasurementField::Height => self.height,
            MeasurementField::P => self.p,
            MeasurementField::Td => self.td,
            MeasurementField::Mr => self.mr,
            MeasurementField::Dd => self.dd,
            MeasurementField::Ff => self.ff,
            MeasurementField::Az => self.az,
            MeasurementField::Range => self.range,
            MeasurementField::Lon => self.lon,
            MeasurementField::Lat => self.lat,
            MeasurementField::SpuKey => self.spu_key.map(|v| v as f64),
            MeasurementField::UsrKey => self.usr_key.map(|v| v as f64),
            MeasurementField::RadarH => self.radar_h,
        }
    }

    /// SQL value for a column; integer columns bind as INTEGER, the rest as REAL.
    pub fn sql_value(&self, field: MeasurementField) -> Value {
        match field {
            MeasurementField::SpuKey => Value::from(self.spu_key),
            MeasurementField::UsrKey => Value::from(self.usr_key),
            other => Value::from(self.get(other)),
        }
    }
}

/// A measurement as stored, with its identity and owning launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub id: i64,
    pub launch_id: i64,
    #[serde(flatten)]
    pub values: Measurement,
}
