use regex::Regex;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Column of the first price in a sale-point row (`lat, lon`, three address cells, prices).
pub const PRICE_OFFSET: usize = 5;

/// Sale-point coordinates are stored as integer degrees × 100000.
pub const COORD_SCALE: f64 = 100_000.0;

/// Canonical department order used by the metrics files: `01..19`, `2A`, `2B`, `21..95`.
pub static DEPARTMENTS: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut out: Vec<String> = (1..20).map(|d| format!("{:02}", d)).collect();
    out.push("2A".into());
    out.push("2B".into());
    out.extend((21..96).map(|d| d.to_string()));
    out
});

static DEPARTMENT_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}|2[AaBb])$").expect("department code regex")
});

/// Normalize a department code: `"1"` -> `"01"`, `"2a"` -> `"2A"`, `"75"` -> `"75"`.
/// Returns `None` for anything that is not shaped like a department code.
pub fn normalize_department_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if !DEPARTMENT_CODE.is_match(raw) {
        return None;
    }
    if raw.eq_ignore_ascii_case("2a") || raw.eq_ignore_ascii_case("2b") {
        return Some(raw.to_ascii_uppercase());
    }
    let n: u32 = raw.parse().ok()?;
    Some(format!("{:02}", n))
}

/// Index into [`DEPARTMENTS`] for a postcode (Corsica split at 20200 / 21000).
pub fn department_index(postcode: &str) -> Option<usize> {
    let code: u32 = postcode.trim().parse().ok()?;
    let idx = if code < 1000 {
        return None;
    } else if code < 20000 {
        (code / 1000) as usize - 1
    } else if code < 20200 {
        19
    } else if code < 21000 {
        20
    } else {
        (code / 1000) as usize
    };
    (idx < DEPARTMENTS.len()).then_some(idx)
}

/// Region value fed to the choropleth: `value == None` means "no data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionValue {
    pub code: String,
    pub value: Option<f64>,
    #[serde(default)]
    pub info: BTreeMap<String, String>,
}

impl RegionValue {
    pub fn new(code: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            code: code.into(),
            value,
            info: BTreeMap::new(),
        }
    }

    pub fn with_info(mut self, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.info.insert(title.into(), text.into());
        self
    }
}

/// One entry of the fuel catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuelType {
    pub id: String,
    pub name: String,
}

/// Ordered mapping fuel id -> display name.
///
/// Accepts both wire forms: an object `{"1": "Gazole", ...}` (document order is kept)
/// or an array of names `["GAZOLE", ...]` where the name doubles as the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuelCatalog {
    entries: Vec<FuelType>,
}

impl FuelCatalog {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(|n| {
                let name = n.into();
                FuelType {
                    id: name.clone(),
                    name,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(id, name)| FuelType {
                id: id.into(),
                name: name.into(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FuelType> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|f| f.name.clone()).collect()
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.name.as_str())
    }

    /// Position of a fuel given either its id or its display name (case-insensitive).
    pub fn position(&self, id_or_name: &str) -> Option<usize> {
        self.entries.iter().position(|f| {
            f.id.eq_ignore_ascii_case(id_or_name) || f.name.eq_ignore_ascii_case(id_or_name)
        })
    }
}

impl<'de> Deserialize<'de> for FuelCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = FuelCatalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "an object of fuel id -> name, or an array of fuel names")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut names: Vec<String> = Vec::new();
                while let Some(name) = seq.next_element::<String>()? {
                    names.push(name);
                }
                Ok(FuelCatalog::from_names(names))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs: Vec<(String, String)> = Vec::new();
                while let Some((id, name)) = map.next_entry::<String, String>()? {
                    pairs.push((id, name));
                }
                Ok(FuelCatalog::from_pairs(pairs))
            }
        }

        deserializer.deserialize_any(CatalogVisitor)
    }
}

impl Serialize for FuelCatalog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for f in &self.entries {
            map.serialize_entry(&f.id, &f.name)?;
        }
        map.end()
    }
}

/// Normalized metrics: global and per-department averages, aligned to the fuel catalog.
///
/// `averages_by_departments[fuel][department]`, `None` where no sale point reported a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetricsWire")]
pub struct Metrics {
    pub fuel_types: FuelCatalog,
    pub departments: Vec<String>,
    pub averages_global: Vec<Option<f64>>,
    pub averages_by_departments: Vec<Vec<Option<f64>>>,
}

impl Metrics {
    /// Global average for a fuel, by id or display name.
    pub fn global_average(&self, fuel: &str) -> Option<f64> {
        let i = self.fuel_types.position(fuel)?;
        self.averages_global.get(i).copied().flatten()
    }

    /// `(department code, average)` for one fuel, in department order.
    pub fn department_averages(&self, fuel_idx: usize) -> Vec<(&str, Option<f64>)> {
        let row = self.averages_by_departments.get(fuel_idx);
        self.departments
            .iter()
            .enumerate()
            .map(|(d, code)| {
                let v = row.and_then(|r| r.get(d).copied().flatten());
                (code.as_str(), v)
            })
            .collect()
    }
}

/// Wire shapes found across page versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum MetricsWire {
    // Tried first: `metrics` is mandatory here, while every flat field has a default.
    Nested {
        fuel_types: FuelCatalog,
        metrics: NestedMetrics,
    },
    Flat {
        fuel_types: FuelCatalog,
        #[serde(default)]
        departments: Vec<String>,
        #[serde(default)]
        averages_global: Vec<Option<f64>>,
        #[serde(default)]
        averages_by_departments: Vec<Vec<Option<f64>>>,
    },
}

#[derive(Deserialize)]
struct NestedMetrics {
    averages: BTreeMap<String, BTreeMap<String, f64>>,
}

fn price_or_none(v: Option<f64>) -> Option<f64> {
    v.filter(|p| p.is_finite() && *p >= 0.0)
}

impl From<MetricsWire> for Metrics {
    fn from(w: MetricsWire) -> Self {
        match w {
            MetricsWire::Flat {
                fuel_types,
                departments,
                averages_global,
                averages_by_departments,
            } => Metrics {
                fuel_types,
                departments: departments
                    .iter()
                    .map(|d| normalize_department_code(d).unwrap_or_else(|| d.clone()))
                    .collect(),
                averages_global: averages_global.into_iter().map(price_or_none).collect(),
                averages_by_departments: averages_by_departments
                    .into_iter()
                    .map(|row| row.into_iter().map(price_or_none).collect())
                    .collect(),
            },
            MetricsWire::Nested {
                fuel_types,
                metrics,
            } => {
                let mut by_dept: BTreeMap<String, &BTreeMap<String, f64>> = BTreeMap::new();
                let mut total = None;
                for (key, prices) in &metrics.averages {
                    if key == "total" {
                        total = Some(prices);
                    } else {
                        let code = normalize_department_code(key).unwrap_or_else(|| key.clone());
                        by_dept.insert(code, prices);
                    }
                }
                // Canonical order first, then anything unexpected in key order.
                let mut departments: Vec<String> = DEPARTMENTS
                    .iter()
                    .filter(|d| by_dept.contains_key(*d))
                    .cloned()
                    .collect();
                for code in by_dept.keys() {
                    if !departments.contains(code) {
                        departments.push(code.clone());
                    }
                }

                let averages_global = fuel_types
                    .iter()
                    .map(|f| price_or_none(total.and_then(|t| t.get(&f.id).copied())))
                    .collect();
                let averages_by_departments = fuel_types
                    .iter()
                    .map(|f| {
                        departments
                            .iter()
                            .map(|d| price_or_none(by_dept[d].get(&f.id).copied()))
                            .collect()
                    })
                    .collect();
                Metrics {
                    fuel_types,
                    departments,
                    averages_global,
                    averages_by_departments,
                }
            }
        }
    }
}

/// One row of the sale-points listing. Coordinates are in degrees; prices keep their raw
/// value (`< 0` means "not sold here").
#[derive(Debug, Clone, PartialEq)]
pub struct SalePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub street: String,
    pub postcode: String,
    pub prices: Vec<f64>,
}

impl SalePoint {
    /// Raw value of a row column (`PRICE_OFFSET..` are prices).
    pub fn price_at(&self, column: usize) -> Option<f64> {
        column
            .checked_sub(PRICE_OFFSET)
            .and_then(|i| self.prices.get(i).copied())
    }
}

impl<'de> Deserialize<'de> for SalePoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = SalePoint;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a sale-point row [lat, lon, city, street, postcode, prices...]")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let lat: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let lon: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let city: Option<StringOrNumber> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                let street: Option<StringOrNumber> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(3, &self))?;
                let postcode: Option<StringOrNumber> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(4, &self))?;
                let mut prices = Vec::new();
                while let Some(p) = seq.next_element::<Option<f64>>()? {
                    prices.push(p.unwrap_or(-1.0));
                }
                Ok(SalePoint {
                    latitude: lat / COORD_SCALE,
                    longitude: lon / COORD_SCALE,
                    city: city.map(|c| c.0).unwrap_or_default(),
                    street: street.map(|c| c.0).unwrap_or_default(),
                    postcode: postcode.map(|c| c.0).unwrap_or_default(),
                    prices,
                })
            }
        }

        deserializer.deserialize_seq(RowVisitor)
    }
}

impl Serialize for SalePoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(PRICE_OFFSET + self.prices.len()))?;
        seq.serialize_element(&(self.latitude * COORD_SCALE).round())?;
        seq.serialize_element(&(self.longitude * COORD_SCALE).round())?;
        seq.serialize_element(&self.city)?;
        seq.serialize_element(&self.street)?;
        seq.serialize_element(&self.postcode)?;
        for p in &self.prices {
            seq.serialize_element(p)?;
        }
        seq.end()
    }
}

/// Address cells are strings in most files, but postcodes also show up as numbers.
struct StringOrNumber(String);

impl<'de> Deserialize<'de> for StringOrNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;

        impl<'de> Visitor<'de> for V {
            type Value = StringOrNumber;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a string or an integer postcode")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StringOrNumber(format!("{:05}", v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v < 0 {
                    return Err(E::custom("negative postcode"));
                }
                Ok(StringOrNumber(format!("{:05}", v)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(E::custom("invalid postcode"));
                }
                Ok(StringOrNumber(format!("{:05}", v as u64)))
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StringOrNumber(s.trim().to_string()))
            }
        }

        deserializer.deserialize_any(V)
    }
}

/// Address column names as [`SalePoints`] keeps them, in row order after the coordinates.
const ADDRESS_KEYS: [&str; 3] = ["city", "street", "postcode"];

/// Row columns of city, street and postcode named by `keys`.
///
/// Files written by the snapshot pipeline order the block `address, postcode, city`;
/// older listings use `city, street, postcode`. Unnamed or ambiguous blocks keep
/// the legacy positions.
fn address_columns(keys: &[String]) -> [usize; 3] {
    const LEGACY: [usize; 3] = [2, 3, 4];
    let find = |names: &[&str], fallback: usize| {
        keys.iter()
            .enumerate()
            .take(PRICE_OFFSET)
            .skip(2)
            .find(|(_, k)| names.iter().any(|n| k.trim().eq_ignore_ascii_case(n)))
            .map_or(fallback, |(i, _)| i)
    };
    let columns = [
        find(&["city"], LEGACY[0]),
        find(&["street", "address"], LEGACY[1]),
        find(&["postcode"], LEGACY[2]),
    ];
    let distinct = columns[0] != columns[1] && columns[0] != columns[2] && columns[1] != columns[2];
    if distinct { columns } else { LEGACY }
}

#[derive(Deserialize)]
struct SalePointsWire {
    keys: Vec<String>,
    data: Vec<SalePoint>,
}

impl From<SalePointsWire> for SalePoints {
    fn from(wire: SalePointsWire) -> Self {
        let columns = address_columns(&wire.keys);
        let mut data = wire.data;
        if columns != [2, 3, 4] {
            log::debug!("address columns at {:?} (city, street, postcode)", columns);
            for point in &mut data {
                // Rows were read positionally into city, street, postcode.
                let mut cells = [
                    std::mem::take(&mut point.city),
                    std::mem::take(&mut point.street),
                    std::mem::take(&mut point.postcode),
                ];
                point.city = std::mem::take(&mut cells[columns[0] - 2]);
                point.street = std::mem::take(&mut cells[columns[1] - 2]);
                point.postcode = std::mem::take(&mut cells[columns[2] - 2]);
            }
        }
        let mut keys = wire.keys;
        for (key, name) in keys.iter_mut().skip(2).take(3).zip(ADDRESS_KEYS) {
            *key = name.to_string();
        }
        SalePoints { keys, data }
    }
}

/// Sale-points file: column names plus one row per sale point.
///
/// The address block is resolved from `keys` on load, so `keys` always reads
/// `latitude, longitude, city, street, postcode` followed by the fuel names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SalePointsWire")]
pub struct SalePoints {
    pub keys: Vec<String>,
    pub data: Vec<SalePoint>,
}

impl SalePoints {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fuel names, i.e. the column names after the address block.
    pub fn fuel_names(&self) -> Vec<String> {
        self.keys.iter().skip(PRICE_OFFSET).cloned().collect()
    }

    /// Row column holding the prices of the named fuel.
    pub fn fuel_column(&self, name: &str) -> Option<usize> {
        self.keys
            .iter()
            .enumerate()
            .skip(PRICE_OFFSET)
            .find(|(_, k)| k.eq_ignore_ascii_case(name))
            .map(|(i, _)| i)
    }

    /// Sale points selling the fuel at `column` (price `> 0`), with that price.
    pub fn priced_at(&self, column: usize) -> impl Iterator<Item = (&SalePoint, f64)> {
        self.data.iter().filter_map(move |p| match p.price_at(column) {
            Some(price) if price > 0.0 => Some((p, price)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_list_shape() {
        assert_eq!(DEPARTMENTS.len(), 96);
        assert_eq!(DEPARTMENTS[0], "01");
        assert_eq!(DEPARTMENTS[19], "2A");
        assert_eq!(DEPARTMENTS[20], "2B");
        assert_eq!(DEPARTMENTS[21], "21");
        assert_eq!(DEPARTMENTS[95], "95");
    }

    #[test]
    fn postcode_to_department() {
        assert_eq!(department_index("01000").map(|i| DEPARTMENTS[i].as_str()), Some("01"));
        assert_eq!(department_index("20000").map(|i| DEPARTMENTS[i].as_str()), Some("2A"));
        assert_eq!(department_index("20290").map(|i| DEPARTMENTS[i].as_str()), Some("2B"));
        assert_eq!(department_index("75011").map(|i| DEPARTMENTS[i].as_str()), Some("75"));
        assert_eq!(department_index("97400"), None);
        assert_eq!(department_index("abc"), None);
    }

    #[test]
    fn normalizes_codes() {
        assert_eq!(normalize_department_code("1").as_deref(), Some("01"));
        assert_eq!(normalize_department_code("2a").as_deref(), Some("2A"));
        assert_eq!(normalize_department_code(" 75 ").as_deref(), Some("75"));
        assert_eq!(normalize_department_code("Paris"), None);
    }

    #[test]
    fn catalog_keeps_object_order() {
        let c: FuelCatalog =
            serde_json::from_str(r#"{"2":"SP95","1":"Gazole","5":"E10"}"#).unwrap();
        assert_eq!(c.names(), vec!["SP95", "Gazole", "E10"]);
        assert_eq!(c.position("gazole"), Some(1));
        assert_eq!(c.name_of("5"), Some("E10"));
    }
    #[test]
    fn flat_metrics_drop_negative_averages() {
        let m: Metrics = serde_json::from_str(
            r#"{"fuel_types": ["GAZOLE", "E85"], "departments": ["1", "2A"],
                "averages_global": [1.8, -1],
                "averages_by_departments": [[1.7, 1.9], [-1, 0.8]]}"#,
        )
        .unwrap();
        assert_eq!(m.departments, vec!["01", "2A"]);
        assert_eq!(m.averages_global, vec![Some(1.8), None]);
        assert_eq!(m.global_average("gazole"), Some(1.8));
        assert_eq!(m.department_averages(1), vec![("01", None), ("2A", Some(0.8))]);
    }

    #[test]
    fn nested_metrics_follow_department_order() {
        let m: Metrics = serde_json::from_str(
            r#"{"fuel_types": {"1": "Gazole", "2": "SP95"},
                "metrics": {"averages": {
                    "total": {"1": 1.8, "2": 1.9},
                    "75": {"1": 1.85},
                    "2B": {"1": 1.95, "2": 2.0},
                    "1": {"2": 1.7}}}}"#,
        )
        .unwrap();
        assert_eq!(m.departments, vec!["01", "2B", "75"]);
        assert_eq!(m.averages_global, vec![Some(1.8), Some(1.9)]);
        assert_eq!(m.averages_by_departments[0], vec![None, Some(1.95), Some(1.85)]);
        assert_eq!(m.averages_by_departments[1], vec![Some(1.7), Some(2.0), None]);
    }

    #[test]
    fn sale_point_rows() {
        let p: SalePoint =
            serde_json::from_str(r#"[4650000, 240000, "Paris", "Rue X", 6000, 1.85, null]"#).unwrap();
        assert_eq!(p.postcode, "06000");
        assert_eq!(p.prices, vec![1.85, -1.0]);
        assert_eq!(p.price_at(PRICE_OFFSET), Some(1.85));
        assert_eq!(p.price_at(2), None);
        assert!(serde_json::from_str::<SalePoint>("[1, 2]").is_err());
    }

    #[test]
    fn address_block_follows_keys() {
        let sp: SalePoints = serde_json::from_str(
            r#"{"keys": ["latitude", "longitude", "address", "postcode", "city", "GAZOLE"],
                "data": [[4886000, 235000, "Rue X", "75001", "Paris", 1.85],
                         [4620000, 520000, "Rue Y", 1000, "Bourg-en-Bresse", null]]}"#,
        )
        .unwrap();
        let p = &sp.data[0];
        assert_eq!(p.city, "Paris");
        assert_eq!(p.street, "Rue X");
        assert_eq!(p.postcode, "75001");
        assert_eq!(sp.data[1].postcode, "01000");
        assert_eq!(sp.keys[2..5], ["city", "street", "postcode"]);
        assert_eq!(sp.fuel_names(), vec!["GAZOLE"]);
        assert_eq!(department_index(&p.postcode).map(|i| DEPARTMENTS[i].as_str()), Some("75"));
    }

    #[test]
    fn unnamed_address_block_keeps_legacy_order() {
        let sp: SalePoints = serde_json::from_str(
            r#"{"keys": ["lat", "lon", "a", "b", "c", "E10"],
                "data": [[4650000, 240000, "Paris", "Rue X", "75000", 1.9]]}"#,
        )
        .unwrap();
        assert_eq!(sp.data[0].city, "Paris");
        assert_eq!(sp.data[0].postcode, "75000");
    }
}
