//! Configuration structures for the turnover pipeline.

use crate::error::{Error, Result};
use crate::types::{category_key, FUTCOM, FUTIDX, OPTFUT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Main configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How to read the raw table of the source feed.
    pub source: SourceConfig,
    /// Closed set of output columns.
    pub universe: ColumnUniverse,
    /// Rendering and diagnostics.
    pub output: OutputConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(json)?;
        config.universe.normalize_keys();
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that the configuration can produce a well-formed report.
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.universe.validate()?;
        if !(self.output.checksum_tolerance >= 0.0) {
            return Err(Error::config("checksum_tolerance must be >= 0"));
        }
        Ok(())
    }
}

/// Where an observation field comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldBinding {
    /// Read from the header column with this name.
    Column(String),
    /// Use this literal for every row.
    Fixed(String),
}

impl FieldBinding {
    pub fn column(name: &str) -> Self {
        FieldBinding::Column(name.to_string())
    }

    pub fn fixed(value: &str) -> Self {
        FieldBinding::Fixed(value.to_string())
    }
}

/// What to do with a row whose date does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Drop the row and record the error.
    Skip,
    /// Fail the whole batch.
    #[default]
    Abort,
}

/// Per-feed description of the raw table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Feed name, used in logs and errors.
    pub name: String,
    /// Header column holding the date.
    pub date_column: String,
    /// `chrono` format of the date cell (after the suffix is appended).
    pub date_format: String,
    /// Text appended to every date cell before parsing (e.g. a year).
    #[serde(default)]
    pub date_suffix: Option<String>,
    pub instrument: FieldBinding,
    pub commodity: FieldBinding,
    /// Header column holding the turnover value.
    pub value_column: String,
    #[serde(default)]
    pub date_policy: DatePolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::mcx()
    }
}

impl SourceConfig {
    /// MCX historical data, date-wise detail table.
    pub fn mcx() -> Self {
        Self {
            name: "mcx".to_string(),
            date_column: "Date".to_string(),
            date_format: "%d %b %Y".to_string(),
            date_suffix: None,
            instrument: FieldBinding::column("Instrument"),
            commodity: FieldBinding::column("Commodity"),
            value_column: "Total Value (Lacs)".to_string(),
            date_policy: DatePolicy::Abort,
        }
    }

    /// NSE F&O business growth, daily table.
    pub fn nse_fo() -> Self {
        Self {
            name: "nse-fo".to_string(),
            date_column: "Date".to_string(),
            date_format: "%d-%b-%Y".to_string(),
            date_suffix: None,
            instrument: FieldBinding::fixed("NSE_IDXOPT_PREMIUM"),
            commodity: FieldBinding::fixed(""),
            value_column: "Index Options Premium Turnover".to_string(),
            date_policy: DatePolicy::Abort,
        }
    }

    /// BSE derivatives turnover, daily table. Cells read `Oct 01`; the year
    /// comes from the page and is appended before parsing.
    pub fn bse_derivatives(year: i32) -> Self {
        Self {
            name: "bse-derivatives".to_string(),
            date_column: "Date".to_string(),
            date_format: "%b %d %Y".to_string(),
            date_suffix: Some(format!(" {}", year)),
            instrument: FieldBinding::fixed("BSE_IDXOPT_PREMIUM"),
            commodity: FieldBinding::fixed(""),
            value_column: "Index Options Premium Turnover".to_string(),
            date_policy: DatePolicy::Abort,
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str, year: Option<i32>) -> Result<Self> {
        match name {
            "mcx" => Ok(Self::mcx()),
            "nse-fo" => Ok(Self::nse_fo()),
            "bse-derivatives" => {
                let year = year.ok_or_else(|| Error::config("bse-derivatives needs a year"))?;
                Ok(Self::bse_derivatives(year))
            }
            other => Err(Error::config(format!("unknown source preset '{}'", other))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.date_format.trim().is_empty() {
            return Err(Error::config(format!("source '{}' has an empty date format", self.name)));
        }
        if self.date_column.is_empty() || self.value_column.is_empty() {
            return Err(Error::config(format!("source '{}' has an unnamed column", self.name)));
        }
        Ok(())
    }
}

/// Commodities enumerated for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityGroup {
    pub instrument: String,
    pub commodities: Vec<String>,
}

impl CommodityGroup {
    pub fn new(instrument: &str, commodities: &[&str]) -> Self {
        Self {
            instrument: category_key(instrument),
            commodities: commodities.iter().map(|c| category_key(c)).collect(),
        }
    }
}

/// The closed, predeclared set of output columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnUniverse {
    /// Instruments that get a total column, in output order.
    pub instruments: Vec<String>,
    /// Commodity groups, in output order.
    pub groups: Vec<CommodityGroup>,
    /// Suffix of instrument total columns.
    pub total_suffix: String,
    /// Suffix of group checksum columns.
    pub checksum_suffix: String,
    /// Suffix of converted-unit instrument columns.
    pub converted_suffix: String,
    pub grand_total_column: String,
    pub grand_total_converted_column: String,
    /// Source unit divided by this gives the converted unit (lakh → crore).
    pub unit_divisor: f64,
}

impl Default for ColumnUniverse {
    fn default() -> Self {
        Self::mcx()
    }
}

impl ColumnUniverse {
    /// The MCX report layout.
    pub fn mcx() -> Self {
        Self {
            instruments: vec![FUTCOM.to_string(), FUTIDX.to_string(), OPTFUT.to_string()],
            groups: vec![
                CommodityGroup::new(
                    FUTCOM,
                    &[
                        "ALUMINIUM", "ALUMINI", "CARDAMOM", "COPPER", "COTTON", "COTTONCNDY",
                        "COTTONOIL", "CRUDEOIL", "CRUDEOILM", "GOLD", "GOLDM", "GOLDGUINEA",
                        "GOLDPETAL", "KAPAS", "LEAD", "LEADMINI", "MENTHAOIL", "NATURALGAS",
                        "NICKEL", "SILVER", "SILVERM", "SILVERMIC", "STEELREBAR", "ZINC",
                        "ZINCMINI",
                    ],
                ),
                CommodityGroup::new(
                    OPTFUT,
                    &[
                        "COPPER", "CRUDEOIL", "GOLD", "GOLDM", "NATURALGAS", "NICKEL", "SILVER",
                        "SILVERM", "ZINC",
                    ],
                ),
            ],
            total_suffix: " LKH".to_string(),
            checksum_suffix: "_Checksum".to_string(),
            converted_suffix: "_Cr".to_string(),
            grand_total_column: "Total_Value_Lakhs".to_string(),
            grand_total_converted_column: "Total_Value_Cr".to_string(),
            unit_divisor: 100.0,
        }
    }

    /// A universe with the MCX naming but custom instruments and groups.
    pub fn with_columns(instruments: &[&str], groups: Vec<CommodityGroup>) -> Self {
        Self {
            instruments: instruments.iter().map(|i| category_key(i)).collect(),
            groups,
            ..Self::mcx()
        }
    }

    /// Trim and upper-case every instrument and commodity name, matching the
    /// keys observations are grouped under.
    pub fn normalize_keys(&mut self) {
        for instrument in &mut self.instruments {
            *instrument = category_key(instrument);
        }
        for group in &mut self.groups {
            group.instrument = category_key(&group.instrument);
            for commodity in &mut group.commodities {
                *commodity = category_key(commodity);
            }
        }
    }

    pub fn total_column(&self, instrument: &str) -> String {
        format!("{}{}", instrument, self.total_suffix)
    }

    pub fn commodity_column(&self, instrument: &str, commodity: &str) -> String {
        format!("{}_{}", instrument, commodity)
    }

    pub fn checksum_column(&self, instrument: &str) -> String {
        format!("{}{}", instrument, self.checksum_suffix)
    }

    pub fn converted_column(&self, instrument: &str) -> String {
        format!("{}{}", instrument, self.converted_suffix)
    }

    /// Position of an instrument in the total columns.
    pub fn instrument_index(&self, instrument: &str) -> Option<usize> {
        self.instruments.iter().position(|i| i == instrument)
    }

    /// Sizes of the commodity groups, in order.
    pub fn group_sizes(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.commodities.len()).collect()
    }

    /// Full output header: Date, Year, then every numeric column.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["Date".to_string(), "Year".to_string()];
        header.extend(self.instruments.iter().map(|i| self.total_column(i)));
        for group in &self.groups {
            header.extend(
                group
                    .commodities
                    .iter()
                    .map(|c| self.commodity_column(&group.instrument, c)),
            );
            header.push(self.checksum_column(&group.instrument));
        }
        header.extend(self.instruments.iter().map(|i| self.converted_column(i)));
        header.push(self.grand_total_column.clone());
        header.push(self.grand_total_converted_column.clone());
        header
    }

    /// Number of numeric columns (header minus Date and Year).
    pub fn numeric_column_count(&self) -> usize {
        self.instruments.len() * 2
            + self.groups.iter().map(|g| g.commodities.len() + 1).sum::<usize>()
            + 2
    }

    /// Reject universes that cannot produce a consistent header.
    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(Error::config("column universe has no instruments"));
        }
        if !(self.unit_divisor.is_finite() && self.unit_divisor > 0.0) {
            return Err(Error::config("unit_divisor must be a positive number"));
        }
        let mut seen = HashSet::new();
        for column in self.header() {
            if !seen.insert(column.clone()) {
                return Err(Error::config(format!("duplicate column '{}'", column)));
            }
        }
        Ok(())
    }
}

/// Rendering and diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `chrono` format of the Date column.
    pub date_format: String,
    /// Largest |total - checksum| not reported as a mismatch.
    pub checksum_tolerance: f64,
    /// Round rendered values to this many decimals. `None` prints full precision.
    pub decimal_places: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            date_format: "%d-%m-%Y".to_string(),
            checksum_tolerance: 1e-6,
            decimal_places: None,
        }
    }
}
