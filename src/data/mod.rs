//! Sample dataset catalog
//!
//! The dashboard renders in-memory sample series; the export pipeline and the
//! data endpoints shape the same series into a [`Dataset`].

mod catalog;

use serde::{Deserialize, Serialize};

use catalog::SalesSeries;

/// Time window a sales dataset covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Week, Period::Month, Period::Year];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" | "7d" => Some(Self::Week),
            "month" | "30d" => Some(Self::Month),
            "year" | "1y" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Capitalized name used in report titles
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }

    /// Axis labels: weekdays, day numbers 1..=30, or month names
    pub fn labels(self) -> Vec<String> {
        match self {
            Self::Week => catalog::WEEK_LABELS.iter().map(|s| s.to_string()).collect(),
            Self::Month => (1..=30).map(|day| day.to_string()).collect(),
            Self::Year => catalog::YEAR_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sales(self) -> &'static SalesSeries {
        match self {
            Self::Week => &catalog::SALES_WEEK,
            Self::Month => &catalog::SALES_MONTH,
            Self::Year => &catalog::SALES_YEAR,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales metric keys
pub const SALES_METRICS: [&str; 4] = ["revenue", "volume", "profit", "customers"];

/// Kind of data the dashboard can export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    Sales,
    Analytics,
    Performance,
    Users,
    DailyStats,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::Sales,
        DataType::Analytics,
        DataType::Performance,
        DataType::Users,
        DataType::DailyStats,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sales" => Some(Self::Sales),
            "analytics" => Some(Self::Analytics),
            "performance" => Some(Self::Performance),
            "users" => Some(Self::Users),
            "daily-stats" | "daily_stats" | "dashboard" => Some(Self::DailyStats),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Analytics => "analytics",
            Self::Performance => "performance",
            Self::Users => "users",
            Self::DailyStats => "daily-stats",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sales => "Sales Data",
            Self::Analytics => "Analytics Data",
            Self::Performance => "Performance Data",
            Self::Users => "User Data",
            Self::DailyStats => "Daily Statistics",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Sales => "Revenue, transactions, and customer analytics",
            Self::Analytics => "Performance metrics and user behavior insights",
            Self::Performance => "System metrics and optimization data",
            Self::Users => "User profiles, activity, and engagement metrics",
            Self::DailyStats => "Daily revenue, profit, users and orders",
        }
    }

    /// Number of records the full (non-sample) data type holds
    pub fn record_count(self) -> u64 {
        match self {
            Self::Sales => 15420,
            Self::Analytics => 8920,
            Self::Performance => 5670,
            Self::Users => 12340,
            Self::DailyStats => catalog::DAILY_LABELS.len() as u64,
        }
    }

    /// Whether the data type has one series per period
    pub fn is_period_aware(self) -> bool {
        matches!(self, Self::Sales)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// One named series of values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: String,
    pub label: String,
    #[serde(rename = "data")]
    pub values: Vec<f64>,
}

impl Series {
    fn new(key: &str, label: &str, values: &[f64]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            values: values.to_vec(),
        }
    }
}

/// Labels plus series in the shape the charts consume
#[derive(Debug, Clone, Serialize)]
pub struct ChartData<'a> {
    pub labels: &'a [String],
    pub datasets: &'a [Series],
}

/// One row of a dataset: the label followed by one value per series
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub label: String,
    pub values: Vec<f64>,
}

/// Tabular sample data for one data type and period
#[derive(Debug, Clone)]
pub struct Dataset {
    pub data_type: DataType,
    pub period: Period,
    /// Header of the label column ("Period", "Month", "Date")
    pub label_header: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl Dataset {
    /// Build the sample dataset for a data type
    ///
    /// Only sales data varies by period; the other data types always cover
    /// their fixed sample window and only record the period as metadata.
    pub fn sample(data_type: DataType, period: Period) -> Self {
        let (label_header, labels, series) = match data_type {
            DataType::Sales => {
                let sales = period.sales();
                (
                    "Period",
                    period.labels(),
                    vec![
                        Series::new("revenue", "Revenue (R)", sales.revenue),
                        Series::new("volume", "Volume", sales.volume),
                        Series::new("profit", "Profit (R)", sales.profit),
                        Series::new("customers", "Customers", sales.customers),
                    ],
                )
            }
            DataType::Analytics => (
                "Month",
                to_labels(&catalog::MONTHLY_LABELS),
                vec![Series::new("pageViews", "Page Views", &catalog::PAGE_VIEWS)],
            ),
            DataType::Performance => (
                "Month",
                to_labels(&catalog::MONTHLY_LABELS),
                vec![Series::new(
                    "responseTime",
                    "Response Time (ms)",
                    &catalog::RESPONSE_TIME_MS,
                )],
            ),
            DataType::Users => (
                "Month",
                to_labels(&catalog::MONTHLY_LABELS),
                vec![Series::new("activeUsers", "Active Users", &catalog::ACTIVE_USERS)],
            ),
            DataType::DailyStats => (
                "Date",
                to_labels(&catalog::DAILY_LABELS),
                vec![
                    Series::new("revenue", "Revenue", &catalog::DAILY_REVENUE),
                    Series::new("profit", "Profit", &catalog::DAILY_PROFIT),
                    Series::new("users", "Users", &catalog::DAILY_USERS),
                    Series::new("orders", "Orders", &catalog::DAILY_ORDERS),
                ],
            ),
        };

        Self {
            data_type,
            period,
            label_header: label_header.to_string(),
            labels,
            series,
        }
    }

    /// Header row: label column followed by one column per series
    pub fn headers(&self) -> Vec<String> {
        std::iter::once(self.label_header.clone())
            .chain(self.series.iter().map(|s| s.label.clone()))
            .collect()
    }

    /// One row per label; a series shorter than the labels reads as 0
    pub fn rows(&self) -> Vec<Row> {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, label)| Row {
                label: label.clone(),
                values: self
                    .series
                    .iter()
                    .map(|s| s.values.get(index).copied().unwrap_or(0.0))
                    .collect(),
            })
            .collect()
    }

    pub fn chart_data(&self) -> ChartData<'_> {
        ChartData {
            labels: &self.labels,
            datasets: &self.series,
        }
    }

    /// Find a series by key (case-insensitive)
    pub fn series_by_key(&self, key: &str) -> Option<&Series> {
        self.series
            .iter()
            .find(|s| s.key.eq_ignore_ascii_case(key.trim()))
    }

    /// Series the summary is computed over: the requested metric, or the first series
    ///
    /// Returns `None` when a metric is requested that the dataset does not have.
    pub fn primary_series(&self, metric: Option<&str>) -> Option<&Series> {
        match metric {
            Some(key) if !key.trim().is_empty() => self.series_by_key(key),
            _ => self.series.first(),
        }
    }

    /// Check the dataset is exportable
    pub fn validate(&self) -> bool {
        if self.labels.is_empty() || self.series.is_empty() {
            return false;
        }

        if self
            .series
            .iter()
            .flat_map(|s| s.values.iter())
            .any(|v| !v.is_finite())
        {
            return false;
        }

        if self.data_type == DataType::Sales {
            return SALES_METRICS
                .iter()
                .all(|metric| self.series_by_key(metric).is_some());
        }

        true
    }

    pub fn record_count(&self) -> u64 {
        self.data_type.record_count()
    }
}

/// Summary statistics over one series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub metric: String,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub total: f64,
    pub data_points: usize,
}

impl Summary {
    /// Returns `None` for an empty series
    pub fn of(series: &Series) -> Option<Self> {
        if series.values.is_empty() {
            return None;
        }

        let total: f64 = series.values.iter().sum();
        let minimum = series.values.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = series
            .values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            metric: series.key.clone(),
            average: total / series.values.len() as f64,
            minimum,
            maximum,
            total,
            data_points: series.values.len(),
        })
    }
}

fn to_labels(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}
