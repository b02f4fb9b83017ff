//! Sample values shown by the dashboard charts

pub(super) const WEEK_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub(super) const YEAR_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub(super) const MONTHLY_LABELS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

pub(super) const DAILY_LABELS: [&str; 5] = [
    "2025-08-31",
    "2025-08-30",
    "2025-08-29",
    "2025-08-28",
    "2025-08-27",
];

/// Revenue, volume, profit and customers for one period
pub(super) struct SalesSeries {
    pub revenue: &'static [f64],
    pub volume: &'static [f64],
    pub profit: &'static [f64],
    pub customers: &'static [f64],
}

pub(super) const SALES_WEEK: SalesSeries = SalesSeries {
    revenue: &[120.0, 190.0, 30.0, 50.0, 20.0, 30.0, 70.0],
    volume: &[12.0, 19.0, 3.0, 5.0, 2.0, 3.0, 7.0],
    profit: &[20.0, 35.0, 5.0, 8.0, 3.0, 5.0, 12.0],
    customers: &[8.0, 15.0, 2.0, 4.0, 1.0, 2.0, 6.0],
};

pub(super) const SALES_MONTH: SalesSeries = SalesSeries {
    revenue: &[
        650.0, 590.0, 800.0, 810.0, 560.0, 550.0, 400.0, 450.0, 670.0, 780.0, 890.0, 900.0,
        670.0, 780.0, 890.0, 900.0, 670.0, 780.0, 890.0, 900.0, 670.0, 780.0, 890.0, 900.0,
        670.0, 780.0, 890.0, 900.0, 670.0, 780.0,
    ],
    volume: &[
        65.0, 59.0, 80.0, 81.0, 56.0, 55.0, 40.0, 45.0, 67.0, 78.0, 89.0, 90.0, 67.0, 78.0,
        89.0, 90.0, 67.0, 78.0, 89.0, 90.0, 67.0, 78.0, 89.0, 90.0, 67.0, 78.0, 89.0, 90.0,
        67.0, 78.0,
    ],
    profit: &[
        110.0, 100.0, 136.0, 138.0, 95.0, 94.0, 68.0, 77.0, 114.0, 133.0, 151.0, 153.0, 114.0,
        133.0, 151.0, 153.0, 114.0, 133.0, 151.0, 153.0, 114.0, 133.0, 151.0, 153.0, 114.0,
        133.0, 151.0, 153.0, 114.0, 133.0,
    ],
    customers: &[
        45.0, 41.0, 56.0, 57.0, 39.0, 38.0, 28.0, 32.0, 47.0, 55.0, 63.0, 64.0, 47.0, 55.0,
        63.0, 64.0, 47.0, 55.0, 63.0, 64.0, 47.0, 55.0, 63.0, 64.0, 47.0, 55.0, 63.0, 64.0,
        47.0, 55.0,
    ],
};

pub(super) const SALES_YEAR: SalesSeries = SalesSeries {
    revenue: &[
        1200.0, 1900.0, 3000.0, 5000.0, 2000.0, 3000.0, 7000.0, 8000.0, 9000.0, 10000.0,
        11000.0, 12000.0,
    ],
    volume: &[
        120.0, 190.0, 300.0, 500.0, 200.0, 300.0, 700.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0,
    ],
    profit: &[
        204.0, 323.0, 510.0, 850.0, 340.0, 510.0, 1190.0, 1360.0, 1530.0, 1700.0, 1870.0,
        2040.0,
    ],
    customers: &[
        84.0, 133.0, 210.0, 350.0, 140.0, 210.0, 490.0, 560.0, 630.0, 700.0, 770.0, 840.0,
    ],
};

pub(super) const PAGE_VIEWS: [f64; 6] = [45000.0, 52000.0, 48000.0, 61000.0, 58000.0, 72000.0];
pub(super) const RESPONSE_TIME_MS: [f64; 6] = [45.0, 38.0, 42.0, 35.0, 40.0, 32.0];
pub(super) const ACTIVE_USERS: [f64; 6] = [1200.0, 1350.0, 1280.0, 1600.0, 1520.0, 1850.0];

// Date, Revenue, Profit, Users, Orders
pub(super) const DAILY_REVENUE: [f64; 5] = [15000.0, 14200.0, 13800.0, 13500.0, 13200.0];
pub(super) const DAILY_PROFIT: [f64; 5] = [4500.0, 4200.0, 4100.0, 4000.0, 3900.0];
pub(super) const DAILY_USERS: [f64; 5] = [1250.0, 1180.0, 1150.0, 1120.0, 1100.0];
pub(super) const DAILY_ORDERS: [f64; 5] = [89.0, 82.0, 78.0, 75.0, 72.0];
