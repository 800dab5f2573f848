/// User agent string for HTTP requests
pub const USER_AGENT: &str = "renewable-site-scout/0.1.0";

/// NASA POWER daily point endpoint
pub const POWER_API_BASE: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";

/// Open-Meteo geocoding API base URL
pub const GEOCODING_API_BASE: &str = "https://geocoding-api.open-meteo.com/v1";

/// POWER community code for renewable energy
pub const POWER_COMMUNITY: &str = "RE";

/// Output format requested from POWER
pub const POWER_FORMAT: &str = "JSON";

/// Values at or below this are POWER's "no data" fill value
pub const MISSING_SENTINEL: f64 = -999.0;

// POWER parameter codes
pub const ALLSKY_SFC_SW_DWN: &str = "ALLSKY_SFC_SW_DWN";
pub const WS10M: &str = "WS10M";
pub const WS50M: &str = "WS50M";
pub const WS50M_MIN: &str = "WS50M_MIN";
pub const WS50M_MAX: &str = "WS50M_MAX";
pub const T2M: &str = "T2M";
pub const T2M_MIN: &str = "T2M_MIN";
pub const T2M_MAX: &str = "T2M_MAX";
pub const PRECTOTCORR: &str = "PRECTOTCORR";
