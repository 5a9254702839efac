//! Client for the Nager.Date public-holiday API.
//!
//! Base URL: `date.nager.at`
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/api/v3/PublicHolidays/{year}/{countryCode}` | Public holidays for one year |
//!
//! Only nationwide (`global`) holidays are kept; regional ones would
//! exclude days for people who still have to come in. The API has no
//! notion of company calendars, so the company selector is ignored.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use presence_core::CalendarDate;

use crate::error::{ConfigError, HolidayError};
use crate::provider::{apply_weekday_filter, normalize_country, HolidayProvider, HolidaySet};

const DEFAULT_BASE_URL: &str = "https://date.nager.at";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ─── Configuration ───────────────────────────────────────────────────

/// Connection settings for [`NagerHolidayProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NagerConfig {
    /// API root. Default: <https://date.nager.at>
    pub base_url: Url,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl NagerConfig {
    /// The public API with the default timeout.
    pub fn public() -> Result<Self, ConfigError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PRESENCE_HOLIDAY_API_URL` (default: `https://date.nager.at`)
    /// - `PRESENCE_HOLIDAY_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("PRESENCE_HOLIDAY_API_URL", DEFAULT_BASE_URL)?,
            timeout_secs: env_u64("PRESENCE_HOLIDAY_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// Point at another API root, e.g. a local mock server.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_u64(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

// ─── Wire types ──────────────────────────────────────────────────────

/// One entry of the `PublicHolidays` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NagerHoliday {
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub local_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub country_code: Option<String>,
    /// Nationwide holiday. Absent is treated as nationwide.
    #[serde(default = "nationwide")]
    pub global: bool,
    #[serde(default)]
    pub counties: Option<Vec<String>>,
}

fn nationwide() -> bool {
    true
}

// ─── Provider ────────────────────────────────────────────────────────

/// Holiday provider backed by the Nager.Date HTTP API.
///
/// Every call hits the network; wrap in
/// [`CachedProvider`](crate::CachedProvider) for session idempotence.
#[derive(Debug, Clone)]
pub struct NagerHolidayProvider {
    http: reqwest::Client,
    base_url: Url,
}

impl NagerHolidayProvider {
    pub fn new(config: NagerConfig) -> Result<Self, HolidayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Fetch the raw holiday list for one year.
    ///
    /// Calls `GET {base_url}/api/v3/PublicHolidays/{year}/{country}`.
    /// A 404 means the API does not know the country.
    pub async fn public_holidays(&self, year: i32, country: &str) -> Result<Vec<NagerHoliday>, HolidayError> {
        let endpoint = format!("GET /api/v3/PublicHolidays/{year}/{country}");
        let url = format!(
            "{}/api/v3/PublicHolidays/{year}/{country}",
            self.base_url.as_str().trim_end_matches('/')
        );

        let resp = crate::retry::retry_send(&endpoint, || self.http.get(&url).send())
            .await
            .map_err(|e| HolidayError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HolidayError::UnknownCountry(country.to_string()));
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            return Err(HolidayError::UnexpectedStatus {
                endpoint,
                status,
                body,
            });
        }

        let body = resp.text().await.map_err(|e| HolidayError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        // 204 and empty 200 both mean "no holidays".
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| HolidayError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }
}

impl HolidayProvider for NagerHolidayProvider {
    async fn holiday_dates(
        &self,
        country_code: &str,
        company: Option<&str>,
        years: &[i32],
        weekdays_only: bool,
    ) -> Result<HolidaySet, HolidayError> {
        let country = normalize_country(country_code);
        if country.is_empty() {
            return Ok(HolidaySet::new());
        }
        if let Some(company) = company.filter(|c| !c.trim().is_empty()) {
            tracing::debug!(country = %country, company, "company calendars are not supported by this source");
        }

        let mut dates = HolidaySet::new();
        for year in years.iter().copied().collect::<BTreeSet<_>>() {
            let holidays = self.public_holidays(year, &country).await?;
            let fetched = holidays.len();
            for holiday in holidays.into_iter().filter(|h| h.global) {
                dates.insert(CalendarDate::parse(&holiday.date)?);
            }
            tracing::debug!(country = %country, year, fetched, "fetched public holidays");
        }

        Ok(apply_weekday_filter(dates, weekdays_only))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_public_api() {
        let cfg = NagerConfig::public().unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://date.nager.at/");
        assert_eq!(cfg.timeout_secs, 10);
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("PRESENCE_TEST_UNSET_URL_4711", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("PRESENCE_TEST_BAD_URL", "not a url");
        let result = env_url("PRESENCE_TEST_BAD_URL", "https://example.com");
        std::env::remove_var("PRESENCE_TEST_BAD_URL");
        assert!(matches!(result, Err(ConfigError::InvalidUrl(ref var, _)) if var == "PRESENCE_TEST_BAD_URL"));
    }

    #[test]
    fn env_u64_rejects_garbage() {
        std::env::set_var("PRESENCE_TEST_BAD_TIMEOUT", "soon");
        let result = env_u64("PRESENCE_TEST_BAD_TIMEOUT", 10);
        std::env::remove_var("PRESENCE_TEST_BAD_TIMEOUT");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_, ref v)) if v == "soon"));
        assert_eq!(env_u64("PRESENCE_TEST_UNSET_TIMEOUT_4711", 7).unwrap(), 7);
    }

    #[test]
    fn wire_type_defaults_to_nationwide() {
        let h: NagerHoliday =
            serde_json::from_str(r#"{"date":"2026-12-25","name":"Christmas Day"}"#).unwrap();
        assert!(h.global);
        assert_eq!(h.local_name, None);
    }
}
