//! Request rate limits for AWS APIs, written as `N/s` or `N/m`.

use std::{fmt, str::FromStr, time::Duration};

use leaky_bucket::RateLimiter;

use crate::prelude::*;

/// Textract's default quota for the asynchronous text detection APIs is
/// around five transactions per second, so that's our default.
pub const DEFAULT_TEXTRACT_RATE_LIMIT: ApiRateLimit = ApiRateLimit {
    requests: 5,
    per_period: RateLimitPeriod::Second,
};

/// The window a rate limit refills over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitPeriod {
    Second,
    Minute,
}

impl RateLimitPeriod {
    /// The length of one refill window.
    pub fn to_duration(self) -> Duration {
        match self {
            RateLimitPeriod::Second => Duration::from_secs(1),
            RateLimitPeriod::Minute => Duration::from_secs(60),
        }
    }
}

impl fmt::Display for RateLimitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitPeriod::Second => write!(f, "s"),
            RateLimitPeriod::Minute => write!(f, "m"),
        }
    }
}

impl FromStr for RateLimitPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "s" => Ok(RateLimitPeriod::Second),
            "m" => Ok(RateLimitPeriod::Minute),
            other => Err(anyhow!("unsupported rate limit period: {other:?}")),
        }
    }
}

/// A maximum number of requests per period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiRateLimit {
    pub requests: usize,
    pub per_period: RateLimitPeriod,
}

impl ApiRateLimit {
    /// Build a token bucket enforcing this limit. The bucket starts full.
    pub fn to_rate_limiter(self) -> RateLimiter {
        RateLimiter::builder()
            .initial(self.requests)
            .refill(self.requests)
            .max(self.requests)
            .interval(self.per_period.to_duration())
            .build()
    }
}

impl Default for ApiRateLimit {
    fn default() -> Self {
        DEFAULT_TEXTRACT_RATE_LIMIT
    }
}

impl fmt::Display for ApiRateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.requests, self.per_period)
    }
}

impl FromStr for ApiRateLimit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (count, period) = s
            .split_once('/')
            .ok_or_else(|| anyhow!("rate limit {s:?} should look like 5/s or 300/m"))?;
        let requests = count
            .trim()
            .parse::<usize>()
            .with_context(|| format!("bad request count in rate limit {s:?}"))?;
        if requests == 0 {
            return Err(anyhow!("rate limit {s:?} must allow at least one request"));
        }
        let per_period = period
            .parse::<RateLimitPeriod>()
            .with_context(|| format!("bad period in rate limit {s:?}"))?;
        Ok(Self {
            requests,
            per_period,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds_and_minutes() {
        assert_eq!(
            "10/s".parse::<ApiRateLimit>().unwrap(),
            ApiRateLimit {
                requests: 10,
                per_period: RateLimitPeriod::Second,
            }
        );
        assert_eq!(
            "300/m".parse::<ApiRateLimit>().unwrap(),
            ApiRateLimit {
                requests: 300,
                per_period: RateLimitPeriod::Minute,
            }
        );
    }

    #[test]
    fn rejects_malformed_limits() {
        for bad in ["10", "10/h", "x/s", "0/s", ""] {
            assert!(bad.parse::<ApiRateLimit>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn periods_have_matching_windows() {
        assert_eq!(RateLimitPeriod::Second.to_duration(), Duration::from_secs(1));
        assert_eq!(RateLimitPeriod::Minute.to_duration(), Duration::from_secs(60));
        assert_eq!("m".parse::<RateLimitPeriod>().unwrap(), RateLimitPeriod::Minute);
        assert!("h".parse::<RateLimitPeriod>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let limit = "7/m".parse::<ApiRateLimit>().unwrap();
        assert_eq!(limit.to_string(), "7/m");
        assert_eq!(DEFAULT_TEXTRACT_RATE_LIMIT.to_string(), "5/s");
    }
}
