//! Currency conversion trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, NANOS_PER_UNIT, RequestContext};

use crate::error::ServiceError;

/// Trait for currency conversion.
#[async_trait]
pub trait CurrencyService: Send + Sync {
    /// Converts `from` into `to_code`.
    async fn convert(
        &self,
        ctx: &RequestContext,
        from: &Money,
        to_code: &str,
    ) -> Result<Money, ServiceError>;
}

#[derive(Debug)]
struct InMemoryCurrencyState {
    // Units of each currency per one USD, in nanos.
    rates: HashMap<String, i64>,
    conversions: usize,
    fail_on_convert: bool,
}

/// In-memory currency service for testing.
///
/// Knows USD at par; other currencies are added with [`set_rate`](Self::set_rate).
#[derive(Debug, Clone)]
pub struct InMemoryCurrencyService {
    state: Arc<RwLock<InMemoryCurrencyState>>,
}

impl Default for InMemoryCurrencyService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCurrencyService {
    pub fn new() -> Self {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), i64::from(NANOS_PER_UNIT));
        Self {
            state: Arc::new(RwLock::new(InMemoryCurrencyState {
                rates,
                conversions: 0,
                fail_on_convert: false,
            })),
        }
    }

    /// Sets how many nanos of `code` one USD buys.
    pub fn set_rate(&self, code: &str, nanos_per_usd: i64) {
        self.state
            .write()
            .unwrap()
            .rates
            .insert(code.to_string(), nanos_per_usd);
    }

    /// Configures the service to fail every conversion.
    pub fn set_fail_on_convert(&self, fail: bool) {
        self.state.write().unwrap().fail_on_convert = fail;
    }

    /// Returns the number of conversions served or failed.
    pub fn conversion_count(&self) -> usize {
        self.state.read().unwrap().conversions
    }
}

#[async_trait]
impl CurrencyService for InMemoryCurrencyService {
    async fn convert(
        &self,
        _ctx: &RequestContext,
        from: &Money,
        to_code: &str,
    ) -> Result<Money, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.conversions += 1;

        if state.fail_on_convert {
            return Err(ServiceError::Transport("currency service unreachable".to_string()));
        }

        let rate = |code: &str| {
            state
                .rates
                .get(code)
                .copied()
                .filter(|rate| *rate > 0)
                .ok_or_else(|| ServiceError::Rejected(format!("unsupported currency {code}")))
        };
        let from_rate = i128::from(rate(from.currency_code())?);
        let to_rate = i128::from(rate(to_code)?);

        let nanos_per_unit = i128::from(NANOS_PER_UNIT);
        let amount = i128::from(from.units()) * nanos_per_unit + i128::from(from.nanos());
        let converted = amount * to_rate / from_rate;

        let units = i64::try_from(converted / nanos_per_unit)
            .map_err(|_| ServiceError::Rejected("conversion overflow".to_string()))?;
        let nanos = (converted % nanos_per_unit) as i32;
        Money::new(to_code, units, nanos).map_err(|e| ServiceError::Rejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_usd_to_usd_is_identity() {
        let service = InMemoryCurrencyService::new();
        let amount = Money::new("USD", 19, 990_000_000).unwrap();
        let converted = service
            .convert(&RequestContext::background(), &amount, "USD")
            .await
            .unwrap();
        assert_eq!(converted, amount);
    }

    #[tokio::test]
    async fn test_converts_with_rate() {
        let service = InMemoryCurrencyService::new();
        service.set_rate("EUR", 900_000_000);
        let amount = Money::from_cents("USD", 1000).unwrap();

        let converted = service
            .convert(&RequestContext::background(), &amount, "EUR")
            .await
            .unwrap();

        assert_eq!(converted, Money::from_cents("EUR", 900).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_currency_is_rejected() {
        let service = InMemoryCurrencyService::new();
        let amount = Money::from_cents("USD", 1000).unwrap();
        let result = service
            .convert(&RequestContext::background(), &amount, "XYZ")
            .await;
        assert!(matches!(result, Err(ServiceError::Rejected(_))));
        assert_eq!(service.conversion_count(), 1);
    }
}
