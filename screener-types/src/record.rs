//! Qualifying-stock records as delivered by the screening service.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One qualifying security for a given screening date.
///
/// Records are immutable once received. Numeric fields arrive as JSON numbers;
/// a missing or `null` value is read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Exchange code, e.g. "000001". Unique within one round's response.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Last price.
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_price: Decimal,
    /// Daily change in percent (signed).
    #[serde(default, deserialize_with = "null_as_default")]
    pub change_pct: Decimal,
    /// Traded volume.
    #[serde(default, deserialize_with = "null_as_default")]
    pub volume: Decimal,
    /// Traded amount.
    #[serde(default, deserialize_with = "null_as_default")]
    pub turnover: Decimal,
    /// Market capitalisation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_cap: Decimal,
}

/// Records are shared by reference between the accumulator and any consumer.
pub type SharedRecord = Arc<StockRecord>;

/// Read `null` as the type's default. Non-finite numbers reach us as `null`
/// once the body has been sanitized.
pub(crate) fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_wire_shape_with_nulls_and_gaps() {
        let rec: StockRecord = serde_json::from_str(
            r#"{"code":"000001","name":"平安银行","current_price":15.5,"change_pct":null,"volume":1234567}"#,
        )
        .expect("record");
        assert_eq!(rec.current_price, Decimal::new(155, 1));
        assert_eq!(rec.change_pct, Decimal::ZERO);
        assert_eq!(rec.volume, Decimal::from(1_234_567));
        assert_eq!(rec.market_cap, Decimal::ZERO);
    }
}
