use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CarKeepError;
use crate::models::vehicle::non_negative;

/// Trade of the current vehicle toward a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeIn {
    pub trade_in_value: Decimal,
    /// Amount still owed on the traded vehicle.
    pub loan_balance: Decimal,
    #[serde(default)]
    pub incentives: Decimal,
}

impl TradeIn {
    pub fn validate(
        &self,
        prefix: &str,
    ) -> Result<(), CarKeepError> {
        non_negative(&format!("{prefix}.trade_in_value"), self.trade_in_value)?;
        non_negative(&format!("{prefix}.loan_balance"), self.loan_balance)?;
        non_negative(&format!("{prefix}.incentives"), self.incentives)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn negative_loan_balance_is_rejected() {
        let trade_in = TradeIn {
            trade_in_value: dec!(12000),
            loan_balance: dec!(-1),
            incentives: dec!(0),
        };

        assert!(matches!(
            trade_in.validate("scenario.trade_in"),
            Err(CarKeepError::Validation { field, .. }) if field == "scenario.trade_in.loan_balance"
        ));
    }

    #[test]
    fn incentives_default_to_zero() {
        let json = r#"{"trade_in_value": 18000, "loan_balance": 15000}"#;

        let trade_in: TradeIn = serde_json::from_str(json).unwrap();

        assert_eq!(trade_in.incentives, dec!(0));
    }
}
