use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{checked_add, checked_sub, round_half_up};
use crate::error::CarKeepError;
use crate::models::TradeIn;

/// Trade-in equity applied once, upfront, against a scenario's cost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeInEquity {
    pub trade_in_value: Decimal,
    pub loan_balance: Decimal,
    pub incentives: Decimal,
    /// Negative when the traded vehicle is underwater.
    pub net_equity: Decimal,
}

/// Nets a trade-in against its outstanding loan and any incentives. An
/// absent trade-in resolves to zero equity.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::resolve_trade_in;
/// use carkeep_core::TradeIn;
///
/// let trade_in = TradeIn {
///     trade_in_value: dec!(18000),
///     loan_balance: dec!(15000),
///     incentives: dec!(2000),
/// };
///
/// assert_eq!(resolve_trade_in(Some(&trade_in)).unwrap().net_equity, dec!(5000));
/// assert_eq!(resolve_trade_in(None).unwrap().net_equity, dec!(0));
/// ```
pub fn resolve_trade_in(trade_in: Option<&TradeIn>) -> Result<TradeInEquity, CarKeepError> {
    let Some(trade_in) = trade_in else {
        return Ok(TradeInEquity::default());
    };
    trade_in.validate("trade_in")?;

    let after_loan = checked_sub(trade_in.trade_in_value, trade_in.loan_balance, "trade-in equity")?;
    let net_equity = round_half_up(checked_add(after_loan, trade_in.incentives, "trade-in equity")?);
    debug!(net_equity = %net_equity, "resolved trade-in equity");

    Ok(TradeInEquity {
        trade_in_value: trade_in.trade_in_value,
        loan_balance: trade_in.loan_balance,
        incentives: trade_in.incentives,
        net_equity,
    })
}
