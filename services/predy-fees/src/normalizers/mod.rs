// Normalization of raw subgraph amounts into USD figures
use bigdecimal::{BigDecimal, RoundingMode, Zero as _};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::*;

/// Fractional digits kept after every division
pub const DIVISION_SCALE: i64 = 20;

pub const USDC_DECIMALS: u32 = 6;
pub const ETH_DECIMALS: u32 = 18;
/// Fixed-point scale the v3.2 contracts store premiums and interest in
pub const STORAGE_DECIMALS: u32 = 18;
/// v3 stores ETH-side fees with 12 more decimals than USDC
pub const V3_ETH_ADJUST_DECIMALS: u32 = 12;

/// Schema version of the protocol's subgraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// Legacy deployment; token0 is ETH, token1 is USDC
    V3,
    /// Current deployment; token0 is USDC, token1 is ETH
    V320,
}

impl ProtocolVersion {
    pub fn label(&self) -> &'static str {
        match self {
            ProtocolVersion::V3 => "v3",
            ProtocolVersion::V320 => "v320",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "v3" => Some(ProtocolVersion::V3),
            "v320" => Some(ProtocolVersion::V320),
            _ => None,
        }
    }
}

/// One day of fees, revenue and supply-side revenue in USD
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFigures {
    pub fees: BigDecimal,
    pub revenue: BigDecimal,
    pub supply_side_revenue: BigDecimal,
}

fn pow10(exp: u32) -> BigDecimal {
    BigDecimal::from(10u64.pow(exp))
}

fn div(value: BigDecimal, decimals: u32) -> BigDecimal {
    (value / pow10(decimals)).with_scale_round(DIVISION_SCALE, RoundingMode::HalfUp)
}

/// Lift an oracle price into the arbitrary precision domain
pub fn price_to_big(price: Decimal) -> Result<BigDecimal> {
    BigDecimal::from_str(&price.to_string())
        .map_err(|e| FeeAdapterError::InvalidResponse(format!("bad price {}: {}", price, e)))
}

/// Plain decimal string, no exponent, no trailing zeros.
/// Unlike BigNumber's `toString`, very large or small values are never written as `1e-10`.
pub fn to_decimal_string(value: &BigDecimal) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    value.normalized().to_plain_string()
}

/// v3 total fees: LP fees and premium plus supply interest
pub fn v3_daily_fees(record: Option<&DailyFeeRecord>, eth_price: &BigDecimal) -> BigDecimal {
    let Some(r) = record else {
        return BigDecimal::zero();
    };

    let fee0 = div(&r.fee0 * eth_price, V3_ETH_ADJUST_DECIMALS);
    let lpt_revenue = fee0 + &r.fee1 + &r.premium_supply;

    let supply_interest0 = div(&r.supply_interest0 * eth_price, V3_ETH_ADJUST_DECIMALS);
    let token_revenue = supply_interest0 + &r.supply_interest1;

    lpt_revenue + token_revenue
}

/// v3.2 user-paid fees and supply-side revenue, computed independently
pub fn v320_fees_and_supply_side(
    record: Option<&DailyFeeRecord>,
    eth_price: &BigDecimal,
) -> (BigDecimal, BigDecimal) {
    let Some(r) = record else {
        return (BigDecimal::zero(), BigDecimal::zero());
    };

    let usdc = |v: &BigDecimal| div(div(v.clone(), USDC_DECIMALS), STORAGE_DECIMALS);
    let eth = |v: &BigDecimal| div(div(v * eth_price, ETH_DECIMALS), STORAGE_DECIMALS);

    let users_payment_fees =
        usdc(&r.premium_borrow) + usdc(&r.borrow_interest0) + eth(&r.borrow_interest1);

    let lpt_revenue = usdc(&r.premium_supply)
        + eth(&r.fee0)
        + usdc(&r.fee1)
        + usdc(&r.supply_interest0)
        + eth(&r.supply_interest1);

    (users_payment_fees, lpt_revenue)
}

/// Protocol revenue from the day-over-day change of the accumulated counters.
/// Zero unless both days are present.
pub fn daily_revenue(
    version: ProtocolVersion,
    today: Option<&AccumulatedProtocolFeeRecord>,
    yesterday: Option<&AccumulatedProtocolFeeRecord>,
    eth_price: &BigDecimal,
) -> BigDecimal {
    let (Some(today), Some(yesterday)) = (today, yesterday) else {
        return BigDecimal::zero();
    };

    let delta0 = &today.accumulated_protocol_fee0 - &yesterday.accumulated_protocol_fee0;
    let delta1 = &today.accumulated_protocol_fee1 - &yesterday.accumulated_protocol_fee1;

    match version {
        ProtocolVersion::V3 => {
            // token0 ETH, token1 already in USD terms
            div(delta0 * eth_price, ETH_DECIMALS) + delta1
        }
        ProtocolVersion::V320 => {
            // token0 USDC, token1 ETH
            div(delta0, USDC_DECIMALS) + div(delta1 * eth_price, ETH_DECIMALS)
        }
    }
}

/// Combine daily and accumulated records into the three reported figures
pub fn normalize(
    version: ProtocolVersion,
    daily: Option<&DailyFeeRecord>,
    accumulated_today: Option<&AccumulatedProtocolFeeRecord>,
    accumulated_yesterday: Option<&AccumulatedProtocolFeeRecord>,
    eth_price: &BigDecimal,
) -> DailyFigures {
    let revenue = daily_revenue(version, accumulated_today, accumulated_yesterday, eth_price);

    match version {
        ProtocolVersion::V3 => {
            let fees = v3_daily_fees(daily, eth_price);
            let supply_side_revenue = &fees - &revenue;
            DailyFigures {
                fees,
                revenue,
                supply_side_revenue,
            }
        }
        ProtocolVersion::V320 => {
            let (fees, supply_side_revenue) = v320_fees_and_supply_side(daily, eth_price);
            DailyFigures {
                fees,
                revenue,
                supply_side_revenue,
            }
        }
    }
}

impl DailyFigures {
    pub fn into_metrics(self, timestamp: i64) -> NormalizedDailyMetrics {
        NormalizedDailyMetrics {
            timestamp,
            daily_fees: Some(to_decimal_string(&self.fees)),
            daily_revenue: Some(to_decimal_string(&self.revenue)),
            daily_supply_side_revenue: Some(to_decimal_string(&self.supply_side_revenue)),
        }
    }
}
