use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::RATIO_DECIMAL_PLACES;
use crate::types::{CollateralizationRatio, MonitorError, MonitorResult};

/// 원시 단위 수량을 whole unit 으로 환산 (amount / 10^decimal_exponent)
///
/// 정수 수량에 스케일만 붙이므로 나눗셈 오차가 없다. 수량은 `Uint128` JSON 처럼
/// ASCII 숫자로만 이루어져야 한다. 96비트 가수를 넘거나 지수가 28을 넘으면
/// `ArithmeticOverflow`.
pub fn scale_amount(denom: &str, amount: &str, decimal_exponent: u32) -> MonitorResult<Decimal> {
    let invalid = || MonitorError::InvalidAmount {
        denom: denom.to_string(),
        amount: amount.to_string(),
    };

    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let raw: u128 = amount.parse().map_err(|_| invalid())?;

    let raw = i128::try_from(raw).map_err(|_| {
        MonitorError::ArithmeticOverflow(format!("{} {} exceeds i128", amount, denom))
    })?;

    Decimal::try_from_i128_with_scale(raw, decimal_exponent).map_err(|e| {
        MonitorError::ArithmeticOverflow(format!(
            "{} {} at 10^{}: {}",
            amount, denom, decimal_exponent, e
        ))
    })
}

/// 반올림 없는 곱셈
///
/// `rust_decimal` 은 28자리를 넘으면 조용히 반올림한다. 정확한 곱의 스케일은
/// 두 피연산자 스케일의 합이므로, 결과 스케일이 그보다 작으면 `PrecisionLoss`.
pub fn exact_mul(lhs: Decimal, rhs: Decimal) -> MonitorResult<Decimal> {
    if lhs.is_zero() || rhs.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let (lhs, rhs) = (lhs.normalize(), rhs.normalize());
    let product = lhs
        .checked_mul(rhs)
        .ok_or_else(|| MonitorError::ArithmeticOverflow(format!("{} * {}", lhs, rhs)))?;

    if product.scale() != lhs.scale() + rhs.scale() {
        return Err(MonitorError::PrecisionLoss(format!("{} * {}", lhs, rhs)));
    }
    Ok(product)
}

/// 반올림 없는 덧셈. 결과 스케일은 두 피연산자 중 큰 스케일과 같아야 한다.
pub fn exact_add(lhs: Decimal, rhs: Decimal) -> MonitorResult<Decimal> {
    if lhs.is_zero() {
        return Ok(rhs);
    }
    if rhs.is_zero() {
        return Ok(lhs);
    }

    let (lhs, rhs) = (lhs.normalize(), rhs.normalize());
    let sum = lhs
        .checked_add(rhs)
        .ok_or_else(|| MonitorError::ArithmeticOverflow(format!("{} + {}", lhs, rhs)))?;

    if sum.scale() != lhs.scale().max(rhs.scale()) {
        return Err(MonitorError::PrecisionLoss(format!("{} + {}", lhs, rhs)));
    }
    Ok(sum)
}

/// 포지션 USD 가치 = (amount / 10^decimal_exponent) * price
pub fn position_value_usd(
    denom: &str,
    amount: &str,
    decimal_exponent: u32,
    price: Decimal,
) -> MonitorResult<Decimal> {
    let whole_units = scale_amount(denom, amount, decimal_exponent)?;
    exact_mul(whole_units, price)
}

/// 정확한 합계
///
/// 모든 덧셈이 `exact_add` 를 거치므로 성공한 합계는 입력 순서와 무관하다.
/// 28자리 안에 담기지 않는 합계는 어떤 순서로 더해도 `PrecisionLoss`.
pub fn sum_values<I>(values: I) -> MonitorResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, exact_add)
}

/// 담보 비율 = collateral / debt
///
/// 부채가 정확히 0 이면 `Infinite`. 그 외에는 소수점 이하
/// `RATIO_DECIMAL_PLACES` 자리에서 banker's rounding 후 정규화.
pub fn collateralization_ratio(
    total_collateral_usd: Decimal,
    total_debt_usd: Decimal,
) -> MonitorResult<CollateralizationRatio> {
    if total_debt_usd.is_zero() {
        return Ok(CollateralizationRatio::Infinite);
    }

    let ratio = total_collateral_usd
        .checked_div(total_debt_usd)
        .ok_or_else(|| {
            MonitorError::ArithmeticOverflow(format!(
                "{} / {}",
                total_collateral_usd, total_debt_usd
            ))
        })?
        .round_dp_with_strategy(RATIO_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
        .normalize();

    Ok(CollateralizationRatio::Finite(ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_scale_amount_is_exact() {
        assert_eq!(scale_amount("uusd", "1000000", 6).unwrap(), dec("1"));
        assert_eq!(scale_amount("uosmo", "1", 6).unwrap(), dec("0.000001"));
        assert_eq!(
            scale_amount("aevmos", "123456789012345678901", 18).unwrap(),
            dec("123.456789012345678901")
        );
        assert_eq!(scale_amount("uatom", "42", 0).unwrap(), dec("42"));
    }

    #[test]
    fn test_scale_amount_rejects_garbage() {
        let err = scale_amount("uatom", "12.5", 6).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidAmount { .. }));

        let err = scale_amount("uatom", "-1", 6).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidAmount { .. }));

        let err = scale_amount("uatom", "", 6).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidAmount { .. }));
    }

    #[test]
    fn test_scale_amount_accepts_only_plain_digits() {
        for amount in ["+5", " 5", "5 ", "5\n", "0x10", "1_000"] {
            let err = scale_amount("uatom", amount, 6).unwrap_err();
            assert!(
                matches!(err, MonitorError::InvalidAmount { .. }),
                "{:?} should be rejected",
                amount
            );
        }

        assert_eq!(scale_amount("uatom", "0005", 0).unwrap(), dec("5"));
    }

    #[test]
    fn test_scale_amount_overflow() {
        // u128::MAX 는 96비트 가수를 넘는다
        let err = scale_amount("uatom", &u128::MAX.to_string(), 6).unwrap_err();
        assert!(matches!(err, MonitorError::ArithmeticOverflow(_)));

        let err = scale_amount("uatom", "1", 29).unwrap_err();
        assert!(matches!(err, MonitorError::ArithmeticOverflow(_)));
    }

    #[test]
    fn test_position_value_usd() {
        assert_eq!(
            position_value_usd("uusd", "1000000", 6, dec("1.00")).unwrap(),
            dec("1.00")
        );
        assert_eq!(
            position_value_usd("uatom", "2000000", 6, dec("1.50")).unwrap(),
            dec("3.00")
        );
        assert_eq!(
            position_value_usd("weth", "500000000000000000", 18, dec("3000")).unwrap(),
            dec("1500")
        );
    }

    #[test]
    fn test_sum_is_order_independent() {
        let values = vec![
            dec("0.000001"),
            dec("123456.789"),
            dec("1500.000000000000000001"),
            dec("3.14159"),
            dec("0"),
        ];
        let expected = sum_values(values.clone()).unwrap();

        let mut reversed = values.clone();
        reversed.reverse();
        assert_eq!(sum_values(reversed).unwrap(), expected);

        let mut rotated = values.clone();
        rotated.rotate_left(2);
        assert_eq!(sum_values(rotated).unwrap(), expected);

        assert_eq!(expected, dec("124959.930591000000000001"));
    }

    #[test]
    fn test_product_beyond_28_digits_is_rejected() {
        let err = position_value_usd(
            "aevmos",
            "123456789012345678901",
            18,
            dec("10.123456789012345678"),
        )
        .unwrap_err();
        assert!(matches!(err, MonitorError::PrecisionLoss(_)));
    }

    #[test]
    fn test_trailing_zeros_do_not_count_against_precision() {
        // 0.000000000001000000 * 0.1234567890123456 은 스케일 12 + 16 으로 정확하다
        assert_eq!(
            position_value_usd("weth", "1000000", 18, dec("0.1234567890123456")).unwrap(),
            dec("0.0000000000001234567890123456")
        );
    }

    #[test]
    fn test_large_and_tiny_values_in_any_order() {
        let tiny = position_value_usd("weth", "1", 18, dec("0.4")).unwrap();

        // 10^9 + 2 * 4e-19 는 28자리 안에 들어간다
        let big = position_value_usd("uusdc", "1000000000000000", 6, Decimal::ONE).unwrap();
        let forward = sum_values(vec![big, tiny, tiny]).unwrap();
        let backward = sum_values(vec![tiny, tiny, big]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, dec("1000000000.0000000000000000008"));

        // 10^10 + 4e-19 는 29자리가 필요하다
        let bigger = position_value_usd("uusdc", "10000000000000000", 6, Decimal::ONE).unwrap();
        for values in [vec![bigger, tiny, tiny], vec![tiny, tiny, bigger], vec![tiny, bigger, tiny]] {
            let err = sum_values(values).unwrap_err();
            assert!(matches!(err, MonitorError::PrecisionLoss(_)));
        }
    }

    #[test]
    fn test_exact_ops_with_zero() {
        assert_eq!(exact_mul(Decimal::ZERO, dec("1.5")).unwrap(), Decimal::ZERO);
        assert_eq!(exact_add(Decimal::ZERO, dec("0.000001")).unwrap(), dec("0.000001"));
        assert_eq!(exact_add(dec("2.50"), Decimal::ZERO).unwrap(), dec("2.5"));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        assert_eq!(sum_values(Vec::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_ratio_zero_debt_is_infinite() {
        assert_eq!(
            collateralization_ratio(dec("3"), Decimal::ZERO).unwrap(),
            CollateralizationRatio::Infinite
        );
        assert_eq!(
            collateralization_ratio(Decimal::ZERO, dec("0.000")).unwrap(),
            CollateralizationRatio::Infinite
        );
    }

    #[test]
    fn test_ratio_finite() {
        assert_eq!(
            collateralization_ratio(dec("3.00"), dec("1.00")).unwrap(),
            CollateralizationRatio::Finite(dec("3"))
        );
        assert_eq!(
            collateralization_ratio(dec("2"), dec("3")).unwrap(),
            CollateralizationRatio::Finite(dec("0.666666666666666667"))
        );
        assert_eq!(
            collateralization_ratio(Decimal::ZERO, dec("5")).unwrap(),
            CollateralizationRatio::Finite(Decimal::ZERO)
        );
    }

    #[test]
    fn test_ratio_uses_bankers_rounding() {
        assert_eq!(
            collateralization_ratio(dec("0.0000000000000000025"), dec("1")).unwrap(),
            CollateralizationRatio::Finite(dec("0.000000000000000002"))
        );
        assert_eq!(
            collateralization_ratio(dec("0.0000000000000000035"), dec("1")).unwrap(),
            CollateralizationRatio::Finite(dec("0.000000000000000004"))
        );
    }
}
