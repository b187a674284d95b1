//! Settlement arithmetic. Monetary values are stored as i64 cents; request
//! amounts are converted once at the service boundary, and fee splits are
//! rounded once at computation time and never re-rounded on read.

/// Convert a 2-decimal request amount to cents.
pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Platform fee for a settlement, in cents. `fee_bps` is the platform's cut
/// in basis points (1000 = 10%). Rounds half-up.
pub fn platform_fee(amount_cents: i64, fee_bps: i64) -> i64 {
    (amount_cents * fee_bps + 5_000) / 10_000
}

/// Split a milestone amount into (platform_fee, freelancer_amount).
/// The two parts always sum back to the original amount.
pub fn split_settlement(amount_cents: i64, fee_bps: i64) -> (i64, i64) {
    let fee = platform_fee(amount_cents, fee_bps);
    (fee, amount_cents - fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_to_cents() {
        assert_eq!(amount_to_cents(100.0), 10000);
        assert_eq!(amount_to_cents(0.50), 50);
        assert_eq!(amount_to_cents(123.45), 12345);
    }

    #[test]
    fn test_platform_fee_rounding() {
        // 10% of 400.00
        assert_eq!(platform_fee(40000, 1000), 4000);
        // 10% of 0.05 rounds half-up to a whole cent
        assert_eq!(platform_fee(5, 1000), 1);
        // 2.5% of 33.33 = 0.833.. -> 0.83
        assert_eq!(platform_fee(3333, 250), 83);
        assert_eq!(platform_fee(10000, 0), 0);
    }

    #[test]
    fn test_split_settlement_sums_back() {
        for amount in [1, 99, 40000, 12345, 99999] {
            for bps in [0, 250, 1000, 1500] {
                let (fee, net) = split_settlement(amount, bps);
                assert_eq!(fee + net, amount);
                assert!(fee >= 0 && net >= 0);
            }
        }
        // 400.00 at 10% -> 40.00 fee, 360.00 to freelancer
        assert_eq!(split_settlement(40000, 1000), (4000, 36000));
    }
}
