// src/common/numeric.rs

use rust_decimal::Decimal;

/// `true` se o valor cabe numa coluna NUMERIC(precision, scale) sem arredondamento.
/// Zeros à direita não contam como casas decimais (12.340 cabe em escala 2).
pub fn fits_numeric(value: Decimal, precision: u32, scale: u32) -> bool {
    let integer_digits = precision.saturating_sub(scale);
    let limit = Decimal::from(10i64.pow(integer_digits));
    value.normalize().scale() <= scale && value.abs() < limit
}
