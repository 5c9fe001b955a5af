pub mod math;

pub use math::{
    collateralization_ratio, exact_add, exact_mul, position_value_usd, scale_amount, sum_values,
};
