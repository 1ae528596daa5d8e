//! Small helper functions and structures used throughout the crate.

pub(crate) mod linear_transform;

use crate::{IntVal, NonZeroIntVal};

/// Compute the smallest integer greater than or equal to the quotient of
/// `numerator` and `divisor`.
pub(crate) fn div_ceil(numerator: IntVal, divisor: NonZeroIntVal) -> IntVal {
	let d = divisor.get();
	let q = numerator / d;
	let r = numerator % d;
	if r != 0 && ((r < 0) == (d < 0)) {
		q + 1
	} else {
		q
	}
}

/// Compute the largest integer less than or equal to the quotient of
/// `numerator` and `divisor`.
pub(crate) fn div_floor(numerator: IntVal, divisor: NonZeroIntVal) -> IntVal {
	let d = divisor.get();
	let q = numerator / d;
	let r = numerator % d;
	if r != 0 && ((r < 0) != (d < 0)) {
		q - 1
	} else {
		q
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		helpers::{div_ceil, div_floor},
		NonZeroIntVal,
	};

	#[test]
	fn test_div_rounding() {
		let two = NonZeroIntVal::new(2).unwrap();
		let neg_two = NonZeroIntVal::new(-2).unwrap();

		assert_eq!(div_ceil(7, two), 4);
		assert_eq!(div_ceil(8, two), 4);
		assert_eq!(div_ceil(-7, two), -3);
		assert_eq!(div_ceil(7, neg_two), -3);
		assert_eq!(div_ceil(-7, neg_two), 4);

		assert_eq!(div_floor(7, two), 3);
		assert_eq!(div_floor(8, two), 4);
		assert_eq!(div_floor(-7, two), -4);
		assert_eq!(div_floor(7, neg_two), -4);
		assert_eq!(div_floor(-7, neg_two), 3);
	}
}
