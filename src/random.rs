//! Random sampling helpers used for amounts, delays and vote splits.
//!
//! Every function takes the generator explicitly so callers can seed it.

use crate::error::RandomError;
use rand::distributions::uniform::SampleUniform;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Display;

/// Uniform integer in `[min, max]`, both ends inclusive.
pub fn random_int<T, R>(rng: &mut R, min: T, max: T) -> Result<T, RandomError>
where
    T: SampleUniform + PartialOrd + Copy + Display,
    R: Rng + ?Sized,
{
    if max < min {
        return Err(RandomError::EmptyRange {
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(rng.gen_range(min..=max))
}

/// Uniform integer in `[ceil(min), floor(max)]`.
pub fn random_int_between<R>(rng: &mut R, min: Decimal, max: Decimal) -> Result<i128, RandomError>
where
    R: Rng + ?Sized,
{
    let empty = || RandomError::EmptyRange {
        min: min.to_string(),
        max: max.to_string(),
    };
    let low = min.ceil().to_i128().ok_or_else(empty)?;
    let high = max.floor().to_i128().ok_or_else(empty)?;
    if high < low {
        return Err(empty());
    }
    random_int(rng, low, high)
}

pub fn random_choice<'a, T, R>(rng: &mut R, items: &'a [T]) -> Result<&'a T, RandomError>
where
    R: Rng + ?Sized,
{
    items.choose(rng).ok_or(RandomError::EmptySet)
}

/// `count` distinct items, in random order.
pub fn random_choices<T, R>(rng: &mut R, items: &[T], count: usize) -> Result<Vec<T>, RandomError>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if count > items.len() {
        return Err(RandomError::NotEnoughItems {
            requested: count,
            available: items.len(),
        });
    }
    Ok(items.choose_multiple(rng, count).cloned().collect())
}

/// Splits `sum` into `count` parts by cutting the remaining budget one part
/// at a time.
///
/// Each cut is uniform in `[1, remaining - later]`, where `later` is the
/// number of parts still to draw, and the last part absorbs the rest. With
/// `sum >= count` every part is at least 1. With `sum < count` the budget
/// runs out one unit at a time and the trailing parts are 0.
///
/// The split is not uniform over all compositions: earlier parts are
/// stochastically larger.
pub fn partition_sum<R>(rng: &mut R, count: usize, sum: u64) -> Result<Vec<u64>, RandomError>
where
    R: Rng + ?Sized,
{
    if count == 0 {
        return Err(RandomError::ZeroCount);
    }

    let mut parts = Vec::with_capacity(count);
    let mut remaining = sum;

    for drawn in 1..count {
        let later = (count - drawn) as u64;
        let part = if remaining > later {
            rng.gen_range(1..=remaining - later)
        } else {
            remaining.min(1)
        };
        parts.push(part);
        remaining -= part;
    }

    parts.push(remaining);
    Ok(parts)
}
