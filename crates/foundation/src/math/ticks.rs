//! "Nice" tick generation: steps of 1, 2 or 5 times a power of ten.

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// `(i1, i2, inc)`: ticks are `i * inc` for `inc > 0`, or `i / -inc` for `inc < 0`.
fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let k = 10f64.powf(-power) / factor;
        i1 = (start * k).round();
        i2 = (stop * k).round();
        if i1 / k < start {
            i1 += 1.0;
        }
        if i2 / k > stop {
            i2 -= 1.0;
        }
        inc = -k;
    } else {
        let k = 10f64.powf(power) * factor;
        i1 = (start / k).round();
        i2 = (stop / k).round();
        if i1 * k < start {
            i1 += 1.0;
        }
        if i2 * k > stop {
            i2 -= 1.0;
        }
        inc = k;
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Roughly `count` nice values covering `[start, stop]` (either order).
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let count = count as f64;
    if !(count > 0.0) || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count)
    } else {
        tick_spec(start, stop, count)
    };
    if !(i2 >= i1) {
        return Vec::new();
    }

    let n = (i2 - i1) as usize + 1;
    let value = |i: f64| if inc < 0.0 { i / -inc } else { i * inc };
    (0..n)
        .map(|j| {
            if reverse {
                value(i2 - j as f64)
            } else {
                value(i1 + j as f64)
            }
        })
        .collect()
}

/// Signed increment code used by [`nice`]; see [`tick_spec`].
pub fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    tick_spec(start, stop, count as f64).2
}

/// Distance between adjacent ticks.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let reverse = stop < start;
    let inc = if reverse {
        tick_increment(stop, start, count)
    } else {
        tick_increment(start, stop, count)
    };
    let step = if inc < 0.0 { 1.0 / -inc } else { inc };
    if reverse { -step } else { step }
}

/// Extends `[start, stop]` outward to round tick boundaries.
pub fn nice(start: f64, stop: f64, count: usize) -> (f64, f64) {
    if !start.is_finite() || !stop.is_finite() || start == stop {
        return (start, stop);
    }
    let reverse = stop < start;
    let (mut lo, mut hi) = if reverse { (stop, start) } else { (start, stop) };
    let mut prestep: Option<f64> = None;
    for _ in 0..10 {
        let step = tick_increment(lo, hi, count);
        if prestep == Some(step) {
            break;
        }
        if step > 0.0 {
            lo = (lo / step).floor() * step;
            hi = (hi / step).ceil() * step;
        } else if step < 0.0 {
            lo = (lo * step).ceil() / step;
            hi = (hi * step).floor() / step;
        } else {
            break;
        }
        prestep = Some(step);
    }
    if reverse { (hi, lo) } else { (lo, hi) }
}

/// Decimals needed to print ticks spaced `step` apart without losing precision.
pub fn tick_precision(step: f64) -> usize {
    let step = step.abs();
    if step == 0.0 || !step.is_finite() {
        return 0;
    }
    // Nudge so exact powers of ten are not misread as the decade below.
    (-(step.log10() + 1e-9).floor()).max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::{nice, tick_precision, tick_step, ticks};

    #[test]
    fn integer_ticks() {
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(ticks(0.0, 10.0, 10).len(), 11);
    }

    #[test]
    fn fractional_ticks_are_exact() {
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn reversed_domain_yields_descending_ticks() {
        assert_eq!(ticks(10.0, 0.0, 5), vec![10.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(ticks(3.0, 3.0, 5), vec![3.0]);
        assert!(ticks(0.0, 1.0, 0).is_empty());
        assert!(ticks(f64::NAN, 1.0, 5).is_empty());
    }

    #[test]
    fn latitude_ticks() {
        assert_eq!(
            ticks(18.3, 55.6, 6),
            vec![20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0]
        );
        assert_eq!(tick_step(18.3, 55.6, 6), 5.0);
    }

    #[test]
    fn nice_extends_domain() {
        assert_eq!(nice(0.13, 9.7, 10), (0.0, 10.0));
        assert_eq!(nice(-3.2, 47.0, 10), (-5.0, 50.0));
        assert_eq!(nice(9.7, 0.13, 10), (10.0, 0.0));
    }

    #[test]
    fn precision_from_step() {
        assert_eq!(tick_precision(5.0), 0);
        assert_eq!(tick_precision(10.0), 0);
        assert_eq!(tick_precision(0.5), 1);
        assert_eq!(tick_precision(0.1), 1);
        assert_eq!(tick_precision(0.02), 2);
    }
}
