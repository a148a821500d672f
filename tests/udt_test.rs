use proptest::prelude::*;
use rsched::{InterpolationType, Udt};

/// Strictly ascending sample points with matching table values
fn arb_table() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((0.1f64..10.0, -100.0f64..100.0), 2..12).prop_map(|points| {
        let mut x = 0.0;
        let mut xs = Vec::with_capacity(points.len());
        let mut ys = Vec::with_capacity(points.len());
        for (step, y) in points {
            x += step;
            xs.push(x);
            ys.push(y);
        }
        (xs, ys)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every interpolation type reproduces the table at its sample points
    #[test]
    fn property_sample_points_are_exact((xs, ys) in arb_table()) {
        for kind in [
            InterpolationType::NearestNeighbour,
            InterpolationType::LinearClamp,
            InterpolationType::LinearExtrapolate,
        ] {
            let udt = Udt::new(xs.clone(), ys.clone(), kind).unwrap();
            for (x, y) in xs.iter().zip(&ys) {
                prop_assert_eq!(udt.eval(*x), *y);
            }
        }
    }

    /// Nearest neighbour lookups only return table values
    #[test]
    fn property_nearest_returns_table_value((xs, ys) in arb_table(), x in -10.0f64..150.0) {
        let udt = Udt::new(xs, ys.clone(), InterpolationType::NearestNeighbour).unwrap();
        prop_assert!(ys.contains(&udt.eval(x)));
    }

    /// Clamped interpolation stays within the table range
    #[test]
    fn property_clamp_stays_in_range((xs, ys) in arb_table(), x in -10.0f64..150.0) {
        let lo = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let udt = Udt::new(xs.clone(), ys, InterpolationType::LinearClamp).unwrap();
        let value = udt.eval(x);
        prop_assert!(value >= lo - 1e-9 && value <= hi + 1e-9);
        if x <= xs[0] {
            prop_assert_eq!(value, udt.eval(xs[0]));
        }
    }
}

#[test]
fn test_extrapolation_continues_end_segments() {
    let udt = Udt::new(vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 3.0], InterpolationType::LinearExtrapolate).unwrap();
    assert_eq!(udt.eval(-1.0), -2.0);
    assert_eq!(udt.eval(4.0), 5.0);
}

#[test]
fn test_nearest_ties_round_up() {
    let udt = Udt::new(vec![0.0, 2.0], vec![10.0, 20.0], InterpolationType::NearestNeighbour).unwrap();
    assert_eq!(udt.eval(1.0), 20.0);
    assert_eq!(udt.eval(0.9), 10.0);
}
