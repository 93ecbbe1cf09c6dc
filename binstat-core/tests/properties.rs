use approx::assert_relative_eq;
use binstat_core::{
    BinIndex, Binning, Error, Histogram, Histogram1D, Histogram2D, Histogram3D, HistogramConfig,
    Profile1D, Profile2D, ValueWindow,
};

fn sample_points() -> Vec<(f64, f64)> {
    // Deterministic spread covering in-range and outflow bins on both axes.
    (0..200)
        .map(|n| {
            let t = f64::from(n);
            ((t * 0.37) % 12.0 - 1.0, (t * 0.73) % 7.0 - 1.5)
        })
        .collect()
}

#[test]
fn test_bin_count_is_product_of_padded_axes() {
    let config = HistogramConfig::new("c")
        .with_fixed_axis(7, 0.0, 1.0)
        .with_edges(vec![0.0, 0.5, 2.0, 4.0])
        .with_fixed_axis(1, -1.0, 1.0);
    let h = Histogram::new(&config).unwrap();
    assert_eq!(h.bin_count(), 9 * 5 * 3);
    assert_eq!(h.axes()[2].multiplier(), 9 * 5);
}

#[test]
fn test_entries_partition_all_entries() {
    let mut h = Histogram2D::new("p", Binning::fixed(5, 0.0, 10.0), Binning::fixed(4, 0.0, 4.0))
        .unwrap();
    for (x, y) in sample_points() {
        h.fill(x, y).unwrap();
    }
    assert_eq!(h.entries() + h.extra_entries(), h.all_entries());
    assert_eq!(h.all_entries(), 200);
    assert!(h.extra_entries() > 0);
    assert_eq!(h.entries(), h.histogram().entries());
}

#[test]
fn test_scenario_three_fills_in_one_bin() {
    let mut h = Histogram1D::new("h", 10, 0.0, 10.0).unwrap();
    for _ in 0..3 {
        h.fill(5.5).unwrap();
    }
    assert_relative_eq!(h.bin_height(BinIndex::InRange(5)), 3.0);
    assert_eq!(h.entries(), 3);
    assert_relative_eq!(h.mean(), 5.5);
}

#[test]
fn test_scenario_underflow_fill() {
    let mut h = Histogram1D::new("h", 10, 0.0, 10.0).unwrap();
    h.fill(-1.0).unwrap();
    assert_eq!(h.bin_entries(BinIndex::Underflow), 1);
    assert_eq!(h.entries(), 0);
    assert_eq!(h.all_entries(), 1);
    assert_relative_eq!(h.mean(), 0.0);
}

#[test]
fn test_scenario_incompatible_add_leaves_both_unchanged() {
    let mut a = Histogram1D::new("a", 10, 0.0, 10.0).unwrap();
    let mut b = Histogram1D::new("b", 12, 0.0, 10.0).unwrap();
    a.fill(2.0).unwrap();
    b.fill(3.0).unwrap();
    let (a_before, b_before) = (a.clone(), b.clone());

    assert!(matches!(a.add(&b), Err(Error::Incompatible(_))));
    assert_eq!(a, a_before);
    assert_eq!(b, b_before);
}

#[test]
fn test_add_then_subtract_restores_weights_not_errors() {
    let mut a = Histogram2D::new("a", Binning::fixed(5, 0.0, 10.0), Binning::fixed(4, 0.0, 4.0))
        .unwrap();
    let mut b = a.clone();
    for (n, (x, y)) in sample_points().into_iter().enumerate() {
        if n % 2 == 0 {
            a.fill_weighted(x, y, 0.5).unwrap();
        } else {
            b.fill_weighted(x, y, 2.0).unwrap();
        }
    }
    let before = a.clone();
    a.add(&b).unwrap();
    a.subtract(&b).unwrap();

    let (now, then) = (a.histogram().data(), before.histogram().data());
    assert_eq!(now.entries, then.entries);
    for offset in 0..now.bin_count {
        assert_relative_eq!(now.sum_w[offset], then.sum_w[offset], epsilon = 1e-9);
        assert_relative_eq!(
            now.sum_w2[offset],
            then.sum_w2[offset] + 2.0 * b.histogram().data().sum_w2[offset],
            epsilon = 1e-9
        );
    }
    assert_eq!(a.entries(), before.entries());
}

#[test]
fn test_projection_matches_column_entries() {
    let mut h = Histogram2D::new("h", Binning::fixed(5, 0.0, 10.0), Binning::fixed(4, 0.0, 4.0))
        .unwrap();
    for (x, y) in sample_points() {
        h.fill(x, y).unwrap();
    }
    let px = h.projection_x();
    let py = h.projection_y();
    let columns = std::iter::once(BinIndex::Underflow)
        .chain((0..5).map(BinIndex::InRange))
        .chain(std::iter::once(BinIndex::Overflow));
    for i in columns {
        assert_eq!(px.bin_entries(i), h.bin_entries_x(i));
        assert_relative_eq!(px.bin_height(i), h.bin_height_x(i));
    }
    for j in (0..4).map(BinIndex::InRange) {
        assert_eq!(py.bin_entries(j), h.bin_entries_y(j));
    }
    assert_eq!(px.all_entries(), h.all_entries());
}

#[test]
fn test_slice_sums_requested_rows_only() {
    let mut h = Histogram2D::new("h", Binning::fixed(2, 0.0, 2.0), Binning::fixed(3, 0.0, 3.0))
        .unwrap();
    h.fill(0.5, 0.5).unwrap();
    h.fill(0.5, 1.5).unwrap();
    h.fill(0.5, 2.5).unwrap();
    h.fill(1.5, -3.0).unwrap();

    let middle = h.slice_x(BinIndex::InRange(1), BinIndex::InRange(2)).unwrap();
    assert_eq!(middle.bin_entries(BinIndex::InRange(0)), 2);
    assert_eq!(middle.bin_entries(BinIndex::InRange(1)), 0);

    let mut acc = h.slice_x(BinIndex::Underflow, BinIndex::Underflow).unwrap();
    assert_eq!(acc.bin_entries(BinIndex::InRange(1)), 1);
    h.fill_slice_x(&mut acc, BinIndex::InRange(0), BinIndex::InRange(0))
        .unwrap();
    assert_eq!(acc.entries(), 2);
    assert_relative_eq!(acc.mean(), 1.0);
}

#[test]
fn test_scale_identity_and_negative_factor() {
    let mut h = Histogram1D::new("h", 4, 0.0, 4.0).unwrap();
    h.fill_weighted(1.5, 2.0).unwrap();
    h.fill_weighted(2.5, 3.0).unwrap();
    let original = h.clone();

    h.scale(1.0).unwrap();
    assert_eq!(h, original);

    h.scale(0.5).unwrap();
    assert_relative_eq!(h.sum_w(), original.sum_w() * 0.5);
    assert_relative_eq!(
        h.histogram().sum_w2(),
        original.histogram().sum_w2() * 0.25
    );
    assert_relative_eq!(h.mean(), original.mean());

    let scaled = h.clone();
    assert_eq!(h.scale(-2.0), Err(Error::NegativeFactor(-2.0)));
    assert_eq!(h, scaled);
}

#[test]
fn test_profile_window_rejection_is_silent() {
    let mut p = Profile1D::new("p", 5, 0.0, 5.0, Some(ValueWindow::new(-1.0, 1.0))).unwrap();
    p.fill(2.5, 0.5).unwrap();
    let before = p.clone();
    assert!(p.fill(2.5, 1.0).is_ok());
    assert!(p.fill(f64::NAN, 7.0).is_ok());
    assert_eq!(p, before);
}

#[test]
fn test_profile_error_on_mean() {
    let mut p = Profile2D::new("p", Binning::fixed(1, 0.0, 1.0), Binning::fixed(1, 0.0, 1.0), None)
        .unwrap();
    for v in [1.0, 2.0, 3.0, 6.0] {
        p.fill(0.5, 0.5, v).unwrap();
    }
    let bin = (BinIndex::InRange(0), BinIndex::InRange(0));
    let rms = (50.0_f64 / 4.0 - 9.0).sqrt();
    assert_relative_eq!(p.bin_height(bin.0, bin.1), 3.0);
    assert_relative_eq!(p.bin_rms(bin.0, bin.1), rms, epsilon = 1e-12);
    assert_relative_eq!(p.bin_error(bin.0, bin.1), rms / 2.0, epsilon = 1e-12);
}

#[test]
fn test_arithmetic_rebuilds_cached_means() {
    let mut a = Histogram3D::new(
        "a",
        Binning::fixed(2, 0.0, 2.0),
        Binning::fixed(2, 0.0, 2.0),
        Binning::fixed(2, 0.0, 2.0),
    )
    .unwrap();
    let mut b = a.clone();
    a.fill(0.2, 0.2, 0.2).unwrap();
    b.fill(1.8, 1.8, 1.8).unwrap();

    a.add(&b).unwrap();
    assert_eq!(a.entries(), 2);
    assert_relative_eq!(a.mean_z(), 1.0);

    a.multiply(&b).unwrap();
    assert_eq!(a.all_entries(), i64::try_from(a.bin_count()).unwrap());
    assert_relative_eq!(a.mean_x(), 1.5);
    assert_relative_eq!(a.rms_x(), 0.0);
}
