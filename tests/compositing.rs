use ndarray::*;
use patch_heatmap::accumulator::{build_raster, build_raster_parallel};
use patch_heatmap::compositor::{composite, GroupedCompositor};
use patch_heatmap::palette::Palette;
use patch_heatmap::scaler::MinMaxScaler;
use patch_heatmap::{CompositeError, CompositeMode, Patch, Shape, Verbosity};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn group(list: &[(i64, i64, i64, i64, f32)]) -> Vec<Patch<f32>> {
    list.iter().map(|&p| Patch::from(p)).collect()
}

/// Deterministic pseudo-random patches, so that runs are comparable.
fn scattered(seed: u64, count: usize, width: i64, height: i64) -> Vec<Patch<f32>> {
    let mut state = seed;
    let mut next = move |bound: i64| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) as i64).rem_euclid(bound)
    };
    (0..count)
        .map(|_| {
            let x = next(height);
            let y = next(width);
            let cx = next(12) + 1;
            let cy = next(12) + 1;
            let alpha = next(8) as f32 * 0.25;
            Patch::new(x, y, cx, cy, alpha)
        })
        .collect()
}

#[test]
fn overlapping_add_scenario() {
    init_logger();
    let patches = group(&[(0, 0, 5, 5, 1.0), (2, 2, 5, 5, 1.0)]);
    let shape = Shape::from((10, 10));
    let raster = build_raster(&patches, shape, CompositeMode::Add, Verbosity::Summary).unwrap();

    for ((row, col), &v) in raster.indexed_iter() {
        let in_first = row < 5 && col < 5;
        let in_second = (2..7).contains(&row) && (2..7).contains(&col);
        let expected = match (in_first, in_second) {
            (true, true) => 2.0,
            (false, false) => 0.0,
            _ => 1.0,
        };
        assert_eq!(v, expected, "cell ({}, {})", row, col);
    }

    let mut scaler = MinMaxScaler::new();
    let normalized = scaler.fit_transform(&raster).unwrap();
    assert_eq!(normalized[[3, 3]], 1.0);
    assert_eq!(normalized[[0, 0]], 0.5);
    assert_eq!(normalized[[9, 9]], 0.0);
}

#[test]
fn overwrite_scenario_keeps_highest_weight() {
    let patches = group(&[(0, 0, 4, 4, 0.2), (0, 0, 4, 4, 0.9)]);
    let raster = build_raster(
        &patches,
        Shape::new(10, 10),
        CompositeMode::Overwrite,
        Verbosity::Silent,
    )
    .unwrap();
    assert!(raster.slice(s![0..4, 0..4]).iter().all(|&v| v == 0.9));
}

#[test]
fn empty_groups_scenario() {
    let groups: Vec<Vec<Patch<f32>>> = vec![];
    let (rasters, normalized, colored) = composite(
        &groups,
        Shape::new(10, 10),
        CompositeMode::Add,
        Palette::Jet,
        4,
        Verbosity::Silent,
    )
    .unwrap()
    .into_parts();
    assert!(rasters.is_empty() && normalized.is_empty() && colored.is_empty());
}

#[test]
fn transform_is_idempotent_per_scaler() {
    let raster = build_raster(
        &scattered(7, 40, 30, 20),
        Shape::new(30, 20),
        CompositeMode::Add,
        Verbosity::Silent,
    )
    .unwrap();
    let mut scaler = MinMaxScaler::new();
    scaler.fit(&raster);
    assert_eq!(
        scaler.transform(&raster).unwrap(),
        scaler.transform(raster.view()).unwrap()
    );
}

#[test]
fn group_order_does_not_depend_on_workers() {
    init_logger();
    let shape = Shape::new(40, 30);
    let groups: Vec<Vec<Patch<f32>>> = (0..3).map(|seed| scattered(seed, 60, 40, 30)).collect();

    for mode in [
        CompositeMode::Add,
        CompositeMode::Overwrite,
        CompositeMode::OverwritePerimeter,
    ]
    .iter()
    {
        let compositor = GroupedCompositor::new(*mode, Palette::Plasma);
        let single = compositor.composite(&groups, shape).unwrap();
        let pooled = compositor
            .clone()
            .with_workers(4)
            .composite(&groups, shape)
            .unwrap();

        assert_eq!(single.rasters, pooled.rasters);
        assert_eq!(single.normalized, pooled.normalized);
        assert_eq!(single.colored, pooled.colored);
        for (i, patches) in groups.iter().enumerate() {
            let alone = build_raster(patches, shape, *mode, Verbosity::Silent).unwrap();
            assert_eq!(pooled.rasters[i], alone);
        }
    }
}

#[test]
fn parallel_patches_match_sequential() {
    let patches = scattered(42, 200, 64, 48);
    let shape = Shape::new(64, 48);
    for mode in [
        CompositeMode::Add,
        CompositeMode::Overwrite,
        CompositeMode::OverwritePerimeter,
    ]
    .iter()
    {
        let seq = build_raster(&patches, shape, *mode, Verbosity::Silent).unwrap();
        for &workers in &[2, 3, 7] {
            let par = build_raster_parallel(&patches, shape, *mode, workers, Verbosity::Silent)
                .unwrap();
            assert_eq!(seq, par, "mode {} with {} workers", mode, workers);
        }
    }
}

#[test]
fn widest_scaler_bounds_weaker_groups() {
    // maxima 5.0 and 10.0
    let weak = group(&[(0, 0, 4, 4, 2.0), (1, 1, 4, 4, 3.0)]);
    let strong = group(&[(2, 2, 3, 3, 10.0)]);
    let out = GroupedCompositor::new(CompositeMode::Add, Palette::Jet)
        .composite(&[weak, strong], Shape::new(8, 8))
        .unwrap();

    assert_eq!(out.rasters[0].fold(0.0_f32, |m, &v| m.max(v)), 5.0);
    assert_eq!(out.scaler.and_then(|s| s.data_max()), Some(10.0));
    assert!(out.normalized[0].iter().all(|&v| v <= 0.5));
    assert_eq!(out.normalized[0][[1, 1]], 0.5);
    assert_eq!(out.normalized[1][[2, 2]], 1.0);
}

#[test]
fn flat_rasters_stay_finite() {
    let groups = vec![group(&[]), group(&[(50, 50, 3, 3, 1.0)])];
    let out = composite(
        &groups,
        Shape::new(6, 6),
        CompositeMode::Add,
        Palette::Viridis,
        1,
        Verbosity::Silent,
    )
    .unwrap();
    for normalized in &out.normalized {
        assert!(normalized.iter().all(|&v| v == 0.0));
    }
    for colored in &out.colored {
        assert!(colored.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn dropped_patch_leaves_raster_unchanged() {
    let shape = Shape::new(12, 9);
    let kept = group(&[(1, 1, 4, 4, 1.0)]);
    let mut with_dropped = kept.clone();
    // x + cx >= height collapses cx to 0
    with_dropped.push(Patch::new(8, 2, 3, 3, 9.0));
    let a = build_raster(&kept, shape, CompositeMode::Overwrite, Verbosity::Silent).unwrap();
    let b = build_raster(&with_dropped, shape, CompositeMode::Overwrite, Verbosity::Silent).unwrap();
    assert_eq!(a, b);
}

#[test]
fn unknown_names_fail_early() {
    assert!(matches!(
        "average".parse::<CompositeMode>(),
        Err(CompositeError::InvalidMode(_))
    ));
    assert!(matches!(
        GroupedCompositor::from_names("add", "cubehelix"),
        Err(CompositeError::UnknownPalette(_))
    ));
}

#[test]
fn diagnostics_are_written_per_group() {
    init_logger();
    let dir = std::env::temp_dir().join(format!("patch-heatmap-it-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let groups = vec![
        group(&[(0, 0, 3, 3, 1.0)]),
        group(&[(2, 2, 3, 3, 2.0)]),
    ];
    GroupedCompositor::new(CompositeMode::Add, Palette::Spring)
        .with_verbosity(Verbosity::Diagnostics)
        .with_diagnostics_dir(&dir)
        .composite(&groups, Shape::new(6, 6))
        .unwrap();

    for i in 0..2 {
        for name in &[
            "original.npy",
            "original.png",
            "normalized.png",
            "colored_spring.png",
        ] {
            let path = dir.join(format!("group{}_{}", i, name));
            assert!(path.is_file(), "missing {}", path.display());
        }
    }
    let _ = std::fs::remove_dir_all(&dir);
}
