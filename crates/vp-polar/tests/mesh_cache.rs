use std::sync::{Arc, Mutex};

use vp_core::deg;
use vp_foil::{Foil, PolarChannel};
use vp_polar::{MeshOutcome, MeshRequest, MeshSettings, PolarMeshCache};
use vp_predictor::testing::{PredictorLog, Script, SyntheticLauncher, synthetic_cd};
use vp_predictor::{ModelSize, PredictorError, RuntimeBridge};

fn diamond() -> Foil {
    Foil::from_points(
        "diamond",
        &[(1.0, 0.0), (0.5, 0.06), (0.0, 0.0), (0.5, -0.06)],
    )
    .unwrap()
}

fn bridge_with(script: Script) -> (RuntimeBridge, Arc<PredictorLog>, Arc<Mutex<Script>>) {
    let launcher = SyntheticLauncher::with_script(script);
    let log = launcher.log();
    let handle = launcher.script();
    (RuntimeBridge::new(launcher), log, handle)
}

fn standard_request() -> MeshRequest {
    MeshRequest::new(1e5, 1e6, deg(-4.0), deg(10.0))
}

fn built_cache() -> (PolarMeshCache, RuntimeBridge, Arc<PredictorLog>) {
    let (bridge, log, _) = bridge_with(Script::default());
    let mut cache = PolarMeshCache::new();
    let outcome = cache
        .generate_polar_mesh(&bridge, &diamond(), &standard_request())
        .unwrap();
    assert_eq!(outcome, MeshOutcome::Rebuilt);
    (cache, bridge, log)
}

#[test]
fn build_requests_ladder_in_one_call() {
    let (cache, _, log) = built_cache();
    assert_eq!(log.sweep_batches(), 1);
    assert_eq!(cache.len(), 16);

    let request = log.last_sweep_request().unwrap();
    assert_eq!(request.reynolds.len(), 16);
    assert_eq!(request.reynolds[0], 1e5);
    assert_eq!(request.reynolds[15], 1e6);
    let ratio = 10f64.powf(1.0 / 15.0);
    assert!((request.reynolds[1] / request.reynolds[0] - ratio).abs() < 1e-12);
    assert!((request.alpha.v_min + 4.0).abs() < 1e-12);
    assert!((request.alpha.v_max - 10.0).abs() < 1e-12);
    assert_eq!(request.alpha.v_inc, 0.25);
    assert_eq!(request.alpha.n_values(), 57);
    assert_eq!(request.mach, 0.0);
    assert_eq!(request.model_size, ModelSize::Xlarge);

    assert_eq!(cache.re_values(), request.reynolds.as_slice());
    assert_eq!(cache.re_range(), Some((1e5, 1e6)));
    let (a_min, a_max) = cache.alpha_range_deg().unwrap();
    assert!((a_min + 4.0).abs() < 1e-12 && (a_max - 10.0).abs() < 1e-12);
    assert!(cache.fingerprint().is_some());
}

#[test]
fn repeated_and_contained_requests_hit() {
    let (mut cache, bridge, log) = built_cache();
    let foil = diamond();

    assert_eq!(
        cache.generate_polar_mesh(&bridge, &foil, &standard_request()).unwrap(),
        MeshOutcome::Hit
    );
    let inner = MeshRequest::new(2e5, 5e5, deg(0.0), deg(8.0));
    assert!(cache.covers(&foil, &inner));
    assert_eq!(
        cache.generate_polar_mesh(&bridge, &foil, &inner).unwrap(),
        MeshOutcome::Hit
    );
    assert_eq!(log.sweep_batches(), 1);
}

#[test]
fn wider_range_rebuilds() {
    let (mut cache, bridge, log) = built_cache();
    let wider = MeshRequest::new(5e4, 1e6, deg(-4.0), deg(10.0));
    assert_eq!(
        cache.generate_polar_mesh(&bridge, &diamond(), &wider).unwrap(),
        MeshOutcome::Rebuilt
    );
    assert_eq!(cache.len(), 16);
    assert_eq!(log.sweep_batches(), 2);
    assert_eq!(cache.re_range(), Some((5e4, 1e6)));
    assert_eq!(cache.curves()[0].reynolds(), 5e4);

    let more_alpha = MeshRequest::new(5e4, 1e6, deg(-4.0), deg(12.0));
    assert_eq!(
        cache.generate_polar_mesh(&bridge, &diamond(), &more_alpha).unwrap(),
        MeshOutcome::Rebuilt
    );
    assert_eq!(cache.len(), 16);
    assert_eq!(log.sweep_batches(), 3);
}

#[test]
fn geometry_edit_invalidates() {
    let (mut cache, bridge, log) = built_cache();

    let mut moved_first = diamond();
    moved_first.set_node(0, 1.0, 0.001).unwrap();
    assert!(!cache.covers(&moved_first, &standard_request()));
    assert_eq!(
        cache
            .generate_polar_mesh(&bridge, &moved_first, &standard_request())
            .unwrap(),
        MeshOutcome::Rebuilt
    );
    assert_eq!(cache.len(), 16);

    let mut moved_mid = moved_first.clone();
    moved_mid.set_node(2, 0.0, 0.002).unwrap();
    assert_eq!(
        cache
            .generate_polar_mesh(&bridge, &moved_mid, &standard_request())
            .unwrap(),
        MeshOutcome::Rebuilt
    );
    assert_eq!(cache.len(), 16);
    assert_eq!(log.sweep_batches(), 3);
}

#[test]
fn unsampled_node_edit_hits_in_sampled_mode_but_not_full() {
    let request = standard_request();
    let mut edited = diamond();
    edited.set_node(1, 0.5, 0.07).unwrap();

    let (mut sampled, bridge, log) = built_cache();
    assert_eq!(
        sampled.generate_polar_mesh(&bridge, &edited, &request).unwrap(),
        MeshOutcome::Hit
    );
    assert_eq!(log.sweep_batches(), 1);

    let mut full = PolarMeshCache::with_settings(MeshSettings {
        fingerprint_mode: vp_foil::FingerprintMode::Full,
        ..MeshSettings::default()
    });
    full.generate_polar_mesh(&bridge, &diamond(), &request).unwrap();
    assert_eq!(
        full.generate_polar_mesh(&bridge, &edited, &request).unwrap(),
        MeshOutcome::Rebuilt
    );
}

#[test]
fn curves_sorted_even_when_returned_descending() {
    let (bridge, _, _) = bridge_with(Script {
        reverse_sweeps: true,
        ..Script::default()
    });
    let mut cache = PolarMeshCache::new();
    cache
        .generate_polar_mesh(&bridge, &diamond(), &standard_request())
        .unwrap();
    let re: Vec<f64> = cache.curves().iter().map(|c| c.reynolds()).collect();
    assert!(re.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(re.len(), 16);
}

#[test]
fn exact_ladder_reynolds_matches_curve() {
    let (cache, _, _) = built_cache();
    for curve in cache.curves() {
        let p = cache.plr_point_from_cl(curve.reynolds(), 0.5).unwrap();
        assert_eq!(p.cd, curve.interpolate_at_cl(0.5, PolarChannel::Cd).value);
        assert_eq!(p.xtr_top, curve.interpolate_at_cl(0.5, PolarChannel::XtrTop).value);
        assert_eq!(p.xtr_bot, curve.interpolate_at_cl(0.5, PolarChannel::XtrBot).value);
    }
}

#[test]
fn lowest_ladder_point_lookup() {
    let (cache, _, _) = built_cache();
    let p = cache.plr_point_from_cl(1e5, 0.5).unwrap();
    let first = &cache.curves()[0];
    assert_eq!(p.cd, first.interpolate_at_cl(0.5, PolarChannel::Cd).value);
    // cl=0.5 sits on a sample (alpha=2.5), so the curve reproduces the model.
    assert!((p.cd - synthetic_cd(0.5, 1e5)).abs() < 1e-12);
}

#[test]
fn outside_ladder_clamps_to_nearest_curve() {
    let (cache, _, _) = built_cache();
    assert_eq!(
        cache.plr_point_from_cl(1e4, 0.5).unwrap(),
        cache.plr_point_from_cl(1e5, 0.5).unwrap()
    );
    assert_eq!(
        cache.plr_point_from_cl(5e6, 0.5).unwrap(),
        cache.plr_point_from_cl(1e6, 0.5).unwrap()
    );
}

#[test]
fn interior_reynolds_blends_between_neighbours() {
    let (cache, _, _) = built_cache();
    let (lo, hi) = (&cache.curves()[3], &cache.curves()[4]);
    let re = 0.25 * lo.reynolds() + 0.75 * hi.reynolds();
    let p = cache.plr_point_from_cl(re, 0.6).unwrap();
    let a = lo.interpolate_at_cl(0.6, PolarChannel::Cd).value;
    let b = hi.interpolate_at_cl(0.6, PolarChannel::Cd).value;
    assert!((p.cd - (a + 0.75 * (b - a))).abs() < 1e-12);
}

#[test]
fn lift_outside_curves_is_out_of_domain() {
    let (cache, _, _) = built_cache();
    // Synthetic lift spans -0.15..1.25 over -4..10 deg.
    for (re, cl) in [(3e5, 3.0), (1e4, -1.0), (5e6, 1.5)] {
        let err = cache.plr_point_from_cl(re, cl).unwrap_err();
        assert!(matches!(err, PredictorError::OutOfDomain { .. }));
    }
}

#[test]
fn batch_lookup_matches_single_lookups() {
    let (cache, _, _) = built_cache();
    let queries: Vec<(f64, f64)> = (0..50)
        .map(|i| (1e5 * 10f64.powf(f64::from(i) / 49.0), -0.1 + 0.025 * f64::from(i)))
        .chain([(3e5, 5.0)])
        .collect();
    let batch = cache.plr_points_from_cl(&queries);
    assert_eq!(batch.len(), queries.len());
    for (result, &(re, cl)) in batch.iter().zip(&queries) {
        assert_eq!(result.as_ref().ok(), cache.plr_point_from_cl(re, cl).as_ref().ok());
    }
    assert!(batch.last().unwrap().is_err());
}

#[test]
fn reported_failure_empties_cache() {
    let (mut cache, bridge, _) = built_cache();
    let (failing, _, _) = bridge_with(Script {
        report_failure: Some("sweep diverged".to_string()),
        ..Script::default()
    });
    let wider = MeshRequest::new(5e4, 1e6, deg(-4.0), deg(10.0));

    let err = cache.generate_polar_mesh(&failing, &diamond(), &wider).unwrap_err();
    assert!(matches!(err, PredictorError::PredictorFailure { .. }));
    assert!(cache.is_empty());
    assert!(cache.re_values().is_empty());
    assert!(cache.fingerprint().is_none());
    assert!(matches!(
        cache.plr_point_from_cl(2e5, 0.5),
        Err(PredictorError::TargetMissing { .. })
    ));

    // A healthy runtime rebuilds from scratch.
    assert_eq!(
        cache.generate_polar_mesh(&bridge, &diamond(), &wider).unwrap(),
        MeshOutcome::Rebuilt
    );
}

#[test]
fn transport_error_empties_cache() {
    let (bridge, log, script) = bridge_with(Script::default());
    let mut cache = PolarMeshCache::new();
    script.lock().unwrap().transport_error = Some("runtime exited".to_string());
    let err = cache
        .generate_polar_mesh(&bridge, &diamond(), &standard_request())
        .unwrap_err();
    assert!(matches!(err, PredictorError::Transport { .. }));
    assert!(cache.is_empty());
    assert_eq!(log.sweep_batches(), 1);
}

#[test]
fn unavailable_runtime_leaves_cache_empty() {
    let (bridge, log, _) = bridge_with(Script {
        fail_launch: true,
        ..Script::default()
    });
    let mut cache = PolarMeshCache::new();
    let err = cache
        .generate_polar_mesh(&bridge, &diamond(), &standard_request())
        .unwrap_err();
    assert!(matches!(err, PredictorError::RuntimeUnavailable { .. }));
    assert!(cache.is_empty());
    assert_eq!(log.sweep_batches(), 0);
}

#[test]
fn invalid_ranges_rejected_without_calls() {
    let (bridge, log, _) = bridge_with(Script::default());
    let mut cache = PolarMeshCache::new();
    for request in [
        MeshRequest::new(1e6, 1e5, deg(-4.0), deg(10.0)),
        MeshRequest::new(0.0, 1e5, deg(-4.0), deg(10.0)),
        MeshRequest::new(1e5, 1e6, deg(10.0), deg(-4.0)),
    ] {
        let err = cache
            .generate_polar_mesh(&bridge, &diamond(), &request)
            .unwrap_err();
        assert!(matches!(err, PredictorError::InvalidRequest { .. }), "{err}");
        assert!(cache.is_empty());
    }
    assert_eq!(log.sweep_batches(), 0);
}

#[test]
fn clear_forces_rebuild() {
    let (mut cache, bridge, log) = built_cache();
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(
        cache
            .generate_polar_mesh(&bridge, &diamond(), &standard_request())
            .unwrap(),
        MeshOutcome::Rebuilt
    );
    assert_eq!(cache.len(), 16);
    assert_eq!(log.sweep_batches(), 2);
}
