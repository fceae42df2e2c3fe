//! CityForge Headless Street Generation Harness
//!
//! Generates clusters across a seed sweep and validates the street graph,
//! quarter and estate invariants. Runs entirely in-process: no rendering,
//! no persistence layer.
//!
//! Usage:
//!   cargo run -p cityforge-simtest
//!   cargo run -p cityforge-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p cityforge-simtest

use cityforge_streets::cluster::{generate_cluster, ClusterSpec, ClusterStreets};
use cityforge_streets::config::{validate_config, StreetConfig};
use cityforge_streets::geometry::{angular_difference, min_edge_length};
use cityforge_streets::location::LocationProfile;
use cityforge_streets::quarter::QuarterGenerator;
use cityforge_streets::snapshot::{load_snapshot, snapshot_bytes};
use glam::Vec2;
use log::info;

// ── Street config (same JSON the library tests load) ────────────────────
const CONFIG_JSON: &str = include_str!("../../../data/street_config.json");

const SWEEP_SEEDS: [&str; 8] = [
    "old town",
    "harbour",
    "north gate",
    "market hill",
    "riverside",
    "7",
    "cluster-0042",
    "",
];

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== CityForge Street Generation Harness ===\n");

    let mut results = Vec::new();

    // 1. Shipped configuration
    let config = validate_street_config(&mut results).unwrap_or_default();

    // 2. Seed sweep with graph invariants
    results.extend(validate_seed_sweep(&config, verbose));

    // 3. Estates under different location profiles
    results.extend(validate_estates(&config, verbose));

    // 4. Snapshot round trip
    results.extend(validate_snapshots(&config));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Street Config ────────────────────────────────────────────────────

fn validate_street_config(results: &mut Vec<TestResult>) -> Option<StreetConfig> {
    println!("--- Street Config ---");

    let config = match StreetConfig::from_json(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return None;
        }
    };

    let errors = validate_config(&config);
    results.push(TestResult {
        name: "config_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            "all knobs in range".into()
        } else {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        },
    });

    results.push(TestResult {
        name: "config_matches_defaults".into(),
        passed: config == StreetConfig::default(),
        detail: "shipped JSON mirrors the built-in defaults".into(),
    });

    Some(config)
}

// ── 2. Seed Sweep ───────────────────────────────────────────────────────

fn generate(seed: &str, config: &StreetConfig, profile: &LocationProfile) -> Result<ClusterStreets, String> {
    let spec = ClusterSpec::centered(1, seed, 1000.0);
    generate_cluster(&spec, config, profile).map_err(|e| e.to_string())
}

fn validate_seed_sweep(config: &StreetConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Seed Sweep ---");
    let mut results = Vec::new();
    let profile = LocationProfile::default();
    let min_pp = config.generator.min_point_to_cand_point_distance;
    let min_angle = config.generator.angle_min_strokes.to_radians();

    for seed in SWEEP_SEEDS {
        let streets = match generate(seed, config, &profile) {
            Ok(s) => s,
            Err(e) => {
                results.push(TestResult {
                    name: format!("sweep[{seed}]_generates"),
                    passed: false,
                    detail: e,
                });
                continue;
            }
        };
        let store = streets.store();
        info!("seed {:?}: {} strokes", seed, store.stroke_count());

        // Non-trivial graph
        results.push(TestResult {
            name: format!("sweep[{seed}]_has_streets"),
            passed: store.stroke_count() > 0 && store.point_count() >= 2,
            detail: format!(
                "{} strokes, {} points, {} dead",
                store.stroke_count(),
                store.point_count(),
                streets.dead_points()
            ),
        });

        // Point spacing
        let points: Vec<Vec2> = store.street_points().map(|p| p.position()).collect();
        let mut too_close = 0;
        for (i, p) in points.iter().enumerate() {
            too_close += points[i + 1..]
                .iter()
                .filter(|q| p.distance(**q) < min_pp - 1e-3)
                .count();
        }
        results.push(TestResult {
            name: format!("sweep[{seed}]_point_spacing"),
            passed: too_close == 0,
            detail: format!("{} point pairs closer than {}", too_close, min_pp),
        });

        // Adjacency symmetry and index membership
        let asymmetric = store
            .strokes()
            .filter(|s| !(store.are_connected(s.a(), s.b()) && store.are_connected(s.b(), s.a())))
            .count();
        let unindexed = store.strokes().filter(|s| !store.stroke_indexed(s.id())).count()
            + store
                .street_points()
                .filter(|p| !store.point_indexed(p.id()))
                .count();
        results.push(TestResult {
            name: format!("sweep[{seed}]_indexes_consistent"),
            passed: asymmetric == 0 && unindexed == 0,
            detail: format!("{} asymmetric, {} unindexed", asymmetric, unindexed),
        });

        // Junction angles
        let mut unsorted = 0;
        let mut narrow = 0;
        for p in store.street_points() {
            let uses = store.angle_array(p.id());
            if uses.len() != p.degree() || uses.windows(2).any(|w| w[0].angle > w[1].angle) {
                unsorted += 1;
            }
            for (i, u) in uses.iter().enumerate() {
                narrow += uses[i + 1..]
                    .iter()
                    .filter(|v| angular_difference(u.angle, v.angle) < min_angle - 1e-3)
                    .count();
            }
        }
        results.push(TestResult {
            name: format!("sweep[{seed}]_junction_angles"),
            passed: unsorted == 0 && narrow == 0,
            detail: format!("{} unsorted arrays, {} narrow pairs", unsorted, narrow),
        });

        // Face tracing covers every directed use once
        let walked: usize = streets
            .quarters()
            .quarters()
            .iter()
            .map(|q| q.delims().len())
            .sum();
        let valid = streets.quarters().valid_quarters().count();
        results.push(TestResult {
            name: format!("sweep[{seed}]_faces_cover_graph"),
            passed: walked == 2 * store.stroke_count(),
            detail: format!(
                "{} delims for {} strokes, {} faces, {} valid",
                walked,
                store.stroke_count(),
                streets.quarters().len(),
                valid
            ),
        });

        // Determinism
        let again = generate(seed, config, &profile)
            .and_then(|s| snapshot_bytes(s.store()).map_err(|e| e.to_string()));
        let first = snapshot_bytes(store).map_err(|e| e.to_string());
        results.push(TestResult {
            name: format!("sweep[{seed}]_deterministic"),
            passed: matches!((&first, &again), (Ok(a), Ok(b)) if a == b),
            detail: "regenerated snapshot is byte-identical".into(),
        });

        if verbose {
            let stats = streets.stats();
            println!(
                "  {:>14}: {}",
                format!("{seed:?}"),
                serde_json::to_string(stats).unwrap_or_default()
            );
        }
    }

    results
}

// ── 3. Estates ──────────────────────────────────────────────────────────

fn validate_estates(config: &StreetConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Estates ---");
    let mut results = Vec::new();

    let profiles = [
        (
            "suburb",
            LocationProfile::Uniform {
                downtownness: 0.1,
                shoppingness: 0.0,
            },
        ),
        (
            "downtown",
            LocationProfile::Uniform {
                downtownness: 0.95,
                shoppingness: 0.9,
            },
        ),
        (
            "radial",
            LocationProfile::Radial {
                center: Vec2::ZERO,
                radius: 500.0,
                peak_downtownness: 1.0,
                peak_shoppingness: 0.8,
            },
        ),
    ];

    for (label, profile) in profiles {
        let streets = match generate("market hill", config, &profile) {
            Ok(s) => s,
            Err(e) => {
                results.push(TestResult {
                    name: format!("estates[{label}]_generates"),
                    passed: false,
                    detail: e,
                });
                continue;
            }
        };

        let mut buildings = 0;
        let mut over_cap = 0;
        let mut shop_fronts = 0;
        let mut tallest = 0;
        for quarter in streets.quarters().quarters() {
            for estate in quarter.estates() {
                for b in estate.buildings() {
                    let at = quarter.center();
                    let cap = config
                        .estate
                        .max_stories(min_edge_length(b.points()), profile.downtownness(at));
                    buildings += 1;
                    shop_fronts += b.shop_fronts().len();
                    tallest = tallest.max(b.stories());
                    if b.stories() > cap {
                        over_cap += 1;
                    }
                }
            }
        }

        results.push(TestResult {
            name: format!("estates[{label}]_height_caps"),
            passed: over_cap == 0,
            detail: format!(
                "{} buildings, {} over their tier, tallest {} stories",
                buildings, over_cap, tallest
            ),
        });

        let invalid_with_estate = streets
            .quarters()
            .quarters()
            .iter()
            .filter(|q| !q.is_valid() && !q.estates().is_empty())
            .count();
        results.push(TestResult {
            name: format!("estates[{label}]_only_on_valid_quarters"),
            passed: invalid_with_estate == 0,
            detail: format!("{} invalid quarters with estates", invalid_with_estate),
        });

        if label == "suburb" {
            results.push(TestResult {
                name: "estates[suburb]_single_story".into(),
                passed: tallest <= 1,
                detail: format!("tallest {} stories", tallest),
            });
        }

        if verbose {
            println!(
                "  {:>8}: {} buildings, {} shopfronts, tallest {}",
                label, buildings, shop_fronts, tallest
            );
        }
    }

    results
}

// ── 4. Snapshots ────────────────────────────────────────────────────────

fn validate_snapshots(config: &StreetConfig) -> Vec<TestResult> {
    println!("--- Snapshots ---");
    let mut results = Vec::new();

    let streets = match generate("riverside", config, &LocationProfile::default()) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "snapshot_source_generates".into(),
                passed: false,
                detail: e,
            });
            return results;
        }
    };

    let bytes = match snapshot_bytes(streets.store()) {
        Ok(b) => b,
        Err(e) => {
            results.push(TestResult {
                name: "snapshot_save".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    match load_snapshot(bytes.as_slice()) {
        Ok(mut reloaded) => {
            let same = snapshot_bytes(&reloaded).is_ok_and(|b| b == bytes);
            results.push(TestResult {
                name: "snapshot_roundtrip".into(),
                passed: same,
                detail: format!("{} bytes", bytes.len()),
            });

            let retraced = QuarterGenerator::new(&mut reloaded)
                .generate()
                .map(|q| q.valid_quarters().count());
            let original = streets.quarters().valid_quarters().count();
            results.push(TestResult {
                name: "snapshot_retrace".into(),
                passed: retraced.as_ref().is_ok_and(|n| *n == original),
                detail: format!("{:?} valid quarters after reload, {} before", retraced, original),
            });
        }
        Err(e) => results.push(TestResult {
            name: "snapshot_load".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    results
}
