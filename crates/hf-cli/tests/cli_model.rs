use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_hf-cli"))
}

fn repo_root() -> PathBuf {
    // crates/hf-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("hf_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let out = run(args);
    assert!(
        out.status.success(),
        "{:?} should succeed, stderr={}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON")
}

fn floats(v: &serde_json::Value) -> Vec<f64> {
    v.as_array().expect("array").iter().map(|x| x.as_f64().expect("number")).collect()
}

#[test]
fn version_smoke() {
    let out = run(&["version"]);
    assert!(out.status.success(), "version should succeed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("hf-cli "), "unexpected stdout: {}", stdout);
}

#[test]
fn inspect_reports_layout() {
    let input = fixture_path("complex_workspace.json");
    let v = run_json(&["inspect", "--input", input.to_string_lossy().as_ref()]);

    assert_eq!(v["n_bins"].as_u64(), Some(4));
    assert_eq!(v["n_parameters"].as_u64(), Some(11));
    assert_eq!(v["poi_index"].as_u64(), Some(0));

    let channels = v["channels"].as_array().unwrap();
    assert_eq!(channels[0]["name"], "SR");
    assert_eq!(channels[1]["offset"].as_u64(), Some(2));

    let params = v["parameters"].as_array().unwrap();
    assert_eq!(params[1]["name"], "lumi");
    assert_eq!(params[1]["prior"]["dist"], "normal");
    assert_eq!(params[1]["prior"]["sigma"].as_f64(), Some(0.02));
}

#[test]
fn expected_defaults_to_inits() {
    let input = fixture_path("simple_workspace.json");
    let v = run_json(&["expected", "--input", input.to_string_lossy().as_ref()]);
    assert_eq!(floats(&v["expected"]), vec![55.0, 70.0]);
    assert_eq!(floats(&v["channels"][0]["expected"]), vec![55.0, 70.0]);
}

#[test]
fn expected_with_params() {
    let input = fixture_path("simple_workspace.json");
    let v = run_json(&["expected", "--input", input.to_string_lossy().as_ref(), "--params", "2,1,0.5"]);
    assert_eq!(floats(&v["expected"]), vec![60.0, 50.0]);
}

#[test]
fn expected_rejects_wrong_parameter_count() {
    let input = fixture_path("simple_workspace.json");
    let out = run(&["expected", "--input", input.to_string_lossy().as_ref(), "--params", "1"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Parameter count mismatch"), "stderr={}", stderr);
}

#[test]
fn nll_constrained_and_unconstrained() {
    let input = fixture_path("simple_workspace.json");
    let input = input.to_string_lossy();

    let plain = run_json(&["nll", "--input", input.as_ref(), "--no-constraints", "--threads", "1"]);
    let want = 53.0 * 55f64.ln() - 55.0 + 65.0 * 70f64.ln() - 70.0;
    let got = plain["loglikelihood"].as_f64().unwrap();
    assert!((got - want).abs() < 1e-9, "got {}, want {}", got, want);
    assert_eq!(plain["constrained"], false);

    let constrained = run_json(&["nll", "--input", input.as_ref(), "--gradient"]);
    let c = constrained["loglikelihood"].as_f64().unwrap();
    assert!(c.is_finite() && c != got);
    assert_eq!(floats(&constrained["gradient"]).len(), 3);
}

#[test]
fn nll_writes_output_file() {
    let input = fixture_path("simple_workspace.json");
    let out_path = tmp_path("nll.json");
    let out = run(&[
        "nll",
        "--input",
        input.to_string_lossy().as_ref(),
        "--output",
        out_path.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));

    let text = std::fs::read_to_string(&out_path).expect("output file should exist");
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(v["nll"].as_f64().unwrap().is_finite());
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn priors_are_seeded() {
    let input = fixture_path("complex_workspace.json");
    let input = input.to_string_lossy();
    let args = ["priors", "--input", input.as_ref(), "--draws", "5", "--seed", "7"];
    let a = run_json(&args);
    let b = run_json(&args);
    assert_eq!(a, b);

    let params = a["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 11);
    for p in params {
        let draws = floats(&p["draws"]);
        assert_eq!(draws.len(), 5);
        if let (Some(lo), Some(hi)) = (p["minimum"].as_f64(), p["maximum"].as_f64()) {
            assert!(draws.iter().all(|x| (lo..=hi).contains(x)), "{}", p["name"]);
        }
    }
}

#[test]
fn config_sets_flat_range() {
    let input = fixture_path("complex_workspace.json");
    let input = input.to_string_lossy();
    let config = tmp_path("options.json");
    std::fs::write(&config, r#"{ "flat_range": [0.0, 20.0] }"#).unwrap();

    let v = run_json(&["inspect", "--input", input.as_ref(), "--config", config.to_string_lossy().as_ref()]);
    let params = v["parameters"].as_array().unwrap();
    let sf = params.iter().find(|p| p["name"] == "sf_CR[0]").unwrap();
    assert_eq!(sf["prior"]["b"].as_f64(), Some(20.0));
    let _ = std::fs::remove_file(&config);
}

#[test]
fn config_selects_interpolation_code() {
    let workspace = tmp_path("normsys.json");
    std::fs::write(
        &workspace,
        r#"{
            "channels": [{ "name": "ch", "samples": [{ "name": "s", "data": [5.0],
                "modifiers": [{ "name": "syst", "type": "normsys", "data": { "hi": 1.1, "lo": 0.9 } }] }] }],
            "observations": [{ "name": "ch", "data": [5.0] }],
            "measurements": [{ "name": "m", "config": { "poi": "syst", "parameters": [] } }],
            "version": "1.0.0"
        }"#,
    )
    .unwrap();
    let config = tmp_path("options.json");
    std::fs::write(&config, r#"{ "normsys_interp": "code1" }"#).unwrap();
    let workspace_arg = workspace.to_string_lossy();
    let config_arg = config.to_string_lossy();

    let code1 = run_json(&[
        "expected",
        "--input",
        workspace_arg.as_ref(),
        "--config",
        config_arg.as_ref(),
        "--params",
        "0.5",
    ]);
    let got = floats(&code1["expected"])[0];
    let want = 5.0 * 1.1f64.powf(0.5);
    assert!((got - want).abs() < 1e-12, "got {}, want {}", got, want);

    let code1_down = run_json(&[
        "expected",
        "--input",
        workspace_arg.as_ref(),
        "--config",
        config_arg.as_ref(),
        "--params",
        "-0.5",
    ]);
    let got = floats(&code1_down["expected"])[0];
    let want = 5.0 * 0.9f64.powf(0.5);
    assert!((got - want).abs() < 1e-12, "got {}, want {}", got, want);

    // Without the config the polynomial default gives a different value inside |α| < 1.
    let default = run_json(&["expected", "--input", workspace_arg.as_ref(), "--params", "0.5"]);
    let got_default = floats(&default["expected"])[0];
    assert!((got_default - 5.0 * 1.1f64.powf(0.5)).abs() > 1e-9, "default={}", got_default);

    let _ = std::fs::remove_file(&workspace);
    let _ = std::fs::remove_file(&config);
}

#[test]
fn unsupported_modifier_fails() {
    let input = fixture_path("unsupported_modifier.json");
    let out = run(&["inspect", "--input", input.to_string_lossy().as_ref()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("shapesyst"), "stderr={}", stderr);
}
