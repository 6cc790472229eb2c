use navigator_core::config::AppConfig;
use navigator_query::factory::{LIMIT_CLASS, TO_SET_CLASS};

struct CheckResult {
    label: String,
    ok: bool,
    detail: String,
}

pub fn run_doctor(config: &AppConfig) {
    let checks = vec![
        // 1. Endpoint looks like an HTTP URL
        check_endpoint(config),
        // 2. Limit operation can be built
        check_result_limit(config),
        // 3. Backend allowlist accepts the default operations
        check_supported_defaults(config),
        // 4. Requests cannot hang forever
        check_timeout(config),
    ];

    // Print results
    let mut ok_count = 0;
    let mut fail_count = 0;

    for check in &checks {
        let icon = if check.ok { "[OK]" } else { "[!!]" };
        println!("  {} {}: {}", icon, check.label, check.detail);
        if check.ok {
            ok_count += 1;
        } else {
            fail_count += 1;
        }
    }

    println!();
    println!("  {} passed, {} issues found", ok_count, fail_count);
}

fn check_endpoint(config: &AppConfig) -> CheckResult {
    let url = config.gateway.execute_url();
    let ok = url.starts_with("http://") || url.starts_with("https://");
    CheckResult {
        label: "Endpoint".into(),
        ok,
        detail: if ok {
            url
        } else {
            format!("{} (not an http(s) URL)", url)
        },
    }
}

fn check_result_limit(config: &AppConfig) -> CheckResult {
    if config.defaults.result_limit == 0 {
        CheckResult {
            label: "Result limit".into(),
            ok: false,
            detail: "result_limit = 0; every chain will be sent without defaults".into(),
        }
    } else {
        CheckResult {
            label: "Result limit".into(),
            ok: true,
            detail: format!(
                "{} (truncate = {})",
                config.defaults.result_limit, config.defaults.truncate
            ),
        }
    }
}

fn check_supported_defaults(config: &AppConfig) -> CheckResult {
    let Some(ref supported) = config.gateway.supported_operations else {
        return CheckResult {
            label: "Default operations".into(),
            ok: true,
            detail: "no allowlist configured".into(),
        };
    };

    let missing: Vec<&str> = [LIMIT_CLASS, TO_SET_CLASS]
        .into_iter()
        .filter(|class| !supported.iter().any(|s| s == class))
        .collect();

    if missing.is_empty() {
        CheckResult {
            label: "Default operations".into(),
            ok: true,
            detail: "limit and deduplicate supported".into(),
        }
    } else {
        CheckResult {
            label: "Default operations".into(),
            ok: false,
            detail: format!("not in supported_operations: {}", missing.join(", ")),
        }
    }
}

fn check_timeout(config: &AppConfig) -> CheckResult {
    match config.gateway.timeout_secs {
        Some(secs) if secs > 0 => CheckResult {
            label: "Timeout".into(),
            ok: true,
            detail: format!("{}s", secs),
        },
        _ => CheckResult {
            label: "Timeout".into(),
            ok: false,
            detail: "no request timeout; a stalled request keeps the loading flag raised".into(),
        },
    }
}
