//! Architecture contract tests.

mod support;

use support::architecture::{
    find_lines_containing, find_non_export_lines_in_mod_files, find_non_test_lines_containing,
    path_exists,
};

#[test]
fn cli_has_no_direct_infrastructure_imports() {
    let hits = find_lines_containing(
        "src/adapter/inbound/cli",
        &["use crate::infrastructure", "crate::infrastructure::"],
    );

    assert!(
        hits.is_empty(),
        "found direct infrastructure imports in inbound CLI adapters: {hits:#?}"
    );
}

#[test]
fn domain_has_no_framework_or_outer_layer_imports() {
    let hits = find_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "crate::port",
            "tokio::",
        ],
    );

    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn application_layer_has_no_outer_layer_imports() {
    let hits = find_lines_containing(
        "src/application",
        &["crate::adapter::", "crate::infrastructure::"],
    );
    assert!(
        hits.is_empty(),
        "application layer should depend on ports, not adapters or infrastructure: {hits:#?}"
    );
}

#[test]
fn ports_depend_only_on_domain() {
    let hits = find_lines_containing(
        "src/port",
        &["crate::adapter", "crate::infrastructure", "crate::application"],
    );
    assert!(hits.is_empty(), "ports should depend only on domain: {hits:#?}");
}

#[test]
fn operator_port_is_transport_agnostic() {
    let hits = find_lines_containing("src/port/inbound", &["std::path::Path", "PathBuf", "std::fs"]);
    assert!(
        hits.is_empty(),
        "operator inbound port should not expose filesystem types: {hits:#?}"
    );
}

#[test]
fn mod_rs_is_export_only() {
    let violations = find_non_export_lines_in_mod_files("src");
    assert!(
        violations.is_empty(),
        "found non-export content in mod.rs files: {violations:#?}"
    );
}

#[test]
fn throttle_state_is_not_process_global() {
    let hits = find_lines_containing("src/application", &["OnceLock", "LazyLock", "lazy_static!", "static mut"]);
    assert!(
        hits.is_empty(),
        "refresh state must be owned per run, not global: {hits:#?}"
    );
}

#[test]
fn library_code_does_not_panic_on_errors() {
    let hits = find_non_test_lines_containing(
        "src/application",
        &[".unwrap()", ".expect("],
    );
    assert!(hits.is_empty(), "found unwrap/expect outside tests: {hits:#?}");
}

#[test]
fn quote_fetcher_is_split_by_concern() {
    for file in [
        "src/application/quote/fetcher.rs",
        "src/application/quote/request.rs",
        "src/application/quote/session.rs",
        "src/application/quote/settings.rs",
    ] {
        assert!(path_exists(file), "expected quote module `{file}`");
    }
}

#[test]
fn pipeline_is_split_by_concern() {
    for file in [
        "src/application/pipeline/retry.rs",
        "src/application/pipeline/runner.rs",
        "src/application/pipeline/settings.rs",
        "src/application/pipeline/sort.rs",
    ] {
        assert!(path_exists(file), "expected pipeline module `{file}`");
    }
}
