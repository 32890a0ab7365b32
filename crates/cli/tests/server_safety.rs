use assert_cmd::prelude::*;
use std::process::Command;

fn diacare() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("diacare"));
    cmd.env_remove("DIACARE_CONFIG")
        .env_remove("DIACARE_AUTH_TOKEN");
    cmd
}

#[test]
fn serve_http_refuses_non_loopback_without_public() {
    diacare()
        .args(["serve-http", "--bind", "0.0.0.0:0"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Refusing to bind 0.0.0.0:0"));
}

#[test]
fn serve_http_public_requires_auth_token() {
    diacare()
        .args(["serve-http", "--public", "--bind", "0.0.0.0:0"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--public requires an auth token"));
}

#[test]
fn serve_http_treats_empty_token_env_as_unset() {
    diacare()
        .env("DIACARE_AUTH_TOKEN", "")
        .args(["serve-http", "--public", "--bind", "0.0.0.0:0"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--public requires an auth token"));
}

#[test]
fn serve_http_rejects_blank_auth_token_flag() {
    diacare()
        .args(["serve-http", "--auth-token", "  "])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--auth-token is blank"));
}
