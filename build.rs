// RadarTelemetryBridge - Build Script
//
// Injects deployment secrets and TLS material into OUT_DIR before compilation.

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Environment variables holding plain-text secrets.
const TEXT_SECRETS: [&str; 4] = [
    "BRIDGE_WIFI_SSID",
    "BRIDGE_WIFI_PASSWORD",
    "BRIDGE_MQTT_ENDPOINT",
    "BRIDGE_THING_NAME",
];

/// (environment variable with a PEM file path, file name written to OUT_DIR)
const PEM_SECRETS: [(&str, &str); 3] = [
    ("BRIDGE_CA_CERT", "ca_cert.pem"),
    ("BRIDGE_CLIENT_CERT", "client_cert.pem"),
    ("BRIDGE_PRIVATE_KEY", "private_key.pem"),
];

fn main() {
    // ESP-IDF environment setup (MUST be first!)
    embuild::espidf::sysenv::output();

    // Get git version info
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=VERSION_STRING=RadarBridge v{}-g{}", version, git_hash);

    // Plain secrets: forward to the compiler, empty when unset
    for key in TEXT_SECRETS {
        let value = env::var(key).unwrap_or_default();
        println!("cargo:rustc-env={}={}", key, value);
        println!("cargo:rerun-if-env-changed={}", key);
    }

    // PEM material: copy into OUT_DIR so it can be include_str!'d.
    // Missing files produce an empty PEM, rejected at session setup.
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    for (key, file_name) in PEM_SECRETS {
        println!("cargo:rerun-if-env-changed={}", key);
        let contents = env::var(key)
            .ok()
            .and_then(|path| {
                println!("cargo:rerun-if-changed={}", path);
                fs::read_to_string(path).ok()
            })
            .unwrap_or_default();
        let target = Path::new(&out_dir).join(file_name);
        fs::write(&target, contents).expect("failed to write PEM into OUT_DIR");
    }

    // Rebuild if git HEAD changes
    println!("cargo:rerun-if-changed=.git/HEAD");
}
