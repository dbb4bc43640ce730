use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=TOURISTESIM_SDK_VERSION");

    let version = std::env::var("TOURISTESIM_SDK_VERSION")
        .ok()
        .or_else(git_version)
        .unwrap_or_else(|| "1.0.0".to_string());

    println!("cargo:rustc-env=TOURISTESIM_VERSION={}", version);
    println!("cargo:rustc-env=TOURISTESIM_RUSTC_VERSION={}", rustc_version());
}

/// Version from `git describe`, without the leading `v`.
/// Dev builds (dirty tree, untagged, 0.0.0 manifests) fall back to the default.
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--abbrev=0"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let tag = String::from_utf8(output.stdout).ok()?.trim().to_string();
    let version = tag.strip_prefix('v').unwrap_or(&tag);
    if version.is_empty() || !version.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(version.to_string())
}

/// Short rustc version (e.g. "1.88.0"), used in the default user agent.
fn rustc_version() -> String {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .and_then(|s| s.split_whitespace().nth(1).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
