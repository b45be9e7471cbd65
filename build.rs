use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=DOSSIER_RAIN_BUILD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let target = match std::env::var("DOSSIER_RAIN_BUILD") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => target_label(),
    };
    println!("cargo:rustc-env=DOSSIER_RAIN_BUILD={}", target);

    let sha = git_short_sha()
        .or_else(github_short_sha)
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=DOSSIER_RAIN_GIT_SHA={}", sha);
}

fn short_hex(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let short = &raw[..raw.len().min(7)];
    if short.is_empty() || !short.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(short.to_ascii_lowercase())
}

fn github_short_sha() -> Option<String> {
    short_hex(&std::env::var("GITHUB_SHA").ok()?)
}

fn git_short_sha() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    short_hex(&String::from_utf8(out.stdout).ok()?)
}

fn target_label() -> String {
    let os = match std::env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("macos") => "darwin".to_string(),
        Ok(other) => other.to_string(),
        Err(_) => "unknown".to_string(),
    };
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".to_string());
    format!("{os}-{arch}")
}
