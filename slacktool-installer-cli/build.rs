fn main() {
    println!("cargo:rerun-if-changed=../.git/HEAD");
    // Stamp the installer's own commit so its version surface can report it
    let hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=INSTALLER_GIT_HASH={hash}");
}

fn git_short_hash() -> Option<String> {
    let output = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let hash = text.trim();
    if hash.is_empty() {
        None
    } else {
        Some(hash.to_string())
    }
}
