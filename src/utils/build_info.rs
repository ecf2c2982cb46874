//! What `xfinance_cli build-info` reports, stamped in by `build.rs`.

const UNKNOWN: &str = "unknown";

fn stamped(value: Option<&'static str>) -> &'static str {
    value.filter(|v| !v.is_empty()).unwrap_or(UNKNOWN)
}

/// `xfinance 0.1.0 (abc1234)`, with `-dirty` appended to the commit when
/// the tree had local changes at build time.
pub fn version_line() -> String {
    let hash = stamped(option_env!("XFINANCE_BUILD_HASH"));
    let commit = match stamped(option_env!("XFINANCE_BUILD_STATUS")) {
        "dirty" => format!("{hash}-dirty"),
        _ => hash.to_string(),
    };
    format!("xfinance {} ({commit})", env!("CARGO_PKG_VERSION"))
}

/// Label and value rows printed under the version line.
pub fn details() -> [(&'static str, &'static str); 4] {
    [
        ("Built at", stamped(option_env!("XFINANCE_BUILD_TIMESTAMP"))),
        ("Target", stamped(option_env!("XFINANCE_BUILD_TARGET"))),
        ("Profile", stamped(option_env!("XFINANCE_BUILD_PROFILE"))),
        ("Rustc", stamped(option_env!("XFINANCE_BUILD_RUSTC"))),
    ]
}
