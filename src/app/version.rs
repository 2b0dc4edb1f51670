//! Build metadata, injected at compile time through the environment.

pub const VERSION: &str = match option_env!("RELEASEKIT_VERSION") {
    Some(v) => v,
    None => "dev",
};

pub const COMMIT: &str = match option_env!("RELEASEKIT_COMMIT") {
    Some(v) => v,
    None => "unknown",
};

pub const BUILD_DATE: &str = match option_env!("RELEASEKIT_BUILD_DATE") {
    Some(v) => v,
    None => "unknown",
};

pub fn render() -> String {
    format!(
        "releasekit-ios {}\ncommit: {}\nbuild_date: {}\n",
        VERSION, COMMIT, BUILD_DATE
    )
}
