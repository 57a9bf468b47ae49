pub const LATENTSCOPE_DISPLAY_VERSION: &str = env!("LATENTSCOPE_DISPLAY_VERSION");
pub const LATENTSCOPE_BUILD_N: &str = env!("LATENTSCOPE_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "LatentScope {}\nBuild {}\nLatent-activation inspector for protein sequences",
        LATENTSCOPE_DISPLAY_VERSION, LATENTSCOPE_BUILD_N
    )
}
