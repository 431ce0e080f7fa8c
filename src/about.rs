pub const PEAKVIEW_DISPLAY_VERSION: &str = env!("PEAKVIEW_DISPLAY_VERSION");
pub const PEAKVIEW_BUILD_N: &str = env!("PEAKVIEW_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "PeakView {}\nBuild {}\nBrowser for p53 binding peaks across ChIP-seq datasets",
        PEAKVIEW_DISPLAY_VERSION, PEAKVIEW_BUILD_N
    )
}
