//! Logging configuration shared by the binaries.

/// Provides the recommended log filter for programs which want to exclude particularly noisy
/// details of checkertrace’s dependencies.
///
/// At [`log::Level::Debug`] or lower level, the only per-frame messages should be the
/// frame timing reports; anything else that fires every frame is filtered here.
pub fn standard_filter(metadata: &log::Metadata<'_>) -> bool {
    let target = metadata.target();

    !(target.starts_with("rayon") // thread pool lifecycle chatter
        || target.starts_with("png::") // per-chunk decoder details
        || target.starts_with("flume")) // channel internals
}
