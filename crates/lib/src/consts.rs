//! Well-known names and defaults shared across the crate.

/// Define naming the full (platform, configuration, compiler) triple.
pub const BUILD_ENVIRONMENT_DEFINE: &str = "BUILD_ENVIRONMENT";
pub const BUILD_PLATFORM_DEFINE: &str = "BUILD_PLATFORM";
pub const BUILD_CONFIG_DEFINE: &str = "BUILD_CONFIG";
pub const BUILD_COMPILER_DEFINE: &str = "BUILD_COMPILER";

/// Define naming the target being expanded.
pub const BUILD_TARGET_DEFINE: &str = "BUILD_TARGET";
pub const BUILD_TARGET_PATH_DEFINE: &str = "BUILD_TARGET_PATH";

/// Tag that disables unity partitioning for a target.
pub const NO_UNITY_TAG: &str = "no-unity";

/// Per-unity-file byte ceiling used when settings do not override it.
pub const DEFAULT_UNITY_SIZE: u64 = 256 * 1024;

/// Output directory (relative to the project root) used when settings do not override it.
pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// Headers exposed to dependents.
pub const PUBLIC_DIR: &str = "public";
/// Headers visible only to the owning target.
pub const PRIVATE_DIR: &str = "private";
/// Root for generated-file descriptors' output.
pub const GENERATED_DIR: &str = "generated";
/// Object files within a target's output directory.
pub const OBJECT_DIR: &str = "obj";
/// Objects for sources outside the target's source directory, under `OBJECT_DIR`.
pub const EXTERNAL_OBJECT_DIR: &str = "external";

/// Attribute name under which unity counts are cached.
pub const UNITY_COUNT_ATTRIBUTE: &str = "unity_count";

/// Extensions counted for unity sizing and matched by default source globs.
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "m", "mm", "h", "hh", "hpp", "hxx", "inl"];

/// Environment variables read by `Settings::with_env_overrides`.
pub const ENV_STRICT: &str = "STRATA_STRICT";
pub const ENV_UNITY_SIZE: &str = "STRATA_UNITY_SIZE";
pub const ENV_OUTPUT_DIR: &str = "STRATA_OUTPUT_DIR";
