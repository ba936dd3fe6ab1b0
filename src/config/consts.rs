/// Name of the service every runnable operator exposes
pub const MAIN_SERVICE: &str = "main";
/// Prefix of worker thread names, followed by the operator path
pub const WORKER_THREAD_PREFIX: &str = "portflow:";
/// How long the driver waits for outputs after its input is exhausted
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 500;
/// File extensions picked up when loading a blueprint directory
pub const BLUEPRINT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];
/// Instance property values starting with this refer to a parent property
pub const PROPERTY_REFERENCE_PREFIX: char = '$';
