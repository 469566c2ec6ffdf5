use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "utility_mcp=info,utility_client=info";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // Logs go to stderr so `call_tool` can print results on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
