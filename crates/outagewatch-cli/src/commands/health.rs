pub fn run(config: &outagewatch_core::MonitorConfig, host: &str, port: u16) {
    super::init_logging(None);

    let client = super::make_client(config);
    let base = format!("http://{host}:{port}");

    println!("outagewatch health v{}", outagewatch_core::VERSION);
    println!("   {base}");
    println!("   feed: {}", config.feed_url);
    println!();
    println!("   Endpoints:");
    println!("     GET /         API index");
    println!("     GET /health   Feed checks (200 healthy, 503 unhealthy)");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(outagewatch_server::run_server(client, host, port)) {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
