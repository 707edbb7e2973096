use nothanks_server::logging::{LogFormat, init_logging};

fn main() {
    let format = std::env::var("NOTHANKS_LOG_FORMAT")
        .map(|name| LogFormat::from_name(&name))
        .unwrap_or_default();
    init_logging(format);

    let code = nothanks_cli::run(
        std::env::args(),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    );
    std::process::exit(code);
}
