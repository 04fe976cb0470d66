use proxy_metrics::plot::parse_cli;
use proxy_metrics::render_with;

fn main() {
    pretty_env_logger::init();
    let (csvin, config) = parse_cli();
    log::debug!("read metrics from {} with {:?}", csvin.display(), config);
    match render_with(&csvin, &config) {
        Ok(pngout) => println!("[ok] chart saved to {}", pngout.display()),
        Err(e) => {
            eprintln!("[error] {}", e);
            std::process::exit(1);
        }
    }
}
