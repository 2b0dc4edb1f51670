mod app;

use app::theme::Theme;
use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = app::run() {
        eprintln!("{}", Theme::new().error(&format!("{:#}", err)));
        std::process::exit(1);
    }
}
