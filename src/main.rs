use dual_tier::output as out;

mod app;
mod logging;

fn main() {
    let args = dual_tier::cli::parse();
    if let Err(e) = app::run(args) {
        out::print_error(&format!("{e:#}"));
        std::process::exit(app::exit_code(&e));
    }
}
