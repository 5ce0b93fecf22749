fn main() {
    if let Err(err) = distributed_scaling_svg::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
