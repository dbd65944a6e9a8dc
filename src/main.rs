fn main() {
    regotest::cli::run();
}
