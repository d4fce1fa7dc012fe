fn main() {
    sheetforge::cli::run();
}
