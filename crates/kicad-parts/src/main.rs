fn main() {
    kicad_parts_cli::run_main();
}
