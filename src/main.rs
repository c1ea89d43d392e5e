fn main() {
    survey_movement::cli::run();
}
