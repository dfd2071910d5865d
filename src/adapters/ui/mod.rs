pub mod banner;
pub mod tui;

/// Prints the banner and installs the prompt theme. Call once at startup.
pub fn init_ui() {
    banner::print_welcome();
    tui::apply_theme();
}
