/// Prints the configuration resolved from outlay.toml and the environment
///
/// Run with: cargo run -p outlay-config --example print_config

fn main() {
    let config = outlay_config::OutlayConfig::load();

    println!("Layout:");
    println!("  Origin: left={} top={}", config.layout.origin_left, config.layout.origin_top);
    match config.layout.to_options() {
        Ok(options) => {
            println!("  Duration: {:?}", options.transition_duration());
            println!("  Visible: {:?}", options.visible_style);
            println!("  Hidden: {:?}", options.hidden_style);
        }
        Err(e) => eprintln!("  Invalid layout options: {}", e),
    }
    println!();

    println!("Demo:");
    println!("  Items: {} in {} columns", config.demo.items, config.demo.columns);
    println!("  Cell: {}px, padding {}px", config.demo.cell, config.demo.padding);
    println!("  Frame: {}ms", config.demo.frame_ms);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
