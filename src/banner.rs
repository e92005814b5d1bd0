// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    // Using a raw string literal for the multi-line banner
    let banner = r#"
                     _                _
  ___ __   __  __ _ | |  __ _   __ _ | |_   ___
 / _ \\ \ / / / _` || | / _` | / _` || __| / _ \
|  __/ \ V / | (_| || || (_| || (_| || |_ |  __/
 \___|  \_/   \__,_||_| \__, | \__,_| \__| \___|
                        |___/

    Eval Run Tracking & Quality Gate
"#;
    println!("{}", banner);
}
