use crate::support::print_json_or_exit;
use featcheck_kernel::VisibilitySieve;

pub fn run(declaration: String, json_output: bool) {
    let raw = std::fs::read_to_string(&declaration).unwrap_or_else(|e| {
        eprintln!("error: failed to read {declaration}: {e}");
        std::process::exit(2);
    });
    let sieve = VisibilitySieve::from_json(&raw).unwrap_or_else(|e| {
        eprintln!("error: {declaration}: {e}");
        std::process::exit(2);
    });

    if json_output {
        print_json_or_exit(&sieve, "region");
    } else {
        print!("{sieve}");
    }
}
