// raptor CLI entry point

use raptor_cli::{output, router::CommandRouter, VerbosityLevel};

#[tokio::main]
async fn main() {
    let result = CommandRouter::route().await;

    // Exit with appropriate code
    if let Err(e) = result {
        output::print_error(&e.user_message());
        if VerbosityLevel::Verbose.should_output() {
            eprintln!("{}", e.technical_details());
        }
        std::process::exit(1);
    }
}
